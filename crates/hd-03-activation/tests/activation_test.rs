//! # Activation Handshake Tests (hd-03)
//!
//! Full joins against the in-memory registry and the real codec service.
//!
//! ## Test Categories
//!
//! 1. **Happy Path** - join-accept opens, keys reproduce, device stored
//! 2. **Rejections** - unknown device, replay, MIC tampering, EUI mismatch
//! 3. **Degradation** - encoder failure keeps the activation
//! 4. **Registry Faults** - timeouts and outages are retryable

use hd_02_payload_codec::prelude::{CodecConfig, PayloadCodecService};
use hd_03_activation::domain::crypto::derive_session_keys;
use hd_03_activation::prelude::*;
use shared_types::{
    ActivationDownlink, AesKey, AppEui, AppId, Application, DevAddr, DevEui, DevId, DevNonce,
    Device, DeviceProtocol, DownlinkPayload, Fields, InMemoryRegistry, LorawanDevice, NetId,
    RegistryError,
};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// TEST HELPERS
// =============================================================================

const APP_EUI: AppEui = AppEui::new([0x70, 0xB3, 0xD5, 0x7E, 0xD0, 0x00, 0x00, 0x01]);
const DEV_EUI: DevEui = DevEui::new([0x00, 0x04, 0xA3, 0x0B, 0x00, 0x1A, 0x2B, 0x3C]);
const APP_KEY: AesKey = AesKey::new([
    0x2B, 0x7E, 0x15, 0x16, 0x28, 0xAE, 0xD2, 0xA6, 0xAB, 0xF7, 0x15, 0x88, 0x09, 0xCF, 0x4F, 0x3C,
]);
const DEV_ADDR: DevAddr = DevAddr::new([0x26, 0x01, 0x1B, 0xDA]);
const NET_ID: NetId = NetId::new([0x00, 0x00, 0x13]);

struct Harness {
    registry: Arc<InMemoryRegistry>,
    coordinator: ActivationCoordinator,
}

fn harness(application: Application) -> Harness {
    harness_with_timeout(application, Duration::from_secs(2))
}

fn harness_with_timeout(application: Application, registry_timeout: Duration) -> Harness {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.put_application(application);
    registry.put_device(Device {
        app_id: AppId::new("app"),
        dev_id: DevId::new("dev"),
        protocol: DeviceProtocol::Lorawan(LorawanDevice::otaa(APP_EUI, DEV_EUI, APP_KEY)),
    });

    let codec = Arc::new(PayloadCodecService::new(CodecConfig::default()));
    let coordinator = ActivationCoordinator::new(
        registry.clone(),
        codec,
        ActivationConfig { registry_timeout },
    );
    Harness {
        registry,
        coordinator,
    }
}

fn request(nonce: [u8; 2]) -> ActivationRequest {
    ActivationRequest {
        app_id: AppId::new("app"),
        dev_id: DevId::new("dev"),
        payload: JoinRequest::build(&APP_KEY, APP_EUI, DEV_EUI, DevNonce::new(nonce)),
        metadata: ActivationMetadata::Lorawan(LorawanActivationMetadata {
            dev_addr: DEV_ADDR,
            net_id: NET_ID,
            rx1_dr_offset: 1,
            rx2_dr: 3,
            rx_delay: 1,
            cf_list: None,
        }),
        downlink_options: vec![
            DownlinkOption {
                identifier: "slow".into(),
                gateway_id: "gw-2".into(),
                score: 40,
            },
            DownlinkOption {
                identifier: "fast".into(),
                gateway_id: "gw-1".into(),
                score: 5,
            },
        ],
    }
}

fn app_with_downlink(encoder: &str) -> Application {
    let mut app = Application::new(AppId::new("app"));
    app.functions.encoder = Some(encoder.to_string());
    let mut fields = Fields::new();
    fields.insert("interval".into(), 60.into());
    app.activation_downlink = Some(ActivationDownlink {
        port: 10,
        payload: DownlinkPayload::Fields(fields),
    });
    app
}

fn lorawan(device: &Device) -> &LorawanDevice {
    let DeviceProtocol::Lorawan(lorawan) = &device.protocol;
    lorawan
}

// =============================================================================
// HAPPY PATH
// =============================================================================

#[tokio::test]
async fn test_join_accept_opens_and_keys_reproduce() {
    let h = harness(Application::new(AppId::new("app")));
    let response = h.coordinator.activate(request([0x00, 0x01])).await.unwrap();

    let accept = JoinAccept::open(&APP_KEY, &response.envelope.join_accept)
        .unwrap()
        .expect("MIC verifies");
    assert_eq!(accept.dev_addr, DEV_ADDR);
    assert_eq!(accept.net_id, NET_ID);
    assert_eq!(accept.dl_settings, 0x13);
    assert_eq!(accept.app_nonce, response.envelope.app_nonce);

    let keys = derive_session_keys(&APP_KEY, accept.app_nonce, accept.net_id, DevNonce::new([0, 1]));
    assert_eq!(keys.nwk_s_key, response.envelope.nwk_s_key);
    assert_eq!(keys.app_s_key, response.envelope.app_s_key);

    assert_eq!(response.downlink_option.identifier, "fast");
    assert!(response.payload.is_empty());
    assert!(!response.degraded);
}

#[tokio::test]
async fn test_device_record_is_updated() {
    let h = harness(Application::new(AppId::new("app")));
    let response = h.coordinator.activate(request([0x00, 0x07])).await.unwrap();

    let stored = h
        .registry
        .device(&AppId::new("app"), &DevId::new("dev"))
        .unwrap();
    let stored = lorawan(&stored);
    assert_eq!(stored.used_dev_nonces, vec![DevNonce::new([0x00, 0x07])]);
    let session = stored.session.as_ref().unwrap();
    assert_eq!(session.dev_addr, DEV_ADDR);
    assert_eq!(session.app_s_key, response.envelope.app_s_key);
    assert_eq!((session.f_cnt_up, session.f_cnt_down), (0, 0));
}

#[tokio::test]
async fn test_activation_downlink_is_encoded() {
    let h = harness(app_with_downlink(
        r#"fn Encoder(f, port) { log("interval", f.interval); [f.interval] }"#,
    ));
    let response = h.coordinator.activate(request([0, 2])).await.unwrap();
    assert_eq!(response.payload, vec![60]);
    assert_eq!(response.port, Some(10));
    assert_eq!(response.logs.len(), 1);
    assert!(!response.degraded);
}

#[tokio::test]
async fn test_challenge_matches_valid_frame() {
    let h = harness(Application::new(AppId::new("app")));
    let frame = JoinRequest::build(&APP_KEY, APP_EUI, DEV_EUI, DevNonce::new([1, 1]));
    let response = h
        .coordinator
        .challenge(ChallengeRequest {
            app_id: AppId::new("app"),
            dev_id: DevId::new("dev"),
            payload: frame,
        })
        .await
        .unwrap();
    assert!(response.matches);
}

// =============================================================================
// REJECTIONS
// =============================================================================

#[tokio::test]
async fn test_unknown_device() {
    let h = harness(Application::new(AppId::new("app")));
    let mut req = request([0, 1]);
    req.dev_id = DevId::new("ghost");

    let err = h.coordinator.activate(req).await.unwrap_err();
    assert_eq!(
        err,
        ActivationError::UnknownDevice {
            app_id: AppId::new("app"),
            dev_id: DevId::new("ghost"),
        }
    );
    assert_eq!(err.phase(), ActivationPhase::Resolving);
}

#[tokio::test]
async fn test_unknown_application() {
    let h = harness(Application::new(AppId::new("other")));
    let err = h.coordinator.activate(request([0, 1])).await.unwrap_err();
    assert_eq!(err, ActivationError::UnknownApplication(AppId::new("app")));
}

#[tokio::test]
async fn test_dev_nonce_replay_is_rejected() {
    let h = harness(Application::new(AppId::new("app")));
    h.coordinator.activate(request([0, 3])).await.unwrap();

    let err = h.coordinator.activate(request([0, 3])).await.unwrap_err();
    assert_eq!(err, ActivationError::DevNonceReused(DevNonce::new([0, 3])));

    let stats = h.coordinator.stats().await;
    assert_eq!((stats.attempts, stats.successes, stats.failures), (2, 1, 1));
}

#[tokio::test]
async fn test_tampered_mic_is_rejected() {
    let h = harness(Application::new(AppId::new("app")));
    let mut req = request([0, 4]);
    req.payload[19] ^= 0x01;

    let err = h.coordinator.activate(req).await.unwrap_err();
    assert_eq!(err, ActivationError::MicMismatch);

    let stored = h
        .registry
        .device(&AppId::new("app"), &DevId::new("dev"))
        .unwrap();
    assert!(lorawan(&stored).session.is_none());
}

#[tokio::test]
async fn test_malformed_frame_is_rejected() {
    let h = harness(Application::new(AppId::new("app")));
    let mut req = request([0, 5]);
    req.payload.truncate(10);

    let err = h.coordinator.activate(req).await.unwrap_err();
    assert!(matches!(err, ActivationError::InvalidJoinRequest(_)));
}

#[tokio::test]
async fn test_missing_downlink_option_is_rejected() {
    let h = harness(Application::new(AppId::new("app")));
    let mut req = request([0, 6]);
    req.downlink_options.clear();

    let err = h.coordinator.activate(req).await.unwrap_err();
    assert_eq!(err, ActivationError::NoDownlinkOption);
}

// =============================================================================
// DEGRADATION
// =============================================================================

#[tokio::test]
async fn test_encoder_throw_degrades_gracefully() {
    let h = harness(app_with_downlink(
        r#"fn Encoder(f, port) { log("encoding"); throw "encoder exploded"; }"#,
    ));
    let response = h.coordinator.activate(request([0, 8])).await.unwrap();

    assert!(response.degraded);
    assert!(response.payload.is_empty());
    assert!(response
        .logs
        .iter()
        .flat_map(|l| l.fields.iter())
        .any(|f| f.contains("encoder exploded")));
    assert!(JoinAccept::open(&APP_KEY, &response.envelope.join_accept)
        .unwrap()
        .is_some());

    let stats = h.coordinator.stats().await;
    assert_eq!(stats.degraded, 1);
    assert_eq!(stats.successes, 1);
}

// =============================================================================
// REGISTRY FAULTS
// =============================================================================

#[tokio::test]
async fn test_registry_timeout_is_retryable() {
    let h = harness_with_timeout(Application::new(AppId::new("app")), Duration::from_millis(20));
    h.registry.set_latency(Some(Duration::from_millis(500)));

    let err = h.coordinator.activate(request([0, 9])).await.unwrap_err();
    assert_eq!(
        err,
        ActivationError::RegistryUnavailable(RegistryError::Timeout { timeout_ms: 20 })
    );
    assert!(err.is_retryable());
    assert_eq!(h.coordinator.stats().await.retryable_failures, 1);
}

#[tokio::test]
async fn test_registry_outage_is_retryable() {
    let h = harness(Application::new(AppId::new("app")));
    h.registry.set_unavailable(true);

    let err = h.coordinator.activate(request([0, 10])).await.unwrap_err();
    assert!(err.is_retryable());
}
