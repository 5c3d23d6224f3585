//! # Session Derivation Strategies
//!
//! Session material is derived by a strategy looked up by the device's
//! protocol tag. Strategies are pure apart from nonce generation: they take
//! the current device record and return the updated one, leaving
//! persistence to the coordinator.

use crate::domain::crypto::{derive_session_keys, JoinAccept, JoinRequest};
use crate::domain::entities::{
    ActivationEnvelope, ActivationMetadata, ActivationRequest, ChallengeResponse,
};
use crate::errors::ActivationError;
use rand::RngCore;
use shared_types::{AppNonce, Device, DeviceKind, DeviceProtocol, LorawanSession};
use std::collections::HashMap;
use std::sync::Arc;

/// Updated device record plus the response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    /// Device record to upsert.
    pub device: Device,
    /// Join-accept and session material.
    pub envelope: ActivationEnvelope,
}

/// Per-protocol activation logic.
pub trait SessionStrategy: Send + Sync {
    /// Protocol handled by the strategy.
    fn kind(&self) -> DeviceKind;

    /// Validates the request against `device` and derives a new session.
    fn derive(
        &self,
        device: &Device,
        request: &ActivationRequest,
    ) -> Result<Derivation, ActivationError>;

    /// Computes the MIC `frame` should carry for `device`.
    fn challenge(&self, device: &Device, frame: &[u8])
        -> Result<ChallengeResponse, ActivationError>;
}

// =============================================================================
// NONCES
// =============================================================================

/// Source of AppNonces.
pub trait NonceSource: Send + Sync {
    /// Next nonce.
    fn app_nonce(&self) -> AppNonce;
}

/// Nonces from the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonces;

impl NonceSource for RandomNonces {
    fn app_nonce(&self) -> AppNonce {
        let mut bytes = [0u8; AppNonce::LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        AppNonce::new(bytes)
    }
}

// =============================================================================
// LORAWAN OTAA
// =============================================================================

/// LoRaWAN 1.0.x over-the-air activation.
pub struct LorawanOtaa {
    nonces: Box<dyn NonceSource>,
}

impl Default for LorawanOtaa {
    fn default() -> Self {
        Self::new(RandomNonces)
    }
}

impl LorawanOtaa {
    /// Creates the strategy drawing AppNonces from `nonces`.
    pub fn new(nonces: impl NonceSource + 'static) -> Self {
        Self {
            nonces: Box::new(nonces),
        }
    }
}

impl SessionStrategy for LorawanOtaa {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Lorawan
    }

    fn derive(
        &self,
        device: &Device,
        request: &ActivationRequest,
    ) -> Result<Derivation, ActivationError> {
        let DeviceProtocol::Lorawan(lorawan) = &device.protocol;
        let ActivationMetadata::Lorawan(meta) = &request.metadata;

        let join = JoinRequest::parse(&request.payload)?;
        if join.app_eui != lorawan.app_eui || join.dev_eui != lorawan.dev_eui {
            return Err(ActivationError::EuiMismatch);
        }
        let app_key = lorawan.app_key.ok_or(ActivationError::MissingAppKey)?;
        if join.mic != join.expected_mic(&app_key) {
            return Err(ActivationError::MicMismatch);
        }
        if lorawan.has_used_nonce(join.dev_nonce) {
            return Err(ActivationError::DevNonceReused(join.dev_nonce));
        }

        let app_nonce = self.nonces.app_nonce();
        let keys = derive_session_keys(&app_key, app_nonce, meta.net_id, join.dev_nonce);
        let join_accept = JoinAccept {
            app_nonce,
            net_id: meta.net_id,
            dev_addr: meta.dev_addr,
            dl_settings: meta.dl_settings(),
            rx_delay: meta.rx_delay,
            cf_list: meta.cf_list,
        }
        .seal(&app_key);

        let mut updated = lorawan.clone();
        updated.used_dev_nonces.push(join.dev_nonce);
        updated.session = Some(LorawanSession {
            dev_addr: meta.dev_addr,
            nwk_s_key: keys.nwk_s_key,
            app_s_key: keys.app_s_key,
            f_cnt_up: 0,
            f_cnt_down: 0,
        });

        Ok(Derivation {
            device: Device {
                app_id: device.app_id.clone(),
                dev_id: device.dev_id.clone(),
                protocol: DeviceProtocol::Lorawan(updated),
            },
            envelope: ActivationEnvelope {
                join_accept,
                dev_addr: meta.dev_addr,
                app_nonce,
                nwk_s_key: keys.nwk_s_key,
                app_s_key: keys.app_s_key,
            },
        })
    }

    fn challenge(
        &self,
        device: &Device,
        frame: &[u8],
    ) -> Result<ChallengeResponse, ActivationError> {
        let DeviceProtocol::Lorawan(lorawan) = &device.protocol;

        let join = JoinRequest::parse(frame)?;
        let app_key = lorawan.app_key.ok_or(ActivationError::MissingAppKey)?;
        let expected_mic = join.expected_mic(&app_key);

        Ok(ChallengeResponse {
            expected_mic,
            frame_mic: join.mic,
            matches: expected_mic == join.mic,
        })
    }
}

// =============================================================================
// STRATEGY TABLE
// =============================================================================

/// Strategies keyed by protocol tag.
#[derive(Clone, Default)]
pub struct StrategyTable {
    strategies: HashMap<DeviceKind, Arc<dyn SessionStrategy>>,
}

impl StrategyTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every built-in strategy.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.register(LorawanOtaa::default());
        table
    }

    /// Registers `strategy`, replacing any previous one for its kind.
    pub fn register(&mut self, strategy: impl SessionStrategy + 'static) {
        self.strategies.insert(strategy.kind(), Arc::new(strategy));
    }

    /// Strategy for `kind`.
    pub fn get(&self, kind: DeviceKind) -> Result<Arc<dyn SessionStrategy>, ActivationError> {
        self.strategies
            .get(&kind)
            .cloned()
            .ok_or(ActivationError::UnsupportedDeviceKind(kind))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DownlinkOption, LorawanActivationMetadata};
    use shared_types::{AesKey, AppEui, AppId, DevAddr, DevEui, DevId, DevNonce, LorawanDevice, NetId};

    struct FixedNonce;

    impl NonceSource for FixedNonce {
        fn app_nonce(&self) -> AppNonce {
            AppNonce::new([0x01, 0x02, 0x03])
        }
    }

    const APP_EUI: AppEui = AppEui::new([0x70, 0xB3, 0xD5, 0x7E, 0xD0, 0x00, 0x00, 0x01]);
    const DEV_EUI: DevEui = DevEui::new([0x00, 0x04, 0xA3, 0x0B, 0x00, 0x1A, 0x2B, 0x3C]);
    const APP_KEY: AesKey = AesKey::new([0x2B; 16]);

    fn device() -> Device {
        Device {
            app_id: AppId::new("app"),
            dev_id: DevId::new("dev"),
            protocol: DeviceProtocol::Lorawan(LorawanDevice::otaa(APP_EUI, DEV_EUI, APP_KEY)),
        }
    }

    fn request(payload: Vec<u8>) -> ActivationRequest {
        ActivationRequest {
            app_id: AppId::new("app"),
            dev_id: DevId::new("dev"),
            payload,
            metadata: ActivationMetadata::Lorawan(LorawanActivationMetadata {
                dev_addr: DevAddr::new([0x26, 0x01, 0x1B, 0xDA]),
                net_id: NetId::new([0x00, 0x00, 0x13]),
                rx1_dr_offset: 0,
                rx2_dr: 3,
                rx_delay: 1,
                cf_list: None,
            }),
            downlink_options: vec![DownlinkOption {
                identifier: "opt".into(),
                gateway_id: "gw".into(),
                score: 1,
            }],
        }
    }

    #[test]
    fn test_derive_updates_device() {
        let frame = JoinRequest::build(&APP_KEY, APP_EUI, DEV_EUI, DevNonce::new([0, 1]));
        let derivation = LorawanOtaa::new(FixedNonce)
            .derive(&device(), &request(frame))
            .unwrap();

        let DeviceProtocol::Lorawan(updated) = &derivation.device.protocol;
        assert_eq!(updated.used_dev_nonces, vec![DevNonce::new([0, 1])]);
        let session = updated.session.as_ref().unwrap();
        assert_eq!(session.f_cnt_up, 0);
        assert_eq!(session.nwk_s_key, derivation.envelope.nwk_s_key);
        assert_eq!(derivation.envelope.app_nonce, AppNonce::new([1, 2, 3]));
    }

    #[test]
    fn test_derive_rejects_foreign_eui() {
        let frame = JoinRequest::build(
            &APP_KEY,
            APP_EUI,
            DevEui::new([9; 8]),
            DevNonce::new([0, 1]),
        );
        let err = LorawanOtaa::new(FixedNonce)
            .derive(&device(), &request(frame))
            .unwrap_err();
        assert_eq!(err, ActivationError::EuiMismatch);
    }

    #[test]
    fn test_challenge_reports_match() {
        let frame = JoinRequest::build(&APP_KEY, APP_EUI, DEV_EUI, DevNonce::new([0, 9]));
        let response = LorawanOtaa::default().challenge(&device(), &frame).unwrap();
        assert!(response.matches);

        let mut tampered = frame;
        tampered[22] ^= 0xFF;
        let response = LorawanOtaa::default().challenge(&device(), &tampered).unwrap();
        assert!(!response.matches);
        assert_ne!(response.expected_mic, response.frame_mic);
    }

    #[test]
    fn test_table_lookup() {
        let table = StrategyTable::with_defaults();
        assert_eq!(table.get(DeviceKind::Lorawan).unwrap().kind(), DeviceKind::Lorawan);
        assert!(matches!(
            StrategyTable::new().get(DeviceKind::Lorawan),
            Err(ActivationError::UnsupportedDeviceKind(DeviceKind::Lorawan))
        ));
    }

    #[test]
    fn test_random_nonces_vary() {
        let source = RandomNonces;
        let nonces: Vec<AppNonce> = (0..8).map(|_| source.app_nonce()).collect();
        assert!(nonces.windows(2).any(|w| w[0] != w[1]));
    }
}
