//! # Codec Property Tests (hd-02)
//!
//! A symmetric encoder/decoder pair must reproduce the fields it was given,
//! and pipelines must be deterministic.

use hd_02_payload_codec::prelude::*;
use proptest::prelude::*;
use serde_json::{json, Value};
use shared_types::{DownlinkPayload, Fields, PayloadFunctions};

const ENCODER: &str = r#"
    fn Encoder(f, port) {
        [f.led, (f.level >> 8) & 0xFF, f.level & 0xFF]
    }
"#;

const DECODER: &str = r#"
    fn Decoder(bytes, port) {
        #{ led: bytes[0], level: (bytes[1] << 8) | bytes[2] }
    }
"#;

fn symmetric_functions() -> PayloadFunctions {
    PayloadFunctions {
        decoder: Some(DECODER.to_string()),
        encoder: Some(ENCODER.to_string()),
        ..PayloadFunctions::default()
    }
}

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap_or_default()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_decode_inverts_encode(led in 0u8..=1, level in 0u16..=u16::MAX, port in 1u8..=223) {
        let pipeline: PayloadCodecPipeline = PayloadCodecPipeline::default();
        let functions = symmetric_functions();
        let original = fields(json!({"led": led, "level": level}));

        let encoded = pipeline
            .downlink(&functions, DownlinkPayload::Fields(original.clone()), port)
            .unwrap();
        prop_assert_eq!(encoded.payload.len(), 3);

        let decoded = pipeline.uplink(&functions, &encoded.payload, port).unwrap();
        prop_assert_eq!(decoded.fields, original);
        prop_assert!(decoded.valid);
    }

    #[test]
    fn prop_raw_downlink_is_identity(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let pipeline: PayloadCodecPipeline = PayloadCodecPipeline::default();
        let out = pipeline
            .downlink(&symmetric_functions(), DownlinkPayload::Raw(bytes.clone()), 1)
            .unwrap();
        prop_assert_eq!(out.payload, bytes);
    }

    #[test]
    fn prop_uplink_without_functions_is_identity(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let pipeline: PayloadCodecPipeline = PayloadCodecPipeline::default();
        let out = pipeline.uplink(&PayloadFunctions::default(), &bytes, 1).unwrap();
        prop_assert_eq!(out.payload, bytes);
        prop_assert!(out.fields.is_empty());
    }
}

#[test]
fn test_uplink_is_idempotent() {
    let pipeline: PayloadCodecPipeline = PayloadCodecPipeline::default();
    let functions = PayloadFunctions {
        decoder: Some(DECODER.to_string()),
        validator: Some("fn Validator(f, port) { f.led == 1 }".to_string()),
        ..PayloadFunctions::default()
    };

    let first = pipeline.uplink(&functions, &[1, 0x01, 0x02], 5).unwrap();
    let second = pipeline.uplink(&functions, &[1, 0x01, 0x02], 5).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.fields["level"], json!(258));
    assert!(first.valid);
}
