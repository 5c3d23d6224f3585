//! # LoRaWAN 1.0.x Join Cryptography
//!
//! Frame layouts (wire order, multi-byte fields little-endian):
//!
//! ```text
//! join-request:  MHDR(0x00) | AppEUI(8) | DevEUI(8) | DevNonce(2) | MIC(4)
//! join-accept:   MHDR(0x20) | AppNonce(3) | NetID(3) | DevAddr(4)
//!                | DLSettings(1) | RxDelay(1) | [CFList(16)] | MIC(4)
//! ```
//!
//! - MICs are the first four bytes of AES-CMAC under the AppKey.
//! - Session keys are `aes128_encrypt(AppKey, tag | AppNonce | NetID | DevNonce | pad)`
//!   with tag `0x01` (NwkSKey) or `0x02` (AppSKey).
//! - The join-accept body after MHDR is run through AES *decrypt* so the
//!   device only needs the encrypt primitive to open it.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;
use cmac::{Cmac, Mac};
use shared_types::{AesKey, AppEui, AppNonce, DevAddr, DevEui, DevNonce, NetId};

/// MHDR of a join-request (MType 000, Major 00).
pub const MHDR_JOIN_REQUEST: u8 = 0x00;
/// MHDR of a join-accept (MType 001, Major 00).
pub const MHDR_JOIN_ACCEPT: u8 = 0x20;
/// Length of a join-request PHYPayload.
pub const JOIN_REQUEST_LEN: usize = 23;
/// Length of the optional channel frequency list.
pub const CF_LIST_LEN: usize = 16;

const MIC_LEN: usize = 4;
const BLOCK_LEN: usize = 16;

/// Errors raised while parsing or opening frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Wrong total length.
    #[error("expected {expected} bytes, got {actual}")]
    Length {
        /// Required length.
        expected: usize,
        /// Length received.
        actual: usize,
    },
    /// Wrong message type.
    #[error("unexpected MHDR 0x{0:02X}")]
    Mhdr(u8),
}

// =============================================================================
// PRIMITIVES
// =============================================================================

/// AES-CMAC of `data` under `key`.
#[must_use]
pub fn aes_cmac(key: &AesKey, data: &[u8]) -> [u8; 16] {
    let mut mac = <Cmac<Aes128> as Mac>::new(GenericArray::from_slice(key.expose()));
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Four-byte LoRaWAN MIC of `data`.
#[must_use]
pub fn mic(key: &AesKey, data: &[u8]) -> [u8; 4] {
    let full = aes_cmac(key, data);
    [full[0], full[1], full[2], full[3]]
}

/// Encrypts one block.
#[must_use]
pub fn aes_encrypt_block(key: &AesKey, block: [u8; 16]) -> [u8; 16] {
    let cipher = Aes128::new(GenericArray::from_slice(key.expose()));
    let mut block = GenericArray::from(block);
    cipher.encrypt_block(&mut block);
    block.into()
}

/// Decrypts one block.
#[must_use]
pub fn aes_decrypt_block(key: &AesKey, block: [u8; 16]) -> [u8; 16] {
    let cipher = Aes128::new(GenericArray::from_slice(key.expose()));
    let mut block = GenericArray::from(block);
    cipher.decrypt_block(&mut block);
    block.into()
}

// =============================================================================
// JOIN REQUEST
// =============================================================================

/// Parsed join-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRequest {
    /// Application EUI.
    pub app_eui: AppEui,
    /// Device EUI.
    pub dev_eui: DevEui,
    /// Device nonce.
    pub dev_nonce: DevNonce,
    /// MIC carried by the frame.
    pub mic: [u8; 4],
}

impl JoinRequest {
    /// Parses a join-request PHYPayload.
    pub fn parse(frame: &[u8]) -> Result<Self, FrameError> {
        if frame.len() != JOIN_REQUEST_LEN {
            return Err(FrameError::Length {
                expected: JOIN_REQUEST_LEN,
                actual: frame.len(),
            });
        }
        if frame[0] != MHDR_JOIN_REQUEST {
            return Err(FrameError::Mhdr(frame[0]));
        }

        let mut app_eui = [0u8; 8];
        let mut dev_eui = [0u8; 8];
        let mut dev_nonce = [0u8; 2];
        let mut mic = [0u8; 4];
        app_eui.copy_from_slice(&frame[1..9]);
        dev_eui.copy_from_slice(&frame[9..17]);
        dev_nonce.copy_from_slice(&frame[17..19]);
        mic.copy_from_slice(&frame[19..23]);

        Ok(Self {
            app_eui: AppEui::from_le_bytes(app_eui),
            dev_eui: DevEui::from_le_bytes(dev_eui),
            dev_nonce: DevNonce::from_le_bytes(dev_nonce),
            mic,
        })
    }

    /// Frame bytes covered by the MIC.
    #[must_use]
    pub fn signed_bytes(&self) -> [u8; JOIN_REQUEST_LEN - MIC_LEN] {
        let mut out = [0u8; JOIN_REQUEST_LEN - MIC_LEN];
        out[0] = MHDR_JOIN_REQUEST;
        out[1..9].copy_from_slice(&self.app_eui.to_le_bytes());
        out[9..17].copy_from_slice(&self.dev_eui.to_le_bytes());
        out[17..19].copy_from_slice(&self.dev_nonce.to_le_bytes());
        out
    }

    /// MIC the frame should carry under `app_key`.
    #[must_use]
    pub fn expected_mic(&self, app_key: &AesKey) -> [u8; 4] {
        mic(app_key, &self.signed_bytes())
    }

    /// Builds a signed join-request frame.
    #[must_use]
    pub fn build(app_key: &AesKey, app_eui: AppEui, dev_eui: DevEui, dev_nonce: DevNonce) -> Vec<u8> {
        let mut request = Self {
            app_eui,
            dev_eui,
            dev_nonce,
            mic: [0; 4],
        };
        request.mic = request.expected_mic(app_key);

        let mut frame = request.signed_bytes().to_vec();
        frame.extend_from_slice(&request.mic);
        frame
    }
}

// =============================================================================
// SESSION KEYS
// =============================================================================

/// NwkSKey and AppSKey of one join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionKeys {
    /// Network session key.
    pub nwk_s_key: AesKey,
    /// Application session key.
    pub app_s_key: AesKey,
}

/// Derives both session keys.
#[must_use]
pub fn derive_session_keys(
    app_key: &AesKey,
    app_nonce: AppNonce,
    net_id: NetId,
    dev_nonce: DevNonce,
) -> SessionKeys {
    let block = |tag: u8| {
        let mut b = [0u8; BLOCK_LEN];
        b[0] = tag;
        b[1..4].copy_from_slice(&app_nonce.to_le_bytes());
        b[4..7].copy_from_slice(&net_id.to_le_bytes());
        b[7..9].copy_from_slice(&dev_nonce.to_le_bytes());
        b
    };

    SessionKeys {
        nwk_s_key: AesKey::new(aes_encrypt_block(app_key, block(0x01))),
        app_s_key: AesKey::new(aes_encrypt_block(app_key, block(0x02))),
    }
}

// =============================================================================
// JOIN ACCEPT
// =============================================================================

/// Plaintext fields of a join-accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinAccept {
    /// Handler nonce.
    pub app_nonce: AppNonce,
    /// Network identifier.
    pub net_id: NetId,
    /// Assigned address.
    pub dev_addr: DevAddr,
    /// RX1 data rate offset (bits 6..4) and RX2 data rate (bits 3..0).
    pub dl_settings: u8,
    /// RX1 delay in seconds.
    pub rx_delay: u8,
    /// Optional channel frequency list.
    pub cf_list: Option<[u8; CF_LIST_LEN]>,
}

impl JoinAccept {
    fn plaintext(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 12 + CF_LIST_LEN + MIC_LEN);
        out.push(MHDR_JOIN_ACCEPT);
        out.extend_from_slice(&self.app_nonce.to_le_bytes());
        out.extend_from_slice(&self.net_id.to_le_bytes());
        out.extend_from_slice(&self.dev_addr.to_le_bytes());
        out.push(self.dl_settings);
        out.push(self.rx_delay);
        if let Some(cf_list) = &self.cf_list {
            out.extend_from_slice(cf_list);
        }
        out
    }

    /// Builds the encrypted join-accept PHYPayload.
    #[must_use]
    pub fn seal(&self, app_key: &AesKey) -> Vec<u8> {
        let mut frame = self.plaintext();
        let code = mic(app_key, &frame);
        frame.extend_from_slice(&code);

        for chunk in frame[1..].chunks_exact_mut(BLOCK_LEN) {
            let mut block = [0u8; BLOCK_LEN];
            block.copy_from_slice(chunk);
            chunk.copy_from_slice(&aes_decrypt_block(app_key, block));
        }
        frame
    }

    /// Opens a join-accept as the device would, checking its MIC.
    ///
    /// Returns `None` if the MIC does not verify.
    pub fn open(app_key: &AesKey, frame: &[u8]) -> Result<Option<Self>, FrameError> {
        let short = 1 + 12 + MIC_LEN;
        let long = short + CF_LIST_LEN;
        if frame.len() != short && frame.len() != long {
            return Err(FrameError::Length {
                expected: short,
                actual: frame.len(),
            });
        }
        if frame[0] != MHDR_JOIN_ACCEPT {
            return Err(FrameError::Mhdr(frame[0]));
        }

        let mut plain = frame.to_vec();
        for chunk in plain[1..].chunks_exact_mut(BLOCK_LEN) {
            let mut block = [0u8; BLOCK_LEN];
            block.copy_from_slice(chunk);
            chunk.copy_from_slice(&aes_encrypt_block(app_key, block));
        }

        let (body, carried) = plain.split_at(plain.len() - MIC_LEN);
        if mic(app_key, body) != carried {
            return Ok(None);
        }

        let mut app_nonce = [0u8; 3];
        let mut net_id = [0u8; 3];
        let mut dev_addr = [0u8; 4];
        app_nonce.copy_from_slice(&body[1..4]);
        net_id.copy_from_slice(&body[4..7]);
        dev_addr.copy_from_slice(&body[7..11]);
        let cf_list = (body.len() == 13 + CF_LIST_LEN).then(|| {
            let mut list = [0u8; CF_LIST_LEN];
            list.copy_from_slice(&body[13..]);
            list
        });

        Ok(Some(Self {
            app_nonce: AppNonce::from_le_bytes(app_nonce),
            net_id: NetId::from_le_bytes(net_id),
            dev_addr: DevAddr::from_le_bytes(dev_addr),
            dl_settings: body[11],
            rx_delay: body[12],
            cf_list,
        }))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(hex_str: &str) -> AesKey {
        AesKey::from_hex(hex_str).unwrap()
    }

    #[test]
    fn test_aes_fips197_vector() {
        let k = key("000102030405060708090a0b0c0d0e0f");
        let mut plain = [0u8; 16];
        plain.copy_from_slice(&hex::decode("00112233445566778899aabbccddeeff").unwrap());
        let cipher = aes_encrypt_block(&k, plain);
        assert_eq!(hex::encode(cipher), "69c4e0d86a7b0430d8cdb78070b4c55a");
        assert_eq!(aes_decrypt_block(&k, cipher), plain);
    }

    #[test]
    fn test_cmac_rfc4493_vectors() {
        let k = key("2b7e151628aed2a6abf7158809cf4f3c");
        assert_eq!(
            hex::encode(aes_cmac(&k, &[])),
            "bb1d6929e95937287fa37d129b756746"
        );
        let msg = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();
        assert_eq!(
            hex::encode(aes_cmac(&k, &msg)),
            "070a16b46b4d4144f79bdd9dd04a287c"
        );
    }

    #[test]
    fn test_join_request_roundtrip() {
        let app_key = key("00112233445566778899AABBCCDDEEFF");
        let app_eui = AppEui::new([1, 2, 3, 4, 5, 6, 7, 8]);
        let dev_eui = DevEui::new([8, 7, 6, 5, 4, 3, 2, 1]);
        let frame = JoinRequest::build(&app_key, app_eui, dev_eui, DevNonce::new([0xAB, 0xCD]));

        assert_eq!(frame.len(), JOIN_REQUEST_LEN);
        assert_eq!(frame[17..19], [0xCD, 0xAB]);

        let parsed = JoinRequest::parse(&frame).unwrap();
        assert_eq!(parsed.app_eui, app_eui);
        assert_eq!(parsed.dev_eui, dev_eui);
        assert_eq!(parsed.mic, parsed.expected_mic(&app_key));
    }

    #[test]
    fn test_join_request_rejects_bad_frames() {
        assert!(matches!(
            JoinRequest::parse(&[0u8; 10]),
            Err(FrameError::Length { .. })
        ));
        let mut frame = [0u8; JOIN_REQUEST_LEN];
        frame[0] = 0x40;
        assert_eq!(JoinRequest::parse(&frame), Err(FrameError::Mhdr(0x40)));
    }

    #[test]
    fn test_session_keys_differ_and_are_deterministic() {
        let app_key = key("2B7E151628AED2A6ABF7158809CF4F3C");
        let a = derive_session_keys(
            &app_key,
            AppNonce::new([1, 2, 3]),
            NetId::new([0, 0, 0x13]),
            DevNonce::new([0, 1]),
        );
        let b = derive_session_keys(
            &app_key,
            AppNonce::new([1, 2, 3]),
            NetId::new([0, 0, 0x13]),
            DevNonce::new([0, 1]),
        );
        assert_eq!(a, b);
        assert_ne!(a.nwk_s_key, a.app_s_key);
    }

    /// Fixed LoRaWAN 1.0.2 join under the RFC 4493 key. Wire bytes:
    /// AppNonce `010203`, NetID `130000`, DevNonce `5C2B`,
    /// DevAddr `DA1B0126`, DLSettings `00`, RxDelay `01`.
    #[test]
    fn test_join_known_answer() {
        let app_key = key("2B7E151628AED2A6ABF7158809CF4F3C");
        let app_eui = AppEui::new([0x70, 0xB3, 0xD5, 0x7E, 0xD0, 0x00, 0x00, 0x01]);
        let dev_eui = DevEui::new([0x00, 0x04, 0xA3, 0x0B, 0x00, 0x1A, 0x2B, 0x3C]);
        let dev_nonce = DevNonce::new([0x2B, 0x5C]);
        let app_nonce = AppNonce::new([0x03, 0x02, 0x01]);
        let net_id = NetId::new([0x00, 0x00, 0x13]);

        let request = JoinRequest::build(&app_key, app_eui, dev_eui, dev_nonce);
        assert_eq!(
            hex::encode(&request),
            "00010000d07ed5b3703c2b1a000ba304005c2ba0f59942"
        );

        let keys = derive_session_keys(&app_key, app_nonce, net_id, dev_nonce);
        assert_eq!(keys.nwk_s_key, key("a8c2cc5cff4d7cb90abea3ae87b52f93"));
        assert_eq!(keys.app_s_key, key("e6633214f336bd59adda0d6f0c350730"));

        let accept = JoinAccept {
            app_nonce,
            net_id,
            dev_addr: DevAddr::new([0x26, 0x01, 0x1B, 0xDA]),
            dl_settings: 0x00,
            rx_delay: 0x01,
            cf_list: None,
        };
        assert_eq!(
            hex::encode(accept.seal(&app_key)),
            "203513ef54c0ce6b650451db4f49f61db7"
        );
    }

    #[test]
    fn test_join_accept_seal_and_open() {
        let app_key = key("00112233445566778899AABBCCDDEEFF");
        for cf_list in [None, Some([7u8; CF_LIST_LEN])] {
            let accept = JoinAccept {
                app_nonce: AppNonce::new([0xA1, 0xB2, 0xC3]),
                net_id: NetId::new([0, 0, 0x13]),
                dev_addr: DevAddr::new([0x26, 0x01, 0x1B, 0xDA]),
                dl_settings: 0x03,
                rx_delay: 1,
                cf_list,
            };
            let frame = accept.seal(&app_key);
            assert_eq!(frame[0], MHDR_JOIN_ACCEPT);
            assert_eq!(JoinAccept::open(&app_key, &frame).unwrap(), Some(accept));

            let other = key("FFEEDDCCBBAA99887766554433221100");
            assert_eq!(JoinAccept::open(&other, &frame).unwrap(), None);
        }
    }
}
