//! # LoRaWAN Value Objects
//!
//! Fixed-width identifiers and key material used by the LoRaWAN 1.0.x join
//! procedure. All types render as upper-case hex, most significant byte
//! first, which is how EUIs and addresses are printed on device labels.
//!
//! Byte order on the air is little-endian; use `to_le_bytes` /
//! `from_le_bytes` at the frame boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! hex_identifier {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Width in bytes.
            pub const LEN: usize = $len;

            /// Creates the value from big-endian (display order) bytes.
            #[must_use]
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Returns the big-endian (display order) bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Returns the little-endian (wire order) bytes.
            #[must_use]
            pub fn to_le_bytes(&self) -> [u8; $len] {
                let mut out = self.0;
                out.reverse();
                out
            }

            /// Creates the value from little-endian (wire order) bytes.
            #[must_use]
            pub fn from_le_bytes(mut bytes: [u8; $len]) -> Self {
                bytes.reverse();
                Self(bytes)
            }

            /// Parses upper- or lower-case hex in display order.
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let mut out = [0u8; $len];
                hex::decode_to_slice(s, &mut out)?;
                Ok(Self(out))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode_upper(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }
    };
}

hex_identifier!(
    /// 64-bit extended unique identifier (AppEUI / JoinEUI).
    AppEui,
    8
);
hex_identifier!(
    /// 64-bit extended unique identifier of the end device.
    DevEui,
    8
);
hex_identifier!(
    /// 32-bit network address assigned on activation.
    DevAddr,
    4
);
hex_identifier!(
    /// 24-bit network identifier.
    NetId,
    3
);
hex_identifier!(
    /// Device-chosen join nonce. Must never repeat for one device.
    DevNonce,
    2
);
hex_identifier!(
    /// Handler-chosen join nonce sent back in the join-accept.
    AppNonce,
    3
);

/// 128-bit AES key (AppKey, NwkSKey, AppSKey).
///
/// `Debug` is redacted so keys cannot leak through `tracing` field capture or
/// panic messages. Use [`AesKey::expose`] where the raw bytes are needed.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AesKey([u8; 16]);

impl AesKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn expose(&self) -> &[u8; 16] {
        &self.0
    }

    /// Parses a 32-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut out = [0u8; 16];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AesKey(<redacted>)")
    }
}

/// Session state written into a device record by a successful join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LorawanSession {
    /// Network address of the device.
    pub dev_addr: DevAddr,
    /// Network session key.
    pub nwk_s_key: AesKey,
    /// Application session key.
    pub app_s_key: AesKey,
    /// Uplink frame counter.
    pub f_cnt_up: u32,
    /// Downlink frame counter.
    pub f_cnt_down: u32,
}

/// LoRaWAN-specific part of a device record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LorawanDevice {
    /// Application EUI the device joins with.
    pub app_eui: AppEui,
    /// Device EUI.
    pub dev_eui: DevEui,
    /// Root key for OTAA. `None` for ABP-only devices.
    pub app_key: Option<AesKey>,
    /// Every DevNonce accepted so far, oldest first.
    #[serde(default)]
    pub used_dev_nonces: Vec<DevNonce>,
    /// Current session, if the device has joined.
    #[serde(default)]
    pub session: Option<LorawanSession>,
}

impl LorawanDevice {
    /// Creates an OTAA device that has not joined yet.
    #[must_use]
    pub fn otaa(app_eui: AppEui, dev_eui: DevEui, app_key: AesKey) -> Self {
        Self {
            app_eui,
            dev_eui,
            app_key: Some(app_key),
            used_dev_nonces: Vec::new(),
            session: None,
        }
    }

    /// Returns true if `nonce` was accepted in an earlier join.
    #[must_use]
    pub fn has_used_nonce(&self, nonce: DevNonce) -> bool {
        self.used_dev_nonces.contains(&nonce)
    }
}
