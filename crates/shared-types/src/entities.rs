//! # Core Domain Entities
//!
//! Records shared by every handler subsystem.
//!
//! ## Clusters
//!
//! - **Registry records**: `Application`, `Device`, `DeviceProtocol`
//! - **Traffic**: `UplinkMessage`, `DownlinkMessage`, `DownlinkPayload`
//! - **Diagnostics**: `LogEntry`
//!
//! Application and device records are owned by the external registry; the
//! handler only reads them and writes back whole records.

use crate::lorawan::LorawanDevice;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured application data exchanged with payload functions.
///
/// Always a JSON object at the top level.
pub type Fields = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Application identifier, unique within the handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppId(pub String);

/// Device identifier, unique within its application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DevId(pub String);

impl AppId {
    /// Creates an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DevId {
    /// Creates an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DevId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// APPLICATION
// =============================================================================

/// The payload functions an application may define.
///
/// Every function is optional. Sources are plain script text and are never
/// modified while a pipeline run is using them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadFunctions {
    /// `Decoder(bytes, port)` source.
    #[serde(default)]
    pub decoder: Option<String>,
    /// `Converter(fields, port)` source.
    #[serde(default)]
    pub converter: Option<String>,
    /// `Validator(fields, port)` source.
    #[serde(default)]
    pub validator: Option<String>,
    /// `Encoder(fields, port)` source.
    #[serde(default)]
    pub encoder: Option<String>,
}

impl PayloadFunctions {
    /// Returns true if no function is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decoder.is_none()
            && self.converter.is_none()
            && self.validator.is_none()
            && self.encoder.is_none()
    }
}

/// Downlink the handler sends alongside a join acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationDownlink {
    /// Application port (1..=223).
    pub port: u8,
    /// Fields to encode, or raw bytes.
    pub payload: DownlinkPayload,
}

/// An application registered with the handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    /// Unique identifier.
    pub app_id: AppId,
    /// Payload functions.
    #[serde(default)]
    pub functions: PayloadFunctions,
    /// Optional payload sent with every join acceptance.
    #[serde(default)]
    pub activation_downlink: Option<ActivationDownlink>,
}

impl Application {
    /// Creates an application without functions.
    #[must_use]
    pub fn new(app_id: AppId) -> Self {
        Self {
            app_id,
            functions: PayloadFunctions::default(),
            activation_downlink: None,
        }
    }
}

// =============================================================================
// DEVICE
// =============================================================================

/// Discriminator of [`DeviceProtocol`], used to look up per-protocol
/// strategies without matching on the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// LoRaWAN 1.0.x device.
    Lorawan,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lorawan => f.write_str("lorawan"),
        }
    }
}

/// Protocol-specific part of a device record. Exactly one variant is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceProtocol {
    /// LoRaWAN device.
    Lorawan(LorawanDevice),
}

impl DeviceProtocol {
    /// Returns the variant tag.
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Lorawan(_) => DeviceKind::Lorawan,
        }
    }
}

/// A device registered under an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Owning application.
    pub app_id: AppId,
    /// Identifier within the application.
    pub dev_id: DevId,
    /// Protocol payload.
    pub protocol: DeviceProtocol,
}

impl Device {
    /// Returns the protocol tag.
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        self.protocol.kind()
    }
}

// =============================================================================
// TRAFFIC
// =============================================================================

/// Uplink as received from the broker after deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UplinkMessage {
    /// Owning application.
    pub app_id: AppId,
    /// Sending device.
    pub dev_id: DevId,
    /// Application port.
    pub port: u8,
    /// Decrypted FRMPayload.
    pub payload: Vec<u8>,
}

/// Downlink body: structured fields to encode, or bytes to send as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownlinkPayload {
    /// Bytes sent unchanged.
    Raw(Vec<u8>),
    /// Fields passed to the application's encoder.
    Fields(Fields),
}

/// Downlink scheduled by an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownlinkMessage {
    /// Owning application.
    pub app_id: AppId,
    /// Target device.
    pub dev_id: DevId,
    /// Application port.
    pub port: u8,
    /// Body.
    pub payload: DownlinkPayload,
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// One log call made by a payload function.
///
/// `fields` holds the JSON encoding of each argument, in call order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Function that produced the entry (`decoder`, `converter`, ...).
    pub function: String,
    /// JSON-encoded arguments.
    pub fields: Vec<String>,
}

impl LogEntry {
    /// Creates an entry.
    pub fn new(function: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            function: function.into(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lorawan::{AesKey, AppEui, DevEui};

    #[test]
    fn test_device_kind_tag() {
        let device = Device {
            app_id: AppId::new("app"),
            dev_id: DevId::new("dev"),
            protocol: DeviceProtocol::Lorawan(LorawanDevice::otaa(
                AppEui::default(),
                DevEui::default(),
                AesKey::default(),
            )),
        };
        assert_eq!(device.kind(), DeviceKind::Lorawan);
        assert_eq!(device.kind().to_string(), "lorawan");
    }

    #[test]
    fn test_device_protocol_serializes_with_tag() {
        let protocol = DeviceProtocol::Lorawan(LorawanDevice::otaa(
            AppEui::default(),
            DevEui::default(),
            AesKey::default(),
        ));
        let json = serde_json::to_value(&protocol).unwrap();
        assert_eq!(json["kind"], "lorawan");
    }

    #[test]
    fn test_payload_functions_empty() {
        let mut functions = PayloadFunctions::default();
        assert!(functions.is_empty());
        functions.validator = Some("fn Validator(f, p) { true }".into());
        assert!(!functions.is_empty());
    }

    #[test]
    fn test_application_deserializes_without_functions() {
        let app: Application = serde_json::from_str(r#"{"app_id":"demo"}"#).unwrap();
        assert_eq!(app.app_id.as_str(), "demo");
        assert!(app.functions.is_empty());
        assert!(app.activation_downlink.is_none());
    }
}
