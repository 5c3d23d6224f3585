//! # Error Types
//!
//! All error types for the activation coordinator. Every variant is fatal to
//! the activation it belongs to; encoding failures never surface here.

use crate::domain::crypto::FrameError;
use crate::domain::entities::ActivationPhase;
use shared_types::{AppId, DevId, DevNonce, DeviceKind, RegistryError};
use thiserror::Error;

/// Errors that can occur during activation or a MIC challenge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActivationError {
    /// The broker offered no transmit slot.
    #[error("no downlink option offered")]
    NoDownlinkOption,

    /// Device not registered.
    #[error("unknown device {app_id}/{dev_id}")]
    UnknownDevice {
        /// Owning application.
        app_id: AppId,
        /// Requested device.
        dev_id: DevId,
    },

    /// Application not registered.
    #[error("unknown application {0}")]
    UnknownApplication(AppId),

    /// The registry timed out or is unreachable.
    #[error("registry unavailable: {0}")]
    RegistryUnavailable(RegistryError),

    /// The registry answered with an error.
    #[error("registry error: {0}")]
    Registry(RegistryError),

    /// No derivation strategy for the device's protocol.
    #[error("unsupported device kind: {0}")]
    UnsupportedDeviceKind(DeviceKind),

    /// Request metadata belongs to another protocol than the device.
    #[error("activation metadata is for {found}, device is {expected}")]
    MetadataMismatch {
        /// Kind of the device record.
        expected: DeviceKind,
        /// Kind of the request metadata.
        found: DeviceKind,
    },

    /// Malformed join-request.
    #[error("invalid join request: {0}")]
    InvalidJoinRequest(#[from] FrameError),

    /// Frame EUIs differ from the device record.
    #[error("join request EUIs do not match the device record")]
    EuiMismatch,

    /// The device has no AppKey.
    #[error("device has no AppKey")]
    MissingAppKey,

    /// Frame MIC did not verify.
    #[error("join request MIC mismatch")]
    MicMismatch,

    /// DevNonce seen in an earlier join.
    #[error("DevNonce {0} already used")]
    DevNonceReused(DevNonce),
}

impl ActivationError {
    /// Returns true if the same request may succeed later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RegistryUnavailable(_))
    }

    /// Earliest phase that can raise the error.
    #[must_use]
    pub fn phase(&self) -> ActivationPhase {
        match self {
            Self::NoDownlinkOption => ActivationPhase::Received,
            Self::UnknownDevice { .. }
            | Self::UnknownApplication(_)
            | Self::RegistryUnavailable(_)
            | Self::Registry(_) => ActivationPhase::Resolving,
            _ => ActivationPhase::Deriving,
        }
    }
}

impl From<RegistryError> for ActivationError {
    fn from(err: RegistryError) -> Self {
        if err.is_retryable() {
            Self::RegistryUnavailable(err)
        } else {
            Self::Registry(err)
        }
    }
}
