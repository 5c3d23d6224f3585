//! # Handler Configuration
//!
//! Unified configuration for the subsystems and runtime parameters.
//!
//! Every value has a default; `HANDLER_*` environment variables override
//! them. Unparseable overrides fall back to the default.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `HANDLER_SCRIPT_TIMEOUT_MS` | 100 | Wall-clock budget per function run |
//! | `HANDLER_SCRIPT_MAX_OPERATIONS` | 0 | Interpreter operation budget (0 = off) |
//! | `HANDLER_REGISTRY_TIMEOUT_MS` | 2000 | Ceiling for each registry call |
//! | `HANDLER_QUOTA_LIMIT` | 600 | Dry-run calls per quota window |
//! | `HANDLER_QUOTA_WINDOW_SECS` | 60 | Quota window length |

use crate::telemetry::TelemetryConfig;
use hd_01_script_sandbox::domain::SandboxLimits;
use hd_02_payload_codec::prelude::CodecConfig;
use hd_03_activation::prelude::ActivationConfig;
use shared_types::CallQuota;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Complete handler configuration.
#[derive(Debug, Clone, Default)]
pub struct HandlerConfig {
    /// Payload function limits.
    pub script: ScriptConfig,
    /// Registry access.
    pub registry: RegistryConfig,
    /// Call quota of the testing surface.
    pub quota: QuotaConfig,
    /// Logging.
    pub telemetry: TelemetryConfig,
}

impl HandlerConfig {
    /// Defaults overridden by `HANDLER_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            script: ScriptConfig {
                timeout: env_millis("HANDLER_SCRIPT_TIMEOUT_MS").unwrap_or(defaults.script.timeout),
                max_operations: env_parse("HANDLER_SCRIPT_MAX_OPERATIONS")
                    .unwrap_or(defaults.script.max_operations),
            },
            registry: RegistryConfig {
                timeout: env_millis("HANDLER_REGISTRY_TIMEOUT_MS")
                    .unwrap_or(defaults.registry.timeout),
            },
            quota: QuotaConfig {
                limit: env_parse("HANDLER_QUOTA_LIMIT").unwrap_or(defaults.quota.limit),
                window: env_parse("HANDLER_QUOTA_WINDOW_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.quota.window),
            },
            telemetry: TelemetryConfig::from_env(),
        }
    }

    /// Rejects values that would disable a safety ceiling.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a timeout, the quota limit or the quota window is
    /// zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.script.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("script"));
        }
        if self.registry.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("registry"));
        }
        if self.quota.limit == 0 {
            return Err(ConfigError::ZeroQuota);
        }
        if self.quota.window.is_zero() {
            return Err(ConfigError::ZeroQuotaWindow);
        }
        Ok(())
    }

    /// Sandbox limits for every function run.
    #[must_use]
    pub fn sandbox_limits(&self) -> SandboxLimits {
        SandboxLimits {
            timeout: self.script.timeout,
            max_operations: self.script.max_operations,
            ..SandboxLimits::default()
        }
    }

    /// Codec service configuration.
    #[must_use]
    pub fn codec(&self) -> CodecConfig {
        CodecConfig {
            limits: self.sandbox_limits(),
            registry_timeout: self.registry.timeout,
        }
    }

    /// Activation coordinator configuration.
    #[must_use]
    pub fn activation(&self) -> ActivationConfig {
        ActivationConfig {
            registry_timeout: self.registry.timeout,
        }
    }

    /// A fresh quota with the configured limit and window.
    #[must_use]
    pub fn call_quota(&self) -> CallQuota {
        CallQuota::new(self.quota.limit, self.quota.window)
    }
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A timeout is zero.
    #[error("{0} timeout cannot be 0")]
    ZeroTimeout(&'static str),

    /// Quota allows no calls.
    #[error("quota limit cannot be 0")]
    ZeroQuota,

    /// Quota window is empty.
    #[error("quota window cannot be 0")]
    ZeroQuotaWindow,
}

/// Payload function limits.
#[derive(Debug, Clone)]
pub struct ScriptConfig {
    /// Wall-clock budget per run.
    pub timeout: Duration,
    /// Interpreter operation budget; `0` disables it.
    pub max_operations: u64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        let limits = SandboxLimits::default();
        Self {
            timeout: limits.timeout,
            max_operations: limits.max_operations,
        }
    }
}

/// Registry access.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Ceiling for each registry call.
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
        }
    }
}

/// Fixed-window quota over the testing surface.
#[derive(Debug, Clone)]
pub struct QuotaConfig {
    /// Calls allowed per window.
    pub limit: u64,
    /// Window length.
    pub window: Duration,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit: 600,
            window: Duration::from_secs(60),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_millis(key: &str) -> Option<Duration> {
    env_parse(key).map(Duration::from_millis)
}
