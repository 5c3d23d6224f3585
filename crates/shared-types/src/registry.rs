//! # Registry Port
//!
//! The handler never stores application or device records itself. It reads
//! and writes them through `DeviceRegistry`, an async key-value collaborator
//! keyed by application id and `(application id, device id)`.
//!
//! `InMemoryRegistry` backs tests and the standalone binary. It can inject
//! latency and outages so callers can exercise their timeout paths.

use crate::entities::{AppId, Application, DevId, Device};
use crate::errors::RegistryError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

// =============================================================================
// PORT
// =============================================================================

/// Lookup and upsert of registry records.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Fetches an application. `Ok(None)` when it does not exist.
    async fn get_application(&self, app_id: &AppId) -> Result<Option<Application>, RegistryError>;

    /// Fetches a device. `Ok(None)` when it does not exist.
    async fn get_device(
        &self,
        app_id: &AppId,
        dev_id: &DevId,
    ) -> Result<Option<Device>, RegistryError>;

    /// Inserts or replaces a device record.
    async fn set_device(&self, device: Device) -> Result<(), RegistryError>;
}

/// Runs a registry call with a ceiling, mapping expiry to
/// [`RegistryError::Timeout`].
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, RegistryError>
where
    F: Future<Output = Result<T, RegistryError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(RegistryError::Timeout {
            timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

// =============================================================================
// IN-MEMORY ADAPTER
// =============================================================================

/// In-memory registry for tests and local runs.
#[derive(Default)]
pub struct InMemoryRegistry {
    applications: RwLock<HashMap<AppId, Application>>,
    devices: RwLock<HashMap<(AppId, DevId), Device>>,
    latency: RwLock<Option<Duration>>,
    unavailable: RwLock<bool>,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an application (whole-record replacement).
    pub fn put_application(&self, application: Application) {
        self.applications
            .write()
            .insert(application.app_id.clone(), application);
    }

    /// Inserts or replaces a device.
    pub fn put_device(&self, device: Device) {
        self.devices
            .write()
            .insert((device.app_id.clone(), device.dev_id.clone()), device);
    }

    /// Removes a device, returning it if present.
    pub fn remove_device(&self, app_id: &AppId, dev_id: &DevId) -> Option<Device> {
        self.devices
            .write()
            .remove(&(app_id.clone(), dev_id.clone()))
    }

    /// Reads a device without going through the async port.
    #[must_use]
    pub fn device(&self, app_id: &AppId, dev_id: &DevId) -> Option<Device> {
        self.devices
            .read()
            .get(&(app_id.clone(), dev_id.clone()))
            .cloned()
    }

    /// Number of stored devices.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write() = latency;
    }

    /// Makes every call fail with [`RegistryError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write() = unavailable;
    }

    async fn simulate(&self) -> Result<(), RegistryError> {
        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if *self.unavailable.read() {
            return Err(RegistryError::Unavailable("registry offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryRegistry {
    async fn get_application(&self, app_id: &AppId) -> Result<Option<Application>, RegistryError> {
        self.simulate().await?;
        Ok(self.applications.read().get(app_id).cloned())
    }

    async fn get_device(
        &self,
        app_id: &AppId,
        dev_id: &DevId,
    ) -> Result<Option<Device>, RegistryError> {
        self.simulate().await?;
        Ok(self.device(app_id, dev_id))
    }

    async fn set_device(&self, device: Device) -> Result<(), RegistryError> {
        self.simulate().await?;
        self.put_device(device);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::DeviceProtocol;
    use crate::lorawan::{AesKey, AppEui, DevEui, LorawanDevice};

    fn device(app: &str, dev: &str) -> Device {
        Device {
            app_id: AppId::new(app),
            dev_id: DevId::new(dev),
            protocol: DeviceProtocol::Lorawan(LorawanDevice::otaa(
                AppEui::default(),
                DevEui::default(),
                AesKey::default(),
            )),
        }
    }

    #[tokio::test]
    async fn test_lookup_and_upsert() {
        let registry = InMemoryRegistry::new();
        registry.put_application(Application::new(AppId::new("app")));

        assert!(registry
            .get_application(&AppId::new("app"))
            .await
            .unwrap()
            .is_some());
        assert!(registry
            .get_device(&AppId::new("app"), &DevId::new("dev"))
            .await
            .unwrap()
            .is_none());

        registry.set_device(device("app", "dev")).await.unwrap();
        registry.set_device(device("app", "dev")).await.unwrap();
        assert_eq!(registry.device_count(), 1);
    }

    #[tokio::test]
    async fn test_same_dev_id_in_two_applications() {
        let registry = InMemoryRegistry::new();
        registry.put_device(device("a", "dev"));
        registry.put_device(device("b", "dev"));
        assert_eq!(registry.device_count(), 2);
        assert!(registry.remove_device(&AppId::new("a"), &DevId::new("dev")).is_some());
        assert_eq!(registry.device_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_is_retryable() {
        let registry = InMemoryRegistry::new();
        registry.set_unavailable(true);
        let err = registry.get_application(&AppId::new("app")).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_bounded_maps_expiry_to_timeout() {
        let registry = InMemoryRegistry::new();
        registry.set_latency(Some(Duration::from_millis(200)));

        let err = bounded(
            Duration::from_millis(10),
            registry.get_application(&AppId::new("app")),
        )
        .await
        .unwrap_err();
        assert_eq!(err, RegistryError::Timeout { timeout_ms: 10 });
    }
}
