use alloc::string::String;

use super::LocalStorage;
use crate::{Error, Result};

pub const CREDENTIALS_NAMESPACE: &str = "wifi";
pub const SSID_KEY: &str = "ssid";
pub const PASSWORD_KEY: &str = "password";

/// Network credentials committed by a credential transfer and consumed by
/// the update procedure.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String,
    pub password: String,
}

impl Credentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }

    /// Both fields are required to join a network.
    pub fn is_complete(&self) -> bool {
        !self.ssid.is_empty() && !self.password.is_empty()
    }

    /// Missing keys read as empty strings.
    pub async fn load<S>(storage: &S) -> Result<Self>
    where
        S: LocalStorage,
    {
        let ssid = storage
            .get_item(CREDENTIALS_NAMESPACE, SSID_KEY)
            .await
            .map_err(|e| {
                log::error!("[WiFi] Failed to read SSID: {:?}", e);
                Error::Storage
            })?
            .unwrap_or_default();
        let password = storage
            .get_item(CREDENTIALS_NAMESPACE, PASSWORD_KEY)
            .await
            .map_err(|e| {
                log::error!("[WiFi] Failed to read password: {:?}", e);
                Error::Storage
            })?
            .unwrap_or_default();

        Ok(Self { ssid, password })
    }

    pub async fn store<S>(&self, storage: &mut S) -> Result<()>
    where
        S: LocalStorage,
    {
        storage
            .set_item(CREDENTIALS_NAMESPACE, SSID_KEY, &self.ssid)
            .await
            .map_err(|e| {
                log::error!("[WiFi] Failed to write SSID: {:?}", e);
                Error::Storage
            })?;
        if let Err(e) = storage
            .set_item(CREDENTIALS_NAMESPACE, PASSWORD_KEY, &self.password)
            .await
        {
            log::error!("[WiFi] Failed to write password: {:?}", e);
            // The new SSID must not pair up with the previous password
            if let Err(e) = storage.remove_item(CREDENTIALS_NAMESPACE, SSID_KEY).await {
                log::error!("[WiFi] Failed to clear partial credentials: {:?}", e);
            }
            return Err(Error::Storage);
        }

        log::info!("[WiFi] Credentials saved (SSID: {})", self.ssid);
        Ok(())
    }
}

// The secret never ends up in logs
impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use crate::storage::MemoryStorage;

    use super::*;

    #[tokio::test]
    async fn test_store_then_load() {
        let mut storage = MemoryStorage::new();
        let credentials = Credentials::new("Workshop", "s3cret!");

        credentials.store(&mut storage).await.unwrap();

        assert_eq!(
            storage
                .get_item(CREDENTIALS_NAMESPACE, SSID_KEY)
                .await
                .unwrap()
                .as_deref(),
            Some("Workshop")
        );
        assert_eq!(Credentials::load(&storage).await.unwrap(), credentials);
    }

    #[tokio::test]
    async fn test_missing_keys_load_as_incomplete() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(CREDENTIALS_NAMESPACE, SSID_KEY, "Workshop")
            .await
            .unwrap();

        let credentials = Credentials::load(&storage).await.unwrap();
        assert_eq!(credentials.ssid, "Workshop");
        assert!(credentials.password.is_empty());
        assert!(!credentials.is_complete());
    }

    /// Refuses writes to one key, everything else goes to memory.
    struct RefusingStorage {
        inner: MemoryStorage,
        refused_key: &'static str,
    }

    impl LocalStorage for RefusingStorage {
        type Error = ();

        async fn get_item(
            &self,
            namespace: &str,
            key: &str,
        ) -> core::result::Result<Option<String>, ()> {
            self.inner.get_item(namespace, key).await
        }

        async fn set_item(
            &mut self,
            namespace: &str,
            key: &str,
            value: &str,
        ) -> core::result::Result<(), ()> {
            if key == self.refused_key {
                return Err(());
            }
            self.inner.set_item(namespace, key, value).await
        }

        async fn remove_item(
            &mut self,
            namespace: &str,
            key: &str,
        ) -> core::result::Result<(), ()> {
            self.inner.remove_item(namespace, key).await
        }

        async fn clear(&mut self, namespace: &str) -> core::result::Result<(), ()> {
            self.inner.clear(namespace).await
        }
    }

    #[tokio::test]
    async fn test_failed_password_write_leaves_no_mixed_pair() {
        let mut inner = MemoryStorage::new();
        Credentials::new("Old", "old-pass")
            .store(&mut inner)
            .await
            .unwrap();
        let mut storage = RefusingStorage {
            inner,
            refused_key: PASSWORD_KEY,
        };

        assert_eq!(
            Credentials::new("New", "new-pass").store(&mut storage).await,
            Err(Error::Storage)
        );

        let loaded = Credentials::load(&storage).await.unwrap();
        assert_ne!(loaded.ssid, "New");
        assert!(!loaded.is_complete());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("Workshop", "s3cret!"));
        assert!(rendered.contains("Workshop"));
        assert!(!rendered.contains("s3cret!"));
    }
}
