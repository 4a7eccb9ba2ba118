use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use doorsense_embedded::LocalStorage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage file is corrupt: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to encode storage: {0}")]
    Encode(#[from] toml::ser::Error),
}

type Namespaces = BTreeMap<String, BTreeMap<String, String>>;

/// Key/value store persisted as a TOML file, one table per namespace.
/// Every mutation is written through so values survive a restart.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    data: Namespaces,
}

impl FileStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            toml::from_str(&fs::read_to_string(&path)?)?
        } else {
            Namespaces::new()
        };

        tracing::debug!("Opened storage at {}", path.display());
        Ok(Self { path, data })
    }

    fn persist(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string(&self.data)?)?;
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    type Error = StorageError;

    async fn get_item(&self, namespace: &str, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self
            .data
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn set_item(
        &mut self,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), Self::Error> {
        self.data
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.persist()
    }

    async fn remove_item(&mut self, namespace: &str, key: &str) -> Result<(), Self::Error> {
        if let Some(entries) = self.data.get_mut(namespace) {
            entries.remove(key);
        }
        self.persist()
    }

    async fn clear(&mut self, namespace: &str) -> Result<(), Self::Error> {
        self.data.remove(namespace);
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use doorsense_embedded::Credentials;

    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("doorsense-{}-{}.toml", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let path = scratch_path("reopen");
        let _ = fs::remove_file(&path);

        let mut storage = FileStorage::open(&path).unwrap();
        Credentials::new("Workshop", "door-sensor-ota")
            .store(&mut storage)
            .await
            .unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(
            Credentials::load(&reopened).await.unwrap(),
            Credentials::new("Workshop", "door-sensor-ota")
        );

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_clear_only_touches_namespace() {
        let path = scratch_path("clear");
        let _ = fs::remove_file(&path);

        let mut storage = FileStorage::open(&path).unwrap();
        storage.set_item("wifi", "ssid", "Workshop").await.unwrap();
        storage.set_item("boot", "count", "3").await.unwrap();
        storage.clear("wifi").await.unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("wifi", "ssid").await.unwrap(), None);
        assert_eq!(
            reopened.get_item("boot", "count").await.unwrap().as_deref(),
            Some("3")
        );

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_corrupt_file_reported() {
        let path = scratch_path("corrupt");
        fs::write(&path, "wifi = [").unwrap();

        assert!(matches!(FileStorage::open(&path), Err(StorageError::Parse(_))));

        fs::remove_file(&path).unwrap();
    }
}
