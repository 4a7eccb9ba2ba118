use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use super::LocalStorage;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: BTreeMap<(String, String), String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl LocalStorage for MemoryStorage {
    type Error = ();

    async fn get_item(&self, namespace: &str, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self
            .data
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    async fn set_item(
        &mut self,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), Self::Error> {
        self.data
            .insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn remove_item(&mut self, namespace: &str, key: &str) -> Result<(), Self::Error> {
        self.data.remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }

    async fn clear(&mut self, namespace: &str) -> Result<(), Self::Error> {
        self.data.retain(|(ns, _), _| ns != namespace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let mut storage = MemoryStorage::new();
        storage.set_item("wifi", "ssid", "Office").await.unwrap();
        storage.set_item("ota", "ssid", "Other").await.unwrap();

        assert_eq!(
            storage.get_item("wifi", "ssid").await.unwrap().as_deref(),
            Some("Office")
        );

        storage.clear("wifi").await.unwrap();
        assert_eq!(storage.get_item("wifi", "ssid").await.unwrap(), None);
        assert_eq!(storage.len(), 1);

        storage.remove_item("ota", "ssid").await.unwrap();
        assert!(storage.is_empty());
    }
}
