mod credentials;
mod memory;

pub use credentials::*;
pub use memory::*;

use alloc::string::String;

/// Durable key/value store. Every access is scoped to a namespace.
#[allow(async_fn_in_trait)]
pub trait LocalStorage {
    type Error: core::fmt::Debug;

    async fn get_item(&self, namespace: &str, key: &str) -> Result<Option<String>, Self::Error>;

    async fn set_item(&mut self, namespace: &str, key: &str, value: &str)
    -> Result<(), Self::Error>;

    async fn remove_item(&mut self, namespace: &str, key: &str) -> Result<(), Self::Error>;

    async fn clear(&mut self, namespace: &str) -> Result<(), Self::Error>;
}
