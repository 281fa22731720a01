mod memory;

pub use memory::InMemoryStore;

use crate::error::ServiceResult;
use async_trait::async_trait;
use serde_json::Value;

/// Collection names used by the service
pub mod collections {
    pub const MEETINGS: &str = "meetings";
    pub const CONFIG: &str = "config";
    pub const TOKENS: &str = "tokens";
}

/// A JSON document store organised into named collections
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Get a document by id
    async fn get(&self, collection: &str, id: &str) -> ServiceResult<Option<Value>>;

    /// Create or replace a document
    async fn set(&self, collection: &str, id: &str, document: Value) -> ServiceResult<()>;

    /// List every document in a collection
    async fn list(&self, collection: &str) -> ServiceResult<Vec<Value>>;

    /// Delete a document, returning whether it existed
    async fn delete(&self, collection: &str, id: &str) -> ServiceResult<bool>;

    /// Short backend name for logs
    fn backend(&self) -> &'static str;
}
