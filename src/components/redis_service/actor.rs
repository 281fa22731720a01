use crate::components::store::DocumentStore;
use crate::error::{store_error, ServiceResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client as RedisClient};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

// Redis key layout
pub mod keys {
    /// Key holding a single document
    pub fn document(collection: &str, id: &str) -> String {
        format!("{}:doc:{}", collection, id)
    }

    /// Set indexing the ids of a collection
    pub fn index(collection: &str) -> String {
        format!("{}:ids", collection)
    }
}

/// The Redis actor that processes messages
pub struct RedisActor {
    connection: ConnectionManager,
    command_rx: mpsc::Receiver<RedisCommand>,
}

/// Commands that can be sent to the Redis actor
pub enum RedisCommand {
    Get {
        collection: String,
        id: String,
        reply: oneshot::Sender<ServiceResult<Option<Value>>>,
    },
    Set {
        collection: String,
        id: String,
        document: Value,
        reply: oneshot::Sender<ServiceResult<()>>,
    },
    List {
        collection: String,
        reply: oneshot::Sender<ServiceResult<Vec<Value>>>,
    },
    Delete {
        collection: String,
        id: String,
        reply: oneshot::Sender<ServiceResult<bool>>,
    },
    Shutdown,
}

/// Handle for communicating with the Redis actor
#[derive(Clone)]
pub struct RedisActorHandle {
    command_tx: mpsc::Sender<RedisCommand>,
}

impl RedisActorHandle {
    /// Create a handle with no actor behind it; every request fails
    pub fn empty() -> Self {
        let (command_tx, _) = mpsc::channel(32);
        Self { command_tx }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<ServiceResult<T>>) -> RedisCommand,
    ) -> ServiceResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|e| store_error(&format!("Actor mailbox error: {}", e)))?;

        reply_rx
            .await
            .map_err(|_| store_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> ServiceResult<()> {
        let _ = self.command_tx.send(RedisCommand::Shutdown).await;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for RedisActorHandle {
    async fn get(&self, collection: &str, id: &str) -> ServiceResult<Option<Value>> {
        self.request(|reply| RedisCommand::Get {
            collection: collection.to_string(),
            id: id.to_string(),
            reply,
        })
        .await
    }

    async fn set(&self, collection: &str, id: &str, document: Value) -> ServiceResult<()> {
        self.request(|reply| RedisCommand::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            document,
            reply,
        })
        .await
    }

    async fn list(&self, collection: &str) -> ServiceResult<Vec<Value>> {
        self.request(|reply| RedisCommand::List {
            collection: collection.to_string(),
            reply,
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> ServiceResult<bool> {
        self.request(|reply| RedisCommand::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
            reply,
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

impl RedisActor {
    /// Connect to Redis and return the actor with its handle
    pub async fn connect(redis_url: &str) -> ServiceResult<(Self, RedisActorHandle)> {
        info!("Connecting to Redis at {}", redis_url);

        let client = RedisClient::open(redis_url)
            .map_err(|e| store_error(&format!("Failed to create Redis client: {}", e)))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| store_error(&format!("Failed to connect to Redis: {}", e)))?;

        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            connection,
            command_rx,
        };

        Ok((actor, RedisActorHandle { command_tx }))
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Redis actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                RedisCommand::Get {
                    collection,
                    id,
                    reply,
                } => {
                    let _ = reply.send(self.get_document(&collection, &id).await);
                }
                RedisCommand::Set {
                    collection,
                    id,
                    document,
                    reply,
                } => {
                    let _ = reply.send(self.set_document(&collection, &id, &document).await);
                }
                RedisCommand::List { collection, reply } => {
                    let _ = reply.send(self.list_documents(&collection).await);
                }
                RedisCommand::Delete {
                    collection,
                    id,
                    reply,
                } => {
                    let _ = reply.send(self.delete_document(&collection, &id).await);
                }
                RedisCommand::Shutdown => {
                    info!("Redis actor shutting down");
                    break;
                }
            }
        }

        info!("Redis actor shut down");
    }

    async fn get_document(&self, collection: &str, id: &str) -> ServiceResult<Option<Value>> {
        let mut conn = self.connection.clone();

        let json: Option<String> = conn
            .get(keys::document(collection, id))
            .await
            .map_err(|e| store_error(&format!("Redis GET error: {}", e)))?;

        json.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|e| store_error(&format!("Failed to deserialize document: {}", e)))
    }

    async fn set_document(&self, collection: &str, id: &str, document: &Value) -> ServiceResult<()> {
        let mut conn = self.connection.clone();

        // Document and index are written together
        let _: () = redis::pipe()
            .atomic()
            .set(keys::document(collection, id), document.to_string())
            .ignore()
            .sadd(keys::index(collection), id)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| store_error(&format!("Redis SET error: {}", e)))?;

        Ok(())
    }

    async fn list_documents(&self, collection: &str) -> ServiceResult<Vec<Value>> {
        let mut conn = self.connection.clone();

        let ids: Vec<String> = conn
            .smembers(keys::index(collection))
            .await
            .map_err(|e| store_error(&format!("Redis SMEMBERS error: {}", e)))?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let doc_keys: Vec<String> = ids.iter().map(|id| keys::document(collection, id)).collect();
        let docs: Vec<Option<String>> = conn
            .mget(&doc_keys)
            .await
            .map_err(|e| store_error(&format!("Redis MGET error: {}", e)))?;

        let mut documents = Vec::with_capacity(docs.len());
        for (id, doc) in ids.iter().zip(docs) {
            match doc {
                Some(json) => match serde_json::from_str(&json) {
                    Ok(value) => documents.push(value),
                    Err(e) => warn!("Skipping unreadable document {}/{}: {}", collection, id, e),
                },
                // Index entry without a document
                None => warn!("Skipping dangling index entry {}/{}", collection, id),
            }
        }

        Ok(documents)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> ServiceResult<bool> {
        let mut conn = self.connection.clone();

        let (removed,): (i64,) = redis::pipe()
            .atomic()
            .del(keys::document(collection, id))
            .srem(keys::index(collection), id)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| store_error(&format!("Redis DEL error: {}", e)))?;

        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(keys::document("meetings", "abc"), "meetings:doc:abc");
        assert_eq!(keys::index("meetings"), "meetings:ids");
    }

    #[tokio::test]
    async fn test_empty_handle_fails_requests() {
        let handle = RedisActorHandle::empty();

        let err = handle.get("meetings", "abc").await.unwrap_err();
        assert!(err.to_string().contains("Actor mailbox error"));
        assert!(handle.shutdown().await.is_ok());
    }
}
