/// Write-through task cache
///
/// A time-bounded cache of individual tasks keyed by task id, used to
/// short-circuit single-task reads. Entries are JSON snapshots of the task
/// row, embedding the owner's id; the store remains authoritative and every
/// consumer re-checks the embedded owner against the caller after a `get`.
/// The cache is never an authorization boundary.
///
/// No stampede protection and no negative caching: a miss always falls
/// through to the store.

pub mod client;

pub use client::{CacheConfig, CacheError, RedisClient};

use redis::AsyncCommands;
use uuid::Uuid;

use crate::models::task::Task;

/// How long a cached task stays valid
pub const TASK_TTL_SECONDS: u64 = 300;

/// TTL-based task cache keyed by task id
#[derive(Clone)]
pub struct TaskCache {
    client: RedisClient,
    ttl_seconds: u64,
}

impl TaskCache {
    /// Creates a cache with the default 300 second TTL
    pub fn new(client: RedisClient) -> Self {
        Self::with_ttl(client, TASK_TTL_SECONDS)
    }

    /// Creates a cache with a custom TTL (used by tests)
    pub fn with_ttl(client: RedisClient, ttl_seconds: u64) -> Self {
        Self {
            client,
            ttl_seconds,
        }
    }

    fn key(task_id: Uuid) -> String {
        format!("task:{}", task_id)
    }

    /// Stores a task snapshot, overwriting any existing entry and resetting
    /// its TTL
    pub async fn put(&self, task: &Task) -> Result<(), CacheError> {
        let payload = serde_json::to_string(task)
            .map_err(|e| CacheError::Command(format!("Failed to serialize task: {}", e)))?;

        let mut conn = self.client.connection();
        let _: () = conn
            .set_ex(Self::key(task.id), payload, self.ttl_seconds)
            .await?;

        Ok(())
    }

    /// Fetches a task snapshot; `None` on a miss
    ///
    /// An entry that no longer parses is treated as a miss, so the caller
    /// falls through to the store and repopulates it.
    pub async fn get(&self, task_id: Uuid) -> Result<Option<Task>, CacheError> {
        let mut conn = self.client.connection();
        let payload: Option<String> = conn.get(Self::key(task_id)).await?;

        let Some(payload) = payload else {
            return Ok(None);
        };

        match serde_json::from_str(&payload) {
            Ok(task) => Ok(Some(task)),
            Err(e) => {
                tracing::debug!(task_id = %task_id, "Discarding unparsable cache entry: {}", e);
                Ok(None)
            }
        }
    }

    /// Removes a task's cache entry; missing keys are not an error
    pub async fn invalidate(&self, task_id: Uuid) -> Result<(), CacheError> {
        let mut conn = self.client.connection();
        let _: () = conn.del(Self::key(task_id)).await?;

        Ok(())
    }
}
