/// Core error taxonomy
///
/// Every operation of the task service returns `Result<T, ServiceError>`.
/// The variants here are the transport-agnostic half of the error contract;
/// the API crate maps them onto HTTP status codes. Authentication failures
/// and rate limiting never originate in the core, so they have no variant
/// here; they belong to the boundary.
///
/// `NotFound` deliberately covers both a nonexistent task and a task owned
/// by someone else, so a caller can never distinguish the two.

use thiserror::Error;

use crate::cache::CacheError;

/// Result type alias for core service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors produced by the task access-control and validation layer
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A field failed validation; no store mutation happened
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The task does not exist, or the caller does not own it
    #[error("Task not found")]
    NotFound,

    /// The underlying store failed; the transaction (if any) was aborted
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// The cache failed during a write-through or invalidation
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}
