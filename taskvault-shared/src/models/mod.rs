/// Database models
///
/// All task operations are owner-scoped: the owner's id is part of the query
/// predicate itself, never a post-fetch comparison against a row the store
/// already handed back.
///
/// # Models
///
/// - `user`: user accounts, credentials, reset tokens
/// - `task`: tasks and their owner-scoped store operations

pub mod task;
pub mod user;
