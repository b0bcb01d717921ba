//! # TaskVault Shared Library
//!
//! This crate contains the core of the TaskVault task-tracking system: data
//! models, owner-scoped persistence, the write-through task cache, and the
//! access-control/validation service that mediates every task operation.
//!
//! ## Module Organization
//!
//! - `models`: Database models and owner-scoped CRUD operations
//! - `tasks`: Access-control and validation layer over store + cache
//! - `cache`: Redis client and the TTL-based task cache
//! - `auth`: Password hashing, token issuing, bearer verification
//! - `db`: Connection pool and migration management
//! - `error`: Core error taxonomy

pub mod auth;
pub mod cache;
pub mod db;
pub mod error;
pub mod models;
pub mod tasks;

/// Current version of the TaskVault shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
