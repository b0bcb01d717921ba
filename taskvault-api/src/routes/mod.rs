/// API route handlers
///
/// - `health`: health check endpoint
/// - `auth`: registration, login, password reset
/// - `tasks`: task CRUD for the authenticated caller

pub mod auth;
pub mod health;
pub mod tasks;
