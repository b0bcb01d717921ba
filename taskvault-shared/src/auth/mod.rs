/// Authentication and credential utilities
///
/// This module provides the pieces the API boundary composes into the auth
/// flow:
///
/// - `password`: Argon2id hashing, verification, and the password policy
/// - `jwt`: identity token creation and validation (HS256)
/// - `middleware`: bearer-token verification and the `AuthContext` carried
///   through authenticated requests

pub mod jwt;
pub mod middleware;
pub mod password;
