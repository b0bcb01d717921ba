/// Bearer-token verification and the authenticated request context
///
/// The API server's auth middleware calls `verify_bearer` with the raw
/// `Authorization` header value and, on success, attaches the returned
/// `AuthContext` to the request. Handlers read the caller identity from that
/// context; it is the only place a `user_id` for ownership checks may come
/// from.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{self, JwtError};

/// Errors produced while resolving a caller identity
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header was present
    #[error("Missing credentials")]
    MissingCredentials,

    /// The Authorization header was not a Bearer token
    #[error("Invalid authorization format: {0}")]
    InvalidFormat(String),

    /// The token failed validation
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}

/// Authenticated caller identity, attached to request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// The verified user id (token subject)
    pub user_id: Uuid,
}

impl AuthContext {
    /// Creates a context from a validated token subject
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Resolves a caller identity from an `Authorization` header value
///
/// Expects `Bearer <token>`; validates the token and returns the context
/// carrying its subject.
///
/// # Example
///
/// ```
/// use taskvault_shared::auth::jwt::{create_token, Claims};
/// use taskvault_shared::auth::middleware::verify_bearer;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let user_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(user_id), secret)?;
///
/// let header = format!("Bearer {}", token);
/// let ctx = verify_bearer(Some(&header), secret)?;
/// assert_eq!(ctx.user_id, user_id);
/// # Ok(())
/// # }
/// ```
pub fn verify_bearer(auth_header: Option<&str>, secret: &str) -> Result<AuthContext, AuthError> {
    let header = auth_header.ok_or(AuthError::MissingCredentials)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, secret)?;

    Ok(AuthContext::new(claims.sub))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_verify_bearer_valid() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id), SECRET).unwrap();
        let header = format!("Bearer {}", token);

        let ctx = verify_bearer(Some(&header), SECRET).unwrap();
        assert_eq!(ctx.user_id, user_id);
    }

    #[test]
    fn test_verify_bearer_missing_header() {
        let result = verify_bearer(None, SECRET);
        assert!(matches!(result.unwrap_err(), AuthError::MissingCredentials));
    }

    #[test]
    fn test_verify_bearer_wrong_scheme() {
        let result = verify_bearer(Some("Basic dXNlcjpwYXNz"), SECRET);
        assert!(matches!(result.unwrap_err(), AuthError::InvalidFormat(_)));
    }

    #[test]
    fn test_verify_bearer_invalid_token() {
        let result = verify_bearer(Some("Bearer garbage"), SECRET);
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken(_)));
    }
}
