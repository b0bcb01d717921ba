/// Authentication endpoints
///
/// - `POST /v1/auth/register` - Create an account
/// - `POST /v1/auth/login` - Exchange credentials for an identity token
/// - `POST /v1/auth/password/reset-request` - Issue a password-reset token
/// - `POST /v1/auth/password/reset` - Redeem a reset token
///
/// The identity token issued here is the sole trust anchor for ownership
/// checks: every task operation reads the caller identity from its subject
/// claim.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use taskvault_shared::{
    auth::{jwt, password},
    models::user::{validate_username, CreateUser, User},
};
use validator::Validate;

/// How long a password-reset token stays redeemable
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username (unique, case-sensitive)
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,

    /// Password (validated against the strength policy)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// The new user's id
    pub user_id: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Registered username
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Signed identity token (24h)
    pub access_token: String,
}

/// Password reset request body
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    /// Username of the account to reset
    pub username: String,
}

/// Password reset request response
#[derive(Debug, Serialize)]
pub struct PasswordResetRequestResponse {
    /// Token to present to the reset endpoint within the hour
    pub reset_token: String,
}

/// Password reset body
#[derive(Debug, Deserialize)]
pub struct PasswordReset {
    /// Previously issued reset token
    pub token: String,

    /// New password (validated against the strength policy)
    pub new_password: String,
}

/// Generic message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn map_validation_errors(errors: validator::ValidationErrors) -> ApiError {
    let details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();

    ApiError::ValidationError(details)
}

/// Register a new user
///
/// # Errors
///
/// - `400 Bad Request`: validation failed (username or password policy)
/// - `409 Conflict`: username already exists
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate().map_err(map_validation_errors)?;

    // Whitespace padding must not count toward the minimum length
    if !validate_username(&req.username) {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "username".to_string(),
            message: "Username must be at least 3 characters".to_string(),
        }]));
    }

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    // Uniqueness lives in the store; a duplicate surfaces as a constraint
    // violation mapped to 409
    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            password_hash,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id.to_string(),
        }),
    ))
}

/// Login and obtain an identity token
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `401 Unauthorized`: unknown username or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(map_validation_errors)?;

    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let claims = jwt::Claims::new(user.id);
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(LoginResponse { access_token }))
}

/// Issue a password-reset token
///
/// Best effort: no rate limiting beyond the auth-route limiter and no
/// delivery channel, so the token is returned in the response body.
///
/// # Errors
///
/// - `404 Not Found`: unknown username
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> ApiResult<Json<PasswordResetRequestResponse>> {
    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let reset_token =
        User::issue_reset_token(&state.db, user.id, Duration::hours(RESET_TOKEN_TTL_HOURS))
            .await?;

    Ok(Json(PasswordResetRequestResponse { reset_token }))
}

/// Redeem a password-reset token
///
/// The token is consumed on success; redeeming it twice fails.
///
/// # Errors
///
/// - `400 Bad Request`: weak password, or unknown/expired token
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<PasswordReset>,
) -> ApiResult<Json<MessageResponse>> {
    password::validate_password_strength(&req.new_password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "new_password".to_string(),
            message: e,
        }])
    })?;

    let new_hash = password::hash_password(&req.new_password)?;

    let redeemed = User::redeem_reset_token(&state.db, &req.token, &new_hash).await?;
    if !redeemed {
        return Err(ApiError::BadRequest(
            "Invalid or expired reset token".to_string(),
        ));
    }

    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}
