/// Authentication endpoints
///
/// This module provides account and session endpoints:
/// - Registration
/// - Login
/// - Token refresh
/// - Profile read and update
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register new user
/// - `POST /api/auth/login` - Login and get tokens
/// - `POST /api/auth/refresh` - Refresh access token
/// - `GET /api/auth/profile` - Current user's profile
/// - `PUT /api/auth/profile` - Update current user's profile

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use taskboard_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, UpdateUser, User, UserRole},
};
use validator::{Validate, ValidationError};

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(custom(function = "password_rule"))]
    pub password: String,

    #[serde(rename = "profileImageUrl")]
    #[validate(url(message = "Invalid image URL"))]
    pub profile_image_url: Option<String>,

    /// Matching the configured invite token creates an admin
    #[serde(rename = "adminInviteToken")]
    pub admin_invite_token: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub token: String,
}

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must not be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(custom(function = "password_rule"))]
    pub password: Option<String>,
}

/// Session response returned by register, login and profile update
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,

    /// Access token (24h)
    pub token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

impl AuthResponse {
    fn issue(user: User, secret: &str) -> ApiResult<Self> {
        let tokens = jwt::issue_token_pair(user.id, secret)?;

        Ok(Self {
            user,
            token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }
}

fn password_rule(value: &str) -> Result<(), ValidationError> {
    password::validate_password_strength(value).map_err(|msg| {
        let mut err = ValidationError::new("password_strength");
        err.message = Some(Cow::Owned(msg));
        err
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register a new user
///
/// The account is a member unless `adminInviteToken` equals the configured
/// `ADMIN_INVITE_TOKEN`.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "password": "correct horse battery",
///   "adminInviteToken": "optional"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "user": { "id": "uuid", "name": "Ada Lovelace", "role": "member", ... },
///   "token": "eyJ...",
///   "refreshToken": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let role = match (&state.config.auth.admin_invite_token, &req.admin_invite_token) {
        (Some(expected), Some(given)) if expected == given => UserRole::Admin,
        _ => UserRole::Member,
    };

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .store
        .insert_user(CreateUser {
            name: req.name.trim().to_string(),
            email: normalize_email(&req.email),
            password_hash,
            role,
            profile_image_url: req.profile_image_url,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    let response = AuthResponse::issue(user, state.jwt_secret())?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "correct horse battery"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .store
        .find_user_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse::issue(user, state.jwt_secret())?))
}

/// Token refresh endpoint
///
/// Exchanges a refresh token for a new access token, provided its user
/// still exists.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/refresh
/// Content-Type: application/json
///
/// { "refreshToken": "eyJ..." }
/// ```
///
/// # Response
///
/// ```json
/// { "token": "eyJ..." }
/// ```
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    if state.store.find_user(claims.sub).await?.is_none() {
        return Err(ApiError::Unauthorized(
            "Not authorized, user not found".to_string(),
        ));
    }

    let token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { token }))
}

/// Returns the caller's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = state
        .store
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Updates the caller's name, email or password
///
/// Returns the updated user with a fresh token pair.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `404 Not Found`: User no longer exists
/// - `409 Conflict`: Email already taken
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let password_hash = req
        .password
        .as_deref()
        .map(password::hash_password)
        .transpose()?;

    let update = UpdateUser {
        name: req.name.map(|n| n.trim().to_string()),
        email: req.email.as_deref().map(normalize_email),
        password_hash,
        profile_image_url: None,
    };

    let user = state
        .store
        .update_user(auth.user_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(AuthResponse::issue(user, state.jwt_secret())?))
}
