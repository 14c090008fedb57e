/// Request authentication
///
/// Resolves the `Authorization: Bearer <token>` header of a request into an
/// [`AuthContext`]. The token only names the user; the user record is loaded
/// from the store on every request, so the role in the context is always
/// current and deleted users are rejected immediately.
///
/// The API wraps [`authenticate`] in an Axum middleware which inserts the
/// context into request extensions.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskboard_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}, role: {}", auth.user_id, auth.role)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};
use crate::models::user::{User, UserRole};
use crate::store::{StoreError, UserStore};

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthContext {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn from_user(user: &User) -> Self {
        Self::new(user.id, user.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authorized, no token")]
    MissingCredentials,

    #[error("Malformed authorization header")]
    InvalidFormat,

    #[error("Not authorized, token failed")]
    InvalidToken(#[from] JwtError),

    /// Token is valid but its user no longer exists
    #[error("Not authorized, user not found")]
    UnknownUser,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Extracts the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidFormat)?;

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

/// Validates the request's access token and loads its user
pub async fn authenticate<U>(
    users: &U,
    secret: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError>
where
    U: UserStore + ?Sized,
{
    let token = bearer_token(headers)?;
    let claims = validate_access_token(token, secret)?;

    let user = users
        .find_user(claims.sub)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    Ok(AuthContext::from_user(&user))
}
