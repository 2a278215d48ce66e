/// Bearer authentication primitives
///
/// A request is authenticated when its `Authorization: Bearer <token>` header
/// carries a token that
///
/// 1. verifies against the signing secret and has not expired, and
/// 2. is still present in the session list of the user named by its `sub`
///    claim.
///
/// The second check is what makes logout effective: a revoked token keeps a
/// valid signature but no longer resolves to a user.
///
/// The API server's auth layer calls [`bearer_token`] then [`authenticate`]
/// and stores the resulting [`AuthContext`] in request extensions.

use axum::http::{header, HeaderMap};
use sqlx::PgPool;

use super::jwt::{validate_token, JwtError};
use crate::models::user::User;

/// Message returned for every authentication failure
pub const UNAUTHENTICATED_MESSAGE: &str = "Please authenticate";

/// Authentication context added to request extensions
///
/// Handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The authenticated user
    pub user: User,

    /// The exact token presented, needed to log out this one session
    pub token: String,
}

/// Error type for bearer authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("missing credentials")]
    MissingCredentials,

    /// Authorization header is not `Bearer <token>`
    #[error("invalid authorization header: {0}")]
    InvalidFormat(String),

    /// Signature, issuer or expiry check failed
    #[error("invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    /// Token verified but is not an active session of its user
    #[error("session not found")]
    SessionNotFound,

    /// Session lookup failed
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Extracts the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("header is not valid ASCII".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("expected Bearer token".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidFormat("empty bearer token".to_string()));
    }

    Ok(token)
}

/// Resolves a bearer token to the user holding it as an active session
///
/// # Errors
///
/// - `InvalidToken` if the signature, issuer or expiry check fails
/// - `SessionNotFound` if the user no longer exists or has logged this
///   token out
/// - `DatabaseError` if the lookup itself fails
pub async fn authenticate(
    pool: &PgPool,
    secret: &str,
    token: &str,
) -> Result<AuthContext, AuthError> {
    let claims = validate_token(token, secret)?;

    let user = User::find_by_session(pool, claims.sub, token)
        .await?
        .ok_or(AuthError::SessionNotFound)?;

    Ok(AuthContext {
        user,
        token: token.to_string(),
    })
}
