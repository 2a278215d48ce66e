/// User account endpoints
///
/// - `POST   /users`           - Register and open a first session
/// - `POST   /users/login`     - Open a new session
/// - `POST   /users/logout`    - Close the session used for this request
/// - `POST   /users/logoutAll` - Close every session of the caller
/// - `GET    /users/me`        - Read own profile
/// - `PATCH  /users/me`        - Update own profile
/// - `DELETE /users/me`        - Delete own account (tasks and sessions go with it)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{parse_update, JsonBody},
    routes::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use taskdesk_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::{
        session::SessionToken,
        user::{normalize_email, CreateUser, UpdateUser, User},
    },
};
use sqlx::PgExecutor;
use uuid::Uuid;
use validator::Validate;

/// Fields a profile update may touch
pub const UPDATABLE_USER_FIELDS: &[&str] = &["name", "email", "password", "age"];

const LOGIN_FAILED: &str = "Unable to login";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    /// Plaintext password, hashed before storage
    pub password: String,

    /// Age in years
    #[validate(range(min = 0, message = "Age must be a positive number"))]
    pub age: Option<i32>,
}

impl RegisterRequest {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        self.password = self.password.trim().to_string();
    }
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile update request; every field is optional
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    pub password: Option<String>,

    #[validate(range(min = 0, message = "Age must be a positive number"))]
    pub age: Option<i32>,
}

impl UpdateUserRequest {
    fn normalize(&mut self) {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
        }
        if let Some(email) = self.email.as_mut() {
            *email = normalize_email(email);
        }
        if let Some(password) = self.password.as_mut() {
            *password = password.trim().to_string();
        }
    }
}

/// Response for register and login
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// The account
    pub user: User,

    /// Bearer token for the new session
    pub token: String,
}

/// Response for logout-all
#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub message: String,

    /// Number of sessions closed
    pub sessions: u64,
}

fn check_password_rules(password: &str) -> ApiResult<()> {
    password::validate_password_rules(password)
        .map_err(|message| ApiError::invalid_field("password", message))
}

/// Mints a session token and appends it to the user's session list
async fn open_session<'e>(
    state: &AppState,
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> ApiResult<String> {
    let claims = jwt::Claims::new(user_id, state.config.session_ttl())?;
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    SessionToken::create(executor, user_id, &token).await?;

    Ok(token)
}

/// Register a new user
///
/// ```text
/// POST /users
/// Content-Type: application/json
///
/// { "name": "Jess", "email": "jess@example.com", "password": "red12345!", "age": 27 }
/// ```
///
/// Responds 201 with `{ "user": {...}, "token": "eyJ..." }`.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already registered
pub async fn register(
    State(state): State<AppState>,
    JsonBody(mut req): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    req.normalize();
    req.validate()?;
    check_password_rules(&req.password)?;

    let password_hash = password::hash_password(&req.password)?;

    // The account and its first session are stored together or not at all
    let mut tx = state.db.begin().await?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            age: req.age.unwrap_or(0),
        },
    )
    .await?;

    let token = open_session(&state, &mut *tx, user.id).await?;

    tx.commit().await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(SessionResponse { user, token })))
}

/// Login with email and password
///
/// Unknown email and wrong password are indistinguishable to the caller:
/// both answer `400 Unable to login`.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest(LOGIN_FAILED.to_string()))?;

    if !password::verify_password(req.password.trim(), &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::BadRequest(LOGIN_FAILED.to_string()));
    }

    let token = open_session(&state, &state.db, user.id).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(SessionResponse { user, token }))
}

/// Close the session this request was authenticated with
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    SessionToken::revoke(&state.db, auth.user.id, &auth.token).await?;

    tracing::info!(user_id = %auth.user.id, "User logged out");

    Ok(Json(MessageResponse::new("Logged out")))
}

/// Close every session of the caller, including this one
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<LogoutAllResponse>> {
    let sessions = SessionToken::revoke_all(&state.db, auth.user.id).await?;

    tracing::info!(user_id = %auth.user.id, sessions, "User logged out everywhere");

    Ok(Json(LogoutAllResponse {
        message: "Logged out of all sessions".to_string(),
        sessions,
    }))
}

/// Read own profile
pub async fn get_me(Extension(auth): Extension<AuthContext>) -> Json<User> {
    Json(auth.user)
}

/// Update own profile
///
/// Accepts any subset of `name`, `email`, `password`, `age`. A body naming
/// any other field is rejected as a whole and nothing is changed.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> ApiResult<Json<User>> {
    let mut req: UpdateUserRequest = parse_update(body, UPDATABLE_USER_FIELDS)?;
    req.normalize();
    req.validate()?;

    let password_hash = match req.password.as_deref() {
        Some(password) => {
            check_password_rules(password)?;
            Some(password::hash_password(password)?)
        }
        None => None,
    };

    let update = UpdateUser {
        name: req.name,
        email: req.email,
        password_hash,
        age: req.age,
    };

    if update.is_empty() {
        return Ok(Json(auth.user));
    }

    let user = User::update(&state.db, auth.user.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::debug!(user_id = %user.id, "Profile updated");

    Ok(Json(user))
}

/// Delete own account, returning the deleted profile
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = User::delete(&state.db, auth.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "User deleted");

    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn register_request(value: Value) -> RegisterRequest {
        let mut req: RegisterRequest = serde_json::from_value(value).unwrap();
        req.normalize();
        req
    }

    #[test]
    fn test_register_request_normalized_and_valid() {
        let req = register_request(json!({
            "name": "  Jess ",
            "email": " Jess@Example.com",
            "password": " red12345! ",
        }));

        assert_eq!(req.name, "Jess");
        assert_eq!(req.email, "jess@example.com");
        assert_eq!(req.password, "red12345!");
        assert_eq!(req.age, None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_request_rejects_bad_fields() {
        let req = register_request(json!({
            "name": "   ",
            "email": "not-an-email",
            "password": "red12345!",
            "age": -3,
        }));

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("age"));
    }

    #[test]
    fn test_register_ignores_unknown_fields() {
        let req = register_request(json!({
            "name": "Jess",
            "email": "jess@example.com",
            "password": "red12345!",
            "tokens": ["forged"],
        }));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_request_allow_list() {
        let body = json!({"age": 30, "name": "New"});
        let Value::Object(map) = body else { unreachable!() };
        let req: UpdateUserRequest = parse_update(map, UPDATABLE_USER_FIELDS).unwrap();
        assert_eq!(req.age, Some(30));
        assert_eq!(req.name.as_deref(), Some("New"));

        let body = json!({"age": 30, "avatar": "x"});
        let Value::Object(map) = body else { unreachable!() };
        assert!(parse_update::<UpdateUserRequest>(map, UPDATABLE_USER_FIELDS).is_err());
    }

    #[test]
    fn test_update_request_validation() {
        let mut req = UpdateUserRequest {
            name: Some("  ".to_string()),
            age: Some(-1),
            ..Default::default()
        };
        req.normalize();

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("age"));
    }

    #[test]
    fn test_password_rules_map_to_validation_error() {
        let err = check_password_rules("password1").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(check_password_rules("red12345!").is_ok());
    }
}
