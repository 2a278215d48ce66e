/// Avatar endpoints
///
/// - `POST   /users/me/avatar` - Upload (multipart field `avatar`, jpg/jpeg/png, at most 1 MB)
/// - `DELETE /users/me/avatar` - Remove
/// - `GET    /users/:id/avatar` - Download as PNG (public)
///
/// Uploads are re-encoded as 250x250 PNG before storage, so downloads are
/// always `image/png` whatever was uploaded.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::parse_id,
    routes::MessageResponse,
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use taskdesk_shared::{
    auth::middleware::AuthContext,
    avatar::{self, AvatarError, AVATAR_CONTENT_TYPE},
    models::user::User,
};

/// Multipart field carrying the image
pub const AVATAR_FIELD: &str = "avatar";

/// Upload or replace own avatar
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let mut multipart = multipart?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or(AvatarError::Empty)?;
    avatar::validate_upload(&filename, data.len())?;

    let png = avatar::normalize_blocking(data.to_vec()).await?;

    if !User::set_avatar(&state.db, auth.user.id, &png).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(
        user_id = %auth.user.id,
        upload_bytes = data.len(),
        stored_bytes = png.len(),
        "Avatar stored"
    );

    Ok(Json(MessageResponse::new("Avatar uploaded")))
}

/// Remove own avatar
pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    User::clear_avatar(&state.db, auth.user.id).await?;

    tracing::debug!(user_id = %auth.user.id, "Avatar removed");

    Ok(Json(MessageResponse::new("Avatar removed")))
}

/// Download a user's avatar
///
/// Answers `304 Not Modified` when `If-None-Match` carries the current ETag.
/// Unknown users, malformed IDs and users without an avatar are all 404.
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let user_id = parse_id(&id, "Avatar")?;

    let png = User::find_avatar(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Avatar not found".to_string()))?;

    let etag = avatar::etag(&png);

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.split(',').any(|tag| tag.trim() == etag));

    if not_modified {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    Ok((
        [
            (header::CONTENT_TYPE, AVATAR_CONTENT_TYPE.to_string()),
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        png,
    )
        .into_response())
}
