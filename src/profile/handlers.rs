use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::UpdateProfileRequest,
    repo::User,
    services::{ext_from_mime, presign_avatar, replace_avatar, UploadItem},
};
use crate::{
    auth::{repo::Credential, AuthUser},
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Hard cap on the request body; `avatar_max_bytes` is checked per file.
const AVATAR_BODY_LIMIT: usize = 20 * 1024 * 1024; // 20MB

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).patch(update_profile))
        .route(
            "/profile/avatar",
            get(get_avatar)
                .post(upload_avatar)
                .layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
}

/// Loads the caller's profile, creating it from the credential row when missing.
async fn load_or_create(state: &AppState, user_id: uuid::Uuid) -> ApiResult<User> {
    if let Some(user) = User::find(&state.db, user_id).await? {
        return Ok(user);
    }
    let credential = Credential::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    Ok(User::ensure(&state.db, credential.id, &credential.email).await?)
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<User>> {
    Ok(Json(load_or_create(&state, user_id).await?))
}

#[instrument(skip(state, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let current = load_or_create(&state, user_id).await?;
    let Some(name) = body.name_change() else {
        return Ok(Json(current));
    };
    let user = User::update_name(&state.db, user_id, name.as_deref()).await?;
    Ok(Json(user))
}

/// POST /profile/avatar (multipart field `avatar`)
#[instrument(skip(state, mp))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> ApiResult<Json<User>> {
    let max = state.config.avatar_max_bytes;
    let mut upload = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() != Some("avatar") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        let body = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        upload = Some(UploadItem { body, content_type });
        break;
    }

    let Some(item) = upload else {
        return Err(ApiError::bad_request("avatar is required"));
    };
    let Some(ext) = ext_from_mime(&item.content_type) else {
        warn!(content_type = %item.content_type, "unsupported avatar type");
        return Err(ApiError::bad_request("Unsupported image type"));
    };
    if item.body.len() > max {
        return Err(ApiError::PayloadTooLarge(format!(
            "Avatar exceeds {} bytes",
            max
        )));
    }

    let user = load_or_create(&state, user_id).await?;
    let updated = replace_avatar(&state, &user, ext, item).await?;
    Ok(Json(updated))
}

/// 307 to a presigned URL of the current avatar.
#[instrument(skip(state))]
pub async fn get_avatar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Redirect> {
    let user = load_or_create(&state, user_id).await?;
    let key = user
        .avatar_key
        .ok_or_else(|| ApiError::not_found("No avatar"))?;
    let url = presign_avatar(&state, &key).await?;
    Ok(Redirect::temporary(&url))
}
