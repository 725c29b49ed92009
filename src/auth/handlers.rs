use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::Credential,
        services::{is_valid_email, issue_tokens, normalize_email, MIN_PASSWORD_LEN},
    },
    error::{ApiError, ApiResult},
    profile::repo::User,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/session", get(session))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::bad_request("Password too short"));
    }

    if Credential::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::conflict("Email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let credential = Credential::create(&state.db, &payload.email, &hash)
        .await
        .map_err(|e| ApiError::from_write(e, "Email already registered"))?;

    let user = User::ensure(&state.db, credential.id, &credential.email).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, credential.id, user.into())?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }

    let Some(credential) = Credential::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &credential.password_hash)? {
        warn!(email = %payload.email, user_id = %credential.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    // Accounts created before profiles existed get one on first login.
    let user = User::ensure(&state.db, credential.id, &credential.email).await?;

    info!(user_id = %user.id, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, credential.id, user.into())?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let credential = Credential::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    let user = User::ensure(&state.db, credential.id, &credential.email).await?;

    Ok(Json(issue_tokens(&keys, credential.id, user.into())?))
}

/// Current session; `401` means the client belongs in the signed-out area.
#[instrument(skip(state))]
pub async fn session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<PublicUser>> {
    let user = User::find(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_serialization_omits_nothing_public() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: Some("Robin".into()),
            avatar_url: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"name\":\"Robin\""));
        assert!(json.contains("\"avatar_url\":null"));
    }
}
