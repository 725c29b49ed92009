use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::CreateInvitationRequest,
    repo::{self, IncomingInvitation, Invitation},
    services::{self, ensure_recipient},
};
use crate::{
    auth::{
        services::{is_valid_email, normalize_email},
        AuthUser,
    },
    error::{ApiError, ApiResult},
    households::{
        access::{require_admin, require_member},
        repo as households_repo,
    },
    profile::repo::User,
    state::AppState,
};

pub fn invitation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/households/:id/invitations",
            get(household_invitations).post(create_invitation),
        )
        .route("/invitations", get(my_invitations))
        .route("/invitations/:id/accept", post(accept_invitation))
        .route("/invitations/:id/decline", post(decline_invitation))
}

#[instrument(skip(state, body))]
pub async fn create_invitation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(household_id): Path<Uuid>,
    Json(body): Json<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<Invitation>)> {
    let email = normalize_email(&body.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid invitation email");
        return Err(ApiError::bad_request("Invalid email"));
    }
    require_admin(&state.db, household_id, user_id).await?;

    if let Some(existing) = User::find_by_email(&state.db, &email).await? {
        if let Some(m) = households_repo::find_membership(&state.db, household_id, existing.id).await? {
            if m.is_active {
                return Err(ApiError::conflict("User is already a member"));
            }
        }
    }

    let invitation = repo::insert_invitation(&state.db, household_id, user_id, &email)
        .await
        .map_err(|e| ApiError::from_write(e, "An invitation is already pending for this email"))?;
    info!(invitation_id = %invitation.id, household_id = %household_id, "invitation created");
    Ok((StatusCode::CREATED, Json(invitation)))
}

#[instrument(skip(state))]
pub async fn household_invitations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(household_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Invitation>>> {
    require_member(&state.db, household_id, user_id).await?;
    Ok(Json(repo::pending_for_household(&state.db, household_id).await?))
}

async fn caller_email(state: &AppState, user_id: Uuid) -> ApiResult<String> {
    let user = User::find(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    Ok(user.email)
}

/// Pending invitations addressed to the caller.
#[instrument(skip(state))]
pub async fn my_invitations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<IncomingInvitation>>> {
    let email = caller_email(&state, user_id).await?;
    Ok(Json(repo::pending_for_email(&state.db, &email).await?))
}

async fn respond(state: &AppState, user_id: Uuid, id: Uuid, accept: bool) -> ApiResult<Invitation> {
    let invitation = repo::find_invitation(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invitation not found"))?;
    let email = caller_email(state, user_id).await?;
    ensure_recipient(&invitation, &email)?;
    services::respond(&state.db, id, user_id, accept)
        .await?
        .into_answered()
}

#[instrument(skip(state))]
pub async fn accept_invitation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Invitation>> {
    Ok(Json(respond(&state, user_id, id, true).await?))
}

#[instrument(skip(state))]
pub async fn decline_invitation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Invitation>> {
    Ok(Json(respond(&state, user_id, id, false).await?))
}
