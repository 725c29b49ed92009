use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get},
    Json, Router,
};
use futures::Stream;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    access::{keeps_an_admin, may_remove, require_admin, require_member},
    dto::{
        AddMemberRequest, CreateHouseholdRequest, HouseholdDetail, HouseholdSummary,
        UpdateHouseholdRequest,
    },
    repo::{self, Household, HouseholdMember, MemberProfile, MemberRole},
    services,
};
use crate::{
    auth::{services::normalize_email, AuthUser},
    error::{ApiError, ApiResult},
    profile::repo::User,
    state::AppState,
    tasks,
};

pub fn household_routes() -> Router<AppState> {
    Router::new()
        .route("/households", get(list_households).post(create_household))
        .route("/households/watch", get(watch_households))
        .route(
            "/households/:id",
            get(get_household).patch(update_household),
        )
        .route(
            "/households/:id/members",
            get(list_members).post(add_member),
        )
        .route("/households/:id/members/:user_id", delete(remove_member))
}

#[instrument(skip(state))]
pub async fn list_households(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<HouseholdSummary>>> {
    Ok(Json(services::list_for_user(&state.db, user_id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_household(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateHouseholdRequest>,
) -> ApiResult<(StatusCode, Json<Household>)> {
    let input = body.validate().map_err(|e| {
        warn!(user_id = %user_id, "household without a name");
        e
    })?;
    let household = services::create_household(&state.db, user_id, input).await?;
    Ok((StatusCode::CREATED, Json(household)))
}

struct Watch {
    state: AppState,
    user_id: Uuid,
    ticker: Interval,
    last: Option<Vec<Uuid>>,
}

/// Re-runs the listing on a fixed interval and pushes it whenever the set of
/// households changes. Dropping the connection drops the timer.
#[instrument(skip(state))]
pub async fn watch_households(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut ticker = interval(Duration::from_secs(state.config.household_poll_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let watch = Watch {
        state,
        user_id,
        ticker,
        last: None,
    };

    let stream = futures::stream::unfold(watch, |mut w| async move {
        loop {
            let db = &w.state.db;
            let user_id = w.user_id;
            let list = services::next_change(&mut w.ticker, &mut w.last, || {
                services::list_for_user(db, user_id)
            })
            .await;
            match Event::default().event("households").json_data(&list) {
                Ok(event) => return Some((Ok(event), w)),
                Err(e) => warn!(error = %e, "failed to encode household event"),
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[instrument(skip(state))]
pub async fn get_household(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<HouseholdDetail>> {
    require_member(&state.db, id, user_id).await?;
    let household = repo::find_household(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Household not found"))?;
    let members = repo::members_with_profiles(&state.db, id).await?;
    let tasks = tasks::repo::tasks_for_household(&state.db, id).await?;
    Ok(Json(HouseholdDetail {
        household,
        members,
        tasks,
    }))
}

#[instrument(skip(state, body))]
pub async fn update_household(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateHouseholdRequest>,
) -> ApiResult<Json<Household>> {
    let changes = body.validate()?;
    require_admin(&state.db, id, user_id).await?;
    let household = repo::update_household(
        &state.db,
        id,
        changes.name.as_deref(),
        changes.description.as_ref().map(|d| d.as_deref()),
    )
    .await?;
    Ok(Json(household))
}

#[instrument(skip(state))]
pub async fn list_members(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberProfile>>> {
    require_member(&state.db, id, user_id).await?;
    Ok(Json(repo::members_with_profiles(&state.db, id).await?))
}

/// Adds a registered user straight into the household, no invitation row.
#[instrument(skip(state, body))]
pub async fn add_member(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<HouseholdMember>)> {
    require_admin(&state.db, id, user_id).await?;
    let email = normalize_email(&body.email);
    let invitee = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::not_found("No user with that email"))?;

    let mut tx = state.db.begin().await?;
    let member = repo::insert_member_tx(
        &mut tx,
        id,
        invitee.id,
        body.role.unwrap_or(MemberRole::Member),
    )
    .await?
    .ok_or_else(|| ApiError::conflict("User is already a member"))?;
    tx.commit().await?;

    info!(household_id = %id, member_id = %invitee.id, added_by = %user_id, "member added");
    Ok((StatusCode::CREATED, Json(member)))
}

/// Admins remove anyone; members may remove themselves. The last admin stays.
#[instrument(skip(state))]
pub async fn remove_member(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let caller = require_member(&state.db, id, user_id).await?;
    may_remove(&caller, member_id)?;
    let removed = if member_id == user_id {
        caller
    } else {
        repo::find_membership(&state.db, id, member_id)
            .await?
            .filter(|m| m.is_active)
            .ok_or_else(|| ApiError::not_found("Member not found"))?
    };
    keeps_an_admin(&removed, repo::count_admins(&state.db, id).await?)?;

    if !repo::deactivate_member(&state.db, id, member_id).await? {
        return Err(ApiError::not_found("Member not found"));
    }
    info!(household_id = %id, member_id = %member_id, removed_by = %user_id, "member removed");
    Ok(StatusCode::NO_CONTENT)
}
