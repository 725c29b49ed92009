use axum::{extract::State, routing::get, Json, Router};
use tracing::{debug, instrument};

use super::{
    repo,
    services::{group_contacts, Contact},
};
use crate::{auth::AuthUser, error::ApiResult, state::AppState};

pub fn people_routes() -> Router<AppState> {
    Router::new().route("/people", get(list_people))
}

#[instrument(skip(state))]
pub async fn list_people(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<Contact>>> {
    let rows = repo::memberships_in_my_households(&state.db, user_id).await?;
    let contacts = group_contacts(rows, user_id);
    debug!(user_id = %user_id, count = contacts.len(), "people listed");
    Ok(Json(contacts))
}
