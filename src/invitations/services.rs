use anyhow::Context;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::repo::{self, Invitation, InvitationStatus};
use crate::{
    error::{ApiError, ApiResult},
    households::repo::{self as households_repo, MemberRole},
};

/// Outcome of answering an invitation.
#[derive(Debug)]
pub enum Resolution {
    Done(Invitation),
    /// Someone already accepted or declined it.
    NotPending,
}

impl Resolution {
    /// `409` when the invitation was answered before this request got to it.
    pub fn into_answered(self) -> ApiResult<Invitation> {
        match self {
            Resolution::Done(invitation) => Ok(invitation),
            Resolution::NotPending => Err(ApiError::conflict("Invitation is no longer pending")),
        }
    }
}

/// Invitations are addressed by email; compare case-insensitively.
pub fn addressed_to(invitation: &Invitation, email: &str) -> bool {
    invitation.email.eq_ignore_ascii_case(email.trim())
}

/// Only the invitee may answer.
pub fn ensure_recipient(invitation: &Invitation, email: &str) -> ApiResult<()> {
    if addressed_to(invitation, email) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Invitation is addressed to someone else"))
    }
}

/// Accepts or declines. Accepting also inserts the membership in the same transaction.
pub async fn respond(
    db: &PgPool,
    invitation_id: Uuid,
    user_id: Uuid,
    accept: bool,
) -> anyhow::Result<Resolution> {
    let status = if accept {
        InvitationStatus::Accepted
    } else {
        InvitationStatus::Declined
    };
    let mut tx = db.begin().await.context("begin tx")?;
    let Some(invitation) = repo::resolve_tx(&mut tx, invitation_id, status).await? else {
        return Ok(Resolution::NotPending);
    };
    if accept {
        // Already being a member is fine; the invitation is still consumed.
        households_repo::insert_member_tx(&mut tx, invitation.household_id, user_id, MemberRole::Member)
            .await?;
    }
    tx.commit().await.context("commit tx")?;

    info!(
        invitation_id = %invitation_id,
        household_id = %invitation.household_id,
        user_id = %user_id,
        status = ?status,
        "invitation answered"
    );
    Ok(Resolution::Done(invitation))
}
