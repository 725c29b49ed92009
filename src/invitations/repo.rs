use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub household_id: Uuid,
    pub invited_by: Uuid,
    pub email: String,
    pub status: InvitationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Pending invitation as seen by the invitee.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IncomingInvitation {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub invitation: Invitation,
    pub household_name: String,
    pub invited_by_email: String,
}

const INVITATION_COLUMNS: &str =
    "id, household_id, invited_by, email, status, created_at, updated_at";

pub async fn insert_invitation(
    db: &PgPool,
    household_id: Uuid,
    invited_by: Uuid,
    email: &str,
) -> anyhow::Result<Invitation> {
    let sql = format!(
        "INSERT INTO household_invitations (household_id, invited_by, email) VALUES ($1, $2, $3) RETURNING {INVITATION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Invitation>(&sql)
        .bind(household_id)
        .bind(invited_by)
        .bind(email)
        .fetch_one(db)
        .await?;
    Ok(row)
}

pub async fn pending_for_household(db: &PgPool, household_id: Uuid) -> anyhow::Result<Vec<Invitation>> {
    let sql = format!(
        "SELECT {INVITATION_COLUMNS} FROM household_invitations WHERE household_id = $1 AND status = 'pending' ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, Invitation>(&sql)
        .bind(household_id)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn pending_for_email(db: &PgPool, email: &str) -> anyhow::Result<Vec<IncomingInvitation>> {
    let rows = sqlx::query_as::<_, IncomingInvitation>(
        r#"
        SELECT i.id, i.household_id, i.invited_by, i.email, i.status, i.created_at, i.updated_at,
               h.name AS household_name, u.email AS invited_by_email
        FROM household_invitations i
        JOIN households h ON h.id = i.household_id
        JOIN users u ON u.id = i.invited_by
        WHERE lower(i.email) = lower($1) AND i.status = 'pending'
        ORDER BY i.created_at DESC
        "#,
    )
    .bind(email)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_invitation(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Invitation>> {
    let sql = format!("SELECT {INVITATION_COLUMNS} FROM household_invitations WHERE id = $1");
    let row = sqlx::query_as::<_, Invitation>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Moves a pending invitation to `status`; `None` if it was no longer pending.
pub async fn resolve_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: InvitationStatus,
) -> anyhow::Result<Option<Invitation>> {
    let sql = format!(
        "UPDATE household_invitations SET status = $2 WHERE id = $1 AND status = 'pending' RETURNING {INVITATION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Invitation>(&sql)
        .bind(id)
        .bind(status)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row)
}
