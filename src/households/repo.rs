use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

/// Role of a member inside one household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
    Viewer,
}

impl MemberRole {
    pub fn can_manage_members(self) -> bool {
        matches!(self, MemberRole::Admin)
    }

    /// Viewers are read-only.
    pub fn can_edit_tasks(self) -> bool {
        !matches!(self, MemberRole::Viewer)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Membership row; identity is `(user_id, household_id)`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HouseholdMember {
    pub user_id: Uuid,
    pub household_id: Uuid,
    pub role: MemberRole,
    pub name: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

/// Membership joined with the member's profile.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MemberProfile {
    pub user_id: Uuid,
    pub household_id: Uuid,
    pub role: MemberRole,
    pub display_name: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

const HOUSEHOLD_COLUMNS: &str = "id, name, description, created_by, created_at, updated_at";
const MEMBER_COLUMNS: &str = "user_id, household_id, role, name, is_active, joined_at";

pub async fn memberships_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<HouseholdMember>> {
    let sql = format!(
        "SELECT {MEMBER_COLUMNS} FROM household_members WHERE user_id = $1 AND is_active"
    );
    let rows = sqlx::query_as::<_, HouseholdMember>(&sql)
        .bind(user_id)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn households_by_ids(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Household>> {
    let sql = format!(
        "SELECT {HOUSEHOLD_COLUMNS} FROM households WHERE id = ANY($1) ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, Household>(&sql)
        .bind(ids)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn count_members(db: &PgPool, household_id: Uuid) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM household_members WHERE household_id = $1 AND is_active",
    )
    .bind(household_id)
    .fetch_one(db)
    .await?;
    Ok(count)
}

pub async fn count_open_tasks(db: &PgPool, household_id: Uuid) -> anyhow::Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE household_id = $1 AND NOT completed")
            .bind(household_id)
            .fetch_one(db)
            .await?;
    Ok(count)
}

pub async fn count_admins(db: &PgPool, household_id: Uuid) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM household_members WHERE household_id = $1 AND is_active AND role = 'admin'",
    )
    .bind(household_id)
    .fetch_one(db)
    .await?;
    Ok(count)
}

pub async fn find_household(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Household>> {
    let sql = format!("SELECT {HOUSEHOLD_COLUMNS} FROM households WHERE id = $1");
    let row = sqlx::query_as::<_, Household>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn find_membership(
    db: &PgPool,
    household_id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<Option<HouseholdMember>> {
    let sql = format!(
        "SELECT {MEMBER_COLUMNS} FROM household_members WHERE household_id = $1 AND user_id = $2"
    );
    let row = sqlx::query_as::<_, HouseholdMember>(&sql)
        .bind(household_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn insert_household_tx(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    description: Option<&str>,
    created_by: Uuid,
) -> anyhow::Result<Household> {
    let sql = format!(
        "INSERT INTO households (name, description, created_by) VALUES ($1, $2, $3) RETURNING {HOUSEHOLD_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Household>(&sql)
        .bind(name)
        .bind(description)
        .bind(created_by)
        .fetch_one(&mut **tx)
        .await?;
    Ok(row)
}

/// Insert a membership, re-activating a previously removed one.
///
/// Returns `None` when the user is already an active member.
pub async fn insert_member_tx(
    tx: &mut Transaction<'_, Postgres>,
    household_id: Uuid,
    user_id: Uuid,
    role: MemberRole,
) -> anyhow::Result<Option<HouseholdMember>> {
    let sql = format!(
        r#"
        INSERT INTO household_members (user_id, household_id, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, household_id)
        DO UPDATE SET is_active = TRUE, role = EXCLUDED.role, joined_at = NOW()
            WHERE NOT household_members.is_active
        RETURNING {MEMBER_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, HouseholdMember>(&sql)
        .bind(user_id)
        .bind(household_id)
        .bind(role)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row)
}

pub async fn deactivate_member(db: &PgPool, household_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(
        "UPDATE household_members SET is_active = FALSE WHERE household_id = $1 AND user_id = $2 AND is_active",
    )
    .bind(household_id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(res.rows_affected() == 1)
}

/// `description`: `None` keeps the stored value, `Some(None)` clears it.
pub async fn update_household(
    db: &PgPool,
    id: Uuid,
    name: Option<&str>,
    description: Option<Option<&str>>,
) -> anyhow::Result<Household> {
    let sql = format!(
        r#"
        UPDATE households
        SET name = COALESCE($2, name),
            description = CASE WHEN $3 THEN $4 ELSE description END
        WHERE id = $1
        RETURNING {HOUSEHOLD_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Household>(&sql)
        .bind(id)
        .bind(name)
        .bind(description.is_some())
        .bind(description.flatten())
        .fetch_one(db)
        .await?;
    Ok(row)
}

pub async fn members_with_profiles(db: &PgPool, household_id: Uuid) -> anyhow::Result<Vec<MemberProfile>> {
    let rows = sqlx::query_as::<_, MemberProfile>(
        r#"
        SELECT m.user_id, m.household_id, m.role, m.name AS display_name,
               u.email, u.name, u.avatar_url, m.joined_at
        FROM household_members m
        JOIN users u ON u.id = m.user_id
        WHERE m.household_id = $1 AND m.is_active
        ORDER BY m.joined_at ASC
        "#,
    )
    .bind(household_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
