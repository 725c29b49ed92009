use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// One membership row from a household the caller also belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct SharedMembership {
    pub user_id: Uuid,
    pub household_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

pub async fn memberships_in_my_households(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<SharedMembership>> {
    let rows = sqlx::query_as::<_, SharedMembership>(
        r#"
        SELECT m.user_id, m.household_id, u.email, u.name,
               m.name AS display_name, u.avatar_url
        FROM household_members m
        JOIN users u ON u.id = m.user_id
        WHERE m.is_active
          AND m.household_id IN (
              SELECT household_id FROM household_members
              WHERE user_id = $1 AND is_active
          )
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
