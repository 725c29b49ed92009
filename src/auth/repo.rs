use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Credential record; the profile lives in `users`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Credential {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub created_at: OffsetDateTime,
}

impl Credential {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Credential>> {
        let row = sqlx::query_as::<_, Credential>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM auth_users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Credential>> {
        let row = sqlx::query_as::<_, Credential>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM auth_users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn create(db: &PgPool, email: &str, password_hash: &str) -> anyhow::Result<Credential> {
        let row = sqlx::query_as::<_, Credential>(
            r#"
            INSERT INTO auth_users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}
