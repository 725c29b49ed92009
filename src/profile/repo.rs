use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Profile row of a user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing)]
    pub avatar_key: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const USER_COLUMNS: &str = "id, email, name, avatar_url, avatar_key, created_at, updated_at";

impl User {
    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Returns the profile row for `id`, inserting it first when absent.
    pub async fn ensure(db: &PgPool, id: Uuid, email: &str) -> anyhow::Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(email)
        .execute(db)
        .await?;

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_one(db)
            .await?;
        Ok(user)
    }

    pub async fn update_name(db: &PgPool, id: Uuid, name: Option<&str>) -> anyhow::Result<User> {
        let sql = format!("UPDATE users SET name = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(name)
            .fetch_one(db)
            .await?;
        Ok(user)
    }

    pub async fn set_avatar(db: &PgPool, id: Uuid, key: &str, url: &str) -> anyhow::Result<User> {
        let sql = format!(
            "UPDATE users SET avatar_key = $2, avatar_url = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(key)
            .bind(url)
            .fetch_one(db)
            .await?;
        Ok(user)
    }
}
