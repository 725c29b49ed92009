use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// S3/MinIO bucket holding user uploads.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Base URL objects are publicly reachable under, without the bucket.
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub avatar_max_bytes: usize,
    pub household_poll_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "homeshare".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "homeshare-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };
        let endpoint = std::env::var("S3_ENDPOINT")?;
        let bucket = std::env::var("S3_BUCKET")?;
        let storage = StorageConfig {
            public_url: std::env::var("S3_PUBLIC_URL").unwrap_or_else(|_| endpoint.clone()),
            endpoint,
            bucket,
            access_key: std::env::var("S3_ACCESS_KEY")?,
            secret_key: std::env::var("S3_SECRET_KEY")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };
        Ok(Self {
            database_url,
            jwt,
            storage,
            avatar_max_bytes: env_parse("AVATAR_MAX_BYTES").unwrap_or(5 * 1024 * 1024),
            household_poll_secs: env_parse("HOUSEHOLD_POLL_SECS").unwrap_or(2),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
