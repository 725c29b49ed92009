use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Token body. `iat` and `exp` are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

impl Claims {
    pub fn issue(
        user_id: Uuid,
        kind: TokenKind,
        now: OffsetDateTime,
        ttl: Duration,
        issuer: &str,
        audience: &str,
    ) -> Self {
        Self {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            kind,
        }
    }
}
