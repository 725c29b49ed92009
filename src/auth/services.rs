use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use super::dto::{AuthResponse, PublicUser};
use super::jwt::JwtKeys;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Signs a fresh access/refresh pair for `user`.
pub fn issue_tokens(keys: &JwtKeys, user_id: Uuid, user: PublicUser) -> anyhow::Result<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(user_id)?,
        refresh_token: keys.sign_refresh(user_id)?,
        user,
    })
}
