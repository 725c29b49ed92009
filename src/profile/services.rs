use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo::User;
use crate::state::AppState;

/// Presigned avatar links stay valid this long.
pub const AVATAR_URL_TTL_SECS: u64 = 30 * 60;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

pub fn avatar_key(user_id: Uuid, object_id: Uuid, ext: &str) -> String {
    format!("avatars/{}/{}.{}", user_id, object_id, ext)
}

/// Uploads a new avatar, points the profile at it and drops the old object.
///
/// The caller has already checked the content type via [`ext_from_mime`].
pub async fn replace_avatar(
    st: &AppState,
    user: &User,
    ext: &str,
    item: UploadItem,
) -> anyhow::Result<User> {
    let key = avatar_key(user.id, Uuid::new_v4(), ext);
    st.storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    let url = st.storage.public_url(&key);
    let updated = match User::set_avatar(&st.db, user.id, &key, &url).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Err(del) = st.storage.delete_object(&key).await {
                warn!(error = %del, %key, "failed to delete unreferenced avatar");
            }
            return Err(e.context("save avatar"));
        }
    };
    info!(user_id = %user.id, %key, "avatar replaced");

    if let Some(old) = user.avatar_key.as_deref() {
        if let Err(e) = st.storage.delete_object(old).await {
            warn!(error = %e, key = %old, "failed to delete previous avatar");
        }
    }
    Ok(updated)
}

pub async fn presign_avatar(st: &AppState, key: &str) -> anyhow::Result<String> {
    st.storage
        .presign_get(key, AVATAR_URL_TTL_SECS)
        .await
        .with_context(|| format!("presign url for {}", key))
}
