use anyhow::Context;
use rand::{rngs::OsRng, RngCore};
use tracing::info;

use crate::{
    auth::dto::Upload,
    error::AppError,
    state::AppState,
    storage::{content_type_for_key, is_plain_key, StoredObject},
};

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Lowercased extension of `filename` if it is on the allow-list.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

pub fn allowed_file(filename: &str) -> bool {
    allowed_extension(filename).is_some()
}

/// Fresh storage key; the client's file name is never used on disk.
fn new_key(ext: &str) -> anyhow::Result<String> {
    let mut bytes = [0u8; 8];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate picture name")?;
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    Ok(format!("{hex}.{ext}"))
}

/// Rejects disallowed extensions with a validation error before anything is
/// written. Returns the key the picture was stored under.
pub async fn save_profile_picture(st: &AppState, upload: Upload) -> Result<String, AppError> {
    let ext = allowed_extension(&upload.filename).ok_or_else(|| {
        AppError::validation("Profile picture must be a png, jpg, jpeg or gif file.")
    })?;
    let key = new_key(&ext)?;
    st.storage
        .put_object(&key, upload.body, content_type_for_key(&key))
        .await
        .with_context(|| format!("put_object {}", key))?;
    info!(%key, original = %upload.filename, "profile picture stored");
    Ok(key)
}

pub async fn load_profile_picture(st: &AppState, key: &str) -> Result<StoredObject, AppError> {
    if !is_plain_key(key) || !allowed_file(key) {
        return Err(AppError::NotFound);
    }
    st.storage
        .get_object(key)
        .await
        .with_context(|| format!("get_object {}", key))?
        .ok_or(AppError::NotFound)
}
