//! Per-user persistent slots for the chat transcript and session token.
//!
//! Native builds store each slot as a JSON file under the platform data
//! directory; wasm builds fall back to an in-memory map. All public
//! operations are best-effort: failures are logged and degrade to
//! "no history" rather than surfacing to the caller.

use crate::types::ChatMessage;
use anyhow::{Context, Result};
use tracing::warn;

#[cfg(target_arch = "wasm32")]
use once_cell::sync::Lazy;
#[cfg(target_arch = "wasm32")]
use std::{collections::HashMap, sync::Mutex};

#[cfg(not(target_arch = "wasm32"))]
use std::{fs, path::PathBuf};

/// Retention cap applied on save. The transcript itself is unbounded in
/// memory; only the persisted slot is trimmed to the most recent entries.
pub const MAX_STORED_MESSAGES: usize = 200;

/// Slot key for a user's transcript. Unknown users share the anonymous slot.
pub fn transcript_key(user_id: Option<&str>) -> String {
    match user_id {
        Some(id) if !id.is_empty() => format!("chat_messages_{id}"),
        _ => "chat_messages_anonymous".to_string(),
    }
}

pub const SESSION_TOKEN_KEY: &str = "session_token";

#[cfg(target_arch = "wasm32")]
static SLOTS: Lazy<Mutex<HashMap<String, String>>> = Lazy::new(|| Mutex::new(HashMap::new()));

#[cfg(not(target_arch = "wasm32"))]
fn storage_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("aiion").join("storage");
    }
    PathBuf::from("cache").join("storage")
}

/// Sanitize a slot key for filesystem use.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn read_slot(key: &str) -> Option<String> {
    let path = storage_dir().join(format!("{}.json", sanitize_key(key)));
    fs::read_to_string(path).ok()
}

#[cfg(target_arch = "wasm32")]
pub fn read_slot(key: &str) -> Option<String> {
    let slots = SLOTS.lock().ok()?;
    slots.get(key).cloned()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn write_slot(key: &str, value: &str) -> Result<()> {
    let dir = storage_dir();
    fs::create_dir_all(&dir).context("failed to create storage directory")?;
    let path = dir.join(format!("{}.json", sanitize_key(key)));
    fs::write(path, value).context("failed to write slot")
}

#[cfg(target_arch = "wasm32")]
pub fn write_slot(key: &str, value: &str) -> Result<()> {
    let mut slots = SLOTS
        .lock()
        .map_err(|e| anyhow::anyhow!("slot map poisoned: {e}"))?;
    slots.insert(key.to_string(), value.to_string());
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn delete_slot(key: &str) -> Result<()> {
    let path = storage_dir().join(format!("{}.json", sanitize_key(key)));
    if path.exists() {
        fs::remove_file(path).context("failed to delete slot")?;
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
pub fn delete_slot(key: &str) -> Result<()> {
    let mut slots = SLOTS
        .lock()
        .map_err(|e| anyhow::anyhow!("slot map poisoned: {e}"))?;
    slots.remove(key);
    Ok(())
}

/// Load the persisted transcript for a user. Absent, unparsable, or
/// unreadable slots all count as empty history.
pub fn load_messages(user_id: Option<&str>) -> Vec<ChatMessage> {
    let key = transcript_key(user_id);
    let Some(raw) = read_slot(&key) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<ChatMessage>>(&raw) {
        Ok(messages) => messages,
        Err(err) => {
            warn!(%key, %err, "discarding unparsable transcript slot");
            Vec::new()
        }
    }
}

/// Overwrite the user's slot with the full transcript, keeping only the
/// most recent [`MAX_STORED_MESSAGES`] entries. Failures are logged and
/// swallowed; persistence is best-effort.
pub fn save_messages(user_id: Option<&str>, messages: &[ChatMessage]) {
    let key = transcript_key(user_id);
    let start = messages.len().saturating_sub(MAX_STORED_MESSAGES);
    let serialized = match serde_json::to_string(&messages[start..]) {
        Ok(json) => json,
        Err(err) => {
            warn!(%key, %err, "failed to serialize transcript");
            return;
        }
    };
    if let Err(err) = write_slot(&key, &serialized) {
        warn!(%key, %err, "failed to persist transcript");
    }
}

/// Delete the user's transcript slot. Best-effort.
pub fn clear_messages(user_id: Option<&str>) {
    let key = transcript_key(user_id);
    if let Err(err) = delete_slot(&key) {
        warn!(%key, %err, "failed to clear transcript slot");
    }
}
