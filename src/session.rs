//! Injected auth/session context.
//!
//! The chat view never talks to a global login store; it receives a
//! `Session` and derives the storage user id from the bearer token's JWT
//! payload. Token issuance itself is owned by the auth service and out of
//! scope here.

use crate::storage;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tracing::warn;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Restore the previous session from the persisted token slot.
    pub fn restore() -> Self {
        Self {
            token: storage::read_slot(storage::SESSION_TOKEN_KEY),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// User id from the token's JWT payload (`sub`, falling back to
    /// `user_id`). `None` for missing or malformed tokens, which maps to
    /// the anonymous storage slot.
    pub fn user_id(&self) -> Option<String> {
        user_id_from_token(self.token.as_deref()?)
    }

    /// Drop the in-memory token and delete the persisted one.
    pub fn logout(&mut self) {
        self.token = None;
        if let Err(err) = storage::delete_slot(storage::SESSION_TOKEN_KEY) {
            warn!(%err, "failed to delete persisted session token");
        }
    }
}

fn user_id_from_token(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    let id = claims
        .get("sub")
        .or_else(|| claims.get("user_id"))?
        .as_str()?;
    if id.is_empty() {
        return None;
    }
    Some(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "header.{}.signature",
            URL_SAFE_NO_PAD.encode(payload.as_bytes())
        )
    }

    #[test]
    fn extracts_sub_claim() {
        let token = token_with_payload(r#"{"sub":"user-17","exp":1999999999}"#);
        assert_eq!(user_id_from_token(&token), Some("user-17".to_string()));
    }

    #[test]
    fn falls_back_to_user_id_claim() {
        let token = token_with_payload(r#"{"user_id":"u9"}"#);
        assert_eq!(user_id_from_token(&token), Some("u9".to_string()));
    }

    #[test]
    fn malformed_tokens_are_anonymous() {
        assert_eq!(user_id_from_token("not-a-jwt"), None);
        assert_eq!(user_id_from_token("a.%%%%.c"), None);
        let session = Session::new(None);
        assert_eq!(session.user_id(), None);
        assert!(!session.is_authenticated());
    }
}
