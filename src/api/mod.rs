//! HTTP client for the chatbot service.
//!
//! `client` wraps the `/chatbot/chat` send endpoint, the liveness probe on
//! the same path, and the conversation pass-throughs. `error` maps failures
//! onto the user-facing notice taxonomy.

mod client;
mod error;

pub use client::{
    ChatApiClient, DEFAULT_MODEL, DEFAULT_SYSTEM_MESSAGE, HistoryTurn, WireMessage, WireRole,
};
pub use error::{ApiError, FailureKind, FailureNotice, classify};
