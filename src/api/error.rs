//! Chatbot service failures and their user-facing classification.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No response at all: refused connection, DNS failure, timeout.
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status. `detail` carries the
    /// structured error body when one was parseable.
    #[error("chatbot service error {status}")]
    Status { status: u16, detail: Option<Value> },

    /// Reserved for future real-time delivery; the backend exposes no
    /// streaming endpoint yet.
    #[error("streaming delivery is not implemented")]
    StreamingUnavailable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    TransportFailure,
    QuotaExceeded,
    CredentialMisconfigured,
    UpstreamProviderError,
    GenericServerError,
    Unclassified,
}

/// User-facing rendering of a send failure: a short title plus a body shown
/// both in the transient banner and in the synthetic transcript entry.
#[derive(Clone, Debug, PartialEq)]
pub struct FailureNotice {
    pub kind: FailureKind,
    pub title: String,
    pub body: String,
}

const DEFAULT_TITLE: &str = "오류 발생";
const DEFAULT_BODY: &str = "메시지를 전송하는 중 오류가 발생했습니다.";
const QUOTA_BODY: &str = "OpenAI API 사용 할당량이 초과되었습니다.\n\n관리자에게 문의하여 API 할당량을 확인하거나 결제 정보를 업데이트해주세요.";
const API_KEY_BODY: &str =
    "OpenAI API 키가 설정되지 않았습니다.\n\n관리자에게 문의하여 API 키 설정을 확인해주세요.";

impl FailureNotice {
    fn new(kind: FailureKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: body.into(),
        }
    }

    /// Text of the synthetic assistant message appended on failure. The ❌
    /// prefix keeps it visually distinct from genuine replies.
    pub fn transcript_note(&self) -> String {
        let hint = if self.kind == FailureKind::QuotaExceeded {
            "관리자에게 문의해주세요."
        } else {
            "잠시 후 다시 시도해주세요."
        };
        format!("❌ {}\n\n{}\n\n{}", self.title, self.body, hint)
    }
}

/// Map a send failure onto the taxonomy of user-facing notices.
pub fn classify(err: &ApiError) -> FailureNotice {
    match err {
        ApiError::Transport(message) => {
            let body = if message.is_empty() {
                DEFAULT_BODY
            } else {
                message.as_str()
            };
            FailureNotice::new(FailureKind::TransportFailure, DEFAULT_TITLE, body)
        }
        ApiError::Status {
            detail: Some(detail),
            ..
        } => classify_detail(detail),
        ApiError::Status { detail: None, .. } | ApiError::StreamingUnavailable => {
            FailureNotice::new(FailureKind::Unclassified, DEFAULT_TITLE, DEFAULT_BODY)
        }
    }
}

fn classify_detail(detail: &Value) -> FailureNotice {
    if let Some(text) = detail.as_str() {
        if text.contains("insufficient_quota")
            || text.contains("quota")
            || text.contains("exceeded your current quota")
        {
            return FailureNotice::new(FailureKind::QuotaExceeded, "API 할당량 초과", QUOTA_BODY);
        }
        if text.contains("API key") {
            return FailureNotice::new(
                FailureKind::CredentialMisconfigured,
                "API 키 오류",
                API_KEY_BODY,
            );
        }
        if text.contains("OpenAI") {
            return FailureNotice::new(
                FailureKind::UpstreamProviderError,
                "OpenAI API 오류",
                text,
            );
        }
        return FailureNotice::new(FailureKind::GenericServerError, DEFAULT_TITLE, text);
    }
    FailureNotice::new(
        FailureKind::GenericServerError,
        DEFAULT_TITLE,
        detail.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status_error(detail: Value) -> ApiError {
        ApiError::Status {
            status: 500,
            detail: Some(detail),
        }
    }

    #[test]
    fn quota_detail_maps_to_quota_notice() {
        let notice = classify(&status_error(json!("You exceeded your current quota")));
        assert_eq!(notice.kind, FailureKind::QuotaExceeded);
        assert_eq!(notice.title, "API 할당량 초과");
        assert!(notice.transcript_note().contains("관리자에게 문의해주세요."));
    }

    #[test]
    fn api_key_detail_maps_to_credential_notice() {
        let notice = classify(&status_error(json!("Incorrect API key provided")));
        assert_eq!(notice.kind, FailureKind::CredentialMisconfigured);
        assert_eq!(notice.title, "API 키 오류");
    }

    #[test]
    fn provider_detail_is_surfaced_verbatim() {
        let notice = classify(&status_error(json!("OpenAI rejected the request")));
        assert_eq!(notice.kind, FailureKind::UpstreamProviderError);
        assert_eq!(notice.body, "OpenAI rejected the request");
    }

    #[test]
    fn structured_detail_is_stringified() {
        let notice = classify(&status_error(json!({"code": 42})));
        assert_eq!(notice.kind, FailureKind::GenericServerError);
        assert_eq!(notice.body, r#"{"code":42}"#);
    }

    #[test]
    fn missing_detail_falls_back_to_default_phrase() {
        let notice = classify(&ApiError::Status {
            status: 502,
            detail: None,
        });
        assert_eq!(notice.kind, FailureKind::Unclassified);
        assert_eq!(notice.body, "메시지를 전송하는 중 오류가 발생했습니다.");
    }

    #[test]
    fn transport_failure_carries_transport_message() {
        let notice = classify(&ApiError::Transport("connection refused".into()));
        assert_eq!(notice.kind, FailureKind::TransportFailure);
        assert_eq!(notice.body, "connection refused");
        assert!(notice.transcript_note().starts_with("❌ 오류 발생"));
    }
}
