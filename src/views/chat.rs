use crate::api::ChatApiClient;
use crate::controller::Conversation;
use crate::health::{HealthMonitor, POLL_INTERVAL};
use crate::session::Session;
use crate::types::{HealthStatus, Role};
use crate::views::shared::{format_message_timestamp, markdown_to_html};
use dioxus::events::Key;
use dioxus::prelude::*;

fn status_label(status: HealthStatus) -> (&'static str, &'static str) {
    match status {
        HealthStatus::Checking => ("checking", "서버 확인 중..."),
        HealthStatus::Online => ("online", "서버 연결됨"),
        HealthStatus::Offline => ("offline", "서버 연결 안 됨"),
    }
}

/// Synthetic failure entries are prefixed when appended; see
/// `FailureNotice::transcript_note`.
fn is_failure_note(content: &str) -> bool {
    content.starts_with('❌')
}

#[component]
pub fn ChatView(session: Signal<Session>) -> Element {
    let api = use_signal(|| {
        ChatApiClient::from_env(session.peek().token().map(str::to_string))
    });
    let mut conversation =
        use_signal(|| Conversation::hydrate(session.peek().user_id()));
    let mut input = use_signal(String::new);
    let mut monitor = use_signal(HealthMonitor::new);
    let mut confirm_clear = use_signal(|| false);
    let mut confirm_logout = use_signal(|| false);

    // Poll the service on a fixed interval. The task is scoped to this
    // component, so unmounting cancels the pending cycle.
    use_future(move || async move {
        loop {
            monitor.with_mut(|m| m.begin_probe());
            let alive = api().check_health().await;
            monitor.with_mut(|m| m.record(alive));
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    });

    let mut send_message = move |text: String| {
        let Some(outbound) = conversation.with_mut(|c| c.begin_send(&text)) else {
            return;
        };
        input.set(String::new());
        let client = api();
        spawn(async move {
            let outcome = client
                .send_message(&outbound.message, &outbound.history, None, None)
                .await;
            conversation.with_mut(|c| c.complete_send(outcome));
        });
    };

    let snapshot = conversation();
    let sending = snapshot.in_flight();
    let (status_class, status_text) = status_label(monitor().status());

    rsx! {
        div { class: "chat-shell",
            header { class: "chat-header",
                div { class: "header-left",
                    span { class: "wordmark", "AIion" }
                    span { class: format_args!("status-chip {}", status_class),
                        span { class: "status-dot" }
                        "{status_text}"
                    }
                }
                div { class: "header-actions",
                    if !snapshot.is_empty() {
                        button {
                            class: "header-btn",
                            r#type: "button",
                            title: "대화 초기화",
                            onclick: move |_| {
                                if confirm_clear() {
                                    conversation.with_mut(|c| c.clear_transcript());
                                    confirm_clear.set(false);
                                } else {
                                    confirm_clear.set(true);
                                    confirm_logout.set(false);
                                }
                            },
                            if confirm_clear() { "초기화할까요?" } else { "초기화" }
                        }
                    }
                    if session().is_authenticated() {
                        button {
                            class: "header-btn",
                            r#type: "button",
                            onclick: move |_| {
                                if confirm_logout() {
                                    session.with_mut(|s| s.logout());
                                    confirm_logout.set(false);
                                } else {
                                    confirm_logout.set(true);
                                    confirm_clear.set(false);
                                }
                            },
                            if confirm_logout() { "로그아웃할까요?" } else { "로그아웃" }
                        }
                    }
                }
            }

            div { class: "chat-list",
                if snapshot.is_empty() {
                    div { class: "empty-state",
                        h2 { "무엇을 알고 싶으세요?" }
                        p { "질문을 입력하면 AI가 답변해드립니다." }
                    }
                } else {
                    for msg in snapshot.messages().iter() {
                        div { class: format_args!(
                                "message-row {}",
                                match msg.role { Role::User => "user", Role::Assistant => "assistant" }
                            ),
                            div { class: "message-stack",
                                if matches!(msg.role, Role::Assistant) {
                                    AssistantBubble {
                                        content: msg.content.clone(),
                                        failure: is_failure_note(&msg.content),
                                    }
                                } else {
                                    div { class: "bubble user", "{msg.content}" }
                                }
                                if let Some(ts) = format_message_timestamp(msg.timestamp) {
                                    div { class: "message-meta", "{ts}" }
                                }
                            }
                        }
                    }
                    if sending {
                        div { class: "message-row assistant",
                            div { class: "bubble assistant pending", "..." }
                        }
                    }
                }
            }

            form { class: "composer",
                div { class: "composer-inner",
                    textarea {
                        rows: "1",
                        placeholder: "무엇을 알고 싶으세요?",
                        value: "{input}",
                        oninput: move |ev| input.set(ev.value()),
                        onkeydown: move |ev| {
                            if ev.key() == Key::Enter && !ev.modifiers().shift() {
                                ev.prevent_default();
                                let text = input();
                                send_message(text);
                            }
                        },
                        disabled: sending,
                        autofocus: true,
                    }
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        disabled: sending || input().trim().is_empty(),
                        onclick: move |_| {
                            let text = input();
                            send_message(text);
                        },
                        "전송"
                    }
                }
                if let Some(banner) = snapshot.banner() {
                    div { class: "error-banner", "{banner}" }
                }
            }
        }
    }
}

#[component]
fn AssistantBubble(content: String, failure: bool) -> Element {
    let content_html = markdown_to_html(&content);
    let copy_payload = content.clone();
    let on_copy = move |_| {
        let raw = copy_payload.clone();
        spawn(async move {
            #[cfg(any(feature = "desktop", feature = "mobile"))]
            {
                if let Ok(mut cb) = arboard::Clipboard::new() {
                    let _ = cb.set_text(raw);
                }
            }
            #[cfg(not(any(feature = "desktop", feature = "mobile")))]
            let _ = raw;
        });
    };

    rsx! {
        div { class: format_args!("bubble assistant {}", if failure { "failure" } else { "" }),
            if !failure {
                div { class: "bubble-controls",
                    button { class: "action-btn", title: "복사", onclick: on_copy, "복사" }
                }
            }
            div { class: "md", dangerous_inner_html: "{content_html}" }
        }
    }
}
