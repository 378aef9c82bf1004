use crate::composer::Composer;
use crate::render::{citation_label, format_timestamp, markdown_to_html, trace_dump};
use crate::session::Session;
use crate::types::{Citation, Message, MessageBody, Sender};
use dioxus::events::Key;
use dioxus::prelude::*;

fn sender_class(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "user",
        Sender::Bot => "bot",
    }
}

#[component]
pub fn ChatView() -> Element {
    let session = use_context::<Session>();
    let messages = use_signal(Vec::<Message>::new);
    let mut composer = use_signal({
        let session = session.clone();
        move || Composer::new(session)
    });

    // Mirror the transcript into a signal on every change.
    let transcript = session.transcript().clone();
    use_future(move || {
        let transcript = transcript.clone();
        let mut messages = messages;
        async move {
            let mut changes = transcript.subscribe();
            loop {
                messages.set(transcript.snapshot());
                if changes.changed().await.is_err() {
                    break;
                }
            }
        }
    });

    let mut send = move || {
        if let Some(submission) = composer.write().submit() {
            tracing::debug!(exchange = %submission.exchange, "sent from composer");
        }
    };

    let draft = composer.read().draft().to_string();
    let can_submit = composer.read().can_submit();

    rsx! {
        div { class: "chat-wrap",
            div { id: "chat-list", class: "chat-list",
                for message in messages() {
                    MessageBubble { key: "{message.exchange}-{message.sender:?}", message }
                }
            }
            form { class: "composer",
                onsubmit: move |ev| {
                    ev.prevent_default();
                    send();
                },
                textarea {
                    rows: "1",
                    placeholder: "Ask Ello anything…",
                    value: "{draft}",
                    oninput: move |ev| composer.write().set_draft(ev.value()),
                    onkeydown: move |ev| {
                        if ev.key() == Key::Enter && !ev.modifiers().shift() {
                            ev.prevent_default();
                            send();
                        }
                    },
                }
                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: !can_submit,
                    "Ask"
                }
            }
        }
    }
}

#[component]
fn MessageBubble(message: Message) -> Element {
    let side = sender_class(message.sender);
    let failed = if message.failed { "failed" } else { "" };

    let body = match &message.body {
        MessageBody::Pending => rsx! { LoadingDots {} },
        MessageBody::Revealing { visible, .. } => rsx! {
            for (i, word) in visible.iter().enumerate() {
                span { key: "{i}", class: "word", "{word}\u{a0}" }
            }
        },
        MessageBody::Final { text } if message.sender == Sender::Bot && !message.failed => {
            let html = markdown_to_html(text);
            rsx! { div { class: "md", dangerous_inner_html: "{html}" } }
        }
        MessageBody::Final { text } => rsx! { "{text}" },
    };

    let trace = message
        .trace
        .as_ref()
        .filter(|_| message.is_final())
        .map(trace_dump);
    let citations = message.citations.clone().unwrap_or_default();
    let copy_text = message
        .text()
        .filter(|_| message.sender == Sender::Bot && !message.failed)
        .map(str::to_string);

    rsx! {
        div { class: "message-row {side}",
            div { class: "bubble {side} {failed}",
                {body}
                if let Some(trace) = trace {
                    pre { class: "trace", "{trace}" }
                }
                if !citations.is_empty() {
                    div { class: "sources",
                        for (index, citation) in citations.into_iter().enumerate() {
                            SourceButton { key: "{index}", index, citation }
                        }
                    }
                }
            }
            div { class: "message-meta {side}",
                if let Some(ts) = format_timestamp(message.created_at) {
                    span { class: "message-timestamp", "{ts}" }
                }
                if let Some(text) = copy_text {
                    CopyButton { text }
                }
            }
        }
    }
}

#[component]
fn SourceButton(index: usize, citation: Citation) -> Element {
    let session = use_context::<Session>();
    let label = citation_label(index, &citation);
    rsx! {
        button {
            class: "source-link",
            r#type: "button",
            onclick: move |ev: MouseEvent| {
                ev.stop_propagation();
                session.open_citation(&citation);
            },
            "{label}"
        }
    }
}

#[component]
fn CopyButton(text: String) -> Element {
    let on_copy = move |_| {
        let raw = text.clone();
        spawn(async move {
            #[cfg(feature = "desktop")]
            {
                if let Ok(mut cb) = arboard::Clipboard::new() {
                    if let Err(err) = cb.set_text(raw) {
                        tracing::warn!(error = %err, "clipboard write failed");
                    }
                }
            }
            #[cfg(not(feature = "desktop"))]
            drop(raw);
        });
    };
    rsx! {
        button { class: "action-btn", r#type: "button", title: "Copy answer", onclick: on_copy, "Copy" }
    }
}

#[component]
fn LoadingDots() -> Element {
    rsx! {
        span { class: "loading-dots", aria_label: "Waiting for answer",
            span { class: "dot" }
            span { class: "dot" }
            span { class: "dot" }
        }
    }
}
