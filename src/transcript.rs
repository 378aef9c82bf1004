//! Transcript store: the ordered message list and every mutation of it.
//!
//! Bot messages are addressed by the [`ExchangeId`] handed out by
//! [`Transcript::append_exchange`], never by position, so overlapping
//! exchanges cannot write into each other's entries.

use crate::types::{ChatMessage, Citation, ExchangeId, Message, MessageBody, Role, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("{0} no longer exists in the transcript")]
    StaleReference(ExchangeId),
    #[error("cannot {operation} {exchange} while it is {state}")]
    InvalidTransition {
        exchange: ExchangeId,
        state: &'static str,
        operation: &'static str,
    },
    #[error("reveal step for {0} is not a prefix of its answer")]
    NotAPrefix(ExchangeId),
}

pub type TranscriptResult<T> = Result<T, TranscriptError>;

/// Shared handle to the session transcript. Clones refer to the same store.
#[derive(Clone)]
pub struct Transcript {
    inner: Arc<TranscriptInner>,
}

struct TranscriptInner {
    counter: AtomicU64,
    messages: Mutex<Vec<Message>>,
    revision: watch::Sender<u64>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TranscriptInner {
                counter: AtomicU64::new(1),
                messages: Mutex::new(Vec::new()),
                revision: watch::Sender::new(0),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Message>> {
        self.inner
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    /// Append the user question and a pending bot reply as one step.
    pub fn append_exchange(&self, question: &str) -> ExchangeId {
        let exchange = ExchangeId(self.inner.counter.fetch_add(1, Ordering::Relaxed));
        let now = OffsetDateTime::now_utc();
        {
            let mut messages = self.lock();
            messages.push(Message {
                exchange,
                sender: Sender::User,
                body: MessageBody::Final {
                    text: question.to_string(),
                },
                citations: None,
                failed: false,
                trace: None,
                created_at: now,
            });
            messages.push(Message {
                exchange,
                sender: Sender::Bot,
                body: MessageBody::Pending,
                citations: None,
                failed: false,
                trace: None,
                created_at: now,
            });
        }
        self.notify();
        exchange
    }

    /// Run `apply` against the bot message of `exchange`, notifying
    /// subscribers when it reports a change.
    fn update(
        &self,
        exchange: ExchangeId,
        apply: impl FnOnce(&mut Message) -> TranscriptResult<bool>,
    ) -> TranscriptResult<()> {
        let changed = {
            let mut messages = self.lock();
            let message = messages
                .iter_mut()
                .find(|m| m.exchange == exchange && m.sender == Sender::Bot)
                .ok_or(TranscriptError::StaleReference(exchange))?;
            apply(message)?
        };
        if changed {
            self.notify();
        }
        Ok(())
    }

    pub fn begin_reveal(
        &self,
        exchange: ExchangeId,
        words: Vec<String>,
        early_citations: Option<Vec<Citation>>,
    ) -> TranscriptResult<()> {
        self.update(exchange, |message| {
            if !message.is_pending() {
                return Err(TranscriptError::InvalidTransition {
                    exchange,
                    state: message.body.label(),
                    operation: "begin revealing",
                });
            }
            message.body = MessageBody::Revealing {
                visible: Vec::new(),
                total: words,
            };
            if message.citations.is_none() {
                message.citations = early_citations;
            }
            Ok(true)
        })
    }

    pub fn apply_reveal_step(&self, exchange: ExchangeId, visible: &[String]) -> TranscriptResult<()> {
        self.update(exchange, |message| match &mut message.body {
            MessageBody::Revealing {
                visible: shown,
                total,
            } => {
                if !total.starts_with(visible) {
                    return Err(TranscriptError::NotAPrefix(exchange));
                }
                if shown.as_slice() == visible {
                    return Ok(false);
                }
                *shown = visible.to_vec();
                Ok(true)
            }
            other => Err(TranscriptError::InvalidTransition {
                exchange,
                state: other.label(),
                operation: "apply a reveal step to",
            }),
        })
    }

    /// Move a revealing message to its final text. Repeating the call with the
    /// same arguments leaves the transcript untouched.
    pub fn finalize(
        &self,
        exchange: ExchangeId,
        text: &str,
        citations: Option<Vec<Citation>>,
    ) -> TranscriptResult<()> {
        self.update(exchange, |message| {
            if let MessageBody::Final { text: existing } = &message.body {
                let unchanged = !message.failed
                    && existing == text
                    && (citations.is_none() || message.citations == citations);
                if unchanged {
                    return Ok(false);
                }
            }
            if !matches!(message.body, MessageBody::Revealing { .. }) {
                return Err(TranscriptError::InvalidTransition {
                    exchange,
                    state: message.body.label(),
                    operation: "finalize",
                });
            }
            message.body = MessageBody::Final {
                text: text.to_string(),
            };
            if message.citations.is_none() {
                message.citations = citations;
            }
            Ok(true)
        })
    }

    /// Replace a pending or revealing reply with an error text.
    pub fn mark_failed(&self, exchange: ExchangeId, text: &str) -> TranscriptResult<()> {
        self.update(exchange, |message| {
            if message.is_final() {
                return Err(TranscriptError::InvalidTransition {
                    exchange,
                    state: message.body.label(),
                    operation: "fail",
                });
            }
            message.body = MessageBody::Final {
                text: text.to_string(),
            };
            message.failed = true;
            Ok(true)
        })
    }

    pub fn attach_trace(&self, exchange: ExchangeId, trace: serde_json::Value) -> TranscriptResult<()> {
        self.update(exchange, |message| {
            if message.trace.is_some() {
                return Ok(false);
            }
            message.trace = Some(trace);
            Ok(true)
        })
    }

    /// Drop every message. Ids keep counting, so handles taken before the
    /// reset never resolve to new entries.
    pub fn reset(&self) {
        self.lock().clear();
        self.notify();
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The bot reply belonging to `exchange`.
    pub fn reply(&self, exchange: ExchangeId) -> Option<Message> {
        self.lock()
            .iter()
            .find(|m| m.exchange == exchange && m.sender == Sender::Bot)
            .cloned()
    }

    /// Completed, successful turns, oldest first.
    pub fn history(&self) -> Vec<ChatMessage> {
        let messages = self.lock();
        let answered = |exchange: ExchangeId| {
            messages.iter().any(|m| {
                m.exchange == exchange && m.sender == Sender::Bot && m.is_final() && !m.failed
            })
        };
        messages
            .iter()
            .filter(|m| answered(m.exchange))
            .filter_map(|m| {
                let role = match m.sender {
                    Sender::User => Role::User,
                    Sender::Bot => Role::Assistant,
                };
                m.text().map(|text| ChatMessage {
                    role,
                    content: text.to_string(),
                })
            })
            .collect()
    }

    /// Receiver that changes whenever the transcript is mutated.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }
}
