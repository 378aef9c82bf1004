//! Backend gateway: one request, one answer, no retries.
//!
//! - `http` - reqwest client for the document-QA backend
//!
//! The trait is the seam the composer talks to; tests swap in scripted
//! implementations.

mod http;

pub use http::{CHAT_PATH, DEBUG_PATH, HttpGateway, SAMPLE_QUERY, decode_answer};

use crate::types::{ChatMessage, Citation};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("could not reach the backend: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed backend response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Body of a chat request. `sample` travels as a query flag, not in the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub trace: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatMessage>,
    #[serde(skip)]
    pub sample: bool,
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            trace: false,
            history: Vec::new(),
            sample: false,
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_sample(mut self, sample: bool) -> Self {
        self.sample = sample;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
    /// Opaque retrieval trace from the debug endpoint.
    pub trace: Option<serde_json::Value>,
}

impl Answer {
    pub fn new(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            text: text.into(),
            citations,
            trace: None,
        }
    }
}

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn ask(&self, request: &AskRequest) -> Result<Answer, RequestError>;
}
