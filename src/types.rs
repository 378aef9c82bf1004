use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior turn sent to the backend as conversation history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Handle for one question/answer cycle, captured when the exchange is appended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExchangeId(pub(crate) u64);

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exchange#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// A pointer from an answer into a supporting source document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(rename = "file")]
    pub document_id: String,
    /// 1-based page; `None` means the whole document.
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(rename = "text", default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl Citation {
    pub fn new(document_id: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            document_id: document_id.into(),
            page,
            excerpt: None,
        }
    }

    pub fn target(&self) -> DocumentRef {
        DocumentRef {
            document_id: self.document_id.clone(),
            page: self.page,
        }
    }
}

/// A document (and optionally a page in it) requested for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRef {
    pub document_id: String,
    pub page: Option<u32>,
}

/// What the document viewer is asked to show. `None` means nothing selected.
pub type Focus = Option<DocumentRef>;

#[derive(Clone, Debug, PartialEq)]
pub enum MessageBody {
    /// Waiting on the backend; rendered as a loading indicator.
    Pending,
    Revealing {
        visible: Vec<String>,
        total: Vec<String>,
    },
    Final {
        text: String,
    },
}

impl MessageBody {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            MessageBody::Pending => "pending",
            MessageBody::Revealing { .. } => "revealing",
            MessageBody::Final { .. } => "final",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub exchange: ExchangeId,
    pub sender: Sender,
    pub body: MessageBody,
    pub citations: Option<Vec<Citation>>,
    /// Set when the final text describes a failed request.
    pub failed: bool,
    pub trace: Option<serde_json::Value>,
    pub created_at: OffsetDateTime,
}

impl Message {
    pub fn is_pending(&self) -> bool {
        matches!(self.body, MessageBody::Pending)
    }

    pub fn is_final(&self) -> bool {
        matches!(self.body, MessageBody::Final { .. })
    }

    /// Final text, if the message has reached its final state.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Final { text } => Some(text),
            _ => None,
        }
    }
}
