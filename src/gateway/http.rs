use super::{Answer, AskRequest, Gateway, RequestError};
use crate::types::Citation;
use async_trait::async_trait;
use serde::Deserialize;

pub const CHAT_PATH: &str = "/api/chat";
/// Same contract as [`CHAT_PATH`], plus a retrieval trace in the response.
pub const DEBUG_PATH: &str = "/api/chat/debug";
/// Query flag asking the backend for its canned answer.
pub const SAMPLE_QUERY: (&str, &str) = ("use_dummy_response", "1");

// Backend response shape
#[derive(Deserialize)]
struct AnswerBody {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    sources: Option<Vec<Citation>>,
    #[serde(default)]
    trace: Option<serde_json::Value>,
}

/// Gateway for the document-QA backend over HTTP/JSON.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn endpoint(&self, trace: bool) -> String {
        let path = if trace { DEBUG_PATH } else { CHAT_PATH };
        format!("{}{}", self.base_url, path)
    }
}

/// Parse a successful response body. A missing answer becomes an empty text.
pub fn decode_answer(body: &str) -> Result<Answer, RequestError> {
    let parsed: AnswerBody = serde_json::from_str(body)?;
    Ok(Answer {
        text: parsed.answer.unwrap_or_default(),
        citations: parsed.sources.unwrap_or_default(),
        trace: parsed.trace.filter(|trace| !trace.is_null()),
    })
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn ask(&self, request: &AskRequest) -> Result<Answer, RequestError> {
        let endpoint = self.endpoint(request.trace);
        let mut builder = self.client.post(&endpoint).json(request);
        if request.sample {
            builder = builder.query(&[SAMPLE_QUERY]);
        }

        tracing::debug!(
            %endpoint,
            sample = request.sample,
            history = request.history.len(),
            "asking backend"
        );
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%endpoint, %status, bytes = body.len(), "backend replied");

        if !status.is_success() {
            return Err(RequestError::Status { status, body });
        }
        decode_answer(&body)
    }
}
