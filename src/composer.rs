//! Draft input and the submit flow that turns it into an exchange.

use crate::gateway::{AskRequest, RequestError};
use crate::reveal;
use crate::session::Session;
use crate::transcript::TranscriptResult;
use crate::types::ExchangeId;
use tokio::task::JoinHandle;

/// A submitted question. `task` resolves once the backend answered and the
/// reveal (if any) was started; the reveal itself keeps running afterwards.
pub struct Submission {
    pub exchange: ExchangeId,
    pub task: JoinHandle<()>,
}

pub struct Composer {
    draft: String,
    session: Session,
}

impl Composer {
    pub fn new(session: Session) -> Self {
        Self {
            draft: String::new(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn can_submit(&self) -> bool {
        !self.draft.trim().is_empty()
    }

    /// Send the draft. Whitespace-only drafts are ignored and left untouched.
    /// Must be called inside a tokio runtime.
    pub fn submit(&mut self) -> Option<Submission> {
        let question = self.draft.trim().to_string();
        if question.is_empty() {
            return None;
        }

        let transcript = self.session.transcript();
        let history = transcript.history();
        let exchange = transcript.append_exchange(&question);
        self.draft.clear();
        tracing::debug!(%exchange, "question submitted");

        let request = self.session.request(question, history);
        let session = self.session.clone();
        let task = tokio::spawn(async move { answer(session, exchange, request).await });
        Some(Submission { exchange, task })
    }
}

/// Text shown in place of an answer when the request failed.
pub fn failure_text(err: &RequestError) -> String {
    format!("Sorry, I couldn't get an answer ({err}). Please try again.")
}

fn settle(exchange: ExchangeId, result: TranscriptResult<()>) {
    if let Err(err) = result {
        tracing::debug!(%exchange, error = %err, "transcript update skipped");
    }
}

async fn answer(session: Session, exchange: ExchangeId, request: AskRequest) {
    let answer = match session.gateway().ask(&request).await {
        Ok(answer) => answer,
        Err(err) => {
            tracing::warn!(%exchange, error = %err, "question failed");
            session.scheduler().cancel(exchange);
            settle(exchange, session.transcript().mark_failed(exchange, &failure_text(&err)));
            return;
        }
    };

    let transcript = session.transcript().clone();
    let citations = (!answer.citations.is_empty()).then(|| answer.citations.clone());
    let early = citations.clone().filter(|_| session.attach_citations_early());
    if let Err(err) = transcript.begin_reveal(exchange, reveal::tokenize(&answer.text), early) {
        tracing::debug!(%exchange, error = %err, "answer arrived for a message that moved on");
        return;
    }
    if let Some(trace) = answer.trace {
        settle(exchange, transcript.attach_trace(exchange, trace));
    }
    if let Some(first) = answer.citations.first() {
        session.focus().set_focus(first.target());
    }

    let steps = transcript.clone();
    session.scheduler().start(
        exchange,
        &answer.text,
        move |visible| settle(exchange, steps.apply_reveal_step(exchange, visible)),
        move |text| settle(exchange, transcript.finalize(exchange, &text, citations)),
    );
}
