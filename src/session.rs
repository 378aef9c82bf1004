//! One chat session: the transcript, the focus, the reveal timers and the
//! backend they share.

use crate::focus::FocusController;
use crate::gateway::{AskRequest, Gateway};
use crate::reveal::{RevealScheduler, RevealSettings};
use crate::transcript::Transcript;
use crate::types::{ChatMessage, Citation};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub reveal: RevealSettings,
    pub attach_citations_early: bool,
    pub trace: bool,
    pub sample_responses: bool,
}

/// Cheap to clone; clones share every component.
#[derive(Clone)]
pub struct Session {
    transcript: Transcript,
    focus: FocusController,
    scheduler: RevealScheduler,
    gateway: Arc<dyn Gateway>,
    attach_citations_early: bool,
    trace: Arc<AtomicBool>,
    sample_responses: Arc<AtomicBool>,
}

impl Session {
    pub fn new(gateway: Arc<dyn Gateway>, settings: SessionSettings) -> Self {
        Self {
            transcript: Transcript::new(),
            focus: FocusController::new(),
            scheduler: RevealScheduler::new(settings.reveal),
            gateway,
            attach_citations_early: settings.attach_citations_early,
            trace: Arc::new(AtomicBool::new(settings.trace)),
            sample_responses: Arc::new(AtomicBool::new(settings.sample_responses)),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn focus(&self) -> &FocusController {
        &self.focus
    }

    pub fn scheduler(&self) -> &RevealScheduler {
        &self.scheduler
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    pub fn attach_citations_early(&self) -> bool {
        self.attach_citations_early
    }

    pub fn trace(&self) -> bool {
        self.trace.load(Ordering::Relaxed)
    }

    /// Use the debug endpoint for the next questions.
    pub fn set_trace(&self, enabled: bool) {
        self.trace.store(enabled, Ordering::Relaxed);
    }

    pub fn sample_responses(&self) -> bool {
        self.sample_responses.load(Ordering::Relaxed)
    }

    pub fn set_sample_responses(&self, enabled: bool) {
        self.sample_responses.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn request(&self, question: String, history: Vec<ChatMessage>) -> AskRequest {
        AskRequest::new(question)
            .with_history(history)
            .with_trace(self.trace())
            .with_sample(self.sample_responses())
    }

    /// Point the document viewer at a citation. Independent of any reveal.
    pub fn open_citation(&self, citation: &Citation) {
        self.focus.set_focus(citation.target());
    }

    /// Start over: stop every reveal, drop the transcript, clear the focus.
    /// Answers still in flight land on stale references and are ignored.
    pub fn reset(&self) {
        self.scheduler.cancel_all();
        self.transcript.reset();
        self.focus.clear_focus();
        tracing::info!("session reset");
    }
}
