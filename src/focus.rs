//! The single "what should the document viewer show" value.

use crate::types::{DocumentRef, Focus};
use std::sync::Arc;
use tokio::sync::watch;

/// Owner of the process-wide [`Focus`]. Writes replace the value outright;
/// whichever caller writes last wins.
#[derive(Clone)]
pub struct FocusController {
    focus: Arc<watch::Sender<Focus>>,
}

impl Default for FocusController {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusController {
    pub fn new() -> Self {
        Self {
            focus: Arc::new(watch::Sender::new(None)),
        }
    }

    pub fn set_focus(&self, target: DocumentRef) {
        tracing::debug!(document = %target.document_id, page = ?target.page, "focus set");
        self.focus.send_replace(Some(target));
    }

    pub fn clear_focus(&self) {
        tracing::debug!("focus cleared");
        self.focus.send_replace(None);
    }

    pub fn current(&self) -> Focus {
        self.focus.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Focus> {
        self.focus.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, page: Option<u32>) -> DocumentRef {
        DocumentRef {
            document_id: id.to_string(),
            page,
        }
    }

    #[test]
    fn starts_empty() {
        assert_eq!(FocusController::new().current(), None);
    }

    #[test]
    fn last_write_wins() {
        let focus = FocusController::new();
        focus.set_focus(doc("policy.pdf", Some(3)));
        focus.set_focus(doc("hr.pdf", None));
        assert_eq!(focus.current(), Some(doc("hr.pdf", None)));

        focus.clear_focus();
        assert_eq!(focus.current(), None);
    }

    #[test]
    fn clones_share_the_value() {
        let focus = FocusController::new();
        let other = focus.clone();
        other.set_focus(doc("a.pdf", Some(1)));
        assert_eq!(focus.current(), Some(doc("a.pdf", Some(1))));
    }

    #[test]
    fn subscribers_are_notified() {
        let focus = FocusController::new();
        let mut rx = focus.subscribe();
        focus.set_focus(doc("a.pdf", Some(2)));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some(doc("a.pdf", Some(2))));
    }
}
