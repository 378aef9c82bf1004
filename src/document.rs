//! Document surface: follows the focus, loads the focused PDF and decides
//! which page (if any) can be shown.
//!
//! Page validity is only known once the document has loaded, so a focus with
//! a bad page is accepted as-is and surfaces later as [`PageTarget::OutOfRange`].

use crate::types::Focus;
use async_trait::async_trait;
use hayro_interpret::hayro_syntax::Pdf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

pub const PDF_PATH: &str = "/api/pdf";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("could not fetch document: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("document server returned {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid document url: {0}")]
    InvalidUrl(String),
    #[error("unreadable PDF: {0}")]
    Parse(String),
    #[error("document not found: {0}")]
    NotFound(String),
}

/// Where a requested page lands once the page count is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageTarget {
    /// No page requested; show the document from the top.
    Whole,
    Page(u32),
    OutOfRange { requested: u32, page_count: u32 },
}

pub fn resolve_page(page: Option<u32>, page_count: u32) -> PageTarget {
    match page {
        None => PageTarget::Whole,
        Some(requested) if (1..=page_count).contains(&requested) => PageTarget::Page(requested),
        Some(requested) => PageTarget::OutOfRange {
            requested,
            page_count,
        },
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DocumentView {
    #[default]
    Empty,
    Loading {
        document_id: String,
    },
    Ready {
        document_id: String,
        page_count: u32,
        target: PageTarget,
    },
    Unavailable {
        document_id: String,
        reason: String,
    },
}

/// The PDF capability the surface relies on: report how many pages a document has.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn page_count(&self, document_id: &str) -> Result<u32, DocumentError>;
}

/// URL the backend serves `document_id` from.
pub fn document_url(base_url: &str, document_id: &str) -> Result<String, DocumentError> {
    let base = format!("{}{}", base_url.trim_end_matches('/'), PDF_PATH);
    reqwest::Url::parse_with_params(&base, &[("file", document_id)])
        .map(String::from)
        .map_err(|e| DocumentError::InvalidUrl(e.to_string()))
}

pub fn count_pages(bytes: Vec<u8>) -> Result<u32, DocumentError> {
    let pdf = Pdf::new(Arc::new(bytes)).map_err(|e| DocumentError::Parse(format!("{:?}", e)))?;
    Ok(u32::try_from(pdf.pages().len()).unwrap_or(u32::MAX))
}

/// Loads PDFs from the backend's file route.
pub struct HttpDocumentLoader {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocumentLoader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl DocumentLoader for HttpDocumentLoader {
    async fn page_count(&self, document_id: &str) -> Result<u32, DocumentError> {
        let url = document_url(&self.base_url, document_id)?;
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DocumentError::NotFound(document_id.to_string()));
        }
        if !status.is_success() {
            return Err(DocumentError::Status(status));
        }
        let bytes = response.bytes().await?;
        let pages = count_pages(bytes.to_vec())?;
        tracing::debug!(document = %document_id, pages, "document loaded");
        Ok(pages)
    }
}

struct Loaded {
    document_id: String,
    page_count: u32,
}

/// Publishes a [`DocumentView`] for whatever the focus points at.
#[derive(Clone)]
pub struct DocumentSurface {
    loader: Arc<dyn DocumentLoader>,
    view: Arc<watch::Sender<DocumentView>>,
}

impl DocumentSurface {
    pub fn new(loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            loader,
            view: Arc::new(watch::Sender::new(DocumentView::Empty)),
        }
    }

    pub fn view(&self) -> DocumentView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DocumentView> {
        self.view.subscribe()
    }

    fn publish(&self, view: DocumentView) {
        self.view.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }

    /// Track `focus` until its controller is dropped. Page changes within the
    /// loaded document reuse the known page count; a focus change while a
    /// document is loading abandons that load.
    pub async fn follow(&self, mut focus: watch::Receiver<Focus>) {
        let mut loaded: Option<Loaded> = None;
        loop {
            let current = focus.borrow_and_update().clone();
            let Some(target) = current else {
                self.publish(DocumentView::Empty);
                if focus.changed().await.is_err() {
                    return;
                }
                continue;
            };

            if let Some(doc) = loaded
                .as_ref()
                .filter(|doc| doc.document_id == target.document_id)
            {
                self.publish(DocumentView::Ready {
                    document_id: doc.document_id.clone(),
                    page_count: doc.page_count,
                    target: resolve_page(target.page, doc.page_count),
                });
                if focus.changed().await.is_err() {
                    return;
                }
                continue;
            }

            self.publish(DocumentView::Loading {
                document_id: target.document_id.clone(),
            });
            tokio::select! {
                result = self.loader.page_count(&target.document_id) => {
                    match result {
                        Ok(page_count) => {
                            self.publish(DocumentView::Ready {
                                document_id: target.document_id.clone(),
                                page_count,
                                target: resolve_page(target.page, page_count),
                            });
                            loaded = Some(Loaded {
                                document_id: target.document_id,
                                page_count,
                            });
                        }
                        Err(err) => {
                            tracing::warn!(document = %target.document_id, error = %err, "document unavailable");
                            self.publish(DocumentView::Unavailable {
                                document_id: target.document_id,
                                reason: err.to_string(),
                            });
                            loaded = None;
                        }
                    }
                    if focus.changed().await.is_err() {
                        return;
                    }
                }
                changed = focus.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    tracing::debug!(document = %target.document_id, "load superseded by new focus");
                }
            }
        }
    }
}
