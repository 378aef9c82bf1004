use crate::document::{DocumentSurface, DocumentView, PageTarget, document_url};
use dioxus::prelude::*;

#[component]
pub fn DocumentPanel(base_url: String) -> Element {
    let surface = use_context::<DocumentSurface>();
    let view = use_signal(DocumentView::default);

    use_future(move || {
        let surface = surface.clone();
        let mut view = view;
        async move {
            let mut changes = surface.subscribe();
            loop {
                let current = changes.borrow_and_update().clone();
                view.set(current);
                if changes.changed().await.is_err() {
                    break;
                }
            }
        }
    });

    let content = match view() {
        DocumentView::Empty => rsx! { div { class: "doc-placeholder", "No PDF selected" } },
        DocumentView::Loading { .. } => rsx! { div { class: "doc-placeholder", "Loading…" } },
        DocumentView::Unavailable { document_id, reason } => rsx! {
            div { class: "doc-error", "Could not open {document_id}: {reason}" }
        },
        DocumentView::Ready { target: PageTarget::OutOfRange { .. }, .. } => rsx! {
            div { class: "doc-error", "File not found (page out of range)" }
        },
        DocumentView::Ready { document_id, target, page_count } => {
            let page = match target {
                PageTarget::Page(page) => Some(page),
                _ => None,
            };
            rsx! { PdfFrame { base_url, document_id, page, page_count } }
        }
    };

    rsx! {
        div { class: "document-panel", {content} }
    }
}

#[component]
fn PdfFrame(base_url: String, document_id: String, page: Option<u32>, page_count: u32) -> Element {
    let src = match document_url(&base_url, &document_id) {
        Ok(url) => url,
        Err(err) => {
            return rsx! { div { class: "doc-error", "{err}" } };
        }
    };
    let src = match page {
        Some(page) => format!("{src}#page={page}"),
        None => src,
    };
    let caption = match page {
        Some(page) => format!("{document_id}, page {page} of {page_count}"),
        None => format!("{document_id}, {page_count} pages"),
    };

    rsx! {
        div { class: "doc-caption", "{caption}" }
        iframe { key: "{src}", class: "doc-frame", src: "{src}", title: "{document_id}" }
    }
}
