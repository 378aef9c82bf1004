use crate::config::AppConfig;
use crate::document::{DocumentSurface, HttpDocumentLoader};
use crate::gateway::HttpGateway;
use crate::session::Session;
use crate::views::{ChatView, DocumentPanel};
use dioxus::prelude::*;
use std::sync::Arc;

const ELLO_CSS: Asset = asset!("/assets/ello.css");

#[component]
pub fn App() -> Element {
    let config = use_context::<AppConfig>();
    let session = use_context_provider({
        let config = config.clone();
        move || {
            let gateway = Arc::new(HttpGateway::new(config.backend_url.clone()));
            Session::new(gateway, config.session_settings())
        }
    });
    let surface = use_context_provider({
        let config = config.clone();
        move || DocumentSurface::new(Arc::new(HttpDocumentLoader::new(config.backend_url.clone())))
    });

    use_document_follow(&session, surface);

    rsx! {
        document::Link { rel: "stylesheet", href: ELLO_CSS }
        div { class: "app",
            aside { class: "document-pane",
                DocumentPanel { base_url: config.backend_url.clone() }
            }
            div { class: "chat-pane",
                AppHeader {}
                ChatView {}
            }
        }
    }
}

/// Keep the document panel in step with the session focus.
fn use_document_follow(session: &Session, surface: DocumentSurface) {
    let focus = session.focus().clone();
    use_future(move || {
        let focus = focus.clone();
        let surface = surface.clone();
        async move { surface.follow(focus.subscribe()).await }
    });
}

#[component]
fn AppHeader() -> Element {
    let session = use_context::<Session>();
    let mut trace = use_signal(|| session.trace());
    let mut prod = use_signal(|| !session.sample_responses());

    let on_trace = {
        let session = session.clone();
        move |ev: FormEvent| {
            let enabled = ev.checked();
            session.set_trace(enabled);
            trace.set(enabled);
        }
    };
    let on_prod = {
        let session = session.clone();
        move |ev: FormEvent| {
            let enabled = ev.checked();
            session.set_sample_responses(!enabled);
            prod.set(enabled);
        }
    };
    let on_reset = move |_| session.reset();

    rsx! {
        header { class: "app-header",
            h1 { "Ello" }
            div { class: "header-controls",
                label { class: "toggle",
                    input { r#type: "checkbox", checked: prod(), onchange: on_prod }
                    "Prod"
                }
                label { class: "toggle",
                    input { r#type: "checkbox", checked: trace(), onchange: on_trace }
                    "Trace"
                }
                button { class: "btn", r#type: "button", onclick: on_reset, "New chat" }
            }
        }
    }
}
