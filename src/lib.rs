//! Ello: a chat client for a document-QA backend.
//!
//! Answers are revealed word by word into the transcript while the document
//! panel jumps to the first cited page.
//!
//! # Architecture
//!
//! - `transcript` - message store, addressed by exchange id
//! - `reveal` - timed word-by-word reveal, cancellable per exchange
//! - `gateway` - backend request/response bridge
//! - `focus` - the document + page the viewer should show
//! - `document` - loads the focused PDF and resolves the requested page
//! - `composer` - draft input and the submit flow
//! - `session` - wires the components together
//! - `ui`, `views` - Dioxus shell (feature `ui`)

pub mod composer;
pub mod config;
pub mod document;
pub mod focus;
pub mod gateway;
pub mod render;
pub mod reveal;
pub mod session;
pub mod transcript;
pub mod types;

#[cfg(feature = "ui")]
pub mod ui;
#[cfg(feature = "ui")]
pub mod views;
