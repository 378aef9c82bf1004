pub mod chat;
pub mod document;

pub use chat::ChatView;
pub use document::DocumentPanel;
