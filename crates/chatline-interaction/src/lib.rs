//! HTTP gateway to the chat backend.

pub mod endpoints;
pub mod http_backend;

pub use endpoints::Endpoints;
pub use http_backend::HttpChatBackend;
