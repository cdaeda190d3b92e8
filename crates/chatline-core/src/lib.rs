pub mod backend;
pub mod config;
pub mod conversation;
pub mod error;
pub mod format;
pub mod message;
pub mod notification;
pub mod render;
pub mod session;
pub mod transcript;

// Re-export common error type
pub use error::{ChatError, Result};
