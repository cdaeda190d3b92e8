//! Message domain module.
//!
//! - `model`: the `Message` record and its `MessageRole`
//! - `lenient`: serde helpers for the backend's loosely typed usage metrics

mod lenient;
mod model;

pub use model::{Message, MessageRole};
