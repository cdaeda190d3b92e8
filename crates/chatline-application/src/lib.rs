//! Application layer for chatline.
//!
//! Hosts the synchronization controller that keeps the local view of a chat
//! session consistent with the backend.

pub mod controller;
pub mod event;

pub use controller::{PendingSend, SyncController};
pub use event::{ConnectionState, ControllerEvent, Screen, ViewState};
