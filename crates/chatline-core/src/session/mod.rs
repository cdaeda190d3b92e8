//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: the authenticated `Session` and the `PersistedSelection` keys
//! - `repository`: storage trait for the persisted selection
//! - `store`: `SessionStore`, validation of persisted keys and write-through
//! - `memory`: in-process repository used by ephemeral runs and tests

mod memory;
mod model;
mod repository;
mod store;

pub use memory::MemorySelectionRepository;
pub use model::{PersistedSelection, Session};
pub use repository::SelectionRepository;
pub use store::{RestoredSelection, SessionStore};
