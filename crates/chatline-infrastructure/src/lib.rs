pub mod paths;
pub mod selection_repository;
pub mod storage;

pub use crate::paths::ChatlinePaths;
pub use crate::selection_repository::TomlSelectionRepository;
pub use crate::storage::ConfigStorage;
