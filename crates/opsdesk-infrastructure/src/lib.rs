//! Infrastructure layer for the Opsdesk console.
//!
//! Implements the core storage capability: an in-memory store for tests
//! and a TOML-file-backed store for the shipped console, plus path
//! resolution for where that file lives.

pub mod file_store;
pub mod memory_store;
pub mod paths;

pub use file_store::TomlFileStore;
pub use memory_store::MemoryStore;
pub use paths::ConsolePaths;
