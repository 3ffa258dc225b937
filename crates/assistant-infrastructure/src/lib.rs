//! Storage backends for persisted client state.
//!
//! # Module Structure
//!
//! - `toml_state_store`: file-backed store with atomic writes
//! - `memory_state_store`: in-memory store for tests and embedding

pub mod memory_state_store;
pub mod toml_state_store;

pub use memory_state_store::InMemoryStateStore;
pub use toml_state_store::TomlStateStore;
