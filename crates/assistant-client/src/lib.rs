//! HTTP transport implementation of the assistant backend.
//!
//! # Module Structure
//!
//! - `config`: endpoint configuration (`ClientConfig`)
//! - `wire`: wire-format DTOs and decision encoding
//! - `http`: the reqwest-based [`HttpAssistantClient`]

pub mod config;
pub mod http;
pub mod wire;

pub use config::ClientConfig;
pub use http::HttpAssistantClient;
