//! Shared primitives for the token sync workspace.
//!
//! This crate holds the small building blocks every other crate leans on:
//! error locations, HTTP status categorisation and secret handling.
//! It has no knowledge of tokens, themes or providers.
//!
//! ## Architecture
//!
//! - **common** (this crate): Cross-cutting primitives
//! - **models**: Pure token/theme/sync data structures
//! - **sync-core**: Resolution engine, storage adapters and sync orchestration
//! - **token-sync**: Command-line host wiring everything together

pub mod error;
pub mod http_status;
pub mod redacted_secret;

#[cfg(test)]
mod tests;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_secret::RedactedSecret;
