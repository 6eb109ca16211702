//! Token resolution engine.
//!
//! Synchronous and pure: every pass works on its own [`crate::graph::TokenGraph`]
//! snapshot, so passes can run in parallel against distinct snapshots.

pub mod alias;
pub mod composition;
pub mod expression;
pub mod merge;

pub use alias::AliasResolver;
pub use composition::CompositionExpander;
pub use merge::{TokenSetMerger, resolve_graph, without_source_tokens};
