//! Pure data structures for design tokens, themes and remote sync.
//!
//! Nothing in here performs I/O or resolution. `sync-core` owns the
//! behaviour; this crate only describes the shapes that flow between the
//! resolver, the store, the storage adapters and the host.

pub mod builder;
pub mod document;
pub mod error;
pub mod resolved;
pub mod sync;
pub mod theme;
pub mod tokens;

#[cfg(test)]
mod tests;

pub use builder::{TokenBuilder, validate_token_name};
pub use document::{DOCUMENT_VERSION, StorageType, TokenDocument};
pub use error::model_error::ModelError;
pub use resolved::{BrokenReference, ResolvedToken, ResolvedTokens};
pub use sync::{RemoteMetadata, RemoteTokenData, StorageProvider, SyncContext, SyncResult};
pub use theme::{ThemeObject, TokenSetStatus, UsedTokenSets};
pub use tokens::{Token, TokenSet, TokenSets, TokenType};
