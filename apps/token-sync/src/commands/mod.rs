//! One module per subcommand. Each returns data; `main` does the printing.

pub mod providers;
pub mod resolve;
pub mod sets;
pub mod sync;

use crate::document::FileDocumentStorage;
use crate::error::AppError;

use sync_core::store::TokenState;
use sync_core::sync::load_document;

use std::path::Path;

/// Opens the document file and loads it into a fresh state.
pub async fn open_state(document: &Path) -> Result<(FileDocumentStorage, TokenState), AppError> {
    let storage = FileDocumentStorage::open(document).await?;
    let loaded = load_document(&storage).await?;
    Ok((storage, TokenState::from_document(loaded)))
}
