pub mod channel;
pub mod config;
pub mod edit;
pub mod resolve;
pub mod storage;
pub mod sync;

pub use channel::ChannelError;
pub use config::ConfigError;
pub use edit::EditError;
pub use resolve::ResolveError;
pub use storage::StorageError;
pub use sync::SyncError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}
