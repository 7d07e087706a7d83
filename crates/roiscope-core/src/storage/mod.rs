//! Region persistence seam.

mod memory;

pub use memory::MemoryRegionStore;

use crate::protocol::ChannelId;
use crate::region::Region;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("No regions stored for channel {0}")]
    NotFound(ChannelId),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Where committed regions live between sessions, keyed by channel.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait RegionStore: Send + Sync {
    /// Load a channel's regions. A channel never saved yields `NotFound`.
    fn load(&self, channel_id: ChannelId) -> BoxFuture<'_, StorageResult<Vec<Region>>>;

    /// Replace a channel's regions.
    fn save(&self, channel_id: ChannelId, regions: &[Region]) -> BoxFuture<'_, StorageResult<()>>;
}

/// Region store (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait RegionStore {
    /// Load a channel's regions. A channel never saved yields `NotFound`.
    fn load(&self, channel_id: ChannelId) -> BoxFuture<'_, StorageResult<Vec<Region>>>;

    /// Replace a channel's regions.
    fn save(&self, channel_id: ChannelId, regions: &[Region]) -> BoxFuture<'_, StorageResult<()>>;
}
