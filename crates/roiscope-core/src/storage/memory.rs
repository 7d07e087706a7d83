//! In-memory region store.

use super::{BoxFuture, RegionStore, StorageError, StorageResult};
use crate::protocol::ChannelId;
use crate::region::Region;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store for testing and offline use.
///
/// Regions are kept as their JSON documents so a round trip through the
/// store sees exactly what a remote collaborator would.
#[derive(Default)]
pub struct MemoryRegionStore {
    channels: RwLock<HashMap<ChannelId, String>>,
}

impl MemoryRegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a channel with a raw JSON document, e.g. legacy pixel-space data.
    pub fn insert_raw(&self, channel_id: ChannelId, json: impl Into<String>) -> StorageResult<()> {
        let mut channels = self
            .channels
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        channels.insert(channel_id, json.into());
        Ok(())
    }

    /// Raw JSON document stored for a channel.
    pub fn raw(&self, channel_id: ChannelId) -> Option<String> {
        self.channels.read().ok()?.get(&channel_id).cloned()
    }
}

impl RegionStore for MemoryRegionStore {
    fn load(&self, channel_id: ChannelId) -> BoxFuture<'_, StorageResult<Vec<Region>>> {
        Box::pin(async move {
            let channels = self
                .channels
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            let json = channels.get(&channel_id).ok_or(StorageError::NotFound(channel_id))?;
            Ok(serde_json::from_str(json)?)
        })
    }

    fn save(&self, channel_id: ChannelId, regions: &[Region]) -> BoxFuture<'_, StorageResult<()>> {
        let json = serde_json::to_string(regions);
        Box::pin(async move {
            let json = json?;
            let mut channels = self
                .channels
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            channels.insert(channel_id, json);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_save_and_load() {
        let store = MemoryRegionStore::new();
        let regions = vec![Region::rectangle(1, "a", Point::new(0.1, 0.1), Point::new(0.5, 0.5))];

        pollster::block_on(store.save(3, &regions)).unwrap();
        let loaded = pollster::block_on(store.load(3)).unwrap();
        assert_eq!(loaded, regions);
    }

    #[test]
    fn test_not_found() {
        let store = MemoryRegionStore::new();
        let result = pollster::block_on(store.load(9));
        assert_eq!(result, Err(StorageError::NotFound(9)));
    }

    #[test]
    fn test_corrupt_document() {
        let store = MemoryRegionStore::new();
        store.insert_raw(1, "{not json").unwrap();
        let result = pollster::block_on(store.load(1));
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_channels_are_independent() {
        let store = MemoryRegionStore::new();
        pollster::block_on(store.save(1, &[])).unwrap();
        assert!(pollster::block_on(store.load(2)).is_err());
        assert_eq!(store.raw(1).as_deref(), Some("[]"));
    }
}
