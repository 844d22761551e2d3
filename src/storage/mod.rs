pub mod file;
pub mod memory;
pub mod store;

use std::sync::Arc;

use crate::{
    config::{SlotConfig, StorageConfig, resolve_path},
    models::SlotError,
};
use async_trait::async_trait;
use eyre::{Context, Result};

pub use file::FileSlot;
pub use memory::MemorySlot;
pub use store::{ArcStore, ConversationStore, SaveOutcome};

/// A single durable location holding one textual blob.
#[async_trait]
pub trait Slot {
    /// `None` when nothing has been written yet.
    async fn read(&self) -> Result<Option<String>, SlotError>;
    /// Replaces the whole blob.
    async fn write(&self, blob: String) -> Result<(), SlotError>;
}

pub type ArcSlot = Arc<dyn Slot + Send + Sync>;

pub fn new_slot(config: &StorageConfig) -> Result<ArcSlot> {
    let slot: ArcSlot = match &config.slot {
        SlotConfig::File(file) => {
            let dir = resolve_path(&file.dir)
                .wrap_err(format!("resolving storage dir {}", file.dir))?;
            Arc::new(FileSlot::new(dir, &file.key).with_quota(file.quota_bytes))
        }
        SlotConfig::Memory(memory) => Arc::new(MemorySlot::default().with_quota(memory.quota_bytes)),
    };
    Ok(slot)
}

pub fn new_store(config: &StorageConfig) -> Result<ArcStore> {
    let slot = new_slot(config).wrap_err("initializing storage slot")?;
    Ok(Arc::new(
        ConversationStore::new(slot).with_max_conversations(config.max_conversations),
    ))
}

/// Slots reject blobs bigger than their quota the way a browser rejects an
/// oversized local storage write.
pub(crate) fn check_quota(quota: Option<usize>, blob: &str) -> Result<(), SlotError> {
    match quota {
        Some(quota) if blob.len() > quota => Err(SlotError::QuotaExceeded),
        _ => Ok(()),
    }
}
