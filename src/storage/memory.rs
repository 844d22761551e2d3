use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::models::SlotError;

use super::{Slot, check_quota};

#[derive(Default)]
pub struct MemorySlot {
    blob: Mutex<Option<String>>,
    quota: Option<usize>,
    writes: AtomicUsize,
}

impl MemorySlot {
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    pub fn with_blob(self, blob: impl Into<String>) -> Self {
        *self.lock() = Some(blob.into());
        self
    }

    pub fn blob(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Number of accepted writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A panic while holding the lock cannot leave the blob half-written.
        self.blob.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Slot for MemorySlot {
    async fn read(&self) -> Result<Option<String>, SlotError> {
        Ok(self.lock().clone())
    }

    async fn write(&self, blob: String) -> Result<(), SlotError> {
        check_quota(self.quota, &blob)?;
        *self.lock() = Some(blob);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
