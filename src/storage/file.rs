#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

use crate::models::SlotError;

use super::{Slot, check_quota};

/// Keeps the blob in `<dir>/<key>.json`.
pub struct FileSlot {
    path: PathBuf,
    quota: Option<usize>,
}

impl FileSlot {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
            quota: None,
        }
    }

    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

#[async_trait]
impl Slot for FileSlot {
    async fn read(&self) -> Result<Option<String>, SlotError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, blob: String) -> Result<(), SlotError> {
        check_quota(self.quota, &blob)?;

        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(map_io_error)?;
        }

        // Write aside then rename so readers never observe a partial blob.
        let tmp = self.tmp_path();
        if let Err(err) = tokio::fs::write(&tmp, blob.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(map_io_error(err));
        }
        if let Err(err) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(map_io_error(err));
        }

        log::trace!("wrote {} bytes to {}", blob.len(), self.path.display());
        Ok(())
    }
}

fn map_io_error(err: std::io::Error) -> SlotError {
    match err.kind() {
        ErrorKind::StorageFull | ErrorKind::QuotaExceeded => SlotError::QuotaExceeded,
        _ => SlotError::Io(err),
    }
}
