//! Single JSON document on disk. Every mutation rewrites the whole file.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::data::KvData;
use crate::error::StoreError;

#[derive(Debug)]
pub struct FileKv {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileKv {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) async fn read<T>(&self, op: impl FnOnce(&KvData) -> T) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        let data = self.load().await?;
        Ok(op(&data))
    }

    pub(crate) async fn update<T>(
        &self,
        op: impl FnOnce(&mut KvData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;
        let out = op(&mut data)?;
        self.save(&data).await?;
        Ok(out)
    }

    async fn load(&self) -> Result<KvData, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(KvData::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(KvData::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, data: &KvData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
