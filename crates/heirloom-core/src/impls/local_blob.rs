//! LocalBlobStore - ファイルシステム上の Blob ストア
//!
//! レイアウト: `{root}/{region}/{bucket}/{key}`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{BlobAddress, Region};
use crate::ports::{BlobStore, StoreError};

pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_dir(&self, region: &Region, bucket: &str) -> PathBuf {
        self.root.join(region.as_str()).join(bucket)
    }

    fn object_path(&self, region: &Region, address: &BlobAddress) -> PathBuf {
        let mut path = self.bucket_dir(region, &address.bucket);
        for segment in address.key.split('/') {
            path.push(segment);
        }
        path
    }
}

fn not_found(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::NotFound
}

/// Keys (slash separated, relative to `bucket_dir`) of every file below `dir`.
async fn walk(bucket_dir: &Path, dir: PathBuf) -> Result<Vec<String>, StoreError> {
    let mut keys = Vec::new();
    let mut pending = vec![dir];
    while let Some(dir) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if not_found(&e) => continue,
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if let Ok(rel) = path.strip_prefix(bucket_dir) {
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                keys.push(key);
            }
        }
    }
    Ok(keys)
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        region: &Region,
        address: &BlobAddress,
        payload: Bytes,
    ) -> Result<(), StoreError> {
        let path = self.object_path(region, address);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // 途中まで書かれたファイルが見えないよう、一時ファイル経由で置き換える
        let mut tmp = path.clone().into_os_string();
        tmp.push(".partial");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &payload).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(%region, %address, path = %path.display(), "stored blob");
        Ok(())
    }

    async fn get(&self, region: &Region, address: &BlobAddress) -> Result<Bytes, StoreError> {
        match tokio::fs::read(self.object_path(region, address)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if not_found(&e) => Err(StoreError::ObjectNotFound(address.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, region: &Region, address: &BlobAddress) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(self.object_path(region, address)).await?)
    }

    async fn delete(&self, region: &Region, address: &BlobAddress) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.object_path(region, address)).await {
            Ok(()) => Ok(()),
            Err(e) if not_found(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(
        &self,
        region: &Region,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<String>, StoreError> {
        let bucket_dir = self.bucket_dir(region, bucket);
        let mut keys: Vec<String> = walk(&bucket_dir, bucket_dir.clone())
            .await?
            .into_iter()
            .filter(|k| k.starts_with(prefix) && !k.ends_with(".partial"))
            .collect();
        keys.sort();
        Ok(keys)
    }
}
