//! ArtifactDownloader - name + id + region から payload を取り出してファイルに書く
//!
//! # 手順
//! 1. record を読む（なければ NotFound）
//! 2. region の配置情報を引く（なければ RegionNotReplicated）
//! 3. Blob を取得（失敗・欠損は BlobUnavailable）
//! 4. destination に上書きで書き込む（内容は一切変換しない）

use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::catalog::RecordReader;
use crate::domain::{attr, ArtifactId, ArtifactName, CatalogError, DownloadOutcome, Region};
use crate::ports::BlobStore;

pub struct ArtifactDownloader {
    reader: Arc<RecordReader>,
    blobs: Arc<dyn BlobStore>,
}

impl ArtifactDownloader {
    pub fn new(reader: Arc<RecordReader>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { reader, blobs }
    }

    pub async fn download(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
        region: &Region,
        destination: &Path,
    ) -> Result<DownloadOutcome, CatalogError> {
        let record = self.reader.fetch_required(name, id).await?;
        let address = record
            .address(region)
            .cloned()
            .ok_or_else(|| CatalogError::RegionNotReplicated {
                name: name.clone(),
                id: id.clone(),
                region: region.clone(),
            })?;

        tracing::info!(%name, %id, %region, %address, "downloading payload");
        let payload = self
            .blobs
            .get(region, &address)
            .await
            .map_err(|source| CatalogError::BlobUnavailable {
                region: region.clone(),
                bucket: address.bucket.clone(),
                key: address.key.clone(),
                source,
            })?;

        if let Some(expected) = record.attribute(attr::SHA256) {
            let actual = format!("{:x}", Sha256::digest(&payload));
            if actual != expected {
                tracing::warn!(%name, %id, %region, expected, %actual, "payload checksum mismatch");
            }
        }

        tracing::info!(path = %destination.display(), bytes = payload.len(), "writing payload");
        tokio::fs::write(destination, &payload)
            .await
            .map_err(|source| CatalogError::Io {
                path: destination.to_path_buf(),
                source,
            })?;

        Ok(DownloadOutcome {
            region: region.clone(),
            address,
            destination: destination.to_path_buf(),
            bytes_written: payload.len(),
        })
    }
}
