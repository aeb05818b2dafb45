//! Delete - record とそれが参照する全 Blob を削除する
//!
//! # フロー
//! 1. record を取得（なければ NotFound）
//! 2. region ごとに Blob を並行削除し、結果を集約
//! 3. 全 region 成功 → metadata record を削除
//! 4. 1 つでも失敗 → record は残す（残っている Blob を正しく指しているため）
//!
//! 再実行は常に安全: 削除済みの Blob は「存在しない」として成功扱い。

use std::sync::Arc;

use super::metadata_error;
use super::reader::RecordReader;
use crate::config::Config;
use crate::domain::{ArtifactId, ArtifactName, CatalogError, DeleteOutcome};
use crate::fanout;
use crate::ports::{BlobStore, MetadataStore};

pub struct Delete {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    reader: Arc<RecordReader>,
    config: Arc<Config>,
}

impl Delete {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        reader: Arc<RecordReader>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            metadata,
            blobs,
            reader,
            config,
        }
    }

    pub async fn delete(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
    ) -> Result<DeleteOutcome, CatalogError> {
        let record = self.reader.fetch_required(name, id).await?;

        let outcomes = fanout::per_region(record.regions().cloned(), |region| {
            let blobs = Arc::clone(&self.blobs);
            let address = record.region_urls[&region].clone();
            async move {
                let result = blobs.delete(&region, &address).await;
                if result.is_ok() {
                    tracing::info!(%region, %address, "deleted blob");
                }
                result
            }
        })
        .await;

        let (removed, failures) = fanout::partition(outcomes);
        if !failures.is_empty() {
            for failure in &failures {
                tracing::warn!(
                    %name,
                    %id,
                    region = %failure.region,
                    cause = %failure.cause,
                    "blob delete failed, keeping metadata record"
                );
            }
            return Err(CatalogError::PartialDelete {
                name: name.clone(),
                id: id.clone(),
                remaining_regions: failures.iter().map(|f| f.region.clone()).collect(),
                failures,
            });
        }

        let domain = self.config.layout.domain(name);
        self.metadata
            .delete_item(&domain, id.as_str())
            .await
            .map_err(|e| metadata_error(name, e))?;
        tracing::info!(%name, %id, "deleted record from catalog");

        Ok(DeleteOutcome {
            name: name.clone(),
            id: id.clone(),
            removed_regions: removed.into_iter().map(|(region, ())| region).collect(),
        })
    }
}
