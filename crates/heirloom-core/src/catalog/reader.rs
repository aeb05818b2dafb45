//! RecordReader - catalog から record を読む共有コンポーネント
//!
//! Catalog の構築時に 1 度だけ作り、Arc で各コンポーネントに渡します。

use std::sync::Arc;

use super::codec;
use super::metadata_error;
use crate::config::Config;
use crate::domain::{ArtifactId, ArtifactName, ArtifactRecord, CatalogError};
use crate::ports::MetadataStore;

pub struct RecordReader {
    metadata: Arc<dyn MetadataStore>,
    config: Arc<Config>,
}

impl RecordReader {
    pub fn new(metadata: Arc<dyn MetadataStore>, config: Arc<Config>) -> Self {
        Self { metadata, config }
    }

    /// `Ok(None)` when no record is visible for `id`.
    pub async fn fetch(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
    ) -> Result<Option<ArtifactRecord>, CatalogError> {
        let domain = self.config.layout.domain(name);
        let item = self
            .metadata
            .get_item(&domain, id.as_str())
            .await
            .map_err(|e| metadata_error(name, e))?;
        item.map(|item| codec::decode(name, id.as_str(), item))
            .transpose()
    }

    pub async fn fetch_required(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
    ) -> Result<ArtifactRecord, CatalogError> {
        self.fetch(name, id)
            .await?
            .ok_or_else(|| CatalogError::NotFound {
                name: name.clone(),
                id: id.clone(),
            })
    }

    /// Every visible record of `name`, ordered by id ascending.
    pub async fn fetch_all(&self, name: &ArtifactName) -> Result<Vec<ArtifactRecord>, CatalogError> {
        let domain = self.config.layout.domain(name);
        let items = self
            .metadata
            .select(&domain)
            .await
            .map_err(|e| metadata_error(name, e))?;
        let mut records = items
            .into_iter()
            .map(|(item_name, item)| codec::decode(name, &item_name, item))
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}
