//! Add - 新しい artifact version の record を書き込む
//!
//! payload の複製が成功した後に Archive から呼ばれます。
//!
//! # 既知の制約
//! 重複チェックは read-before-write です。結果整合のストアでは、同じ id を
//! 同時に書き込む 2 者がどちらもチェックを通過しうる（後勝ち）。

use std::collections::BTreeMap;
use std::sync::Arc;

use super::codec;
use super::metadata_error;
use super::reader::RecordReader;
use crate::config::Config;
use crate::domain::{
    ArtifactId, ArtifactName, ArtifactRecord, Attributes, BlobAddress, CatalogError, Region,
    ValidationError,
};
use crate::ports::MetadataStore;

pub struct Add {
    metadata: Arc<dyn MetadataStore>,
    reader: Arc<RecordReader>,
    config: Arc<Config>,
}

impl Add {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        reader: Arc<RecordReader>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            metadata,
            reader,
            config,
        }
    }

    pub async fn add(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
        region_urls: BTreeMap<Region, BlobAddress>,
        attributes: Attributes,
    ) -> Result<ArtifactRecord, CatalogError> {
        if region_urls.is_empty() {
            return Err(ValidationError::NoRegions.into());
        }
        if let Some(reserved) = attributes.keys().find(|k| codec::is_reserved(k)) {
            return Err(CatalogError::InvalidAttribute {
                attribute: reserved.clone(),
                reason: "reserved for region placement",
            });
        }

        if self.reader.fetch(name, id).await?.is_some() {
            return Err(CatalogError::DuplicateId {
                name: name.clone(),
                id: id.clone(),
            });
        }

        let record = ArtifactRecord::new(name.clone(), id.clone(), region_urls, attributes);
        let domain = self.config.layout.domain(name);
        self.metadata
            .put_attributes(&domain, id.as_str(), &codec::encode(&record))
            .await
            .map_err(|e| metadata_error(name, e))?;

        tracing::info!(
            %name,
            %id,
            regions = record.region_urls.len(),
            "added record to catalog"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::Fixture;

    #[tokio::test]
    async fn add_writes_a_visible_record() {
        let fx = Fixture::new().await;
        let urls = fx.urls(&fx.id("v1"), &["r1", "r2"]);

        let record = fx
            .catalog
            .add(&fx.name, &fx.id("v1"), urls.clone(), Attributes::new())
            .await
            .unwrap();
        assert_eq!(record.region_urls, urls);

        let shown = fx.catalog.show_one(&fx.name, &fx.id("v1")).await.unwrap();
        assert_eq!(shown, record);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let fx = Fixture::new().await;
        let urls = fx.urls(&fx.id("v1"), &["r1"]);
        fx.catalog
            .add(&fx.name, &fx.id("v1"), urls.clone(), Attributes::new())
            .await
            .unwrap();

        let err = fx
            .catalog
            .add(&fx.name, &fx.id("v1"), urls, Attributes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { .. }));
    }

    #[tokio::test]
    async fn reserved_attributes_and_empty_placement_are_rejected() {
        let fx = Fixture::new().await;

        let err = fx
            .catalog
            .add(&fx.name, &fx.id("v1"), BTreeMap::new(), Attributes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(ValidationError::NoRegions)));

        let mut attrs = Attributes::new();
        attrs.insert("placement.r9.bucket".to_string(), "x".to_string());
        let err = fx
            .catalog
            .add(&fx.name, &fx.id("v1"), fx.urls(&fx.id("v1"), &["r1"]), attrs)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidAttribute { .. }));
    }

    #[tokio::test]
    async fn add_without_setup_reports_missing_domain() {
        let fx = Fixture::without_domain();
        let err = fx
            .catalog
            .add(&fx.name, &fx.id("v1"), fx.urls(&fx.id("v1"), &["r1"]), Attributes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::DomainNotFound { .. }));
    }
}
