//! Update - record の属性を 1 つだけ書き換える
//!
//! payload と配置情報（予約属性）は変更できません。

use std::sync::Arc;

use super::codec;
use super::metadata_error;
use super::reader::RecordReader;
use crate::config::Config;
use crate::domain::{ArtifactId, ArtifactName, ArtifactRecord, CatalogError};
use crate::ports::{Item, MetadataStore};

pub struct Update {
    metadata: Arc<dyn MetadataStore>,
    reader: Arc<RecordReader>,
    config: Arc<Config>,
}

impl Update {
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

    /// Overwrite `attribute` with `value` and return the record as written.
    pub async fn update(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
        attribute: &str,
        value: &str,
    ) -> Result<ArtifactRecord, CatalogError> {
        if attribute.trim().is_empty() {
            return Err(CatalogError::InvalidAttribute {
                attribute: attribute.to_string(),
                reason: "attribute name must not be empty",
            });
        }
        if codec::is_reserved(attribute) {
            return Err(CatalogError::InvalidAttribute {
                attribute: attribute.to_string(),
                reason: "reserved for region placement",
            });
        }

        let mut record = self.reader.fetch_required(name, id).await?;

        let change: Item = [(attribute.to_string(), value.to_string())]
            .into_iter()
            .collect();
        self.metadata
            .put_attributes(&self.config.layout.domain(name), id.as_str(), &change)
            .await
            .map_err(|e| metadata_error(name, e))?;

        let previous = record
            .attributes
            .insert(attribute.to_string(), value.to_string());
        tracing::info!(%name, %id, attribute, value, ?previous, "updated attribute");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::testing::Fixture;
    use crate::domain::{Attributes, CatalogError};

    #[tokio::test]
    async fn update_touches_only_the_named_attribute() {
        let fx = Fixture::new().await;
        let id = fx.id("v1");
        let mut attrs = Attributes::new();
        attrs.insert("owner".to_string(), "ops".to_string());
        attrs.insert("stage".to_string(), "beta".to_string());
        let original = fx
            .catalog
            .add(&fx.name, &id, fx.urls(&id, &["r1", "r2"]), attrs)
            .await
            .unwrap();

        fx.catalog
            .update(&fx.name, &id, "stage", "stable")
            .await
            .unwrap();

        let shown = fx.catalog.show_one(&fx.name, &id).await.unwrap();
        assert_eq!(shown.region_urls, original.region_urls);
        assert_eq!(shown.attribute("stage"), Some("stable"));
        assert_eq!(shown.attribute("owner"), Some("ops"));
        assert_eq!(shown.attributes.len(), 2);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let fx = Fixture::new().await;
        let err = fx
            .catalog
            .update(&fx.name, &fx.id("ghost"), "stage", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }

    #[tokio::test]
    async fn placement_attributes_cannot_be_updated() {
        let fx = Fixture::new().await;
        let id = fx.id("v1");
        fx.catalog
            .add(&fx.name, &id, fx.urls(&id, &["r1"]), Attributes::new())
            .await
            .unwrap();

        let err = fx
            .catalog
            .update(&fx.name, &id, "placement.r1.key", "elsewhere")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidAttribute { .. }));
    }
}
