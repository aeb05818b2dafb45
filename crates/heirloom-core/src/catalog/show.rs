//! Show - record の参照

use std::sync::Arc;

use super::reader::RecordReader;
use crate::domain::{ArtifactId, ArtifactName, ArtifactRecord, CatalogError};

pub struct Show {
    reader: Arc<RecordReader>,
}

impl Show {
    pub fn new(reader: Arc<RecordReader>) -> Self {
        Self { reader }
    }

    /// All records of `name`, ordered by id ascending.
    pub async fn show(&self, name: &ArtifactName) -> Result<Vec<ArtifactRecord>, CatalogError> {
        self.reader.fetch_all(name).await
    }

    pub async fn show_one(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
    ) -> Result<ArtifactRecord, CatalogError> {
        self.reader.fetch_required(name, id).await
    }

    /// Record with the greatest id; generated ids sort by creation time.
    pub async fn latest(&self, name: &ArtifactName) -> Result<Option<ArtifactRecord>, CatalogError> {
        Ok(self.reader.fetch_all(name).await?.pop())
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::testing::Fixture;
    use crate::domain::{Attributes, CatalogError};

    #[tokio::test]
    async fn records_come_back_in_id_order() {
        let fx = Fixture::new().await;
        for id in ["v3", "v1", "v2"] {
            fx.catalog
                .add(&fx.name, &fx.id(id), fx.urls(&fx.id(id), &["r1"]), Attributes::new())
                .await
                .unwrap();
        }

        let ids: Vec<String> = fx
            .catalog
            .show(&fx.name)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(ids, vec!["v1", "v2", "v3"]);

        let latest = fx.catalog.latest(&fx.name).await.unwrap().unwrap();
        assert_eq!(latest.id, fx.id("v3"));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let fx = Fixture::new().await;
        let err = fx.catalog.show_one(&fx.name, &fx.id("nope")).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
        assert!(fx.catalog.latest(&fx.name).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_name_reports_missing_domain() {
        let fx = Fixture::without_domain();
        let err = fx.catalog.show(&fx.name).await.unwrap_err();
        assert!(matches!(err, CatalogError::DomainNotFound { .. }));
    }
}
