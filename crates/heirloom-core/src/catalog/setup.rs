//! Setup - artifact name ごとの catalog domain を用意する

use std::sync::Arc;

use crate::config::Config;
use crate::domain::{ArtifactName, CatalogError};
use crate::ports::MetadataStore;

pub struct Setup {
    metadata: Arc<dyn MetadataStore>,
    config: Arc<Config>,
}

impl Setup {
    pub fn new(metadata: Arc<dyn MetadataStore>, config: Arc<Config>) -> Self {
        Self { metadata, config }
    }

    /// Ensure the domain for `name` exists. Safe to call on every run.
    pub async fn create_domain(&self, name: &ArtifactName) -> Result<(), CatalogError> {
        let domain = self.config.layout.domain(name);
        if self.domain_exists(name).await? {
            tracing::debug!(%name, %domain, "catalog domain already exists");
            return Ok(());
        }
        self.metadata
            .create_domain(&domain)
            .await
            .map_err(CatalogError::MetadataUnavailable)?;
        tracing::info!(%name, %domain, "created catalog domain");
        Ok(())
    }

    pub async fn domain_exists(&self, name: &ArtifactName) -> Result<bool, CatalogError> {
        self.metadata
            .domain_exists(&self.config.layout.domain(name))
            .await
            .map_err(CatalogError::MetadataUnavailable)
    }
}
