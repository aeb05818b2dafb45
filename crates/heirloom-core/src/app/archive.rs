//! Archive - 複数 region への複製と catalog への登録を束ねるオーケストレーター
//!
//! # register のフロー
//! 1. 事前チェック（region 集合、予約属性、domain の存在、id の重複）
//! 2. region ごとに 1 タスクで並行 upload し、全タスクの完了を待つ
//! 3. 成功 0 件 → ReplicationFailed（metadata は書かない）
//! 4. 成功 1 件以上 → 成功した region だけを載せて Catalog.Add
//! 5. commit 失敗 → MetadataCommitFailed（upload 済みの Blob は残る。verify で検出できる）
//!
//! metadata の commit は、その record の全 upload の完了後にしか起きません。

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use sha2::{Digest, Sha256};

use super::downloader::ArtifactDownloader;
use crate::catalog::{codec, Catalog};
use crate::config::Config;
use crate::domain::{
    attr, ArtifactId, ArtifactName, ArtifactRecord, Attributes, BlobAddress, CatalogError,
    DownloadOutcome, RegisterOutcome, Region, ValidationError, VerifyOptions, VerifyReport,
};
use crate::fanout;
use crate::ports::{BlobStore, Clock, IdGenerator, MetadataStore};

/// Archive はアプリケーションのエントリポイント
///
/// `ArchiveBuilder` で構築します。全コンポーネントは構築時に一度だけ作られます。
pub struct Archive {
    config: Arc<Config>,
    catalog: Catalog,
    blobs: Arc<dyn BlobStore>,
    downloader: ArtifactDownloader,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Archive {
    pub(crate) fn new(
        config: Arc<Config>,
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let catalog = Catalog::new(metadata, Arc::clone(&blobs), Arc::clone(&config));
        let downloader = ArtifactDownloader::new(Arc::clone(catalog.reader()), Arc::clone(&blobs));
        Self {
            config,
            catalog,
            blobs,
            downloader,
            ids,
            clock,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn setup(&self, name: &ArtifactName) -> Result<(), CatalogError> {
        self.catalog.create_domain(name).await
    }

    /// Read a local payload and register it.
    ///
    /// Empty `regions` means the configured default set. Without an explicit
    /// `id` a fresh one is generated.
    pub async fn add(
        &self,
        name: &ArtifactName,
        payload_path: &Path,
        regions: &[Region],
        id: Option<ArtifactId>,
        attributes: Attributes,
    ) -> Result<RegisterOutcome, CatalogError> {
        let regions = if regions.is_empty() {
            self.config.regions.as_slice()
        } else {
            regions
        };

        let payload = tokio::fs::read(payload_path)
            .await
            .map_err(|source| CatalogError::Io {
                path: payload_path.to_path_buf(),
                source,
            })?;

        let id = match id {
            Some(id) => id,
            None => self.allocate_id(name).await?,
        };
        self.register(name, &id, Bytes::from(payload), regions, attributes)
            .await
    }

    /// Generate an id that is not yet used by `name`.
    async fn allocate_id(&self, name: &ArtifactName) -> Result<ArtifactId, CatalogError> {
        let attempts = self.config.id_attempts.max(1);
        let mut attempt = 1;
        loop {
            let candidate = self.ids.generate();
            if self.catalog.reader().fetch(name, &candidate).await?.is_none() {
                return Ok(candidate);
            }
            if attempt >= attempts {
                return Err(CatalogError::DuplicateId {
                    name: name.clone(),
                    id: candidate,
                });
            }
            tracing::warn!(%name, id = %candidate, attempt, "generated id already exists, retrying");
            attempt += 1;
        }
    }

    /// Replicate `payload` to every region and commit the successful placements.
    pub async fn register(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
        payload: Bytes,
        regions: &[Region],
        attributes: Attributes,
    ) -> Result<RegisterOutcome, CatalogError> {
        let mut targets: Vec<Region> = Vec::with_capacity(regions.len());
        for region in regions {
            if !targets.contains(region) {
                targets.push(region.clone());
            }
        }
        if targets.is_empty() {
            return Err(ValidationError::NoRegions.into());
        }
        if let Some(reserved) = attributes.keys().find(|k| codec::is_reserved(k)) {
            return Err(CatalogError::InvalidAttribute {
                attribute: reserved.clone(),
                reason: "reserved for region placement",
            });
        }

        // 既存の payload は決定的なキーにあるので、upload 前に弾く
        // (domain がなければ DomainNotFound もここで返る)
        if self.catalog.reader().fetch(name, id).await?.is_some() {
            return Err(CatalogError::DuplicateId {
                name: name.clone(),
                id: id.clone(),
            });
        }

        let attributes = self.with_computed_attributes(attributes, &payload);

        tracing::info!(
            %name,
            %id,
            bytes = payload.len(),
            regions = targets.len(),
            "replicating payload"
        );
        let outcomes = fanout::per_region(targets, |region| {
            let blobs = Arc::clone(&self.blobs);
            let address = self.config.layout.address(&region, name, id);
            let payload = payload.clone();
            async move {
                match blobs.put(&region, &address, payload).await {
                    Ok(()) => {
                        tracing::info!(%region, %address, "uploaded payload");
                        Ok(address)
                    }
                    Err(e) => {
                        tracing::warn!(%region, %address, error = %e, "upload failed");
                        Err(e)
                    }
                }
            }
        })
        .await;
        let (succeeded, failed) = fanout::partition(outcomes);

        if succeeded.is_empty() {
            return Err(CatalogError::ReplicationFailed {
                name: name.clone(),
                id: id.clone(),
                failures: failed,
            });
        }

        let succeeded_regions: Vec<Region> = succeeded.iter().map(|(r, _)| r.clone()).collect();
        let region_urls: BTreeMap<Region, BlobAddress> = succeeded.into_iter().collect();

        self.catalog
            .add(name, id, region_urls, attributes)
            .await
            .map_err(|source| {
                tracing::warn!(
                    %name,
                    %id,
                    error = %source,
                    "metadata commit failed after upload; blobs left in place"
                );
                CatalogError::MetadataCommitFailed {
                    name: name.clone(),
                    id: id.clone(),
                    uploaded: succeeded_regions.clone(),
                    source: Box::new(source),
                }
            })?;

        if !failed.is_empty() {
            tracing::warn!(
                %name,
                %id,
                failed = failed.len(),
                "registered with a partial region set"
            );
        }
        Ok(RegisterOutcome {
            name: name.clone(),
            id: id.clone(),
            succeeded_regions,
            failed_regions: failed,
        })
    }

    fn with_computed_attributes(&self, mut attributes: Attributes, payload: &Bytes) -> Attributes {
        attributes.insert(attr::BUILT_AT.to_string(), self.clock.now().to_rfc3339());
        attributes.insert(attr::PAYLOAD_BYTES.to_string(), payload.len().to_string());
        attributes.insert(
            attr::SHA256.to_string(),
            format!("{:x}", Sha256::digest(payload)),
        );
        attributes
    }

    pub async fn retrieve(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
        region: &Region,
        destination: &Path,
    ) -> Result<DownloadOutcome, CatalogError> {
        self.downloader.download(name, id, region, destination).await
    }

    pub async fn update(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
        attribute: &str,
        value: &str,
    ) -> Result<ArtifactRecord, CatalogError> {
        self.catalog.update(name, id, attribute, value).await
    }

    /// Verify one name, or every name when `name` is `None`.
    ///
    /// Unclaimed regions are checked against the configured region set.
    pub async fn verify(
        &self,
        name: Option<&ArtifactName>,
        scan_orphans: bool,
    ) -> Result<VerifyReport, CatalogError> {
        let options = VerifyOptions {
            regions: self.config.regions.clone(),
            scan_orphans,
        };
        match name {
            Some(name) => self.catalog.verify(name, &options).await,
            None => self.catalog.verify_all(&options).await,
        }
    }
}
