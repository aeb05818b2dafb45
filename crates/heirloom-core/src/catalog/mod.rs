//! Catalog - メタデータ操作
//!
//! # 主要コンポーネント
//! - **Setup**: domain の作成（冪等）
//! - **Add**: record の書き込み（重複 id は拒否）
//! - **Show**: record の参照（id 昇順）
//! - **Delete**: Blob と record の削除（部分失敗時は record を残す）
//! - **Update**: 属性 1 つの書き換え
//! - **Verify**: 配置情報と Blob の突き合わせ（読み取り専用）
//!
//! 各コンポーネントは `Catalog::new` で一度だけ構築され、共有クライアントは
//! コンストラクタ経由で明示的に渡されます（遅延初期化なし）。

pub mod codec;
pub mod reader;
pub mod setup;
pub mod add;
pub mod show;
pub mod delete;
pub mod update;
pub mod verify;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use self::add::Add;
pub use self::delete::Delete;
pub use self::reader::RecordReader;
pub use self::setup::Setup;
pub use self::show::Show;
pub use self::update::Update;
pub use self::verify::Verify;

use crate::config::Config;
use crate::domain::{
    ArtifactId, ArtifactName, ArtifactRecord, Attributes, BlobAddress, CatalogError,
    DeleteOutcome, Region, VerifyOptions, VerifyReport,
};
use crate::ports::{BlobStore, MetadataStore, StoreError};

/// Map a metadata store error in the context of `name`.
pub(crate) fn metadata_error(name: &ArtifactName, err: StoreError) -> CatalogError {
    match err {
        StoreError::NoSuchDomain(_) => CatalogError::DomainNotFound { name: name.clone() },
        other => CatalogError::MetadataUnavailable(other),
    }
}

/// Facade over the catalog components.
pub struct Catalog {
    reader: Arc<RecordReader>,
    setup: Setup,
    add: Add,
    show: Show,
    delete: Delete,
    update: Update,
    verify: Verify,
}

impl Catalog {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        config: Arc<Config>,
    ) -> Self {
        let reader = Arc::new(RecordReader::new(Arc::clone(&metadata), Arc::clone(&config)));
        Self {
            setup: Setup::new(Arc::clone(&metadata), Arc::clone(&config)),
            add: Add::new(Arc::clone(&metadata), Arc::clone(&reader), Arc::clone(&config)),
            show: Show::new(Arc::clone(&reader)),
            delete: Delete::new(
                Arc::clone(&metadata),
                Arc::clone(&blobs),
                Arc::clone(&reader),
                Arc::clone(&config),
            ),
            update: Update::new(Arc::clone(&metadata), Arc::clone(&reader), Arc::clone(&config)),
            verify: Verify::new(metadata, blobs, Arc::clone(&reader), config),
            reader,
        }
    }

    pub fn reader(&self) -> &Arc<RecordReader> {
        &self.reader
    }

    pub async fn create_domain(&self, name: &ArtifactName) -> Result<(), CatalogError> {
        self.setup.create_domain(name).await
    }

    pub async fn domain_exists(&self, name: &ArtifactName) -> Result<bool, CatalogError> {
        self.setup.domain_exists(name).await
    }

    pub async fn add(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
        region_urls: BTreeMap<Region, BlobAddress>,
        attributes: Attributes,
    ) -> Result<ArtifactRecord, CatalogError> {
        self.add.add(name, id, region_urls, attributes).await
    }

    pub async fn show(&self, name: &ArtifactName) -> Result<Vec<ArtifactRecord>, CatalogError> {
        self.show.show(name).await
    }

    pub async fn show_one(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
    ) -> Result<ArtifactRecord, CatalogError> {
        self.show.show_one(name, id).await
    }

    pub async fn latest(&self, name: &ArtifactName) -> Result<Option<ArtifactRecord>, CatalogError> {
        self.show.latest(name).await
    }

    pub async fn delete(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
    ) -> Result<DeleteOutcome, CatalogError> {
        self.delete.delete(name, id).await
    }

    pub async fn update(
        &self,
        name: &ArtifactName,
        id: &ArtifactId,
        attribute: &str,
        value: &str,
    ) -> Result<ArtifactRecord, CatalogError> {
        self.update.update(name, id, attribute, value).await
    }

    pub async fn verify(
        &self,
        name: &ArtifactName,
        options: &VerifyOptions,
    ) -> Result<VerifyReport, CatalogError> {
        self.verify.verify(name, options).await
    }

    pub async fn verify_all(&self, options: &VerifyOptions) -> Result<VerifyReport, CatalogError> {
        self.verify.verify_all(options).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use bytes::Bytes;

    use super::Catalog;
    use crate::config::Config;
    use crate::domain::{ArtifactId, ArtifactName, BlobAddress, Region};
    use crate::impls::{InMemoryBlobStore, InMemoryMetadataStore};
    use crate::ports::BlobStore;

    /// Catalog over in-memory stores with the domain for `app` created.
    pub(crate) struct Fixture {
        pub name: ArtifactName,
        pub config: Arc<Config>,
        pub metadata: Arc<InMemoryMetadataStore>,
        pub blobs: Arc<InMemoryBlobStore>,
        pub catalog: Catalog,
    }

    impl Fixture {
        pub async fn new() -> Self {
            let fx = Self::without_domain();
            fx.catalog.create_domain(&fx.name).await.unwrap();
            fx
        }

        pub fn without_domain() -> Self {
            let config = Arc::new(Config::default());
            let metadata = Arc::new(InMemoryMetadataStore::new());
            let blobs = Arc::new(InMemoryBlobStore::new());
            let catalog = Catalog::new(metadata.clone(), blobs.clone(), config.clone());
            Self {
                name: ArtifactName::parse("app").unwrap(),
                config,
                metadata,
                blobs,
                catalog,
            }
        }

        pub fn id(&self, raw: &str) -> ArtifactId {
            ArtifactId::parse(raw).unwrap()
        }

        pub fn region(&self, raw: &str) -> Region {
            Region::parse(raw).unwrap()
        }

        pub fn bucket(&self, region: &str) -> String {
            self.config.layout.bucket(&self.region(region))
        }

        /// Conventional addresses of `id` in `regions`, without writing blobs.
        pub fn urls(&self, id: &ArtifactId, regions: &[&str]) -> BTreeMap<Region, BlobAddress> {
            regions
                .iter()
                .map(|r| {
                    let region = self.region(r);
                    let address = self.config.layout.address(&region, &self.name, id);
                    (region, address)
                })
                .collect()
        }

        /// Write a blob for `id` into each region and return the addresses.
        pub async fn seed(&self, id: &ArtifactId, regions: &[&str]) -> BTreeMap<Region, BlobAddress> {
            let urls = self.urls(id, regions);
            for (region, address) in &urls {
                self.blobs
                    .put(region, address, Bytes::from_static(b"payload"))
                    .await
                    .unwrap();
            }
            urls
        }
    }
}
