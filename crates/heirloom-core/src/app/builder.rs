//! ArchiveBuilder - Archive の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: ストアが揃っていなければ build() で失敗
//! - 共有クライアントはここで 1 度だけ作り、各コンポーネントへ明示的に渡す

use std::sync::Arc;

use super::archive::Archive;
use crate::config::Config;
use crate::impls::{LocalBlobStore, LocalMetadataStore, WithTimeout};
use crate::ports::{BlobStore, Clock, IdGenerator, MetadataStore, SystemClock, UlidGenerator};

/// ArchiveBuilder は Archive を構築
///
/// # 使用例
/// ```ignore
/// let archive = ArchiveBuilder::new(config)
///     .local_backends()
///     .build()?;
/// ```
pub struct ArchiveBuilder {
    config: Config,
    metadata: Option<Arc<dyn MetadataStore>>,
    blobs: Option<Arc<dyn BlobStore>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

/// BuildError は Archive 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No metadata store configured. Call metadata_store() or local_backends().")]
    MissingMetadataStore,

    #[error("No blob store configured. Call blob_store() or local_backends().")]
    MissingBlobStore,
}

impl ArchiveBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            metadata: None,
            blobs: None,
            clock: None,
            ids: None,
        }
    }

    pub fn metadata_store(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.metadata = Some(store);
        self
    }

    pub fn blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(store);
        self
    }

    /// Filesystem stores under `config.storage_root`, each call bounded by
    /// `config.backend_timeout`.
    pub fn local_backends(self) -> Self {
        let root = self.config.storage_root.clone();
        let limit = self.config.backend_timeout;
        tracing::debug!(root = %root.display(), ?limit, "using local backends");
        self.metadata_store(Arc::new(WithTimeout::new(
            LocalMetadataStore::new(root.join("metadata")),
            limit,
        )))
        .blob_store(Arc::new(WithTimeout::new(
            LocalBlobStore::new(root.join("blobs")),
            limit,
        )))
    }

    /// Defaults to the system clock.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Defaults to ULIDs over the configured clock.
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    pub fn build(self) -> Result<Archive, BuildError> {
        let metadata = self.metadata.ok_or(BuildError::MissingMetadataStore)?;
        let blobs = self.blobs.ok_or(BuildError::MissingBlobStore)?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));

        Ok(Archive::new(Arc::new(self.config), metadata, blobs, ids, clock))
    }
}
