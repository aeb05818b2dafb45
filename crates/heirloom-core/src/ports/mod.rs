//! Ports - 抽象化レイヤー
//!
//! 外部システム（メタデータストア、リージョンごとの Blob ストア）への
//! インターフェースを trait として定義し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - メタデータストアが配置情報の正本（source of truth）。ただし結果整合
//! - Blob ストアは payload 本体の保存先（region ごとに独立）
//! - リトライ方針はクライアント層の責務。catalog ロジックはリトライしない

pub mod metadata_store;
pub mod blob_store;
pub mod clock;
pub mod id_generator;

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

// 主要な trait を再エクスポート
pub use self::metadata_store::{Item, MetadataStore};
pub use self::blob_store::BlobStore;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};

/// Transport-level failure reported by either store.
///
/// Cloneable so per-region failures can be collected into aggregate outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StoreError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("no such domain: {0}")]
    NoSuchDomain(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}
