//! heirloom-core
//!
//! Multi-region artifact catalog: replicate immutable payloads into regional
//! blob stores and track their placement in a shared metadata store.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（labels, BlobAddress, ArtifactRecord, outcomes, errors）
//! - **ports**: 抽象化レイヤー（MetadataStore, BlobStore, Clock, IdGenerator）
//! - **impls**: ports の実装（InMemory / Local filesystem / timeout decorator）
//! - **catalog**: メタデータ操作（setup, add, show, delete, update, verify）
//! - **app**: オーケストレーション（Archive, ArtifactDownloader, ArchiveBuilder）
//! - **config**: 不変の設定値と YAML プロファイルの読み込み

pub mod domain;
pub mod ports;
pub mod impls;
pub mod catalog;
pub mod app;
pub mod config;

mod fanout;

pub use self::app::{Archive, ArchiveBuilder, ArtifactDownloader};
pub use self::catalog::Catalog;
pub use self::config::Config;
pub use self::domain::{
    ArtifactId, ArtifactName, ArtifactRecord, BlobAddress, CatalogError, Region,
};
