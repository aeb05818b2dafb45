//! App layer - ports と catalog を組み合わせたオーケストレーション
//!
//! # 主要コンポーネント
//! - **Archive**: 複数 region への並行複製 + metadata commit
//! - **ArtifactDownloader**: name + id + region から payload を取り出す
//! - **ArchiveBuilder**: 起動時検証つきのワイヤリング

pub mod archive;
pub mod builder;
pub mod downloader;

pub use self::archive::Archive;
pub use self::builder::{ArchiveBuilder, BuildError};
pub use self::downloader::ArtifactDownloader;
