//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryMetadataStore / InMemoryBlobStore**: テスト用（障害注入・結果整合の遅延つき）
//! - **LocalMetadataStore / LocalBlobStore**: ファイルシステム上の実装（CLI 既定）
//! - **WithTimeout**: 呼び出しごとのタイムアウト

pub mod inmem_metadata;
pub mod inmem_blob;
pub mod local_metadata;
pub mod local_blob;
pub mod timeout;

pub use self::inmem_metadata::InMemoryMetadataStore;
pub use self::inmem_blob::{BlobOp, InMemoryBlobStore};
pub use self::local_metadata::LocalMetadataStore;
pub use self::local_blob::LocalBlobStore;
pub use self::timeout::WithTimeout;
