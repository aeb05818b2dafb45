//! BlobStore port - region ごとの Blob ストレージ（S3 / Local / InMemory）
//!
//! payload は不透明なバイト列。内容を解釈・変換しません。

use async_trait::async_trait;
use bytes::Bytes;

use super::StoreError;
use crate::domain::{BlobAddress, Region};

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `payload` at `address`, overwriting whatever is there.
    async fn put(
        &self,
        region: &Region,
        address: &BlobAddress,
        payload: Bytes,
    ) -> Result<(), StoreError>;

    /// Fails with `ObjectNotFound` when nothing is stored at `address`.
    async fn get(&self, region: &Region, address: &BlobAddress) -> Result<Bytes, StoreError>;

    async fn exists(&self, region: &Region, address: &BlobAddress) -> Result<bool, StoreError>;

    /// Removing an absent object succeeds, which keeps delete retries safe.
    async fn delete(&self, region: &Region, address: &BlobAddress) -> Result<(), StoreError>;

    /// Keys in `bucket` starting with `prefix`, sorted.
    async fn list(
        &self,
        region: &Region,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<String>, StoreError>;
}
