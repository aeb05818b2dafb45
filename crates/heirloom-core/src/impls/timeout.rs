//! WithTimeout - per-call timeout decorator for both store ports.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{BlobAddress, Region};
use crate::ports::{BlobStore, Item, MetadataStore, StoreError};

/// Wraps a store so every call fails with `StoreError::Timeout` after `limit`.
pub struct WithTimeout<S> {
    inner: S,
    limit: Duration,
}

impl<S> WithTimeout<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.limit)),
        }
    }
}

#[async_trait]
impl<S: BlobStore> BlobStore for WithTimeout<S> {
    async fn put(
        &self,
        region: &Region,
        address: &BlobAddress,
        payload: Bytes,
    ) -> Result<(), StoreError> {
        self.bounded(self.inner.put(region, address, payload)).await
    }

    async fn get(&self, region: &Region, address: &BlobAddress) -> Result<Bytes, StoreError> {
        self.bounded(self.inner.get(region, address)).await
    }

    async fn exists(&self, region: &Region, address: &BlobAddress) -> Result<bool, StoreError> {
        self.bounded(self.inner.exists(region, address)).await
    }

    async fn delete(&self, region: &Region, address: &BlobAddress) -> Result<(), StoreError> {
        self.bounded(self.inner.delete(region, address)).await
    }

    async fn list(
        &self,
        region: &Region,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<String>, StoreError> {
        self.bounded(self.inner.list(region, bucket, prefix)).await
    }
}

#[async_trait]
impl<S: MetadataStore> MetadataStore for WithTimeout<S> {
    async fn create_domain(&self, domain: &str) -> Result<(), StoreError> {
        self.bounded(self.inner.create_domain(domain)).await
    }

    async fn domain_exists(&self, domain: &str) -> Result<bool, StoreError> {
        self.bounded(self.inner.domain_exists(domain)).await
    }

    async fn list_domains(&self) -> Result<Vec<String>, StoreError> {
        self.bounded(self.inner.list_domains()).await
    }

    async fn put_attributes(
        &self,
        domain: &str,
        item: &str,
        attributes: &Item,
    ) -> Result<(), StoreError> {
        self.bounded(self.inner.put_attributes(domain, item, attributes))
            .await
    }

    async fn get_item(&self, domain: &str, item: &str) -> Result<Option<Item>, StoreError> {
        self.bounded(self.inner.get_item(domain, item)).await
    }

    async fn select(&self, domain: &str) -> Result<Vec<(String, Item)>, StoreError> {
        self.bounded(self.inner.select(domain)).await
    }

    async fn delete_item(&self, domain: &str, item: &str) -> Result<(), StoreError> {
        self.bounded(self.inner.delete_item(domain, item)).await
    }
}
