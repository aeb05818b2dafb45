//! InMemoryBlobStore - 開発・テスト用の Blob ストア
//!
//! region ごとの障害注入ができます（put だけ失敗させる、など）。

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use crate::domain::{BlobAddress, Region};
use crate::ports::{BlobStore, StoreError};

/// Operation kinds that can be failed per region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOp {
    Put,
    Get,
    Exists,
    Delete,
    List,
}

impl BlobOp {
    pub const ALL: [BlobOp; 5] = [
        BlobOp::Put,
        BlobOp::Get,
        BlobOp::Exists,
        BlobOp::Delete,
        BlobOp::List,
    ];
}

type ObjectKey = (Region, String, String);

pub struct InMemoryBlobStore {
    objects: Mutex<BTreeMap<ObjectKey, Bytes>>,
    faults: Mutex<HashMap<Region, HashSet<BlobOp>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            faults: Mutex::new(HashMap::new()),
        }
    }

    /// Make `op` fail with `Unavailable` in `region` until healed.
    pub async fn fail(&self, region: &Region, op: BlobOp) {
        self.faults
            .lock()
            .await
            .entry(region.clone())
            .or_default()
            .insert(op);
    }

    /// Take `region` fully offline.
    pub async fn fail_region(&self, region: &Region) {
        for op in BlobOp::ALL {
            self.fail(region, op).await;
        }
    }

    pub async fn heal(&self, region: &Region) {
        self.faults.lock().await.remove(region);
    }

    /// Drop an object behind the catalog's back (simulated data loss).
    pub async fn lose(&self, region: &Region, address: &BlobAddress) -> bool {
        self.objects
            .lock()
            .await
            .remove(&Self::object_key(region, address))
            .is_some()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }

    fn object_key(region: &Region, address: &BlobAddress) -> ObjectKey {
        (region.clone(), address.bucket.clone(), address.key.clone())
    }

    async fn check(&self, region: &Region, op: BlobOp) -> Result<(), StoreError> {
        let faults = self.faults.lock().await;
        if faults.get(region).is_some_and(|ops| ops.contains(&op)) {
            return Err(StoreError::Unavailable(format!(
                "{region} rejected {op:?} (injected fault)"
            )));
        }
        Ok(())
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(
        &self,
        region: &Region,
        address: &BlobAddress,
        payload: Bytes,
    ) -> Result<(), StoreError> {
        self.check(region, BlobOp::Put).await?;
        self.objects
            .lock()
            .await
            .insert(Self::object_key(region, address), payload);
        Ok(())
    }

    async fn get(&self, region: &Region, address: &BlobAddress) -> Result<Bytes, StoreError> {
        self.check(region, BlobOp::Get).await?;
        self.objects
            .lock()
            .await
            .get(&Self::object_key(region, address))
            .cloned()
            .ok_or_else(|| StoreError::ObjectNotFound(address.to_string()))
    }

    async fn exists(&self, region: &Region, address: &BlobAddress) -> Result<bool, StoreError> {
        self.check(region, BlobOp::Exists).await?;
        Ok(self
            .objects
            .lock()
            .await
            .contains_key(&Self::object_key(region, address)))
    }

    async fn delete(&self, region: &Region, address: &BlobAddress) -> Result<(), StoreError> {
        self.check(region, BlobOp::Delete).await?;
        self.objects
            .lock()
            .await
            .remove(&Self::object_key(region, address));
        Ok(())
    }

    async fn list(
        &self,
        region: &Region,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<String>, StoreError> {
        self.check(region, BlobOp::List).await?;
        let objects = self.objects.lock().await;
        Ok(objects
            .keys()
            .filter(|(r, b, k)| r == region && b == bucket && k.starts_with(prefix))
            .map(|(_, _, k)| k.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(r: &str) -> Region {
        Region::parse(r).unwrap()
    }

    #[tokio::test]
    async fn regions_are_isolated() {
        let store = InMemoryBlobStore::new();
        let addr = BlobAddress::new("bkt", "app/v1");
        store
            .put(&region("r1"), &addr, Bytes::from_static(b"abc"))
            .await
            .unwrap();

        assert!(store.exists(&region("r1"), &addr).await.unwrap());
        assert!(!store.exists(&region("r2"), &addr).await.unwrap());
        assert!(matches!(
            store.get(&region("r2"), &addr).await,
            Err(StoreError::ObjectNotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryBlobStore::new();
        let addr = BlobAddress::new("bkt", "app/v1");
        store.delete(&region("r1"), &addr).await.unwrap();
        store.delete(&region("r1"), &addr).await.unwrap();
    }

    #[tokio::test]
    async fn faults_are_per_op_and_region() {
        let store = InMemoryBlobStore::new();
        let addr = BlobAddress::new("bkt", "app/v1");
        store.fail(&region("r1"), BlobOp::Put).await;

        assert!(store.put(&region("r1"), &addr, Bytes::new()).await.is_err());
        assert!(store.put(&region("r2"), &addr, Bytes::new()).await.is_ok());
        assert!(store.exists(&region("r1"), &addr).await.is_ok());

        store.heal(&region("r1")).await;
        assert!(store.put(&region("r1"), &addr, Bytes::new()).await.is_ok());
    }

    #[tokio::test]
    async fn list_filters_by_bucket_and_prefix() {
        let store = InMemoryBlobStore::new();
        let r = region("r1");
        for (bucket, key) in [("b", "app/v1"), ("b", "app/v2"), ("b", "other/v1"), ("c", "app/v3")] {
            store
                .put(&r, &BlobAddress::new(bucket, key), Bytes::new())
                .await
                .unwrap();
        }
        assert_eq!(
            store.list(&r, "b", "app/").await.unwrap(),
            vec!["app/v1".to_string(), "app/v2".to_string()]
        );
    }
}
