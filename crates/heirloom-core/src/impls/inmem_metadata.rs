//! InMemoryMetadataStore - 開発・テスト用のメタデータストア
//!
//! # 学習ポイント
//! - 結果整合性のシミュレーション（書き込みの可視化遅延）
//! - 障害注入（unavailable / 書き込み拒否）

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::ports::{Item, MetadataStore, StoreError};

/// One item's write history.
///
/// Each entry becomes visible at its instant; `None` is a delete.
#[derive(Debug, Default)]
struct ItemVersions {
    versions: Vec<(Instant, Option<Item>)>,
}

impl ItemVersions {
    fn visible(&self, now: Instant) -> Option<&Item> {
        self.versions
            .iter()
            .rev()
            .find(|(at, _)| *at <= now)
            .and_then(|(_, item)| item.as_ref())
    }

    /// Latest written state, visible or not.
    fn latest(&self) -> Option<&Item> {
        self.versions.last().and_then(|(_, item)| item.as_ref())
    }

    fn push(&mut self, at: Instant, item: Option<Item>, now: Instant) {
        // 見えている最新版より古い履歴は不要
        if let Some(pos) = self.versions.iter().rposition(|(t, _)| *t <= now) {
            self.versions.drain(..pos);
        }
        self.versions.push((at, item));
    }
}

type Domain = BTreeMap<String, ItemVersions>;

/// InMemoryMetadataStore は開発用のメタデータストア
///
/// # 使用例
/// ```ignore
/// let store = InMemoryMetadataStore::new().with_write_lag(Duration::from_millis(50));
/// store.create_domain("heirloom_app").await?;
/// ```
pub struct InMemoryMetadataStore {
    domains: Mutex<BTreeMap<String, Domain>>,
    write_lag: Duration,
    unavailable: AtomicBool,
    reject_writes: AtomicBool,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self {
            domains: Mutex::new(BTreeMap::new()),
            write_lag: Duration::ZERO,
            unavailable: AtomicBool::new(false),
            reject_writes: AtomicBool::new(false),
        }
    }

    /// Writes and deletes become visible to reads only after `lag`.
    pub fn with_write_lag(mut self, lag: Duration) -> Self {
        self.write_lag = lag;
        self
    }

    /// Every call fails with `Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Item writes and deletes fail with `Unavailable` while set; reads still work.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("metadata store offline".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        self.check_available()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("metadata writes rejected".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn create_domain(&self, domain: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut domains = self.domains.lock().await;
        domains.entry(domain.to_string()).or_default();
        Ok(())
    }

    async fn domain_exists(&self, domain: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.domains.lock().await.contains_key(domain))
    }

    async fn list_domains(&self) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        Ok(self.domains.lock().await.keys().cloned().collect())
    }

    async fn put_attributes(
        &self,
        domain: &str,
        item: &str,
        attributes: &Item,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut domains = self.domains.lock().await;
        let entries = domains
            .get_mut(domain)
            .ok_or_else(|| StoreError::NoSuchDomain(domain.to_string()))?;

        let versions = entries.entry(item.to_string()).or_default();
        let mut merged = versions.latest().cloned().unwrap_or_default();
        merged.extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));

        let now = Instant::now();
        versions.push(now + self.write_lag, Some(merged), now);
        Ok(())
    }

    async fn get_item(&self, domain: &str, item: &str) -> Result<Option<Item>, StoreError> {
        self.check_available()?;
        let domains = self.domains.lock().await;
        let entries = domains
            .get(domain)
            .ok_or_else(|| StoreError::NoSuchDomain(domain.to_string()))?;
        let now = Instant::now();
        Ok(entries.get(item).and_then(|v| v.visible(now)).cloned())
    }

    async fn select(&self, domain: &str) -> Result<Vec<(String, Item)>, StoreError> {
        self.check_available()?;
        let domains = self.domains.lock().await;
        let entries = domains
            .get(domain)
            .ok_or_else(|| StoreError::NoSuchDomain(domain.to_string()))?;
        let now = Instant::now();
        Ok(entries
            .iter()
            .filter_map(|(name, v)| v.visible(now).map(|item| (name.clone(), item.clone())))
            .collect())
    }

    async fn delete_item(&self, domain: &str, item: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut domains = self.domains.lock().await;
        let entries = domains
            .get_mut(domain)
            .ok_or_else(|| StoreError::NoSuchDomain(domain.to_string()))?;
        if let Some(versions) = entries.get_mut(item) {
            let now = Instant::now();
            versions.push(now + self.write_lag, None, now);
        }
        Ok(())
    }
}
