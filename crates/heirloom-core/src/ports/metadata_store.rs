//! MetadataStore port - key/attribute store (SimpleDB-like)
//!
//! Domain ごとに item（名前 + 属性マップ）を保持します。
//!
//! # 結果整合性
//! 書き込みは直後の読み込みに見えないことがあります。
//! 呼び出し側はこの遅延を隠さず、そのまま扱います。

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::StoreError;

/// Attributes of one item.
pub type Item = BTreeMap<String, String>;

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Create `domain`. Creating an existing domain is a no-op.
    async fn create_domain(&self, domain: &str) -> Result<(), StoreError>;

    async fn domain_exists(&self, domain: &str) -> Result<bool, StoreError>;

    async fn list_domains(&self) -> Result<Vec<String>, StoreError>;

    /// Write `attributes` onto `item`, replacing same-named attributes and
    /// keeping the others. Creates the item when absent.
    ///
    /// Fails with `NoSuchDomain` when the domain was never created.
    async fn put_attributes(
        &self,
        domain: &str,
        item: &str,
        attributes: &Item,
    ) -> Result<(), StoreError>;

    /// `Ok(None)` when the item is absent (or not yet visible).
    async fn get_item(&self, domain: &str, item: &str) -> Result<Option<Item>, StoreError>;

    /// Every visible item in `domain`, in unspecified order.
    async fn select(&self, domain: &str) -> Result<Vec<(String, Item)>, StoreError>;

    /// Deleting an absent item is not an error.
    async fn delete_item(&self, domain: &str, item: &str) -> Result<(), StoreError>;
}
