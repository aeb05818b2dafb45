//! LocalMetadataStore - ファイルシステム上のメタデータストア
//!
//! domain ごとに 1 つの JSON ドキュメント（`{root}/{domain}.json`）。
//! 書き込みは即座に見えるので、結果整合性の遅延はありません。

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::ports::{Item, MetadataStore, StoreError};

type Document = BTreeMap<String, Item>;

const EXTENSION: &str = "json";

pub struct LocalMetadataStore {
    root: PathBuf,
    // read-modify-write を直列化する
    write_lock: Mutex<()>,
}

impl LocalMetadataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn path(&self, domain: &str) -> PathBuf {
        self.root.join(format!("{domain}.{EXTENSION}"))
    }

    async fn load(&self, domain: &str) -> Result<Document, StoreError> {
        let raw = match tokio::fs::read(self.path(domain)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NoSuchDomain(domain.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw)
            .map_err(|e| StoreError::Io(format!("domain {domain} is not valid JSON: {e}")))
    }

    async fn save(&self, domain: &str, doc: &Document) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let raw = serde_json::to_vec_pretty(doc)
            .map_err(|e| StoreError::Io(format!("encode domain {domain}: {e}")))?;
        let path = self.path(domain);
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for LocalMetadataStore {
    async fn create_domain(&self, domain: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match self.load(domain).await {
            Ok(_) => Ok(()),
            Err(StoreError::NoSuchDomain(_)) => self.save(domain, &Document::new()).await,
            Err(e) => Err(e),
        }
    }

    async fn domain_exists(&self, domain: &str) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(self.path(domain)).await?)
    }

    async fn list_domains(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut domains = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION)
                && let Some(stem) = path.file_stem()
            {
                domains.push(stem.to_string_lossy().into_owned());
            }
        }
        domains.sort();
        Ok(domains)
    }

    async fn put_attributes(
        &self,
        domain: &str,
        item: &str,
        attributes: &Item,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load(domain).await?;
        let entry = doc.entry(item.to_string()).or_default();
        entry.extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.save(domain, &doc).await
    }

    async fn get_item(&self, domain: &str, item: &str) -> Result<Option<Item>, StoreError> {
        Ok(self.load(domain).await?.remove(item))
    }

    async fn select(&self, domain: &str) -> Result<Vec<(String, Item)>, StoreError> {
        Ok(self.load(domain).await?.into_iter().collect())
    }

    async fn delete_item(&self, domain: &str, item: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load(domain).await?;
        if doc.remove(item).is_some() {
            self.save(domain, &doc).await?;
        }
        Ok(())
    }
}
