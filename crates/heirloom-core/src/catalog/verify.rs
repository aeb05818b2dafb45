//! Verify - 配置情報と Blob ストアの実態を突き合わせる（読み取り専用）
//!
//! - 主張されている region: Blob があるか（なければ MissingBlob）
//! - 主張されていない region: 規約上のアドレスに Blob がないか（あれば OrphanBlob）
//! - オプションで bucket を一覧し、record が存在しない id の Blob も OrphanBlob として報告
//!
//! 修復はしません。どう直すかは運用者の判断です。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::reader::RecordReader;
use crate::config::Config;
use crate::domain::{
    ArtifactId, ArtifactName, ArtifactRecord, BlobAddress, CatalogError, Consistency, Finding,
    Region, VerifyOptions, VerifyReport,
};
use crate::ports::{BlobStore, MetadataStore};

pub struct Verify {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    reader: Arc<RecordReader>,
    config: Arc<Config>,
}

impl Verify {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        reader: Arc<RecordReader>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            metadata,
            blobs,
            reader,
            config,
        }
    }

    pub async fn verify(
        &self,
        name: &ArtifactName,
        options: &VerifyOptions,
    ) -> Result<VerifyReport, CatalogError> {
        let records = self.reader.fetch_all(name).await?;
        let mut findings = Vec::new();

        for record in &records {
            self.check_record(record, options, &mut findings).await?;
        }
        if options.scan_orphans {
            self.scan_unrecorded(name, &records, options, &mut findings)
                .await?;
        }

        let report = VerifyReport::from_findings(findings);
        tracing::info!(
            %name,
            records = records.len(),
            consistent = report.count(Consistency::Consistent),
            missing = report.count(Consistency::MissingBlob),
            orphaned = report.count(Consistency::OrphanBlob),
            "verified catalog"
        );
        Ok(report)
    }

    /// Verify every name that has a catalog domain.
    pub async fn verify_all(&self, options: &VerifyOptions) -> Result<VerifyReport, CatalogError> {
        let domains = self
            .metadata
            .list_domains()
            .await
            .map_err(CatalogError::MetadataUnavailable)?;

        let mut report = VerifyReport::default();
        for name in domains
            .iter()
            .filter_map(|d| self.config.layout.name_of_domain(d))
        {
            report = report.merge(self.verify(&name, options).await?);
        }
        Ok(report)
    }

    async fn exists(&self, region: &Region, address: &BlobAddress) -> Result<bool, CatalogError> {
        self.blobs
            .exists(region, address)
            .await
            .map_err(|source| CatalogError::BlobUnavailable {
                region: region.clone(),
                bucket: address.bucket.clone(),
                key: address.key.clone(),
                source,
            })
    }

    async fn check_record(
        &self,
        record: &ArtifactRecord,
        options: &VerifyOptions,
        findings: &mut Vec<Finding>,
    ) -> Result<(), CatalogError> {
        for (region, address) in &record.region_urls {
            let status = if self.exists(region, address).await? {
                Consistency::Consistent
            } else {
                tracing::warn!(
                    name = %record.name,
                    id = %record.id,
                    %region,
                    %address,
                    "metadata claims a blob that does not exist"
                );
                Consistency::MissingBlob
            };
            findings.push(finding(record.name.clone(), record.id.clone(), region, address, status));
        }

        for region in options
            .regions
            .iter()
            .filter(|r| !record.region_urls.contains_key(*r))
        {
            let address = self.config.layout.address(region, &record.name, &record.id);
            if self.exists(region, &address).await? {
                tracing::warn!(
                    name = %record.name,
                    id = %record.id,
                    %region,
                    %address,
                    "blob exists without a metadata claim"
                );
                findings.push(finding(
                    record.name.clone(),
                    record.id.clone(),
                    region,
                    &address,
                    Consistency::OrphanBlob,
                ));
            }
        }
        Ok(())
    }

    async fn scan_unrecorded(
        &self,
        name: &ArtifactName,
        records: &[ArtifactRecord],
        options: &VerifyOptions,
        findings: &mut Vec<Finding>,
    ) -> Result<(), CatalogError> {
        let layout = &self.config.layout;
        let known: HashMap<&ArtifactId, &ArtifactRecord> =
            records.iter().map(|r| (&r.id, r)).collect();
        let regions: BTreeSet<&Region> = options
            .regions
            .iter()
            .chain(records.iter().flat_map(|r| r.regions()))
            .collect();

        for region in regions {
            let bucket = layout.bucket(region);
            let keys = self
                .blobs
                .list(region, &bucket, &layout.key_prefix(name))
                .await
                .map_err(|source| CatalogError::BlobUnavailable {
                    region: region.clone(),
                    bucket: bucket.clone(),
                    key: layout.key_prefix(name),
                    source,
                })?;

            for key in keys {
                let Some(id) = layout.id_of_key(name, &key) else {
                    tracing::debug!(%region, %bucket, %key, "skipping key outside the naming convention");
                    continue;
                };
                // record があっても、この region を主張していなければ orphan
                let claimed = known
                    .get(&id)
                    .is_some_and(|record| record.region_urls.contains_key(region));
                if claimed {
                    continue;
                }
                let address = BlobAddress::new(bucket.clone(), key);
                tracing::warn!(%name, %id, %region, %address, "blob has no claim in the catalog");
                findings.push(finding(
                    name.clone(),
                    id,
                    region,
                    &address,
                    Consistency::OrphanBlob,
                ));
            }
        }
        Ok(())
    }
}

fn finding(
    name: ArtifactName,
    id: ArtifactId,
    region: &Region,
    address: &BlobAddress,
    status: Consistency,
) -> Finding {
    Finding {
        name,
        id,
        region: region.clone(),
        address: address.clone(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::catalog::testing::Fixture;
    use crate::domain::{Attributes, CatalogError, Consistency, VerifyOptions};
    use crate::impls::BlobOp;
    use crate::ports::BlobStore;

    fn scan(fx: &Fixture, regions: &[&str]) -> VerifyOptions {
        VerifyOptions {
            regions: regions.iter().map(|r| fx.region(r)).collect(),
            scan_orphans: true,
        }
    }

    #[tokio::test]
    async fn consistent_catalog_is_reported_consistent_and_stable() {
        let fx = Fixture::new().await;
        for id in ["v1", "v2"] {
            let urls = fx.seed(&fx.id(id), &["r1", "r2"]).await;
            fx.catalog
                .add(&fx.name, &fx.id(id), urls, Attributes::new())
                .await
                .unwrap();
        }

        let options = scan(&fx, &["r1", "r2"]);
        let first = fx.catalog.verify(&fx.name, &options).await.unwrap();
        let second = fx.catalog.verify(&fx.name, &options).await.unwrap();

        assert!(first.is_consistent());
        assert_eq!(first.count(Consistency::Consistent), 4);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn lost_blob_is_missing() {
        let fx = Fixture::new().await;
        let id = fx.id("v1");
        let urls = fx.seed(&id, &["r1", "r2"]).await;
        fx.catalog
            .add(&fx.name, &id, urls.clone(), Attributes::new())
            .await
            .unwrap();

        let r2 = fx.region("r2");
        assert!(fx.blobs.lose(&r2, &urls[&r2]).await);

        let report = fx
            .catalog
            .verify(&fx.name, &VerifyOptions::default())
            .await
            .unwrap();
        let missing: Vec<_> = report.with_status(Consistency::MissingBlob).collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].region, r2);
        assert_eq!(report.count(Consistency::Consistent), 1);
    }

    #[tokio::test]
    async fn unclaimed_region_with_blob_is_orphan() {
        let fx = Fixture::new().await;
        let id = fx.id("v1");
        let urls = fx.seed(&id, &["r1"]).await;
        fx.catalog
            .add(&fx.name, &id, urls, Attributes::new())
            .await
            .unwrap();
        // r2 にも Blob はあるが record には載っていない
        fx.seed(&id, &["r2"]).await;

        let options = VerifyOptions {
            regions: vec![fx.region("r1"), fx.region("r2")],
            scan_orphans: false,
        };
        let report = fx.catalog.verify(&fx.name, &options).await.unwrap();
        let orphans: Vec<_> = report.with_status(Consistency::OrphanBlob).collect();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].region, fx.region("r2"));
    }

    #[tokio::test]
    async fn blobs_without_any_record_are_found_by_the_scan() {
        let fx = Fixture::new().await;
        // metadata commit に失敗した upload の残骸
        fx.seed(&fx.id("leaked"), &["r1", "r2"]).await;
        // 規約外のキーは無視される
        fx.blobs
            .put(
                &fx.region("r1"),
                &crate::domain::BlobAddress::new(fx.bucket("r1"), "app/a/b"),
                Bytes::new(),
            )
            .await
            .unwrap();

        let report = fx
            .catalog
            .verify(&fx.name, &scan(&fx, &["r1", "r2"]))
            .await
            .unwrap();
        assert_eq!(report.count(Consistency::OrphanBlob), 2);
        assert!(report.findings.iter().all(|f| f.id == fx.id("leaked")));

        let without_scan = fx
            .catalog
            .verify(&fx.name, &VerifyOptions::default())
            .await
            .unwrap();
        assert!(without_scan.findings.is_empty());
    }

    #[tokio::test]
    async fn scan_reports_blob_of_known_id_in_unclaimed_region() {
        let fx = Fixture::new().await;
        let v1 = fx.id("v1");
        let v2 = fx.id("v2");
        let urls = fx.seed(&v1, &["r1"]).await;
        fx.catalog
            .add(&fx.name, &v1, urls, Attributes::new())
            .await
            .unwrap();
        let urls = fx.seed(&v2, &["r1", "r2"]).await;
        fx.catalog
            .add(&fx.name, &v2, urls, Attributes::new())
            .await
            .unwrap();
        // v1 の残骸が r2 にある（record は r1 しか主張していない）
        fx.seed(&v1, &["r2"]).await;

        // 未主張 region の明示的な指定なし。bucket 一覧だけで見つかる
        let report = fx.catalog.verify(&fx.name, &scan(&fx, &[])).await.unwrap();
        let orphans: Vec<_> = report.with_status(Consistency::OrphanBlob).collect();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].id, v1);
        assert_eq!(orphans[0].region, fx.region("r2"));
        assert_eq!(report.count(Consistency::Consistent), 3);

        // region ごとの確認とバケット一覧の両方で見つかっても 1 件にまとまる
        let both = fx
            .catalog
            .verify(&fx.name, &scan(&fx, &["r1", "r2"]))
            .await
            .unwrap();
        assert_eq!(both.count(Consistency::OrphanBlob), 1);
    }

    #[tokio::test]
    async fn verify_never_mutates() {
        let fx = Fixture::new().await;
        let id = fx.id("v1");
        let urls = fx.seed(&id, &["r1"]).await;
        fx.catalog
            .add(&fx.name, &id, urls, Attributes::new())
            .await
            .unwrap();
        fx.seed(&fx.id("leaked"), &["r1"]).await;

        let before = fx.blobs.object_count().await;
        fx.catalog
            .verify(&fx.name, &scan(&fx, &["r1", "r2"]))
            .await
            .unwrap();
        assert_eq!(fx.blobs.object_count().await, before);
        assert_eq!(fx.catalog.show(&fx.name).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn verify_all_covers_every_domain() {
        let fx = Fixture::new().await;
        let other = crate::domain::ArtifactName::parse("other").unwrap();
        fx.catalog.create_domain(&other).await.unwrap();

        let id = fx.id("v1");
        let urls = fx.seed(&id, &["r1"]).await;
        fx.catalog
            .add(&fx.name, &id, urls.clone(), Attributes::new())
            .await
            .unwrap();
        fx.catalog
            .add(&other, &id, urls, Attributes::new())
            .await
            .unwrap();

        let report = fx.catalog.verify_all(&VerifyOptions::default()).await.unwrap();
        assert_eq!(report.findings.len(), 2);
        assert!(report.is_consistent());
    }

    #[tokio::test]
    async fn unreachable_region_fails_verify() {
        let fx = Fixture::new().await;
        let id = fx.id("v1");
        let urls = fx.seed(&id, &["r1"]).await;
        fx.catalog
            .add(&fx.name, &id, urls, Attributes::new())
            .await
            .unwrap();
        fx.blobs.fail(&fx.region("r1"), BlobOp::Exists).await;

        let err = fx
            .catalog
            .verify(&fx.name, &VerifyOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::BlobUnavailable { .. }));
    }
}
