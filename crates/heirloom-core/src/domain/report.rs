//! Verify report: placement claims cross-checked against blob stores.

use serde::Serialize;

use super::address::BlobAddress;
use super::ids::{ArtifactId, ArtifactName, Region};

/// Classification of one (record, region) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Consistency {
    /// Metadata claims the region and the blob exists.
    Consistent,
    /// Metadata claims the region but no blob exists (data loss or lost write).
    MissingBlob,
    /// A blob exists with no matching metadata claim (leaked upload).
    OrphanBlob,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub name: ArtifactName,
    pub id: ArtifactId,
    pub region: Region,
    pub address: BlobAddress,
    pub status: Consistency,
}

/// What verify looks at beyond the claimed regions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifyOptions {
    /// Regions checked for unclaimed blobs at the conventional address.
    pub regions: Vec<Region>,
    /// List each region's bucket under `<name>/` to find blobs of ids with no record.
    pub scan_orphans: bool,
}

/// Findings in a stable order: name, id, region.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VerifyReport {
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    pub fn from_findings(mut findings: Vec<Finding>) -> Self {
        findings.sort_by(|a, b| {
            (&a.name, &a.id, &a.region, a.status).cmp(&(&b.name, &b.id, &b.region, b.status))
        });
        findings.dedup();
        Self { findings }
    }

    pub fn merge(mut self, other: VerifyReport) -> Self {
        self.findings.extend(other.findings);
        Self::from_findings(self.findings)
    }

    pub fn is_consistent(&self) -> bool {
        self.findings
            .iter()
            .all(|f| f.status == Consistency::Consistent)
    }

    pub fn count(&self, status: Consistency) -> usize {
        self.findings.iter().filter(|f| f.status == status).count()
    }

    pub fn with_status(&self, status: Consistency) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.status == status)
    }
}
