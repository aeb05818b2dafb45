//! Aggregated outcomes of multi-region operations.
//!
//! Per-region failures are captured here instead of being raised, so the
//! caller can always tell a full success from a partial one.

use serde::Serialize;
use std::path::PathBuf;

use super::address::BlobAddress;
use super::ids::{ArtifactId, ArtifactName, Region};
use crate::ports::StoreError;

/// A region whose upload or delete did not succeed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionFailure {
    pub region: Region,
    pub cause: StoreError,
}

/// Result of a committed registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterOutcome {
    pub name: ArtifactName,
    pub id: ArtifactId,
    pub succeeded_regions: Vec<Region>,
    pub failed_regions: Vec<RegionFailure>,
}

impl RegisterOutcome {
    /// At least one requested region is missing from the committed record.
    pub fn is_partial(&self) -> bool {
        !self.failed_regions.is_empty()
    }
}

/// Result of a complete delete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteOutcome {
    pub name: ArtifactName,
    pub id: ArtifactId,
    pub removed_regions: Vec<Region>,
}

/// Result of a download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadOutcome {
    pub region: Region,
    pub address: BlobAddress,
    pub destination: PathBuf,
    pub bytes_written: usize,
}
