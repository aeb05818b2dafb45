//! Errors - エラー型と分類
//!
//! - `ValidationError`: 入力検証（ラベル・属性）。プロセスを終了せず呼び出し元へ返す
//! - `CatalogError`: catalog / archive 操作の分類。集約後の判断だけがここに来る

use std::path::PathBuf;
use thiserror::Error;

use super::ids::{ArtifactId, ArtifactName, Region};
use super::outcome::RegionFailure;
use crate::ports::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("{kind} must be at most {max} characters")]
    TooLong { kind: &'static str, max: usize },

    #[error("{kind} {value:?} contains invalid character {found:?}")]
    InvalidChar {
        kind: &'static str,
        value: String,
        found: char,
    },

    #[error("{kind} {value:?} must not consist of dots only")]
    DotsOnly { kind: &'static str, value: String },

    #[error("at least one region is required")]
    NoRegions,

    #[error("attribute must be given as key=value, got {0:?}")]
    MalformedAttribute(String),
}

/// ErrorKind は運用上の分類（exit code の選択などに使う）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The addressed record, domain or placement does not exist.
    NotFound,
    /// Some regions were handled, others were not; retry is well-defined.
    Partial,
    /// Nothing durable was achieved, or metadata could not be committed.
    Replication,
    /// A backend could not be reached.
    Unavailable,
    /// The request itself was invalid.
    Invalid,
}

fn regions_list(regions: &[Region]) -> String {
    regions
        .iter()
        .map(Region::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn failures_list(failures: &[RegionFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.region, f.cause))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no record {name}/{id}")]
    NotFound { name: ArtifactName, id: ArtifactId },

    #[error("catalog domain for {name} does not exist; run setup first")]
    DomainNotFound { name: ArtifactName },

    #[error("record {name}/{id} already exists")]
    DuplicateId { name: ArtifactName, id: ArtifactId },

    #[error("replication of {name}/{id} failed in every region ({})", failures_list(.failures))]
    ReplicationFailed {
        name: ArtifactName,
        id: ArtifactId,
        failures: Vec<RegionFailure>,
    },

    #[error(
        "payload of {name}/{id} uploaded to [{}] but metadata commit failed: {source}",
        regions_list(.uploaded)
    )]
    MetadataCommitFailed {
        name: ArtifactName,
        id: ArtifactId,
        uploaded: Vec<Region>,
        #[source]
        source: Box<CatalogError>,
    },

    #[error(
        "delete of {name}/{id} incomplete; blobs remain in [{}] ({})",
        regions_list(.remaining_regions),
        failures_list(.failures)
    )]
    PartialDelete {
        name: ArtifactName,
        id: ArtifactId,
        remaining_regions: Vec<Region>,
        failures: Vec<RegionFailure>,
    },

    #[error("metadata store unavailable: {0}")]
    MetadataUnavailable(#[source] StoreError),

    #[error("blob {bucket}/{key} unavailable in {region}: {source}")]
    BlobUnavailable {
        region: Region,
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("{name}/{id} is not replicated to {region}")]
    RegionNotReplicated {
        name: ArtifactName,
        id: ArtifactId,
        region: Region,
    },

    #[error("attribute {attribute:?} cannot be updated: {reason}")]
    InvalidAttribute {
        attribute: String,
        reason: &'static str,
    },

    #[error("record {name}/{id} is malformed: {reason}")]
    CorruptRecord {
        name: ArtifactName,
        id: String,
        reason: String,
    },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::NotFound { .. }
            | CatalogError::DomainNotFound { .. }
            | CatalogError::RegionNotReplicated { .. } => ErrorKind::NotFound,
            CatalogError::PartialDelete { .. } => ErrorKind::Partial,
            CatalogError::ReplicationFailed { .. } | CatalogError::MetadataCommitFailed { .. } => {
                ErrorKind::Replication
            }
            CatalogError::MetadataUnavailable(_) | CatalogError::BlobUnavailable { .. } => {
                ErrorKind::Unavailable
            }
            CatalogError::DuplicateId { .. }
            | CatalogError::InvalidAttribute { .. }
            | CatalogError::CorruptRecord { .. }
            | CatalogError::Io { .. }
            | CatalogError::Validation(_) => ErrorKind::Invalid,
        }
    }
}
