//! Blob addresses and the naming conventions that derive them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ArtifactId, ArtifactName, Region};

/// Where one region's copy of a payload lives.
///
/// Stored in the record as a structured pair; never re-parsed from a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobAddress {
    pub bucket: String,
    pub key: String,
}

impl BlobAddress {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for BlobAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Naming conventions shared by every component.
///
/// - domain: `{domain_prefix}{name}`
/// - bucket: `{bucket_prefix}-{region}`
/// - key:    `{name}/{id}`
///
/// The address depends only on name, id and region, so re-uploading a
/// failed region always targets the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLayout {
    domain_prefix: String,
    bucket_prefix: String,
}

impl CatalogLayout {
    pub fn new(domain_prefix: impl Into<String>, bucket_prefix: impl Into<String>) -> Self {
        Self {
            domain_prefix: domain_prefix.into(),
            bucket_prefix: bucket_prefix.into(),
        }
    }

    pub fn domain(&self, name: &ArtifactName) -> String {
        format!("{}{}", self.domain_prefix, name)
    }

    /// Inverse of [`CatalogLayout::domain`]; `None` for foreign domains.
    pub fn name_of_domain(&self, domain: &str) -> Option<ArtifactName> {
        let raw = domain.strip_prefix(&self.domain_prefix)?;
        ArtifactName::parse(raw).ok()
    }

    pub fn bucket(&self, region: &Region) -> String {
        format!("{}-{}", self.bucket_prefix, region)
    }

    pub fn key(&self, name: &ArtifactName, id: &ArtifactId) -> String {
        format!("{}/{}", name, id)
    }

    /// Prefix under which every key of `name` lives.
    pub fn key_prefix(&self, name: &ArtifactName) -> String {
        format!("{}/", name)
    }

    /// Id encoded in a listed key, if the key follows the convention.
    pub fn id_of_key(&self, name: &ArtifactName, key: &str) -> Option<ArtifactId> {
        let rest = key.strip_prefix(&self.key_prefix(name))?;
        ArtifactId::parse(rest).ok()
    }

    pub fn address(&self, region: &Region, name: &ArtifactName, id: &ArtifactId) -> BlobAddress {
        BlobAddress::new(self.bucket(region), self.key(name, id))
    }
}

impl Default for CatalogLayout {
    fn default() -> Self {
        Self::new("heirloom_", "heirloom")
    }
}
