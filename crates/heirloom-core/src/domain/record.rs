//! Artifact record: the metadata unit for one artifact version.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::address::BlobAddress;
use super::ids::{ArtifactId, ArtifactName, Region};

/// Free-form descriptive attributes (timestamps, checksums, tags).
pub type Attributes = BTreeMap<String, String>;

/// Attribute names written by the catalog itself.
pub mod attr {
    pub const BUILT_AT: &str = "built_at";
    pub const PAYLOAD_BYTES: &str = "payload_bytes";
    pub const SHA256: &str = "sha256";
}

/// One committed artifact version.
///
/// `region_urls` only ever lists regions whose upload was confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub name: ArtifactName,
    pub id: ArtifactId,
    pub region_urls: BTreeMap<Region, BlobAddress>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl ArtifactRecord {
    pub fn new(
        name: ArtifactName,
        id: ArtifactId,
        region_urls: BTreeMap<Region, BlobAddress>,
        attributes: Attributes,
    ) -> Self {
        Self {
            name,
            id,
            region_urls,
            attributes,
        }
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.region_urls.keys()
    }

    pub fn address(&self, region: &Region) -> Option<&BlobAddress> {
        self.region_urls.get(region)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}
