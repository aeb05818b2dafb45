//! RecordCodec - ArtifactRecord と metadata item の相互変換
//!
//! 配置情報は region ごとに 2 つの予約属性として保存します:
//! - `placement.{region}.bucket`
//! - `placement.{region}.key`
//!
//! それ以外の属性はそのまま `attributes` になります。

use std::collections::BTreeMap;

use crate::domain::{
    ArtifactId, ArtifactName, ArtifactRecord, Attributes, BlobAddress, CatalogError, Region,
};
use crate::ports::Item;

const PLACEMENT_PREFIX: &str = "placement.";
const BUCKET_FIELD: &str = "bucket";
const KEY_FIELD: &str = "key";

/// Whether `attribute` belongs to the catalog's own schema.
pub fn is_reserved(attribute: &str) -> bool {
    attribute.starts_with(PLACEMENT_PREFIX)
}

pub fn encode(record: &ArtifactRecord) -> Item {
    let mut item: Item = record.attributes.clone();
    for (region, address) in &record.region_urls {
        item.insert(
            format!("{PLACEMENT_PREFIX}{region}.{BUCKET_FIELD}"),
            address.bucket.clone(),
        );
        item.insert(
            format!("{PLACEMENT_PREFIX}{region}.{KEY_FIELD}"),
            address.key.clone(),
        );
    }
    item
}

pub fn decode(name: &ArtifactName, item_name: &str, item: Item) -> Result<ArtifactRecord, CatalogError> {
    let corrupt = |reason: String| CatalogError::CorruptRecord {
        name: name.clone(),
        id: item_name.to_string(),
        reason,
    };

    let id = ArtifactId::parse(item_name).map_err(|e| corrupt(e.to_string()))?;

    let mut halves: BTreeMap<Region, (Option<String>, Option<String>)> = BTreeMap::new();
    let mut attributes = Attributes::new();
    for (attribute, value) in item {
        let Some(rest) = attribute.strip_prefix(PLACEMENT_PREFIX) else {
            attributes.insert(attribute, value);
            continue;
        };
        let (region, field) = rest
            .rsplit_once('.')
            .ok_or_else(|| corrupt(format!("malformed placement attribute {attribute:?}")))?;
        let region = Region::parse(region).map_err(|e| corrupt(e.to_string()))?;
        let slot = halves.entry(region).or_default();
        match field {
            BUCKET_FIELD => slot.0 = Some(value),
            KEY_FIELD => slot.1 = Some(value),
            _ => return Err(corrupt(format!("unknown placement field {field:?}"))),
        }
    }

    let mut region_urls = BTreeMap::new();
    for (region, halves) in halves {
        match halves {
            (Some(bucket), Some(key)) => {
                region_urls.insert(region, BlobAddress::new(bucket, key));
            }
            _ => return Err(corrupt(format!("incomplete placement for region {region}"))),
        }
    }

    Ok(ArtifactRecord::new(name.clone(), id, region_urls, attributes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ArtifactRecord {
        let name = ArtifactName::parse("app").unwrap();
        let id = ArtifactId::parse("v1").unwrap();
        let mut urls = BTreeMap::new();
        urls.insert(
            Region::parse("us-west-1").unwrap(),
            BlobAddress::new("heirloom-us-west-1", "app/v1"),
        );
        urls.insert(
            Region::parse("us-east-1").unwrap(),
            BlobAddress::new("heirloom-us-east-1", "app/v1"),
        );
        let mut attrs = Attributes::new();
        attrs.insert("sha256".to_string(), "abc".to_string());
        ArtifactRecord::new(name, id, urls, attrs)
    }

    #[test]
    fn encode_uses_structured_placement_attributes() {
        let item = encode(&record());
        assert_eq!(
            item.get("placement.us-west-1.bucket").map(String::as_str),
            Some("heirloom-us-west-1")
        );
        assert_eq!(item.get("placement.us-east-1.key").map(String::as_str), Some("app/v1"));
        assert_eq!(item.get("sha256").map(String::as_str), Some("abc"));
        assert_eq!(item.len(), 5);
    }

    #[test]
    fn decode_restores_the_record() {
        let original = record();
        let decoded = decode(&original.name, "v1", encode(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn half_a_placement_is_corrupt() {
        let mut item = encode(&record());
        item.remove("placement.us-east-1.key");
        let err = decode(&record().name, "v1", item).unwrap_err();
        assert!(matches!(err, CatalogError::CorruptRecord { .. }));
    }

    #[test]
    fn reserved_attributes() {
        assert!(is_reserved("placement.us-west-1.bucket"));
        assert!(!is_reserved("sha256"));
    }
}
