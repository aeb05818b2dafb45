//! Validated labels: artifact names, artifact ids and regions.
//!
//! # Phantom Type パターン
//! `Label<T>` で検証・表示・serde の共通実装を提供しつつ、
//! `T` はマーカー型としてコンパイル時の型安全性だけを提供します。
//! （`ArtifactName` と `Region` は混同できない）
//!
//! Labels end up inside metadata domain names, bucket names and blob keys,
//! so the accepted alphabet is deliberately narrow.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

use super::errors::ValidationError;

/// Maximum length of any label.
pub const MAX_LABEL_LEN: usize = 128;

/// LabelKind は各ラベル型のマーカー trait
pub trait LabelKind: Send + Sync + 'static {
    /// Human readable kind, used in validation errors.
    const KIND: &'static str;

    /// Whether `c` may appear in this kind of label.
    fn allows(c: char) -> bool;
}

/// A validated string label.
pub struct Label<T: LabelKind> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T: LabelKind> Label<T> {
    /// Validate `raw` and wrap it.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::Empty { kind: T::KIND });
        }
        if raw.len() > MAX_LABEL_LEN {
            return Err(ValidationError::TooLong {
                kind: T::KIND,
                max: MAX_LABEL_LEN,
            });
        }
        if let Some(c) = raw.chars().find(|c| !T::allows(*c)) {
            return Err(ValidationError::InvalidChar {
                kind: T::KIND,
                value: raw.to_string(),
                found: c,
            });
        }
        // "." や ".." はパスの要素として解釈されてしまう
        if raw.chars().all(|c| c == '.') {
            return Err(ValidationError::DotsOnly {
                kind: T::KIND,
                value: raw.to_string(),
            });
        }
        Ok(Self {
            value: raw.to_string(),
            _marker: PhantomData,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl<T: LabelKind> Clone for Label<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: LabelKind> PartialEq for Label<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: LabelKind> Eq for Label<T> {}

impl<T: LabelKind> PartialOrd for Label<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: LabelKind> Ord for Label<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T: LabelKind> std::hash::Hash for Label<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: LabelKind> fmt::Debug for Label<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", T::KIND, self.value)
    }
}

impl<T: LabelKind> fmt::Display for Label<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T: LabelKind> std::str::FromStr for Label<T> {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<T: LabelKind> Serialize for Label<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T: LabelKind> Deserialize<'de> for Label<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Artifact name のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Name {}

impl LabelKind for Name {
    const KIND: &'static str = "artifact name";

    fn allows(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
    }
}

/// Artifact id のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Id {}

impl LabelKind for Id {
    const KIND: &'static str = "artifact id";

    fn allows(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
    }
}

/// Region のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionKind {}

impl LabelKind for RegionKind {
    const KIND: &'static str = "region";

    fn allows(c: char) -> bool {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
    }
}

/// Logical artifact identity; selects the metadata domain.
pub type ArtifactName = Label<Name>;

/// One version of an artifact, unique within its name.
pub type ArtifactId = Label<Id>;

/// An independently reachable blob store deployment.
pub type Region = Label<RegionKind>;

impl ArtifactId {
    /// ULID の文字列表現は時刻順にソートできる
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            value: ulid.to_string(),
            _marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("app")]
    #[case::dotted("my.app")]
    #[case::mixed("App_1-2")]
    fn valid_names_parse(#[case] raw: &str) {
        let name = ArtifactName::parse(raw).unwrap();
        assert_eq!(name.as_str(), raw);
    }

    #[rstest]
    #[case::empty("")]
    #[case::slash("a/b")]
    #[case::space("a b")]
    #[case::colon("a:b")]
    fn invalid_names_are_rejected(#[case] raw: &str) {
        assert!(ArtifactName::parse(raw).is_err());
    }

    #[rstest]
    #[case::current(".")]
    #[case::parent("..")]
    #[case::triple("...")]
    fn dot_only_labels_are_rejected(#[case] raw: &str) {
        assert!(matches!(
            ArtifactName::parse(raw),
            Err(ValidationError::DotsOnly { .. })
        ));
        assert!(matches!(
            ArtifactId::parse(raw),
            Err(ValidationError::DotsOnly { .. })
        ));
        let bad: Result<ArtifactName, _> = serde_json::from_str(&format!("{raw:?}"));
        assert!(bad.is_err());
    }

    #[test]
    fn dots_inside_a_label_are_fine() {
        assert!(ArtifactName::parse("..app").is_ok());
        assert!(ArtifactId::parse("1.0.0").is_ok());
    }

    #[test]
    fn regions_are_lowercase_only() {
        assert!(Region::parse("us-west-2").is_ok());
        let err = Region::parse("US-WEST-2").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidChar { found: 'U', .. }));
    }

    #[test]
    fn overlong_labels_are_rejected() {
        let raw = "a".repeat(MAX_LABEL_LEN + 1);
        assert!(matches!(
            ArtifactId::parse(&raw),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn ulid_ids_sort_by_creation_time() {
        let first = ArtifactId::from_ulid(Ulid::from_parts(1_000, 42));
        let second = ArtifactId::from_ulid(Ulid::from_parts(2_000, 7));
        assert!(first < second);
        assert!(ArtifactId::parse(first.as_str()).is_ok());
    }

    #[test]
    fn labels_serialize_as_plain_strings() {
        let region = Region::parse("eu-central-1").unwrap();
        let s = serde_json::to_string(&region).unwrap();
        assert_eq!(s, "\"eu-central-1\"");

        let back: Region = serde_json::from_str(&s).unwrap();
        assert_eq!(back, region);

        let bad: Result<Region, _> = serde_json::from_str("\"Not A Region\"");
        assert!(bad.is_err());
    }
}
