//! Config - 不変の設定値
//!
//! 設定は `Arc<Config>` として各コンポーネントに明示的に渡します（グローバル状態なし）。
//!
//! # 読み込み順
//! 1. `--config` で明示されたファイル
//! 2. `HEIRLOOM_CONFIG_FILE`
//! 3. `$HOME/.heirloom.yml`
//!
//! ファイルは名前付きプロファイルの map です:
//!
//! ```yaml
//! default:
//!   bucket_prefix: acme-artifacts
//!   regions: [us-west-1, us-east-1]
//! dev:
//!   bucket_prefix: acme-dev
//!   regions: [us-west-2]
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::{CatalogLayout, Region};

pub const CONFIG_FILE_ENV: &str = "HEIRLOOM_CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = ".heirloom.yml";
pub const DEFAULT_PROFILE: &str = "default";

const DEFAULT_BUCKET_PREFIX: &str = "heirloom";
const DEFAULT_DOMAIN_PREFIX: &str = "heirloom_";
const DEFAULT_STORAGE_ROOT: &str = ".heirloom";
const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_ID_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// One named profile as written in the file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub bucket_prefix: Option<String>,
    pub domain_prefix: Option<String>,
    pub regions: Option<Vec<Region>>,
    pub metadata_region: Option<Region>,
    pub storage_root: Option<PathBuf>,
    pub backend_timeout_secs: Option<u64>,
    pub id_attempts: Option<u32>,
}

impl Profile {
    /// Fields set in `over` win.
    pub fn overlay(self, over: Profile) -> Profile {
        Profile {
            bucket_prefix: over.bucket_prefix.or(self.bucket_prefix),
            domain_prefix: over.domain_prefix.or(self.domain_prefix),
            regions: over.regions.or(self.regions),
            metadata_region: over.metadata_region.or(self.metadata_region),
            storage_root: over.storage_root.or(self.storage_root),
            backend_timeout_secs: over.backend_timeout_secs.or(self.backend_timeout_secs),
            id_attempts: over.id_attempts.or(self.id_attempts),
        }
    }
}

/// Resolved, validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub layout: CatalogLayout,
    /// Default target regions for uploads; also checked by verify.
    pub regions: Vec<Region>,
    pub metadata_region: Option<Region>,
    /// Root directory of the local backends.
    pub storage_root: PathBuf,
    pub backend_timeout: Duration,
    /// How many fresh ids to try before giving up on a collision.
    pub id_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: CatalogLayout::new(DEFAULT_DOMAIN_PREFIX, DEFAULT_BUCKET_PREFIX),
            regions: Vec::new(),
            metadata_region: None,
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            id_attempts: DEFAULT_ID_ATTEMPTS,
        }
    }
}

fn check_prefix(field: &'static str, value: &str, allows: fn(char) -> bool) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if let Some(c) = value.chars().find(|c| !allows(*c)) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("{value:?} contains invalid character {c:?}"),
        });
    }
    Ok(())
}

impl Config {
    /// Build a config from a (merged) profile, filling defaults.
    pub fn from_profile(profile: Profile) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let bucket_prefix = profile
            .bucket_prefix
            .unwrap_or_else(|| DEFAULT_BUCKET_PREFIX.to_string());
        check_prefix("bucket_prefix", &bucket_prefix, |c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
        })?;

        let domain_prefix = profile
            .domain_prefix
            .unwrap_or_else(|| DEFAULT_DOMAIN_PREFIX.to_string());
        check_prefix("domain_prefix", &domain_prefix, |c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
        })?;

        let backend_timeout = match profile.backend_timeout_secs {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    field: "backend_timeout_secs",
                    reason: "must be greater than zero".to_string(),
                });
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.backend_timeout,
        };

        let id_attempts = match profile.id_attempts {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    field: "id_attempts",
                    reason: "must be at least 1".to_string(),
                });
            }
            Some(n) => n,
            None => defaults.id_attempts,
        };

        Ok(Self {
            layout: CatalogLayout::new(domain_prefix, bucket_prefix),
            regions: profile.regions.unwrap_or_default(),
            metadata_region: profile.metadata_region,
            storage_root: profile.storage_root.unwrap_or(defaults.storage_root),
            backend_timeout,
            id_attempts,
        })
    }

    /// Select `profile` from a YAML document and apply `overrides`.
    ///
    /// A profile missing from the document is logged and treated as empty.
    pub fn from_yaml(
        raw: &str,
        source: &Path,
        profile: &str,
        overrides: Profile,
    ) -> Result<Self, ConfigError> {
        let mut profiles: BTreeMap<String, Profile> =
            serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse {
                path: source.to_path_buf(),
                source: e,
            })?;

        let base = profiles.remove(profile).unwrap_or_else(|| {
            tracing::warn!(
                profile,
                path = %source.display(),
                "profile not found in config file, using defaults"
            );
            Profile::default()
        });
        Self::from_profile(base.overlay(overrides))
    }

    /// Where the config file is looked up, given an optional explicit path.
    pub fn resolve_path(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = env(CONFIG_FILE_ENV) {
            return Some(PathBuf::from(path));
        }
        env("HOME").map(|home| Path::new(&home).join(DEFAULT_CONFIG_FILE))
    }

    /// Resolve, read and parse the config file.
    ///
    /// An explicitly given file must exist; an implicit one may be absent,
    /// in which case defaults plus `overrides` are used.
    pub fn load(
        explicit: Option<&Path>,
        profile: &str,
        overrides: Profile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let Some(path) = Self::resolve_path(explicit, env) else {
            return Self::from_profile(overrides);
        };

        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                tracing::debug!(path = %path.display(), profile, "loading config");
                Self::from_yaml(&raw, &path, profile, overrides)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Self::from_profile(overrides)
            }
            Err(e) => Err(ConfigError::Read { path, source: e }),
        }
    }
}
