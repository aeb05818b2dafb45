//! Command-line surface of `heirloom`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use heirloom_core::config::{Profile, DEFAULT_PROFILE};
use heirloom_core::domain::{ArtifactId, ArtifactName, Attributes, Region, ValidationError};

/// Replicate artifacts across regions and track where they live.
#[derive(Parser, Debug)]
#[command(name = "heirloom", version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: $HEIRLOOM_CONFIG_FILE, then ~/.heirloom.yml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Profile to read from the config file.
    #[arg(long, global = true, default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Log level (RUST_LOG takes precedence when set).
    #[arg(long, global = true, default_value = "info")]
    pub level: String,

    /// Root directory of the local backends.
    #[arg(long, global = true)]
    pub storage_root: Option<PathBuf>,

    /// Prefix of per-region bucket names.
    #[arg(long, global = true)]
    pub bucket_prefix: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Flags that override config file values.
    pub fn overrides(&self) -> Profile {
        Profile {
            bucket_prefix: self.bucket_prefix.clone(),
            storage_root: self.storage_root.clone(),
            ..Profile::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the catalog domain for an artifact name.
    Setup(SetupArgs),
    /// Upload a payload to every region and record it.
    Upload(UploadArgs),
    /// Show records of an artifact name.
    Show(ShowArgs),
    /// Delete a record and all of its blobs.
    Delete(DeleteArgs),
    /// Overwrite one attribute of a record.
    Update(UpdateArgs),
    /// Cross-check the catalog against the blob stores.
    Verify(VerifyArgs),
    /// Download a payload from one region.
    Download(DownloadArgs),
}

#[derive(Args, Debug)]
pub struct SetupArgs {
    #[arg(short, long)]
    pub name: ArtifactName,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    #[arg(short, long)]
    pub name: ArtifactName,

    /// Payload file.
    #[arg(short, long)]
    pub file: PathBuf,

    /// Target region. Repeatable; defaults to the configured regions.
    #[arg(short, long = "region")]
    pub regions: Vec<Region>,

    /// Explicit id (generated when omitted).
    #[arg(short, long)]
    pub id: Option<ArtifactId>,

    /// Extra attribute as key=value. Repeatable.
    #[arg(short, long = "attribute", value_parser = parse_attribute)]
    pub attributes: Vec<(String, String)>,
}

impl UploadArgs {
    pub fn attribute_map(&self) -> Attributes {
        self.attributes.iter().cloned().collect()
    }
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(short, long)]
    pub name: ArtifactName,

    #[arg(short, long)]
    pub id: Option<ArtifactId>,

    /// Show every record instead of the latest one.
    #[arg(long, conflicts_with = "id")]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[arg(short, long)]
    pub name: ArtifactName,

    #[arg(short, long)]
    pub id: ArtifactId,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[arg(short, long)]
    pub name: ArtifactName,

    #[arg(short, long)]
    pub id: ArtifactId,

    /// Attribute to overwrite.
    #[arg(short, long)]
    pub attribute: String,

    /// New value.
    #[arg(short = 'u', long)]
    pub value: String,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Artifact name (every name when omitted).
    #[arg(short, long)]
    pub name: Option<ArtifactName>,

    /// Skip listing buckets for blobs without any record.
    #[arg(long)]
    pub no_orphan_scan: bool,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    #[arg(short, long)]
    pub name: ArtifactName,

    #[arg(short, long)]
    pub id: ArtifactId,

    #[arg(short, long)]
    pub region: Region,

    /// Destination file (overwritten).
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Parse `key=value`. The value may itself contain `=`.
pub fn parse_attribute(raw: &str) -> Result<(String, String), ValidationError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ValidationError::MalformedAttribute(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("owner=ops", "owner", "ops")]
    #[case("url=https://x/?a=b", "url", "https://x/?a=b")]
    #[case("note=", "note", "")]
    fn attribute_is_split_on_first_equals(#[case] raw: &str, #[case] key: &str, #[case] value: &str) {
        assert_eq!(
            parse_attribute(raw).unwrap(),
            (key.to_string(), value.to_string())
        );
    }

    #[rstest]
    #[case("owner")]
    #[case("=ops")]
    #[case("")]
    fn malformed_attribute_is_rejected(#[case] raw: &str) {
        assert!(matches!(
            parse_attribute(raw),
            Err(ValidationError::MalformedAttribute(_))
        ));
    }

    #[test]
    fn upload_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "heirloom", "upload", "-n", "app", "-f", "build.tgz", "-r", "us-west-1", "-r",
            "us-east-1", "-a", "owner=ops",
        ])
        .unwrap();
        let Command::Upload(args) = cli.command else {
            panic!("expected upload");
        };
        assert_eq!(args.regions.len(), 2);
        assert!(args.id.is_none());
        assert_eq!(args.attribute_map().get("owner").map(String::as_str), Some("ops"));
    }

    #[test]
    fn invalid_labels_fail_at_parse_time() {
        assert!(Cli::try_parse_from(["heirloom", "setup", "-n", "bad name"]).is_err());
        assert!(Cli::try_parse_from([
            "heirloom", "download", "-n", "app", "-i", "v1", "-r", "US_WEST", "-o", "out"
        ])
        .is_err());
    }

    #[test]
    fn global_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "heirloom", "verify", "--bucket-prefix", "acme", "--storage-root", "/tmp/h",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.bucket_prefix.as_deref(), Some("acme"));
        assert_eq!(overrides.storage_root, Some(PathBuf::from("/tmp/h")));
        assert_eq!(cli.profile, "default");
        assert!(matches!(cli.command, Command::Verify(VerifyArgs { name: None, no_orphan_scan: false })));
    }

    #[test]
    fn show_all_conflicts_with_id() {
        assert!(Cli::try_parse_from(["heirloom", "show", "-n", "app", "-i", "v1", "--all"]).is_err());
    }
}
