//! Command dispatch: one call into heirloom-core per command.

use anyhow::Context;
use heirloom_core::domain::{CatalogError, ErrorKind};
use heirloom_core::Archive;
use serde::Serialize;

use crate::cli::Command;

/// What a finished command reports.
pub struct Report {
    pub body: serde_json::Value,
    pub partial: bool,
}

impl Report {
    fn complete(body: impl Serialize) -> anyhow::Result<Self> {
        Ok(Self {
            body: serde_json::to_value(body).context("encode result")?,
            partial: false,
        })
    }
}

pub async fn run(archive: &Archive, command: Command) -> anyhow::Result<Report> {
    match command {
        Command::Setup(args) => {
            archive.setup(&args.name).await?;
            Report::complete(serde_json::json!({ "name": args.name, "domain_ready": true }))
        }
        Command::Upload(args) => {
            let attributes = args.attribute_map();
            let outcome = archive
                .add(&args.name, &args.file, &args.regions, args.id, attributes)
                .await?;
            let partial = outcome.is_partial();
            let mut report = Report::complete(&outcome)?;
            report.partial = partial;
            Ok(report)
        }
        Command::Show(args) => {
            let catalog = archive.catalog();
            match (args.id, args.all) {
                (Some(id), _) => Report::complete(catalog.show_one(&args.name, &id).await?),
                (None, true) => Report::complete(catalog.show(&args.name).await?),
                (None, false) => Report::complete(catalog.latest(&args.name).await?),
            }
        }
        Command::Delete(args) => {
            Report::complete(archive.catalog().delete(&args.name, &args.id).await?)
        }
        Command::Update(args) => Report::complete(
            archive
                .update(&args.name, &args.id, &args.attribute, &args.value)
                .await?,
        ),
        Command::Verify(args) => {
            let report = archive
                .verify(args.name.as_ref(), !args.no_orphan_scan)
                .await?;
            let consistent = report.is_consistent();
            Ok(Report {
                body: serde_json::to_value(&report).context("encode result")?,
                partial: !consistent,
            })
        }
        Command::Download(args) => Report::complete(
            archive
                .retrieve(&args.name, &args.id, &args.region, &args.output)
                .await?,
        ),
    }
}

pub const EXIT_INVALID: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_PARTIAL: u8 = 3;
pub const EXIT_REPLICATION: u8 = 4;
pub const EXIT_UNAVAILABLE: u8 = 5;

pub fn exit_code_for(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Invalid => EXIT_INVALID,
        ErrorKind::NotFound => EXIT_NOT_FOUND,
        ErrorKind::Partial => EXIT_PARTIAL,
        ErrorKind::Replication => EXIT_REPLICATION,
        ErrorKind::Unavailable => EXIT_UNAVAILABLE,
    }
}

/// Exit code for a failed command. Anything that is not a catalog error
/// (config, wiring, encoding) counts as invalid input.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CatalogError>()
        .map(|e| exit_code_for(e.kind()))
        .unwrap_or(EXIT_INVALID)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heirloom_core::domain::{ArtifactId, ArtifactName};

    #[test]
    fn not_found_maps_to_two() {
        let err: anyhow::Error = CatalogError::NotFound {
            name: ArtifactName::parse("app").unwrap(),
            id: ArtifactId::parse("v1").unwrap(),
        }
        .into();
        assert_eq!(exit_code(&err), EXIT_NOT_FOUND);
    }

    #[test]
    fn foreign_errors_are_invalid() {
        let err = anyhow::anyhow!("bad config");
        assert_eq!(exit_code(&err), EXIT_INVALID);
    }

    #[test]
    fn every_kind_has_a_distinct_code() {
        let kinds = [
            ErrorKind::Invalid,
            ErrorKind::NotFound,
            ErrorKind::Partial,
            ErrorKind::Replication,
            ErrorKind::Unavailable,
        ];
        let mut codes: Vec<u8> = kinds.into_iter().map(exit_code_for).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes, vec![1, 2, 3, 4, 5]);
    }
}
