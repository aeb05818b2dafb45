//! # heirloom CLI entry point
//!
//! 引数の解析、ログの初期化、設定の解決を行い、コマンドを heirloom-core に渡します。
//! 結果は JSON で stdout へ、ログは stderr へ出します。

mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use heirloom_core::{ArchiveBuilder, Config};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::EXIT_PARTIAL;

async fn run(cli: Cli) -> anyhow::Result<commands::Report> {
    let config = Config::load(
        cli.config.as_deref(),
        &cli.profile,
        cli.overrides(),
        |key: &str| std::env::var(key).ok(),
    )
    .context("load config")?;

    let archive = ArchiveBuilder::new(config)
        .local_backends()
        .build()
        .context("wire archive")?;

    commands::run(&archive, cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(report) => {
            match serde_json::to_string_pretty(&report.body) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    tracing::error!(error = %e, "cannot print result");
                    return ExitCode::from(commands::EXIT_INVALID);
                }
            }
            if report.partial {
                ExitCode::from(EXIT_PARTIAL)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(commands::exit_code(&err))
        }
    }
}
