// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfwerk — local PDF toolbox.
//
// Entry point. Initialises logging, loads the config, runs one command, and
// reports failures as localized human-readable messages.

mod cli;
mod services;
mod state;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use pdfwerk_core::config::default_config_path;
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_core::human_errors::{Severity, humanize_error};
use pdfwerk_core::i18n::Locale;
use pdfwerk_core::types::{PageRange, Quality};
use pdfwerk_core::AppConfig;
use pdfwerk_document::convert::DEFAULT_ARCHIVE_NAME;
use pdfwerk_document::ocr::{DEFAULT_TRANSCRIPT_NAME, ProgressReporter, Transcript};

use cli::{Cli, Command, OcrOverrides};
use services::app_services::{
    AppServices, COMPRESSED_NAME, MERGED_NAME, split_name, write_output,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), cli.locale) {
        Ok(config) => config,
        Err(err) => return report(&err, cli.locale.unwrap_or_default()),
    };
    let locale = config.locale;
    let services = AppServices::new(config);

    match execute(&services, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err, locale),
    }
}

/// Explicit `--config` must load; the default location may be absent.
fn load_config(path: Option<&Path>, locale: Option<Locale>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default(default_config_path())?,
    };
    if let Some(locale) = locale {
        config.locale = locale;
    }
    config.validate()?;
    Ok(config)
}

fn report(err: &PdfwerkError, locale: Locale) -> ExitCode {
    let human = humanize_error(err, locale);
    match human.severity {
        Severity::Transient => tracing::warn!(error = %err, "Operation failed, retry may help"),
        _ => tracing::error!(error = %err, "Operation failed"),
    }
    eprintln!("{}{}", locale.labels().error_prefix, human.message);
    eprintln!("  {}", human.suggestion);
    ExitCode::from(exit_status(human.severity))
}

/// sysexits(3) codes: a retry may help, fix the invocation, or bad input data.
fn exit_status(severity: Severity) -> u8 {
    match severity {
        Severity::Transient => 75,
        Severity::ActionRequired => 64,
        Severity::Permanent => 65,
    }
}

async fn execute(services: &AppServices, command: Command) -> Result<()> {
    let labels = services.labels();
    match command {
        Command::Merge { inputs, output } => {
            eprintln!("{}: {}", labels.merge.title, labels.merge.running);
            let bytes = services.merge(&inputs).await?;
            save(services, output.unwrap_or_else(|| MERGED_NAME.into()), &bytes).await
        }
        Command::Split { input, start, end, output } => {
            eprintln!("{}: {}", labels.split.title, labels.split.running);
            let range = PageRange::new(start, end);
            let bytes = services.split(&input, range).await?;
            save(services, output.unwrap_or_else(|| split_name(range).into()), &bytes).await
        }
        Command::Convert { input, pages, format, scale, output } => {
            eprintln!("{}: {}", labels.convert.title, labels.convert.running);
            let options = cli::convert_options(services.config(), format, scale);
            let archive = services.convert(&input, pages, options).await?;
            let path = output.unwrap_or_else(|| DEFAULT_ARCHIVE_NAME.into());
            save(services, path, &archive.bytes).await
        }
        Command::Compress { input, quality, output } => {
            eprintln!("{}: {}", labels.compress.title, labels.compress.running);
            let percent = quality.unwrap_or(services.config().compress.quality_percent);
            let bytes = services.compress(&input, Quality::from_percent(percent)?).await?;
            save(services, output.unwrap_or_else(|| COMPRESSED_NAME.into()), &bytes).await
        }
        Command::Ocr { input, language, workers, engine, strategy, scale, output, json } => {
            let overrides = OcrOverrides { language, workers, engine, strategy, scale };
            let config = services.config();
            let (options, engine) = overrides.resolve(&config.ocr, config.locale);
            run_ocr(services, &input, engine, options, output, json).await
        }
        Command::Pages { input } => {
            let count = services.page_count(&input).await?;
            println!("{}: {}", labels.page_count, count);
            Ok(())
        }
    }
}

async fn run_ocr(
    services: &AppServices,
    input: &Path,
    engine: pdfwerk_core::types::EngineKind,
    options: pdfwerk_document::OcrOptions,
    output: Option<PathBuf>,
    json: Option<PathBuf>,
) -> Result<()> {
    let labels = services.labels();
    eprintln!("{}: {}", labels.ocr.title, labels.ocr.running);

    let progress = ProgressReporter::new();
    let mut updates = progress.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = *updates.borrow_and_update();
            if snapshot.total > 0 {
                eprintln!(
                    "{} ({}%)",
                    labels.ocr_progress(snapshot.completed, snapshot.total),
                    snapshot.percent()
                );
            }
        }
    });

    let outcome = services.ocr(input, engine, options, &progress).await;
    // Closing the channel lets the printer drain the last update and stop.
    drop(progress);
    if let Err(err) = printer.await {
        tracing::warn!(error = %err, "Progress printer did not finish");
    }
    let outcome = outcome?;

    let failed: Vec<u32> = outcome.failed_pages().collect();
    if !failed.is_empty() {
        tracing::warn!(pages = ?failed, "Some pages could not be recognized");
    }
    if let Some(json) = json {
        write_output(&json, &serde_json::to_vec_pretty(&outcome)?).await?;
    }

    match &outcome.transcript {
        Transcript::Text(text) => {
            let path = output.unwrap_or_else(|| DEFAULT_TRANSCRIPT_NAME.into());
            save(services, path, text.as_bytes()).await
        }
        Transcript::Empty => {
            eprintln!("{}", labels.no_text_recognized);
            Ok(())
        }
    }
}

async fn save(services: &AppServices, path: PathBuf, bytes: &[u8]) -> Result<()> {
    write_output(&path, bytes).await?;
    let labels = services.labels();
    eprintln!("{}, {} {}", labels.success, labels.saved_to, path.display());
    Ok(())
}
