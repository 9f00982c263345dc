//! Favro export CLI binary.
//!
//! Exports every organization of a Favro account into a local directory.

use std::process::ExitCode;

use clap::Parser;
use favro_export::cli::Cli;
use favro_export::{
    prepare_destination, AttachmentDownloader, ExportError, ExportSession, ExportSummary,
    Exporter, FavroClient, JsonSink, ResourceKind,
};
use tabled::{Table, Tabled};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if matches!(e, ExportError::ConfigMissing(_)) {
                eprintln!("Hint: Set FAVRO_USER and FAVRO_API_TOKEN environment variables");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> favro_export::Result<()> {
    let user = cli
        .user
        .as_deref()
        .ok_or_else(|| ExportError::ConfigMissing("Favro user (--user) not set".to_string()))?;
    let token = cli
        .token
        .as_deref()
        .ok_or_else(|| ExportError::ConfigMissing("API token (--token) not set".to_string()))?;

    let client = FavroClient::new(user, token, &cli.base_url)?;
    prepare_destination(&cli.destination, !cli.no_clean).await?;

    tracing::info!(destination = %cli.destination.display(), "starting export");

    let mut session = ExportSession::new(client);
    if let Some(org) = &cli.organization {
        session = session.with_organization_scope(org.clone());
    }

    let mut exporter = Exporter::new(
        session,
        JsonSink::new(&cli.destination),
        AttachmentDownloader::new()?,
    );
    if let Some(org) = &cli.organization {
        exporter = exporter.only_organization(org.clone());
    }

    let summary = exporter.run().await;
    let session = exporter.into_source();
    tracing::info!(requests = session.requests(), "end export");

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &ExportSummary) {
    let rows: Vec<SummaryRow> = ResourceKind::ALL
        .iter()
        .map(|kind| SummaryRow::new(*kind, summary))
        .collect();
    println!("{}", Table::new(rows));

    let attachments = &summary.attachments;
    println!(
        "\nAttachments: {} downloaded, {} failed ({} directories could not be created)",
        attachments.downloaded, attachments.failed, summary.attachment_dir_failures
    );
    if !summary.is_complete() {
        println!("Export is partial, see the log for the failed requests");
    }
}

// Table row type for the run summary

#[derive(Tabled)]
struct SummaryRow {
    resource: String,
    fetches: usize,
    entities: usize,
    truncated: usize,
    files: usize,
    #[tabled(rename = "write failures")]
    write_failures: usize,
}

impl SummaryRow {
    fn new(kind: ResourceKind, summary: &ExportSummary) -> Self {
        let stats = summary.stats(kind);
        Self {
            resource: kind.to_string(),
            fetches: stats.fetches,
            entities: stats.entities,
            truncated: stats.truncated,
            files: stats.files_written,
            write_failures: stats.write_failures,
        }
    }
}
