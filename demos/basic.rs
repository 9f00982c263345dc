//! Basic example exporting a Favro account.
//!
//! Run with:
//! ```
//! FAVRO_USER=me@example.com FAVRO_API_TOKEN=your-token cargo run --example basic -- ./favro-backup
//! ```

use std::path::PathBuf;

use favro_export::{
    prepare_destination, AttachmentDownloader, ExportSession, Exporter, FavroClient, JsonSink,
    ResourceKind,
};

#[tokio::main]
async fn main() -> favro_export::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    // Create client from environment variables
    println!("Creating Favro client...");
    let client = FavroClient::from_env()?;
    println!("Connected to: {}", client.base_url());

    let dest = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("favro-backup"));
    prepare_destination(&dest, true).await?;

    println!("\n--- Exporting into {} ---", dest.display());
    let mut exporter = Exporter::new(
        ExportSession::new(client),
        JsonSink::new(&dest),
        AttachmentDownloader::new()?,
    );
    let summary = exporter.run().await;

    for kind in ResourceKind::ALL {
        let stats = summary.stats(kind);
        println!("  {kind}: {} entities in {} files", stats.entities, stats.files_written);
    }
    println!(
        "  attachments: {} downloaded, {} failed",
        summary.attachments.downloaded, summary.attachments.failed
    );

    let session = exporter.into_source();
    println!("\n{} requests issued", session.requests());
    if !summary.is_complete() {
        println!("Export is partial, see the log for details");
    }

    println!("\nDone!");
    Ok(())
}
