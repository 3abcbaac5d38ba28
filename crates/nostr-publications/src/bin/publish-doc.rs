use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use nostr_publications::{
    ContentKind, DirectDocumentPublisher, EventKindRegistry, PublicationRequest, RelayPublisher,
    RelayPublisherConfig,
};

#[derive(Debug, Parser)]
#[command(name = "publish-doc")]
#[command(about = "Compile a document into Nostr publication events and publish them")]
struct Args {
    /// Document to publish (.adoc or .md).
    file: PathBuf,
    /// Depth at which sections stop becoming indexes (0 = flat article).
    #[arg(long)]
    content_level: Option<u8>,
    /// Content kind: long-form, publication-content, or wiki.
    #[arg(long)]
    content_kind: Option<String>,
    /// Compile and print the report without publishing.
    #[arg(long)]
    dry_run: bool,
    /// Timestamp-free identifiers for reproducible runs.
    #[arg(long)]
    static_ids: bool,
    /// Reuse an existing identifier for the top-level event.
    #[arg(long)]
    identifier: Option<String>,
    /// Emit a companion notification note for long-form articles.
    #[arg(long)]
    notify: bool,
    /// Relay hint embedded in reference tags.
    #[arg(long)]
    relay_hint: Option<String>,
    /// Relay to publish to; repeatable. Required unless --dry-run.
    #[arg(long)]
    relay: Vec<String>,
    /// Nostr secret key (hex or bech32). Falls back to NOSTR_SECRET_KEY env.
    #[arg(long)]
    key: Option<String>,
    #[arg(long, default_value_t = 1)]
    min_acks: usize,
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let content_kind = args
        .content_kind
        .as_deref()
        .map(ContentKind::parse)
        .transpose()?;

    let request = PublicationRequest {
        content_level: args.content_level,
        content_kind,
        dry_run: args.dry_run,
        static_ids: args.static_ids,
        identifier: args.identifier.clone(),
        author_pubkey: None,
        notify: args.notify,
        relay_hint: args.relay_hint.clone(),
    };

    let publisher = DirectDocumentPublisher::new(EventKindRegistry::new());
    let outcome = publisher.compile_file(&args.file, &request)?;

    let report = if args.dry_run {
        outcome.report.clone()
    } else {
        let key = args
            .key
            .or_else(|| std::env::var("NOSTR_SECRET_KEY").ok())
            .ok_or("a secret key is required unless --dry-run is set")?;
        if args.relay.is_empty() {
            return Err("at least one --relay is required unless --dry-run is set".into());
        }
        let relay = RelayPublisher::new(RelayPublisherConfig {
            relays: args.relay,
            secret_key: key,
            min_acks: args.min_acks,
            timeout: Duration::from_secs(args.timeout_secs),
        })
        .await?;
        publisher.publish(&outcome, &relay).await?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.success {
        std::process::exit(1);
    }
    info!(
        events = report.total_events,
        dry_run = args.dry_run,
        "done"
    );
    Ok(())
}
