use std::io::Write;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use shared::domain::Collection;
use storage::{normalize_database_url, DocumentStore, StoredDocument};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "landing-tools", about = "Inspect signups held in the SQLite document store")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/landing.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Documents per collection.
    Count,
    /// One JSON object per line, oldest first.
    Export { collection: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let database_url = normalize_database_url(&cli.database_url);
    let store = DocumentStore::new(&database_url)
        .await
        .with_context(|| format!("failed to open document store at '{database_url}'"))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Count => {
            for collection in Collection::ALL {
                writeln!(out, "{collection}\t{}", store.count(collection).await?)?;
            }
        }
        Command::Export { collection } => {
            let collection = parse_collection(&collection)?;
            let exported = export(&store, collection, &mut out).await?;
            tracing::info!(%collection, exported, "tools: export finished");
        }
    }

    Ok(())
}

fn parse_collection(raw: &str) -> Result<Collection> {
    Collection::from_name(raw).ok_or_else(|| {
        let known: Vec<_> = Collection::ALL.iter().map(|c| c.name()).collect();
        anyhow!("unknown collection '{raw}' (expected one of: {})", known.join(", "))
    })
}

fn export_line(document: &StoredDocument) -> String {
    json!({
        "id": document.id,
        "collection": document.collection.name(),
        "created_at": document.created_at.to_rfc3339(),
        "document": document.body,
    })
    .to_string()
}

async fn export(store: &DocumentStore, collection: Collection, out: &mut impl Write) -> Result<usize> {
    let documents = store.documents(collection).await?;
    for document in &documents {
        writeln!(out, "{}", export_line(document))?;
    }
    Ok(documents.len())
}
