use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lexaid_ai::RemoteEmbedder;
use lexaid_core::corpus::EMBED_DIM;
use lexaid_core::Source;
use lexaid_engine::RetrievalEngine;
use lexaid_mcp::{Dispatcher, McpServer};
use lexaid_store::{
    LanceStore, CASE_LAW_TABLE, LEGAL_SECTIONS_TABLE, PLAYBOOKS_TABLE, TEMPLATES_TABLE,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod display;

#[derive(Parser)]
#[command(name = "lexaid", version, about = "Legal knowledge-retrieval tool server")]
struct Cli {
    /// LanceDB corpus directory.
    #[arg(long, env = "LEXAID_DB_PATH", default_value = "data/lexaid.lance")]
    db_path: PathBuf,

    /// Embedding provider base URL (OpenAI-compatible).
    #[arg(long, env = "LEXAID_EMBED_URL", default_value = "https://api.openai.com/v1")]
    embed_url: String,

    /// Embedding model name.
    #[arg(long, env = "LEXAID_EMBED_MODEL", default_value = "text-embedding-3-small")]
    embed_model: String,

    /// Embedding provider credential.
    #[arg(long, env = "LEXAID_EMBED_API_KEY", hide_env_values = true)]
    embed_api_key: Option<String>,

    /// Per-tool-call timeout in seconds.
    #[arg(long, env = "LEXAID_CALL_TIMEOUT_SECS", default_value_t = 30)]
    call_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the MCP tool protocol over stdio.
    Serve,
    /// One-off semantic search from the terminal.
    Search {
        /// Query text.
        query: String,
        /// Source to search (repeatable); defaults to all.
        #[arg(long = "source", value_parser = parse_source)]
        sources: Vec<Source>,
        #[arg(long, default_value_t = 5)]
        max_results: usize,
    },
    /// Print the tool catalog as JSON.
    Tools,
}

fn parse_source(s: &str) -> Result<Source, String> {
    Source::parse(s).ok_or_else(|| format!("unknown source: {s}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr: in serve mode stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("lexaid v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve => {
            let engine = build_engine(
                &cli.db_path,
                cli.embed_url,
                cli.embed_model,
                cli.embed_api_key,
            )
            .await?;
            let dispatcher =
                Dispatcher::with_timeout(engine, Duration::from_secs(cli.call_timeout_secs));
            McpServer::new(dispatcher).run().await
        }
        Command::Search {
            query,
            sources,
            max_results,
        } => {
            let engine = build_engine(
                &cli.db_path,
                cli.embed_url,
                cli.embed_model,
                cli.embed_api_key,
            )
            .await?;
            let sources = if sources.is_empty() {
                Source::ALL.to_vec()
            } else {
                sources
            };
            let outcome = engine
                .semantic_search(&query, &sources, max_results)
                .await
                .context("semantic search failed")?;
            display::print_outcome(&outcome);
            Ok(())
        }
        Command::Tools => {
            println!(
                "{}",
                serde_json::to_string_pretty(&lexaid_mcp::tools::definitions())?
            );
            Ok(())
        }
    }
}

/// Open the corpus, log per-collection counts, and wire the collaborators
/// into an engine. Failure here is fatal by design: a server that cannot
/// reach its corpus should exit non-zero.
async fn build_engine(
    db_path: &PathBuf,
    embed_url: String,
    embed_model: String,
    embed_api_key: Option<String>,
) -> anyhow::Result<Arc<RetrievalEngine>> {
    let api_key =
        embed_api_key.context("embedding credential required: set LEXAID_EMBED_API_KEY")?;

    let store = LanceStore::open(db_path)
        .await
        .with_context(|| format!("opening corpus at {}", db_path.display()))?;

    for table in [
        LEGAL_SECTIONS_TABLE,
        CASE_LAW_TABLE,
        PLAYBOOKS_TABLE,
        TEMPLATES_TABLE,
    ] {
        match store.count(table).await {
            Ok(rows) => info!(table, rows, "corpus table ready"),
            Err(e) => warn!(table, error = %e, "corpus table unavailable"),
        }
    }

    let embedder = Arc::new(RemoteEmbedder::new(
        embed_url,
        embed_model,
        api_key,
        EMBED_DIM as usize,
    ));
    Ok(Arc::new(RetrievalEngine::new(Arc::new(store), embedder)))
}
