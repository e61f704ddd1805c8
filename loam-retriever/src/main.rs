//! Command-line front end for the ingestion/retrieval engine.

use anyhow::Context;
use clap::{Parser, Subcommand};
use loam_embed::{EmbedConfig, HttpEmbedProvider};
use loam_retriever::{IngestOrigin, JobStatus, RagEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loam-retriever")]
#[command(about = "Ingest documents and query them by similarity")]
struct Cli {
    /// SQLite database path; omit to use a transient in-memory store.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Base URL of the OpenAI-compatible embedding service.
    #[arg(long, global = true, default_value = "https://api.openai.com/v1")]
    base_url: String,

    /// Embedding model name.
    #[arg(long, global = true, default_value = "text-embedding-3-large")]
    model: String,

    /// Embedding dimension the model produces.
    #[arg(long, global = true, default_value_t = 3072)]
    dimension: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a single file, URL, or pasted text.
    Ingest {
        /// Local file to ingest.
        #[arg(long, conflicts_with_all = ["url", "text"])]
        file: Option<PathBuf>,
        /// Web page to fetch and ingest.
        #[arg(long, conflicts_with = "text")]
        url: Option<String>,
        /// Text to ingest directly.
        #[arg(long)]
        text: Option<String>,
        /// Display name for pasted text.
        #[arg(long)]
        name: Option<String>,
    },
    /// Ingest many files as a background job and wait for it.
    Batch {
        /// Files to ingest.
        files: Vec<PathBuf>,
    },
    /// Retrieve the chunks most similar to a query.
    Query {
        query: String,
        /// Number of chunks to return.
        #[arg(long, default_value_t = loam_retriever::DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// List ingested sources.
    Sources,
    /// Delete a source (by id or source key) and its chunks.
    Delete { id_or_key: String },
    /// Show one job by id, or all jobs.
    Jobs { id: Option<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut config = EmbedConfig::new(&cli.base_url, &cli.model, cli.dimension);
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        config = config.with_api_key(key);
    }
    let provider = Arc::new(HttpEmbedProvider::create(config)?);

    let engine = match &cli.db {
        Some(path) => RagEngine::new(path, provider).await?,
        None => RagEngine::new_memory(provider),
    };

    match cli.command {
        Commands::Ingest {
            file,
            url,
            text,
            name,
        } => {
            let origin = match (file, url, text) {
                (Some(path), _, _) => IngestOrigin::File { path },
                (_, Some(url), _) => IngestOrigin::Url { url },
                (_, _, Some(content)) => IngestOrigin::Text { content, name },
                _ => anyhow::bail!("one of --file, --url, or --text is required"),
            };
            let report = engine.ingest(origin).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Batch { files } => {
            anyhow::ensure!(!files.is_empty(), "no files given");
            let origins = files
                .into_iter()
                .map(|path| IngestOrigin::File { path })
                .collect();
            let id = engine.ingest_batch(origins).await?;
            println!("job {id}");

            loop {
                let job = engine
                    .job_status(&id)
                    .await
                    .context("job disappeared while polling")?;
                match job.status {
                    JobStatus::Completed | JobStatus::Failed => {
                        println!("{}", serde_json::to_string_pretty(&job)?);
                        break;
                    }
                    _ => {
                        eprintln!("{}% done", job.progress);
                        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
                    }
                }
            }
            engine.shutdown().await;
        }
        Commands::Query { query, top_k } => {
            let results = engine.retrieve(&query, top_k).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Sources => {
            let sources = engine.list_sources().await?;
            println!("{}", serde_json::to_string_pretty(&sources)?);
        }
        Commands::Delete { id_or_key } => {
            if engine.delete_source(&id_or_key).await? {
                println!("deleted {id_or_key}");
            } else {
                println!("no source matched {id_or_key}");
            }
        }
        Commands::Jobs { id } => match id {
            Some(id) => match engine.job_status(&id).await {
                Some(job) => println!("{}", serde_json::to_string_pretty(&job)?),
                None => println!("no job {id}"),
            },
            None => {
                let jobs = engine.list_jobs().await;
                println!("{}", serde_json::to_string_pretty(&jobs)?);
            }
        },
    }

    Ok(())
}
