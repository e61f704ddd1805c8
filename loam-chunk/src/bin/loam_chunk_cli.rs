use clap::{Parser, Subcommand};
use loam_chunk::{ChunkConfig, parse_vtt, split_text};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};

/// Inspect chunker and subtitle-parser output as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split text into overlapping chunks.
    Split {
        /// Path to the input text file. If not provided, reads from stdin.
        #[arg(short, long)]
        input: Option<String>,

        /// Maximum characters per chunk.
        #[arg(long, default_value_t = 1000)]
        chunk_size: usize,

        /// Characters shared between consecutive chunks.
        #[arg(long, default_value_t = 200)]
        overlap: usize,
    },
    /// Flatten a WebVTT caption track into timestamped text.
    Vtt {
        /// Path to the input .vtt file. If not provided, reads from stdin.
        #[arg(short, long)]
        input: Option<String>,
    },
}

#[derive(Serialize)]
struct SplitOutput {
    chunk_count: usize,
    chunks: Vec<String>,
}

fn read_input(path: Option<String>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Split {
            input,
            chunk_size,
            overlap,
        } => {
            let content = read_input(input)?;
            let config = ChunkConfig::new(chunk_size, overlap)?;
            let chunks = split_text(&content, &config)?;
            let output = SplitOutput {
                chunk_count: chunks.len(),
                chunks,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Vtt { input } => {
            let content = read_input(input)?;
            println!("{}", serde_json::to_string_pretty(&parse_vtt(&content))?);
        }
    }

    Ok(())
}
