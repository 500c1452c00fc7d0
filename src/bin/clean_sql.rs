use anyhow::Result;
use clap::Parser;
use midiloader::sqlfile::clean;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Flatten generated `insert_chunk_<N>.sql` files into single-line
/// `clean_` copies for consoles that reject multi-line statements.
#[derive(Parser, Debug)]
struct Args {
    /// Directory holding the generated chunk files
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// How many chunks to flatten, lowest numbers first
    #[arg(long, default_value_t = 5)]
    limit: usize,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();

    let cleaned = clean::clean_files(&args.dir, args.limit)?;
    if cleaned.is_empty() {
        warn!(dir = %args.dir.display(), "no SQL chunk files found");
        return Ok(());
    }
    for path in &cleaned {
        info!(path = %path.display(), "wrote flattened copy");
    }
    info!(files = cleaned.len(), "all done");
    Ok(())
}
