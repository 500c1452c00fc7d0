use anyhow::Result;
use clap::Parser;
use midiloader::{config, ingest, sqlfile};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Render the classification CSV into numbered multi-row INSERT files
/// (`insert_chunk_<N>.sql`) for manual execution in a SQL console.
#[derive(Parser, Debug)]
struct Args {
    /// CSV export with the classification results
    csv: PathBuf,

    /// Value rows per INSERT statement
    #[arg(long, default_value_t = config::DEFAULT_BATCH_SIZE)]
    chunk_size: usize,

    /// Table name inside the generated statements
    #[arg(long, default_value = config::DEFAULT_TABLE)]
    table: String,

    /// Directory the numbered .sql files are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();

    info!(csv = %args.csv.display(), "reading classification CSV");
    let records = ingest::read_records(&args.csv)?;
    if records.is_empty() {
        warn!("no valid records found; nothing to generate");
        return Ok(());
    }
    info!(records = records.len(), "parsed valid records");

    let written = sqlfile::write_sql_chunks(&records, &args.table, args.chunk_size, &args.out_dir)?;
    for path in &written {
        info!(path = %path.display(), "wrote SQL chunk");
    }
    info!(
        files = written.len(),
        rows = records.len(),
        out_dir = %args.out_dir.display(),
        "all done"
    );
    Ok(())
}
