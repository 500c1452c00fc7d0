use anyhow::Result;
use clap::Parser;
use midiloader::{
    config::UploadArgs,
    ingest,
    upload::{self, supabase::SupabaseTable},
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) resolve config ───────────────────────────────────────────
    let args = UploadArgs::parse();
    let creds = args.credentials()?;
    let table = SupabaseTable::new(&creds.url, &creds.key, &args.table)?;

    // ─── 3) read + normalize the CSV ─────────────────────────────────
    info!(csv = %args.csv.display(), "reading classification CSV");
    let records = ingest::read_records(&args.csv)?;
    if records.is_empty() {
        warn!("no valid records found; exit");
        return Ok(());
    }
    info!(records = records.len(), "parsed valid records");

    // ─── 4) probe the table before writing ───────────────────────────
    table.probe().await?;
    info!(table = %args.table, "table reachable");

    // ─── 5) upload in batches ────────────────────────────────────────
    let outcome = upload::upload_in_batches(&table, &records, args.batch_size).await;

    // ─── 6) summarize ────────────────────────────────────────────────
    info!(
        parsed = records.len(),
        uploaded = outcome.total_uploaded,
        batches = outcome.batches_attempted,
        failed_batches = outcome.errors.len(),
        "upload pass finished"
    );
    for err in &outcome.errors {
        error!("{err}");
    }
    match table.count_rows().await {
        Ok(total) => info!(total, table = %args.table, "rows now in table"),
        Err(e) => warn!("could not fetch table row count: {e:#}"),
    }

    if outcome.total_uploaded > 0 {
        info!(uploaded = outcome.total_uploaded, "all done");
    } else {
        warn!("no records were uploaded");
    }
    Ok(())
}
