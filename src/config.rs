use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::path::PathBuf;

/// Defaults shared by the uploader and the SQL generator.
pub const DEFAULT_TABLE: &str = "midi_files";
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Environment fallbacks for the hosted-project credentials.
pub const SUPABASE_URL_VAR: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_VAR: &str = "SUPABASE_KEY";

#[derive(Parser, Debug)]
#[command(
    name = "midiloader",
    about = "Load MIDI classification results from a CSV export into the hosted table"
)]
pub struct UploadArgs {
    /// CSV export with the classification results
    pub csv: PathBuf,

    /// Rows per insert call
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Target table name
    #[arg(long, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Project base URL; falls back to $SUPABASE_URL
    #[arg(long)]
    pub supabase_url: Option<String>,

    /// Project key; falls back to $SUPABASE_KEY
    #[arg(long)]
    pub supabase_key: Option<String>,
}

/// Where the hosted table lives. Flags win over the environment; a value
/// missing from both is a startup error, not a mid-run one.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub url: String,
    pub key: String,
}

impl UploadArgs {
    pub fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            url: resolve(self.supabase_url.clone(), SUPABASE_URL_VAR)?,
            key: resolve(self.supabase_key.clone(), SUPABASE_KEY_VAR)?,
        })
    }
}

fn resolve(flag: Option<String>, var: &str) -> Result<String> {
    match flag {
        Some(value) => Ok(value),
        None => env::var(var).with_context(|| format!("{var} is not set and no flag was given")),
    }
}
