use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::record::{Record, TABLE_COLUMNS};

pub mod clean;

/// Filename stem shared by the generator and the post-processor:
/// `insert_chunk_<N>.sql`, N counting from 1 with no gaps.
pub const CHUNK_FILE_PREFIX: &str = "insert_chunk_";
pub const CHUNK_FILE_SUFFIX: &str = ".sql";

/// Escape a string for a single-quoted SQL literal by doubling every
/// embedded quote. The generated files target an execution engine that
/// understands exactly this scheme; no other characters are altered.
pub fn escape_sql_str(s: &str) -> String {
    s.replace('\'', "''")
}

fn sql_str(s: &str) -> String {
    format!("'{}'", escape_sql_str(s))
}

fn sql_int(v: Option<i64>) -> String {
    match v {
        Some(n) => n.to_string(),
        None => "NULL".to_string(),
    }
}

fn sql_bool(v: Option<bool>) -> String {
    match v {
        Some(true) => "true".to_string(),
        Some(false) => "false".to_string(),
        None => "NULL".to_string(),
    }
}

/// Render one parenthesized VALUES row in table column order. Unknown
/// sentinels render as unquoted `NULL`, booleans as unquoted lowercase.
pub fn render_values_row(r: &Record) -> String {
    format!(
        "({}, {}, {}, {}, {}, {}, {}, {})",
        sql_str(&r.file_id),
        sql_str(&r.significant_prediction),
        sql_str(&r.predicted_music_style),
        sql_str(&r.style_change_timestamps),
        sql_int(r.num_tokens),
        sql_str(&r.confidence_scores),
        sql_str(&r.prediction),
        sql_bool(r.human_agree),
    )
}

/// Render one multi-row INSERT statement: header line, one value row per
/// line joined with commas, closing `;` on its own line.
pub fn render_insert(table: &str, records: &[Record]) -> String {
    let values: Vec<String> = records.iter().map(render_values_row).collect();
    format!(
        "INSERT INTO {} ({}) VALUES\n{}\n;",
        table,
        TABLE_COLUMNS.join(", "),
        values.join(",\n"),
    )
}

/// Write `records` as numbered INSERT files under `out_dir`, `chunk_size`
/// value rows per file (minimum 1). Callers pass already-validated records,
/// so exactly `ceil(len / chunk_size)` files come out and chunk N always
/// covers the N-th contiguous slice of valid rows; an empty input writes
/// nothing. Returns the written paths in chunk order.
pub fn write_sql_chunks(
    records: &[Record],
    table: &str,
    chunk_size: usize,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let chunk_size = chunk_size.max(1);
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut written = Vec::new();
    for (idx, chunk) in records.chunks(chunk_size).enumerate() {
        let chunk_num = idx + 1;
        let path = out_dir.join(format!("{CHUNK_FILE_PREFIX}{chunk_num}{CHUNK_FILE_SUFFIX}"));
        fs::write(&path, render_insert(table, chunk))
            .with_context(|| format!("writing {}", path.display()))?;
        debug!(chunk = chunk_num, rows = chunk.len(), path = %path.display(), "wrote SQL chunk");
        written.push(path);
    }
    Ok(written)
}
