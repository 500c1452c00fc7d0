//! Post-processing for generated SQL chunks: some execution consoles choke
//! on multi-line statements, so each chunk gets a single-line `clean_` copy.

use anyhow::{Context, Result};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use super::{CHUNK_FILE_PREFIX, CHUNK_FILE_SUFFIX};

/// Find `insert_chunk_<N>.sql` files under `dir`, sorted by numeric suffix
/// (1, 2, ..., 10 rather than lexicographic). Files whose suffix is not a
/// plain integer are skipped.
pub fn discover_chunks(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}*{}",
        dir.display(),
        CHUNK_FILE_PREFIX,
        CHUNK_FILE_SUFFIX
    );
    let mut chunks: Vec<(u64, PathBuf)> = Vec::new();
    for entry in glob(&pattern).with_context(|| format!("globbing {pattern}"))? {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "skipping unreadable glob entry");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        match chunk_number(&path) {
            Some(num) => chunks.push((num, path)),
            None => continue,
        }
    }
    chunks.sort_by_key(|(num, _)| *num);
    Ok(chunks.into_iter().map(|(_, path)| path).collect())
}

fn chunk_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix(CHUNK_FILE_PREFIX)?.parse().ok()
}

/// Collapse a statement to one line: newlines become spaces and runs of
/// whitespace shrink to a single space. Purely textual, the SQL itself is
/// never parsed.
pub fn flatten_sql(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Write `clean_<name>` single-line copies of the first `limit` chunks in
/// `dir` (numeric order), overwriting any copies from earlier runs. The
/// originals are left untouched. Returns the cleaned paths in order.
pub fn clean_files(dir: &Path, limit: usize) -> Result<Vec<PathBuf>> {
    let chunks = discover_chunks(dir)?;
    debug!(found = chunks.len(), dir = %dir.display(), "discovered SQL chunk files");

    let mut cleaned = Vec::new();
    for path in chunks.into_iter().take(limit) {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let out = path.with_file_name(format!("clean_{name}"));
        fs::write(&out, flatten_sql(&content))
            .with_context(|| format!("writing {}", out.display()))?;
        debug!(from = %path.display(), to = %out.display(), "flattened SQL chunk");
        cleaned.push(out);
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::sqlfile::write_sql_chunks;

    fn record(file_id: &str) -> Record {
        Record {
            file_id: file_id.to_string(),
            significant_prediction: "true".into(),
            predicted_music_style: "jazz".into(),
            style_change_timestamps: "[1.0]".into(),
            num_tokens: Some(7),
            confidence_scores: "[0.9]".into(),
            prediction: "jazz".into(),
            human_agree: None,
        }
    }

    fn touch(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn discovery_orders_numerically_and_skips_strays() {
        let dir = tempfile::tempdir().unwrap();
        for n in [10u64, 2, 1, 11, 3] {
            touch(dir.path(), &format!("insert_chunk_{n}.sql"), "INSERT");
        }
        touch(dir.path(), "insert_chunk_abc.sql", "INSERT");
        touch(dir.path(), "clean_insert_chunk_1.sql", "INSERT");
        touch(dir.path(), "notes.txt", "not sql");

        let found = discover_chunks(dir.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "insert_chunk_1.sql",
                "insert_chunk_2.sql",
                "insert_chunk_3.sql",
                "insert_chunk_10.sql",
                "insert_chunk_11.sql",
            ]
        );
    }

    #[test]
    fn flattening_collapses_all_whitespace_runs() {
        assert_eq!(flatten_sql("a\nb"), "a b");
        assert_eq!(flatten_sql("  a\n\n\tb   c \n"), "a b c");
        assert_eq!(
            flatten_sql("INSERT INTO t (a) VALUES\n('x'),\n('y')\n;"),
            "INSERT INTO t (a) VALUES ('x'), ('y') ;"
        );
    }

    #[test]
    fn cleans_only_the_first_limit_chunks() {
        let dir = tempfile::tempdir().unwrap();
        for n in 1..=7u64 {
            touch(
                dir.path(),
                &format!("insert_chunk_{n}.sql"),
                &format!("INSERT\n({n})\n;"),
            );
        }

        let cleaned = clean_files(dir.path(), 5).unwrap();
        assert_eq!(cleaned.len(), 5);
        for n in 1..=5u64 {
            let out = dir.path().join(format!("clean_insert_chunk_{n}.sql"));
            assert_eq!(fs::read_to_string(&out).unwrap(), format!("INSERT ({n}) ;"));
        }
        assert!(!dir.path().join("clean_insert_chunk_6.sql").exists());
        assert!(!dir.path().join("clean_insert_chunk_7.sql").exists());
    }

    #[test]
    fn reruns_overwrite_earlier_copies() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "insert_chunk_1.sql", "INSERT\n('a')\n;");
        touch(dir.path(), "clean_insert_chunk_1.sql", "stale junk");

        clean_files(dir.path(), 5).unwrap();
        let out = dir.path().join("clean_insert_chunk_1.sql");
        assert_eq!(fs::read_to_string(&out).unwrap(), "INSERT ('a') ;");
    }

    #[test]
    fn originals_survive_and_cleaned_copies_are_one_line() {
        let records: Vec<Record> = (0..120).map(|i| record(&format!("m{i}.mid"))).collect();
        let dir = tempfile::tempdir().unwrap();
        let written = write_sql_chunks(&records, "midi_files", 100, dir.path()).unwrap();
        assert_eq!(written.len(), 2);

        let cleaned = clean_files(dir.path(), 5).unwrap();
        assert_eq!(cleaned.len(), 2);

        for (original, copy) in written.iter().zip(&cleaned) {
            let sql = fs::read_to_string(original).unwrap();
            let flat = fs::read_to_string(copy).unwrap();
            assert!(sql.contains('\n'));
            assert!(!flat.contains('\n'));
            assert_eq!(flat, flatten_sql(&sql));
        }
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(clean_files(dir.path(), 5).unwrap().is_empty());
    }
}
