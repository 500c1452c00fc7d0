use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::{collections::HashMap, fs::File, path::Path};
use tracing::{debug, info};

use crate::record::{coerce_human_agree, coerce_num_tokens, Record};

/// Header-driven CSV reader producing normalized [`Record`]s lazily, in
/// file order.
///
/// The first line names the columns; each data row is mapped by column
/// name, so column order in the file does not matter and unknown columns
/// are ignored. Rows without a usable `file_id` (blank, or a header row
/// that leaked into the data) are skipped without surfacing an error.
pub struct RecordReader {
    /// Column name → position in the header row. Later duplicates win.
    columns: HashMap<String, usize>,
    rows: StringRecordsIntoIter<File>,
    skipped: u64,
}

impl RecordReader {
    /// Open `path` and read its header row. This is the only fatal failure
    /// of the reader itself; everything row-level degrades or skips.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("opening CSV file {}", path.display()))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        let headers = reader
            .headers()
            .with_context(|| format!("reading CSV header row of {}", path.display()))?
            .clone();
        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.to_string(), idx))
            .collect();

        Ok(Self {
            columns,
            rows: reader.into_records(),
            skipped: 0,
        })
    }

    /// Rows dropped so far because their `file_id` was blank or the header
    /// sentinel.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn field<'r>(&self, row: &'r StringRecord, name: &str) -> Option<&'r str> {
        row.get(*self.columns.get(name)?)
    }

    fn record_from_row(&self, row: &StringRecord) -> Record {
        let text = |name: &str| self.field(row, name).unwrap_or_default().to_string();
        Record {
            file_id: text("file_id"),
            significant_prediction: text("significant_prediction"),
            predicted_music_style: text("predicted_music_style"),
            style_change_timestamps: text("style_change_timestamps"),
            num_tokens: coerce_num_tokens(self.field(row, "num_tokens")),
            confidence_scores: text("confidence_scores"),
            prediction: text("prediction"),
            human_agree: coerce_human_agree(self.field(row, "human_agree")),
        }
    }
}

impl Iterator for RecordReader {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(anyhow::Error::new(e).context("reading CSV row"))),
            };
            let record = self.record_from_row(&row);
            if record.is_valid() {
                return Some(Ok(record));
            }
            self.skipped += 1;
            debug!(file_id = %record.file_id, "skipping row without a usable file_id");
        }
    }
}

/// Collect every loadable record from `path`, propagating row-level CSV
/// errors with file context.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let mut reader = RecordReader::open(path)?;
    let mut records = Vec::new();
    for record in reader.by_ref() {
        records.push(record.with_context(|| format!("reading {}", path.display()))?);
    }
    if reader.skipped() > 0 {
        info!(
            skipped = reader.skipped(),
            "skipped rows without a usable file_id"
        );
    }
    Ok(records)
}
