use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::record::Record;

pub mod supabase;

/// A destination that accepts batches of normalized records. An `Err` marks
/// the whole batch as failed; partial application inside a batch is the
/// sink's concern and is not tracked here.
#[async_trait]
pub trait RowSink {
    async fn insert_rows(&self, rows: &[Record]) -> Result<()>;
}

/// One failed batch, keyed by its 1-based position in the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("batch {batch}: {message}")]
pub struct BatchError {
    pub batch: usize,
    pub message: String,
}

/// What a full upload pass did. Every batch is attempted exactly once
/// whether or not earlier ones failed, so the numbers always cover the
/// whole input.
#[derive(Debug, Default)]
pub struct UploadOutcome {
    pub total_uploaded: usize,
    pub batches_attempted: usize,
    pub errors: Vec<BatchError>,
}

/// Submit `records` to `sink` in contiguous batches of `batch_size`
/// (minimum 1), in input order, one call per batch. A failed batch is
/// recorded and the loop moves on; nothing is retried or rolled back.
/// Re-running after a partial failure re-submits every batch, so the sink
/// sees previously accepted rows again unless it enforces uniqueness.
pub async fn upload_in_batches<S: RowSink + ?Sized>(
    sink: &S,
    records: &[Record],
    batch_size: usize,
) -> UploadOutcome {
    let batch_size = batch_size.max(1);
    let mut outcome = UploadOutcome::default();

    for (idx, batch) in records.chunks(batch_size).enumerate() {
        let batch_num = idx + 1;
        outcome.batches_attempted += 1;
        info!(batch = batch_num, rows = batch.len(), "uploading batch");
        match sink.insert_rows(batch).await {
            Ok(()) => {
                outcome.total_uploaded += batch.len();
                info!(batch = batch_num, uploaded = outcome.total_uploaded, "batch accepted");
            }
            Err(e) => {
                error!(batch = batch_num, "batch failed: {e:#}");
                outcome.errors.push(BatchError {
                    batch: batch_num,
                    message: format!("{e:#}"),
                });
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::Mutex;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record {
                file_id: format!("midi_{i:04}.mid"),
                significant_prediction: "true".into(),
                predicted_music_style: "jazz".into(),
                style_change_timestamps: "[]".into(),
                num_tokens: Some(i as i64),
                confidence_scores: "[]".into(),
                prediction: "jazz".into(),
                human_agree: Some(true),
            })
            .collect()
    }

    /// In-memory sink that fails on the given 1-based call numbers.
    struct FlakySink {
        accepted: Mutex<Vec<Record>>,
        calls: Mutex<usize>,
        fail_on: Vec<usize>,
    }

    impl FlakySink {
        fn new(fail_on: Vec<usize>) -> Self {
            Self {
                accepted: Mutex::new(Vec::new()),
                calls: Mutex::new(0),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl RowSink for FlakySink {
        async fn insert_rows(&self, rows: &[Record]) -> Result<()> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if self.fail_on.contains(&call) {
                bail!("injected failure");
            }
            self.accepted.lock().unwrap().extend_from_slice(rows);
            Ok(())
        }
    }

    #[tokio::test]
    async fn splits_into_ceil_sized_batches_preserving_order() {
        let input = records(250);
        let sink = FlakySink::new(vec![]);

        let outcome = upload_in_batches(&sink, &input, 100).await;
        assert_eq!(outcome.batches_attempted, 3);
        assert_eq!(outcome.total_uploaded, 250);
        assert!(outcome.errors.is_empty());
        assert_eq!(*sink.accepted.lock().unwrap(), input);
    }

    #[tokio::test]
    async fn failed_batch_is_recorded_and_the_run_continues() {
        let input = records(250);
        let sink = FlakySink::new(vec![2]);

        let outcome = upload_in_batches(&sink, &input, 100).await;
        assert_eq!(outcome.batches_attempted, 3);
        assert_eq!(outcome.total_uploaded, 150);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].batch, 2);
        assert!(outcome.errors[0].message.contains("injected failure"));

        // batches 1 and 3 made it through, the failed slice is absent
        let accepted = sink.accepted.lock().unwrap();
        assert_eq!(accepted.len(), 150);
        assert_eq!(accepted[..100], input[..100]);
        assert_eq!(accepted[100..], input[200..]);
    }

    #[tokio::test]
    async fn rerunning_resubmits_every_batch() {
        let input = records(30);
        let sink = FlakySink::new(vec![]);

        upload_in_batches(&sink, &input, 10).await;
        upload_in_batches(&sink, &input, 10).await;

        // no dedup at this layer: a rerun doubles what the sink saw
        assert_eq!(sink.accepted.lock().unwrap().len(), 60);
    }

    #[tokio::test]
    async fn batch_size_zero_degrades_to_single_row_batches() {
        let input = records(3);
        let sink = FlakySink::new(vec![]);

        let outcome = upload_in_batches(&sink, &input, 0).await;
        assert_eq!(outcome.batches_attempted, 3);
        assert_eq!(outcome.total_uploaded, 3);
    }

    #[tokio::test]
    async fn short_input_fits_one_batch() {
        let input = records(5);
        let sink = FlakySink::new(vec![]);

        let outcome = upload_in_batches(&sink, &input, 100).await;
        assert_eq!(outcome.batches_attempted, 1);
        assert_eq!(outcome.total_uploaded, 5);
    }

    #[tokio::test]
    async fn empty_input_attempts_nothing() {
        let sink = FlakySink::new(vec![]);
        let outcome = upload_in_batches(&sink, &[], 100).await;
        assert_eq!(outcome.batches_attempted, 0);
        assert_eq!(outcome.total_uploaded, 0);
        assert!(outcome.errors.is_empty());
    }
}
