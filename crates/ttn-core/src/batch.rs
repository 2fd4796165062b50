//! Bounded-concurrency batch processing.
//!
//! Each document runs on the blocking pool under a semaphore permit
//! and a wall-clock budget. One bad document never takes down the
//! batch; the report lists outcomes in submission order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::info;

use crate::error::ErrorKind;
use crate::models::config::BatchConfig;
use crate::models::document::{BatchReport, ProcessOutcome};
use crate::pipeline::Pipeline;
use crate::raster::DocumentKind;

/// One document submitted to a batch.
pub struct BatchItem {
    pub document_id: String,
    pub data: Vec<u8>,
    pub kind: Option<DocumentKind>,
}

/// Run one document on the blocking pool under a wall-clock budget.
/// Both batch workers and single-document callers go through here, so
/// the budget applies regardless of how a document arrives.
pub async fn process_with_timeout(
    pipeline: Arc<Pipeline>,
    item: BatchItem,
    timeout_secs: u64,
) -> ProcessOutcome {
    let document_id = item.document_id.clone();
    let work = tokio::task::spawn_blocking(move || {
        pipeline.process(&item.document_id, &item.data, item.kind)
    });

    match tokio::time::timeout(Duration::from_secs(timeout_secs), work).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_err)) => {
            ProcessOutcome::failed(document_id, ErrorKind::Internal, join_err.to_string())
        }
        Err(_) => ProcessOutcome::failed(
            document_id,
            ErrorKind::RecognitionTimeout,
            format!("document exceeded the {} s budget", timeout_secs),
        ),
    }
}

pub struct BatchProcessor {
    pipeline: Arc<Pipeline>,
    max_in_flight: usize,
    timeout_secs: u64,
}

impl BatchProcessor {
    pub fn new(pipeline: Pipeline, config: &BatchConfig) -> Self {
        BatchProcessor {
            pipeline: Arc::new(pipeline),
            max_in_flight: config.max_in_flight.max(1),
            timeout_secs: config.document_timeout_secs,
        }
    }

    /// Process a batch. The returned report preserves submission
    /// order regardless of completion order.
    pub async fn process(&self, items: Vec<BatchItem>) -> BatchReport {
        let total = items.len();
        info!("starting batch of {} documents, {} in flight", total, self.max_in_flight);

        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut handles = Vec::with_capacity(total);

        for item in items {
            let pipeline = Arc::clone(&self.pipeline);
            let semaphore = Arc::clone(&semaphore);
            let timeout_secs = self.timeout_secs;
            // Kept outside the task so even a join failure stays
            // attributed to its document.
            let document_id = item.document_id.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return ProcessOutcome::failed(
                            item.document_id,
                            ErrorKind::Internal,
                            "worker pool closed".to_string(),
                        );
                    }
                };
                process_with_timeout(pipeline, item, timeout_secs).await
            });
            handles.push((document_id, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (document_id, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_err) => outcomes.push(ProcessOutcome::failed(
                    document_id,
                    ErrorKind::Internal,
                    join_err.to_string(),
                )),
            }
        }

        let report = BatchReport::from_outcomes(outcomes);
        info!("batch finished: {} processed, {} failed", report.processed, report.failed);
        report
    }
}
