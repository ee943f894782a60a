//! Batched, bounded-parallel execution of address lookups.
//!
//! Records are split into consecutive batches of `batch_size`. Batches run
//! one after another; inside a batch at most `max_workers` lookups are in
//! flight. After each batch a [`BatchCheckpoint`] is handed to a
//! [`CheckpointObserver`].

use std::collections::HashMap;
use std::time::Instant;

use futures::{StreamExt, stream};
use log::{debug, info, warn};

use crate::{
    AddressRecord, ApiResult, BatchCheckpoint, ErrorKind, Executor, Result, RowId,
    types::EMPTY_ADDRESS_MESSAGE,
};

/// Default number of records per batch, 100.
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Default number of concurrent lookups, 10.
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Receives progress after every batch.
pub trait CheckpointObserver: Send {
    /// Called after batch `checkpoint.last_batch_index` finished.
    ///
    /// `results` holds every result produced so far, in input order.
    ///
    /// # Errors
    ///
    /// An error aborts the run.
    fn on_checkpoint(&mut self, checkpoint: &BatchCheckpoint, results: &[ApiResult]) -> Result<()>;
}

/// Ignores all checkpoints
impl CheckpointObserver for () {
    fn on_checkpoint(&mut self, _: &BatchCheckpoint, _: &[ApiResult]) -> Result<()> {
        Ok(())
    }
}

impl<F> CheckpointObserver for F
where
    F: FnMut(&BatchCheckpoint, &[ApiResult]) -> Result<()> + Send,
{
    fn on_checkpoint(&mut self, checkpoint: &BatchCheckpoint, results: &[ApiResult]) -> Result<()> {
        self(checkpoint, results)
    }
}

/// Runs an [`Executor`] over many records
#[derive(Debug, Clone)]
pub struct BatchDispatcher<E> {
    executor: E,
    batch_size: usize,
    max_workers: usize,
}

impl<E: Executor> BatchDispatcher<E> {
    /// Create a new dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`] if `batch_size` or `max_workers`
    /// is zero.
    pub fn new(executor: E, batch_size: usize, max_workers: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(ErrorKind::config("batch size must be at least 1"));
        }
        if max_workers == 0 {
            return Err(ErrorKind::config("max workers must be at least 1"));
        }
        Ok(Self {
            executor,
            batch_size,
            max_workers,
        })
    }

    /// The wrapped executor
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Resolve all `records`.
    ///
    /// Returns exactly one result per record, in input order. Failed lookups
    /// are reported as results, not as errors.
    ///
    /// # Errors
    ///
    /// Only fails if the observer fails.
    pub async fn run<O>(&self, records: &[AddressRecord], observer: &mut O) -> Result<Vec<ApiResult>>
    where
        O: CheckpointObserver + ?Sized,
    {
        let start = Instant::now();
        let total = records.len();
        let batches = total.div_ceil(self.batch_size);
        let mut results = Vec::with_capacity(total);

        for (index, batch) in records.chunks(self.batch_size).enumerate() {
            debug!(
                "Processing batch {}/{batches} ({} records)",
                index + 1,
                batch.len()
            );
            results.extend(self.run_batch(batch).await);

            let checkpoint = BatchCheckpoint::new(results.len(), total, index, start.elapsed());
            info!("{checkpoint}");
            observer.on_checkpoint(&checkpoint, &results)?;
        }

        Ok(results)
    }

    /// Run one batch with at most `max_workers` lookups in flight.
    ///
    /// The stream of lookups is created and dropped within this call, so no
    /// work outlives its batch.
    async fn run_batch(&self, batch: &[AddressRecord]) -> Vec<ApiResult> {
        let mut completed: HashMap<RowId, ApiResult> = stream::iter(batch)
            .map(|record| async move { (record.row_id, self.resolve(record).await) })
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        batch
            .iter()
            .map(|record| {
                completed.remove(&record.row_id).unwrap_or_else(|| {
                    ApiResult::transport_error(record.row_id, "No result produced")
                })
            })
            .collect()
    }

    async fn resolve(&self, record: &AddressRecord) -> ApiResult {
        if record.is_empty() {
            debug!("{record}: {EMPTY_ADDRESS_MESSAGE}, skipping");
            return ApiResult::empty_address(record.row_id);
        }

        match self.executor.execute(record).await {
            Ok(mut result) => {
                if result.row_id != record.row_id {
                    warn!(
                        "{record}: executor returned result for row {}, reassigning",
                        result.row_id
                    );
                    result.row_id = record.row_id;
                }
                result
            }
            Err(e) => {
                warn!("{record}: {e}");
                ApiResult::transport_error(record.row_id, e.to_string())
            }
        }
    }
}
