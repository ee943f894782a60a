//! End-to-end processing of a dataset.
//!
//! Load records, resolve them with a [`BatchDispatcher`], judge every
//! result, join everything back onto the input rows and write the output.
//! While the run is in progress, the latest partial output is kept next to
//! the output file (see [`output::temp_path`]).

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::{
    ApiResult, BatchCheckpoint, BatchDispatcher, Executor, Result, RowId, ValidationVerdict,
    dataset::{ColumnMapping, Dataset, InputRow},
    dispatcher::CheckpointObserver,
    merge::{MergeWarning, join, merge},
    output, parser,
};

/// An input row with everything learned about it
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    /// The row as read
    pub row: InputRow,
    /// What the API returned
    pub result: ApiResult,
    /// The judgement derived from `result`
    pub verdict: ValidationVerdict,
}

/// Outcome of a [`Pipeline`] run
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Joined rows, in input order
    pub rows: Vec<EnrichedRow>,
    /// Number of input rows
    pub total: usize,
    /// Input rows that did not make it into the output
    pub unmatched_original: Vec<RowId>,
    /// Results without an input row
    pub unmatched_results: Vec<RowId>,
    /// Set if the join was not complete
    pub warning: Option<MergeWarning>,
    /// Where the output was written
    pub output: Option<PathBuf>,
    /// Wall-clock time of the run
    pub duration: Duration,
}

impl Report {
    /// Rows judged valid
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.rows.iter().filter(|r| r.verdict.is_valid).count()
    }

    /// Rows judged invalid, failed lookups included
    #[must_use]
    pub fn invalid_count(&self) -> usize {
        self.rows.len() - self.valid_count()
    }

    /// Returns `true` if every input row is in the output and valid
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.warning.is_none() && self.rows.iter().all(|r| r.verdict.is_valid)
    }
}

/// Runs a whole dataset through an [`Executor`]
#[derive(Debug, Clone)]
pub struct Pipeline<E> {
    dispatcher: BatchDispatcher<E>,
    output: Option<PathBuf>,
}

impl<E: Executor> Pipeline<E> {
    /// Create a pipeline that does not write any files.
    ///
    /// # Errors
    ///
    /// See [`BatchDispatcher::new`].
    pub fn new(executor: E, batch_size: usize, max_workers: usize) -> Result<Self> {
        Ok(Self {
            dispatcher: BatchDispatcher::new(executor, batch_size, max_workers)?,
            output: None,
        })
    }

    /// Write the output to `path` and keep partial output during the run
    #[must_use]
    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.output = Some(path);
        self
    }

    /// Process `dataset`.
    ///
    /// `observer` is notified after every batch; its checkpoints carry the
    /// location of the partial output if an output path is set.
    ///
    /// # Errors
    ///
    /// Fails if the column mapping does not fit the dataset, if a file cannot
    /// be written or if the observer fails. Failed lookups are not errors.
    pub async fn run<O>(
        &self,
        dataset: &Dataset,
        mapping: &ColumnMapping,
        observer: &mut O,
    ) -> Result<Report>
    where
        O: CheckpointObserver + ?Sized,
    {
        let start = Instant::now();
        let records = dataset.records(mapping)?;
        info!("Processing {} records", records.len());

        let mut partial = PartialOutput {
            dataset,
            output: self.output.as_deref(),
            inner: observer,
        };
        let results = self.dispatcher.run(&records, &mut partial).await?;

        let judged: Vec<(ApiResult, ValidationVerdict)> = results
            .into_iter()
            .map(|result| {
                let verdict = parser::verdict(&result);
                (result, verdict)
            })
            .collect();
        let outcome = merge(dataset.rows().iter().collect(), judged);
        let warning = outcome.warning();

        if let Some(path) = &self.output {
            output::write_output(
                path,
                dataset.headers(),
                outcome
                    .rows
                    .iter()
                    .map(|(row, (result, verdict))| (*row, result, verdict)),
            )?;
            output::remove_temp(path)?;
            info!("Results saved to {}", path.display());
        }

        let rows = outcome
            .rows
            .into_iter()
            .map(|(row, (result, verdict))| EnrichedRow {
                row: row.clone(),
                result,
                verdict,
            })
            .collect();

        Ok(Report {
            rows,
            total: dataset.len(),
            unmatched_original: outcome.unmatched_original,
            unmatched_results: outcome.unmatched_results,
            warning,
            output: self.output.clone(),
            duration: start.elapsed(),
        })
    }
}

/// Persists the results so far before passing the checkpoint on
struct PartialOutput<'a, O: ?Sized> {
    dataset: &'a Dataset,
    output: Option<&'a Path>,
    inner: &'a mut O,
}

impl<O: CheckpointObserver + ?Sized> CheckpointObserver for PartialOutput<'_, O> {
    fn on_checkpoint(&mut self, checkpoint: &BatchCheckpoint, results: &[ApiResult]) -> Result<()> {
        let Some(output) = self.output else {
            return self.inner.on_checkpoint(checkpoint, results);
        };

        let judged: Vec<(&ApiResult, ValidationVerdict)> = results
            .iter()
            .map(|result| (result, parser::verdict(result)))
            .collect();
        // Rows of later batches have no result yet
        let rows: Vec<&InputRow> = self.dataset.rows().iter().collect();
        let outcome = join(rows, judged);

        let temp = output::temp_path(output);
        output::write_output(
            &temp,
            self.dataset.headers(),
            outcome
                .rows
                .iter()
                .map(|(row, (result, verdict))| (*row, *result, verdict)),
        )?;
        debug!("Saved intermediate results to {}", temp.display());

        let checkpoint = checkpoint.clone().with_partial_output(temp);
        self.inner.on_checkpoint(&checkpoint, results)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;
    use crate::{AddressRecord, ApiStatus, Confidence, ErrorKind};

    /// Answers by street name, like a canned API
    struct CannedExecutor;

    #[async_trait]
    impl Executor for CannedExecutor {
        async fn execute(&self, record: &AddressRecord) -> Result<ApiResult> {
            let id = record.row_id;
            Ok(if record.address.starts_with("1 Main St") {
                let mut result = ApiResult::empty(id, ApiStatus::Ok)
                    .with_raw(json!({"status": "OK", "results": [{}]}));
                result.formatted_address = Some("1 Main St, Springfield, IL 62701, USA".into());
                result.place_id = Some("abc".into());
                result.result_count = 1;
                result
            } else if record.address.starts_with("Nowhere") {
                ApiResult::empty(id, ApiStatus::ZeroResults)
                    .with_raw(json!({"status": "ZERO_RESULTS", "results": []}))
            } else if record.address.starts_with("Broken") {
                ApiResult::http_error(id, 500)
            } else {
                return Err(ErrorKind::ValidationApi("unexpected address".into()));
            })
        }
    }

    /// Collects the warnings logged on the current thread
    mod warnings {
        use std::cell::RefCell;

        use log::{Level, LevelFilter, Log, Metadata, Record};

        thread_local! {
            static CAPTURED: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
        }

        struct Capture;

        impl Log for Capture {
            fn enabled(&self, metadata: &Metadata<'_>) -> bool {
                metadata.level() <= Level::Warn
            }

            fn log(&self, record: &Record<'_>) {
                if self.enabled(record.metadata()) {
                    CAPTURED.with_borrow_mut(|captured| {
                        if let Some(captured) = captured {
                            captured.push(record.args().to_string());
                        }
                    });
                }
            }

            fn flush(&self) {}
        }

        static LOGGER: Capture = Capture;

        pub(super) fn capture() {
            // Another test may have installed it already
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(LevelFilter::Warn);
            CAPTURED.with_borrow_mut(|captured| *captured = Some(Vec::new()));
        }

        pub(super) fn take() -> Vec<String> {
            CAPTURED.with_borrow_mut(|captured| captured.take().unwrap_or_default())
        }
    }

    const INPUT: &str = "\
id,address
a,\"1 Main St, Springfield\"
b,Nowhere Lane
c,Broken Rd
d,
";

    fn dataset() -> Dataset {
        Dataset::from_reader(INPUT.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let pipeline = Pipeline::new(CannedExecutor, 2, 2).unwrap();
        let report = pipeline
            .run(&dataset(), &ColumnMapping::full("address"), &mut ())
            .await
            .unwrap();

        assert_eq!(report.total, 4);
        assert_eq!(report.warning, None);
        let summary: Vec<_> = report
            .rows
            .iter()
            .map(|r| (r.row.values[0].as_str(), r.verdict.is_valid, r.verdict.error_summary()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a", true, None),
                ("b", false, Some("ZERO_RESULTS".to_string())),
                ("c", false, Some("HTTP Error: 500".to_string())),
                ("d", false, Some("Empty address".to_string())),
            ]
        );
        assert_eq!(report.rows[0].verdict.confidence, Confidence::High);
        assert_eq!(report.valid_count(), 1);
        assert_eq!(report.invalid_count(), 3);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_output_and_partial_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("validated.csv");
        let pipeline = Pipeline::new(CannedExecutor, 3, 2)
            .unwrap()
            .with_output(path.clone());

        let mut partial_rows = Vec::new();
        let mut observer = |checkpoint: &BatchCheckpoint, _: &[ApiResult]| -> Result<()> {
            let temp = checkpoint.partial_output_path.as_ref().unwrap();
            let lines = fs::read_to_string(temp).unwrap().lines().count();
            partial_rows.push(lines - 1);
            Ok(())
        };

        let report = pipeline
            .run(&dataset(), &ColumnMapping::full("address"), &mut observer)
            .await
            .unwrap();

        assert_eq!(partial_rows, vec![3, 4]);
        assert_eq!(report.output.as_deref(), Some(path.as_path()));
        assert!(!output::temp_path(&path).exists());

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "id");
        assert_eq!(&headers[2], "is_valid");
        let valid: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[2].to_string())
            .collect();
        assert_eq!(valid, vec!["true", "false", "false", "false"]);
    }

    #[tokio::test]
    async fn test_partial_output_does_not_warn() {
        let data = "address\n1 Main St\n\"1 Main St, Apt 2\"\n\"1 Main St, Apt 3\"\n\"1 Main St, Apt 4\"\n";
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        let dir = tempdir().unwrap();
        let pipeline = Pipeline::new(CannedExecutor, 1, 1)
            .unwrap()
            .with_output(dir.path().join("validated.csv"));

        warnings::capture();
        let report = pipeline
            .run(&dataset, &ColumnMapping::full("address"), &mut ())
            .await
            .unwrap();
        let logged = warnings::take();

        assert_eq!(report.warning, None);
        assert!(report.is_success());
        assert_eq!(logged, Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_failed_run_keeps_partial_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("validated.csv");
        let pipeline = Pipeline::new(CannedExecutor, 1, 1)
            .unwrap()
            .with_output(path.clone());

        let mut checkpoints = 0;
        let mut observer = |_: &BatchCheckpoint, _: &[ApiResult]| -> Result<()> {
            checkpoints += 1;
            if checkpoints == 2 {
                return Err(ErrorKind::config("interrupted"));
            }
            Ok(())
        };

        let err = pipeline
            .run(&dataset(), &ColumnMapping::full("address"), &mut observer)
            .await
            .unwrap_err();

        assert_eq!(err, ErrorKind::config("interrupted"));
        assert!(!path.exists());
        let temp = output::temp_path(&path);
        let ids: Vec<String> = csv::Reader::from_path(&temp)
            .unwrap()
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_reported() {
        let data = "address\nSomewhere else\n";
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        let report = Pipeline::new(CannedExecutor, 10, 1)
            .unwrap()
            .run(&dataset, &ColumnMapping::full("address"), &mut ())
            .await
            .unwrap();

        let row = &report.rows[0];
        assert_eq!(row.result.status, ApiStatus::TransportError);
        assert_eq!(
            row.verdict.errors,
            vec!["Unusable API response: unexpected address".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_columns_fail_before_any_request() {
        let err = Pipeline::new(CannedExecutor, 10, 1)
            .unwrap()
            .run(&dataset(), &ColumnMapping::full("street"), &mut ())
            .await
            .unwrap_err();
        assert!(matches!(err, ErrorKind::MissingColumns { .. }));
    }
}
