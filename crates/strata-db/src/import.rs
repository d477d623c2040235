//! JSON Lines import for items and queue rows.
//!
//! One JSON object per line. A line that fails to parse or insert is counted
//! and reported with its line number; the remaining lines are still imported.

use std::path::Path;

use serde::de::DeserializeOwned;
use strata_core::entities::{NewItem, NewQueueItem};
use strata_core::responses::{EnqueueReport, ImportReport};
use tracing::{info, warn};

use crate::error::DatabaseError;
use crate::repos::queue::{QueueClock, QueuePolicy, validate_priority};
use crate::service::StrataService;

/// Parsed lines, each tagged with its 1-based line number.
type Lines<T> = Vec<(usize, Result<T, String>)>;

fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Lines<T>, DatabaseError> {
    let iter = serde_jsonlines::json_lines::<T, _>(path).map_err(|e| {
        DatabaseError::Validation(format!("cannot read {}: {e}", path.display()))
    })?;
    Ok(iter
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.map_err(|e| e.to_string())))
        .collect())
}

impl StrataService {
    /// Insert every item in a JSON Lines file.
    pub async fn import_items(&self, path: &Path) -> Result<ImportReport, DatabaseError> {
        let mut report = ImportReport::default();
        for (line, parsed) in read_lines::<NewItem>(path)? {
            let outcome = match parsed {
                Ok(item) => self.insert_item(&item).await.map_err(|e| e.to_string()),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(item) => {
                    report.inserted += 1;
                    report.inserted_ids.push(item.id);
                }
                Err(reason) => {
                    warn!(line, %reason, "item import: line skipped");
                    report.errors += 1;
                    report.error_details.push(format!("line {line}: {reason}"));
                }
            }
        }
        info!(
            inserted = report.inserted,
            errors = report.errors,
            "item import finished"
        );
        Ok(report)
    }

    /// Enqueue every row of a JSON Lines file. Parse failures count as errors.
    ///
    /// Error details name the file line, whether the line failed to parse
    /// or its row was rejected.
    pub async fn enqueue_jsonl(
        &self,
        path: &Path,
        priority: Option<f64>,
        policy: &QueuePolicy,
    ) -> Result<EnqueueReport, DatabaseError> {
        validate_priority(priority)?;
        let lines = read_lines::<NewQueueItem>(path)?;
        let mut clock = QueueClock::starting_now();
        let mut report = EnqueueReport::default();
        for (line, parsed) in lines {
            let label = format!("line {line}");
            match parsed {
                Ok(row) => {
                    self.enqueue_row(row, &label, priority, clock.tick(), policy, &mut report)
                        .await;
                }
                Err(reason) => {
                    warn!(line, %reason, "queue import: line skipped");
                    report.errors += 1;
                    report.error_details.push(format!("{label}: {reason}"));
                }
            }
        }
        info!(
            inserted = report.inserted,
            errors = report.errors,
            "queue import finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_service;
    use std::io::Write;

    #[tokio::test]
    async fn import_items_counts_bad_lines() {
        let svc = test_service().await;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"title":"Canal mania","content":"Speculative canal building in Britain.","source_identifier":"history","collected_at":"2026-03-01T08:00:00Z","newsletter_date":"2026-03-01"}}"#
        )
        .unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(
            file,
            r#"{{"title":"","source_identifier":"x","collected_at":"2026-03-01T08:00:00Z","newsletter_date":"2026-03-01"}}"#
        )
        .unwrap();

        let report = svc.import_items(file.path()).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.errors, 2);
        assert!(report.error_details[0].starts_with("line 2"));
        assert!(report.error_details[1].starts_with("line 3"));
    }

    #[tokio::test]
    async fn enqueue_jsonl_merges_parse_errors() {
        let svc = test_service().await;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"title":"Fab subsidies","source_identifier":"semianalysis","synthesis_score":6}}"#
        )
        .unwrap();
        writeln!(file, r#"{{"title": 3}}"#).unwrap();

        let report = svc
            .enqueue_jsonl(file.path(), None, &QueuePolicy::default())
            .await
            .unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.errors, 1);
    }

    #[tokio::test]
    async fn enqueue_jsonl_reports_file_lines() {
        let svc = test_service().await;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(
            file,
            r#"{{"title":"Fab subsidies","source_identifier":"semianalysis","synthesis_score":6}}"#
        )
        .unwrap();
        writeln!(file, r#"{{"title":"","source_identifier":"semianalysis"}}"#).unwrap();

        let report = svc
            .enqueue_jsonl(file.path(), None, &QueuePolicy::default())
            .await
            .unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.errors, 2);
        assert!(report.error_details[0].starts_with("line 1"));
        assert!(report.error_details[1].starts_with("line 3"));
    }

    #[tokio::test]
    async fn missing_file_is_validation_error() {
        let svc = test_service().await;
        let err = svc
            .import_items(Path::new("/nonexistent/items.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }
}
