//! Concurrent analysis of several files

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{PipelineError, Result};
use crate::pipeline::EmotionPipeline;
use crate::report::{BatchFailure, BatchItem, BatchReport, EmotionReport};

/// Analyze up to `max_files` files on blocking tasks
///
/// Results keep the input order. A file that fails is logged and listed in
/// `failures`; it does not abort the batch.
pub async fn analyze_batch(
    pipeline: Arc<EmotionPipeline>,
    files: Vec<PathBuf>,
    max_files: usize,
    include_descriptors: bool,
) -> Result<BatchReport> {
    if files.len() > max_files {
        return Err(PipelineError::BatchTooLarge {
            count: files.len(),
            limit: max_files,
        });
    }

    info!("Analyzing {} files", files.len());
    let tasks: Vec<_> = files
        .into_iter()
        .map(|path| {
            let pipeline = Arc::clone(&pipeline);
            let file = path.display().to_string();
            let handle = tokio::task::spawn_blocking(move || {
                pipeline.analyze_file(&path, include_descriptors)
            });
            (file, handle)
        })
        .collect();

    let (results, failures) = collect_outcomes(tasks).await;
    let report = BatchReport::new(results, failures);
    info!(
        "Batch done: {} analyzed, {} failed, average satisfaction {:.2}",
        report.results.len(),
        report.failures.len(),
        report.average_satisfaction
    );
    Ok(report)
}

/// Await every task in order, splitting reports from failures
async fn collect_outcomes(
    tasks: Vec<(String, JoinHandle<Result<EmotionReport>>)>,
) -> (Vec<BatchItem>, Vec<BatchFailure>) {
    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (file, handle) in tasks {
        match handle.await {
            Ok(Ok(report)) => results.push(BatchItem { file, report }),
            Ok(Err(e)) => {
                error!("Error processing {}: {}", file, e);
                failures.push(BatchFailure {
                    file,
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                });
            }
            Err(e) => {
                error!("Batch task for {} failed: {}", file, e);
                failures.push(BatchFailure {
                    file,
                    kind: "task".to_string(),
                    message: e.to_string(),
                });
            }
        }
    }
    (results, failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_panicked_task_names_its_file() {
        let tasks: Vec<(String, JoinHandle<Result<EmotionReport>>)> = vec![
            (
                "first.wav".to_string(),
                tokio::task::spawn_blocking(|| -> Result<EmotionReport> {
                    panic!("decoder crashed")
                }),
            ),
            (
                "second.wav".to_string(),
                tokio::task::spawn_blocking(|| -> Result<EmotionReport> {
                    Err(PipelineError::FileTooLarge { size: 20, limit: 10 })
                }),
            ),
        ];

        let (results, failures) = collect_outcomes(tasks).await;
        assert!(results.is_empty());
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].file, "first.wav");
        assert_eq!(failures[0].kind, "task");
        assert_eq!(failures[1].file, "second.wav");
        assert_eq!(failures[1].kind, "file_too_large");
    }
}
