//! vocaltone command-line front end
//!
//! Wires the audio, feature and model crates into an [`EmotionPipeline`],
//! runs batches concurrently on blocking tasks and drives training jobs
//! that write their artifacts to disk.

pub mod batch;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod training;

pub use batch::analyze_batch;
pub use checkpoint::{FileCheckpointSink, BEST_MODEL_FILE};
pub use config::{AppConfig, TrainingSection};
pub use error::{PipelineError, Result};
pub use pipeline::EmotionPipeline;
pub use report::{BatchFailure, BatchItem, BatchReport, EmotionReport, EmotionStatistics};
pub use training::{run_training, TrainingJob, HISTORY_FILE, LABELS_FILE, MODEL_FILE};
