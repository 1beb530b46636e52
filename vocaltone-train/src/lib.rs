//! vocaltone training
//!
//! Trains the emotion classifier on labeled feature matrices.
//!
//! ## Protocol
//!
//! ```text
//! corpus (features, emotion)
//!   ├─> stratified 70/15/15 split (seeded StdRng)
//!   ├─> Adam, mini-batches of 32, reshuffled every epoch
//!   ├─> after each epoch:
//!   │     ├─> best val accuracy  → CheckpointSink
//!   │     ├─> val loss flat 5    → halve learning rate
//!   │     └─> val loss flat 15   → stop, restore best-loss weights
//!   └─> test partition → EvaluationReport
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use vocaltone_model::LabelSpace;
//! use vocaltone_train::{SaveeLoader, Trainer, TrainerConfig};
//!
//! let corpus = SaveeLoader::default().load("data/SAVEE")?;
//! let trainer = Trainer::new(TrainerConfig::default(), LabelSpace::standard().clone())?;
//! let outcome = trainer.train(corpus.samples)?;
//! outcome.weights.save_json("emotion_model.json")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod callbacks;
pub mod checkpoint;
pub mod config;
pub mod corpus;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod history;
pub mod optimizer;
pub mod split;
pub mod trainer;

pub use callbacks::{
    EarlyStopping, EarlyStoppingDecision, ReduceLrOnPlateau, DEFAULT_PLATEAU_MIN_DELTA,
};
pub use checkpoint::{CheckpointSink, MemoryCheckpointSink};
pub use config::TrainerConfig;
pub use corpus::{emotion_from_filename, LoadedCorpus, SaveeLoader};
pub use dataset::LabeledFeatures;
pub use error::{Result, TrainError};
pub use evaluation::EvaluationReport;
pub use history::{EpochRecord, TrainingHistory};
pub use optimizer::Adam;
pub use split::{stratified_split, DataSplit};
pub use trainer::{SplitSizes, Trainer, TrainingOutcome};
