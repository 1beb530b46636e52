//! Mini-batch training loop with early stopping, plateau decay and checkpoints

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::Axis;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vocaltone_model::layers::activation::cross_entropy;
use vocaltone_model::{ClassifierWeights, EmotionNetwork, LabelSpace, WeightsMetadata};

use crate::callbacks::{EarlyStopping, EarlyStoppingDecision, ReduceLrOnPlateau};
use crate::checkpoint::{CheckpointSink, MemoryCheckpointSink};
use crate::config::TrainerConfig;
use crate::dataset::{class_indices, common_shape, stack_batch, LabeledFeatures};
use crate::error::{Result, TrainError};
use crate::evaluation::{argmax, evaluate, EvaluationReport};
use crate::history::{EpochRecord, TrainingHistory};
use crate::optimizer::Adam;
use crate::split::{stratified_split, DataSplit};

/// Everything a finished (or interrupted) run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Weights from the epoch with the lowest validation loss, not the last
    /// epoch, whether the run completed, stopped early or was interrupted
    pub weights: ClassifierWeights,
    /// Last snapshot handed to the checkpoint sink, when the in-memory sink was used
    pub best_accuracy_weights: Option<ClassifierWeights>,
    pub history: TrainingHistory,
    /// Held-out test metrics of `weights`
    pub test_report: EvaluationReport,
    pub split_sizes: SplitSizes,
    /// Training ended because the stop flag was raised
    pub interrupted: bool,
    /// Early stopping fired
    pub stopped_early: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSizes {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

impl From<&DataSplit> for SplitSizes {
    fn from(split: &DataSplit) -> Self {
        Self {
            train: split.train.len(),
            validation: split.validation.len(),
            test: split.test.len(),
        }
    }
}

/// Trains an [`EmotionNetwork`] from labeled feature matrices
pub struct Trainer {
    config: TrainerConfig,
    labels: LabelSpace,
    stop: Option<Arc<AtomicBool>>,
}

impl Trainer {
    pub fn new(config: TrainerConfig, labels: LabelSpace) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            labels,
            stop: None,
        })
    }

    /// Check `flag` between batches and end training once it is set
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    fn should_stop(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Train keeping best-accuracy checkpoints in memory
    pub fn train(&self, corpus: Vec<LabeledFeatures>) -> Result<TrainingOutcome> {
        let mut sink = MemoryCheckpointSink::new();
        let mut outcome = self.train_with_sink(corpus, &mut sink)?;
        outcome.best_accuracy_weights = sink.into_latest();
        Ok(outcome)
    }

    /// Train, handing every new best-validation-accuracy snapshot to `sink`
    pub fn train_with_sink(
        &self,
        corpus: Vec<LabeledFeatures>,
        sink: &mut dyn CheckpointSink,
    ) -> Result<TrainingOutcome> {
        let config = &self.config;
        let (steps, dim) = common_shape(&corpus)?;

        let mut architecture = config.architecture.clone();
        architecture.num_classes = self.labels.len();
        if dim != architecture.input_dim {
            return Err(TrainError::shape_mismatch(format!(
                "features have {} columns, architecture expects {}",
                dim, architecture.input_dim
            )));
        }
        if steps < architecture.min_time_steps() {
            return Err(TrainError::shape_mismatch(format!(
                "features have {} frames, need at least {}",
                steps,
                architecture.min_time_steps()
            )));
        }

        let targets = class_indices(&corpus, &self.labels)?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let split = stratified_split(
            &targets,
            &self.labels,
            config.validation_fraction,
            config.test_fraction,
            &mut rng,
        )?;
        let split_sizes = SplitSizes::from(&split);
        info!(
            "Split {} samples: {} train / {} validation / {} test",
            corpus.len(),
            split_sizes.train,
            split_sizes.validation,
            split_sizes.test
        );

        let mut network = EmotionNetwork::new(architecture, &mut rng)?;
        info!(
            "Training network with {} parameters for up to {} epochs",
            network.num_parameters(),
            config.epochs
        );

        let run_id = Uuid::new_v4();
        let mut optimizer = Adam::new(config.learning_rate);
        let mut stopper = EarlyStopping::new(config.early_stopping_patience);
        let mut plateau = ReduceLrOnPlateau::new(config.lr_patience, config.lr_factor, config.min_lr)
            .with_min_delta(config.lr_min_delta);
        let mut history = TrainingHistory::new();

        let mut best_loss_network = network.clone();
        let mut best_val_accuracy: Option<f32> = None;
        let mut train_order = split.train.clone();
        let mut interrupted = false;
        let mut stopped_early = false;

        'epochs: for epoch in 1..=config.epochs {
            train_order.shuffle(&mut rng);
            let learning_rate = optimizer.learning_rate();
            let mut loss_sum = 0.0f32;
            let mut correct = 0usize;

            for chunk in train_order.chunks(config.batch_size) {
                if self.should_stop() {
                    interrupted = true;
                    break 'epochs;
                }

                let (x, y) = stack_batch(&corpus, &targets, chunk);
                let pass = network.forward(&x, true, &mut rng)?;
                let Some(cache) = pass.cache else {
                    return Err(TrainError::invalid_config(
                        "training pass produced no cache",
                    ));
                };

                loss_sum += cross_entropy(&pass.probabilities, &y) * y.len() as f32;
                correct += pass
                    .probabilities
                    .axis_iter(Axis(0))
                    .zip(&y)
                    .filter(|(row, label)| argmax(row.view()) == **label)
                    .count();

                let grads = network.backward(&cache, &y)?;
                network.update_running_stats(&cache);
                optimizer.step(network.parameters_mut(), &grads.tensors())?;
            }

            let seen = train_order.len().max(1) as f32;
            let validation = evaluate(
                &network,
                &corpus,
                &targets,
                &split.validation,
                config.batch_size,
                &self.labels,
            )?;
            let record = EpochRecord {
                epoch,
                loss: loss_sum / seen,
                accuracy: correct as f32 / seen,
                val_loss: validation.loss,
                val_accuracy: validation.accuracy,
                learning_rate,
            };
            info!(
                "Epoch {}/{}: loss {:.4}, accuracy {:.4}, val_loss {:.4}, val_accuracy {:.4}",
                epoch, config.epochs, record.loss, record.accuracy, record.val_loss, record.val_accuracy
            );
            if !record.loss.is_finite() {
                warn!("Non-finite training loss at epoch {}", epoch);
            }
            history.push(record);

            if best_val_accuracy.map_or(true, |best| validation.accuracy > best) {
                best_val_accuracy = Some(validation.accuracy);
                let snapshot = ClassifierWeights::new(
                    network.clone(),
                    self.labels.clone(),
                    WeightsMetadata::new(run_id, epoch, validation.accuracy),
                )?;
                sink.save(&snapshot)?;
                debug!("Checkpoint at epoch {} (val_accuracy {:.4})", epoch, validation.accuracy);
            }

            match stopper.update(epoch, validation.loss) {
                EarlyStoppingDecision::Improved => best_loss_network = network.clone(),
                EarlyStoppingDecision::Waiting(_) => {}
                EarlyStoppingDecision::Stop => {
                    info!(
                        "Early stopping at epoch {}; restoring epoch {:?}",
                        epoch,
                        stopper.best_epoch()
                    );
                    stopped_early = true;
                    break;
                }
            }

            if let Some(lr) = plateau.update(validation.loss, optimizer.learning_rate()) {
                info!("Reducing learning rate to {:e}", lr);
                optimizer.set_learning_rate(lr);
            }
        }

        if interrupted {
            warn!(
                "Training interrupted after {} epochs; keeping best validation-loss weights",
                history.len()
            );
        }

        let test_report = evaluate(
            &best_loss_network,
            &corpus,
            &targets,
            &split.test,
            config.batch_size,
            &self.labels,
        )?;
        info!(
            "Test loss {:.4}, test accuracy {:.4}",
            test_report.loss, test_report.accuracy
        );

        let weights = ClassifierWeights::new(
            best_loss_network,
            self.labels.clone(),
            WeightsMetadata::new(run_id, history.len(), best_val_accuracy.unwrap_or(0.0)),
        )?;

        Ok(TrainingOutcome {
            weights,
            best_accuracy_weights: None,
            history,
            test_report,
            split_sizes,
            interrupted,
            stopped_early,
        })
    }
}
