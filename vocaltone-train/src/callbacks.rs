//! Per-epoch convergence control on validation loss

/// Outcome of feeding one epoch's validation loss to [`EarlyStopping`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarlyStoppingDecision {
    /// New best loss; snapshot the weights
    Improved,
    /// No improvement for this many consecutive epochs
    Waiting(usize),
    /// Patience exhausted
    Stop,
}

/// Stop after `patience` epochs without a lower validation loss
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    best_loss: f32,
    best_epoch: Option<usize>,
    wait: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_loss: f32::INFINITY,
            best_epoch: None,
            wait: 0,
        }
    }

    pub fn update(&mut self, epoch: usize, val_loss: f32) -> EarlyStoppingDecision {
        if val_loss < self.best_loss {
            self.best_loss = val_loss;
            self.best_epoch = Some(epoch);
            self.wait = 0;
            return EarlyStoppingDecision::Improved;
        }
        self.wait += 1;
        if self.wait >= self.patience {
            EarlyStoppingDecision::Stop
        } else {
            EarlyStoppingDecision::Waiting(self.wait)
        }
    }

    pub fn best_loss(&self) -> f32 {
        self.best_loss
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }
}

/// Default improvement threshold for [`ReduceLrOnPlateau`]
pub const DEFAULT_PLATEAU_MIN_DELTA: f32 = 1e-4;

/// Multiply the learning rate by `factor` after `patience` flat epochs
///
/// An epoch only counts as progress when the loss drops more than
/// `min_delta` below the best seen so far.
#[derive(Debug, Clone)]
pub struct ReduceLrOnPlateau {
    patience: usize,
    factor: f32,
    min_lr: f32,
    min_delta: f32,
    best_loss: f32,
    wait: usize,
}

impl ReduceLrOnPlateau {
    pub fn new(patience: usize, factor: f32, min_lr: f32) -> Self {
        Self {
            patience,
            factor,
            min_lr,
            min_delta: DEFAULT_PLATEAU_MIN_DELTA,
            best_loss: f32::INFINITY,
            wait: 0,
        }
    }

    pub fn with_min_delta(mut self, min_delta: f32) -> Self {
        self.min_delta = min_delta;
        self
    }

    /// New learning rate when the plateau triggers, `None` otherwise
    pub fn update(&mut self, val_loss: f32, current_lr: f32) -> Option<f32> {
        if val_loss < self.best_loss - self.min_delta {
            self.best_loss = val_loss;
            self.wait = 0;
            return None;
        }
        self.wait += 1;
        if self.wait < self.patience || current_lr <= self.min_lr {
            return None;
        }
        self.wait = 0;
        Some((current_lr * self.factor).max(self.min_lr))
    }
}
