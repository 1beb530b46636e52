//! Network building blocks with explicit forward and backward passes
//!
//! Sequences are (batch, time, channels); vectors are (batch, features).
//! Every trainable layer exposes `params_mut()` and its gradient struct
//! exposes `tensors()` in the same order, which is what the optimizer zips.

pub mod activation;
pub mod batch_norm;
pub mod conv;
pub mod dense;
pub mod dropout;
pub mod init;
pub mod lstm;
pub mod pool;

#[cfg(test)]
pub(crate) mod gradcheck;

pub use batch_norm::{BatchNorm, BatchNormCache, BatchNormGrads};
pub use conv::{Conv1d, Conv1dCache, Conv1dGrads};
pub use dense::{Dense, DenseGrads};
pub use lstm::{Lstm, LstmCache, LstmGrads};
pub use pool::MaxPoolCache;
