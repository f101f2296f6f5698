#![warn(missing_docs)]
//!# mixaug - Batch Mixing Augmentation for Burn
//!
//! ## Notable Components
//!
//! * [`controller`] - per-batch strategy selection.
//!   * [`controller::MixingConfig`] - controller config.
//!   * [`controller::MixingDataController`] - mix, and blend losses / metrics.
//! * [`mixup`] - ``lam * X + (1 - lam) * X[perm]``.
//! * [`cutmix`] - patch swap over selected axes, with box-corrected ``lam``.
//! * [`criterion`] - loss / metric blending over two label sets.
//! * [`metrics`] - plain accuracy functions usable as controller metrics.
//! * [`batch`] - the [`batch::MixedBatch`] result and input validation.
//! * [`data`] - host array ([`burn::tensor::TensorData`]) conversions.
//! * [`sampling`] - mixing coefficient and permutation samplers.

/// Test-only macro import.
#[cfg(test)]
#[allow(unused_imports)]
#[macro_use]
extern crate hamcrest;

pub mod batch;
pub mod controller;
pub mod criterion;
pub mod cutmix;
pub mod data;
pub mod metrics;
pub mod mixup;
pub mod sampling;

pub use batch::MixedBatch;
pub use controller::{MixStrategy, MixingConfig, MixingDataController};
pub use criterion::{cutmix_criterion, cutmix_metric, mixup_criterion, mixup_metric};
pub use cutmix::cutmix_data;
pub use mixup::mixup_data;
