//! # Mixup
//!
//! ```text
//! lam ~ Beta(alpha, alpha)
//! X_mixed = lam * X + (1 - lam) * X[perm]
//! ```
//!
//! # Reference
//!
//! - [mixup: Beyond Empirical Risk Minimization](https://arxiv.org/abs/1710.09412)

use crate::batch::{MixedBatch, check_batch_sizes};
use crate::sampling::{permutation_tensor, sample_lambda, sample_permutation};
use burn::prelude::Backend;
use burn::tensor::{Numeric, Tensor};
use rand::Rng;

/// Apply mixup to a batch.
///
/// # Arguments
///
/// - `inputs`: ``[batch, ...]`` float inputs.
/// - `labels`: ``[batch, ...]`` labels, of any numeric kind.
/// - `alpha`: Beta concentration; ``alpha <= 0`` disables mixing (``lam = 1``).
/// - `rng`: the random source.
///
/// # Returns
///
/// A [`MixedBatch`] holding the sampled `lam`, with
/// ``labels_a = labels`` and ``labels_b = labels[perm]``.
#[tracing::instrument(level = "debug", skip(inputs, labels, rng))]
pub fn mixup_data<B, const D: usize, const DY: usize, K, R>(
    inputs: Tensor<B, D>,
    labels: Tensor<B, DY, K>,
    alpha: f64,
    rng: &mut R,
) -> anyhow::Result<MixedBatch<Tensor<B, D>, Tensor<B, DY, K>>>
where
    B: Backend,
    K: Numeric<B>,
    R: Rng + ?Sized,
{
    let batch = check_batch_sizes(&inputs.dims(), &labels.dims())?;

    let lam = sample_lambda(alpha, rng)?;
    let perm = sample_permutation(batch, rng);
    let indices = permutation_tensor::<B>(&perm, &inputs.device());

    let partners = inputs.clone().select(0, indices.clone());
    let mixed = inputs.mul_scalar(lam) + partners.mul_scalar(1.0 - lam);
    let labels_b = labels.clone().select(0, indices);

    tracing::debug!(batch, lam, "mixup");

    Ok(MixedBatch {
        inputs: mixed,
        labels_a: labels,
        labels_b,
        lam,
    })
}
