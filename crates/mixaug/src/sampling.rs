//! # Mixing Coefficient and Pairing Samplers
//!
//! Both mixing strategies draw, in order:
//! 1. a mixing coefficient ``lam ~ Beta(alpha, alpha)``,
//! 2. a pairing permutation over the batch.
//!
//! All randomness comes from a caller-owned generator.

use anyhow::{anyhow, bail};
use burn::prelude::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_distr::{Beta, Distribution};

/// Sample a mixing coefficient ``lam ~ Beta(alpha, alpha)``.
///
/// A non-positive `alpha` is the degenerate no-mix case: it yields `1.0`
/// and consumes no randomness.
///
/// # Arguments
///
/// - `alpha`: the symmetric Beta concentration.
/// - `rng`: the random source.
///
/// # Returns
///
/// `lam` in ``[0, 1]``; or an error for a `NaN` or infinite `alpha`.
pub fn sample_lambda<R: Rng + ?Sized>(
    alpha: f64,
    rng: &mut R,
) -> anyhow::Result<f64> {
    if !alpha.is_finite() {
        bail!("alpha must be finite: {alpha}");
    }
    if alpha <= 0.0 {
        return Ok(1.0);
    }

    let beta = Beta::new(alpha, alpha)
        .map_err(|err| anyhow!("Beta({alpha}, {alpha}) is not a valid distribution: {err}"))?;
    Ok(beta.sample(rng))
}

/// Sample a uniformly random permutation of ``0..size``.
pub fn sample_permutation<R: Rng + ?Sized>(
    size: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..size).collect();
    perm.shuffle(rng);
    perm
}

/// Build a ``[size]`` index tensor from a permutation, suitable for `select`.
pub fn permutation_tensor<B: Backend>(
    perm: &[usize],
    device: &B::Device,
) -> Tensor<B, 1, Int> {
    let indices: Vec<i64> = perm.iter().map(|&idx| idx as i64).collect();
    Tensor::from_data(TensorData::new(indices, [perm.len()]), device)
}
