//! # Cutmix
//!
//! Pastes an axis-aligned box from each sample's permuted partner
//! over the sample, across a chosen set of axes.
//!
//! The returned `lam` is the *effective* retained fraction of the box
//! actually pasted, which can exceed the sampled value when the box is
//! clipped at the edges.
//!
//! # Reference
//!
//! - [CutMix: Regularization Strategy to Train Strong Classifiers with Localizable Features](https://arxiv.org/abs/1905.04899)

use crate::batch::{MixedBatch, check_batch_sizes, check_mix_axes};
use crate::sampling::{permutation_tensor, sample_lambda, sample_permutation};
use burn::prelude::Backend;
use burn::tensor::{Numeric, Tensor};
use core::ops::Range;
use rand::Rng;

/// A cutmix box: one half-open index range per mixed axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutBox {
    /// The mixed axes; never includes the batch axis.
    pub axes: Vec<usize>,

    /// The ``lo..hi`` range of the box, for each of `axes`.
    pub ranges: Vec<Range<usize>>,

    /// The full size of each of `axes`.
    pub sizes: Vec<usize>,
}

impl CutBox {
    /// Sample a box for a mixing coefficient.
    ///
    /// Along each mixed axis of size `S`, the cut length is
    /// ``floor(S * sqrt(1 - lam))``, centered on a uniform random index,
    /// and clipped to ``0..S``.
    ///
    /// # Arguments
    ///
    /// - `dims`: the input shape, ``[batch, ...]``.
    /// - `axes`: the axes to mix over.
    /// - `lam`: the sampled mixing coefficient.
    /// - `rng`: the random source; one draw per axis.
    pub fn sample<R: Rng + ?Sized>(
        dims: &[usize],
        axes: &[usize],
        lam: f64,
        rng: &mut R,
    ) -> anyhow::Result<Self> {
        check_mix_axes(axes, dims)?;

        let cut_ratio = (1.0 - lam).clamp(0.0, 1.0).sqrt();

        let mut ranges = Vec::with_capacity(axes.len());
        let mut sizes = Vec::with_capacity(axes.len());
        for &axis in axes {
            let size = dims[axis];
            let cut = (size as f64 * cut_ratio).floor() as usize;
            let center = rng.random_range(0..size);

            let lo = center.saturating_sub(cut / 2);
            let hi = (center + cut / 2).min(size);
            ranges.push(lo..hi);
            sizes.push(size);
        }

        Ok(Self {
            axes: axes.to_vec(),
            ranges,
            sizes,
        })
    }

    /// The number of indexed positions in the box, per sample and
    /// per unmixed position.
    pub fn volume(&self) -> usize {
        self.ranges.iter().map(|r| r.len()).product()
    }

    /// Does the box cover nothing?
    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// The fraction of each sample left untouched by the box.
    pub fn retained_fraction(&self) -> f64 {
        let total: usize = self.sizes.iter().product();
        1.0 - self.volume() as f64 / total as f64
    }

    /// Expand to per-dimension slice ranges over a full input shape.
    ///
    /// Unmixed dimensions, including the batch, are taken in full.
    pub fn slice_ranges<const D: usize>(
        &self,
        dims: [usize; D],
    ) -> [Range<usize>; D] {
        core::array::from_fn(|dim| match self.axes.iter().position(|&a| a == dim) {
            Some(idx) => self.ranges[idx].clone(),
            None => 0..dims[dim],
        })
    }
}

/// Apply cutmix to a batch.
///
/// # Arguments
///
/// - `inputs`: ``[batch, ...]`` float inputs.
/// - `labels`: ``[batch, ...]`` labels, of any numeric kind.
/// - `alpha`: Beta concentration; ``alpha <= 0`` disables mixing (``lam = 1``).
/// - `axes`: the non-batch axes to cut over, e.g. ``[2, 3]`` for ``NCHW`` images.
/// - `rng`: the random source.
///
/// # Returns
///
/// A [`MixedBatch`] holding the effective `lam`, with
/// ``labels_a = labels`` and ``labels_b = labels[perm]``.
#[tracing::instrument(level = "debug", skip(inputs, labels, rng))]
pub fn cutmix_data<B, const D: usize, const DY: usize, K, R>(
    inputs: Tensor<B, D>,
    labels: Tensor<B, DY, K>,
    alpha: f64,
    axes: &[usize],
    rng: &mut R,
) -> anyhow::Result<MixedBatch<Tensor<B, D>, Tensor<B, DY, K>>>
where
    B: Backend,
    K: Numeric<B>,
    R: Rng + ?Sized,
{
    let dims = inputs.dims();
    let batch = check_batch_sizes(&dims, &labels.dims())?;
    check_mix_axes(axes, &dims)?;

    let sampled = sample_lambda(alpha, rng)?;
    let perm = sample_permutation(batch, rng);
    let indices = permutation_tensor::<B>(&perm, &inputs.device());
    let cut = CutBox::sample(&dims, axes, sampled, rng)?;

    let mixed = if cut.is_empty() {
        inputs
    } else {
        let ranges = cut.slice_ranges(dims);
        let patch = inputs
            .clone()
            .slice(ranges.clone())
            .select(0, indices.clone());
        inputs.slice_assign(ranges, patch)
    };
    let labels_b = labels.clone().select(0, indices);

    let lam = cut.retained_fraction();
    tracing::debug!(batch, sampled, lam, ranges = ?cut.ranges, "cutmix");

    Ok(MixedBatch {
        inputs: mixed,
        labels_a: labels,
        labels_b,
        lam,
    })
}
