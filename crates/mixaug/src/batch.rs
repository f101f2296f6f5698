//! # Mixed Batches and Batch Validation

use anyhow::{bail, ensure};

/// The output of a mixing operation.
///
/// `X` and `Y` are the caller's representation of the inputs and labels;
/// every mixing entry point returns the representation it was given.
#[derive(Debug, Clone)]
pub struct MixedBatch<X, Y> {
    /// The mixed inputs; same shape and dtype as the source inputs.
    pub inputs: X,

    /// The source labels, ``Y``.
    pub labels_a: Y,

    /// The permuted partner labels, ``Y[perm]``.
    pub labels_b: Y,

    /// The weight of `labels_a` in the blended loss.
    pub lam: f64,
}

impl<X, Y> MixedBatch<X, Y> {
    /// Split into ``(inputs, labels_a, labels_b, lam)``.
    pub fn into_parts(self) -> (X, Y, Y, f64) {
        (self.inputs, self.labels_a, self.labels_b, self.lam)
    }

    /// Convert the inputs and both label sets to another representation.
    pub fn map<X2, Y2>(
        self,
        map_inputs: impl FnOnce(X) -> X2,
        map_labels: impl Fn(Y) -> Y2,
    ) -> MixedBatch<X2, Y2> {
        MixedBatch {
            inputs: map_inputs(self.inputs),
            labels_a: map_labels(self.labels_a),
            labels_b: map_labels(self.labels_b),
            lam: self.lam,
        }
    }

    /// Fallible variant of [`MixedBatch::map`].
    pub fn try_map<X2, Y2>(
        self,
        map_inputs: impl FnOnce(X) -> anyhow::Result<X2>,
        map_labels: impl Fn(Y) -> anyhow::Result<Y2>,
    ) -> anyhow::Result<MixedBatch<X2, Y2>> {
        Ok(MixedBatch {
            inputs: map_inputs(self.inputs)?,
            labels_a: map_labels(self.labels_a)?,
            labels_b: map_labels(self.labels_b)?,
            lam: self.lam,
        })
    }
}

/// Check that inputs and labels describe the same non-empty batch.
///
/// # Arguments
///
/// - `input_dims`: ``[batch, ...]``.
/// - `label_dims`: ``[batch, ...]``.
///
/// # Returns
///
/// The batch size.
pub fn check_batch_sizes(
    input_dims: &[usize],
    label_dims: &[usize],
) -> anyhow::Result<usize> {
    let (Some(&batch), Some(&label_batch)) = (input_dims.first(), label_dims.first()) else {
        bail!("inputs and labels must have a batch axis: {input_dims:?}, {label_dims:?}");
    };
    ensure!(
        batch == label_batch,
        "batch size mismatch: inputs {input_dims:?} vs labels {label_dims:?}"
    );
    ensure!(batch > 0, "cannot mix an empty batch");
    Ok(batch)
}

/// Shape-independent checks of a cutmix axes list.
///
/// Axes must be non-empty, unique, and must not include the batch axis (0).
pub fn validate_mix_axes(axes: &[usize]) -> anyhow::Result<()> {
    ensure!(!axes.is_empty(), "cutmix axes must not be empty");
    for (idx, &axis) in axes.iter().enumerate() {
        ensure!(axis != 0, "cutmix axes must not include the batch axis: {axes:?}");
        ensure!(
            !axes[..idx].contains(&axis),
            "duplicate cutmix axis {axis}: {axes:?}"
        );
    }
    Ok(())
}

/// Check a cutmix axes list against an input shape.
///
/// In addition to [`validate_mix_axes`], every axis must index
/// a non-empty dimension of `dims`.
pub fn check_mix_axes(
    axes: &[usize],
    dims: &[usize],
) -> anyhow::Result<()> {
    validate_mix_axes(axes)?;
    for &axis in axes {
        ensure!(
            axis < dims.len(),
            "cutmix axis {axis} out of range for shape {dims:?}"
        );
        ensure!(
            dims[axis] > 0,
            "cutmix axis {axis} has zero size in shape {dims:?}"
        );
    }
    Ok(())
}
