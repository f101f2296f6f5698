//! # Classification Metrics
//!
//! Plain metric functions with the ``(predictions, labels) -> value`` shape
//! expected by [`crate::controller::MixingDataController`].

use anyhow::ensure;
use burn::prelude::Backend;
use burn::tensor::{ElementConversion, Int, Tensor};

/// Top-1 accuracy.
///
/// See [`top_k_accuracy`].
pub fn accuracy<B: Backend>(
    predictions: Tensor<B, 2>,
    labels: Tensor<B, 1, Int>,
) -> anyhow::Result<f64> {
    top_k_accuracy(predictions, labels, 1)
}

/// Top-k accuracy.
///
/// A sample is correct when its label is among the `k` highest scores.
///
/// # Arguments
///
/// - `predictions`: ``[batch, classes]`` scores or logits.
/// - `labels`: ``[batch]`` class indices.
/// - `k`: must be in ``1..=classes``.
///
/// # Returns
///
/// The fraction of correct samples, in ``[0, 1]``.
pub fn top_k_accuracy<B: Backend>(
    predictions: Tensor<B, 2>,
    labels: Tensor<B, 1, Int>,
    k: usize,
) -> anyhow::Result<f64> {
    let [batch, classes] = predictions.dims();
    let [label_batch] = labels.dims();
    ensure!(batch > 0, "accuracy of an empty batch");
    ensure!(
        batch == label_batch,
        "batch size mismatch: predictions {batch} vs labels {label_batch}"
    );
    ensure!(
        (1..=classes).contains(&k),
        "k must be in 1..={classes}: {k}"
    );

    let top = predictions.argsort_descending(1).narrow(1, 0, k);
    let expected = labels.unsqueeze_dim::<2>(1).repeat_dim(1, k);
    let hits: i64 = top.equal(expected).int().sum().into_scalar().elem();

    Ok(hits as f64 / batch as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;
    use hamcrest::prelude::*;

    type TestBackend = NdArray<f32>;

    fn fixture(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2> {
        Tensor::from_data(
            [
                [0.1, 0.7, 0.2],
                [0.5, 0.3, 0.2],
                [0.2, 0.3, 0.5],
                [0.4, 0.1, 0.5],
            ],
            device,
        )
    }

    fn labels(
        values: [i64; 4],
        device: &<TestBackend as Backend>::Device,
    ) -> Tensor<TestBackend, 1, Int> {
        Tensor::from_data(TensorData::from(values), device)
    }

    #[test]
    fn test_accuracy() {
        let device = Default::default();

        let acc = accuracy(fixture(&device), labels([1, 0, 2, 0], &device)).unwrap();
        assert_that!(acc, close_to(0.75, 1e-12));

        let acc = accuracy(fixture(&device), labels([1, 0, 2, 2], &device)).unwrap();
        assert_that!(acc, close_to(1.0, 1e-12));
    }

    #[test]
    fn test_top_k_accuracy() {
        let device = Default::default();

        let acc = top_k_accuracy(fixture(&device), labels([2, 1, 1, 0], &device), 2).unwrap();
        assert_that!(acc, close_to(1.0, 1e-12));

        let acc = top_k_accuracy(fixture(&device), labels([0, 2, 0, 1], &device), 2).unwrap();
        assert_that!(acc, close_to(0.0, 1e-12));

        let acc = top_k_accuracy(fixture(&device), labels([0, 2, 0, 1], &device), 3).unwrap();
        assert_that!(acc, close_to(1.0, 1e-12));
    }

    #[test]
    fn test_accuracy_errors() {
        let device = Default::default();

        assert!(top_k_accuracy(fixture(&device), labels([0, 0, 0, 0], &device), 0).is_err());
        assert!(top_k_accuracy(fixture(&device), labels([0, 0, 0, 0], &device), 4).is_err());

        let short = Tensor::<TestBackend, 1, Int>::from_data(TensorData::from([0i64, 1]), &device);
        let err = accuracy(fixture(&device), short).unwrap_err();
        assert!(err.to_string().contains("batch size mismatch"));
    }
}
