//! # Mixed Loss and Metric Blending
//!
//! A mixed batch carries two label sets; losses and metrics are computed
//! against each and blended by the mixing coefficient:
//!
//! ```text
//! mixed = lam * f(predictions, labels_a) + (1 - lam) * f(predictions, labels_b)
//! ```

use burn::prelude::Backend;
use burn::tensor::Tensor;

/// Values which can be linearly blended by a mixing coefficient.
pub trait Blend: Sized {
    /// ``lam * a + (1 - lam) * b``.
    fn blend(
        a: Self,
        b: Self,
        lam: f64,
    ) -> Self;
}

impl Blend for f64 {
    fn blend(
        a: Self,
        b: Self,
        lam: f64,
    ) -> Self {
        lam * a + (1.0 - lam) * b
    }
}

impl Blend for f32 {
    fn blend(
        a: Self,
        b: Self,
        lam: f64,
    ) -> Self {
        let lam = lam as f32;
        lam * a + (1.0 - lam) * b
    }
}

impl<B: Backend, const D: usize> Blend for Tensor<B, D> {
    fn blend(
        a: Self,
        b: Self,
        lam: f64,
    ) -> Self {
        a.mul_scalar(lam) + b.mul_scalar(1.0 - lam)
    }
}

impl<T: Blend> Blend for anyhow::Result<T> {
    fn blend(
        a: Self,
        b: Self,
        lam: f64,
    ) -> Self {
        Ok(T::blend(a?, b?, lam))
    }
}

/// Evaluate `criterion` against both label sets, and blend by `lam`.
///
/// At the ends of the range only one side is evaluated:
/// ``lam >= 1`` is exactly ``criterion(predictions, labels_a)``, and
/// ``lam <= 0`` is exactly ``criterion(predictions, labels_b)``.
pub fn mixed_criterion<P, Y, O, F>(
    criterion: F,
    predictions: P,
    labels_a: Y,
    labels_b: Y,
    lam: f64,
) -> O
where
    P: Clone,
    O: Blend,
    F: Fn(P, Y) -> O,
{
    if lam >= 1.0 {
        return criterion(predictions, labels_a);
    }
    if lam <= 0.0 {
        return criterion(predictions, labels_b);
    }

    let a = criterion(predictions.clone(), labels_a);
    let b = criterion(predictions, labels_b);
    O::blend(a, b, lam)
}

/// Blended loss for a mixup batch.
pub fn mixup_criterion<P, Y, O, F>(
    loss_function: F,
    predictions: P,
    labels_a: Y,
    labels_b: Y,
    lam: f64,
) -> O
where
    P: Clone,
    O: Blend,
    F: Fn(P, Y) -> O,
{
    mixed_criterion(loss_function, predictions, labels_a, labels_b, lam)
}

/// Blended loss for a cutmix batch.
///
/// `lam` must be the effective value returned by [`crate::cutmix::cutmix_data`].
pub fn cutmix_criterion<P, Y, O, F>(
    loss_function: F,
    predictions: P,
    labels_a: Y,
    labels_b: Y,
    lam: f64,
) -> O
where
    P: Clone,
    O: Blend,
    F: Fn(P, Y) -> O,
{
    mixed_criterion(loss_function, predictions, labels_a, labels_b, lam)
}

/// Blended metric for a mixup batch.
pub fn mixup_metric<P, Y, O, F>(
    metric_function: F,
    predictions: P,
    labels_a: Y,
    labels_b: Y,
    lam: f64,
) -> O
where
    P: Clone,
    O: Blend,
    F: Fn(P, Y) -> O,
{
    mixed_criterion(metric_function, predictions, labels_a, labels_b, lam)
}

/// Blended metric for a cutmix batch.
pub fn cutmix_metric<P, Y, O, F>(
    metric_function: F,
    predictions: P,
    labels_a: Y,
    labels_b: Y,
    lam: f64,
) -> O
where
    P: Clone,
    O: Blend,
    F: Fn(P, Y) -> O,
{
    mixed_criterion(metric_function, predictions, labels_a, labels_b, lam)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use burn::backend::NdArray;
    use burn::nn::loss::CrossEntropyLossConfig;
    use burn::tensor::{Int, TensorData};
    use hamcrest::prelude::*;
    use std::cell::Cell;

    type TestBackend = NdArray<f32>;

    fn distance(
        prediction: f64,
        label: f64,
    ) -> f64 {
        (prediction - label).abs()
    }

    #[test]
    fn test_blend_scalars() {
        assert_that!(f64::blend(2.0, 4.0, 0.25), close_to(3.5, 1e-12));
        assert_that!(f32::blend(2.0, 4.0, 0.5), close_to(3.0, 1e-6));
    }

    #[test]
    fn test_blend_results() {
        let ok: anyhow::Result<f64> = Blend::blend(Ok(1.0), Ok(0.0), 0.75);
        assert_that!(ok.unwrap(), close_to(0.75, 1e-12));

        let err: anyhow::Result<f64> = Blend::blend(Ok(1.0), Err(anyhow::anyhow!("bad")), 0.5);
        assert!(err.is_err());
    }

    #[test]
    fn test_mixed_criterion_endpoints() {
        assert_eq!(mixed_criterion(distance, 1.0, 3.0, 7.0, 1.0), 2.0);
        assert_eq!(mixed_criterion(distance, 1.0, 3.0, 7.0, 0.0), 6.0);
        assert_that!(
            mixed_criterion(distance, 1.0, 3.0, 7.0, 0.25),
            close_to(0.25 * 2.0 + 0.75 * 6.0, 1e-12)
        );
    }

    #[test]
    fn test_mixed_criterion_skips_unweighted_side() {
        let calls = Cell::new(0);
        let counted = |p: f64, y: f64| {
            calls.set(calls.get() + 1);
            p - y
        };

        mixed_criterion(counted, 0.0, 1.0, 2.0, 1.0);
        assert_eq!(calls.get(), 1);

        mixed_criterion(counted, 0.0, 1.0, 2.0, 0.0);
        assert_eq!(calls.get(), 2);

        mixed_criterion(counted, 0.0, 1.0, 2.0, 0.5);
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_fallible_criterion() {
        let checked = |p: f64, y: f64| -> anyhow::Result<f64> {
            if y < 0.0 {
                bail!("negative label");
            }
            Ok(p * y)
        };

        assert_that!(
            mixup_metric(checked, 2.0, 1.0, 3.0, 0.5).unwrap(),
            close_to(4.0, 1e-12)
        );
        assert!(cutmix_metric(checked, 2.0, 1.0, -3.0, 0.5).is_err());
        // The unweighted side is never evaluated.
        assert!(cutmix_metric(checked, 2.0, 1.0, -3.0, 1.0).is_ok());
    }

    #[test]
    fn test_cross_entropy_blend() {
        let device = Default::default();
        let loss = CrossEntropyLossConfig::new().init::<TestBackend>(&device);
        let loss_function = |p: Tensor<TestBackend, 2>, y: Tensor<TestBackend, 1, Int>| loss.forward(p, y);

        let predictions = Tensor::<TestBackend, 2>::from_data(
            [[2.0, 0.5, -1.0], [0.1, 0.2, 3.0], [1.0, 1.0, 1.0]],
            &device,
        );
        let labels_a =
            Tensor::<TestBackend, 1, Int>::from_data(TensorData::from([0i64, 2, 1]), &device);
        let labels_b =
            Tensor::<TestBackend, 1, Int>::from_data(TensorData::from([1i64, 0, 2]), &device);

        let loss_a = loss_function(predictions.clone(), labels_a.clone()).into_scalar() as f64;
        let loss_b = loss_function(predictions.clone(), labels_b.clone()).into_scalar() as f64;

        let at_one = mixup_criterion(
            loss_function,
            predictions.clone(),
            labels_a.clone(),
            labels_b.clone(),
            1.0,
        );
        assert_eq!(at_one.into_scalar() as f64, loss_a);

        let at_zero = cutmix_criterion(
            loss_function,
            predictions.clone(),
            labels_a.clone(),
            labels_b.clone(),
            0.0,
        );
        assert_eq!(at_zero.into_scalar() as f64, loss_b);

        let blended = mixup_criterion(loss_function, predictions, labels_a, labels_b, 0.3);
        assert_that!(
            blended.into_scalar() as f64,
            close_to(0.3 * loss_a + 0.7 * loss_b, 1e-5)
        );
    }
}
