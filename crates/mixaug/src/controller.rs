//! # Mixing-Data Controller
//!
//! Picks one of [`MixStrategy`] per batch, applies it, and blends
//! losses and metrics against the two resulting label sets.
//!
//! ```rust,ignore
//! let controller = MixingConfig::new()
//!     .with_mixup_prob(0.4)
//!     .with_cutmix_prob(0.4)
//!     .init(loss_function, accuracy)?;
//!
//! let (inputs, labels_a, labels_b, lam) = controller.mix(images, targets, &mut rng)?.into_parts();
//! let predictions = model.forward(inputs);
//! let loss = controller.loss(predictions.clone(), labels_a.clone(), labels_b.clone(), lam);
//! let acc = controller.metric(predictions, labels_a, labels_b, lam)?;
//! ```

use crate::batch::{MixedBatch, check_batch_sizes, validate_mix_axes};
use crate::criterion::{Blend, mixed_criterion};
use crate::cutmix::cutmix_data;
use crate::data::{check_rank, data_from_tensor, is_float_dtype, tensor_from_data};
use crate::mixup::mixup_data;
use anyhow::ensure;
use burn::config::Config;
use burn::prelude::Backend;
use burn::tensor::{Numeric, Tensor, TensorData};
use rand::Rng;

/// The per-batch mixing choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MixStrategy {
    /// Pass the batch through unchanged.
    NoMix,

    /// [`mixup_data`].
    Mixup,

    /// [`cutmix_data`].
    Cutmix,
}

impl MixStrategy {
    /// Map a uniform draw in ``[0, 1)`` onto a strategy.
    ///
    /// ```text
    /// [0, mixup_prob)                           -> Mixup
    /// [mixup_prob, mixup_prob + cutmix_prob)    -> Cutmix
    /// [mixup_prob + cutmix_prob, 1)             -> NoMix
    /// ```
    pub fn from_draw(
        mixup_prob: f64,
        cutmix_prob: f64,
        draw: f64,
    ) -> Self {
        if draw < mixup_prob {
            MixStrategy::Mixup
        } else if draw < mixup_prob + cutmix_prob {
            MixStrategy::Cutmix
        } else {
            MixStrategy::NoMix
        }
    }
}

/// [`MixingDataController`] Config.
#[derive(Config, Debug)]
pub struct MixingConfig {
    /// Probability of applying mixup to a batch.
    #[config(default = 0.0)]
    pub mixup_prob: f64,

    /// Probability of applying cutmix to a batch.
    #[config(default = 0.0)]
    pub cutmix_prob: f64,

    /// Beta concentration for mixup; ``<= 0`` disables mixing.
    #[config(default = 0.2)]
    pub mixup_alpha: f64,

    /// Beta concentration for cutmix; ``<= 0`` disables mixing.
    #[config(default = 0.2)]
    pub cutmix_alpha: f64,

    /// Non-batch axes cutmix cuts across.
    #[config(default = "vec![2, 3]")]
    pub cutmix_axes: Vec<usize>,
}

impl Default for MixingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MixingConfig {
    /// Check the config.
    ///
    /// Probabilities must each be in ``[0, 1]`` and sum to at most 1.
    /// When cutmix can be chosen, the axes must pass
    /// [`validate_mix_axes`]; their range is checked per batch.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, prob) in [
            ("mixup_prob", self.mixup_prob),
            ("cutmix_prob", self.cutmix_prob),
        ] {
            ensure!(
                (0.0..=1.0).contains(&prob),
                "{name} must be in [0, 1]: {prob}"
            );
        }
        ensure!(
            self.mixup_prob + self.cutmix_prob <= 1.0,
            "mixup_prob + cutmix_prob must be <= 1: {} + {}",
            self.mixup_prob,
            self.cutmix_prob
        );
        if self.cutmix_prob > 0.0 {
            validate_mix_axes(&self.cutmix_axes)?;
        }
        Ok(())
    }

    /// The strategy, if the config leaves no choice to chance.
    pub fn fixed_strategy(&self) -> Option<MixStrategy> {
        if self.mixup_prob >= 1.0 {
            Some(MixStrategy::Mixup)
        } else if self.cutmix_prob >= 1.0 {
            Some(MixStrategy::Cutmix)
        } else if self.mixup_prob <= 0.0 && self.cutmix_prob <= 0.0 {
            Some(MixStrategy::NoMix)
        } else {
            None
        }
    }

    /// Validate, and bind a loss and metric function into a [`MixingDataController`].
    pub fn init<L, M>(
        &self,
        loss_function: L,
        metric_function: M,
    ) -> anyhow::Result<MixingDataController<L, M>> {
        self.validate()?;
        Ok(MixingDataController {
            config: self.clone(),
            loss_function,
            metric_function,
        })
    }
}

/// Per-batch mixup / cutmix selection, with matching loss and metric blending.
///
/// Immutable after construction; all randomness comes from the generator
/// passed to each call, so each data worker should own its own stream.
pub struct MixingDataController<L, M> {
    config: MixingConfig,
    loss_function: L,
    metric_function: M,
}

impl<L, M> core::fmt::Debug for MixingDataController<L, M> {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        f.debug_struct("MixingDataController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<L, M> MixingDataController<L, M> {
    /// The validated config.
    pub fn config(&self) -> &MixingConfig {
        &self.config
    }

    /// Choose the strategy for the next batch.
    ///
    /// When the config leaves no choice, no randomness is consumed; so a
    /// controller pinned to one strategy draws exactly what a direct call to
    /// that strategy draws.
    pub fn choose_strategy<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> MixStrategy {
        match self.config.fixed_strategy() {
            Some(strategy) => strategy,
            None => MixStrategy::from_draw(
                self.config.mixup_prob,
                self.config.cutmix_prob,
                rng.random::<f64>(),
            ),
        }
    }

    /// Mix a batch of backend tensors.
    ///
    /// # Arguments
    ///
    /// - `inputs`: ``[batch, ...]`` float inputs.
    /// - `labels`: ``[batch, ...]`` labels, of any numeric kind.
    /// - `rng`: the random source.
    ///
    /// # Returns
    ///
    /// The [`MixedBatch`]; ``(inputs, labels, labels, 1.0)`` for [`MixStrategy::NoMix`].
    #[tracing::instrument(level = "debug", skip_all, fields(dims = ?inputs.dims()))]
    pub fn mix<B, const D: usize, const DY: usize, K, R>(
        &self,
        inputs: Tensor<B, D>,
        labels: Tensor<B, DY, K>,
        rng: &mut R,
    ) -> anyhow::Result<MixedBatch<Tensor<B, D>, Tensor<B, DY, K>>>
    where
        B: Backend,
        K: Numeric<B>,
        R: Rng + ?Sized,
    {
        check_batch_sizes(&inputs.dims(), &labels.dims())?;

        let strategy = self.choose_strategy(rng);
        tracing::debug!(?strategy, "mixing strategy");

        self.apply_strategy(strategy, inputs, labels, rng)
    }

    /// Mix a batch of backend tensors with an already chosen strategy.
    ///
    /// [`MixingDataController::mix`] is [`MixingDataController::choose_strategy`]
    /// followed by this.
    pub fn apply_strategy<B, const D: usize, const DY: usize, K, R>(
        &self,
        strategy: MixStrategy,
        inputs: Tensor<B, D>,
        labels: Tensor<B, DY, K>,
        rng: &mut R,
    ) -> anyhow::Result<MixedBatch<Tensor<B, D>, Tensor<B, DY, K>>>
    where
        B: Backend,
        K: Numeric<B>,
        R: Rng + ?Sized,
    {
        match strategy {
            MixStrategy::NoMix => {
                check_batch_sizes(&inputs.dims(), &labels.dims())?;
                Ok(MixedBatch {
                    inputs,
                    labels_a: labels.clone(),
                    labels_b: labels,
                    lam: 1.0,
                })
            }
            MixStrategy::Mixup => mixup_data(inputs, labels, self.config.mixup_alpha, rng),
            MixStrategy::Cutmix => cutmix_data(
                inputs,
                labels,
                self.config.cutmix_alpha,
                &self.config.cutmix_axes,
                rng,
            ),
        }
    }

    /// Mix a batch of host arrays.
    ///
    /// The arrays are loaded onto `device` as rank `D` float inputs and rank `DY`
    /// labels of kind `K`, mixed with [`MixingDataController::apply_strategy`],
    /// and read back in their original dtypes.
    ///
    /// On [`MixStrategy::NoMix`] the arrays never touch the backend, and are
    /// returned exactly as given.
    ///
    /// # Returns
    ///
    /// The [`MixedBatch`] as host arrays; or an error if the ranks do not match,
    /// or the inputs are not floating point.
    pub fn mix_data<B, const D: usize, const DY: usize, K, R>(
        &self,
        inputs: TensorData,
        labels: TensorData,
        device: &B::Device,
        rng: &mut R,
    ) -> anyhow::Result<MixedBatch<TensorData, TensorData>>
    where
        B: Backend,
        K: Numeric<B>,
        R: Rng + ?Sized,
    {
        let input_dtype = inputs.dtype;
        let label_dtype = labels.dtype;
        ensure!(
            is_float_dtype(input_dtype),
            "inputs must be floating point: {input_dtype:?}"
        );

        check_rank::<D>(&inputs)?;
        check_rank::<DY>(&labels)?;
        check_batch_sizes(&inputs.shape, &labels.shape)?;

        let strategy = self.choose_strategy(rng);
        tracing::debug!(?strategy, shape = ?inputs.shape, "mixing host arrays");

        if strategy == MixStrategy::NoMix {
            return Ok(MixedBatch {
                inputs,
                labels_a: labels.clone(),
                labels_b: labels,
                lam: 1.0,
            });
        }

        let inputs: Tensor<B, D> = tensor_from_data(inputs, device)?;
        let labels: Tensor<B, DY, K> = tensor_from_data(labels, device)?;

        Ok(self.apply_strategy(strategy, inputs, labels, rng)?.map(
            |x| data_from_tensor(x, input_dtype),
            |y| data_from_tensor(y, label_dtype),
        ))
    }

    /// Blended loss: ``lam * loss(p, labels_a) + (1 - lam) * loss(p, labels_b)``.
    pub fn loss<P, Y, O>(
        &self,
        predictions: P,
        labels_a: Y,
        labels_b: Y,
        lam: f64,
    ) -> O
    where
        L: Fn(P, Y) -> O,
        P: Clone,
        O: Blend,
    {
        mixed_criterion(&self.loss_function, predictions, labels_a, labels_b, lam)
    }

    /// Blended metric: ``lam * metric(p, labels_a) + (1 - lam) * metric(p, labels_b)``.
    pub fn metric<P, Y, O>(
        &self,
        predictions: P,
        labels_a: Y,
        labels_b: Y,
        lam: f64,
    ) -> O
    where
        M: Fn(P, Y) -> O,
        P: Clone,
        O: Blend,
    {
        mixed_criterion(&self.metric_function, predictions, labels_a, labels_b, lam)
    }
}
