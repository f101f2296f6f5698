use burn::backend::NdArray;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::prelude::Backend;
use burn::tensor::{Distribution, Int, Tensor};
use clap::Parser;
use mixaug::metrics::accuracy;
use mixaug::{MixStrategy, MixingConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;

// $ cargo run -p mixing_demo -- --mixup-prob=0.4 --cutmix-prob=0.4 --iterations=8
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Random seed for reproducibility.
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Batch size.
    #[arg(short, long, default_value_t = 16)]
    batch_size: usize,

    /// Number of batches to mix.
    #[arg(long, default_value = "10")]
    iterations: usize,

    /// Number of label classes.
    #[arg(long, default_value = "10")]
    num_classes: usize,

    /// Image height and width.
    #[arg(long, default_value = "32")]
    image_size: usize,

    /// Probability of mixup per batch.
    #[arg(long, default_value = "0.5")]
    mixup_prob: f64,

    /// Probability of cutmix per batch.
    #[arg(long, default_value = "0.5")]
    cutmix_prob: f64,

    /// Mixup Beta concentration.
    #[arg(long, default_value = "0.2")]
    mixup_alpha: f64,

    /// Cutmix Beta concentration.
    #[arg(long, default_value = "1.0")]
    cutmix_alpha: f64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    type B = NdArray<f32>;

    let device = Default::default();
    backend_main::<B>(&args, &device)
}

/// Mix random image batches, and report the blended loss / accuracy of random logits.
pub fn backend_main<B: Backend>(
    args: &Args,
    device: &B::Device,
) -> anyhow::Result<()> {
    B::seed(args.seed);
    let mut rng = StdRng::seed_from_u64(args.seed);

    let loss = CrossEntropyLossConfig::new().init::<B>(device);
    let controller = MixingConfig::new()
        .with_mixup_prob(args.mixup_prob)
        .with_cutmix_prob(args.cutmix_prob)
        .with_mixup_alpha(args.mixup_alpha)
        .with_cutmix_alpha(args.cutmix_alpha)
        .with_cutmix_axes(vec![2, 3])
        .init(
            |p: Tensor<B, 2>, y: Tensor<B, 1, Int>| loss.forward(p, y),
            accuracy::<B>,
        )?;

    println!("{controller:?}");

    let mut counts = [0usize; 3];
    for step in 0..args.iterations {
        let images = Tensor::<B, 4>::random(
            [args.batch_size, 3, args.image_size, args.image_size],
            Distribution::Uniform(0.0, 1.0),
            device,
        );
        let targets = Tensor::<B, 1, Int>::random(
            [args.batch_size],
            Distribution::Uniform(0.0, args.num_classes as f64),
            device,
        );

        let strategy = controller.choose_strategy(&mut rng);
        let (inputs, labels_a, labels_b, lam) = controller
            .apply_strategy(strategy, images, targets, &mut rng)?
            .into_parts();
        counts[strategy as usize] += 1;

        // Stand-in for a model: logits from the mean of each sample.
        let pooled = inputs.flatten::<2>(1, 3).mean_dim(1);
        let logits = pooled.repeat_dim(1, args.num_classes)
            + Tensor::random(
                [args.batch_size, args.num_classes],
                Distribution::Normal(0.0, 1.0),
                device,
            );

        let batch_loss: Tensor<B, 1> =
            controller.loss(logits.clone(), labels_a.clone(), labels_b.clone(), lam);
        let batch_acc = controller.metric(logits, labels_a, labels_b, lam)?;

        println!(
            "step {step:>3}: {strategy:?} lam={lam:.4} loss={:.4} acc={batch_acc:.4}",
            batch_loss.into_scalar()
        );
    }

    println!(
        "no-mix: {}, mixup: {}, cutmix: {}",
        counts[MixStrategy::NoMix as usize],
        counts[MixStrategy::Mixup as usize],
        counts[MixStrategy::Cutmix as usize]
    );

    Ok(())
}
