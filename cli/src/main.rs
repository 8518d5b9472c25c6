mod capability;
mod config;
mod dataset;
mod pipeline;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use shared::{FusionReport, SignalSummary};

use capability::ModelBundle;
use config::AppConfig;
use dataset::augment::augment_directory;
use dataset::mask::convert_masks;
use dataset::split::{SplitConfig, split_dataset};
use dataset::synth::{SynthConfig, generate_csv};
use pipeline::{Console, DISEASE_QUESTIONS};

/// Crop disease and insect advisory: two pretrained detectors and two
/// tabular classifiers, OR-fused into per-domain verdicts.
#[derive(Parser, Debug)]
#[command(name = "crophealth")]
#[command(version)]
#[command(about = "Crop disease and insect advisory from images plus field questionnaires")]
struct Cli {
    /// Optional YAML config overriding model paths, detector decode
    /// parameters and the negative-label set
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the interactive fusion pipeline (images + questionnaires -> verdicts)
    Fuse,

    /// Horizontal-flip augmentation for an images/labels directory pair
    Augment {
        #[arg(long)]
        image_dir: PathBuf,
        #[arg(long)]
        label_dir: PathBuf,
        #[arg(long)]
        out_image_dir: PathBuf,
        #[arg(long)]
        out_label_dir: PathBuf,
    },

    /// Convert color-indexed segmentation masks to YOLO polygon label files
    ConvertMasks {
        #[arg(long, default_value = "SegmentationClass")]
        mask_dir: PathBuf,
        #[arg(long, default_value = "labels")]
        output_dir: PathBuf,
        #[arg(long, default_value = "labelmap.txt")]
        labelmap: PathBuf,
    },

    /// Shuffle an images/labels directory pair into train/ and val/ subsets
    Split {
        #[arg(long)]
        images_dir: PathBuf,
        #[arg(long)]
        labels_dir: PathBuf,
        #[arg(long, default_value_t = 0.8)]
        train_fraction: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Generate a synthetic questionnaire CSV under the yes-count labeling rule
    SynthCsv {
        #[arg(long, default_value = "crop_disease_characteristics.csv")]
        output: PathBuf,
        #[arg(long, default_value_t = 2000)]
        samples: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 15)]
        yes_threshold: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Fuse => run_fuse(&config),
        Commands::Augment {
            image_dir,
            label_dir,
            out_image_dir,
            out_label_dir,
        } => {
            let stats = augment_directory(&image_dir, &label_dir, &out_image_dir, &out_label_dir)?;
            info!(
                "Augmentation complete: {} written, {} skipped",
                stats.written, stats.skipped
            );
            Ok(())
        }
        Commands::ConvertMasks {
            mask_dir,
            output_dir,
            labelmap,
        } => {
            let stats = convert_masks(&mask_dir, &output_dir, &labelmap)?;
            info!(
                "Converted {} masks ({} regions total)",
                stats.files, stats.regions
            );
            Ok(())
        }
        Commands::Split {
            images_dir,
            labels_dir,
            train_fraction,
            seed,
        } => {
            let stats = split_dataset(&images_dir, &labels_dir, SplitConfig {
                train_fraction,
                seed,
            })?;
            info!(
                "Dataset split complete: {} train, {} val ({} missing labels)",
                stats.train, stats.val, stats.missing_labels
            );
            Ok(())
        }
        Commands::SynthCsv {
            output,
            samples,
            seed,
            yes_threshold,
        } => {
            let stats = generate_csv(&output, &DISEASE_QUESTIONS, SynthConfig {
                samples,
                seed,
                yes_threshold,
            })?;
            info!(
                "Wrote {} synthetic rows ({} positive) to {}",
                stats.rows,
                stats.positives,
                output.display()
            );
            Ok(())
        }
    }
}

fn run_fuse(config: &AppConfig) -> Result<()> {
    info!("Loading models...");
    let bundle = ModelBundle::load(config)?;

    let mut console = Console::stdio();
    println!("Provide image paths:");
    let (signals, report) = pipeline::run(&bundle, config, &mut console)?;
    print_report(&signals, &report);
    Ok(())
}

fn print_report(signals: &SignalSummary, report: &FusionReport) {
    println!();
    println!("Multimodal inference results");
    println!("----------------------------");
    println!("Detector - disease: {}", signals.disease_detected);
    println!("Detector - insect:  {}", signals.insect_detected);
    println!("Tabular  - disease: {}", signals.disease_classified);
    println!("Tabular  - insect:  {}", signals.insect_classified);
    println!();
    println!("Crop Disease Present: {}", report.disease_present);
    println!("Crop Insect Present:  {}", report.insect_present);
}
