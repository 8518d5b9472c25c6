use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use shared::has_image_extension;

use super::{DatasetError, label_file_name};

#[derive(Debug, Clone, Copy)]
pub struct SplitConfig {
    pub train_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            seed: 42,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SplitStats {
    pub train: usize,
    pub val: usize,
    pub missing_labels: usize,
}

/// Shuffles the images directly under `images_dir` with a seeded RNG and
/// moves them (plus their label files) into `train/` and `val/`
/// subdirectories of the image and label directories. The file list is
/// sorted before shuffling so a given seed always produces the same
/// partition regardless of directory-read order.
pub fn split_dataset(
    images_dir: &Path,
    labels_dir: &Path,
    config: SplitConfig,
) -> Result<SplitStats, DatasetError> {
    if !(config.train_fraction > 0.0 && config.train_fraction < 1.0) {
        return Err(DatasetError::InvalidFraction(config.train_fraction));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(images_dir)
        .map_err(|e| DatasetError::Io(images_dir.to_path_buf(), e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    if files.is_empty() {
        return Err(DatasetError::EmptyImageDir(images_dir.to_path_buf()));
    }
    files.sort();

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    files.shuffle(&mut rng);

    let split_index = (config.train_fraction * files.len() as f64) as usize;
    let train_images = images_dir.join("train");
    let val_images = images_dir.join("val");
    let train_labels = labels_dir.join("train");
    let val_labels = labels_dir.join("val");
    for dir in [&train_images, &val_images, &train_labels, &val_labels] {
        fs::create_dir_all(dir).map_err(|e| DatasetError::Io(dir.clone(), e))?;
    }

    let mut stats = SplitStats::default();
    for (index, image_path) in files.iter().enumerate() {
        let is_train = index < split_index;
        let (image_dst, label_dst) = if is_train {
            (&train_images, &train_labels)
        } else {
            (&val_images, &val_labels)
        };

        let Some(file_name) = image_path.file_name() else {
            continue;
        };
        let target = image_dst.join(file_name);
        fs::rename(image_path, &target).map_err(|e| DatasetError::Io(target.clone(), e))?;

        if let Some(label_name) = label_file_name(image_path) {
            let label_src = labels_dir.join(&label_name);
            if label_src.exists() {
                let label_target = label_dst.join(&label_name);
                fs::rename(&label_src, &label_target)
                    .map_err(|e| DatasetError::Io(label_target.clone(), e))?;
            } else {
                warn!("Label not found for {}", image_path.display());
                stats.missing_labels += 1;
            }
        }

        if is_train {
            stats.train += 1;
        } else {
            stats.val += 1;
        }
    }

    Ok(stats)
}
