use std::fs;
use std::path::Path;

use log::warn;
use shared::has_image_extension;

use super::{DatasetError, label_file_name, parse_label_file, write_label_file};

#[derive(Debug, Default, Clone, Copy)]
pub struct AugmentStats {
    pub written: usize,
    pub skipped: usize,
}

/// Horizontal-flip augmentation over an images/labels directory pair.
/// Every image with a parseable, non-empty label file yields a
/// `<stem>_aug.<ext>` image and a matching label file in the output
/// directories; sources stay in place. Images that cannot be read and
/// images without usable labels are skipped with a warning.
pub fn augment_directory(
    image_dir: &Path,
    label_dir: &Path,
    out_image_dir: &Path,
    out_label_dir: &Path,
) -> Result<AugmentStats, DatasetError> {
    fs::create_dir_all(out_image_dir)
        .map_err(|e| DatasetError::Io(out_image_dir.to_path_buf(), e))?;
    fs::create_dir_all(out_label_dir)
        .map_err(|e| DatasetError::Io(out_label_dir.to_path_buf(), e))?;

    let mut stats = AugmentStats::default();
    let entries =
        fs::read_dir(image_dir).map_err(|e| DatasetError::Io(image_dir.to_path_buf(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| DatasetError::Io(image_dir.to_path_buf(), e))?;
        let path = entry.path();
        if !path.is_file() || !has_image_extension(&path) {
            continue;
        }
        let Some(label_name) = label_file_name(&path) else {
            continue;
        };
        let label_path = label_dir.join(&label_name);
        if !label_path.exists() {
            warn!("No label file for {}, skipping", path.display());
            stats.skipped += 1;
            continue;
        }

        let labels = parse_label_file(&label_path)?;
        if labels.is_empty() {
            warn!("No valid boxes in {}, skipping", label_path.display());
            stats.skipped += 1;
            continue;
        }

        let img = match image::open(&path) {
            Ok(img) => img,
            Err(e) => {
                warn!("Could not load image {}: {e}", path.display());
                stats.skipped += 1;
                continue;
            }
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");

        let out_image = out_image_dir.join(format!("{stem}_aug.{ext}"));
        img.fliph()
            .save(&out_image)
            .map_err(|e| DatasetError::Image(out_image.clone(), e))?;

        let flipped: Vec<_> = labels
            .iter()
            .map(|label| label.flipped_horizontal())
            .collect();
        write_label_file(&out_label_dir.join(format!("{stem}_aug.txt")), &flipped)?;

        stats.written += 1;
    }

    Ok(stats)
}
