pub mod augment;
pub mod mask;
pub mod split;
pub mod synth;

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error at '{0}': {1}")]
    Io(PathBuf, std::io::Error),
    #[error("Failed to process image '{0}': {1}")]
    Image(PathBuf, image::ImageError),
    #[error("Malformed label line '{0}'")]
    MalformedLabel(String),
    #[error("No images found in '{0}'")]
    EmptyImageDir(PathBuf),
    #[error("Invalid train fraction {0}; expected a value in (0, 1)")]
    InvalidFraction(f64),
}

/// One `class cx cy w h` line of a YOLO detection label file, coordinates
/// normalized to [0, 1] relative to the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxLabel {
    pub class: u32,
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl BoxLabel {
    pub fn parse_line(line: &str) -> Result<Self, DatasetError> {
        let fields: Vec<f32> = line
            .split_whitespace()
            .take(5)
            .filter_map(|field| field.parse().ok())
            .collect();
        if fields.len() < 5 {
            return Err(DatasetError::MalformedLabel(line.trim().to_string()));
        }
        Ok(Self {
            class: fields[0] as u32,
            cx: fields[1],
            cy: fields[2],
            w: fields[3],
            h: fields[4],
        })
    }

    pub fn format_line(&self) -> String {
        format!(
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class, self.cx, self.cy, self.w, self.h
        )
    }

    /// Mirror across the vertical axis; only the box center moves.
    pub fn flipped_horizontal(&self) -> Self {
        Self {
            cx: 1.0 - self.cx,
            ..*self
        }
    }
}

/// Reads a label file, skipping (with a warning) any line that does not
/// parse. A missing file is an error; an empty one yields an empty vec.
pub fn parse_label_file(path: &Path) -> Result<Vec<BoxLabel>, DatasetError> {
    let raw = fs::read_to_string(path).map_err(|e| DatasetError::Io(path.to_path_buf(), e))?;
    let mut labels = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match BoxLabel::parse_line(line) {
            Ok(label) => labels.push(label),
            Err(_) => warn!("Skipping malformed label line in {}: {line}", path.display()),
        }
    }
    Ok(labels)
}

pub fn write_label_file(path: &Path, labels: &[BoxLabel]) -> Result<(), DatasetError> {
    let mut contents = String::new();
    for label in labels {
        contents.push_str(&label.format_line());
        contents.push('\n');
    }
    fs::write(path, contents).map_err(|e| DatasetError::Io(path.to_path_buf(), e))
}

/// `foo/bar.jpg` -> `bar.txt`, the label file name YOLO pairs with an image.
pub fn label_file_name(image_path: &Path) -> Option<String> {
    image_path
        .file_stem()
        .map(|stem| format!("{}.txt", stem.to_string_lossy()))
}
