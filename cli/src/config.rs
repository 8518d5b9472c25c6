use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DISEASE_DETECTOR_PATH: &str = "models/disease_yolo.pt";
pub const INSECT_DETECTOR_PATH: &str = "models/insect_yolo.pt";
pub const DISEASE_CLASSIFIER_PATH: &str = "models/disease_tabnet.pt";
pub const INSECT_CLASSIFIER_PATH: &str = "models/insect_tabnet.pt";
pub const DISEASE_ENCODER_PATH: &str = "models/disease_label_encoder.json";
pub const INSECT_ENCODER_PATH: &str = "models/insect_label_encoder.json";

/// Labels that mean "nothing wrong". Compared against trimmed, lowercased
/// decoder output; an encoder file may override these with its own set.
pub const DEFAULT_NEGATIVE_LABELS: [&str; 3] = ["no disease", "none", "no insect"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Read(PathBuf, std::io::Error),
    #[error("Malformed config file '{0}': {1}")]
    Parse(PathBuf, serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub models: ModelPaths,
    pub yolo: YoloParams,
    pub negative_labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPaths {
    pub disease_detector: PathBuf,
    pub insect_detector: PathBuf,
    pub disease_classifier: PathBuf,
    pub insect_classifier: PathBuf,
    pub disease_encoder: PathBuf,
    pub insect_encoder: PathBuf,
}

/// Decode parameters for the detector capabilities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct YoloParams {
    pub input_size: u32,
    pub conf_threshold: f32,
    pub max_detections: usize,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            disease_detector: PathBuf::from(DISEASE_DETECTOR_PATH),
            insect_detector: PathBuf::from(INSECT_DETECTOR_PATH),
            disease_classifier: PathBuf::from(DISEASE_CLASSIFIER_PATH),
            insect_classifier: PathBuf::from(INSECT_CLASSIFIER_PATH),
            disease_encoder: PathBuf::from(DISEASE_ENCODER_PATH),
            insect_encoder: PathBuf::from(INSECT_ENCODER_PATH),
        }
    }
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            max_detections: 300,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models: ModelPaths::default(),
            yolo: YoloParams::default(),
            negative_labels: DEFAULT_NEGATIVE_LABELS
                .iter()
                .map(|label| label.to_string())
                .collect(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config =
            serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
