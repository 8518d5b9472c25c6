mod labels;
mod tabular;
mod yolo;

pub use labels::LabelDecoder;
pub use tabular::TabularModule;
pub use yolo::YoloModule;

use std::path::{Path, PathBuf};

use ndarray::ArrayView1;
use shared::Detection;

use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact not found: {0}")]
    ArtifactMissing(PathBuf),
    #[error("Failed to load model '{0}': {1}")]
    Load(PathBuf, tch::TchError),
    #[error("Inference failed: {0}")]
    Inference(#[from] tch::TchError),
    #[error("Failed to read image '{0}': {1}")]
    Image(PathBuf, image::ImageError),
    #[error("Unexpected detector output shape {0:?}")]
    OutputShape(Vec<i64>),
    #[error("Failed to read label encoder '{0}': {1}")]
    EncoderRead(PathBuf, std::io::Error),
    #[error("Malformed label encoder '{0}': {1}")]
    EncoderParse(PathBuf, serde_json::Error),
    #[error("Class index {0} outside encoder range ({1} classes)")]
    UnknownClass(i64, usize),
}

/// Finds objects in an image. Callers decide what presence means; boxes,
/// scores and classes are reported but may be discarded.
pub trait ObjectDetector {
    fn detect(&self, image: &Path) -> Result<Vec<Detection>, ModelError>;
}

/// Predicts a class index from a fixed-order numeric feature row.
pub trait TabularClassifier {
    fn predict_class(&self, features: ArrayView1<'_, f32>) -> Result<i64, ModelError>;
}

/// Everything the fusion pipeline needs, loaded once at startup and read-only
/// afterwards. There is no degraded mode: a single missing artifact fails the
/// whole load.
pub struct ModelBundle {
    pub disease_detector: YoloModule,
    pub insect_detector: YoloModule,
    pub disease_classifier: TabularModule,
    pub insect_classifier: TabularModule,
    pub disease_decoder: LabelDecoder,
    pub insect_decoder: LabelDecoder,
}

impl ModelBundle {
    pub fn load(config: &AppConfig) -> Result<Self, ModelError> {
        let device = tch::Device::cuda_if_available();
        log::info!("Loading model artifacts on {:?}", device);
        Ok(Self {
            disease_detector: YoloModule::load(&config.models.disease_detector, device, config.yolo)?,
            insect_detector: YoloModule::load(&config.models.insect_detector, device, config.yolo)?,
            disease_classifier: TabularModule::load(&config.models.disease_classifier, device)?,
            insect_classifier: TabularModule::load(&config.models.insect_classifier, device)?,
            disease_decoder: LabelDecoder::load(&config.models.disease_encoder)?,
            insect_decoder: LabelDecoder::load(&config.models.insect_encoder)?,
        })
    }
}
