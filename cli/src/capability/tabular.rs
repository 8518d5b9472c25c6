use std::path::Path;

use ndarray::ArrayView1;
use tch::{CModule, Device, Kind, Tensor};

use super::{ModelError, TabularClassifier};

/// A TorchScript tabular classifier: one forward pass over a single feature
/// row, argmax over the class logits.
pub struct TabularModule {
    module: CModule,
    device: Device,
}

impl TabularModule {
    pub fn load(path: &Path, device: Device) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::ArtifactMissing(path.to_path_buf()));
        }
        let module = CModule::load_on_device(path, device)
            .map_err(|e| ModelError::Load(path.to_path_buf(), e))?;
        Ok(Self { module, device })
    }
}

impl TabularClassifier for TabularModule {
    fn predict_class(&self, features: ArrayView1<'_, f32>) -> Result<i64, ModelError> {
        let row: Vec<f32> = features.iter().copied().collect();
        let input = Tensor::from_slice(&row)
            .to_kind(Kind::Float)
            .view([1, row.len() as i64])
            .to_device(self.device);
        let logits = self.module.forward_ts(&[input])?;
        let index = logits.view([-1]).argmax(0, false).int64_value(&[]);
        Ok(index)
    }
}
