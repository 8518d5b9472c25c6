use std::path::Path;

use image::imageops::FilterType;
use shared::Detection;
use tch::{CModule, Device, Kind, Tensor};

use super::{ModelError, ObjectDetector};
use crate::config::YoloParams;

/// A TorchScript object-detection model. The export is expected to emit the
/// fused detection head `[1, 4 + classes, candidates]` with xywh boxes in
/// input-size pixel coordinates; segmentation variants are traced the same
/// way and only their box candidates are decoded.
pub struct YoloModule {
    module: CModule,
    device: Device,
    params: YoloParams,
}

impl YoloModule {
    pub fn load(path: &Path, device: Device, params: YoloParams) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::ArtifactMissing(path.to_path_buf()));
        }
        let module = CModule::load_on_device(path, device)
            .map_err(|e| ModelError::Load(path.to_path_buf(), e))?;
        Ok(Self {
            module,
            device,
            params,
        })
    }

    fn preprocess(&self, path: &Path) -> Result<Tensor, ModelError> {
        let img = image::open(path)
            .map_err(|e| ModelError::Image(path.to_path_buf(), e))?
            .to_rgb8();
        let size = self.params.input_size;
        let resized = image::imageops::resize(&img, size, size, FilterType::Triangle);

        let side = size as usize;
        let mut data = vec![0f32; 3 * side * side];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            data[y * side + x] = pixel[0] as f32 / 255.0;
            data[side * side + y * side + x] = pixel[1] as f32 / 255.0;
            data[2 * side * side + y * side + x] = pixel[2] as f32 / 255.0;
        }

        Ok(Tensor::from_slice(&data)
            .view([1, 3, side as i64, side as i64])
            .to_device(self.device))
    }

    fn decode(&self, output: &Tensor) -> Result<Vec<Detection>, ModelError> {
        let dims = output.size();
        if dims.len() != 3 || dims[0] != 1 || dims[1] <= 4 {
            return Err(ModelError::OutputShape(dims));
        }
        let attrs = dims[1] as usize;
        let n = dims[2] as usize;

        let flat = output
            .to_device(Device::Cpu)
            .to_kind(Kind::Float)
            .view([-1]);
        let mut data = vec![0f32; attrs * n];
        flat.copy_data(&mut data, attrs * n);

        let mut detections = Vec::new();
        for i in 0..n {
            let mut best = 0f32;
            let mut class_id = 0usize;
            for c in 4..attrs {
                let score = data[c * n + i];
                if score > best {
                    best = score;
                    class_id = c - 4;
                }
            }
            if best > self.params.conf_threshold {
                let cx = data[i];
                let cy = data[n + i];
                let w = data[2 * n + i];
                let h = data[3 * n + i];
                detections.push(Detection {
                    x1: cx - w / 2.0,
                    y1: cy - h / 2.0,
                    x2: cx + w / 2.0,
                    y2: cy + h / 2.0,
                    score: best,
                    class_id,
                });
            }
        }

        detections.sort_unstable_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        detections.truncate(self.params.max_detections);
        Ok(detections)
    }
}

impl ObjectDetector for YoloModule {
    fn detect(&self, image: &Path) -> Result<Vec<Detection>, ModelError> {
        let input = self.preprocess(image)?;
        let output = self.module.forward_ts(&[input])?;
        self.decode(&output)
    }
}
