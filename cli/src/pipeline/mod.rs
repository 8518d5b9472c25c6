mod input;
mod questions;

pub use input::{Console, InputRejection, parse_image_path, parse_yes_no};
pub use questions::{DISEASE_QUESTIONS, INSECT_QUESTIONS, QuestionSet};

use std::io::{BufRead, Write};
use std::path::Path;

use log::info;
use ndarray::Array1;
use shared::{AnswerVector, FusionReport, SignalSummary};

use crate::capability::{
    LabelDecoder, ModelBundle, ModelError, ObjectDetector, TabularClassifier,
};
use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Operator input failed: {0}")]
    Input(#[from] std::io::Error),
}

/// True iff the detector found at least one object. Boxes, classes and
/// scores are discarded; presence alone propagates.
pub fn detect_presence<D: ObjectDetector>(detector: &D, image: &Path) -> Result<bool, ModelError> {
    Ok(!detector.detect(image)?.is_empty())
}

/// Runs the tabular capability over the ordered answers and inverts the
/// decoded label against the negative set: any label outside it counts as
/// an abnormal condition.
pub fn classify_abnormal<C: TabularClassifier>(
    classifier: &C,
    decoder: &LabelDecoder,
    answers: &AnswerVector,
    negative_labels: &[String],
) -> Result<bool, ModelError> {
    let features = Array1::from_iter(answers.values().iter().map(|&v| v as f32));
    let index = classifier.predict_class(features.view())?;
    let label = decoder.decode(index)?;
    Ok(decoder.is_abnormal(label, negative_labels))
}

/// One end-to-end interactive run: collect both images and both
/// questionnaires, fire all four signals, fuse.
pub fn run<R: BufRead, W: Write>(
    bundle: &ModelBundle,
    config: &AppConfig,
    console: &mut Console<R, W>,
) -> Result<(SignalSummary, FusionReport), PipelineError> {
    let disease_image = console.collect_image_path("Path to disease image")?;
    let insect_image = console.collect_image_path("Path to insect image")?;
    let disease_answers = console.collect_answers(&DISEASE_QUESTIONS)?;
    let insect_answers = console.collect_answers(&INSECT_QUESTIONS)?;

    info!("Running detector inference");
    let disease_detected = detect_presence(&bundle.disease_detector, &disease_image)?;
    let insect_detected = detect_presence(&bundle.insect_detector, &insect_image)?;

    info!("Running tabular inference");
    let disease_classified = classify_abnormal(
        &bundle.disease_classifier,
        &bundle.disease_decoder,
        &disease_answers,
        &config.negative_labels,
    )?;
    let insect_classified = classify_abnormal(
        &bundle.insect_classifier,
        &bundle.insect_decoder,
        &insect_answers,
        &config.negative_labels,
    )?;

    let signals = SignalSummary {
        disease_detected,
        insect_detected,
        disease_classified,
        insect_classified,
    };
    Ok((signals, signals.fuse()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayView1;
    use shared::Detection;
    use std::path::PathBuf;

    struct FixedDetector {
        boxes: usize,
    }

    impl ObjectDetector for FixedDetector {
        fn detect(&self, _image: &Path) -> Result<Vec<Detection>, ModelError> {
            Ok((0..self.boxes)
                .map(|i| Detection {
                    x1: 0.0,
                    y1: 0.0,
                    x2: 10.0,
                    y2: 10.0,
                    score: 0.9 - i as f32 * 0.1,
                    class_id: i,
                })
                .collect())
        }
    }

    /// Mirrors the synthetic training rule: class 1 iff more than 15 of the
    /// 30 answers are yes.
    struct YesCountClassifier {
        threshold: usize,
    }

    impl TabularClassifier for YesCountClassifier {
        fn predict_class(&self, features: ArrayView1<'_, f32>) -> Result<i64, ModelError> {
            let yes_count = features.iter().filter(|&&v| v == 1.0).count();
            Ok(i64::from(yes_count > self.threshold))
        }
    }

    fn answers_with_yes(yes: usize) -> AnswerVector {
        let mut values = vec![0u8; 30];
        for value in values.iter_mut().take(yes) {
            *value = 1;
        }
        AnswerVector::new(values, 30).unwrap()
    }

    fn negatives() -> Vec<String> {
        crate::config::DEFAULT_NEGATIVE_LABELS
            .iter()
            .map(|label| label.to_string())
            .collect()
    }

    #[test]
    fn empty_detection_set_means_absent() {
        let detector = FixedDetector { boxes: 0 };
        assert!(!detect_presence(&detector, &PathBuf::from("leaf.jpg")).unwrap());
    }

    #[test]
    fn any_detection_means_present_regardless_of_count() {
        for boxes in [1, 3, 7] {
            let detector = FixedDetector { boxes };
            assert!(detect_presence(&detector, &PathBuf::from("leaf.jpg")).unwrap());
        }
    }

    #[test]
    fn sixteen_yes_answers_cross_the_synthetic_rule() {
        let classifier = YesCountClassifier { threshold: 15 };
        let decoder = LabelDecoder::from_classes(vec![
            "No Disease".to_string(),
            "Disease Present".to_string(),
        ]);

        let abnormal =
            classify_abnormal(&classifier, &decoder, &answers_with_yes(16), &negatives()).unwrap();
        assert!(abnormal);

        let normal =
            classify_abnormal(&classifier, &decoder, &answers_with_yes(15), &negatives()).unwrap();
        assert!(!normal);
    }

    #[test]
    fn all_no_answers_decode_to_the_negative_class() {
        let classifier = YesCountClassifier { threshold: 15 };
        let decoder =
            LabelDecoder::from_classes(vec!["none".to_string(), "Insect Found".to_string()]);
        let abnormal =
            classify_abnormal(&classifier, &decoder, &answers_with_yes(0), &negatives()).unwrap();
        assert!(!abnormal);
    }

    #[test]
    fn out_of_range_prediction_is_a_fatal_error() {
        struct BadClassifier;
        impl TabularClassifier for BadClassifier {
            fn predict_class(&self, _features: ArrayView1<'_, f32>) -> Result<i64, ModelError> {
                Ok(7)
            }
        }
        let decoder = LabelDecoder::from_classes(vec!["none".to_string()]);
        let err = classify_abnormal(&BadClassifier, &decoder, &answers_with_yes(3), &negatives())
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownClass(7, 1)));
    }
}
