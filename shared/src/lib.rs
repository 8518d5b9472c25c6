use std::path::Path;

use serde::{Deserialize, Serialize};

/// Image formats accepted by the interactive collector and the dataset tools.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// A single object found by a detector capability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AnswerVectorError {
    #[error("Expected {expected} answers, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Answers must be 0 or 1, got {0}")]
    NonBinary(u8),
}

/// Ordered yes/no answers for one questionnaire. Position i answers question i
/// of the question set the vector was collected against, which is also the
/// feature column order the tabular classifier was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerVector {
    values: Vec<u8>,
}

impl AnswerVector {
    /// Exactly one 0/1 entry per question.
    pub fn new(values: Vec<u8>, question_count: usize) -> Result<Self, AnswerVectorError> {
        if values.len() != question_count {
            return Err(AnswerVectorError::LengthMismatch {
                expected: question_count,
                actual: values.len(),
            });
        }
        if let Some(&bad) = values.iter().find(|&&v| v > 1) {
            return Err(AnswerVectorError::NonBinary(bad));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn yes_count(&self) -> usize {
        self.values.iter().filter(|&&v| v == 1).count()
    }
}

/// The four independent signals produced by one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub disease_detected: bool,
    pub insect_detected: bool,
    pub disease_classified: bool,
    pub insect_classified: bool,
}

impl SignalSummary {
    /// Per-channel logical OR. Either signal firing is sufficient: the
    /// pipeline prefers false positives over missed detections.
    pub fn fuse(&self) -> FusionReport {
        FusionReport {
            disease_present: self.disease_detected || self.disease_classified,
            insect_present: self.insect_detected || self.insect_classified,
        }
    }
}

/// Final per-domain verdicts, printed at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionReport {
    pub disease_present: bool,
    pub insect_present: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(a: bool, b: bool, c: bool, d: bool) -> SignalSummary {
        SignalSummary {
            disease_detected: a,
            insect_detected: b,
            disease_classified: c,
            insect_classified: d,
        }
    }

    #[test]
    fn fuse_is_or_per_channel() {
        assert_eq!(
            signals(false, false, false, false).fuse(),
            FusionReport {
                disease_present: false,
                insect_present: false
            }
        );
        assert_eq!(
            signals(true, false, false, false).fuse(),
            FusionReport {
                disease_present: true,
                insect_present: false
            }
        );
        assert_eq!(
            signals(false, false, false, true).fuse(),
            FusionReport {
                disease_present: false,
                insect_present: true
            }
        );
        assert_eq!(
            signals(true, true, true, true).fuse(),
            FusionReport {
                disease_present: true,
                insect_present: true
            }
        );
    }

    #[test]
    fn disease_channel_ignores_insect_signals() {
        for insect_detected in [false, true] {
            for insect_classified in [false, true] {
                let report = signals(true, insect_detected, false, insect_classified).fuse();
                assert!(report.disease_present);
                let report = signals(false, insect_detected, false, insect_classified).fuse();
                assert!(!report.disease_present);
            }
        }
    }

    #[test]
    fn true_signal_dominates() {
        assert!(signals(true, false, false, false).fuse().disease_present);
        assert!(signals(false, false, true, false).fuse().disease_present);
        assert!(signals(true, false, true, false).fuse().disease_present);
    }

    #[test]
    fn answer_vector_rejects_wrong_length() {
        let err = AnswerVector::new(vec![1, 0], 3).unwrap_err();
        assert_eq!(
            err,
            AnswerVectorError::LengthMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn answer_vector_rejects_non_binary() {
        let err = AnswerVector::new(vec![1, 2, 0], 3).unwrap_err();
        assert_eq!(err, AnswerVectorError::NonBinary(2));
    }

    #[test]
    fn answer_vector_counts_yes() {
        let answers = AnswerVector::new(vec![1, 0, 1, 1], 4).unwrap();
        assert_eq!(answers.yes_count(), 3);
        assert_eq!(answers.values(), &[1, 0, 1, 1]);
    }

    #[test]
    fn image_extension_check_is_case_insensitive() {
        assert!(has_image_extension(Path::new("leaf.JPG")));
        assert!(has_image_extension(Path::new("leaf.jpeg")));
        assert!(has_image_extension(Path::new("dir/leaf.png")));
        assert!(!has_image_extension(Path::new("leaf.bmp")));
        assert!(!has_image_extension(Path::new("leaf")));
    }
}
