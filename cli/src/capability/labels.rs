use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::ModelError;

/// The label encoding fitted at training time, saved as JSON: `classes[i]`
/// is the label string for class index `i`. An encoder may also record its
/// own negative-label set; when present it overrides the configured one, so
/// a retrained encoder with different wording cannot silently invert
/// verdicts.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelDecoder {
    classes: Vec<String>,
    #[serde(default)]
    negative_labels: Option<Vec<String>>,
}

impl LabelDecoder {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ModelError::EncoderRead(path.to_path_buf(), e))?;
        let decoder: Self = serde_json::from_str(&raw)
            .map_err(|e| ModelError::EncoderParse(path.to_path_buf(), e))?;
        Ok(decoder)
    }

    pub fn from_classes(classes: Vec<String>) -> Self {
        Self {
            classes,
            negative_labels: None,
        }
    }

    pub fn decode(&self, index: i64) -> Result<&str, ModelError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(|label| label.as_str())
            .ok_or(ModelError::UnknownClass(index, self.classes.len()))
    }

    /// True when `label` names an abnormal condition: anything whose trimmed,
    /// lowercased form is not in the negative set.
    pub fn is_abnormal(&self, label: &str, fallback_negatives: &[String]) -> bool {
        let normalized = label.trim().to_lowercase();
        let negatives: &[String] = match &self.negative_labels {
            Some(own) => own,
            None => fallback_negatives,
        };
        !negatives
            .iter()
            .any(|negative| negative.trim().to_lowercase() == normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> Vec<String> {
        crate::config::DEFAULT_NEGATIVE_LABELS
            .iter()
            .map(|label| label.to_string())
            .collect()
    }

    #[test]
    fn decodes_known_indices() {
        let decoder =
            LabelDecoder::from_classes(vec!["No Disease".to_string(), "Early Blight".to_string()]);
        assert_eq!(decoder.decode(0).unwrap(), "No Disease");
        assert_eq!(decoder.decode(1).unwrap(), "Early Blight");
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let decoder = LabelDecoder::from_classes(vec!["None".to_string()]);
        assert!(matches!(
            decoder.decode(3),
            Err(ModelError::UnknownClass(3, 1))
        ));
        assert!(matches!(
            decoder.decode(-1),
            Err(ModelError::UnknownClass(-1, 1))
        ));
    }

    #[test]
    fn negative_labels_normalize_before_comparison() {
        let decoder = LabelDecoder::from_classes(vec![]);
        let fallback = fallback();
        assert!(!decoder.is_abnormal("  No Disease ", &fallback));
        assert!(!decoder.is_abnormal("NONE", &fallback));
        assert!(!decoder.is_abnormal("no insect", &fallback));
        assert!(decoder.is_abnormal("Early Blight", &fallback));
        assert!(decoder.is_abnormal("aphids", &fallback));
    }

    #[test]
    fn encoder_metadata_overrides_fallback_set() {
        let decoder: LabelDecoder = serde_json::from_str(
            r#"{"classes": ["No Insect Present", "Aphids"],
                "negative_labels": ["No Insect Present"]}"#,
        )
        .unwrap();
        let fallback = fallback();
        assert!(!decoder.is_abnormal("no insect present", &fallback));
        assert!(decoder.is_abnormal("Aphids", &fallback));
        // The fallback set no longer applies once the encoder carries its own.
        assert!(decoder.is_abnormal("none", &fallback));
    }

    #[test]
    fn encoder_json_without_metadata_uses_fallback() {
        let decoder: LabelDecoder =
            serde_json::from_str(r#"{"classes": ["No Disease", "Late Blight"]}"#).unwrap();
        assert!(!decoder.is_abnormal("No Disease", &fallback()));
        assert!(decoder.is_abnormal("Late Blight", &fallback()));
    }
}
