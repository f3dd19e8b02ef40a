//! Rendered feature record.

use serde::{Deserialize, Serialize};

use crate::tokenizer::TokenId;

/// Numeric label attached to a rendered feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FeatureLabel {
    /// Classification class index.
    Class(usize),
    /// Regression target value.
    Value(f32),
}

/// One fully rendered model input.
///
/// All sequences have length exactly `max_length`. Constructed once per
/// (example, demonstration set, template, sample index) tuple and immutable
/// thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Token ids, padded/truncated to the configured maximum length.
    pub input_ids: Vec<TokenId>,
    /// 1 for real content, 0 for padding; parallel to `input_ids`.
    pub attention_mask: Vec<u8>,
    /// Segment ids, present only for tokenizer families that use them.
    pub token_type_ids: Option<Vec<u32>>,
    /// Index of the mask token (masked-prediction mode only).
    pub mask_pos: Option<usize>,
    /// Class index or regression target, when the example is labeled.
    pub label: Option<FeatureLabel>,
}

impl Feature {
    /// Serialize to a single JSON line.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization fails.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self).map(|mut s| {
            s.push('\n');
            s
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_json_line() {
        let feature = Feature {
            input_ids: vec![1, 5, 2, 0],
            attention_mask: vec![1, 1, 1, 0],
            token_type_ids: None,
            mask_pos: Some(1),
            label: Some(FeatureLabel::Class(0)),
        };
        let line = feature.to_json_string().unwrap();
        assert!(line.ends_with('\n'));
        assert!(line.contains("input_ids"));
        assert!(line.contains("mask_pos"));
    }

    #[test]
    fn test_feature_label_variants() {
        assert_ne!(
            serde_json::to_string(&FeatureLabel::Class(1)).unwrap(),
            serde_json::to_string(&FeatureLabel::Value(1.0)).unwrap()
        );
    }
}
