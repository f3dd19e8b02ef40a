//! Raw text example record.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single labeled (or unlabeled) text example.
///
/// `label` holds the class name for classification, the numeric value as a
/// string for regression, and `None` for unlabeled test data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// Unique identifier, e.g. `"train-42"`.
    pub guid: String,
    /// First (or only) sentence. Logically required but may be absent in
    /// dirty corpora.
    pub text_a: Option<String>,
    /// Second sentence for sentence-pair tasks.
    pub text_b: Option<String>,
    /// Class name, numeric string, or absent.
    pub label: Option<String>,
}

impl Example {
    /// Create a single-sentence example.
    #[must_use]
    pub fn new(
        guid: impl Into<String>,
        text_a: impl Into<String>,
        label: Option<&str>,
    ) -> Self {
        Self {
            guid: guid.into(),
            text_a: Some(text_a.into()),
            text_b: None,
            label: label.map(String::from),
        }
    }

    /// Attach the second sentence.
    #[must_use]
    pub fn with_text_b(mut self, text_b: impl Into<String>) -> Self {
        self.text_b = Some(text_b.into());
        self
    }

    /// The example's sentence tuple: `[text_a]` or `[text_a, text_b]`.
    ///
    /// A missing `text_a` is substituted with an empty string and logged;
    /// downstream rendering treats it as empty content, not an error.
    #[must_use]
    pub fn sentences(&self) -> Vec<Option<String>> {
        let text_a = match &self.text_a {
            Some(text) => text.clone(),
            None => {
                warn!(guid = %self.guid, "example has no text_a, substituting empty string");
                String::new()
            }
        };
        match &self.text_b {
            None => vec![Some(text_a)],
            Some(text_b) => vec![Some(text_a), Some(text_b.clone())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_sentence_tuple_form() {
        let example = Example::new("train-0", "hello world", Some("1"));
        assert_eq!(example.sentences(), vec![Some("hello world".to_string())]);
    }

    #[test]
    fn test_sentence_pair_tuple_form() {
        let example = Example::new("train-1", "premise", Some("0")).with_text_b("hypothesis");
        assert_eq!(
            example.sentences(),
            vec![Some("premise".to_string()), Some("hypothesis".to_string())]
        );
    }

    #[test]
    fn test_missing_text_a_becomes_empty() {
        let example = Example {
            guid: "test-0".into(),
            text_a: None,
            text_b: None,
            label: None,
        };
        assert_eq!(example.sentences(), vec![Some(String::new())]);
    }

    #[test]
    fn test_serde_round_trip() {
        let example = Example::new("dev-3", "text", Some("pos")).with_text_b("more");
        let json = serde_json::to_string(&example).unwrap();
        let restored: Example = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, example);
    }
}
