//! Label words and label buckets.
//!
//! Two distinct label views coexist: [`LabelWords`] resolves each class
//! label to a single vocabulary token id for masked-prediction templates,
//! and [`LabelBuckets`] maps example labels onto stratification buckets:
//! class positions for classification, a median split into `'0'`/`'1'` for
//! regression.

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{PlantillaError, Result};
use crate::template::FeatureLabel;
use crate::tokenizer::{TokenId, Tokenizer};

/// Characters that mark a label word as already vocabulary-shaped: such
/// words are looked up raw instead of encoded with a leading space.
const RAW_LOOKUP_PREFIXES: [char; 4] = ['<', '[', '.', ','];

/// Resolved label-word table: one token id per label position.
///
/// Positions follow the label list order for classification and the fixed
/// `['0', '1']` bucket order for regression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelWords {
    ids: Vec<TokenId>,
}

impl LabelWords {
    /// Resolve a label→word mapping against the tokenizer vocabulary.
    ///
    /// Sub-word tokenizers treat word-initial tokens specially, so each word
    /// is validated as `" " + word` unless it starts with a quoting or
    /// punctuation character, in which case it is looked up verbatim. A word
    /// that does not resolve to exactly one token is a fatal configuration
    /// error, never a runtime fallback.
    ///
    /// # Errors
    ///
    /// [`PlantillaError::LabelWordMissing`] when a label has no mapped word;
    /// [`PlantillaError::LabelWordNotSingleToken`] when a word is not a
    /// single vocabulary token.
    pub fn resolve(
        mapping: &BTreeMap<String, String>,
        label_list: &[String],
        tokenizer: &dyn Tokenizer,
    ) -> Result<Self> {
        let positions: Vec<String> = if label_list.len() > 1 {
            label_list.to_vec()
        } else {
            // Regression: '0' is the low bucket, '1' the high bucket.
            vec!["0".to_string(), "1".to_string()]
        };

        let mut ids = Vec::with_capacity(positions.len());
        for label in &positions {
            let word = mapping
                .get(label)
                .ok_or_else(|| PlantillaError::LabelWordMissing { label: label.clone() })?;
            let id = resolve_word(label, word, tokenizer)?;
            info!(
                label = %label,
                word = %word,
                token = %tokenizer.id_to_token(id).unwrap_or_default(),
                id,
                "resolved label word"
            );
            ids.push(id);
        }
        Ok(Self { ids })
    }

    /// Token id at label position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<TokenId> {
        self.ids.get(index).copied()
    }

    /// Number of label positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// All resolved ids in label order.
    #[must_use]
    pub fn ids(&self) -> &[TokenId] {
        &self.ids
    }
}

fn resolve_word(label: &str, word: &str, tokenizer: &dyn Tokenizer) -> Result<TokenId> {
    let starts_raw = word.chars().next().is_some_and(|c| RAW_LOOKUP_PREFIXES.contains(&c));
    if starts_raw {
        return tokenizer.token_to_id(word).ok_or_else(|| {
            PlantillaError::LabelWordNotSingleToken {
                label: label.to_string(),
                word: word.to_string(),
                token_count: tokenizer.encode(word).len(),
            }
        });
    }

    let encoded = tokenizer.encode(&format!(" {word}"));
    match encoded.as_slice() {
        [id] => Ok(*id),
        _ => Err(PlantillaError::LabelWordNotSingleToken {
            label: label.to_string(),
            word: word.to_string(),
            token_count: encoded.len(),
        }),
    }
}

/// Stratification buckets over the label space.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelBuckets {
    labels: Vec<String>,
    median: Option<f32>,
}

impl LabelBuckets {
    /// Build buckets from the corpus label list.
    ///
    /// A single-label list marks a regression task, which needs the task
    /// median for the low/high split.
    ///
    /// # Errors
    ///
    /// [`PlantillaError::MissingMedian`] for a regression task without a
    /// configured median.
    pub fn new(labels: Vec<String>, median: Option<f32>, task: &str) -> Result<Self> {
        if labels.len() == 1 && median.is_none() {
            return Err(PlantillaError::MissingMedian { task: task.to_string() });
        }
        Ok(Self { labels, median })
    }

    /// Whether this is a regression task.
    #[must_use]
    pub fn is_regression(&self) -> bool {
        self.labels.len() == 1
    }

    /// Number of buckets: class count, or 2 for regression.
    #[must_use]
    pub fn count(&self) -> usize {
        if self.is_regression() {
            2
        } else {
            self.labels.len()
        }
    }

    /// The corpus label list.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Bucket index for an example label.
    ///
    /// Classification: position in the label list. Regression: 0 when the
    /// value is ≤ the median, 1 otherwise.
    ///
    /// # Errors
    ///
    /// [`PlantillaError::UnknownLabel`] or
    /// [`PlantillaError::InvalidRegressionLabel`].
    pub fn bucket_of(&self, label: &str) -> Result<usize> {
        if self.is_regression() {
            let value = parse_regression(label)?;
            // new() guarantees a median for regression tasks
            let median = self.median.unwrap_or_default();
            Ok(usize::from(value > median))
        } else {
            self.labels
                .iter()
                .position(|l| l == label)
                .ok_or_else(|| PlantillaError::UnknownLabel { label: label.to_string() })
        }
    }

    /// Numeric feature label for an example: class index, or the raw value
    /// for regression. `None` stays `None` (unlabeled test data).
    ///
    /// # Errors
    ///
    /// Same as [`LabelBuckets::bucket_of`] for classification labels;
    /// [`PlantillaError::InvalidRegressionLabel`] for regression.
    pub fn feature_label(&self, label: Option<&str>) -> Result<Option<FeatureLabel>> {
        let Some(label) = label else { return Ok(None) };
        if self.is_regression() {
            Ok(Some(FeatureLabel::Value(parse_regression(label)?)))
        } else {
            Ok(Some(FeatureLabel::Class(self.bucket_of(label)?)))
        }
    }
}

fn parse_regression(label: &str) -> Result<f32> {
    label
        .parse::<f32>()
        .map_err(|_| PlantillaError::InvalidRegressionLabel { label: label.to_string() })
}
