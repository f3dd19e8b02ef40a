//! Error types with actionable diagnostics.
//!
//! All fatal conditions are configuration or logic faults, not transient
//! failures; there is no retry path. Each variant carries enough context to
//! fix the offending configuration without a debugger.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for plantilla operations.
pub type Result<T> = std::result::Result<T, PlantillaError>;

/// Errors raised during template parsing, rendering, and dataset assembly.
#[derive(Error, Debug)]
pub enum PlantillaError {
    /// Template string could not be parsed into directives.
    #[error("Invalid template directive '*{directive}*': {message}\n  → Check the template string against the directive grammar")]
    TemplateParse { directive: String, message: String },

    /// A sentence directive referenced an index past the assembled input.
    #[error("Template references sentence {index} but only {count} sentences were provided")]
    SentenceIndexOutOfRange { index: usize, count: usize },

    /// Masked-prediction rendering requires a template.
    #[error("Prompt mode is enabled but no template was configured\n  → Set `template` (or `template_list`) in the configuration")]
    MissingTemplate,

    /// Masked-prediction rendering requires resolved label words.
    #[error("Prompt mode is enabled but no label-word mapping was configured\n  → Provide a label→word mapping covering every label")]
    MissingLabelWords,

    /// A label word does not map to exactly one sub-word token.
    #[error("Label word '{word}' for label '{label}' tokenizes to {token_count} tokens, expected exactly 1\n  → Pick a word that is a single token in this tokenizer's vocabulary")]
    LabelWordNotSingleToken { label: String, word: String, token_count: usize },

    /// A label named in the label list has no entry in the word mapping.
    #[error("No label word configured for label '{label}'")]
    LabelWordMissing { label: String },

    /// A label directive indexed past the available label entries.
    #[error("Template references label entry {index} but only {count} entries are available")]
    LabelIndexOutOfRange { index: usize, count: usize },

    /// A `labelx_i` directive was rendered without support labels.
    #[error("Template uses a labelx directive but no support labels were supplied for this example")]
    MissingSupportLabels,

    /// The rendered sequence contains no mask token (missing from the
    /// template, or truncated past the maximum length).
    #[error("No mask token in the rendered sequence of length {max_length}\n  → Ensure the template contains *mask* and that truncation does not drop it")]
    MaskTokenMissing { max_length: usize },

    /// Stratified demonstration selection produced an empty set.
    #[error("Demonstration selection produced an empty set\n  → The support pool must contain at least one example across all label buckets")]
    EmptyDemonstrationSet,

    /// An example carries a class label missing from the label list.
    #[error("Label '{label}' is not in the configured label list")]
    UnknownLabel { label: String },

    /// A regression label failed to parse as a number.
    #[error("Regression label '{label}' is not numeric")]
    InvalidRegressionLabel { label: String },

    /// Regression bucketing requires a configured median.
    #[error("Regression task '{task}' has no configured median\n  → Set `median` in the configuration to the task's training median")]
    MissingMedian { task: String },

    /// Split mode string was not recognized.
    #[error("Unknown split mode '{mode}'\n  → Expected one of: train, dev, test")]
    UnknownSplitMode { mode: String },

    /// Demonstration filtering was requested without embeddings.
    #[error("Demonstration filtering is enabled but no embedding store was supplied")]
    MissingEmbeddings,

    /// Embedding matrix row count does not match the example pool.
    #[error("Embedding store has {rows} rows for the {pool} pool but the pool holds {examples} examples")]
    EmbeddingShapeMismatch { pool: &'static str, rows: usize, examples: usize },

    /// Cached pool file could not be serialized or deserialized.
    #[error("Cache error at {}: {message}", path.display())]
    Cache { path: PathBuf, message: String },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PlantillaError {
    /// Attach context to an IO error.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_actionable() {
        let err = PlantillaError::LabelWordNotSingleToken {
            label: "positive".into(),
            word: "wonderful".into(),
            token_count: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("wonderful"));
        assert!(msg.contains("exactly 1"));
    }

    #[test]
    fn test_unknown_split_mode_lists_alternatives() {
        let err = PlantillaError::UnknownSplitMode { mode: "validation".into() };
        assert!(err.to_string().contains("train, dev, test"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = PlantillaError::io("reading cache", inner);
        assert!(err.to_string().contains("reading cache"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
