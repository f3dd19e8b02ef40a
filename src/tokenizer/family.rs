//! Tokenizer family capability descriptor.

use serde::{Deserialize, Serialize};

/// Behavioral variants across tokenizer families, resolved once when the
/// adapter is constructed.
///
/// `has_leading_token` is false for families without a beginning-of-sequence
/// token (T5-style): the renderer skips `cls` directives and drops the
/// leading token in non-templated mode. `has_segment_ids` is true only for
/// families whose models consume segment ids (BERT-style); other families
/// get no `token_type_ids` in the rendered feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerFamily {
    /// Whether sequences start with a beginning token.
    pub has_leading_token: bool,
    /// Whether the model consumes segment ids.
    pub has_segment_ids: bool,
}

impl TokenizerFamily {
    /// BERT-style: leading token and segment ids.
    #[must_use]
    pub const fn bert_like() -> Self {
        Self { has_leading_token: true, has_segment_ids: true }
    }

    /// RoBERTa/BART-style: leading token, no segment ids.
    #[must_use]
    pub const fn roberta_like() -> Self {
        Self { has_leading_token: true, has_segment_ids: false }
    }

    /// T5-style: no leading token, no segment ids.
    #[must_use]
    pub const fn t5_like() -> Self {
        Self { has_leading_token: false, has_segment_ids: false }
    }
}

impl Default for TokenizerFamily {
    fn default() -> Self {
        Self::roberta_like()
    }
}
