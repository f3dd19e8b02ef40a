//! Word-level tokenizer for tests and examples.

use std::collections::HashMap;

use super::family::TokenizerFamily;
use super::traits::{TokenId, Tokenizer};

/// Deterministic whitespace tokenizer over a fixed word vocabulary.
///
/// One token per whitespace-separated word; unknown words map to `<unk>`.
/// Special tokens occupy the first five ids. Not a real sub-word tokenizer:
/// it exists so rendering and dataset logic can be exercised without a model
/// vocabulary on disk.
#[derive(Debug, Clone)]
pub struct WhitespaceTokenizer {
    vocab: HashMap<String, TokenId>,
    id_to_word: HashMap<TokenId, String>,
    family: TokenizerFamily,
}

/// Padding token id.
pub(crate) const PAD_ID: TokenId = 0;
const CLS_ID: TokenId = 1;
const SEP_ID: TokenId = 2;
const MASK_ID: TokenId = 3;
const UNK_ID: TokenId = 4;

const SPECIALS: [(&str, TokenId); 5] = [
    ("<pad>", PAD_ID),
    ("<cls>", CLS_ID),
    ("<sep>", SEP_ID),
    ("<mask>", MASK_ID),
    ("<unk>", UNK_ID),
];

impl WhitespaceTokenizer {
    /// Create a tokenizer whose vocabulary is the given word list, in order.
    ///
    /// Duplicate words keep their first id.
    #[must_use]
    pub fn with_vocab<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut vocab = HashMap::new();
        let mut id_to_word = HashMap::new();
        for (word, id) in SPECIALS {
            vocab.insert(word.to_string(), id);
            id_to_word.insert(id, word.to_string());
        }

        let mut next_id = UNK_ID + 1;
        for word in words {
            if !vocab.contains_key(word) {
                vocab.insert(word.to_string(), next_id);
                id_to_word.insert(next_id, word.to_string());
                next_id += 1;
            }
        }

        Self { vocab, id_to_word, family: TokenizerFamily::default() }
    }

    /// Override the family descriptor (default: RoBERTa-like).
    #[must_use]
    pub fn with_family(mut self, family: TokenizerFamily) -> Self {
        self.family = family;
        self
    }

    /// Number of entries in the vocabulary, specials included.
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn encode(&self, text: &str) -> Vec<TokenId> {
        text.split_whitespace()
            .map(|word| self.vocab.get(word).copied().unwrap_or(UNK_ID))
            .collect()
    }

    fn decode(&self, ids: &[TokenId]) -> String {
        ids.iter()
            .map(|id| self.id_to_word.get(id).map_or("<unk>", String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn token_to_id(&self, token: &str) -> Option<TokenId> {
        self.vocab.get(token).copied()
    }

    fn id_to_token(&self, id: TokenId) -> Option<String> {
        self.id_to_word.get(&id).cloned()
    }

    fn cls_id(&self) -> TokenId {
        CLS_ID
    }

    fn mask_id(&self) -> TokenId {
        MASK_ID
    }

    fn sep_id(&self) -> TokenId {
        SEP_ID
    }

    fn pad_id(&self) -> TokenId {
        PAD_ID
    }

    fn family(&self) -> TokenizerFamily {
        self.family
    }

    fn name(&self) -> &str {
        "WhitespaceTokenizer"
    }
}
