//! Tokenizer trait definition.

use super::family::TokenizerFamily;

/// Token ID type
pub type TokenId = u32;

/// Sub-word tokenizer capability consumed by the renderer.
///
/// Encoding never adds special tokens; the renderer places structural tokens
/// itself according to the template.
pub trait Tokenizer: Send + Sync {
    /// Encode text to token IDs, without special tokens.
    fn encode(&self, text: &str) -> Vec<TokenId>;

    /// Decode token IDs to text.
    fn decode(&self, ids: &[TokenId]) -> String;

    /// Get ID for a single token string, if in the vocabulary.
    fn token_to_id(&self, token: &str) -> Option<TokenId>;

    /// Get the token string for an ID, if in the vocabulary.
    fn id_to_token(&self, id: TokenId) -> Option<String>;

    /// Beginning-of-sequence (classification) token id. Unused when the
    /// family has no leading token.
    fn cls_id(&self) -> TokenId;

    /// Mask token id for masked-prediction templates.
    fn mask_id(&self) -> TokenId;

    /// Separator token id.
    fn sep_id(&self) -> TokenId;

    /// Padding token id.
    fn pad_id(&self) -> TokenId;

    /// Behavioral capabilities of this tokenizer's model family.
    fn family(&self) -> TokenizerFamily;

    /// Stable name used as a cache-key component.
    fn name(&self) -> &str;
}
