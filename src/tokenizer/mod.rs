//! Tokenizer seam.
//!
//! The sub-word tokenizer is an external collaborator: rendering only needs
//! `encode`/`decode`, token↔id lookups, the four special-token ids, and a
//! [`TokenizerFamily`] descriptor naming the behavioral variants (leading
//! token, segment ids). Adapters for real tokenizers implement [`Tokenizer`];
//! [`WhitespaceTokenizer`] is a deterministic word-level implementation for
//! tests and examples.

mod family;
mod traits;
mod whitespace;

pub use family::TokenizerFamily;
pub use traits::{TokenId, Tokenizer};
pub use whitespace::WhitespaceTokenizer;
