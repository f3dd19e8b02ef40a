//! # plantilla
//!
//! Prompt-template dataset construction for few-shot language-model
//! fine-tuning.
//!
//! Given raw text examples and a textual template, plantilla renders
//! fixed-length token-id features (attention masks, segment ids, mask-token
//! positions) for masked or causal language models, optionally augmented
//! with in-context demonstrations sampled from a support pool.
//!
//! - **Template compiler** ([`template`]): compiles the `*`-delimited
//!   template mini-language into directives and renders them against a
//!   tokenizer.
//! - **Demonstration selection** ([`data`]): label-stratified random
//!   sampling with optional embedding-similarity filtering.
//! - **Dataset index** ([`data::FewShotDataset`]): enumerates
//!   (query × sampling) entries, precomputing features for evaluation
//!   splits and re-sampling per access for training.
//!
//! The sub-word tokenizer, corpus loading, and the embedding model are
//! external collaborators behind the [`Tokenizer`], [`CorpusProcessor`],
//! and [`EmbeddingStore`] seams.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use plantilla::{
//!     Example, FewShotConfig, FewShotDataset, InMemoryCorpus, SplitMode,
//!     WhitespaceTokenizer,
//! };
//!
//! fn main() -> plantilla::Result<()> {
//!     let tokenizer = Arc::new(WhitespaceTokenizer::with_vocab([
//!         "a", "gripping", "dull", "film", "It", "was", "great", "terrible", ".",
//!     ]));
//!     let corpus = InMemoryCorpus::new(vec!["0".into(), "1".into()])
//!         .with_train(vec![
//!             Example::new("train-0", "a dull film", Some("0")),
//!             Example::new("train-1", "a gripping film", Some("1")),
//!         ])
//!         .with_dev(vec![Example::new("dev-0", "a gripping film", Some("1"))]);
//!
//!     let config = FewShotConfig::new("sst-2", 32)
//!         .with_prompt(true)
//!         .with_template("*cls**sent_0*_It_was*mask*.*sep+*")
//!         .with_label_word("0", "terrible")
//!         .with_label_word("1", "great");
//!
//!     let dataset = FewShotDataset::new(
//!         config, tokenizer, &corpus, SplitMode::Dev, false, None, None,
//!     )?;
//!     let feature = dataset.get(0)?;
//!     assert_eq!(feature.input_ids.len(), 32);
//!     assert!(feature.mask_pos.is_some());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod embedding;
pub mod error;
pub mod label;
pub mod template;
pub mod tokenizer;

pub use config::FewShotConfig;
pub use data::{
    load_or_build_pools, CorpusProcessor, Example, FewShotDataset, InMemoryCorpus, IndexEntry,
    SplitMode,
};
pub use embedding::{cosine_similarity, EmbeddingStore};
pub use error::{PlantillaError, Result};
pub use label::{LabelBuckets, LabelWords};
pub use template::{render, Feature, FeatureLabel, RenderRequest, Template};
pub use tokenizer::{TokenId, Tokenizer, TokenizerFamily, WhitespaceTokenizer};
