//! Example pools, demonstration selection, and the few-shot dataset index.

mod cache;
mod corpus;
mod dataset;
mod example;

pub use cache::load_or_build_pools;
pub use corpus::{CorpusProcessor, InMemoryCorpus};
pub use dataset::{FewShotDataset, IndexEntry, SplitMode};
pub use example::Example;
