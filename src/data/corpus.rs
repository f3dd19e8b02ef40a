//! Corpus provider seam.

use crate::error::Result;

use super::example::Example;

/// Source of raw examples for one task.
///
/// Implementations wrap whatever storage the corpus lives in (TSV splits,
/// JSONL, a database); the dataset only needs the three split accessors and
/// the ordered label list.
pub trait CorpusProcessor: Send + Sync {
    /// Training split (also the demonstration support pool).
    fn train_examples(&self) -> Result<Vec<Example>>;

    /// Development split.
    fn dev_examples(&self) -> Result<Vec<Example>>;

    /// Test split.
    fn test_examples(&self) -> Result<Vec<Example>>;

    /// Ordered label list; a single entry marks a regression task.
    fn labels(&self) -> Vec<String>;
}

/// Corpus over in-memory vectors, for tests and small experiments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    train: Vec<Example>,
    dev: Vec<Example>,
    test: Vec<Example>,
    labels: Vec<String>,
}

impl InMemoryCorpus {
    /// Create a corpus with the given label list.
    #[must_use]
    pub fn new(labels: Vec<String>) -> Self {
        Self { train: Vec::new(), dev: Vec::new(), test: Vec::new(), labels }
    }

    /// Set the training examples.
    #[must_use]
    pub fn with_train(mut self, examples: Vec<Example>) -> Self {
        self.train = examples;
        self
    }

    /// Set the development examples.
    #[must_use]
    pub fn with_dev(mut self, examples: Vec<Example>) -> Self {
        self.dev = examples;
        self
    }

    /// Set the test examples.
    #[must_use]
    pub fn with_test(mut self, examples: Vec<Example>) -> Self {
        self.test = examples;
        self
    }
}

impl CorpusProcessor for InMemoryCorpus {
    fn train_examples(&self) -> Result<Vec<Example>> {
        Ok(self.train.clone())
    }

    fn dev_examples(&self) -> Result<Vec<Example>> {
        Ok(self.dev.clone())
    }

    fn test_examples(&self) -> Result<Vec<Example>> {
        Ok(self.test.clone())
    }

    fn labels(&self) -> Vec<String> {
        self.labels.clone()
    }
}
