//! Few-shot dataset configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Recognized options for few-shot dataset construction.
///
/// Built with `with_*` setters; unset options keep the defaults used by the
/// standard prompt-based fine-tuning recipes.
///
/// # Example
///
/// ```
/// use plantilla::FewShotConfig;
///
/// let config = FewShotConfig::new("sst-2", 128)
///     .with_prompt(true)
///     .with_template("*cls**sent_0*_It_was*mask*.*sep+*")
///     .with_label_word("0", "terrible")
///     .with_label_word("1", "great");
/// assert_eq!(config.max_seq_length, 128);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FewShotConfig {
    /// Task name, used in cache keys and diagnostics.
    pub task_name: String,
    /// Maximum rendered sequence length.
    pub max_seq_length: usize,
    /// Enable masked-prediction (prompt) rendering.
    pub prompt: bool,
    /// Template string; ignored when `template_list` is set.
    pub template: Option<String>,
    /// Alternative templates, rotated round-robin across samples.
    pub template_list: Option<Vec<String>>,
    /// Label → label-word mapping, validated against the tokenizer.
    pub label_word_mapping: BTreeMap<String, String>,
    /// Token budget for the first sentence of each rendered input.
    pub first_sent_limit: Option<usize>,
    /// Token budget for every other sentence.
    pub other_sent_limit: Option<usize>,
    /// Truncate over-long sequences from the head instead of the tail.
    pub truncate_head: bool,
    /// Filter demonstration candidates by embedding similarity.
    pub demo_filter: bool,
    /// Per-bucket retention rate for similarity filtering.
    pub demo_filter_rate: f64,
    /// Double `max_seq_length` when demonstrations are attached.
    pub double_demo: bool,
    /// In-context layout with the query at the head.
    pub in_context_head: bool,
    /// In-context layout with the query at the tail.
    pub in_context_tail: bool,
    /// Demonstration count for the in-context layout.
    pub in_context_count: usize,
    /// Demonstration samplings per query at inference time.
    pub num_sample: usize,
    /// Task median for regression bucketing.
    pub median: Option<f32>,
    /// Verbose per-candidate filter logging.
    pub debug_mode: bool,
    /// Rebuild the example cache even when present.
    pub overwrite_cache: bool,
    /// Seed for construction-time demonstration sampling.
    pub seed: Option<u64>,
}

impl FewShotConfig {
    /// Create a configuration for a task at the given sequence length.
    #[must_use]
    pub fn new(task_name: impl Into<String>, max_seq_length: usize) -> Self {
        Self {
            task_name: task_name.into(),
            max_seq_length,
            prompt: false,
            template: None,
            template_list: None,
            label_word_mapping: BTreeMap::new(),
            first_sent_limit: None,
            other_sent_limit: None,
            truncate_head: false,
            demo_filter: false,
            demo_filter_rate: 0.5,
            double_demo: false,
            in_context_head: false,
            in_context_tail: false,
            in_context_count: 32,
            num_sample: 16,
            median: None,
            debug_mode: false,
            overwrite_cache: false,
            seed: None,
        }
    }

    /// Enable masked-prediction rendering.
    #[must_use]
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    /// Set the template string.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set alternative templates for round-robin rotation.
    #[must_use]
    pub fn with_template_list(mut self, templates: Vec<String>) -> Self {
        self.template_list = Some(templates);
        self
    }

    /// Add one label → word entry.
    #[must_use]
    pub fn with_label_word(mut self, label: impl Into<String>, word: impl Into<String>) -> Self {
        self.label_word_mapping.insert(label.into(), word.into());
        self
    }

    /// Set the whole label-word mapping.
    #[must_use]
    pub fn with_label_word_mapping(mut self, mapping: BTreeMap<String, String>) -> Self {
        self.label_word_mapping = mapping;
        self
    }

    /// Cap the first sentence's token span.
    #[must_use]
    pub fn with_first_sent_limit(mut self, limit: usize) -> Self {
        self.first_sent_limit = Some(limit);
        self
    }

    /// Cap every other sentence's token span.
    #[must_use]
    pub fn with_other_sent_limit(mut self, limit: usize) -> Self {
        self.other_sent_limit = Some(limit);
        self
    }

    /// Truncate from the head instead of the tail.
    #[must_use]
    pub fn with_truncate_head(mut self, truncate_head: bool) -> Self {
        self.truncate_head = truncate_head;
        self
    }

    /// Enable similarity filtering of demonstration candidates.
    #[must_use]
    pub fn with_demo_filter(mut self, rate: f64) -> Self {
        self.demo_filter = true;
        self.demo_filter_rate = rate;
        self
    }

    /// Double the length budget when demonstrations are attached.
    #[must_use]
    pub fn with_double_demo(mut self, double_demo: bool) -> Self {
        self.double_demo = double_demo;
        self
    }

    /// Use the in-context layout with `count` demonstrations.
    #[must_use]
    pub fn with_in_context_head(mut self, count: usize) -> Self {
        self.in_context_head = true;
        self.in_context_count = count;
        self
    }

    /// Use the in-context layout (query last) with `count` demonstrations.
    #[must_use]
    pub fn with_in_context_tail(mut self, count: usize) -> Self {
        self.in_context_tail = true;
        self.in_context_count = count;
        self
    }

    /// Set the number of inference-time samplings per query.
    #[must_use]
    pub fn with_num_sample(mut self, num_sample: usize) -> Self {
        self.num_sample = num_sample;
        self
    }

    /// Set the regression median.
    #[must_use]
    pub fn with_median(mut self, median: f32) -> Self {
        self.median = Some(median);
        self
    }

    /// Enable verbose per-candidate filter logging.
    #[must_use]
    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// Rebuild the example cache even when present.
    #[must_use]
    pub fn with_overwrite_cache(mut self, overwrite: bool) -> Self {
        self.overwrite_cache = overwrite;
        self
    }

    /// Seed construction-time demonstration sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Whether either in-context flag is set.
    #[must_use]
    pub fn in_context(&self) -> bool {
        self.in_context_head || self.in_context_tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = FewShotConfig::new("sst-2", 128);
        assert_eq!(config.task_name, "sst-2");
        assert_eq!(config.max_seq_length, 128);
        assert!(!config.prompt);
        assert_eq!(config.num_sample, 16);
        assert_eq!(config.demo_filter_rate, 0.5);
        assert!(!config.in_context());
    }

    #[test]
    fn test_config_builders() {
        let config = FewShotConfig::new("sts-b", 64)
            .with_prompt(true)
            .with_template("*cls**mask**sent_0*")
            .with_label_word("0", "No")
            .with_label_word("1", "Yes")
            .with_median(2.5)
            .with_demo_filter(0.3)
            .with_seed(13);
        assert!(config.prompt);
        assert_eq!(config.label_word_mapping.len(), 2);
        assert_eq!(config.median, Some(2.5));
        assert!(config.demo_filter);
        assert_eq!(config.demo_filter_rate, 0.3);
        assert_eq!(config.seed, Some(13));
    }

    #[test]
    fn test_config_in_context_flags() {
        let head = FewShotConfig::new("t", 32).with_in_context_head(4);
        assert!(head.in_context());
        assert_eq!(head.in_context_count, 4);
        let tail = FewShotConfig::new("t", 32).with_in_context_tail(8);
        assert!(tail.in_context());
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = FewShotConfig::new("mnli", 256).with_template("*mask*");
        let json = serde_json::to_string(&config).unwrap();
        let restored: FewShotConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.task_name, "mnli");
        assert_eq!(restored.template.as_deref(), Some("*mask*"));
    }
}
