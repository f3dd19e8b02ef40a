//! Few-shot dataset: demonstration selection, example assembly, indexing.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::FewShotConfig;
use crate::embedding::{cosine_similarity, EmbeddingStore};
use crate::error::{PlantillaError, Result};
use crate::label::{LabelBuckets, LabelWords};
use crate::template::{render, Feature, RenderRequest, Template};
use crate::tokenizer::Tokenizer;

use super::cache::load_or_build_pools;
use super::corpus::CorpusProcessor;
use super::example::Example;

/// Hard context limit used by the in-context layout.
const IN_CONTEXT_MAX_LENGTH: usize = 512;

/// Stratified selection keeps at most this many demonstrations per bucket.
const MAX_DEMO_PER_LABEL: usize = 1;

/// Dataset split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitMode {
    /// Training split; features are recomputed on every access.
    Train,
    /// Development split; features are precomputed.
    Dev,
    /// Test split; features are precomputed.
    Test,
}

impl SplitMode {
    /// Conventional split name for precomputed embedding files.
    ///
    /// MNLI ships matched and mismatched dev/test sets under distinct names;
    /// every other task uses the plain split name.
    #[must_use]
    pub fn embedding_split_name(&self, task_name: &str) -> String {
        let name = match (self, task_name) {
            (Self::Train, _) => "train",
            (Self::Dev, "mnli") => "dev_matched",
            (Self::Dev, "mnli-mm") => "dev_mismatched",
            (Self::Dev, _) => "dev",
            (Self::Test, "mnli") => "test_matched",
            (Self::Test, "mnli-mm") => "test_mismatched",
            (Self::Test, _) => "test",
        };
        name.to_string()
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Dev => write!(f, "dev"),
            Self::Test => write!(f, "test"),
        }
    }
}

impl FromStr for SplitMode {
    type Err = PlantillaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Self::Train),
            "dev" => Ok(Self::Dev),
            "test" => Ok(Self::Test),
            other => Err(PlantillaError::UnknownSplitMode { mode: other.to_string() }),
        }
    }
}

/// One enumerated (query, candidate pool, sample) triple.
///
/// Candidate indices reference the immutable support pool; the actual
/// demonstration subset is sampled from them at conversion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Index into the query pool.
    pub query_index: usize,
    /// Support-pool indices eligible as demonstrations for this entry.
    pub candidate_indices: Vec<usize>,
    /// Repetition number, also drives template rotation.
    pub sample_index: usize,
}

/// Few-shot dataset over a query pool with optional in-context
/// demonstrations drawn from the training support pool.
///
/// Non-train splits precompute every feature at construction; the train
/// split re-samples demonstrations on every [`get`](Self::get) so each epoch
/// sees fresh combinations.
pub struct FewShotDataset {
    config: FewShotConfig,
    tokenizer: Arc<dyn Tokenizer>,
    split: SplitMode,
    use_demo: bool,
    buckets: LabelBuckets,
    label_words: Option<LabelWords>,
    templates: Vec<Template>,
    rotate_templates: bool,
    num_sample: usize,
    support_examples: Vec<Example>,
    query_examples: Vec<Example>,
    embeddings: Option<EmbeddingStore>,
    entries: Vec<IndexEntry>,
    features: Option<Vec<Feature>>,
}

impl std::fmt::Debug for FewShotDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FewShotDataset")
            .field("config", &self.config)
            .field("split", &self.split)
            .field("use_demo", &self.use_demo)
            .field("buckets", &self.buckets)
            .field("label_words", &self.label_words)
            .field("templates", &self.templates)
            .field("rotate_templates", &self.rotate_templates)
            .field("num_sample", &self.num_sample)
            .field("support_examples", &self.support_examples)
            .field("query_examples", &self.query_examples)
            .field("embeddings", &self.embeddings)
            .field("entries", &self.entries)
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}

impl FewShotDataset {
    /// Build the dataset for one split.
    ///
    /// The support pool always comes from the training split; the query pool
    /// follows `split` (training queries are the support pool itself). With
    /// a `cache_dir` the parsed pools are cached on disk behind a file lock;
    /// `embeddings` is required when `demo_filter` is enabled.
    ///
    /// # Errors
    ///
    /// All fatal configuration errors surface here: unresolvable label
    /// words, prompt mode without template or mask, missing regression
    /// median, missing/mismatched embeddings, and (for non-train splits)
    /// any conversion failure such as an empty demonstration selection.
    pub fn new(
        config: FewShotConfig,
        tokenizer: Arc<dyn Tokenizer>,
        processor: &dyn CorpusProcessor,
        split: SplitMode,
        use_demo: bool,
        cache_dir: Option<&Path>,
        embeddings: Option<EmbeddingStore>,
    ) -> Result<Self> {
        if use_demo {
            info!("using demonstrations");
        }

        let buckets =
            LabelBuckets::new(processor.labels(), config.median, &config.task_name)?;

        let label_words = if config.prompt {
            if config.label_word_mapping.is_empty() {
                return Err(PlantillaError::MissingLabelWords);
            }
            Some(LabelWords::resolve(
                &config.label_word_mapping,
                buckets.labels(),
                tokenizer.as_ref(),
            )?)
        } else {
            None
        };

        let (templates, rotate_templates) = if config.prompt {
            let raw_templates = match (&config.template_list, &config.template) {
                (Some(list), _) if !list.is_empty() => list.clone(),
                (_, Some(single)) => vec![single.clone()],
                _ => return Err(PlantillaError::MissingTemplate),
            };
            let mut templates = Vec::with_capacity(raw_templates.len());
            for raw in &raw_templates {
                let template = Template::parse(raw)?;
                if !template.has_mask() {
                    return Err(PlantillaError::MaskTokenMissing {
                        max_length: config.max_seq_length,
                    });
                }
                templates.push(template);
            }
            (templates, config.template_list.is_some())
        } else {
            (Vec::new(), false)
        };

        // Multiple sampling: at inference time with demonstrations, each
        // query is rendered num_sample times with different demonstration
        // draws and the caller averages the predictions.
        let mut num_sample =
            if split == SplitMode::Train || !use_demo { 1 } else { config.num_sample };
        if config.prompt && rotate_templates {
            info!(
                templates = templates.len(),
                "multiple templates configured, multiplying num_sample"
            );
            num_sample *= templates.len();
        }
        info!(%split, num_sample, "few-shot dataset sampling plan");

        let build_pools = || -> Result<(Vec<Example>, Vec<Example>)> {
            let support = processor.train_examples()?;
            let query = match split {
                SplitMode::Dev => processor.dev_examples()?,
                SplitMode::Test => processor.test_examples()?,
                SplitMode::Train => support.clone(),
            };
            Ok((support, query))
        };
        let (support_examples, query_examples) = match cache_dir {
            Some(dir) => load_or_build_pools(
                dir,
                split,
                tokenizer.name(),
                config.max_seq_length,
                &config.task_name,
                config.overwrite_cache,
                build_pools,
            )?,
            None => build_pools()?,
        };

        let embeddings = if use_demo && config.demo_filter {
            let store = embeddings.ok_or(PlantillaError::MissingEmbeddings)?;
            store.validate(support_examples.len(), query_examples.len())?;
            Some(store)
        } else {
            embeddings
        };

        let filter_store =
            if use_demo && config.demo_filter { embeddings.as_ref() } else { None };
        let mut entries = Vec::with_capacity(num_sample * query_examples.len());
        for sample_index in 0..num_sample {
            for query_index in 0..query_examples.len() {
                let candidate_indices = match filter_store {
                    Some(store) => filter_candidates_by_similarity(
                        &support_examples,
                        &query_examples,
                        query_index,
                        &buckets,
                        store,
                        split,
                        &config,
                    )?,
                    None => {
                        // Training queries come from the support pool, so
                        // drop the query's own index there.
                        (0..support_examples.len())
                            .filter(|&s| s != query_index || split != SplitMode::Train)
                            .collect()
                    }
                };
                entries.push(IndexEntry { query_index, candidate_indices, sample_index });
            }
        }

        let mut dataset = Self {
            config,
            tokenizer,
            split,
            use_demo,
            buckets,
            label_words,
            templates,
            rotate_templates,
            num_sample,
            support_examples,
            query_examples,
            embeddings,
            entries,
            features: None,
        };

        if split != SplitMode::Train {
            let mut rng = dataset.construction_rng();
            let mut features = Vec::with_capacity(dataset.entries.len());
            for i in 0..dataset.entries.len() {
                let feature = dataset.convert_entry(&dataset.entries[i], &mut rng, i == 0)?;
                features.push(feature);
            }
            dataset.features = Some(features);
        }

        Ok(dataset)
    }

    fn construction_rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Number of dataset entries: `num_sample × |query pool|`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dataset has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The corpus label list.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        self.buckets.labels()
    }

    /// Samplings per query, templates included.
    #[must_use]
    pub fn num_sample(&self) -> usize {
        self.num_sample
    }

    /// The enumerated index entries.
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// The demonstration support pool.
    #[must_use]
    pub fn support_examples(&self) -> &[Example] {
        &self.support_examples
    }

    /// The query pool for this split.
    #[must_use]
    pub fn query_examples(&self) -> &[Example] {
        &self.query_examples
    }

    /// The split this dataset was built for.
    #[must_use]
    pub fn split(&self) -> SplitMode {
        self.split
    }

    /// The embedding store, when one was supplied.
    #[must_use]
    pub fn embeddings(&self) -> Option<&EmbeddingStore> {
        self.embeddings.as_ref()
    }

    /// Feature for entry `index`.
    ///
    /// Non-train splits return the precomputed feature. The train split
    /// recomputes on every call, drawing a fresh demonstration sample; the
    /// recomputation cost is intentional.
    ///
    /// # Errors
    ///
    /// Train-split conversion errors (e.g. an empty demonstration
    /// selection) surface per call.
    ///
    /// # Panics
    ///
    /// Panics when `index >= self.len()`.
    pub fn get(&self, index: usize) -> Result<Feature> {
        if let Some(features) = &self.features {
            return Ok(features[index].clone());
        }
        let mut rng = rand::rng();
        self.convert_entry(&self.entries[index], &mut rng, false)
    }

    fn convert_entry(
        &self,
        entry: &IndexEntry,
        rng: &mut impl Rng,
        verbose: bool,
    ) -> Result<Feature> {
        let example = &self.query_examples[entry.query_index];
        let supports = if self.use_demo {
            let candidates: Vec<&Example> = entry
                .candidate_indices
                .iter()
                .map(|&i| &self.support_examples[i])
                .collect();
            self.select_demonstrations(&candidates, rng)?
        } else {
            Vec::new()
        };

        // Round-robin template rotation keyed on this entry's own sample
        // index, for the eager and lazy paths alike.
        let template = if self.templates.is_empty() {
            None
        } else if self.rotate_templates {
            Some(&self.templates[entry.sample_index % self.templates.len()])
        } else {
            Some(&self.templates[0])
        };

        let feature = self.convert(example, &supports, template)?;
        if verbose {
            info!(
                guid = %example.guid,
                decoded = %self.tokenizer.decode(&feature.input_ids),
                mask_pos = ?feature.mask_pos,
                label = ?feature.label,
                "first converted example"
            );
        }
        Ok(feature)
    }

    /// Select demonstrations from the entry's candidate examples.
    ///
    /// In-context mode keeps the first `in_context_count` of a random
    /// permutation. Stratified mode caps each label bucket at
    /// [`MAX_DEMO_PER_LABEL`] and must produce a non-empty selection.
    fn select_demonstrations(
        &self,
        candidates: &[&Example],
        rng: &mut impl Rng,
    ) -> Result<Vec<Example>> {
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.shuffle(rng);

        let mut selection = Vec::new();
        if self.config.in_context() {
            for &i in order.iter().take(self.config.in_context_count) {
                selection.push(candidates[i].clone());
            }
        } else {
            let mut counts = vec![0usize; self.buckets.count()];
            for &i in &order {
                let label = candidates[i].label.as_deref().unwrap_or_default();
                let bucket = self.buckets.bucket_of(label)?;
                if counts[bucket] < MAX_DEMO_PER_LABEL {
                    selection.push(candidates[i].clone());
                    counts[bucket] += 1;
                }
                if counts.iter().sum::<usize>() == counts.len() * MAX_DEMO_PER_LABEL {
                    break;
                }
            }
            if selection.is_empty() {
                return Err(PlantillaError::EmptyDemonstrationSet);
            }
        }
        Ok(selection)
    }

    /// Assemble the query and demonstrations into one sentence list and
    /// render it.
    fn convert(
        &self,
        example: &Example,
        supports: &[Example],
        template: Option<&Template>,
    ) -> Result<Feature> {
        let label = self.buckets.feature_label(example.label.as_deref())?;

        let mut max_length = self.config.max_seq_length;
        let mut sentences = example.sentences();
        let mut support_labels: Option<Vec<usize>> = None;

        if self.use_demo {
            if self.config.double_demo {
                // max_seq_length is the budget for a single example here.
                max_length *= 2;
            }
            if self.config.in_context() {
                max_length = IN_CONTEXT_MAX_LENGTH;
            }

            if self.config.in_context() {
                let mut labels = Vec::with_capacity(supports.len());
                for support in supports {
                    sentences.extend(support.sentences());
                    let label = support.label.as_deref().unwrap_or_default();
                    labels.push(self.buckets.bucket_of(label)?);
                }
                support_labels = Some(labels);
            } else {
                // Group demonstrations by bucket, in canonical label order;
                // same-bucket demonstrations keep their selection order.
                for bucket in 0..self.buckets.count() {
                    for support in supports {
                        let label = support.label.as_deref().unwrap_or_default();
                        if self.buckets.bucket_of(label)? == bucket {
                            sentences.extend(support.sentences());
                        }
                    }
                }
            }
        }

        let mut request = RenderRequest::new(max_length)
            .with_truncate_head(self.config.truncate_head);
        if let Some(template) = template {
            request = request.with_template(template);
        }
        if let Some(words) = &self.label_words {
            request = request.with_label_words(words);
        }
        if let Some(limit) = self.config.first_sent_limit {
            request = request.with_first_sent_limit(limit);
        }
        if let Some(limit) = self.config.other_sent_limit {
            request = request.with_other_sent_limit(limit);
        }
        if let Some(labels) = &support_labels {
            request = request.with_support_labels(labels);
        }

        let mut feature = render(self.tokenizer.as_ref(), &sentences, &request)?;
        feature.label = label;
        Ok(feature)
    }
}

/// Rank candidate supports by cosine similarity to the query and cap
/// retention per bucket to `floor(pool/buckets * rate)`.
fn filter_candidates_by_similarity(
    support: &[Example],
    query: &[Example],
    query_index: usize,
    buckets: &LabelBuckets,
    store: &EmbeddingStore,
    split: SplitMode,
    config: &FewShotConfig,
) -> Result<Vec<usize>> {
    let mut scored: Vec<(usize, f32)> = (0..support.len())
        .filter(|&s| s != query_index || split != SplitMode::Train)
        .map(|s| (s, cosine_similarity(store.support(s), store.query(query_index))))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    // Regression has two synthetic buckets over one label, so the per-bucket
    // pool is half the candidate set.
    let bucket_count = buckets.count();
    let pool_per_bucket =
        if buckets.is_regression() { scored.len() / 2 } else { scored.len() / bucket_count };
    let limit_each = (pool_per_bucket as f64 * config.demo_filter_rate) as usize;

    if config.debug_mode {
        let example = &query[query_index];
        debug!(
            label = example.label.as_deref().unwrap_or(""),
            text = example.text_a.as_deref().unwrap_or(""),
            "filtering demonstrations for query"
        );
    }

    let mut counts = vec![0usize; bucket_count];
    let mut kept = Vec::new();
    for (s, score) in scored {
        let label = support[s].label.as_deref().unwrap_or_default();
        let bucket = buckets.bucket_of(label)?;
        if counts[bucket] < limit_each {
            counts[bucket] += 1;
            kept.push(s);
            if config.debug_mode {
                debug!(
                    score,
                    label,
                    text = support[s].text_a.as_deref().unwrap_or(""),
                    "kept candidate"
                );
            }
        }
    }
    Ok(kept)
}
