//! Template rendering into fixed-length token sequences.

use tracing::warn;

use crate::error::{PlantillaError, Result};
use crate::label::LabelWords;
use crate::tokenizer::{TokenId, Tokenizer};

use super::feature::Feature;
use super::parse::{CaseTransform, Directive, Template};

/// Everything a single render needs beyond the sentences themselves.
///
/// A request with a template renders in masked-prediction mode: the output
/// must contain the mask token and carries its position. A request without
/// a template renders the plain `[cls] sent [sep] sent [sep]` layout.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// Compiled template, or `None` for the non-templated layout.
    pub template: Option<&'a Template>,
    /// Resolved label words for `label_i`/`labelx_i` directives.
    pub label_words: Option<&'a LabelWords>,
    /// Output length; every rendered sequence is padded/truncated to this.
    pub max_length: usize,
    /// Token budget for sentence 0, applied to that directive's own span.
    pub first_sent_limit: Option<usize>,
    /// Token budget for every other sentence directive.
    pub other_sent_limit: Option<usize>,
    /// Truncate from the head instead of the tail when over budget.
    pub truncate_head: bool,
    /// Bucket index per demonstration, for `labelx_i` directives.
    pub support_labels: Option<&'a [usize]>,
}

impl<'a> RenderRequest<'a> {
    /// Request for the non-templated layout at the given output length.
    #[must_use]
    pub fn new(max_length: usize) -> Self {
        Self {
            template: None,
            label_words: None,
            max_length,
            first_sent_limit: None,
            other_sent_limit: None,
            truncate_head: false,
            support_labels: None,
        }
    }

    /// Render through a template (masked-prediction mode).
    #[must_use]
    pub fn with_template(mut self, template: &'a Template) -> Self {
        self.template = Some(template);
        self
    }

    /// Supply the resolved label-word table.
    #[must_use]
    pub fn with_label_words(mut self, words: &'a LabelWords) -> Self {
        self.label_words = Some(words);
        self
    }

    /// Cap the token span of sentence 0.
    #[must_use]
    pub fn with_first_sent_limit(mut self, limit: usize) -> Self {
        self.first_sent_limit = Some(limit);
        self
    }

    /// Cap the token span of every other sentence.
    #[must_use]
    pub fn with_other_sent_limit(mut self, limit: usize) -> Self {
        self.other_sent_limit = Some(limit);
        self
    }

    /// Truncate over-budget sequences from the head.
    #[must_use]
    pub fn with_truncate_head(mut self, truncate_head: bool) -> Self {
        self.truncate_head = truncate_head;
        self
    }

    /// Supply per-demonstration bucket indices for `labelx_i`.
    #[must_use]
    pub fn with_support_labels(mut self, labels: &'a [usize]) -> Self {
        self.support_labels = Some(labels);
        self
    }
}

/// Render sentences into a fixed-length feature.
///
/// `sentences` is the assembled sentence list: the query's sentence(s)
/// followed by any demonstration sentences. `None` entries are skipped in
/// the non-templated layout and substituted with an empty string (with a
/// warning) when a template references them.
///
/// # Errors
///
/// Fatal template/configuration errors: unresolvable sentence or label
/// references, missing label words or support labels, and a mask token
/// absent from the final sequence in masked-prediction mode.
pub fn render(
    tokenizer: &dyn Tokenizer,
    sentences: &[Option<String>],
    request: &RenderRequest<'_>,
) -> Result<Feature> {
    let family = tokenizer.family();
    let mut input_ids: Vec<TokenId> = Vec::new();
    let mut attention_mask: Vec<u8> = Vec::new();
    let mut token_type_ids: Vec<u32> = Vec::new();

    if let Some(template) = request.template {
        let mut segment_id: u32 = 0;
        for directive in template.directives() {
            let mut advance_segment = false;
            let new_tokens = match directive {
                Directive::Cls => {
                    if !family.has_leading_token {
                        continue;
                    }
                    vec![tokenizer.cls_id()]
                }
                Directive::Mask => vec![tokenizer.mask_id()],
                Directive::Sep => vec![tokenizer.sep_id()],
                Directive::SepPlus => {
                    advance_segment = true;
                    vec![tokenizer.sep_id()]
                }
                Directive::Label { index } => {
                    vec![label_word(request.label_words, *index)?]
                }
                Directive::LabelAt { index } => {
                    let support =
                        request.support_labels.ok_or(PlantillaError::MissingSupportLabels)?;
                    let position = support.get(*index).copied().ok_or(
                        PlantillaError::LabelIndexOutOfRange {
                            index: *index,
                            count: support.len(),
                        },
                    )?;
                    vec![label_word(request.label_words, position)?]
                }
                Directive::Sent { index, leading_space, drop_last, case } => {
                    let mut tokens =
                        encode_sentence(tokenizer, sentences, *index, *leading_space, *drop_last, *case)?;
                    let limit = if *index == 0 {
                        request.first_sent_limit
                    } else {
                        request.other_sent_limit
                    };
                    if let Some(limit) = limit {
                        tokens.truncate(limit);
                    }
                    tokens
                }
                Directive::Literal(text) => encode_literal(tokenizer, text),
            };

            attention_mask.extend(std::iter::repeat(1).take(new_tokens.len()));
            token_type_ids.extend(std::iter::repeat(segment_id).take(new_tokens.len()));
            input_ids.extend(new_tokens);

            if advance_segment {
                segment_id += 1;
            }
        }
    } else {
        input_ids.push(tokenizer.cls_id());
        attention_mask.push(1);
        token_type_ids.push(0);

        for (sent_id, text) in sentences.iter().enumerate() {
            // A sentence slot that is absent entirely (no text_b) is skipped.
            let Some(text) = text else { continue };
            let mut tokens = tokenizer.encode(text);
            tokens.push(tokenizer.sep_id());
            attention_mask.extend(std::iter::repeat(1).take(tokens.len()));
            token_type_ids.extend(std::iter::repeat(sent_id as u32).take(tokens.len()));
            input_ids.extend(tokens);
        }

        if !family.has_leading_token {
            input_ids.remove(0);
            attention_mask.remove(0);
            token_type_ids.remove(0);
        }
    }

    if request.first_sent_limit.is_some() && input_ids.len() > request.max_length {
        warn!(
            length = input_ids.len(),
            max_length = request.max_length,
            text = %tokenizer.decode(&input_ids),
            "input exceeds max_length despite sentence limits; content will be truncated"
        );
    }

    while input_ids.len() < request.max_length {
        input_ids.push(tokenizer.pad_id());
        attention_mask.push(0);
        token_type_ids.push(0);
    }

    if input_ids.len() > request.max_length {
        let excess = input_ids.len() - request.max_length;
        if request.truncate_head {
            input_ids.drain(..excess);
            attention_mask.drain(..excess);
            token_type_ids.drain(..excess);
        } else {
            input_ids.truncate(request.max_length);
            attention_mask.truncate(request.max_length);
            token_type_ids.truncate(request.max_length);
        }
    }

    // Masked-prediction mode: the template carries a mask directive, and its
    // rendered position must survive truncation.
    let mask_pos = match request.template {
        Some(template) if template.has_mask() => {
            let pos = input_ids
                .iter()
                .position(|&id| id == tokenizer.mask_id())
                .ok_or(PlantillaError::MaskTokenMissing { max_length: request.max_length })?;
            debug_assert!(pos < request.max_length);
            Some(pos)
        }
        _ => None,
    };

    Ok(Feature {
        input_ids,
        attention_mask,
        token_type_ids: family.has_segment_ids.then_some(token_type_ids),
        mask_pos,
        label: None,
    })
}

fn label_word(words: Option<&LabelWords>, index: usize) -> Result<TokenId> {
    let words = words.ok_or(PlantillaError::MissingLabelWords)?;
    words
        .get(index)
        .ok_or(PlantillaError::LabelIndexOutOfRange { index, count: words.len() })
}

fn encode_sentence(
    tokenizer: &dyn Tokenizer,
    sentences: &[Option<String>],
    index: usize,
    leading_space: bool,
    drop_last: bool,
    case: CaseTransform,
) -> Result<Vec<TokenId>> {
    let mut text = match sentences.get(index) {
        None => {
            return Err(PlantillaError::SentenceIndexOutOfRange {
                index,
                count: sentences.len(),
            })
        }
        Some(None) => {
            warn!(index, "missing sentence text, substituting empty string");
            String::new()
        }
        Some(Some(text)) => text.clone(),
    };

    text = match case {
        CaseTransform::None => text,
        CaseTransform::LowerFirst => recase_first(&text, true),
        CaseTransform::UpperFirst => recase_first(&text, false),
    };
    if drop_last {
        let mut chars = text.chars();
        chars.next_back();
        text = chars.as_str().to_string();
    }

    if leading_space {
        Ok(tokenizer.encode(&format!(" {text}")))
    } else {
        Ok(tokenizer.encode(&text))
    }
}

fn recase_first(text: &str, lower: bool) -> String {
    let mut chars = text.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mapped: String = if lower {
                first.to_lowercase().collect()
            } else {
                first.to_uppercase().collect()
            };
            mapped + chars.as_str()
        }
    }
}

fn encode_literal(tokenizer: &dyn Tokenizer, text: &str) -> Vec<TokenId> {
    // Single-character literals go through a raw vocabulary lookup: some
    // tokenizers prepend a phantom space when encoding lone punctuation.
    if text.chars().count() == 1 {
        if let Some(id) = tokenizer.token_to_id(text) {
            return vec![id];
        }
    }
    tokenizer.encode(text)
}
