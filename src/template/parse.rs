//! Template parsing into directives.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlantillaError, Result};

/// First-character transform applied to a referenced sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseTransform {
    /// Leave the sentence as-is.
    None,
    /// Lowercase the first character.
    LowerFirst,
    /// Uppercase the first character.
    UpperFirst,
}

/// One compiled template fragment.
///
/// The set is closed: every template the grammar admits maps onto exactly
/// one of these shapes, and rendering matches exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Beginning-of-sequence token (skipped for families without one).
    Cls,
    /// The mask token whose prediction maps back to a label.
    Mask,
    /// Separator token.
    Sep,
    /// Separator token that also advances the segment id.
    SepPlus,
    /// Reference to input sentence `index` with optional transforms.
    Sent {
        index: usize,
        /// Encode with a prepended space (sub-word tokenizers treat
        /// word-initial and word-continuation tokens differently).
        leading_space: bool,
        /// Drop the final character before encoding (cheap truncation
        /// proxy, not token-aware).
        drop_last: bool,
        case: CaseTransform,
    },
    /// Pre-resolved label word at position `index` of the label-word table.
    Label { index: usize },
    /// Label word selected through the per-example support-label table
    /// (in-context demonstration formats only).
    LabelAt { index: usize },
    /// Literal text, `_` already rendered as space.
    Literal(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    raw: String,
    directives: Vec<Directive>,
}

/// `(prefix, leading_space, drop_last, case)` for the sentence directives.
/// Longer prefixes first so e.g. `sentl-_` is not consumed by `sentl_`.
const SENT_FORMS: [(&str, bool, bool, CaseTransform); 8] = [
    ("+sentl_", true, false, CaseTransform::LowerFirst),
    ("+sentu_", true, false, CaseTransform::UpperFirst),
    ("sentl-_", false, true, CaseTransform::LowerFirst),
    ("+sent_", true, false, CaseTransform::None),
    ("sentl_", false, false, CaseTransform::LowerFirst),
    ("sentu_", false, false, CaseTransform::UpperFirst),
    ("sent-_", false, true, CaseTransform::None),
    ("sent_", false, false, CaseTransform::None),
];

impl Template {
    /// Compile a template string.
    ///
    /// # Errors
    ///
    /// Returns [`PlantillaError::TemplateParse`] when a sentence or label
    /// directive carries a non-numeric index.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut directives = Vec::new();
        for fragment in raw.split('*') {
            if fragment.is_empty() {
                continue;
            }
            directives.push(Self::parse_fragment(fragment)?);
        }
        Ok(Self { raw: raw.to_string(), directives })
    }

    fn parse_fragment(fragment: &str) -> Result<Directive> {
        match fragment {
            "cls" => return Ok(Directive::Cls),
            "mask" => return Ok(Directive::Mask),
            "sep" => return Ok(Directive::Sep),
            "sep+" => return Ok(Directive::SepPlus),
            _ => {}
        }

        if let Some(rest) = fragment.strip_prefix("label_") {
            return Ok(Directive::Label { index: parse_index(fragment, rest)? });
        }
        if let Some(rest) = fragment.strip_prefix("labelx_") {
            return Ok(Directive::LabelAt { index: parse_index(fragment, rest)? });
        }
        for (prefix, leading_space, drop_last, case) in SENT_FORMS {
            if let Some(rest) = fragment.strip_prefix(prefix) {
                return Ok(Directive::Sent {
                    index: parse_index(fragment, rest)?,
                    leading_space,
                    drop_last,
                    case,
                });
            }
        }

        Ok(Directive::Literal(fragment.replace('_', " ")))
    }

    /// The original template string.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The compiled directives in emission order.
    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Whether the template contains a mask directive.
    #[must_use]
    pub fn has_mask(&self) -> bool {
        self.directives.iter().any(|d| matches!(d, Directive::Mask))
    }
}

fn parse_index(fragment: &str, rest: &str) -> Result<usize> {
    rest.parse().map_err(|_| PlantillaError::TemplateParse {
        directive: fragment.to_string(),
        message: format!("'{rest}' is not a valid index"),
    })
}

impl FromStr for Template {
    type Err = PlantillaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
