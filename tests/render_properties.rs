//! Property tests for template rendering.
//!
//! Ensures the rendering invariants hold for arbitrary inputs:
//! - Output sequences always have length exactly `max_length`
//! - Masked-prediction mode always yields a valid in-range mask position
//! - Segment ids are non-decreasing and advance only at `sep+` boundaries
//! - Head and tail truncation retain opposite ends of the sequence

use plantilla::{render, RenderRequest, Template, Tokenizer, TokenizerFamily, WhitespaceTokenizer};
use proptest::collection::vec;
use proptest::prelude::*;

// =============================================================================
// Strategy Helpers
// =============================================================================

/// Generate a list of lowercase words.
fn words(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<String>> {
    vec("[a-w]{1,6}", len)
}

/// Build a tokenizer whose vocabulary covers the given words.
fn tokenizer_for(words: &[String]) -> WhitespaceTokenizer {
    WhitespaceTokenizer::with_vocab(words.iter().map(String::as_str))
        .with_family(TokenizerFamily::bert_like())
}

// =============================================================================
// Length Invariant
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_non_templated_length_is_exact(
        sentence_words in words(0..20),
        pair_words in words(0..20),
        max_length in 2usize..64,
    ) {
        let all: Vec<String> =
            sentence_words.iter().chain(pair_words.iter()).cloned().collect();
        let tok = tokenizer_for(&all);
        let sentences = vec![
            Some(sentence_words.join(" ")),
            Some(pair_words.join(" ")),
        ];

        let feature = render(&tok, &sentences, &RenderRequest::new(max_length)).unwrap();
        prop_assert_eq!(feature.input_ids.len(), max_length);
        prop_assert_eq!(feature.attention_mask.len(), max_length);
        prop_assert_eq!(feature.token_type_ids.unwrap().len(), max_length);
    }

    #[test]
    fn prop_templated_length_and_mask_position(
        sentence_words in words(0..30),
        max_length in 2usize..48,
        first_sent_limit in proptest::option::of(1usize..16),
    ) {
        let tok = tokenizer_for(&sentence_words);
        // Mask near the head so default tail truncation never drops it.
        let template = Template::parse("*cls**mask**sent_0**sep+*").unwrap();
        let mut request = RenderRequest::new(max_length).with_template(&template);
        if let Some(limit) = first_sent_limit {
            request = request.with_first_sent_limit(limit);
        }

        let feature = render(&tok, &[Some(sentence_words.join(" "))], &request).unwrap();
        prop_assert_eq!(feature.input_ids.len(), max_length);
        prop_assert_eq!(feature.attention_mask.len(), max_length);

        let mask_pos = feature.mask_pos.unwrap();
        prop_assert!(mask_pos < max_length);
        prop_assert_eq!(feature.input_ids[mask_pos], tok.mask_id());
    }
}

// =============================================================================
// Segment Monotonicity
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_segments_non_decreasing_and_bounded_by_sep_plus(
        first_words in words(1..10),
        second_words in words(1..10),
        third_words in words(1..10),
    ) {
        let all: Vec<String> = first_words
            .iter()
            .chain(second_words.iter())
            .chain(third_words.iter())
            .cloned()
            .collect();
        let tok = tokenizer_for(&all);
        let template =
            Template::parse("*cls**mask**sent_0**sep+**sent_1**sep+**sent_2**sep*").unwrap();
        let sentences = vec![
            Some(first_words.join(" ")),
            Some(second_words.join(" ")),
            Some(third_words.join(" ")),
        ];

        let feature = render(&tok, &sentences, &RenderRequest::new(128).with_template(&template))
            .unwrap();
        let segments = feature.token_type_ids.unwrap();
        let sep_plus_count = 2u32;

        let mut previous = 0u32;
        for (segment, mask) in segments.iter().zip(feature.attention_mask.iter()) {
            if *mask == 0 {
                break;
            }
            prop_assert!(*segment >= previous, "segment ids must be non-decreasing");
            prop_assert!(*segment - previous <= 1, "segments advance one step at a time");
            previous = *segment;
        }
        prop_assert!(previous <= sep_plus_count);
    }
}

// =============================================================================
// Truncation Direction
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_truncation_retains_opposite_ends(
        sentence_words in words(10..30),
        max_length in 4usize..8,
    ) {
        let tok = tokenizer_for(&sentence_words);
        let sentences = vec![Some(sentence_words.join(" "))];

        // Untruncated reference: cls + words + sep.
        let content_len = sentence_words.len() + 2;
        let full = render(&tok, &sentences, &RenderRequest::new(content_len)).unwrap();

        let tail = render(&tok, &sentences, &RenderRequest::new(max_length)).unwrap();
        let head = render(
            &tok,
            &sentences,
            &RenderRequest::new(max_length).with_truncate_head(true),
        )
        .unwrap();

        prop_assert_eq!(&tail.input_ids[..], &full.input_ids[..max_length]);
        prop_assert_eq!(&head.input_ids[..], &full.input_ids[content_len - max_length..]);
        // The dropped ends differ, so the two outputs must differ.
        prop_assert_ne!(&tail.input_ids[..], &head.input_ids[..]);
    }
}
