// Copyright 2019-2021 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::common::error::NlpKitError;
use crate::tokenizer::base_tokenizer::{AddedToken, TruncationStrategy};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Collapses runs of whitespace into single spaces and trims the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Removes accents by NFKD decomposition followed by dropping the combining marks.
pub(crate) fn strip_accents(text: &str) -> String {
    text.nfkd()
        .filter(|character| !is_combining_mark(*character))
        .collect()
}

/// Removes the spaces a whitespace-joining decoder leaves in front of punctuation and
/// English contractions.
pub(crate) fn clean_up_tokenization(text: &str) -> String {
    text.replace(" .", ".")
        .replace(" ?", "?")
        .replace(" !", "!")
        .replace(" ,", ",")
        .replace(" ' ", "'")
        .replace(" n't", "n't")
        .replace(" 'm", "'m")
        .replace(" 's", "'s")
        .replace(" 've", "'ve")
        .replace(" 're", "'re")
}

/// A slice of input text produced by [`split_on_added_tokens`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum TextSegment<'a> {
    /// Ordinary text, to be run through normalization and subword segmentation.
    Ordinary(&'a str),
    /// An added or special token matched verbatim, passed through unchanged.
    Added(&'a str),
}

/// Splits text on the registered added tokens before any normalization, so that special
/// tokens survive lower casing and subword segmentation. Matching prefers the earliest,
/// then the longest candidate. Tokens with `lstrip` set absorb the whitespace separating
/// them from the preceding text.
pub(crate) fn split_on_added_tokens<'a>(
    text: &'a str,
    added_tokens: &[AddedToken],
) -> Vec<TextSegment<'a>> {
    let mut segments = Vec::new();
    let mut cursor = 0usize;
    while cursor < text.len() {
        let mut best_match: Option<(usize, usize, bool)> = None;
        for token in added_tokens {
            if token.content.is_empty() {
                continue;
            }
            if let Some(position) = text[cursor..].find(&token.content) {
                let start = cursor + position;
                let length = token.content.len();
                best_match = match best_match {
                    Some((best_start, best_length, _))
                        if best_start < start
                            || (best_start == start && best_length >= length) =>
                    {
                        best_match
                    }
                    _ => Some((start, length, token.lstrip)),
                };
            }
        }
        match best_match {
            Some((start, length, lstrip)) => {
                let prefix = &text[cursor..start];
                let prefix_end = if lstrip {
                    cursor + prefix.trim_end().len()
                } else {
                    start
                };
                if prefix_end > cursor {
                    segments.push(TextSegment::Ordinary(&text[cursor..prefix_end]));
                }
                segments.push(TextSegment::Added(&text[start..start + length]));
                cursor = start + length;
            }
            None => {
                segments.push(TextSegment::Ordinary(&text[cursor..]));
                break;
            }
        }
    }
    segments
}

/// Truncates a sequence or a pair of sequences to a maximum length.
///
/// # Arguments
///
/// * `token_ids_1` - Ids of the first sequence
/// * `token_ids_2` - Optional ids of the second sequence
/// * `num_tokens_to_remove` - Total number of tokens to remove
/// * `truncation_strategy` - Strategy distributing the removals over the sequences
/// * `stride` - For single sequences, number of kept tokens repeated at the front of the
///   overflow so that overlapping windows can be built from it
///
/// # Returns
///
/// * The truncated sequence(s) and the removed (overflowing) tokens. Fails with a
///   `ValueError` when the requested amount cannot be removed with the given strategy.
pub fn truncate_sequences(
    mut token_ids_1: Vec<i64>,
    mut token_ids_2: Option<Vec<i64>>,
    num_tokens_to_remove: usize,
    truncation_strategy: &TruncationStrategy,
    stride: usize,
) -> Result<(Vec<i64>, Option<Vec<i64>>, Vec<i64>), NlpKitError> {
    if num_tokens_to_remove == 0 {
        return Ok((token_ids_1, token_ids_2, Vec::new()));
    }
    match truncation_strategy {
        TruncationStrategy::LongestFirst if token_ids_2.is_some() => {
            let total_length =
                token_ids_1.len() + token_ids_2.as_ref().map_or(0, |ids| ids.len());
            if total_length < num_tokens_to_remove {
                return Err(NlpKitError::ValueError(format!(
                    "Cannot remove {num_tokens_to_remove} tokens from a pair of sequences \
                     totalling {total_length} tokens"
                )));
            }
            let mut overflowing_tokens = Vec::with_capacity(num_tokens_to_remove);
            for _ in 0..num_tokens_to_remove {
                let remove_from_first = match &token_ids_2 {
                    Some(ids_2) => token_ids_1.len() > ids_2.len(),
                    None => true,
                };
                let removed = if remove_from_first {
                    token_ids_1.pop()
                } else {
                    token_ids_2.as_mut().and_then(|ids_2| ids_2.pop())
                };
                if let Some(token) = removed {
                    overflowing_tokens.insert(0, token);
                }
            }
            Ok((token_ids_1, token_ids_2, overflowing_tokens))
        }
        TruncationStrategy::LongestFirst | TruncationStrategy::OnlyFirst => {
            if token_ids_1.len() < num_tokens_to_remove {
                return Err(NlpKitError::ValueError(format!(
                    "Cannot remove {} tokens from the first sequence, which only holds {} tokens",
                    num_tokens_to_remove,
                    token_ids_1.len()
                )));
            }
            let overflowing_tokens =
                split_tail_with_stride(&mut token_ids_1, num_tokens_to_remove, stride);
            Ok((token_ids_1, token_ids_2, overflowing_tokens))
        }
        TruncationStrategy::OnlySecond => match token_ids_2.as_mut() {
            Some(ids_2) => {
                if ids_2.len() < num_tokens_to_remove {
                    return Err(NlpKitError::ValueError(format!(
                        "Cannot remove {} tokens from the second sequence, which only holds {} \
                         tokens",
                        num_tokens_to_remove,
                        ids_2.len()
                    )));
                }
                let overflowing_tokens =
                    split_tail_with_stride(ids_2, num_tokens_to_remove, stride);
                Ok((token_ids_1, token_ids_2, overflowing_tokens))
            }
            None => Err(NlpKitError::ValueError(
                "Truncation strategy OnlySecond requires a second sequence".to_string(),
            )),
        },
        TruncationStrategy::DoNotTruncate => Err(NlpKitError::ValueError(
            "Input exceeds the maximum length and truncation is disabled".to_string(),
        )),
    }
}

/// Splits the last `num_tokens` off `token_ids`, prepending a window of up to `stride` kept
/// tokens to the overflow.
fn split_tail_with_stride(token_ids: &mut Vec<i64>, num_tokens: usize, stride: usize) -> Vec<i64> {
    let cutoff = token_ids.len() - num_tokens;
    let overflow = token_ids.split_off(cutoff);
    if stride > 0 {
        let window_start = token_ids.len().saturating_sub(stride);
        let mut window = token_ids[window_start..].to_vec();
        window.extend(overflow);
        window
    } else {
        overflow
    }
}
