// Copyright 2018 The Open AI Team Authors, The Google AI Language Team Authors
// Copyright 2018 The HuggingFace Inc. team.
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
use crate::tokenizer::tokenization_utils::{
    clean_up_tokenization, split_on_added_tokens, truncate_sequences, TextSegment,
};
use crate::vocab::Vocab;
use serde::{Deserialize, Serialize};

/// # Token layered on top of a base vocabulary
///
/// Carries the matching behavior of the token when input text is split before subword
/// segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedToken {
    /// Token text
    pub content: String,
    /// Absorb the whitespace separating the token from the preceding text
    pub lstrip: bool,
    /// Register as a special token (skipped by `decode` on request, never split)
    pub special: bool,
}

impl AddedToken {
    /// Creates an ordinary added token matching its bare text.
    pub fn new(content: &str) -> AddedToken {
        AddedToken {
            content: content.to_string(),
            lstrip: false,
            special: false,
        }
    }
}

/// # Truncation strategies for inputs exceeding a maximum length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationStrategy {
    /// Truncate the longest sequence first, one token at a time
    LongestFirst,
    /// Truncate the first sequence only
    OnlyFirst,
    /// Truncate the second sequence only
    OnlySecond,
    /// Do not truncate, fail when the input does not fit
    DoNotTruncate,
}

/// # Encoded input ready to feed a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedInput {
    /// Token ids with the special tokens added
    pub token_ids: Vec<i64>,
    /// Segment (token type) ids aligned with `token_ids`
    pub segment_ids: Vec<i8>,
    /// Flags the positions holding special tokens inserted during input assembly
    pub special_tokens_mask: Vec<i8>,
    /// Tokens removed by truncation
    pub overflowing_tokens: Vec<i64>,
    /// Number of tokens removed to satisfy the maximum length
    pub num_truncated_tokens: usize,
}

/// # Base tokenizer trait
///
/// Composes the shared tokenization pipeline from a handful of model-specific hooks:
/// splitting on registered added tokens, subword segmentation, conversion to ids, input
/// assembly with special tokens, and decoding back to text.
pub trait Tokenizer<V: Vocab> {
    /// Returns the vocabulary used by the tokenizer.
    fn vocab(&self) -> &V;

    /// Returns a mutable reference to the vocabulary used by the tokenizer.
    fn vocab_mut(&mut self) -> &mut V;

    /// Added tokens the input text is split on before subword segmentation.
    fn added_tokens(&self) -> &[AddedToken];

    /// Mutable access to the added token registry.
    fn added_tokens_mut(&mut self) -> &mut Vec<AddedToken>;

    /// Splits an ordinary text chunk (no added tokens inside) into subword pieces.
    fn tokenize_to_pieces(&self, text: &str) -> Vec<String>;

    /// Reassembles subword pieces into text.
    fn convert_tokens_to_string(&self, tokens: &[String]) -> String;

    /// Default cleanup behavior of [`Tokenizer::decode`] when no explicit choice is given.
    fn clean_up_tokenization_spaces(&self) -> bool;

    /// Registers tokens on the tokenizer and its vocabulary. Tokens already part of the
    /// vocabulary keep their id but are still split on during tokenization.
    fn add_tokens(&mut self, tokens: &[AddedToken]) {
        for token in tokens {
            self.vocab_mut().add_token(&token.content, token.special);
            if !self
                .added_tokens()
                .iter()
                .any(|existing| existing.content == token.content)
            {
                self.added_tokens_mut().push(token.clone());
            }
        }
    }

    /// Tokenizes input text into pieces. Registered added tokens are matched first and
    /// passed through verbatim, the text between them goes through normalization and
    /// subword segmentation.
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for segment in split_on_added_tokens(text, self.added_tokens()) {
            match segment {
                TextSegment::Ordinary(chunk) => tokens.extend(self.tokenize_to_pieces(chunk)),
                TextSegment::Added(token) => tokens.push(token.to_string()),
            }
        }
        tokens
    }

    /// Tokenizes a list of texts.
    fn tokenize_list<S>(&self, text_list: &[S]) -> Vec<Vec<String>>
    where
        S: AsRef<str>,
    {
        text_list
            .iter()
            .map(|text| self.tokenize(text.as_ref()))
            .collect()
    }

    /// Converts tokens to ids, unknown tokens mapping to the unknown token id.
    fn convert_tokens_to_ids<S>(&self, tokens: &[S]) -> Vec<i64>
    where
        S: AsRef<str>,
    {
        self.vocab().convert_tokens_to_ids(tokens)
    }

    /// Builds the model input ids from one or two sequences, adding the special tokens the
    /// model expects. The base behavior concatenates the sequences unchanged.
    fn build_inputs_with_special_tokens(
        &self,
        token_ids_1: &[i64],
        token_ids_2: Option<&[i64]>,
    ) -> Vec<i64> {
        let mut output = token_ids_1.to_vec();
        if let Some(token_ids_2) = token_ids_2 {
            output.extend_from_slice(token_ids_2);
        }
        output
    }

    /// Computes the special tokens mask aligned with
    /// [`Tokenizer::build_inputs_with_special_tokens`]. With `already_has_special_tokens`
    /// set, `token_ids_1` is expected to be a fully assembled input (and no second sequence
    /// may be given); positions holding registered special tokens are flagged.
    fn get_special_tokens_mask(
        &self,
        token_ids_1: &[i64],
        token_ids_2: Option<&[i64]>,
        already_has_special_tokens: bool,
    ) -> Result<Vec<i8>, NlpKitError> {
        if already_has_special_tokens {
            if token_ids_2.is_some() {
                return Err(NlpKitError::ValueError(
                    "Cannot compute a special tokens mask from a pair of sequences that is \
                     already formatted with special tokens"
                        .to_string(),
                ));
            }
            return Ok(token_ids_1
                .iter()
                .map(|id| i8::from(self.vocab().is_special_id(*id)))
                .collect());
        }
        Ok(vec![
            0;
            token_ids_1.len() + token_ids_2.map_or(0, |ids| ids.len())
        ])
    }

    /// Computes the token type ids aligned with
    /// [`Tokenizer::build_inputs_with_special_tokens`]. The base behavior assigns 0 to the
    /// first sequence and 1 to the second.
    fn create_token_type_ids_from_sequences(
        &self,
        token_ids_1: &[i64],
        token_ids_2: Option<&[i64]>,
    ) -> Vec<i8> {
        let mut token_type_ids = vec![0; token_ids_1.len()];
        if let Some(token_ids_2) = token_ids_2 {
            token_type_ids.extend(vec![1; token_ids_2.len()]);
        }
        token_type_ids
    }

    /// Encodes one or two texts into a model input: tokenization, conversion to ids,
    /// truncation to `max_len` and input assembly with special tokens.
    ///
    /// # Arguments
    ///
    /// * `text_1` - First input text
    /// * `text_2` - Optional second input text, for sequence pair tasks
    /// * `max_len` - Maximum length of the assembled input, in tokens
    /// * `truncation_strategy` - Strategy distributing the removals over the sequences
    /// * `stride` - Number of kept tokens repeated in the overflow of single sequences
    ///
    /// # Returns
    ///
    /// * `TokenizedInput` with ids, segment ids, special tokens mask and overflow. Fails
    ///   when the input cannot be truncated to `max_len` with the given strategy.
    fn encode(
        &self,
        text_1: &str,
        text_2: Option<&str>,
        max_len: usize,
        truncation_strategy: &TruncationStrategy,
        stride: usize,
    ) -> Result<TokenizedInput, NlpKitError> {
        let token_ids_1 = self.convert_tokens_to_ids(&self.tokenize(text_1));
        let token_ids_2 = text_2.map(|text| self.convert_tokens_to_ids(&self.tokenize(text)));

        let empty_pair: Option<&[i64]> = match token_ids_2 {
            Some(_) => Some(&[]),
            None => None,
        };
        let num_special_tokens = self.build_inputs_with_special_tokens(&[], empty_pair).len();
        let total_length = token_ids_1.len()
            + token_ids_2.as_ref().map_or(0, |ids| ids.len())
            + num_special_tokens;
        let num_truncated_tokens = total_length.saturating_sub(max_len);

        let (token_ids_1, token_ids_2, overflowing_tokens) = truncate_sequences(
            token_ids_1,
            token_ids_2,
            num_truncated_tokens,
            truncation_strategy,
            stride,
        )?;

        let token_ids =
            self.build_inputs_with_special_tokens(&token_ids_1, token_ids_2.as_deref());
        let segment_ids =
            self.create_token_type_ids_from_sequences(&token_ids_1, token_ids_2.as_deref());
        let special_tokens_mask =
            self.get_special_tokens_mask(&token_ids_1, token_ids_2.as_deref(), false)?;
        Ok(TokenizedInput {
            token_ids,
            segment_ids,
            special_tokens_mask,
            overflowing_tokens,
            num_truncated_tokens,
        })
    }

    /// Encodes a list of single texts, see [`Tokenizer::encode`].
    fn encode_list<S>(
        &self,
        text_list: &[S],
        max_len: usize,
        truncation_strategy: &TruncationStrategy,
        stride: usize,
    ) -> Result<Vec<TokenizedInput>, NlpKitError>
    where
        S: AsRef<str>,
    {
        text_list
            .iter()
            .map(|text| self.encode(text.as_ref(), None, max_len, truncation_strategy, stride))
            .collect()
    }

    /// Converts ids back to their token strings, optionally dropping special tokens.
    fn decode_to_vec(&self, token_ids: &[i64], skip_special_tokens: bool) -> Vec<String> {
        if skip_special_tokens {
            token_ids
                .iter()
                .filter(|id| !self.vocab().is_special_id(**id))
                .map(|id| self.vocab().id_to_token(*id))
                .collect()
        } else {
            token_ids
                .iter()
                .map(|id| self.vocab().id_to_token(*id))
                .collect()
        }
    }

    /// Decodes ids back into a string.
    ///
    /// Added and special tokens are kept as standalone segments, the ordinary pieces
    /// between them are reassembled with [`Tokenizer::convert_tokens_to_string`]. Segments
    /// are joined without separators; `_spaces_between_special_tokens` is accepted for API
    /// compatibility but has no effect.
    ///
    /// # Arguments
    ///
    /// * `token_ids` - Ids to decode
    /// * `skip_special_tokens` - Drop the registered special tokens before decoding
    /// * `clean_up_tokenization_spaces` - Override of the tokenizer's cleanup default
    /// * `_spaces_between_special_tokens` - Accepted for interface compatibility and ignored
    fn decode(
        &self,
        token_ids: &[i64],
        skip_special_tokens: bool,
        clean_up_tokenization_spaces: Option<bool>,
        _spaces_between_special_tokens: bool,
    ) -> String {
        let tokens = self.decode_to_vec(token_ids, skip_special_tokens);
        let mut segments: Vec<String> = Vec::new();
        let mut current_run: Vec<String> = Vec::new();
        for token in tokens {
            let standalone = self.vocab().added_values().contains_key(&token)
                || self.vocab().is_special_token(&token);
            if standalone {
                if !current_run.is_empty() {
                    segments.push(self.convert_tokens_to_string(&current_run));
                    current_run.clear();
                }
                segments.push(token);
            } else {
                current_run.push(token);
            }
        }
        if !current_run.is_empty() {
            segments.push(self.convert_tokens_to_string(&current_run));
        }
        let text = segments.concat();
        let clean_up = clean_up_tokenization_spaces
            .unwrap_or_else(|| self.clean_up_tokenization_spaces());
        if clean_up {
            clean_up_tokenization(&text)
        } else {
            text
        }
    }

    /// Decodes a list of id sequences, see [`Tokenizer::decode`].
    fn decode_list(
        &self,
        token_ids_list: &[Vec<i64>],
        skip_special_tokens: bool,
        clean_up_tokenization_spaces: Option<bool>,
        spaces_between_special_tokens: bool,
    ) -> Vec<String> {
        token_ids_list
            .iter()
            .map(|token_ids| {
                self.decode(
                    token_ids,
                    skip_special_tokens,
                    clean_up_tokenization_spaces,
                    spaces_between_special_tokens,
                )
            })
            .collect()
    }
}
