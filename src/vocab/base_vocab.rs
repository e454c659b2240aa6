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

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// # Special token strings registered on a vocabulary
///
/// Tokens left unset fall back to the convention of the concrete vocabulary, so a partially
/// filled map can be used to override individual tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokenMap {
    /// Fallback token for out-of-vocabulary input
    pub unk_token: String,
    /// Beginning of sequence token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bos_token: Option<String>,
    /// End of sequence token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eos_token: Option<String>,
    /// Sequence separator token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sep_token: Option<String>,
    /// Padding token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pad_token: Option<String>,
    /// Classification token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cls_token: Option<String>,
    /// Mask token used by masked language models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_token: Option<String>,
    /// Further reserved tokens, registered in the given order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_special_tokens: Option<Vec<String>>,
}

/// # Base Vocab trait
/// Defines the lookup operations between tokens and ids shared by all vocabularies. A
/// vocabulary holds three layers of tokens:
/// - base tokens read from the vocabulary file, with their position as id
/// - special tokens (separator, classification, padding, ...), reusing the base id when the
///   token is part of the file and receiving a fresh id past the current maximum otherwise
/// - tokens added by the user after construction
pub trait Vocab {
    /// Base token to id mapping read from the vocabulary file
    fn values(&self) -> &HashMap<String, i64>;

    /// Base id to token mapping read from the vocabulary file
    fn indices(&self) -> &HashMap<i64, String>;

    /// Special token strings registered on this vocabulary
    fn special_token_map(&self) -> &SpecialTokenMap;

    /// Token to id mapping for the registered special tokens
    fn special_values(&self) -> &HashMap<String, i64>;

    /// Id to token mapping for the registered special tokens
    fn special_indices(&self) -> &HashMap<i64, String>;

    /// Token to id mapping for tokens layered on top of the vocabulary file
    fn added_values(&self) -> &HashMap<String, i64>;

    /// Id to token mapping for tokens layered on top of the vocabulary file
    fn added_indices(&self) -> &HashMap<i64, String>;

    /// Converts a token to an id, falling back to the unknown token id for
    /// out-of-vocabulary input.
    fn token_to_id(&self, token: &str) -> i64;

    /// Converts an id to a token, falling back to the unknown token string for ids that are
    /// not part of the vocabulary.
    fn id_to_token(&self, id: i64) -> String;

    /// Registers a token, assigning a fresh id past the current maximum when the token is not
    /// already part of the vocabulary. Returns the id of the token.
    fn add_token(&mut self, token: &str, special: bool) -> i64;

    /// Converts a list of tokens to ids, unknown tokens mapping to the unknown token id.
    fn convert_tokens_to_ids<S>(&self, tokens: &[S]) -> Vec<i64>
    where
        S: AsRef<str>,
    {
        tokens
            .iter()
            .map(|token| self.token_to_id(token.as_ref()))
            .collect()
    }

    /// Returns `true` if the token was registered as a special token.
    fn is_special_token(&self, token: &str) -> bool {
        self.special_values().contains_key(token)
    }

    /// Returns `true` if the id belongs to a registered special token.
    fn is_special_id(&self, id: i64) -> bool {
        self.special_indices().contains_key(&id)
    }
}

/// Reverses a token to id map.
pub(crate) fn swap_key_values<K, V>(input: &HashMap<K, V>) -> HashMap<V, K>
where
    K: Clone,
    V: Clone + Hash + Eq,
{
    input
        .iter()
        .map(|(key, value)| (value.clone(), key.clone()))
        .collect()
}

/// Registers `token` as a special token. The token reuses its base or added id when already
/// known, and receives the next free id otherwise. Returns the id of the token.
pub(crate) fn register_as_special_value(
    token: &str,
    values: &HashMap<String, i64>,
    added_values: &mut HashMap<String, i64>,
    special_values: &mut HashMap<String, i64>,
) -> i64 {
    let token_id = match values.get(token) {
        Some(id) => *id,
        None => match added_values.get(token) {
            Some(id) => *id,
            None => {
                let id = (values.len() + added_values.len()) as i64;
                added_values.insert(token.to_string(), id);
                id
            }
        },
    };
    special_values.insert(token.to_string(), token_id);
    token_id
}
