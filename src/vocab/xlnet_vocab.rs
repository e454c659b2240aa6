// Copyright 2018 Google AI and Google Brain team.
// Copyright 2018 Carnegie Mellon University Authors.
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
use crate::vocab::base_vocab::{register_as_special_value, swap_key_values, SpecialTokenMap, Vocab};
use crate::vocab::sentence_piece_proto::ModelProto;
use prost::Message;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub(crate) const DEFAULT_UNK_TOKEN: &str = "<unk>";
pub(crate) const DEFAULT_BOS_TOKEN: &str = "<s>";
pub(crate) const DEFAULT_EOS_TOKEN: &str = "</s>";
pub(crate) const DEFAULT_SEP_TOKEN: &str = "<sep>";
pub(crate) const DEFAULT_PAD_TOKEN: &str = "<pad>";
pub(crate) const DEFAULT_CLS_TOKEN: &str = "<cls>";
pub(crate) const DEFAULT_MASK_TOKEN: &str = "<mask>";
pub(crate) const DEFAULT_ADDITIONAL_SPECIAL_TOKENS: [&str; 2] = ["<eop>", "<eod>"];

/// # XLNet vocabulary
///
/// Token to id mapping derived from a SentencePiece model file: the id of a piece is its
/// position in the serialized piece list. The XLNet special tokens are registered on top,
/// reusing the file ids when the file contains them (the published `spiece.model` files do)
/// and receiving fresh ids past the end of the file range otherwise.
#[derive(Debug, Clone)]
pub struct XLNetVocab {
    values: HashMap<String, i64>,
    indices: HashMap<i64, String>,
    special_token_map: SpecialTokenMap,
    special_values: HashMap<String, i64>,
    special_indices: HashMap<i64, String>,
    added_values: HashMap<String, i64>,
    added_indices: HashMap<i64, String>,
    unk_id: i64,
}

impl XLNetVocab {
    /// Special token strings used by the XLNet convention.
    pub fn default_special_token_map() -> SpecialTokenMap {
        SpecialTokenMap {
            unk_token: DEFAULT_UNK_TOKEN.to_string(),
            bos_token: Some(DEFAULT_BOS_TOKEN.to_string()),
            eos_token: Some(DEFAULT_EOS_TOKEN.to_string()),
            sep_token: Some(DEFAULT_SEP_TOKEN.to_string()),
            pad_token: Some(DEFAULT_PAD_TOKEN.to_string()),
            cls_token: Some(DEFAULT_CLS_TOKEN.to_string()),
            mask_token: Some(DEFAULT_MASK_TOKEN.to_string()),
            additional_special_tokens: Some(
                DEFAULT_ADDITIONAL_SPECIAL_TOKENS
                    .iter()
                    .map(|token| token.to_string())
                    .collect(),
            ),
        }
    }

    /// Builds a vocabulary from a `spiece.model` file with the default XLNet special tokens.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_nlp_kit::vocab::XLNetVocab;
    /// let vocab = XLNetVocab::from_file("path/to/spiece.model");
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<XLNetVocab, NlpKitError> {
        Self::from_file_with_special_token_map(path, Self::default_special_token_map())
    }

    /// Builds a vocabulary from a `spiece.model` file with custom special token strings.
    /// Tokens left unset in the map fall back to the XLNet defaults.
    pub fn from_file_with_special_token_map<P: AsRef<Path>>(
        path: P,
        special_token_map: SpecialTokenMap,
    ) -> Result<XLNetVocab, NlpKitError> {
        let path = path.as_ref();
        let mut contents = Vec::new();
        File::open(path)
            .and_then(|mut file| file.read_to_end(&mut contents))
            .map_err(|error| {
                NlpKitError::ModelLoadError(format!(
                    "SentencePiece model file {} could not be read: {error}",
                    path.display()
                ))
            })?;
        Self::from_serialized_proto_with_special_token_map(&contents, special_token_map)
    }

    /// Builds a vocabulary from serialized `ModelProto` bytes with the default XLNet special
    /// tokens.
    pub fn from_serialized_proto(proto_bytes: &[u8]) -> Result<XLNetVocab, NlpKitError> {
        Self::from_serialized_proto_with_special_token_map(
            proto_bytes,
            Self::default_special_token_map(),
        )
    }

    /// Builds a vocabulary from serialized `ModelProto` bytes with custom special token
    /// strings.
    pub fn from_serialized_proto_with_special_token_map(
        proto_bytes: &[u8],
        special_token_map: SpecialTokenMap,
    ) -> Result<XLNetVocab, NlpKitError> {
        let proto = ModelProto::decode(proto_bytes)?;
        Ok(Self::from_proto(&proto, special_token_map))
    }

    pub(crate) fn from_proto(proto: &ModelProto, special_token_map: SpecialTokenMap) -> XLNetVocab {
        let special_token_map = complete_special_token_map(special_token_map);
        let mut values = HashMap::with_capacity(proto.pieces.len());
        for (index, piece) in proto.pieces.iter().enumerate() {
            values.insert(piece.piece().to_string(), index as i64);
        }

        let mut added_values = HashMap::new();
        let mut special_values = HashMap::new();
        let unk_id = register_as_special_value(
            &special_token_map.unk_token,
            &values,
            &mut added_values,
            &mut special_values,
        );
        for token in special_token_map
            .bos_token
            .iter()
            .chain(special_token_map.eos_token.iter())
            .chain(special_token_map.sep_token.iter())
            .chain(special_token_map.pad_token.iter())
            .chain(special_token_map.cls_token.iter())
            .chain(special_token_map.mask_token.iter())
            .chain(special_token_map.additional_special_tokens.iter().flatten())
        {
            register_as_special_value(token, &values, &mut added_values, &mut special_values);
        }

        let indices = swap_key_values(&values);
        let added_indices = swap_key_values(&added_values);
        let special_indices = swap_key_values(&special_values);
        XLNetVocab {
            values,
            indices,
            special_token_map,
            special_values,
            special_indices,
            added_values,
            added_indices,
            unk_id,
        }
    }

    /// Unknown token string.
    pub fn unk_token(&self) -> &str {
        &self.special_token_map.unk_token
    }

    /// Beginning of sequence token string.
    pub fn bos_token(&self) -> &str {
        self.special_token_map
            .bos_token
            .as_deref()
            .unwrap_or(DEFAULT_BOS_TOKEN)
    }

    /// End of sequence token string.
    pub fn eos_token(&self) -> &str {
        self.special_token_map
            .eos_token
            .as_deref()
            .unwrap_or(DEFAULT_EOS_TOKEN)
    }

    /// Separator token string, closing each sequence during input assembly.
    pub fn sep_token(&self) -> &str {
        self.special_token_map
            .sep_token
            .as_deref()
            .unwrap_or(DEFAULT_SEP_TOKEN)
    }

    /// Padding token string.
    pub fn pad_token(&self) -> &str {
        self.special_token_map
            .pad_token
            .as_deref()
            .unwrap_or(DEFAULT_PAD_TOKEN)
    }

    /// Classification token string, appended last during input assembly.
    pub fn cls_token(&self) -> &str {
        self.special_token_map
            .cls_token
            .as_deref()
            .unwrap_or(DEFAULT_CLS_TOKEN)
    }

    /// Mask token string.
    pub fn mask_token(&self) -> &str {
        self.special_token_map
            .mask_token
            .as_deref()
            .unwrap_or(DEFAULT_MASK_TOKEN)
    }

    /// Additional reserved token strings.
    pub fn additional_special_tokens(&self) -> &[String] {
        self.special_token_map
            .additional_special_tokens
            .as_deref()
            .unwrap_or(&[])
    }
}

impl Vocab for XLNetVocab {
    fn values(&self) -> &HashMap<String, i64> {
        &self.values
    }

    fn indices(&self) -> &HashMap<i64, String> {
        &self.indices
    }

    fn special_token_map(&self) -> &SpecialTokenMap {
        &self.special_token_map
    }

    fn special_values(&self) -> &HashMap<String, i64> {
        &self.special_values
    }

    fn special_indices(&self) -> &HashMap<i64, String> {
        &self.special_indices
    }

    fn added_values(&self) -> &HashMap<String, i64> {
        &self.added_values
    }

    fn added_indices(&self) -> &HashMap<i64, String> {
        &self.added_indices
    }

    fn token_to_id(&self, token: &str) -> i64 {
        match self.values.get(token) {
            Some(id) => *id,
            None => match self.added_values.get(token) {
                Some(id) => *id,
                None => self.unk_id,
            },
        }
    }

    fn id_to_token(&self, id: i64) -> String {
        match self.indices.get(&id) {
            Some(token) => token.clone(),
            None => match self.added_indices.get(&id) {
                Some(token) => token.clone(),
                None => self.special_token_map.unk_token.clone(),
            },
        }
    }

    fn add_token(&mut self, token: &str, special: bool) -> i64 {
        let id = match self.values.get(token).or_else(|| self.added_values.get(token)) {
            Some(id) => *id,
            None => {
                let id = (self.values.len() + self.added_values.len()) as i64;
                self.added_values.insert(token.to_string(), id);
                self.added_indices.insert(id, token.to_string());
                id
            }
        };
        if special {
            self.special_values.insert(token.to_string(), id);
            self.special_indices.insert(id, token.to_string());
        }
        id
    }
}

/// Fills the tokens left unset in a special token map with the XLNet defaults.
fn complete_special_token_map(mut special_token_map: SpecialTokenMap) -> SpecialTokenMap {
    special_token_map
        .bos_token
        .get_or_insert_with(|| DEFAULT_BOS_TOKEN.to_string());
    special_token_map
        .eos_token
        .get_or_insert_with(|| DEFAULT_EOS_TOKEN.to_string());
    special_token_map
        .sep_token
        .get_or_insert_with(|| DEFAULT_SEP_TOKEN.to_string());
    special_token_map
        .pad_token
        .get_or_insert_with(|| DEFAULT_PAD_TOKEN.to_string());
    special_token_map
        .cls_token
        .get_or_insert_with(|| DEFAULT_CLS_TOKEN.to_string());
    special_token_map
        .mask_token
        .get_or_insert_with(|| DEFAULT_MASK_TOKEN.to_string());
    special_token_map
        .additional_special_tokens
        .get_or_insert_with(|| {
            DEFAULT_ADDITIONAL_SPECIAL_TOKENS
                .iter()
                .map(|token| token.to_string())
                .collect()
        });
    special_token_map
}
