// Copyright 2018 Google AI and Google Brain team.
// Copyright 2018 Carnegie Mellon University Authors.
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
use crate::tokenizer::base_tokenizer::{AddedToken, Tokenizer};
use crate::tokenizer::tokenization_utils::{collapse_whitespace, strip_accents};
use crate::vocab::{SentencePieceModel, SpecialTokenMap, Vocab, XLNetVocab, SPIECE_UNDERLINE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default file name of a saved sentence piece vocabulary.
pub(crate) const VOCAB_FILE_NAME: &str = "spiece.model";

/// # XLNet Pretrained model vocab files
pub struct XLNetVocabResources;

impl XLNetVocabResources {
    /// Shared under Apache 2.0 license by the XLNet Authors at <https://github.com/zihangdai/xlnet>.
    pub const XLNET_BASE_CASED: (&'static str, &'static str) = (
        "xlnet-base-cased/spiece",
        "https://huggingface.co/xlnet-base-cased/resolve/main/spiece.model",
    );
    /// Shared under Apache 2.0 license by the XLNet Authors at <https://github.com/zihangdai/xlnet>.
    pub const XLNET_LARGE_CASED: (&'static str, &'static str) = (
        "xlnet-large-cased/spiece",
        "https://huggingface.co/xlnet-large-cased/resolve/main/spiece.model",
    );
}

/// # XLNet tokenizer
///
/// XLNet tokenizer performing:
/// - splitting on registered special and added tokens
/// - whitespace cleanup and quote normalization
/// - (optional) accents stripping
/// - (optional) lower casing
/// - SentencePiece (unigram) decomposition, with a correction pass re-segmenting pieces
///   gluing digits to a trailing comma
#[derive(Debug, Clone)]
pub struct XLNetTokenizer {
    model: SentencePieceModel,
    vocab: XLNetVocab,
    vocab_file: Option<PathBuf>,
    do_lower_case: bool,
    remove_space: bool,
    keep_accents: bool,
    clean_up_tokenization_spaces: bool,
    added_tokens: Vec<AddedToken>,
}

impl XLNetTokenizer {
    /// Creates an XLNet tokenizer from a SentencePiece model file.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the `spiece.model` protobuf file
    /// * `do_lower_case` - Lower case the input text after normalization
    /// * `remove_space` - Collapse runs of whitespace to single spaces and trim the ends
    /// * `keep_accents` - Skip NFKD decomposition and combining mark removal
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_nlp_kit::tokenizer::XLNetTokenizer;
    ///
    /// fn main() -> anyhow::Result<()> {
    ///     let tokenizer = XLNetTokenizer::from_file("path/to/spiece.model", false, true, false)?;
    ///     Ok(())
    /// }
    /// ```
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        do_lower_case: bool,
        remove_space: bool,
        keep_accents: bool,
    ) -> Result<XLNetTokenizer, NlpKitError> {
        let model = SentencePieceModel::from_file(&path)?;
        let vocab = XLNetVocab::from_serialized_proto(model.serialized_proto())?;
        Ok(Self::from_parts(
            model,
            vocab,
            Some(path.as_ref().to_path_buf()),
            do_lower_case,
            remove_space,
            keep_accents,
        ))
    }

    /// Creates an XLNet tokenizer from a SentencePiece model file, overriding the default
    /// special token inventory. Missing entries of the map fall back to the XLNet defaults.
    pub fn from_file_with_special_token_map<P: AsRef<Path>>(
        path: P,
        do_lower_case: bool,
        remove_space: bool,
        keep_accents: bool,
        special_token_map: SpecialTokenMap,
    ) -> Result<XLNetTokenizer, NlpKitError> {
        let model = SentencePieceModel::from_file(&path)?;
        let vocab = XLNetVocab::from_serialized_proto_with_special_token_map(
            model.serialized_proto(),
            special_token_map,
        )?;
        Ok(Self::from_parts(
            model,
            vocab,
            Some(path.as_ref().to_path_buf()),
            do_lower_case,
            remove_space,
            keep_accents,
        ))
    }

    /// Creates an XLNet tokenizer from the raw bytes of a SentencePiece protobuf.
    pub fn from_serialized_proto(
        proto: &[u8],
        do_lower_case: bool,
        remove_space: bool,
        keep_accents: bool,
    ) -> Result<XLNetTokenizer, NlpKitError> {
        let model = SentencePieceModel::from_serialized_proto(proto)?;
        let vocab = XLNetVocab::from_serialized_proto(proto)?;
        Ok(Self::from_parts(
            model,
            vocab,
            None,
            do_lower_case,
            remove_space,
            keep_accents,
        ))
    }

    /// Creates an XLNet tokenizer from an existing vocabulary and SentencePiece model. The
    /// resulting tokenizer has no backing file; `save_vocabulary` falls back to writing the
    /// model's serialized bytes.
    pub fn from_existing_vocab_and_model(
        vocab: XLNetVocab,
        model: SentencePieceModel,
        do_lower_case: bool,
        remove_space: bool,
        keep_accents: bool,
    ) -> XLNetTokenizer {
        Self::from_parts(
            model,
            vocab,
            None,
            do_lower_case,
            remove_space,
            keep_accents,
        )
    }

    fn from_parts(
        model: SentencePieceModel,
        vocab: XLNetVocab,
        vocab_file: Option<PathBuf>,
        do_lower_case: bool,
        remove_space: bool,
        keep_accents: bool,
    ) -> XLNetTokenizer {
        let mut tokenizer = XLNetTokenizer {
            model,
            vocab,
            vocab_file,
            do_lower_case,
            remove_space,
            keep_accents,
            clean_up_tokenization_spaces: true,
            added_tokens: Vec::new(),
        };
        tokenizer.register_default_special_tokens();
        tokenizer
    }

    /// Registers the vocabulary's special tokens for matching during tokenization. The mask
    /// token absorbs the whitespace preceding it so that `"hello <mask>"` does not leave a
    /// stray space piece behind.
    fn register_default_special_tokens(&mut self) {
        let mut special_tokens: Vec<String> = vec![
            self.vocab.unk_token().to_string(),
            self.vocab.bos_token().to_string(),
            self.vocab.eos_token().to_string(),
            self.vocab.sep_token().to_string(),
            self.vocab.pad_token().to_string(),
            self.vocab.cls_token().to_string(),
        ];
        special_tokens.extend(self.vocab.additional_special_tokens().to_vec());
        let mask_token = self.vocab.mask_token().to_string();
        let mut added_tokens: Vec<AddedToken> = special_tokens
            .into_iter()
            .map(|content| AddedToken {
                content,
                lstrip: false,
                special: true,
            })
            .collect();
        added_tokens.push(AddedToken {
            content: mask_token,
            lstrip: true,
            special: true,
        });
        self.add_tokens(&added_tokens);
    }

    /// Normalizes a text chunk ahead of SentencePiece segmentation: whitespace cleanup,
    /// quote replacement, then the optional accent stripping and lower casing.
    fn preprocess_text(&self, text: &str) -> String {
        let mut output = if self.remove_space {
            collapse_whitespace(text)
        } else {
            text.to_string()
        };
        output = output.replace("``", "\"").replace("''", "\"");
        if !self.keep_accents {
            output = strip_accents(&output);
        }
        if self.do_lower_case {
            output = output.to_lowercase();
        }
        output
    }

    /// Number of pieces in the sentence piece model, added tokens excluded.
    pub fn vocab_size(&self) -> usize {
        self.model.len()
    }

    /// Token type id marking padding positions, one segment beyond the `<cls>` segment.
    pub fn pad_token_type_id(&self) -> i8 {
        3
    }

    /// Converts a piece to its vocabulary id, falling back to the unknown token id.
    pub fn piece_to_id(&self, piece: &str) -> i64 {
        self.vocab.token_to_id(piece)
    }

    /// Converts a vocabulary id back to its piece.
    pub fn id_to_piece(&self, id: i64) -> String {
        self.vocab.id_to_token(id)
    }

    /// Saves the sentence piece model to `save_directory` as `spiece.model` (prefixed with
    /// `filename_prefix-` when given). The original vocabulary file is copied when the
    /// tokenizer was loaded from disk, otherwise the retained protobuf bytes are written.
    ///
    /// Returns the path of the written file.
    pub fn save_vocabulary<P: AsRef<Path>>(
        &self,
        save_directory: P,
        filename_prefix: Option<&str>,
    ) -> Result<PathBuf, NlpKitError> {
        let save_directory = save_directory.as_ref();
        if !save_directory.is_dir() {
            log::error!(
                "Vocabulary path ({}) should be a directory",
                save_directory.display()
            );
            return Err(NlpKitError::IOError(format!(
                "{} is not a directory",
                save_directory.display()
            )));
        }
        let file_name = match filename_prefix {
            Some(prefix) => format!("{}-{}", prefix, VOCAB_FILE_NAME),
            None => VOCAB_FILE_NAME.to_string(),
        };
        let output_path = save_directory.join(&file_name);
        match &self.vocab_file {
            Some(vocab_file) if vocab_file.is_file() => {
                // the canonical target is resolved through the directory, the output file
                // itself may not exist yet
                let target = fs::canonicalize(save_directory)?.join(&file_name);
                if fs::canonicalize(vocab_file)? != target {
                    fs::copy(vocab_file, &output_path)?;
                }
            }
            _ => fs::write(&output_path, self.model.serialized_proto())?,
        }
        Ok(output_path)
    }

    /// Snapshot of the tokenizer configuration, suitable for serialization. The sentence
    /// piece model itself is not embedded; restoring the state reloads it from
    /// `vocab_file`.
    pub fn state(&self) -> XLNetTokenizerState {
        XLNetTokenizerState {
            vocab_file: self.vocab_file.clone(),
            do_lower_case: self.do_lower_case,
            remove_space: self.remove_space,
            keep_accents: self.keep_accents,
            clean_up_tokenization_spaces: self.clean_up_tokenization_spaces,
            special_token_map: self.vocab.special_token_map().clone(),
            added_tokens: self.added_tokens.clone(),
        }
    }

    /// Rebuilds a tokenizer from a configuration snapshot, reloading the sentence piece
    /// model from the recorded vocabulary file.
    pub fn from_state(state: &XLNetTokenizerState) -> Result<XLNetTokenizer, NlpKitError> {
        let vocab_file = state.vocab_file.as_ref().ok_or_else(|| {
            NlpKitError::ModelLoadError(
                "Cannot restore a tokenizer from a state without a vocabulary file".to_string(),
            )
        })?;
        let mut tokenizer = Self::from_file_with_special_token_map(
            vocab_file,
            state.do_lower_case,
            state.remove_space,
            state.keep_accents,
            state.special_token_map.clone(),
        )?;
        tokenizer.clean_up_tokenization_spaces = state.clean_up_tokenization_spaces;
        tokenizer.add_tokens(&state.added_tokens);
        Ok(tokenizer)
    }
}

impl Tokenizer<XLNetVocab> for XLNetTokenizer {
    fn vocab(&self) -> &XLNetVocab {
        &self.vocab
    }

    fn vocab_mut(&mut self) -> &mut XLNetVocab {
        &mut self.vocab
    }

    fn added_tokens(&self) -> &[AddedToken] {
        &self.added_tokens
    }

    fn added_tokens_mut(&mut self) -> &mut Vec<AddedToken> {
        &mut self.added_tokens
    }

    fn tokenize_to_pieces(&self, text: &str) -> Vec<String> {
        let text = self.preprocess_text(text);
        let pieces = self.model.encode_as_pieces(&text);
        let mut output: Vec<String> = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let glues_digit_to_comma = piece.chars().count() > 1
                && piece.ends_with(',')
                && piece
                    .chars()
                    .rev()
                    .nth(1)
                    .map_or(false, |c| c.is_numeric());
            if glues_digit_to_comma {
                // pieces like "9," hide the digits from the unigram model, re-segment
                // the prefix on its own and emit the comma as a standalone piece
                let prefix = piece[..piece.len() - 1].replace(SPIECE_UNDERLINE, "");
                let mut refined = self.model.encode_as_pieces(&prefix);
                if !piece.starts_with(SPIECE_UNDERLINE)
                    && refined
                        .first()
                        .map_or(false, |first| first.starts_with(SPIECE_UNDERLINE))
                {
                    if refined[0].chars().count() == 1 {
                        refined.remove(0);
                    } else {
                        refined[0] = refined[0].chars().skip(1).collect();
                    }
                }
                output.extend(refined);
                output.push(",".to_string());
            } else {
                output.push(piece);
            }
        }
        output
    }

    fn convert_tokens_to_string(&self, tokens: &[String]) -> String {
        tokens
            .concat()
            .replace(SPIECE_UNDERLINE, " ")
            .trim()
            .to_string()
    }

    fn clean_up_tokenization_spaces(&self) -> bool {
        self.clean_up_tokenization_spaces
    }

    fn build_inputs_with_special_tokens(
        &self,
        token_ids_1: &[i64],
        token_ids_2: Option<&[i64]>,
    ) -> Vec<i64> {
        let sep = self.vocab.token_to_id(self.vocab.sep_token());
        let cls = self.vocab.token_to_id(self.vocab.cls_token());
        let mut output = token_ids_1.to_vec();
        output.push(sep);
        if let Some(token_ids_2) = token_ids_2 {
            output.extend_from_slice(token_ids_2);
            output.push(sep);
        }
        output.push(cls);
        output
    }

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
                .map(|id| i8::from(self.vocab.is_special_id(*id)))
                .collect());
        }
        let mut mask = vec![0; token_ids_1.len()];
        mask.push(1);
        if let Some(token_ids_2) = token_ids_2 {
            mask.extend(vec![0; token_ids_2.len()]);
            mask.push(1);
        }
        mask.push(1);
        Ok(mask)
    }

    fn create_token_type_ids_from_sequences(
        &self,
        token_ids_1: &[i64],
        token_ids_2: Option<&[i64]>,
    ) -> Vec<i8> {
        // first sequence and its separator are segment 0, the second segment 1, the
        // trailing classification token segment 2
        let mut token_type_ids = vec![0; token_ids_1.len() + 1];
        if let Some(token_ids_2) = token_ids_2 {
            token_type_ids.extend(vec![1; token_ids_2.len() + 1]);
        }
        token_type_ids.push(2);
        token_type_ids
    }
}

/// # Serializable snapshot of an [`XLNetTokenizer`] configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XLNetTokenizerState {
    /// File the sentence piece model was loaded from, `None` for in-memory tokenizers
    pub vocab_file: Option<PathBuf>,
    pub do_lower_case: bool,
    pub remove_space: bool,
    pub keep_accents: bool,
    pub clean_up_tokenization_spaces: bool,
    pub special_token_map: SpecialTokenMap,
    pub added_tokens: Vec<AddedToken>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{ModelProto, SentencePiece, SentencePieceType};
    use prost::Message;

    fn tokenizer_from_pieces(
        pieces: &[(&str, f32)],
        do_lower_case: bool,
        remove_space: bool,
        keep_accents: bool,
    ) -> XLNetTokenizer {
        let mut proto = ModelProto {
            pieces: vec![SentencePiece::with_type(
                "<unk>",
                0.0,
                SentencePieceType::Unknown,
            )],
        };
        for (piece, score) in pieces {
            proto.pieces.push(SentencePiece::with_type(
                piece,
                *score,
                SentencePieceType::Normal,
            ));
        }
        let mut buffer = Vec::new();
        proto.encode(&mut buffer).unwrap();
        XLNetTokenizer::from_serialized_proto(&buffer, do_lower_case, remove_space, keep_accents)
            .unwrap()
    }

    #[test]
    fn preprocess_normalizes_whitespace_quotes_accents_and_case() {
        let tokenizer = tokenizer_from_pieces(&[], true, true, false);
        assert_eq!(
            tokenizer.preprocess_text("  H\u{e9}llo,   ``w\u{f6}rld''  "),
            "hello, \"world\""
        );
    }

    #[test]
    fn preprocess_keeps_accents_and_spacing_when_configured() {
        let tokenizer = tokenizer_from_pieces(&[], false, false, true);
        assert_eq!(tokenizer.preprocess_text(" caf\u{e9}  !"), " caf\u{e9}  !");
    }

    #[test]
    fn number_comma_pieces_are_resegmented() {
        let tokenizer = tokenizer_from_pieces(
            &[
                ("\u{2581}8,", -1.0),
                ("000", -2.0),
                ("\u{2581}8", -3.0),
                (",", -4.0),
            ],
            false,
            true,
            false,
        );
        assert_eq!(
            tokenizer.tokenize("8,000"),
            vec!["\u{2581}8", ",", "000"]
        );
    }

    #[test]
    fn non_ascii_digit_comma_pieces_are_resegmented() {
        //    Arabic-Indic digits glued to a comma split the same way ASCII digits do
        let tokenizer = tokenizer_from_pieces(
            &[
                ("\u{2581}\u{668},", -1.0),
                ("\u{660}\u{660}\u{660}", -2.0),
                ("\u{2581}\u{668}", -3.0),
                (",", -4.0),
            ],
            false,
            true,
            false,
        );
        assert_eq!(
            tokenizer.tokenize("\u{668},\u{660}\u{660}\u{660}"),
            vec!["\u{2581}\u{668}", ",", "\u{660}\u{660}\u{660}"]
        );
    }

    #[test]
    fn multi_comma_numbers_resegment_every_glued_piece() {
        let tokenizer = tokenizer_from_pieces(
            &[
                ("\u{2581}8,", -1.0),
                ("000,", -1.5),
                ("000", -2.0),
                ("\u{2581}8", -3.0),
                (",", -4.0),
                ("\u{2581}", -5.0),
            ],
            false,
            true,
            false,
        );
        assert_eq!(
            tokenizer.tokenize("8,000,000"),
            vec!["\u{2581}8", ",", "000", ",", "000"]
        );
    }

    #[test]
    fn comma_pieces_inside_words_drop_the_inserted_marker() {
        //    the prefix re-segmentation starts with a bare marker piece, which is dropped
        let tokenizer = tokenizer_from_pieces(
            &[
                ("\u{2581}x", -1.0),
                ("000,", -1.5),
                ("000", -2.0),
                ("\u{2581}", -5.0),
            ],
            false,
            true,
            false,
        );
        assert_eq!(
            tokenizer.tokenize("x000,"),
            vec!["\u{2581}x", "000", ","]
        );
    }

    #[test]
    fn comma_pieces_inside_words_strip_the_marker_from_the_prefix() {
        //    the prefix re-segmentation fuses the marker into its first piece
        let tokenizer = tokenizer_from_pieces(
            &[
                ("\u{2581}x", -1.0),
                ("000,", -1.5),
                ("\u{2581}000", -2.0),
            ],
            false,
            true,
            false,
        );
        assert_eq!(
            tokenizer.tokenize("x000,"),
            vec!["\u{2581}x", "000", ","]
        );
    }

    #[test]
    fn pieces_concatenate_back_into_text() {
        let tokenizer = tokenizer_from_pieces(&[], false, true, false);
        let tokens = vec![
            "\u{2581}hello".to_string(),
            "\u{2581}wor".to_string(),
            "ld".to_string(),
        ];
        assert_eq!(tokenizer.convert_tokens_to_string(&tokens), "hello world");
    }

    #[test]
    fn in_memory_tokenizers_have_no_backing_file() {
        let proto = ModelProto {
            pieces: vec![
                SentencePiece::with_type("<unk>", 0.0, SentencePieceType::Unknown),
                SentencePiece::with_type("\u{2581}hello", -1.0, SentencePieceType::Normal),
            ],
        };
        let mut buffer = Vec::new();
        proto.encode(&mut buffer).unwrap();
        let model = SentencePieceModel::from_serialized_proto(&buffer).unwrap();
        let vocab = XLNetVocab::from_serialized_proto(&buffer).unwrap();
        let tokenizer =
            XLNetTokenizer::from_existing_vocab_and_model(vocab, model, false, true, false);

        assert_eq!(tokenizer.tokenize("hello"), vec!["\u{2581}hello"]);
        assert_eq!(tokenizer.state().vocab_file, None);
    }

    #[test]
    fn mask_token_absorbs_the_preceding_space() {
        let tokenizer = tokenizer_from_pieces(
            &[("\u{2581}hello", -1.0), ("\u{2581}world", -1.0)],
            false,
            true,
            false,
        );
        assert_eq!(
            tokenizer.tokenize("hello <mask> world"),
            vec!["\u{2581}hello", "<mask>", "\u{2581}world"]
        );
    }
}
