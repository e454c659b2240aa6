// Copyright 2016 Google Inc.
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
use crate::vocab::sentence_piece_proto::{ModelProto, SentencePieceType};
use prost::Message;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Word boundary marker used by SentencePiece models.
pub static SPIECE_UNDERLINE: char = '\u{2581}';

/// Log probability assigned to characters not covered by any piece.
const UNKNOWN_PIECE_PENALTY: f32 = -100.0;

/// Node of the character trie holding the searchable pieces of the model.
#[derive(Debug, Default, Clone)]
struct TrieNode {
    end: bool,
    score: f32,
    children: HashMap<char, TrieNode>,
}

/// Element of the segmentation lattice. `start` and `end` are character boundary indices,
/// `byte_start` and `byte_end` delimit the piece text in the input string.
#[derive(Debug, Clone)]
struct LatticeNode {
    start: usize,
    byte_start: usize,
    byte_end: usize,
    unknown: bool,
}

/// # SentencePiece unigram model
///
/// Holds the pieces of a serialized SentencePiece model in a character trie and segments text
/// into pieces with a Viterbi search over the unigram log probabilities. The model is read-only
/// after construction and can be shared across threads.
#[derive(Debug, Clone)]
pub struct SentencePieceModel {
    root: TrieNode,
    len: usize,
    proto_bytes: Vec<u8>,
}

impl SentencePieceModel {
    /// Loads a model from a serialized `spiece.model` file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the model file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_nlp_kit::vocab::SentencePieceModel;
    /// let model = SentencePieceModel::from_file("path/to/spiece.model");
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SentencePieceModel, NlpKitError> {
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
        Self::from_serialized_proto(&contents)
    }

    /// Builds a model from serialized `ModelProto` bytes, e.g. a model held in memory.
    pub fn from_serialized_proto(proto_bytes: &[u8]) -> Result<SentencePieceModel, NlpKitError> {
        let proto = ModelProto::decode(proto_bytes)?;
        let mut model = SentencePieceModel {
            root: TrieNode::default(),
            len: proto.pieces.len(),
            proto_bytes: proto_bytes.to_vec(),
        };
        for piece in &proto.pieces {
            match piece.piece_type() {
                SentencePieceType::Normal
                | SentencePieceType::UserDefined
                | SentencePieceType::Byte => {
                    model.insert(piece.piece(), piece.score());
                }
                // Control and unknown pieces keep their ids but are never matched in text.
                SentencePieceType::Unknown
                | SentencePieceType::Control
                | SentencePieceType::Unused => {}
            }
        }
        Ok(model)
    }

    /// Number of pieces in the model, including control and unknown pieces.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the model holds no pieces.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Serialized proto this model was built from, as stored on disk.
    pub fn serialized_proto(&self) -> &[u8] {
        &self.proto_bytes
    }

    /// Segments a text chunk into pieces.
    ///
    /// Whitespace is escaped to the U+2581 boundary marker and a leading marker is inserted
    /// when the text does not already start with one, so that word-initial pieces are preferred
    /// at the beginning of the chunk. Characters not covered by any piece are grouped into
    /// single unknown pieces.
    pub fn encode_as_pieces(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut escaped = text.replace(|c: char| c.is_whitespace(), "\u{2581}");
        if !escaped.starts_with(SPIECE_UNDERLINE) {
            escaped.insert(0, SPIECE_UNDERLINE);
        }
        let lattice = self.decode_forward(&escaped);
        let best_sequence = Self::decode_backward(&lattice);

        let mut pieces: Vec<String> = Vec::with_capacity(best_sequence.len());
        let mut previous_unknown = false;
        for node in best_sequence {
            let piece = &escaped[node.byte_start..node.byte_end];
            if previous_unknown && node.unknown {
                if let Some(last) = pieces.last_mut() {
                    last.push_str(piece);
                }
            } else {
                pieces.push(piece.to_string());
            }
            previous_unknown = node.unknown;
        }
        pieces
    }

    fn insert(&mut self, piece: &str, score: f32) {
        let mut node = &mut self.root;
        for character in piece.chars() {
            node = node.children.entry(character).or_default();
        }
        node.end = true;
        node.score = score;
    }

    /// Returns the `(length in characters, score)` of every piece prefixing `text`.
    fn common_prefix_search(&self, text: &str) -> Vec<(usize, f32)> {
        let mut results = Vec::new();
        let mut node = &self.root;
        for (char_count, character) in text.chars().enumerate() {
            match node.children.get(&character) {
                Some(child) => {
                    if child.end {
                        results.push((char_count + 1, child.score));
                    }
                    node = child;
                }
                None => break,
            }
        }
        results
    }

    /// Forward Viterbi pass. Returns the best incoming lattice node for every character
    /// boundary; the entry boundary (index 0) is left empty.
    fn decode_forward(&self, text: &str) -> Vec<Option<LatticeNode>> {
        let mut char_positions: Vec<usize> = text.char_indices().map(|(pos, _)| pos).collect();
        char_positions.push(text.len());
        let num_boundaries = char_positions.len();

        let mut best: Vec<Option<LatticeNode>> = vec![None; num_boundaries];
        let mut scores = vec![f32::NEG_INFINITY; num_boundaries];
        scores[0] = 0f32;
        for start in 0..num_boundaries - 1 {
            for (length, piece_score) in self.common_prefix_search(&text[char_positions[start]..])
            {
                let end = start + length;
                let score = scores[start] + piece_score;
                if score > scores[end] {
                    scores[end] = score;
                    best[end] = Some(LatticeNode {
                        start,
                        byte_start: char_positions[start],
                        byte_end: char_positions[end],
                        unknown: false,
                    });
                }
            }
            // Single character fallback keeping the lattice connected over uncovered input
            if best[start + 1].is_none() {
                scores[start + 1] = scores[start] + UNKNOWN_PIECE_PENALTY;
                best[start + 1] = Some(LatticeNode {
                    start,
                    byte_start: char_positions[start],
                    byte_end: char_positions[start + 1],
                    unknown: true,
                });
            }
        }
        best
    }

    /// Backward pass recovering the best segmentation from the lattice.
    fn decode_backward(nodes: &[Option<LatticeNode>]) -> Vec<&LatticeNode> {
        let mut best_sequence = Vec::new();
        let mut next_node = nodes.last().and_then(|node| node.as_ref());
        while let Some(node) = next_node {
            best_sequence.push(node);
            next_node = nodes[node.start].as_ref();
        }
        best_sequence.reverse();
        best_sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::sentence_piece_proto::SentencePiece;

    fn test_model(pieces: &[(&str, f32)]) -> SentencePieceModel {
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
        SentencePieceModel::from_serialized_proto(&buffer).unwrap()
    }

    #[test]
    fn picks_the_highest_scoring_segmentation() {
        let model = test_model(&[
            ("\u{2581}hello", -1.0),
            ("\u{2581}hell", -2.0),
            ("o", -1.0),
            ("\u{2581}world", -1.5),
            ("\u{2581}", -3.0),
        ]);
        assert_eq!(
            model.encode_as_pieces("hello world"),
            vec!["\u{2581}hello", "\u{2581}world"]
        );
    }

    #[test]
    fn prefers_longer_pieces_when_scores_favour_them() {
        let model = test_model(&[
            ("\u{2581}un", -2.0),
            ("related", -2.0),
            ("\u{2581}unrelated", -3.0),
        ]);
        // The single piece at -3.0 beats the two piece split at -4.0.
        assert_eq!(
            model.encode_as_pieces("unrelated"),
            vec!["\u{2581}unrelated"]
        );
    }

    #[test]
    fn fuses_consecutive_unknown_characters() {
        let model = test_model(&[("\u{2581}", -1.0), ("\u{2581}a", -1.0)]);
        let pieces = model.encode_as_pieces("a xyz");
        assert_eq!(pieces, vec!["\u{2581}a", "\u{2581}", "xyz"]);
    }

    #[test]
    fn escapes_internal_whitespace() {
        let model = test_model(&[("\u{2581}a", -1.0), ("\u{2581}b", -1.0)]);
        assert_eq!(
            model.encode_as_pieces("a\tb"),
            vec!["\u{2581}a", "\u{2581}b"]
        );
    }

    #[test]
    fn empty_input_yields_no_pieces() {
        let model = test_model(&[("\u{2581}a", -1.0)]);
        assert!(model.encode_as_pieces("").is_empty());
    }

    #[test]
    fn control_pieces_are_not_matched_in_text() {
        let proto = ModelProto {
            pieces: vec![
                SentencePiece::with_type("<unk>", 0.0, SentencePieceType::Unknown),
                SentencePiece::with_type("<s>", 0.0, SentencePieceType::Control),
                SentencePiece::with_type("\u{2581}", -1.0, SentencePieceType::Normal),
                SentencePiece::with_type("s", -1.0, SentencePieceType::Normal),
            ],
        };
        let mut buffer = Vec::new();
        proto.encode(&mut buffer).unwrap();
        let model = SentencePieceModel::from_serialized_proto(&buffer).unwrap();
        // "<s>" must decompose into characters instead of matching the control piece.
        let pieces = model.encode_as_pieces("<s>");
        assert_eq!(pieces, vec!["\u{2581}", "<", "s", ">"]);
        assert_eq!(model.len(), 4);
    }

    #[test]
    fn serialized_proto_round_trips() {
        let model = test_model(&[("\u{2581}a", -1.0)]);
        let restored = SentencePieceModel::from_serialized_proto(model.serialized_proto()).unwrap();
        assert_eq!(restored.len(), model.len());
        assert_eq!(restored.serialized_proto(), model.serialized_proto());
    }
}
