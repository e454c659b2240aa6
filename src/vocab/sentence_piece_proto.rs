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

//! Hand-declared subset of the SentencePiece `sentencepiece_model.proto` schema.
//!
//! Only the piece list is declared; the trainer and normalizer specifications stored in the
//! same file are skipped during decoding. Field tags follow the public schema so that any
//! `spiece.model` file produced by the SentencePiece trainer can be read.

use prost::Message;

/// A single sentence piece and its unigram log probability.
#[derive(Clone, PartialEq, Message)]
pub struct SentencePiece {
    /// Piece text, with word boundaries marked by U+2581.
    #[prost(string, optional, tag = "1")]
    pub piece: Option<String>,
    /// Unigram log probability of the piece.
    #[prost(float, optional, tag = "2")]
    pub score: Option<f32>,
    /// Piece category, `Normal` for ordinary subwords.
    #[prost(
        enumeration = "SentencePieceType",
        optional,
        tag = "3",
        default = "Normal"
    )]
    pub piece_type: Option<i32>,
}

/// Category of a sentence piece within the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum SentencePieceType {
    /// Ordinary subword unit, eligible for segmentation.
    Normal = 1,
    /// Placeholder the segmenter falls back to for uncovered input.
    Unknown = 2,
    /// Reserved control symbol (e.g. `<s>`), never produced by segmentation.
    Control = 3,
    /// Symbol injected by the user at training time, matched verbatim.
    UserDefined = 4,
    /// Piece kept in the file but removed from the searchable vocabulary.
    Unused = 5,
    /// Byte fallback piece used by byte-level models.
    Byte = 6,
}

/// Serialized SentencePiece model.
#[derive(Clone, PartialEq, Message)]
pub struct ModelProto {
    /// Sentence pieces ordered by id: the id of a piece is its position in this list.
    #[prost(message, repeated, tag = "1")]
    pub pieces: Vec<SentencePiece>,
}

impl SentencePiece {
    /// Creates a piece of the given type, used to assemble models programmatically.
    pub fn with_type(piece: &str, score: f32, piece_type: SentencePieceType) -> SentencePiece {
        SentencePiece {
            piece: Some(piece.to_string()),
            score: Some(score),
            piece_type: Some(piece_type as i32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proto_round_trip_preserves_pieces() {
        let proto = ModelProto {
            pieces: vec![
                SentencePiece::with_type("<unk>", 0.0, SentencePieceType::Unknown),
                SentencePiece::with_type("\u{2581}hello", -2.5, SentencePieceType::Normal),
            ],
        };
        let mut buffer = Vec::new();
        proto.encode(&mut buffer).unwrap();
        let decoded = ModelProto::decode(buffer.as_slice()).unwrap();
        assert_eq!(decoded.pieces.len(), 2);
        assert_eq!(decoded.pieces[0].piece(), "<unk>");
        assert_eq!(decoded.pieces[0].piece_type(), SentencePieceType::Unknown);
        assert_eq!(decoded.pieces[1].piece(), "\u{2581}hello");
        assert!((decoded.pieces[1].score() + 2.5).abs() < 1e-6);
        assert_eq!(decoded.pieces[1].piece_type(), SentencePieceType::Normal);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        // A varint field with an unused tag must not break decoding.
        let proto = ModelProto {
            pieces: vec![SentencePiece::with_type(
                "\u{2581}",
                -1.0,
                SentencePieceType::Normal,
            )],
        };
        let mut buffer = Vec::new();
        proto.encode(&mut buffer).unwrap();
        // Append field 100 (varint), mimicking sections of the schema left undeclared.
        buffer.extend_from_slice(&[0xa0, 0x06, 0x2a]);
        let decoded = ModelProto::decode(buffer.as_slice()).unwrap();
        assert_eq!(decoded.pieces.len(), 1);
    }
}
