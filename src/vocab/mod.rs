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

//! # Vocabularies
//!
//! This module contains the vocabularies mapping tokens to ids, along with the SentencePiece
//! model performing the subword segmentation itself. The vocabulary is fully derived from the
//! serialized SentencePiece model file: the id of a piece is its position in the piece list,
//! and special tokens missing from the file are layered on top with fresh ids.

mod base_vocab;
mod sentence_piece_model;
mod sentence_piece_proto;
mod xlnet_vocab;

pub use base_vocab::{SpecialTokenMap, Vocab};
pub use sentence_piece_model::{SentencePieceModel, SPIECE_UNDERLINE};
pub use sentence_piece_proto::{ModelProto, SentencePiece, SentencePieceType};
pub use xlnet_vocab::XLNetVocab;
