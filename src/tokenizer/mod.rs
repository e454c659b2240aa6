//! # Tokenizers
//!
//! Text to model-input conversion. The pipeline shared by the tokenizers of this crate is
//! defined by the [`Tokenizer`] trait: splitting on registered added tokens, subword
//! segmentation, conversion to ids, truncation and input assembly with special tokens, and
//! decoding back to text. [`XLNetTokenizer`] is the SentencePiece-based implementation
//! following the XLNet conventions.

mod base_tokenizer;
pub(crate) mod tokenization_utils;
mod xlnet_tokenizer;

pub use base_tokenizer::{AddedToken, TokenizedInput, Tokenizer, TruncationStrategy};
pub use tokenization_utils::truncate_sequences;
pub use xlnet_tokenizer::{XLNetTokenizer, XLNetTokenizerState, XLNetVocabResources};
