//! Ready-to-use NLP building blocks for Rust
//!
//! This crate provides low-level components needed to assemble transformer-style NLP
//! systems on top of the [tch](https://github.com/LaurentMazare/tch-rs) bindings to libtorch:
//!
//! - Subword tokenization following the XLNet (SentencePiece unigram) conventions, including
//!   model-specific text normalization, special token handling, input assembly and vocabulary
//!   persistence. The SentencePiece model file is parsed natively, no external sentencepiece
//!   runtime is required.
//! - A library of attention modules (scaled dot-product, additive, linear, cosine, binary and
//!   location-aware attention) sharing a common construction and forward pass style, to be
//!   embedded in larger `tch` models.
//!
//! # Quick start
//!
//! ```no_run
//! use rust_nlp_kit::tokenizer::{Tokenizer, TruncationStrategy, XLNetTokenizer};
//!
//! fn main() -> anyhow::Result<()> {
//!     let tokenizer = XLNetTokenizer::from_file("path/to/spiece.model", false, true, false)?;
//!     let input = tokenizer.encode(
//!         "The quick brown fox jumped over 8,000,000 lazy dogs",
//!         None,
//!         128,
//!         &TruncationStrategy::LongestFirst,
//!         0,
//!     )?;
//!     let text = tokenizer.decode(&input.token_ids, true, None, true);
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```
//!
//! # Loading pretrained vocabularies
//!
//! Vocabulary files can be referenced through the [`resources`] module. `LocalResource` points
//! to files on disk; with the default `remote` feature enabled, `RemoteResource` downloads and
//! caches files from a URL (cache location controlled by the `NLP_KIT_CACHE` environment
//! variable, defaulting to the user cache directory). Ready-made pointers to the XLNet
//! vocabularies published on the model hub are available in
//! [`tokenizer::XLNetVocabResources`].
//!
//! ```no_run
//! use rust_nlp_kit::resources::{RemoteResource, ResourceProvider};
//! use rust_nlp_kit::tokenizer::{XLNetTokenizer, XLNetVocabResources};
//!
//! fn main() -> anyhow::Result<()> {
//!     let vocab_resource = RemoteResource::from_pretrained(XLNetVocabResources::XLNET_BASE_CASED);
//!     let vocab_path = vocab_resource.get_local_path()?;
//!     let tokenizer = XLNetTokenizer::from_file(vocab_path, false, true, false)?;
//!     Ok(())
//! }
//! ```

pub mod attention;
pub mod common;
pub mod tokenizer;
pub mod vocab;

pub use common::error::NlpKitError;
pub use common::resources;
pub use common::Config;
