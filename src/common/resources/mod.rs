//! # Resource definitions for vocabulary and configuration files
//!
//! This crate relies on the concept of Resources to access the files used by the tokenizers.
//! This includes:
//! - vocabulary files (e.g. SentencePiece `spiece.model` files)
//! - tokenizer configuration files
//!
//! These are used as utilities to reference the resource location. Two types of resources are
//! pre-defined:
//! - LocalResource: points to a local file
//! - RemoteResource: points to a remote file via a URL
//!
//! For both types of resources, the local location of the file can be retrieved using
//! `get_local_path`, allowing to reference the resource file location regardless if it is a remote
//! or local resource. Default implementations for a number of `RemoteResources` are available as
//! pre-trained vocabularies in the tokenizer module.

mod local;

use crate::common::error::NlpKitError;
pub use local::LocalResource;
use std::path::PathBuf;

/// # Resource Trait that can provide the location of vocabulary or configuration resources
pub trait ResourceProvider {
    /// Provides the local path for a resource.
    ///
    /// # Returns
    ///
    /// * `PathBuf` pointing to the resource file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_nlp_kit::resources::{LocalResource, ResourceProvider};
    /// use std::path::PathBuf;
    /// let vocab_resource = LocalResource {
    ///     local_path: PathBuf::from("path/to/spiece.model"),
    /// };
    /// let vocab_path = vocab_resource.get_local_path();
    /// ```
    fn get_local_path(&self) -> Result<PathBuf, NlpKitError>;
}

#[cfg(feature = "remote")]
mod remote;
#[cfg(feature = "remote")]
pub use remote::RemoteResource;
