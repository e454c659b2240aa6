use crate::common::error::NlpKitError;
use crate::resources::ResourceProvider;
use std::path::PathBuf;

/// # Local resource
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct LocalResource {
    /// Local path for the resource
    pub local_path: PathBuf,
}

impl From<PathBuf> for LocalResource {
    fn from(local_path: PathBuf) -> Self {
        Self { local_path }
    }
}

impl ResourceProvider for LocalResource {
    /// Gets the path for a local resource.
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
    fn get_local_path(&self) -> Result<PathBuf, NlpKitError> {
        Ok(self.local_path.clone())
    }
}
