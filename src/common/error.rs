use prost::DecodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NlpKitError {
    #[error("Endpoint not available error: {0}")]
    FileDownloadError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Model load error: {0}")]
    ModelLoadError(String),

    #[error("Value error: {0}")]
    ValueError(String),
}

#[cfg(feature = "remote")]
impl From<cached_path::Error> for NlpKitError {
    fn from(error: cached_path::Error) -> Self {
        NlpKitError::FileDownloadError(error.to_string())
    }
}

impl From<std::io::Error> for NlpKitError {
    fn from(error: std::io::Error) -> Self {
        NlpKitError::IOError(error.to_string())
    }
}

impl From<DecodeError> for NlpKitError {
    fn from(error: DecodeError) -> Self {
        NlpKitError::ModelLoadError(error.to_string())
    }
}
