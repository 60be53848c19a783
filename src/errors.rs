use std::path::PathBuf;
use thiserror::Error;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Structured error types for the object extractor.
///
/// Variants fall into two groups. Run-level errors (filter validation and
/// directory checks) stop the whole run before any image is touched. Per-image
/// errors (detection, directory creation) are reported for the offending image
/// only, and the walker moves on to the next file. Artifact errors cover a
/// single crop; the remaining crops of that image are still written.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(
        "Desired classes must be integer class ids separated by commas or spaces (got {spec:?}, bad token {token:?})"
    )]
    InvalidFilterSpec { spec: String, token: String },

    #[error("Confidence must be a float between 0 and 1 (got {value})")]
    InvalidConfidence { value: f32 },

    #[error("Directory not found: {path:?}")]
    DirectoryNotFound { path: PathBuf },

    #[error("No images found in {path:?}")]
    NoImagesFound { path: PathBuf },

    #[error("No supported images (.jpg, .png, .jpeg) found in {path:?}")]
    NoSupportedImagesFound { path: PathBuf },

    #[error("Detection error: {operation} failed for {path:?}")]
    Detection {
        path: PathBuf,
        operation: String,
        #[source]
        source: BoxedError,
    },

    #[error("Failed to write extracted object to {path:?}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot write a {width}x{height} crop to {path:?}")]
    EmptyArtifact {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Model error: {operation} failed")]
    Model {
        operation: String,
        #[source]
        source: BoxedError,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ExtractError {
    /// Whether this error aborts the whole run rather than a single image.
    pub const fn is_run_level(&self) -> bool {
        matches!(
            self,
            Self::InvalidFilterSpec { .. }
                | Self::InvalidConfidence { .. }
                | Self::DirectoryNotFound { .. }
                | Self::NoImagesFound { .. }
                | Self::NoSupportedImagesFound { .. }
                | Self::Configuration { .. }
        )
    }

    pub(crate) fn model(operation: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::Model {
            operation: operation.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Convert I/O errors to filesystem errors.
///
/// Call sites that know the path should build `ExtractError::FileSystem`
/// themselves; this is the fallback for the rest.
impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

/// Convert ONNX Runtime errors to model errors.
impl From<ort::Error> for ExtractError {
    fn from(err: ort::Error) -> Self {
        Self::model("ort operation", err)
    }
}

/// Shape errors only come out of tensor plumbing around inference.
impl From<ndarray::ShapeError> for ExtractError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::model("tensor shape conversion", err)
    }
}
