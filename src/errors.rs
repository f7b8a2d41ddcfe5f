use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Structured error types for the background remover.
///
/// Each variant carries the context of the step that failed (selection,
/// model, file system) so the backlog file can print the whole cause chain
/// while the status line folds it into a single line.
#[derive(Error, Debug)]
pub enum BgRemoverError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid image file: {path:?}")]
    InvalidImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{message}")]
    Model {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error: {operation} failed (file: {path})")]
    ImageProcessing {
        path: String,
        operation: String,
        #[source]
        source: BoxError,
    },
}

pub type Result<T> = std::result::Result<T, BgRemoverError>;

/// Coarse classification used to pick the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidImage,
    ModelFailure,
    IoFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidImage => "InvalidImage",
            Self::ModelFailure => "ModelFailure",
            Self::IoFailure => "IoFailure",
        })
    }
}

pub const INVALID_IMAGE_MESSAGE: &str = "Invalid image file. Please select a valid image.";

impl BgRemoverError {
    /// Model error without an underlying cause, e.g. an empty prediction.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
            source: None,
        }
    }

    pub fn model_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Model {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    pub fn image_processing(
        path: impl fmt::Display,
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ImageProcessing {
            path: path.to_string(),
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidImage { .. } => ErrorKind::InvalidImage,
            Self::Model { .. } | Self::Configuration { .. } => ErrorKind::ModelFailure,
            Self::FileSystem { .. } | Self::ImageProcessing { .. } => ErrorKind::IoFailure,
        }
    }

    /// One-line text for the status label: the message followed by its causes,
    /// joined with `": "`. Line breaks inside a cause are flattened.
    pub fn status_message(&self) -> String {
        if self.kind() == ErrorKind::InvalidImage {
            return INVALID_IMAGE_MESSAGE.to_string();
        }

        let mut message = format!("Error: {self}");
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            // wrappers often repeat their inner error's text
            if !text.is_empty() && !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }

    /// Multi-line report with the full cause chain, as written to the backlog file.
    pub fn report(&self) -> String {
        let mut report = format!("{}: {}", self.kind(), self);
        let mut source = std::error::Error::source(self);
        if source.is_some() {
            report.push_str("\nCaused by:");
        }
        let mut index = 0;
        while let Some(cause) = source {
            report.push_str(&format!("\n    {index}: {cause}"));
            index += 1;
            source = cause.source();
        }
        report
    }
}

impl From<anyhow::Error> for BgRemoverError {
    fn from(err: anyhow::Error) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image operation".to_string(),
            source: err.into(),
        }
    }
}

/// Fallback for I/O errors without a known path. Callers with context build
/// `FileSystem` directly.
impl From<std::io::Error> for BgRemoverError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

impl From<image::ImageError> for BgRemoverError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image processing".to_string(),
            source: Box::new(err),
        }
    }
}

impl From<ort::Error> for BgRemoverError {
    fn from(err: ort::Error) -> Self {
        Self::model_with_source("Model inference failed", err)
    }
}

/// Shape errors come out of tensor reshaping during inference, so they count
/// as model failures.
impl From<ndarray::ShapeError> for BgRemoverError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::model_with_source("Model output has an unexpected shape", err)
    }
}
