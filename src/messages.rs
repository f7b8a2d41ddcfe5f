use std::path::PathBuf;

use crate::converter::{ConversionOutcome, ConversionRequest};
use crate::errors::ErrorKind;

/// Commands sent from the UI thread to the worker thread.
#[derive(Debug)]
pub enum WorkerCommand {
    /// A file was picked: validate it and, if it decodes, convert it.
    Select { path: PathBuf },

    /// Finish and exit the worker loop.
    Shutdown,
}

/// Results sent from the worker thread back to the UI thread.
#[derive(Debug)]
pub enum WorkerResult {
    /// The picked file is not a decodable image. Nothing was converted or logged.
    InvalidImage { path: PathBuf },

    /// Validation passed and the model is running.
    Started { request: ConversionRequest },

    Converted { outcome: ConversionOutcome },

    /// Conversion failed. `message` is the status line; the full report went to
    /// the backlog file.
    Failed {
        request: ConversionRequest,
        kind: ErrorKind,
        message: String,
    },
}
