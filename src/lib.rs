pub mod app;
pub mod config;
pub mod converter;
pub mod error_log;
pub mod errors;
pub mod imageops_ai;
pub mod messages;
pub mod model;
pub mod selection;
pub mod status;
pub mod traits;
pub mod worker;

pub mod mocks;

pub use app::BackgroundRemoverApp;
pub use config::Config;
pub use converter::{output_path_for, ConversionOutcome, ConversionRequest, Converter};
pub use error_log::ErrorLog;
pub use errors::{BgRemoverError, ErrorKind, Result};
pub use model::{LazyModel, Model};
pub use status::{Status, StatusController};
pub use traits::*;
