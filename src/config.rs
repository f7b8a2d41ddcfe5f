use clap::Parser;
use std::path::PathBuf;

use crate::errors::{BgRemoverError, Result};

/// Where rembg-style tools keep the U²-Net weights, relative to the home directory.
pub const DEFAULT_MODEL_RELATIVE_PATH: &str = ".u2net/u2net.onnx";

/// Startup options. Every flag has a default, so the application also runs
/// without arguments; nothing here is persisted.
#[derive(Parser, Clone, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// ONNX background removal model [default: ~/.u2net/u2net.onnx]
    #[arg(short, long)]
    pub model_path: Option<PathBuf>,

    /// GPU device used by the CUDA and TensorRT execution providers
    #[arg(short, long, default_value_t = 0)]
    pub device_id: i32,

    /// Intra-op threads for the model, 0 lets the runtime decide
    #[arg(short, long, default_value_t = 0)]
    pub num_threads: usize,

    /// Write diagnostics to stderr instead of discarding them
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn resolved_model_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.model_path {
            return Ok(path.clone());
        }
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_MODEL_RELATIVE_PATH))
            .ok_or_else(|| BgRemoverError::Configuration {
                message: "cannot determine the home directory, pass --model-path".to_string(),
            })
    }
}
