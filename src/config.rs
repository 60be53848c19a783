use clap::Parser;
use std::path::{Path, PathBuf};
use std::thread;

use crate::errors::{ExtractError, Result};

pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_EXTRACTED_DIR: &str = "extracted";
pub const DEFAULT_MODEL_FILE: &str = "yolov8n.onnx";

#[derive(Parser, Clone, Debug)]
#[command(
    version,
    about = "Extract objects from images into separate cropped files using a YOLOv8 ONNX model",
    long_about = None
)]
pub struct Config {
    /// Directory containing images [default: <executable dir>/images]
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Minimum detection confidence, between 0 and 1
    #[arg(short, long, allow_negative_numbers = true)]
    pub confidence: Option<f32>,

    /// Class ids to extract, e.g. "0,16" or "0 16" [default: all classes]
    #[arg(short = 'i', long)]
    pub classes: Option<String>,

    /// YOLOv8 ONNX model [default: <executable dir>/yolov8n.onnx]
    #[arg(short, long)]
    pub model_path: Option<PathBuf>,

    /// Output directory [default: <executable dir>/extracted]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 0)]
    pub device_id: i32,

    #[arg(short, long, default_value_t = default_num_threads())]
    pub num_threads: usize,

    /// Log every detection decision
    #[arg(short, long)]
    pub verbose: bool,
}

/// Paths the walker and extraction engine operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl ExtractionConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// `images/` and `extracted/` next to `base_dir`.
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self::new(
            base_dir.join(DEFAULT_IMAGES_DIR),
            base_dir.join(DEFAULT_EXTRACTED_DIR),
        )
    }
}

impl Config {
    /// Resolve directory defaults against the executable location.
    pub fn extraction_config(&self) -> Result<ExtractionConfig> {
        let base_dir = executable_dir()?;
        Ok(self.extraction_config_with_base(&base_dir))
    }

    pub fn extraction_config_with_base(&self, base_dir: &Path) -> ExtractionConfig {
        let defaults = ExtractionConfig::with_base_dir(base_dir);
        ExtractionConfig {
            input_dir: self.dir.clone().unwrap_or(defaults.input_dir),
            output_dir: self.output_dir.clone().unwrap_or(defaults.output_dir),
        }
    }

    pub fn model_path(&self) -> Result<PathBuf> {
        match &self.model_path {
            Some(path) => Ok(path.clone()),
            None => Ok(executable_dir()?.join(DEFAULT_MODEL_FILE)),
        }
    }
}

fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| ExtractError::Configuration {
        message: format!("cannot locate the executable: {e}"),
    })?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ExtractError::Configuration {
            message: format!("executable has no parent directory: {}", exe.display()),
        })
}

fn default_num_threads() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}
