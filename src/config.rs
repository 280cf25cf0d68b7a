use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::enums::{OutputFormat, Processor};
use crate::error::Result;

pub const DEFAULT_UPLOAD_ROOT: &str = "permanent_uploads";
pub const DEFAULT_MAX_FILE_BYTES: u64 = 16 * 1024 * 1024 * 1024;

/// Settings built once at startup and handed to the session store and viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one subdirectory per upload session
    pub upload_root: PathBuf,
    /// Largest single file accepted into a session
    pub max_file_bytes: u64,
    pub output_format: OutputFormat,
    pub processor: Processor,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_root: PathBuf::from(DEFAULT_UPLOAD_ROOT),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            output_format: OutputFormat::default(),
            processor: Processor::default(),
        }
    }
}

impl Config {
    pub fn with_upload_root(mut self, upload_root: impl Into<PathBuf>) -> Self {
        self.upload_root = upload_root.into();
        self
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.processor = processor;
        self
    }

    /// Load a JSON config file; missing keys keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
