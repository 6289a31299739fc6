use std::path::Path;

use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum file size for uploads (in bytes). Zero disables the check.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,

    /// Bucket name files are stored under.
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

fn default_max_upload_size() -> usize {
    100 * 1024 * 1024 // 100 MB
}

fn default_bucket() -> String {
    "chat-files".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_upload_size: default_max_upload_size(),
            bucket: default_bucket(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }
}
