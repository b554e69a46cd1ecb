use crate::compress::CompressionOptions;
use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

/// Upload validation knobs
///
/// Validation strictness varied across revisions of the original (strict
/// MIME-only vs lenient extension fallback); the extension list makes the
/// lenient path explicit instead of baking one choice in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    pub max_batch_size: usize,
    pub max_file_bytes: u64,
    pub allowed_extensions: Vec<String>,
    pub compression: CompressionOptions,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 10,
            max_file_bytes: 15 * 1024 * 1024,
            allowed_extensions: ["jpg", "jpeg", "png", "webp", "heic", "heif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            compression: CompressionOptions::default(),
        }
    }
}

/// Complete client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub upload: UploadConfig,
}

impl ClientConfig {
    pub fn to_toml(&self) -> Result<String, ClientError> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn from_toml(s: &str) -> Result<Self, ClientError> {
        toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Loads the config file, falling back to defaults when it is missing
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        if !path.exists() {
            log::info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn save(&self, path: &Path) -> Result<(), ClientError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_shipped_values() {
        let config = ClientConfig::default();
        assert_eq!(config.upload.max_batch_size, 10);
        assert_eq!(config.upload.max_file_bytes, 15 * 1024 * 1024);
        assert_eq!(config.upload.compression.max_width, 800);
        assert!(config.upload.allowed_extensions.contains(&"heic".to_string()));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ClientConfig::default();
        let raw = config.to_toml().unwrap();
        let parsed = ClientConfig::from_toml(&raw).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ClientConfig::from_toml(
            "[api]\nbase_url = \"https://wardrobe.example\"\n\n[upload]\nmax_batch_size = 5\n",
        )
        .unwrap();
        assert_eq!(parsed.api.base_url, "https://wardrobe.example");
        assert_eq!(parsed.api.timeout_secs, 60);
        assert_eq!(parsed.upload.max_batch_size, 5);
        assert_eq!(parsed.upload.compression.quality, 0.6);
    }
}
