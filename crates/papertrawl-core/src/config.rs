use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root configuration, loaded from `~/.config/papertrawl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search queries to run when none are given on the command line.
    pub queries: Vec<String>,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub judge: JudgeConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory that accepted PDFs are written to.
    pub download_dir: String,
    /// Directory that per-query rejection logs are written to.
    pub rejection_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pause after each candidate that touched the network, in seconds.
    pub candidate_pause_secs: u64,
    /// Pause between source backends, in seconds.
    pub source_pause_secs: u64,
    /// Pause between queries, in seconds.
    pub query_pause_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Model name passed to the generate endpoint.
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub arxiv_max_results: usize,
    pub pmc_max_results: usize,
    pub plos_max_results: usize,
    /// CORE requires a registered API key; the backend stays inactive without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_api_key: Option<String>,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            queries: Vec::new(),
            storage: StorageConfig::default(),
            pipeline: PipelineConfig::default(),
            judge: JudgeConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: "Research Papers".to_string(),
            rejection_dir: "Rejection Logs".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            candidate_pause_secs: 2,
            source_pause_secs: 5,
            query_pause_secs: 5,
        }
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen3:8b".to_string(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            arxiv_max_results: 1000,
            pmc_max_results: 50,
            plos_max_results: 30,
            core_api_key: None,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl Config {
    /// Standard config file path: `~/.config/papertrawl/config.toml`
    pub fn config_path() -> PathBuf {
        // Allow override via env var
        if let Ok(path) = std::env::var("PAPERTRAWL_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("papertrawl")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    // ─── Derived paths ─────────────────────────────────────

    /// Directory accepted PDFs land in.
    pub fn download_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.download_dir)
    }

    /// Directory per-query rejection logs land in.
    pub fn rejection_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.rejection_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert_eq!(cfg.storage.download_dir, "Research Papers");
        assert_eq!(cfg.judge.model, "qwen3:8b");
        assert_eq!(cfg.sources.arxiv_max_results, 1000);
        assert!(cfg.sources.core_api_key.is_none());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.queries = vec!["sparse attention".to_string()];
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.queries, cfg.queries);
        assert_eq!(loaded.judge.base_url, cfg.judge.base_url);
        assert_eq!(loaded.pipeline.candidate_pause_secs, cfg.pipeline.candidate_pause_secs);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg = Config::load_from(Path::new("/tmp/nonexistent_papertrawl_config.toml")).unwrap();
        assert_eq!(cfg.storage.rejection_dir, "Rejection Logs");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[judge]\nmodel = \"llama3:70b\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.judge.model, "llama3:70b");
        assert_eq!(cfg.judge.base_url, "http://localhost:11434");
        assert_eq!(cfg.sources.plos_max_results, 30);
    }
}
