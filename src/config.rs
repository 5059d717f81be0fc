use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::listing::{SortKey, SortOrder};

/// Top-level configuration, loadable from a JSON file. Every section has
/// usable defaults so a missing or partial file still yields a working
/// client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub search: SearchConfig,
    pub listing: ListingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the drive API the transport layer talks to.
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/api".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Multiplier applied to file-name match scores.
    pub name_weight: i64,
    /// Multiplier applied to tag match scores. Kept below `name_weight`.
    pub tag_weight: i64,
    /// Queries shorter than this produce no fuzzy matches.
    pub min_query_len: usize,
    /// Upper bound on the edit distance tolerated for misspelled queries.
    pub typo_budget: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            name_weight: 8,
            tag_weight: 2,
            min_query_len: 2,
            typo_budget: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Defaults when the file is absent; parse errors still surface.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.search.name_weight, 8);
        assert_eq!(config.search.tag_weight, 2);
        assert_eq!(config.listing.sort_key, SortKey::Name);
        assert_eq!(config.listing.sort_order, SortOrder::Asc);
        assert!(config.search.name_weight > config.search.tag_weight);
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.api.base_url = "https://drive.example.com/api".to_string();
        config.listing.sort_key = SortKey::Size;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.api.base_url, "https://drive.example.com/api");
        assert_eq!(loaded.listing.sort_key, SortKey::Size);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"search": {"typo_budget": 1}}"#).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.search.typo_budget, 1);
        assert_eq!(loaded.search.name_weight, 8);
        assert_eq!(loaded.api.timeout_ms, 10_000);
    }

    #[test]
    fn test_load_or_default_for_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(dir.path().join("absent.json")).unwrap();
        assert_eq!(config.search.min_query_len, 2);
    }
}
