// ABOUTME: YAML registry listing the feeds to aggregate, in invocation order.
// ABOUTME: Builds the RecordSource list handed to the SourceAggregator.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::feed::JsonFeedSource;
use crate::source::RecordSource;

/// Errors that can occur while loading the source registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("duplicate source name: {0}")]
    DuplicateName(String),
}

/// One configured feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// The full list of feeds, in the order they are fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceRegistry {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl SourceRegistry {
    /// Load a registry from a YAML file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse a registry from YAML text, rejecting duplicate names.
    pub fn from_yaml(text: &str) -> Result<Self, RegistryError> {
        let registry: SourceRegistry = serde_yaml::from_str(text)?;

        let mut seen = std::collections::HashSet::new();
        for source in &registry.sources {
            if !seen.insert(source.name.as_str()) {
                return Err(RegistryError::DuplicateName(source.name.clone()));
            }
        }

        Ok(registry)
    }

    /// Build enabled feeds sharing one HTTP client.
    pub fn build_sources(&self, client: &reqwest::Client) -> Vec<Arc<dyn RecordSource>> {
        self.sources
            .iter()
            .filter(|s| {
                if !s.enabled {
                    tracing::debug!("source {} is disabled", s.name);
                }
                s.enabled
            })
            .map(|s| {
                let feed = JsonFeedSource::new(&s.name, &s.url)
                    .with_platform(s.platform.clone())
                    .with_client(client.clone());
                Arc::new(feed) as Arc<dyn RecordSource>
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "
sources:
  - name: devpost
    platform: Devpost
    url: https://feeds.example/devpost.json
  - name: unstop
    url: https://feeds.example/unstop.json
    enabled: false
  - name: mlh
    platform: MLH
    url: https://feeds.example/mlh.json
";

    #[test]
    fn registry_parses_defaults() {
        let registry = SourceRegistry::from_yaml(SAMPLE).unwrap();

        assert_eq!(registry.sources.len(), 3);
        assert!(registry.sources[0].enabled);
        assert_eq!(registry.sources[0].platform.as_deref(), Some("Devpost"));
        assert!(!registry.sources[1].enabled);
        assert!(registry.sources[1].platform.is_none());
    }

    #[test]
    fn registry_builds_only_enabled_sources_in_order() {
        let registry = SourceRegistry::from_yaml(SAMPLE).unwrap();
        let sources = registry.build_sources(&reqwest::Client::new());

        let names: Vec<_> = sources.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["devpost", "mlh"]);
        assert_eq!(sources[1].platform(), Some("MLH"));
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let yaml = "
sources:
  - name: a
    url: http://x
  - name: a
    url: http://y
";
        let err = SourceRegistry::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate source name: a"));
    }

    #[test]
    fn registry_loads_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sources.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        let registry = SourceRegistry::load(&path).unwrap();
        assert_eq!(registry.sources.len(), 3);

        let missing = SourceRegistry::load(&dir.path().join("absent.yaml"));
        assert!(matches!(missing, Err(RegistryError::Io(_))));
    }

    #[test]
    fn empty_registry_has_no_sources() {
        let registry = SourceRegistry::from_yaml("sources: []").unwrap();
        assert!(registry.build_sources(&reqwest::Client::new()).is_empty());
    }
}
