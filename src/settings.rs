use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail, ensure};
use config::{Config, ConfigError, File};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use codesift::app_dirs;
use codesift::facets::FallbackOptions;
use codesift::fetch::{Endpoint, FetchSettings};
use codesift::{FilterDimension, OrchestratorConfig};

use crate::cli::CliArgs;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_SEARCH_PATH: &str = "/api/search";
const DEFAULT_FACETS_PATH: &str = "/api/facets";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_GRACE_DELAY_MS: u64 = 1_000;
const DEFAULT_SIZE_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    backend: BackendSection,
    search: SearchSection,
    facets: FacetsSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct BackendSection {
    base_url: Option<String>,
    search_path: Option<String>,
    facets_path: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SearchSection {
    page_size: Option<u32>,
    grace_delay_ms: Option<u64>,
    size_debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FacetsSection {
    fallback: BTreeMap<String, Vec<String>>,
}

pub struct ResolvedConfig {
    pub endpoint: Endpoint,
    pub timeout: Duration,
    pub page_size: u32,
    pub grace_delay: Duration,
    pub size_debounce: Duration,
    pub fallback: FallbackOptions,
}

impl ResolvedConfig {
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            fetch: FetchSettings {
                page_size: self.page_size,
                timeout: self.timeout,
                grace_delay: self.grace_delay,
            },
            size_debounce: self.size_debounce,
            fallback: self.fallback.clone(),
        }
    }

    pub fn print_summary(&self) {
        println!("Effective configuration:");
        println!("  Backend: {}", self.endpoint.base_url);
        println!("  Search path: {}", self.endpoint.search_path);
        println!("  Facets path: {}", self.endpoint.facets_path);
        println!("  Request timeout: {}s", self.timeout.as_secs());
        println!("  Page size: {}", self.page_size);
        println!("  Spinner grace delay: {}ms", self.grace_delay.as_millis());
        println!("  Size debounce: {}ms", self.size_debounce.as_millis());
        if self.fallback.is_empty() {
            println!("  Fallback options: (none)");
        }
        for (dimension, values) in &self.fallback {
            println!("  Fallback {dimension}: {}", values.join(", "));
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<ResolvedConfig> {
    let builder = build_config(cli)?;
    let mut raw: RawConfig = builder
        .try_deserialize()
        .map_err(|err| anyhow!("failed to deserialize configuration: {err}"))?;
    raw.apply_cli_overrides(cli);
    raw.resolve()
}

fn build_config(cli: &CliArgs) -> Result<Config> {
    let mut builder = Config::builder();

    if !cli.no_config {
        for path in default_config_files() {
            builder = builder.add_source(File::from(path).required(false));
        }
    }

    for path in &cli.config {
        builder = builder.add_source(File::from(path.clone()).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("codesift")
            .separator("__")
            .try_parsing(true),
    );

    builder.build().map_err(|err| match err {
        ConfigError::Frozen => anyhow!("configuration builder is frozen"),
        other => other.into(),
    })
}

fn default_config_files() -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Ok(dir) = app_dirs::get_config_dir() {
        files.push(dir.join("config.toml"));
    }

    if let Ok(current_dir) = env::current_dir() {
        files.push(current_dir.join(".codesift.toml"));
        files.push(current_dir.join("codesift.toml"));
    }

    files
}

impl RawConfig {
    fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        if let Some(url) = cli.base_url.clone() {
            self.backend.base_url = Some(url);
        }
        if let Some(value) = cli.timeout_secs {
            self.backend.timeout_secs = Some(value);
        }
        if let Some(value) = cli.page_size {
            self.search.page_size = Some(value);
        }
    }

    fn resolve(self) -> Result<ResolvedConfig> {
        let raw_url = self
            .backend
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&raw_url)?;

        let timeout_secs = self.backend.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        ensure!(timeout_secs > 0, "backend.timeout_secs must be greater than zero");
        let page_size = self.search.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        ensure!(page_size > 0, "search.page_size must be greater than zero");

        let endpoint = Endpoint {
            base_url,
            search_path: clean_path(self.backend.search_path, DEFAULT_SEARCH_PATH),
            facets_path: clean_path(self.backend.facets_path, DEFAULT_FACETS_PATH),
        };

        let mut fallback = FallbackOptions::new();
        for (key, values) in self.facets.fallback {
            let dimension: FilterDimension = key
                .parse()
                .with_context(|| format!("invalid [facets.fallback] entry '{key}'"))?;
            let values = sanitize_values(values);
            if !values.is_empty() {
                fallback.insert(dimension, values);
            }
        }

        let resolved = ResolvedConfig {
            endpoint,
            timeout: Duration::from_secs(timeout_secs),
            page_size,
            grace_delay: Duration::from_millis(
                self.search.grace_delay_ms.unwrap_or(DEFAULT_GRACE_DELAY_MS),
            ),
            size_debounce: Duration::from_millis(
                self.search
                    .size_debounce_ms
                    .unwrap_or(DEFAULT_SIZE_DEBOUNCE_MS),
            ),
            fallback,
        };
        debug!(backend = %resolved.endpoint.base_url, "configuration resolved");
        Ok(resolved)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid backend.base_url '{raw}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("backend.base_url must use http or https, not '{other}'"),
    }
}

fn clean_path(value: Option<String>, default: &str) -> String {
    match value.map(|path| path.trim().to_string()) {
        Some(path) if !path.is_empty() => path,
        _ => default.to_string(),
    }
}

fn sanitize_values(values: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !cleaned.iter().any(|seen| seen == value) {
            cleaned.push(value.to_string());
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn raw_from_toml(contents: &str) -> RawConfig {
        let dir = tempdir().unwrap();
        let path = dir.path().join("codesift.toml");
        fs::write(&path, contents).unwrap();
        Config::builder()
            .add_source(File::from(path))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_apply_without_files() {
        let resolved = RawConfig::default().resolve().unwrap();
        assert_eq!(resolved.endpoint.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(resolved.endpoint.search_path, "/api/search");
        assert_eq!(resolved.timeout, Duration::from_secs(30));
        assert_eq!(resolved.page_size, 20);
        assert_eq!(resolved.size_debounce, Duration::from_millis(300));
        assert!(resolved.fallback.is_empty());
    }

    #[test]
    fn file_sections_are_read() {
        let raw = raw_from_toml(
            r#"
            [backend]
            base_url = "https://search.example.org"
            timeout_secs = 10

            [search]
            page_size = 50

            [facets.fallback]
            extension = ["rs", " py ", "rs", ""]
            "#,
        );
        let resolved = raw.resolve().unwrap();
        assert_eq!(resolved.endpoint.base_url.host_str(), Some("search.example.org"));
        assert_eq!(resolved.timeout, Duration::from_secs(10));
        assert_eq!(resolved.page_size, 50);
        assert_eq!(
            resolved.fallback.get(&FilterDimension::Extension),
            Some(&vec!["rs".to_string(), "py".to_string()])
        );
    }

    #[test]
    fn unknown_fallback_dimension_is_rejected() {
        let raw = raw_from_toml("[facets.fallback]\ncolour = [\"red\"]\n");
        let err = raw.resolve().err().unwrap();
        assert!(format!("{err:#}").contains("colour"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut raw = RawConfig::default();
        raw.backend.base_url = Some("ftp://example.org".into());
        assert!(raw.resolve().is_err());

        let mut raw = RawConfig::default();
        raw.search.page_size = Some(0);
        assert!(raw.resolve().is_err());

        let mut raw = RawConfig::default();
        raw.backend.timeout_secs = Some(0);
        assert!(raw.resolve().is_err());
    }

    #[test]
    fn default_files_include_current_directory_variants() {
        let files = default_config_files();
        assert!(files.iter().any(|path| path.ends_with(".codesift.toml")));
        assert!(files.iter().any(|path| path.ends_with("codesift.toml")));
    }
}
