use anyhow::{Context, Result};
use huename_colorapi::{ClassifierMode, ColorApiConfig};
use huename_engine::EngineConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{LabelCacheConfig, DEFAULT_CACHE_FILE, DEFAULT_CACHE_TTL};

pub const CACHE_FILE_ENV: &str = "HUENAME_CACHE_FILE";

/// Optional TOML file passed with `--config`.
///
/// ```toml
/// [engine]
/// stride = 12
/// max_in_flight = 4
///
/// [api]
/// base_url = "https://www.thecolorapi.com"
/// timeout_secs = 10
/// mode = "http"
///
/// [cache]
/// file = ".huename/labels.json"
/// ttl_secs = 604800
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub engine: EngineSection,
    pub api: ApiSection,
    pub cache: CacheSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub stride: Option<usize>,
    pub max_in_flight: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    pub file: Option<PathBuf>,
    pub ttl_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

/// Values given on the command line; they beat everything else.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub stride: Option<usize>,
    pub max_in_flight: Option<usize>,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub cache_file: Option<PathBuf>,
    pub no_cache: bool,
}

/// Fully layered settings for one palette run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub engine: EngineConfig,
    pub api: ColorApiConfig,
    pub mode: ClassifierMode,
    pub cache: Option<LabelCacheConfig>,
}

impl Settings {
    /// Defaults, then the config file, then the environment, then flags.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        flags: &Overrides,
    ) -> Result<Self> {
        let mut engine = EngineConfig::default();
        if let Some(stride) = file.engine.stride {
            engine.stride = stride;
        }
        if let Some(max_in_flight) = file.engine.max_in_flight {
            engine.max_in_flight = max_in_flight;
        }
        let mut engine = engine.with_overrides_from(&env);
        if let Some(stride) = flags.stride {
            engine.stride = stride;
        }
        if let Some(max_in_flight) = flags.max_in_flight {
            engine.max_in_flight = max_in_flight;
        }
        engine.validate().context("Invalid engine settings")?;

        let mut api = ColorApiConfig::default();
        if let Some(base_url) = file.api.base_url {
            api.base_url = base_url;
        }
        if let Some(secs) = file.api.timeout_secs {
            api.timeout = Duration::from_secs(secs);
        }
        let mut api = api.with_overrides_from(&env);
        if let Some(base_url) = &flags.api_base {
            api.base_url.clone_from(base_url);
        }
        if let Some(secs) = flags.timeout_secs {
            anyhow::ensure!(secs > 0, "--timeout-secs must be > 0");
            api.timeout = Duration::from_secs(secs);
        }

        let mode = match ClassifierMode::from_lookup(&env)? {
            Some(mode) => mode,
            None => match file.api.mode.as_deref() {
                Some(raw) => raw.parse().context("Invalid [api] mode")?,
                None => ClassifierMode::default(),
            },
        };

        let cache = if flags.no_cache {
            None
        } else {
            let path = flags
                .cache_file
                .clone()
                .or_else(|| {
                    env(CACHE_FILE_ENV)
                        .filter(|v| !v.trim().is_empty())
                        .map(PathBuf::from)
                })
                .or(file.cache.file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE));
            let ttl = file
                .cache
                .ttl_secs
                .map_or(DEFAULT_CACHE_TTL, Duration::from_secs);
            Some(LabelCacheConfig { path, ttl })
        };

        Ok(Self {
            engine,
            api,
            mode,
            cache,
        })
    }

    /// Identity the persisted labels are tied to: the API base for HTTP
    /// naming, a fixed marker for the stub.
    pub fn label_source(&self) -> &str {
        match self.mode {
            ClassifierMode::Http => &self.api.base_url,
            ClassifierMode::Stub => "stub",
        }
    }
}
