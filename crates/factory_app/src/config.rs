use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use factory_engine::{ClientSettings, DEFAULT_BASE_URL};
use factory_logging::LogDestination;
use serde::Deserialize;

pub(crate) const CONFIG_FILENAME: &str = "api_factory.ron";

/// Settings read from `api_factory.ron`. Every field may be omitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) base_url: String,
    pub(crate) poll_interval_ms: u64,
    pub(crate) connect_timeout_secs: u64,
    pub(crate) request_timeout_secs: u64,
    pub(crate) output_dir: PathBuf,
    pub(crate) log_destination: LogDestination,
    pub(crate) log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 1000,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            output_dir: PathBuf::from("output"),
            log_destination: LogDestination::Terminal,
            log_level: "info".to_string(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub(crate) struct Overrides {
    pub(crate) base_url: Option<String>,
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) log_destination: Option<LogDestination>,
    pub(crate) log_level: Option<String>,
}

impl AppConfig {
    /// Loads `explicit` if given (it must exist), otherwise `api_factory.ron`
    /// in `working_dir` when present, otherwise the defaults.
    pub(crate) fn load(explicit: Option<&Path>, working_dir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = working_dir.join(CONFIG_FILENAME);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub(crate) fn parse(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub(crate) fn apply(&mut self, overrides: Overrides) {
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        if let Some(destination) = overrides.log_destination {
            self.log_destination = destination;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
    }

    pub(crate) fn client_settings(&self) -> Result<ClientSettings> {
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        let mut settings = ClientSettings::with_base_url(&self.base_url)?;
        settings.poll_interval = Duration::from_millis(self.poll_interval_ms);
        settings.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        settings.request_timeout = Duration::from_secs(self.request_timeout_secs);
        settings.validate()?;
        Ok(settings)
    }
}
