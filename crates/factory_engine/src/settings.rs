use std::time::Duration;

use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("base url '{0}' must be http or https")]
    UnsupportedScheme(String),
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Root of the generation service; endpoint paths are appended to it.
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ClientSettings {
    /// Default settings pointed at `base_url`.
    pub fn with_base_url(base_url: &str) -> Result<Self, SettingsError> {
        let parsed = Url::parse(base_url).map_err(|source| SettingsError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        let settings = Self {
            base_url: parsed,
            ..Self::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(SettingsError::UnsupportedScheme(self.base_url.to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(SettingsError::ZeroPollInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientSettings, SettingsError, DEFAULT_POLL_INTERVAL};
    use std::time::Duration;

    #[test]
    fn defaults_poll_every_second() {
        let settings = ClientSettings::default();
        assert_eq!(settings.poll_interval, Duration::from_millis(1000));
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(settings.base_url.as_str(), "http://localhost:8000/");
    }

    #[test]
    fn rejects_non_http_base() {
        let err = ClientSettings::with_base_url("ftp://files.example").unwrap_err();
        assert!(matches!(err, SettingsError::UnsupportedScheme(_)));
        assert!(matches!(
            ClientSettings::with_base_url("not a url"),
            Err(SettingsError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn rejects_zero_interval() {
        let settings = ClientSettings {
            poll_interval: Duration::ZERO,
            ..ClientSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::ZeroPollInterval)
        ));
    }
}
