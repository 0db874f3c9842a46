use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Environment variable naming an alternate configuration file.
pub const CONFIG_ENV: &str = "ALLCLIENTS_CONFIG";

/// Configuration file consulted when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "allclients.toml";

/// Settings the integrating application must supply: where the API lives,
/// which account to act as, and the fixed zone its datetimes are reported in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API endpoint base URL.
    pub endpoint: String,

    /// AllClients account ID.
    pub account_id: String,

    /// AllClients API key.
    pub api_key: String,

    /// IANA zone name for API datetime fields, e.g. `America/Los_Angeles`.
    /// The API itself transmits no zone information.
    pub timezone: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: crate::DEFAULT_ENDPOINT.to_string(),
            account_id: String::new(),
            api_key: String::new(),
            timezone: "America/Los_Angeles".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads configuration from `$ALLCLIENTS_CONFIG`, falling back to
    /// `allclients.toml` in the working directory.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(Path::new(&path))
    }

    /// Loads and validates configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("cannot parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.account_id.is_empty() || self.api_key.is_empty() {
            bail!("account_id and api_key must be set in the config file");
        }
        Ok(())
    }

    /// The configured API zone, parsed from its IANA name.
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("unknown timezone {:?} in config", self.timezone))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_full_config() {
        let file = write_config(
            r#"
            endpoint = "http://www.allclients.com/api/2/"
            account_id = "12345"
            api_key = "secret"
            timezone = "America/Los_Angeles"
            timeout_secs = 10
            "#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.account_id, "12345");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.timezone().unwrap(), chrono_tz::America::Los_Angeles);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let file = write_config(
            r#"
            account_id = "12345"
            api_key = "secret"
            "#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.endpoint, crate::DEFAULT_ENDPOINT);
        assert_eq!(config.timezone, "America/Los_Angeles");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn rejects_missing_credentials() {
        let file = write_config("endpoint = \"http://www.allclients.com/api/2/\"\n");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn rejects_unknown_timezone() {
        let config = Config {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..Config::default()
        };
        assert!(config.timezone().is_err());
    }
}
