use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Default location of the TOML config, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

/// Prefix for environment overrides, e.g. `BITO_QA_SUITE__PAIR=eth_twd`.
pub const ENV_PREFIX: &str = "BITO_QA_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from the defaults, `config/Config.toml` and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed or a value has the wrong type.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration with a specific TOML file layered over the defaults.
    ///
    /// A missing file is not an error; the defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed or a value has the wrong type.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let config: AppConfig = Self::figment(path.as_ref()).extract()?;
        tracing::debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn load(path: &str) -> figment::error::Result<AppConfig> {
        ConfigLoader::load_from(path).map_err(|e| figment::Error::from(e.to_string()))
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        Jail::expect_with(|_jail| {
            let config = load("config/Config.toml")?;
            assert_eq!(config.exchange.api_url, "https://api.bitopro.com/v3");
            assert_eq!(config.suite.pair, "btc_twd");
            Ok(())
        });
    }

    #[test]
    fn test_toml_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [exchange]
                locale = "en-US"

                [notify]
                platform = "Staging"
                slack_webhook_url = "https://hooks.slack.test/abc"

                [notify.sheets]
                spreadsheet_id = "sheet-123"
                worksheet_id = 42
                "#,
            )?;

            let config = load("Config.toml")?;
            assert_eq!(config.exchange.locale, "en-US");
            assert_eq!(config.exchange.timeout_secs, 30);
            assert_eq!(config.notify.platform, "Staging");
            let sheets = config.notify.sheets.expect("sheets section");
            assert_eq!(sheets.spreadsheet_id, "sheet-123");
            assert_eq!(sheets.worksheet_id, 42);
            assert_eq!(sheets.api_url, "https://sheets.googleapis.com/v4");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [suite]
                pair = "eth_twd"
                "#,
            )?;
            jail.set_env("BITO_QA_SUITE__PAIR", "usdt_twd");
            jail.set_env("BITO_QA_EXCHANGE__TIMEOUT_SECS", "5");

            let config = load("Config.toml")?;
            assert_eq!(config.suite.pair, "usdt_twd");
            assert_eq!(config.exchange.timeout_secs, 5);
            Ok(())
        });
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file("Config.toml", "[exchange\nlocale = ")?;
            assert!(ConfigLoader::load_from("Config.toml").is_err());
            Ok(())
        });
    }
}
