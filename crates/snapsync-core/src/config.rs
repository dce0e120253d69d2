use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_token: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_media_root")]
    pub media_root: String,
    #[serde(default = "default_download_images")]
    pub download_images: bool,
}

fn default_page_size() -> u32 {
    10
}

fn default_database_path() -> String {
    "snapsync.db".to_string()
}

fn default_media_root() -> String {
    "media".to_string()
}

fn default_download_images() -> bool {
    true
}

/// Load configuration from an optional `Config.toml` plus `SNAPSYNC_*`
/// environment variables. Base URL and token have no defaults; a missing
/// value is a load error, not a runtime panic.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("SNAPSYNC"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_fields() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "api_base_url": "https://api.example.com/v2",
            "api_token": "secret",
        }))
        .unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.database_path, "snapsync.db");
        assert_eq!(config.media_root, "media");
        assert!(config.download_images);
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let result: Result<AppConfig, _> = serde_json::from_value(serde_json::json!({
            "api_base_url": "https://api.example.com/v2",
        }));
        assert!(result.is_err());
    }
}
