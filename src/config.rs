use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Page fetch timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// User agent sent with page fetches
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Extractor chain configuration
    #[serde(default)]
    pub extractors: ExtractorSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            extractors: ExtractorSettings::default(),
        }
    }
}

/// Configuration for the extraction chain and its heuristics
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorSettings {
    /// Order in which extractors are tried
    #[serde(default = "default_extractor_order")]
    pub order: Vec<String>,
    /// A trailing " - suffix" on a title is treated as an author name only
    /// when it is shorter than this many characters
    #[serde(default = "default_author_suffix_max_len")]
    pub author_suffix_max_len: usize,
    /// og:site_name is used as author of last resort only when shorter than
    /// this many characters
    #[serde(default = "default_site_name_max_len")]
    pub site_name_max_len: usize,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            order: default_extractor_order(),
            author_suffix_max_len: default_author_suffix_max_len(),
            site_name_max_len: default_site_name_max_len(),
        }
    }
}

// Default value functions
fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_extractor_order() -> Vec<String> {
    vec!["json_ld".to_string(), "heuristic".to_string()]
}

pub(crate) fn default_author_suffix_max_len() -> usize {
    40
}

pub(crate) fn default_site_name_max_len() -> usize {
    40
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_EXTRACT__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_EXTRACT__EXTRACTORS__SITE_NAME_MAX_LEN
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// See [`AppConfig::load`] for the precedence rules.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: RECIPE_EXTRACT__EXTRACTORS__ORDER
        .add_source(
            Environment::with_prefix("RECIPE_EXTRACT")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("extractors.order")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.timeout, 30);
        assert_eq!(config.extractors.order, vec!["json_ld", "heuristic"]);
        assert_eq!(config.extractors.author_suffix_max_len, 40);
        assert_eq!(config.extractors.site_name_max_len, 40);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
            timeout = 10

            [extractors]
            site_name_max_len = 25
        "#;

        let config: AppConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.timeout, 10);
        assert_eq!(config.extractors.site_name_max_len, 25);
        assert_eq!(config.extractors.author_suffix_max_len, 40);
        assert_eq!(config.extractors.order, vec!["json_ld", "heuristic"]);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_load_config_without_file() {
        // No config.toml in the test working directory, so defaults apply
        let result = load_config();
        assert!(result.is_ok());
    }
}
