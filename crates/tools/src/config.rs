/// Configuration management for the dropper CLI
use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "DROPPER_";

/// Environment types for configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
    Test,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
            Environment::Test => write!(f, "test"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            _ => Err(anyhow::anyhow!("Invalid environment: {}", s)),
        }
    }
}

/// A chain the CLI can talk to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// RPC endpoint URL
    pub rpc_url: String,

    /// Expected chain id; checked against the node when set
    pub chain_id: Option<u64>,

    /// Confirmations to await for each transaction
    pub confirmations: usize,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,

    /// Known deployments, by contract name (`Dropper`, `MockErc20`, ...)
    pub contracts: HashMap<String, String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: None,
            confirmations: 1,
            request_timeout_secs: 30,
            poll_interval_ms: 1000,
            contracts: HashMap::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropperConfig {
    /// Environment (development, staging, production, test)
    pub environment: Environment,

    /// Directory holding compiled contract artifacts (`<Contract>.json`)
    pub build_dir: PathBuf,

    /// Networks by name
    pub networks: HashMap<String, NetworkConfig>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for DropperConfig {
    fn default() -> Self {
        let mut networks = HashMap::new();
        networks.insert(
            "development".to_string(),
            NetworkConfig {
                chain_id: Some(31337),
                ..Default::default()
            },
        );

        Self {
            environment: Environment::default(),
            build_dir: PathBuf::from("build/contracts"),
            networks,
            logging: LoggingConfig::default(),
        }
    }
}

impl DropperConfig {
    /// Look up a network by name
    pub fn network(&self, name: &str) -> Result<&NetworkConfig> {
        self.networks.get(name).ok_or_else(|| {
            let mut known: Vec<&str> = self.networks.keys().map(String::as_str).collect();
            known.sort_unstable();
            anyhow::anyhow!("Unknown network '{}'. Configured networks: {}", name, known.join(", "))
        })
    }

    /// Address of `contract` recorded for `network`, if any
    pub fn contract_address(&self, network: &str, contract: &str) -> Option<&str> {
        self.networks
            .get(network)
            .and_then(|network| network.contracts.get(contract))
            .map(String::as_str)
    }
}

/// Configuration validation error
#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error in field '{}': {}", self.field, self.message)
    }
}

/// Configuration validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Configuration validator trait
pub trait ConfigValidator {
    /// Validate the configuration
    fn validate(&self) -> ValidationResult;
}

fn collect(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map_or(false, |digits| digits.len() == 40 && hex::decode(digits).is_ok())
}

impl ConfigValidator for DropperConfig {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        if self.networks.is_empty() {
            errors.push(ValidationError {
                field: "networks".to_string(),
                message: "At least one network configuration is required".to_string(),
            });
        }

        for (name, network) in &self.networks {
            if let Err(mut network_errors) = network.validate() {
                for error in &mut network_errors {
                    error.field = format!("networks.{}.{}", name, error.field);
                }
                errors.append(&mut network_errors);
            }
        }

        if let Err(mut log_errors) = self.logging.validate() {
            errors.append(&mut log_errors);
        }

        if self.build_dir.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "build_dir".to_string(),
                message: "Build directory cannot be empty".to_string(),
            });
        }

        collect(errors)
    }
}

impl ConfigValidator for NetworkConfig {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        if self.rpc_url.is_empty() {
            errors.push(ValidationError {
                field: "rpc_url".to_string(),
                message: "RPC URL cannot be empty".to_string(),
            });
        } else if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            errors.push(ValidationError {
                field: "rpc_url".to_string(),
                message: "RPC URL must start with http:// or https://".to_string(),
            });
        }

        if self.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "request_timeout_secs".to_string(),
                message: "Request timeout must be greater than 0".to_string(),
            });
        }

        if self.poll_interval_ms == 0 {
            errors.push(ValidationError {
                field: "poll_interval_ms".to_string(),
                message: "Poll interval must be greater than 0".to_string(),
            });
        }

        for (contract, address) in &self.contracts {
            if !is_address(address) {
                errors.push(ValidationError {
                    field: format!("contracts.{}", contract),
                    message: format!("'{}' is not a 0x-prefixed 20-byte address", address),
                });
            }
        }

        collect(errors)
    }
}

impl ConfigValidator for LoggingConfig {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".to_string(),
                message: format!("Invalid log level '{}'. Valid levels: {}", self.level, valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty", "compact"];
        if !valid_formats.contains(&self.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".to_string(),
                message: format!("Invalid log format '{}'. Valid formats: {}", self.format, valid_formats.join(", ")),
            });
        }

        collect(errors)
    }
}

/// Configuration manager for loading, validating, and managing configurations
pub struct ConfigManager {
    config: DropperConfig,
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Create a new configuration manager with the default configuration
    pub fn new() -> Self {
        Self {
            config: DropperConfig::default(),
            config_path: PathBuf::from("dropper.toml"),
        }
    }

    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML configuration file: {}", path.display()))?,
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON configuration file: {}", path.display()))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML configuration file: {}", path.display()))?,
            _ => return Err(anyhow::anyhow!("Unsupported configuration file format. Supported formats: .toml, .json, .yaml, .yml")),
        };

        let mut manager = Self {
            config,
            config_path: path.to_path_buf(),
        };
        manager.apply_environment_overrides()?;
        Ok(manager)
    }

    /// Load `dropper.<environment>.toml` next to `base_path`, falling back to
    /// `base_path` itself and then to the defaults
    pub fn load_for_environment<P: AsRef<Path>>(base_path: P, environment: Environment) -> Result<Self> {
        let base_path = base_path.as_ref();

        let env_file = base_path.with_file_name(format!("dropper.{}.toml", environment));
        if env_file.exists() {
            return Self::load_from_file(env_file);
        }
        if base_path.exists() {
            return Self::load_from_file(base_path);
        }

        let config = DropperConfig {
            environment,
            ..Default::default()
        };
        let mut manager = Self {
            config,
            config_path: base_path.to_path_buf(),
        };
        manager.apply_environment_overrides()?;
        Ok(manager)
    }

    /// Apply `DROPPER_*` overrides from the process environment
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        self.apply_overrides(utf8_vars(env::vars_os()))
    }

    /// Apply `DROPPER_*` overrides from `vars`
    pub fn apply_overrides<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            match name {
                "BUILD_DIR" => self.config.build_dir = PathBuf::from(value),
                "LOG_LEVEL" => self.config.logging.level = value,
                "LOG_FORMAT" => self.config.logging.format = value,
                "ENVIRONMENT" => {
                    self.config.environment = value
                        .parse()
                        .with_context(|| format!("Invalid {}ENVIRONMENT value", ENV_PREFIX))?;
                }
                _ => {
                    if let Some(network) = name.strip_prefix("RPC_URL_") {
                        self.override_rpc_url(network, value);
                    }
                }
            }
        }
        Ok(())
    }

    /// `DROPPER_RPC_URL_MY_NET` applies to network `my-net` or `my_net`,
    /// creating it when no such network exists
    fn override_rpc_url(&mut self, env_name: &str, rpc_url: String) {
        let matches = |network: &str| network.to_uppercase().replace('-', "_") == env_name;
        match self.config.networks.iter_mut().find(|(name, _)| matches(name)) {
            Some((_, network)) => network.rpc_url = rpc_url,
            None => {
                self.config.networks.insert(
                    env_name.to_lowercase(),
                    NetworkConfig {
                        rpc_url,
                        ..Default::default()
                    },
                );
            }
        }
    }

    /// Validate the current configuration
    pub fn validate(&self) -> ValidationResult {
        self.config.validate()
    }

    /// Settings that are valid but likely mistakes
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut names: Vec<&String> = self.config.networks.keys().collect();
        names.sort();

        for name in names {
            let network = &self.config.networks[name];
            if network.chain_id.is_none() {
                warnings.push(format!(
                    "networks.{}: chain_id is not set; transactions are signed for whatever chain the node reports",
                    name
                ));
            }
            if self.config.environment == Environment::Production && network.confirmations < 2 {
                warnings.push(format!(
                    "networks.{}: {} confirmation(s) in production",
                    name, network.confirmations
                ));
            }
        }
        warnings
    }

    /// Get the configuration
    pub fn config(&self) -> &DropperConfig {
        &self.config
    }

    /// Get a mutable reference to the configuration
    pub fn config_mut(&mut self) -> &mut DropperConfig {
        &mut self.config
    }

    /// Path the configuration was loaded from
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Save the current configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::to_string_pretty(&self.config)
                .with_context(|| "Failed to serialize configuration to TOML")?,
            Some("json") => serde_json::to_string_pretty(&self.config)
                .with_context(|| "Failed to serialize configuration to JSON")?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(&self.config)
                .with_context(|| "Failed to serialize configuration to YAML")?,
            _ => return Err(anyhow::anyhow!("Unsupported configuration file format. Supported formats: .toml, .json, .yaml, .yml")),
        };

        fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;
        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P, environment: Environment) -> Result<()> {
        let mut config = DropperConfig {
            environment: environment.clone(),
            ..Default::default()
        };

        match environment {
            Environment::Development => {
                config.logging.level = "debug".to_string();
            }
            Environment::Test => {
                config.logging.level = "warn".to_string();
            }
            Environment::Staging | Environment::Production => {
                config.logging.level = "info".to_string();
                config.logging.format = "json".to_string();
                for network in config.networks.values_mut() {
                    network.confirmations = 3;
                }
            }
        }

        let manager = Self {
            config,
            config_path: path.as_ref().to_path_buf(),
        };
        manager.save_to_file(path)
    }
}

/// Keep only variables whose name and value are valid UTF-8
fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DropperConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network("development").unwrap().chain_id, Some(31337));
        assert!(config.network("mainnet").is_err());
    }

    #[test]
    fn test_network_config_validation() {
        let config = NetworkConfig {
            rpc_url: "localhost:8545".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = NetworkConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = NetworkConfig::default();
        config.contracts.insert("Dropper".to_string(), "0x1234".to_string());
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].field, "contracts.Dropper");

        let mut config = NetworkConfig::default();
        config
            .contracts
            .insert("Dropper".to_string(), format!("0x{}", "ab".repeat(20)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_config_validation() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = LoggingConfig {
            format: "xml".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_network_errors_are_prefixed() {
        let mut config = DropperConfig::default();
        config.networks.insert(
            "broken".to_string(),
            NetworkConfig {
                rpc_url: String::new(),
                ..Default::default()
            },
        );
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "networks.broken.rpc_url");
    }

    #[test]
    fn test_environment_overrides() {
        let mut manager = ConfigManager::new();
        manager
            .apply_overrides(vars(&[
                ("DROPPER_BUILD_DIR", "/tmp/build"),
                ("DROPPER_LOG_LEVEL", "debug"),
                ("DROPPER_LOG_FORMAT", "json"),
                ("DROPPER_ENVIRONMENT", "prod"),
                ("DROPPER_RPC_URL_DEVELOPMENT", "http://127.0.0.1:9545"),
                ("DROPPER_RPC_URL_POLYGON_MUMBAI", "https://rpc.example.com"),
                ("UNRELATED", "ignored"),
            ]))
            .unwrap();

        let config = manager.config();
        assert_eq!(config.build_dir, PathBuf::from("/tmp/build"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.network("development").unwrap().rpc_url, "http://127.0.0.1:9545");
        assert_eq!(config.network("polygon_mumbai").unwrap().rpc_url, "https://rpc.example.com");
    }

    #[test]
    fn test_rpc_override_matches_dashed_network_names() {
        let mut manager = ConfigManager::new();
        manager
            .config_mut()
            .networks
            .insert("polygon-mumbai".to_string(), NetworkConfig::default());
        manager
            .apply_overrides(vars(&[("DROPPER_RPC_URL_POLYGON_MUMBAI", "https://rpc.example.com")]))
            .unwrap();

        assert_eq!(manager.config().networks.len(), 2);
        assert_eq!(
            manager.config().network("polygon-mumbai").unwrap().rpc_url,
            "https://rpc.example.com"
        );
    }

    #[test]
    fn test_invalid_environment_override() {
        let mut manager = ConfigManager::new();
        let result = manager.apply_overrides(vars(&[("DROPPER_ENVIRONMENT", "moon")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let mut manager = ConfigManager::new();
        manager
            .config_mut()
            .networks
            .get_mut("development")
            .unwrap()
            .contracts
            .insert("Dropper".to_string(), format!("0x{}", "11".repeat(20)));

        let temp_file = NamedTempFile::new().unwrap();
        for extension in ["toml", "json", "yaml"] {
            let path = temp_file.path().with_extension(extension);
            manager.save_to_file(&path).unwrap();

            let loaded = ConfigManager::load_from_file(&path).unwrap();
            assert_eq!(
                loaded.config().contract_address("development", "Dropper"),
                manager.config().contract_address("development", "Dropper")
            );
            assert_eq!(loaded.config_path(), path.as_path());
        }

        let unsupported = temp_file.path().with_extension("ini");
        assert!(manager.save_to_file(&unsupported).is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dropper.toml");
        fs::write(
            &path,
            r#"
build_dir = "artifacts"

[networks.mumbai]
rpc_url = "https://rpc-mumbai.example.com"
chain_id = 80001
"#,
        )
        .unwrap();

        let manager = ConfigManager::load_from_file(&path).unwrap();
        let network = manager.config().network("mumbai").unwrap();
        assert_eq!(network.chain_id, Some(80001));
        assert_eq!(network.confirmations, 1);
        assert_eq!(manager.config().logging, LoggingConfig::default());
    }

    #[test]
    fn test_environment_specific_configs() {
        let temp_dir = tempdir().unwrap();
        let base_path = temp_dir.path().join("dropper.toml");

        // No files yet: defaults with the requested environment
        let manager = ConfigManager::load_for_environment(&base_path, Environment::Test).unwrap();
        assert_eq!(manager.config().environment, Environment::Test);

        let prod_path = temp_dir.path().join("dropper.production.toml");
        ConfigManager::generate_default_config(&prod_path, Environment::Production).unwrap();

        let prod = ConfigManager::load_for_environment(&base_path, Environment::Production).unwrap();
        assert_eq!(prod.config().environment, Environment::Production);
        assert_eq!(prod.config().logging.format, "json");
        assert_eq!(prod.config().network("development").unwrap().confirmations, 3);
        assert!(prod.warnings().is_empty());
    }

    #[test]
    fn test_warnings_for_unpinned_chain() {
        let mut manager = ConfigManager::new();
        manager
            .config_mut()
            .networks
            .insert("local".to_string(), NetworkConfig::default());
        let warnings = manager.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("networks.local"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_environment_is_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let raw = vec![
            (OsString::from("DROPPER_LOG_LEVEL"), OsString::from("debug")),
            (OsString::from("DROPPER_BUILD_DIR"), OsString::from_vec(vec![0x62, 0xff])),
            (OsString::from_vec(vec![0xfe, 0x41]), OsString::from("ignored")),
        ];

        let mut manager = ConfigManager::new();
        manager.apply_overrides(utf8_vars(raw)).unwrap();
        assert_eq!(manager.config().logging.level, "debug");
        assert_eq!(manager.config().build_dir, DropperConfig::default().build_dir);
    }
}
