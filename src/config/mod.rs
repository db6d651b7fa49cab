//! Configuration for wallet authentication.
//!
//! Settings are resolved with priority: env var > TOML file > default.
//! `.env` files are loaded through dotenvy before env vars are read, and
//! every variable carries the `SUPERPOOL_AUTH_` prefix.

pub(crate) mod helpers;

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::config::helpers::{optional_env, parse_bool_env, parse_optional_env};
use crate::error::ConfigError;
use crate::observability::ObservabilityConfig;

pub const DEFAULT_PERSONAL_SIGN_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_TYPED_DATA_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_SAFE_SIGN_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_TYPED_DATA_DOMAIN_NAME: &str = "SuperPool Authentication";
pub const DEFAULT_TYPED_DATA_DOMAIN_VERSION: &str = "1";
pub const DEFAULT_CHAIN_ID: u64 = 1;
pub const DEFAULT_IDENTITY_PROVIDER: &str = "Firebase";

/// Main configuration for the authentication core.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthConfig {
    pub signing: SigningConfig,
    pub cleanup: CleanupConfig,
    pub feedback: FeedbackConfig,
    pub observability: ObservabilityConfig,
}

/// Deadlines and typed-data domain used by the signing strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningConfig {
    pub personal_sign_timeout: Duration,
    pub typed_data_timeout: Duration,
    pub safe_sign_timeout: Duration,
    pub domain_name: String,
    pub domain_version: String,
    /// Used when the request carries no chain id.
    pub default_chain_id: u64,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            personal_sign_timeout: Duration::from_millis(DEFAULT_PERSONAL_SIGN_TIMEOUT_MS),
            typed_data_timeout: Duration::from_millis(DEFAULT_TYPED_DATA_TIMEOUT_MS),
            safe_sign_timeout: Duration::from_millis(DEFAULT_SAFE_SIGN_TIMEOUT_MS),
            domain_name: DEFAULT_TYPED_DATA_DOMAIN_NAME.to_string(),
            domain_version: DEFAULT_TYPED_DATA_DOMAIN_VERSION.to_string(),
            default_chain_id: DEFAULT_CHAIN_ID,
        }
    }
}

/// Identity-provider sign-out settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupConfig {
    pub identity_provider: String,
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            identity_provider: DEFAULT_IDENTITY_PROVIDER.to_string(),
            max_attempts: 3,
            base_delay: Duration::from_millis(1_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackConfig {
    /// How long the renderer should keep an error visible.
    pub error_visibility: Duration,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            error_visibility: Duration::from_millis(4_000),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing: SigningConfig::default(),
            cleanup: CleanupConfig::default(),
            feedback: FeedbackConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// On-disk overlay. Every field is optional; missing fields keep defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    personal_sign_timeout_ms: Option<u64>,
    typed_data_timeout_ms: Option<u64>,
    safe_sign_timeout_ms: Option<u64>,
    typed_data_domain_name: Option<String>,
    typed_data_domain_version: Option<String>,
    default_chain_id: Option<u64>,
    identity_provider: Option<String>,
    cleanup_max_attempts: Option<u32>,
    cleanup_base_delay_ms: Option<u64>,
    error_visibility_ms: Option<u64>,
    log_filter: Option<String>,
    log_json: Option<bool>,
}

impl AuthConfig {
    /// Load `.env`, then resolve from env vars over defaults.
    pub fn from_env() -> crate::Result<Self> {
        let _ = dotenvy::dotenv();
        Ok(Self::resolve(FileConfig::default())?)
    }

    /// Resolve from a TOML file, with env vars taking priority.
    pub fn from_toml_path(path: &Path) -> crate::Result<Self> {
        let _ = dotenvy::dotenv();
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let file = parse_file_config(&raw)?;
        tracing::debug!("Loaded auth config from {}", path.display());
        Ok(Self::resolve(file)?)
    }

    /// Parse a TOML document without consulting the environment.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file = parse_file_config(raw)?;
        let config = Self::default().apply_file(file);
        config.validate()?;
        Ok(config)
    }

    fn resolve(file: FileConfig) -> Result<Self, ConfigError> {
        let mut config = Self::default().apply_file(file);

        if let Some(ms) = parse_optional_env::<u64>("PERSONAL_SIGN_TIMEOUT_MS")? {
            config.signing.personal_sign_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_optional_env::<u64>("TYPED_DATA_TIMEOUT_MS")? {
            config.signing.typed_data_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_optional_env::<u64>("SAFE_SIGN_TIMEOUT_MS")? {
            config.signing.safe_sign_timeout = Duration::from_millis(ms);
        }
        if let Some(name) = optional_env("TYPED_DATA_DOMAIN_NAME")? {
            config.signing.domain_name = name;
        }
        if let Some(version) = optional_env("TYPED_DATA_DOMAIN_VERSION")? {
            config.signing.domain_version = version;
        }
        if let Some(chain_id) = parse_optional_env::<u64>("DEFAULT_CHAIN_ID")? {
            config.signing.default_chain_id = chain_id;
        }
        if let Some(provider) = optional_env("IDENTITY_PROVIDER")? {
            config.cleanup.identity_provider = provider;
        }
        if let Some(attempts) = parse_optional_env::<u32>("CLEANUP_MAX_ATTEMPTS")? {
            config.cleanup.max_attempts = attempts;
        }
        if let Some(ms) = parse_optional_env::<u64>("CLEANUP_BASE_DELAY_MS")? {
            config.cleanup.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_optional_env::<u64>("ERROR_VISIBILITY_MS")? {
            config.feedback.error_visibility = Duration::from_millis(ms);
        }
        if let Some(filter) = optional_env("LOG_FILTER")? {
            config.observability.log_filter = filter;
        }
        if let Some(json) = parse_bool_env("LOG_JSON")? {
            config.observability.json = json;
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_file(mut self, file: FileConfig) -> Self {
        if let Some(ms) = file.personal_sign_timeout_ms {
            self.signing.personal_sign_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.typed_data_timeout_ms {
            self.signing.typed_data_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.safe_sign_timeout_ms {
            self.signing.safe_sign_timeout = Duration::from_millis(ms);
        }
        if let Some(name) = file.typed_data_domain_name {
            self.signing.domain_name = name;
        }
        if let Some(version) = file.typed_data_domain_version {
            self.signing.domain_version = version;
        }
        if let Some(chain_id) = file.default_chain_id {
            self.signing.default_chain_id = chain_id;
        }
        if let Some(provider) = file.identity_provider {
            self.cleanup.identity_provider = provider;
        }
        if let Some(attempts) = file.cleanup_max_attempts {
            self.cleanup.max_attempts = attempts;
        }
        if let Some(ms) = file.cleanup_base_delay_ms {
            self.cleanup.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = file.error_visibility_ms {
            self.feedback.error_visibility = Duration::from_millis(ms);
        }
        if let Some(filter) = file.log_filter {
            self.observability.log_filter = filter;
        }
        if let Some(json) = file.log_json {
            self.observability.json = json;
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let deadlines = [
            ("personal_sign_timeout", self.signing.personal_sign_timeout),
            ("typed_data_timeout", self.signing.typed_data_timeout),
            ("safe_sign_timeout", self.signing.safe_sign_timeout),
        ];
        for (key, value) in deadlines {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        if self.signing.domain_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "typed_data_domain_name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.cleanup.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cleanup_max_attempts".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.cleanup.identity_provider.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "identity_provider".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_file_config(raw: &str) -> Result<FileConfig, ConfigError> {
    toml::from_str(raw).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::Error;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "PERSONAL_SIGN_TIMEOUT_MS",
        "TYPED_DATA_TIMEOUT_MS",
        "SAFE_SIGN_TIMEOUT_MS",
        "TYPED_DATA_DOMAIN_NAME",
        "TYPED_DATA_DOMAIN_VERSION",
        "DEFAULT_CHAIN_ID",
        "IDENTITY_PROVIDER",
        "CLEANUP_MAX_ATTEMPTS",
        "CLEANUP_BASE_DELAY_MS",
        "ERROR_VISIBILITY_MS",
        "LOG_FILTER",
        "LOG_JSON",
    ];

    fn clear_auth_env() {
        for key in ENV_KEYS {
            // SAFETY: Guarded by ENV_MUTEX in tests.
            unsafe { std::env::remove_var(format!("{}{key}", helpers::ENV_PREFIX)) };
        }
    }

    fn set_auth_env(key: &str, value: &str) {
        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe { std::env::set_var(format!("{}{key}", helpers::ENV_PREFIX), value) };
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{contents}").expect("write");
        file
    }

    fn invalid_key(result: crate::Result<AuthConfig>) -> String {
        match result {
            Err(Error::Config(ConfigError::InvalidValue { key, .. })) => key,
            other => panic!("expected an invalid value error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_match_wallet_deadlines() {
        let config = AuthConfig::default();
        assert_eq!(
            config.signing.personal_sign_timeout,
            Duration::from_secs(15)
        );
        assert_eq!(config.signing.typed_data_timeout, Duration::from_secs(15));
        assert_eq!(config.signing.safe_sign_timeout, Duration::from_secs(20));
        assert_eq!(config.signing.domain_name, "SuperPool Authentication");
        assert_eq!(config.signing.default_chain_id, 1);
        assert_eq!(config.cleanup.identity_provider, "Firebase");
    }

    #[test]
    fn toml_overlay_replaces_only_given_fields() {
        let config = AuthConfig::from_toml_str(
            r#"
            safe_sign_timeout_ms = 30000
            default_chain_id = 8453
            identity_provider = "Auth0"
            log_json = true
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.signing.safe_sign_timeout, Duration::from_secs(30));
        assert_eq!(config.signing.default_chain_id, 8453);
        assert_eq!(config.cleanup.identity_provider, "Auth0");
        assert!(config.observability.json);
        assert_eq!(
            config.signing.personal_sign_timeout,
            Duration::from_secs(15)
        );
    }

    #[test]
    fn zero_deadline_is_rejected() {
        let err = AuthConfig::from_toml_str("typed_data_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "typed_data_timeout"));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let err = AuthConfig::from_toml_str("personal_sign_timeout = 5").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn loads_from_file_path() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_auth_env();

        let file = toml_file("cleanup_max_attempts = 5\n");
        let config = AuthConfig::from_toml_path(file.path()).expect("config");
        assert_eq!(config.cleanup.max_attempts, 5);
    }

    #[test]
    fn env_wins_over_file_and_file_over_defaults() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_auth_env();
        set_auth_env("SAFE_SIGN_TIMEOUT_MS", "25000");
        set_auth_env("IDENTITY_PROVIDER", "Privy");
        set_auth_env("LOG_JSON", "yes");

        let file = toml_file(
            r#"
            safe_sign_timeout_ms = 30000
            identity_provider = "Auth0"
            cleanup_max_attempts = 5
            "#,
        );
        let config = AuthConfig::from_toml_path(file.path()).expect("config");
        clear_auth_env();

        assert_eq!(config.signing.safe_sign_timeout, Duration::from_secs(25));
        assert_eq!(config.cleanup.identity_provider, "Privy");
        assert!(config.observability.json);
        assert_eq!(config.cleanup.max_attempts, 5);
        assert_eq!(
            config.signing.personal_sign_timeout,
            Duration::from_secs(15)
        );
    }

    #[test]
    fn blank_env_values_count_as_unset() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_auth_env();
        set_auth_env("PERSONAL_SIGN_TIMEOUT_MS", "   ");
        set_auth_env("IDENTITY_PROVIDER", "");

        let file = toml_file("personal_sign_timeout_ms = 9000\n");
        let from_file = AuthConfig::from_toml_path(file.path()).expect("config");
        let from_env = AuthConfig::from_env().expect("config");
        clear_auth_env();

        assert_eq!(
            from_file.signing.personal_sign_timeout,
            Duration::from_secs(9)
        );
        assert_eq!(from_env, AuthConfig::default());
    }

    #[test]
    fn non_numeric_env_value_names_the_variable() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_auth_env();
        set_auth_env("TYPED_DATA_TIMEOUT_MS", "soon");

        let result = AuthConfig::from_env();
        clear_auth_env();

        assert_eq!(
            invalid_key(result),
            "SUPERPOOL_AUTH_TYPED_DATA_TIMEOUT_MS"
        );
    }

    #[test]
    fn bool_env_spellings() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_auth_env();

        for (raw, expected) in [
            ("true", true),
            ("1", true),
            ("ON", true),
            ("No", false),
            ("off", false),
            ("0", false),
        ] {
            set_auth_env("LOG_JSON", raw);
            let config = AuthConfig::from_env().expect("config");
            assert_eq!(config.observability.json, expected, "LOG_JSON={raw}");
        }

        set_auth_env("LOG_JSON", "maybe");
        let result = AuthConfig::from_env();
        clear_auth_env();

        assert_eq!(invalid_key(result), "SUPERPOOL_AUTH_LOG_JSON");
    }

    #[test]
    fn zero_deadline_from_env_is_rejected() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_auth_env();
        set_auth_env("SAFE_SIGN_TIMEOUT_MS", "0");

        let result = AuthConfig::from_env();
        clear_auth_env();

        assert_eq!(invalid_key(result), "safe_sign_timeout");
    }
}
