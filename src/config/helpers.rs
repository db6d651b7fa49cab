use std::str::FromStr;

use crate::error::ConfigError;

pub(crate) const ENV_PREFIX: &str = "SUPERPOOL_AUTH_";

/// Read `SUPERPOOL_AUTH_<key>`, treating empty values as unset.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    let name = format!("{ENV_PREFIX}{key}");
    match std::env::var(&name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
            key: name,
            message: "value is not valid UTF-8".to_string(),
        }),
    }
}

pub(crate) fn parse_optional_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)?
        .map(|s| s.parse::<T>())
        .transpose()
        .map_err(|e| ConfigError::InvalidValue {
            key: format!("{ENV_PREFIX}{key}"),
            message: format!("must be a valid number: {e}"),
        })
}

pub(crate) fn parse_bool_env(key: &str) -> Result<Option<bool>, ConfigError> {
    optional_env(key)?
        .map(|s| match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: format!("{ENV_PREFIX}{key}"),
                message: format!("expected a boolean, got '{s}'"),
            }),
        })
        .transpose()
}
