//! Configuration management for the smart home Lambda.

use std::env;

use crate::{Error, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Table holding one record per device
    pub table_name: String,
    /// Partition key attribute of the device table
    pub table_key: String,
    /// AWS region
    pub aws_region: String,
    /// Answer unknown namespaces with an `ErrorResponse` instead of the default envelope
    pub reject_unknown_directives: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: "SampleSmartHome".to_string(),
            table_key: "ItemId".to_string(),
            aws_region: "us-east-1".to_string(),
            reject_unknown_directives: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let reject_unknown_directives = match lookup("REJECT_UNKNOWN_DIRECTIVES") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                Error::Config(format!("REJECT_UNKNOWN_DIRECTIVES is not a boolean: {}", raw))
            })?,
            None => defaults.reject_unknown_directives,
        };

        Ok(Self {
            table_name: lookup("DEVICE_TABLE_NAME").unwrap_or(defaults.table_name),
            table_key: lookup("DEVICE_TABLE_KEY").unwrap_or(defaults.table_key),
            aws_region: lookup("AWS_REGION").unwrap_or(defaults.aws_region),
            reject_unknown_directives,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.table_name, "SampleSmartHome");
        assert_eq!(config.table_key, "ItemId");
        assert_eq!(config.aws_region, "us-east-1");
        assert!(!config.reject_unknown_directives);
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = Config::from_lookup(lookup(&[
            ("DEVICE_TABLE_NAME", "Devices"),
            ("DEVICE_TABLE_KEY", "DeviceId"),
            ("AWS_REGION", "eu-west-1"),
            ("REJECT_UNKNOWN_DIRECTIVES", "TRUE"),
        ]))
        .unwrap();
        assert_eq!(config.table_name, "Devices");
        assert_eq!(config.table_key, "DeviceId");
        assert_eq!(config.aws_region, "eu-west-1");
        assert!(config.reject_unknown_directives);
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let err = Config::from_lookup(lookup(&[("REJECT_UNKNOWN_DIRECTIVES", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
