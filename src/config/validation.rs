use std::collections::HashSet;

use super::{AppConfig, ConfigError, Provider};

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_server_config(config)?;
    validate_vendors(config)?;
    validate_log_level(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_server_config(config: &AppConfig) -> Result<(), ConfigError> {
    let server = &config.server;
    if server.http_pool_max_idle_per_host == 0 {
        return Err(validation_err(
            "server.http_pool_max_idle_per_host must be greater than 0",
        ));
    }
    if server.body_limit_bytes == 0 {
        return Err(validation_err(
            "server.body_limit_bytes must be greater than 0",
        ));
    }
    if let Some(worker_threads) = server.runtime_worker_threads {
        if worker_threads == 0 {
            return Err(validation_err(
                "server.runtime_worker_threads must be greater than 0 when set",
            ));
        }
    }
    if let Some(max_blocking_threads) = server.runtime_max_blocking_threads {
        if max_blocking_threads == 0 {
            return Err(validation_err(
                "server.runtime_max_blocking_threads must be greater than 0 when set",
            ));
        }
    }
    Ok(())
}

fn validate_vendors(config: &AppConfig) -> Result<(), ConfigError> {
    if config.vendors.is_empty() {
        return Err(validation_err("vendors cannot be empty"));
    }

    let mut names = HashSet::new();
    for vendor in &config.vendors {
        if vendor.name.trim().is_empty() {
            return Err(validation_err("vendor name cannot be empty"));
        }
        if !names.insert(vendor.name.as_str()) {
            return Err(validation_err(format!(
                "duplicate vendor name '{}'",
                vendor.name
            )));
        }

        // api_key_env names the environment variable, it is never the secret itself
        let key_env = vendor.api_key_env.trim();
        if key_env.is_empty() {
            return Err(validation_err(format!(
                "Vendor '{}': api_key_env cannot be empty",
                vendor.name
            )));
        }
        if key_env.contains(char::is_whitespace) {
            return Err(validation_err(format!(
                "Vendor '{}': api_key_env must be an environment variable name, not a literal key",
                vendor.name
            )));
        }

        if let Some(base_url) = vendor.base_url.as_deref() {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(validation_err(format!(
                    "Vendor '{}': base_url must start with http:// or https://",
                    vendor.name
                )));
            }
            url::Url::parse(base_url).map_err(|err| {
                validation_err(format!(
                    "Vendor '{}': base_url is not a valid URL: {err}",
                    vendor.name
                ))
            })?;
        }

        match vendor.provider {
            Provider::Relevance => {
                if vendor.base_url.is_none() && vendor.region.as_deref().is_none_or(str::is_empty) {
                    return Err(validation_err(format!(
                        "Vendor '{}': relevance requires region or base_url",
                        vendor.name
                    )));
                }
                if vendor.dataset.as_deref().is_none_or(str::is_empty) {
                    return Err(validation_err(format!(
                        "Vendor '{}': relevance requires a dataset",
                        vendor.name
                    )));
                }
            }
            Provider::Gemini | Provider::Groq => {
                if vendor.model.as_deref().is_none_or(str::is_empty) {
                    return Err(validation_err(format!(
                        "Vendor '{}': {} requires a model",
                        vendor.name, vendor.provider
                    )));
                }
            }
        }
    }

    let default_count = config.vendors.iter().filter(|v| v.is_default).count();
    if default_count > 1 {
        return Err(validation_err(
            "at most one vendor may set is_default: true",
        ));
    }

    Ok(())
}

fn validate_log_level(config: &AppConfig) -> Result<(), ConfigError> {
    let valid_levels = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL", "DISABLED"];
    if !valid_levels.contains(&config.features.log_level.to_uppercase().as_str()) {
        return Err(validation_err(format!(
            "log_level must be one of {valid_levels:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeaturesConfig, ServerConfig, VendorConfig};

    fn groq_vendor(name: &str) -> VendorConfig {
        VendorConfig {
            name: name.to_string(),
            provider: Provider::Groq,
            base_url: None,
            api_key_env: "GROQ_API_KEY".to_string(),
            region: None,
            dataset: None,
            model: Some("llama-3.1-8b-instant".to_string()),
            is_default: false,
        }
    }

    fn make_valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig::default(),
            vendors: vec![groq_vendor("groq")],
            features: FeaturesConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&make_valid_config()).is_ok());
    }

    #[test]
    fn test_no_vendors() {
        let mut config = make_valid_config();
        config.vendors.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_duplicate_vendor_name() {
        let mut config = make_valid_config();
        config.vendors.push(groq_vendor("groq"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_api_key_env() {
        let mut config = make_valid_config();
        config.vendors[0].api_key_env = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_literal_secret_in_api_key_env() {
        // Several of the original deployments passed the secret string to the
        // env lookup; a value with whitespace cannot be a variable name.
        let mut config = make_valid_config();
        config.vendors[0].api_key_env = "sk live key with spaces".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_base_url_scheme() {
        let mut config = make_valid_config();
        config.vendors[0].base_url = Some("ftp://bad.url".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_groq_requires_model() {
        let mut config = make_valid_config();
        config.vendors[0].model = None;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_relevance_requires_region_or_base_url() {
        let mut config = make_valid_config();
        config.vendors[0] = VendorConfig {
            name: "relevance".to_string(),
            provider: Provider::Relevance,
            base_url: None,
            api_key_env: "RELEVANCE_API_KEY".to_string(),
            region: None,
            dataset: Some("fruits_dataset".to_string()),
            model: None,
            is_default: false,
        };
        assert!(validate_config(&config).is_err());

        config.vendors[0].region = Some("us-west".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_relevance_requires_dataset() {
        let mut config = make_valid_config();
        config.vendors[0] = VendorConfig {
            name: "relevance".to_string(),
            provider: Provider::Relevance,
            base_url: None,
            api_key_env: "RELEVANCE_API_KEY".to_string(),
            region: Some("us-west".to_string()),
            dataset: None,
            model: None,
            is_default: false,
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_multiple_defaults_rejected() {
        let mut config = make_valid_config();
        let mut second = groq_vendor("second");
        config.vendors[0].is_default = true;
        second.is_default = true;
        config.vendors.push(second);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = make_valid_config();
        config.features.log_level = "VERBOSE".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_body_limit() {
        let mut config = make_valid_config();
        config.server.body_limit_bytes = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_runtime_worker_threads() {
        let mut config = make_valid_config();
        config.server.runtime_worker_threads = Some(0);
        assert!(validate_config(&config).is_err());
    }
}
