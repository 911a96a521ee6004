use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::secrets::has_secret_source;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be greater than 0".to_string(),
        });
    }

    if config.default_region.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "default_region must not be blank".to_string(),
        });
    }

    let costs = &config.costs;
    if !(costs.fallback_item_cost.is_finite() && costs.fallback_item_cost >= 0.0)
        || !(costs.deterioration_unit_cost.is_finite() && costs.deterioration_unit_cost >= 0.0)
    {
        return Err(ConfigError::Validation {
            message: "cost constants must be finite and non-negative".to_string(),
        });
    }

    if !(0.0..=1.0).contains(&config.detector.min_confidence) {
        return Err(ConfigError::Validation {
            message: format!(
                "detector.min_confidence must be within [0, 1], got {}",
                config.detector.min_confidence
            ),
        });
    }

    if config.detector.enabled && config.detector.endpoint.is_none() {
        return Err(ConfigError::Validation {
            message: "detector.endpoint is required when the detector is enabled".to_string(),
        });
    }

    let ai = &config.ai;
    if ai.enabled
        && !has_secret_source(
            ai.api_key.as_deref(),
            ai.api_key_file.as_deref(),
            ai.api_key_env_var.as_deref(),
        )
    {
        return Err(ConfigError::Validation {
            message: "ai is enabled but no api_key, api_key_file or api_key_env_var is set"
                .to_string(),
        });
    }

    Ok(())
}
