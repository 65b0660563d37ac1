//! Configuration validation
//!
//! Rules:
//! - block_size > 0
//! - sink names non-empty and unique

use std::collections::HashSet;

use contracts::{BulkConfig, ContractError};
use validator::{Validate, ValidationErrors};

/// Validate a BulkConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &BulkConfig) -> Result<(), ContractError> {
    config.validate().map_err(from_validation_errors)?;
    validate_sink_names(config)?;
    Ok(())
}

/// Sink names must be unique
fn validate_sink_names(config: &BulkConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in config.sinks.iter().enumerate() {
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                format!("duplicate sink name '{}'", sink.name),
            ));
        }
    }
    Ok(())
}

/// Flatten validator output into the first failing field
fn from_validation_errors(errors: ValidationErrors) -> ContractError {
    let mut fields: Vec<(String, String)> = Vec::new();
    collect_errors("", &errors, &mut fields);
    fields.sort();

    match fields.into_iter().next() {
        Some((field, message)) => ContractError::config_validation(field, message),
        None => ContractError::config_validation("config", errors.to_string()),
    }
}

fn collect_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect_errors(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkConfig, SinkType};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&BulkConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_block_size() {
        let config = BulkConfig {
            block_size: 0,
            ..BulkConfig::default()
        };
        let err = validate(&config).unwrap_err();
        match err {
            ContractError::ConfigValidation { field, message } => {
                assert_eq!(field, "block_size");
                assert!(message.contains("> 0"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_sink_name() {
        let config = BulkConfig {
            sinks: vec![SinkConfig::new("", SinkType::Console)],
            ..BulkConfig::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("sinks[0].name"), "{err}");
    }

    #[test]
    fn test_duplicate_sink_name() {
        let config = BulkConfig {
            sinks: vec![
                SinkConfig::new("out", SinkType::Console),
                SinkConfig::new("out", SinkType::Log),
            ],
            ..BulkConfig::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
