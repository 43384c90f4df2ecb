//! Config validation
//!
//! Rules:
//! - field ranges declared on the config structs (`validator` derive)
//! - API URLs use http(s) / ws(s) schemes
//! - sink names are non-empty and unique
//! - file sinks carry a `path` parameter
//! - queue capacities are non-zero

use std::collections::HashSet;

use contracts::{ContractError, SinkType, ViewerConfig};
use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate a ViewerConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &ViewerConfig) -> Result<(), ContractError> {
    validate_ranges(config)?;
    validate_api_urls(config)?;
    validate_sinks(config)?;
    Ok(())
}

/// Check the declarative field ranges
fn validate_ranges(config: &ViewerConfig) -> Result<(), ContractError> {
    match config.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_violation(&errors, String::new())
                .unwrap_or_else(|| ("config".to_string(), errors.to_string()));
            Err(ContractError::config_validation(field, message))
        }
    }
}

/// Depth-first search for the first violated field, in key order
fn first_violation(errors: &ValidationErrors, prefix: String) -> Option<(String, String)> {
    let mut keys: Vec<_> = errors.errors().keys().collect();
    keys.sort();

    for key in keys {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };
        match &errors.errors()[key] {
            ValidationErrorsKind::Field(field_errors) => {
                if let Some(err) = field_errors.first() {
                    let message = match &err.message {
                        Some(message) => message.to_string(),
                        None => format!("failed '{}' check", err.code),
                    };
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                if let Some(found) = first_violation(nested, path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    if let Some(found) = first_violation(nested, format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

/// Check the endpoint schemes
fn validate_api_urls(config: &ViewerConfig) -> Result<(), ContractError> {
    let api = &config.api;

    if !has_scheme(&api.base_url, &["http://", "https://"]) {
        return Err(ContractError::config_validation(
            "api.base_url",
            format!("expected an http(s) URL, got '{}'", api.base_url),
        ));
    }

    if !has_scheme(&api.ws_url, &["ws://", "wss://"]) {
        return Err(ContractError::config_validation(
            "api.ws_url",
            format!("expected a ws(s) URL, got '{}'", api.ws_url),
        ));
    }

    Ok(())
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    schemes
        .iter()
        .any(|scheme| lower.len() > scheme.len() && lower.starts_with(scheme))
}

/// Check sink configs
fn validate_sinks(config: &ViewerConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();

    for (idx, sink) in config.sinks.iter().enumerate() {
        if sink.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }

        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }

        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }

        let needs_path = matches!(sink.sink_type, SinkType::Png | SinkType::Json);
        let has_path = sink
            .params
            .get("path")
            .is_some_and(|path| !path.trim().is_empty());
        if needs_path && !has_path {
            return Err(ContractError::config_validation(
                format!("sinks[{}].params.path", sink.name),
                format!("{} sink requires a 'path' parameter", sink.sink_type),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{OverflowPolicy, SinkConfig};
    use std::collections::HashMap;

    fn sink(name: &str, sink_type: SinkType, path: Option<&str>) -> SinkConfig {
        let mut params = HashMap::new();
        if let Some(path) = path {
            params.insert("path".to_string(), path.to_string());
        }
        SinkConfig {
            name: name.to_string(),
            sink_type,
            queue_capacity: 100,
            overflow: OverflowPolicy::Block,
            params,
        }
    }

    fn valid_config() -> ViewerConfig {
        ViewerConfig {
            sinks: vec![
                sink("log", SinkType::Log, None),
                sink("frames", SinkType::Png, Some("out/frames")),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_duplicate_sink_name() {
        let mut config = valid_config();
        config.sinks.push(sink("log", SinkType::Log, None));
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate sink name"));
    }

    #[test]
    fn test_empty_sink_name() {
        let mut config = valid_config();
        config.sinks[0].name = "  ".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_png_sink_requires_path() {
        let mut config = valid_config();
        config.sinks.push(sink("json", SinkType::Json, None));
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("sinks[json].params.path"));
    }

    #[test]
    fn test_zero_queue_capacity() {
        let mut config = valid_config();
        config.sinks[0].queue_capacity = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_url_schemes() {
        let mut config = valid_config();
        config.api.base_url = "ftp://host".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("api.base_url"));

        let mut config = valid_config();
        config.api.ws_url = "http://host:8000".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("api.ws_url"));
    }

    #[test]
    fn test_range_violation_reports_nested_path() {
        let mut config = valid_config();
        config.overlay.ball.min_confidence = 2.0;
        let err = validate(&config).unwrap_err();
        assert!(
            err.to_string().contains("overlay.ball.min_confidence"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_poll_interval_range() {
        let mut config = valid_config();
        config.api.poll_interval_ms = 10;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("api.poll_interval_ms"));
    }
}
