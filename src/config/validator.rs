use std::collections::HashMap;
use thiserror::Error;

use crate::adapters::route_table::MockRoute;
use crate::config::{ProviderConfig, RouteConfig, Settings};
use crate::domain::{TypeDescriptor, TypeKey};
use crate::METRICS_PATH;
use axum::http::Method;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_server(&settings.server) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_routes(&settings.routes) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_providers(&settings.providers) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &crate::config::ServerSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }

        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_routes(routes: &[RouteConfig]) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen = HashMap::new();

        for (idx, route) in routes.iter().enumerate() {
            // `:id`, `{id}` and `{user_id}` capture the same requests
            let shape = MockRoute::new(Method::GET, route.path.as_str()).shape();
            if shape == METRICS_PATH {
                errors.push(ValidationError::InvalidValue {
                    field: format!("routes[{}].path", idx),
                    reason: format!("'{}' is reserved for the metrics endpoint", route.path),
                });
            }

            let key = (route.method.to_ascii_uppercase(), shape);
            if let Some(prev_idx) = seen.insert(key, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Route '{} {}' appears at indices {} and {}",
                    route.method, route.path, prev_idx, idx
                )));
            }

            if route.path.is_empty() {
                errors.push(ValidationError::MissingField(format!("routes[{}].path", idx)));
            } else if !route.path.starts_with('/') {
                errors.push(ValidationError::InvalidValue {
                    field: format!("routes[{}].path", idx),
                    reason: "Path must start with '/'".to_string(),
                });
            }

            if let Err(e) = route.method() {
                errors.push(ValidationError::InvalidValue {
                    field: format!("routes[{}].method", idx),
                    reason: e.to_string(),
                });
            }

            if let Err(e) = route.status() {
                errors.push(ValidationError::InvalidValue {
                    field: format!("routes[{}].status_code", idx),
                    reason: e.to_string(),
                });
            }

            if let Some(schema) = &route.response_schema {
                if let Err(e) = TypeDescriptor::from_json_schema(schema) {
                    errors.push(ValidationError::InvalidValue {
                        field: format!("routes[{}].response_schema", idx),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_providers(providers: &[ProviderConfig]) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen = HashMap::new();

        for (idx, provider) in providers.iter().enumerate() {
            if let Some(prev_idx) = seen.insert(&provider.type_name, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Provider type '{}' appears at indices {} and {}",
                    provider.type_name, prev_idx, idx
                )));
            }

            match provider.type_name.parse::<TypeKey>() {
                Ok(TypeKey::Null) | Ok(TypeKey::Record) => {
                    errors.push(ValidationError::InvalidValue {
                        field: format!("providers[{}].type", idx),
                        reason: format!("'{}' cannot have a provider", provider.type_name),
                    });
                }
                Ok(_) => {}
                Err(e) => errors.push(ValidationError::InvalidValue {
                    field: format!("providers[{}].type", idx),
                    reason: e.to_string(),
                }),
            }

            if provider.sources() != 1 {
                errors.push(ValidationError::InvalidValue {
                    field: format!("providers[{}]", idx),
                    reason: "Exactly one of 'constant', 'faker', 'pattern' or 'script' \
                             must be provided"
                        .to_string(),
                });
            } else if provider.script.is_some() {
                if let Err(e) = provider.to_generator() {
                    errors.push(ValidationError::InvalidValue {
                        field: format!("providers[{}].script", idx),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
