use axum::http::{Method, StatusCode};
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

pub mod validator;

use crate::adapters::example_provider::{ExampleProvider, Generator};
use crate::adapters::faker::FakerKind;
use crate::adapters::pattern::Pattern;
use crate::adapters::route_table::{MockRoute, RouteTable};
use crate::adapters::script_provider::ScriptProvider;
use crate::domain::{RegistrationError, TypeDescriptor, TypeKey};

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub mock: MockSettings,
    /// Extra example providers, ahead of the defaults in declaration order
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct MockSettings {
    /// Substitute examples for generic 500 responses as well
    #[serde(default)]
    pub return_example_instead_of_500: bool,
}

/// One example provider: a type token plus exactly one value source.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faker: Option<FakerKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Rhai source defining `fn generate()` or `fn generate(ty)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

impl ProviderConfig {
    pub fn sources(&self) -> usize {
        [
            self.constant.is_some(),
            self.faker.is_some(),
            self.pattern.is_some(),
            self.script.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    pub fn to_generator(&self) -> Result<(TypeKey, Generator), RegistrationError> {
        let key: TypeKey = self.type_name.parse()?;
        let invalid = |reason: &str| RegistrationError::InvalidProvider {
            type_key: self.type_name.clone(),
            reason: reason.to_string(),
        };

        if self.sources() != 1 {
            return Err(invalid(
                "exactly one of 'constant', 'faker', 'pattern' or 'script' must be set",
            ));
        }

        let generator = if let Some(value) = &self.constant {
            Generator::constant(value.clone())
        } else if let Some(kind) = self.faker {
            kind.into()
        } else if let Some(pattern) = &self.pattern {
            Pattern::parse(pattern).into()
        } else if let Some(script) = &self.script {
            Generator::Script(Arc::new(ScriptProvider::compile(&key, script)?))
        } else {
            return Err(invalid("no value source"));
        };

        Ok((key, generator))
    }
}

/// Mock metadata for one endpoint.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RouteConfig {
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// JSON Schema of the success response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
    /// OpenAPI operation extras; `example` / `examples` keys are honored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi_extra: Option<Value>,
}

impl RouteConfig {
    pub fn method(&self) -> Result<Method, anyhow::Error> {
        Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| anyhow::anyhow!("Invalid HTTP method '{}': {}", self.method, e))
    }

    pub fn status(&self) -> Result<StatusCode, anyhow::Error> {
        match self.status_code {
            Some(code) => Ok(StatusCode::from_u16(code)?),
            None => Ok(StatusCode::OK),
        }
    }

    pub fn to_route(&self) -> Result<MockRoute, anyhow::Error> {
        let mut route = MockRoute::new(self.method()?, self.path.clone()).status(self.status()?);

        if let Some(schema) = &self.response_schema {
            route = route.response(TypeDescriptor::from_json_schema(schema)?);
        }
        if let Some(extra) = &self.openapi_extra {
            route = route.openapi_extra(extra);
        }
        if let Some(example) = &self.example {
            route = route.example(example.clone());
        }
        if !self.examples.is_empty() {
            route = route.examples(self.examples.clone());
        }
        Ok(route)
    }
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let config_path = Path::new(root).join("exemplar");
        let s = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(
                Environment::with_prefix("EXEMPLAR")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;

        settings.load_external_configs(root)?;

        validator::ConfigValidator::validate(&settings).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;

        Ok(settings)
    }

    fn load_external_configs(&mut self, root: &str) -> Result<(), anyhow::Error> {
        self.routes
            .extend(load_dir::<RouteConfig>(&format!("{}/config/routes", root))?);
        self.providers
            .extend(load_dir::<ProviderConfig>(&format!("{}/config/providers", root))?);
        Ok(())
    }

    /// Registry with the configured providers ahead of the defaults.
    pub fn example_provider(&self) -> Result<ExampleProvider, RegistrationError> {
        let providers = self
            .providers
            .iter()
            .map(ProviderConfig::to_generator)
            .collect::<Result<Vec<_>, _>>()?;
        ExampleProvider::with_providers(providers)
    }

    pub fn route_table(&self) -> Result<RouteTable, anyhow::Error> {
        let routes = self
            .routes
            .iter()
            .map(RouteConfig::to_route)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RouteTable::new(routes))
    }
}

/// Read one entry per file from `dir`, in file name order.
fn load_dir<T: DeserializeOwned>(dir: &str) -> Result<Vec<T>, anyhow::Error> {
    let pattern = format!("{}/*", dir);
    let mut entries = Vec::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) => {
                let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                    continue;
                };
                if !matches!(ext, "json" | "yaml" | "yml" | "toml") {
                    continue;
                }
                let content = std::fs::read_to_string(&path)?;
                let parsed: T = match ext {
                    "json" => serde_json::from_str(&content)?,
                    "toml" => toml::from_str(&content)?,
                    _ => serde_yaml::from_str(&content)?,
                };
                tracing::info!("Loaded config from {:?}", path);
                entries.push(parsed);
            }
            Err(e) => tracing::error!("Error reading config path: {}", e),
        }
    }
    Ok(entries)
}
