//! Provider configuration
//!
//! Every provider block attribute falls back to an environment variable when
//! unset. The endpoint additionally falls back to Prefect Cloud.

use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::UuidValidator;
use uuid::Uuid;

use crate::api::{self, Client};

pub const DEFAULT_ENDPOINT: &str = "https://api.prefect.cloud";

pub const ENV_API_URL: &str = "PREFECT_API_URL";
pub const ENV_API_KEY: &str = "PREFECT_API_KEY";
pub const ENV_ACCOUNT_ID: &str = "PREFECT_CLOUD_ACCOUNT_ID";
pub const ENV_WORKSPACE_ID: &str = "PREFECT_CLOUD_WORKSPACE_ID";

pub fn provider_schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("Manage Prefect Cloud and self-hosted Prefect server resources")
        .attribute(
            AttributeBuilder::new("endpoint", AttributeType::String)
                .description(
                    "The Prefect API URL. Can also be set with PREFECT_API_URL. \
                     Defaults to https://api.prefect.cloud",
                )
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("api_key", AttributeType::String)
                .description("Prefect Cloud API key. Can also be set with PREFECT_API_KEY")
                .optional()
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("account_id", AttributeType::String)
                .description(
                    "Default Prefect Cloud account ID (UUID). \
                     Can also be set with PREFECT_CLOUD_ACCOUNT_ID",
                )
                .optional()
                .validator(UuidValidator)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("workspace_id", AttributeType::String)
                .description(
                    "Default Prefect Cloud workspace ID (UUID). \
                     Can also be set with PREFECT_CLOUD_WORKSPACE_ID",
                )
                .optional()
                .validator(UuidValidator)
                .build(),
        )
        .build()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub account_id: Option<Uuid>,
    pub workspace_id: Option<Uuid>,
}

impl ProviderConfig {
    /// Resolves the provider block against the environment.
    /// All problems are reported at once.
    pub fn from_config(config: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();

        let endpoint = setting(config, "endpoint", ENV_API_URL, &mut diagnostics)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let api_key = setting(config, "api_key", ENV_API_KEY, &mut diagnostics);
        let account_id = uuid_setting(config, "account_id", ENV_ACCOUNT_ID, &mut diagnostics);
        let workspace_id =
            uuid_setting(config, "workspace_id", ENV_WORKSPACE_ID, &mut diagnostics);

        match api::normalize_endpoint(&endpoint) {
            Ok(url) => {
                if url.host_str() == Some(api::PREFECT_CLOUD_HOST) && api_key.is_none() {
                    diagnostics.push(Diagnostic::attribute_error(
                        AttributePath::new("api_key"),
                        "Missing Prefect API Key",
                        "The provider cannot create the Prefect API client as there is a missing \
                         or empty value for the Prefect API key. Set the api_key value in the \
                         configuration or use the PREFECT_API_KEY environment variable.",
                    ));
                }
            }
            Err(e) => diagnostics.push(Diagnostic::attribute_error(
                AttributePath::new("endpoint"),
                "Invalid Prefect API Endpoint",
                e.to_string(),
            )),
        }

        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }

        Ok(Self {
            endpoint,
            api_key,
            account_id,
            workspace_id,
        })
    }

    pub fn build_client(&self) -> Result<Client, Diagnostic> {
        Client::new(
            &self.endpoint,
            self.api_key.as_deref(),
            self.account_id,
            self.workspace_id,
        )
        .map_err(|e| {
            Diagnostic::error(
                "Unable to Create Prefect API Client",
                format!("An unexpected error occurred when creating the Prefect API client: {}", e),
            )
        })
    }
}

/// Config value first, then a non-empty environment variable
fn setting(
    config: &DynamicValue,
    attr: &str,
    env: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let path = AttributePath::new(attr);
    match config.get_string_opt(&path) {
        Ok(Some(value)) if !value.is_empty() => return Some(value),
        Ok(_) => {}
        Err(e) => {
            diagnostics.push(Diagnostic::attribute_error(
                path,
                format!("Invalid {} value", attr),
                e.to_string(),
            ));
            return None;
        }
    }

    std::env::var(env).ok().filter(|v| !v.is_empty())
}

fn uuid_setting(
    config: &DynamicValue,
    attr: &str,
    env: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Uuid> {
    let raw = setting(config, attr, env, diagnostics)?;
    match Uuid::parse_str(&raw) {
        Ok(id) => Some(id),
        Err(e) => {
            diagnostics.push(Diagnostic::attribute_error(
                AttributePath::new(attr),
                format!("Invalid {}", attr),
                format!("{:?} (from the provider block or {}) is not a valid UUID: {}", raw, env, e),
            ));
            None
        }
    }
}
