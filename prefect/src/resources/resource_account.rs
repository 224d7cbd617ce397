//! Account resource implementation
//!
//! Accounts cannot be created through the API. They are brought under
//! management with `terraform import` and then updated in place.

use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use super::helpers;
use crate::api::accounts::{Account, AccountSettings, AccountUpdate};
use crate::provider_data::PrefectProviderData;

const KIND: &str = "account";

const SETTINGS: [&str; 3] = [
    "allow_public_workspaces",
    "ai_log_summaries",
    "managed_execution",
];

#[derive(Default)]
pub struct AccountResource {
    provider_data: Option<PrefectProviderData>,
}

impl AccountResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description(
                "Resource representing a Prefect Cloud account. \
                 Accounts must be imported; they cannot be created by the provider.",
            )
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Account ID (UUID)")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("Timestamp of when the resource was created (RFC3339)")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated", AttributeType::String)
                    .description("Timestamp of when the resource was updated (RFC3339)")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the account")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("handle", AttributeType::String)
                    .description("Unique handle of the account")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("location", AttributeType::String)
                    .description("An optional physical location for the account, e.g. Washington, D.C.")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("link", AttributeType::String)
                    .description("An optional link to an external URL associated with the account")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("billing_email", AttributeType::String)
                    .description("Billing email to apply to the account's Stripe customer")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "settings",
                    AttributeType::object(SETTINGS.map(|name| (name, AttributeType::Bool))),
                )
                .description("Account-wide feature toggles")
                .optional()
                .computed()
                .plan_modifier(UseStateForUnknown)
                .build(),
            )
            .build()
    }

    pub(crate) fn to_state(account: &Account) -> DynamicValue {
        let settings = &account.settings;
        let settings = HashMap::from([
            (
                "allow_public_workspaces".to_string(),
                Dynamic::Bool(settings.allow_public_workspaces),
            ),
            (
                "ai_log_summaries".to_string(),
                Dynamic::Bool(settings.ai_log_summaries),
            ),
            (
                "managed_execution".to_string(),
                Dynamic::Bool(settings.managed_execution),
            ),
        ]);

        helpers::object([
            ("id", Dynamic::String(account.id.to_string())),
            ("created", helpers::timestamp(account.created)),
            ("updated", helpers::timestamp(account.updated)),
            ("name", Dynamic::from(account.name.as_str())),
            ("handle", Dynamic::from(account.handle.as_str())),
            ("location", Dynamic::from(account.location.clone())),
            ("link", Dynamic::from(account.link.clone())),
            ("billing_email", Dynamic::from(account.billing_email.clone())),
            ("settings", Dynamic::Map(settings)),
        ])
    }

    /// `None` when the plan leaves settings unset or unknown
    fn extract_settings(plan: &DynamicValue) -> Result<Option<AccountSettings>, Diagnostic> {
        let Some(values) = plan
            .get_map_opt(&AttributePath::new("settings"))
            .map_err(|e| helpers::attribute_error("settings", e))?
        else {
            return Ok(None);
        };

        let flag = |name: &str| -> Result<bool, Diagnostic> {
            match values.get(name) {
                None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(false),
                Some(Dynamic::Bool(b)) => Ok(*b),
                Some(other) => Err(Diagnostic::attribute_error(
                    AttributePath::new("settings").attribute(name),
                    "Invalid value for settings",
                    format!("{} must be a bool, got {}", name, other.type_name()),
                )),
            }
        };

        Ok(Some(AccountSettings {
            allow_public_workspaces: flag("allow_public_workspaces")?,
            ai_log_summaries: flag("ai_log_summaries")?,
            managed_execution: flag("managed_execution")?,
        }))
    }

    async fn update_account(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let provider_data = self
            .provider_data
            .as_ref()
            .ok_or_else(helpers::provider_not_configured)?;
        let account_id = helpers::required_uuid(prior, "id", "Account")?;
        let payload = AccountUpdate {
            name: helpers::optional_string(plan, "name")?,
            handle: helpers::optional_string(plan, "handle")?,
            location: helpers::optional_string(plan, "location")?,
            link: helpers::optional_string(plan, "link")?,
        };
        // Settings have their own endpoint; only touch it when they changed
        let current = Self::extract_settings(prior).ok().flatten();
        let settings =
            Self::extract_settings(plan)?.filter(|planned| current.as_ref() != Some(planned));

        let accounts = provider_data.client.accounts();
        accounts
            .update(ctx, account_id, &payload)
            .await
            .map_err(|e| helpers::api_error("updating", KIND, &e))?;

        if let Some(settings) = settings {
            accounts
                .update_settings(ctx, account_id, &settings)
                .await
                .map_err(|e| {
                    Diagnostic::error(
                        "Error updating account settings",
                        format!("Could not update account settings, unexpected error: {}", e),
                    )
                })?;
        }

        let account = accounts
            .get(ctx, account_id)
            .await
            .map_err(|e| helpers::api_error("refreshing", KIND, &e))?;
        Ok(Self::to_state(&account))
    }
}

#[async_trait]
impl Resource for AccountResource {
    fn type_name(&self) -> &str {
        "prefect_account"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        CreateResourceResponse {
            new_state: request.planned_state,
            diagnostics: vec![Diagnostic::error(
                "Cannot create account",
                "Accounts cannot be created by the provider. Import an existing account \
                 with `terraform import prefect_account.<name> <account_id>` instead.",
            )],
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(helpers::provider_not_configured());
            return ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics,
            };
        };

        let account_id = match helpers::required_uuid(&request.current_state, "id", "Account") {
            Ok(id) => id,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        match provider_data.client.accounts().get(&ctx, account_id).await {
            Ok(account) => ReadResourceResponse {
                new_state: Some(Self::to_state(&account)),
                diagnostics,
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!(%account_id, "account no longer exists, removing from state");
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(helpers::api_error("refreshing", KIND, &e));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        match self
            .update_account(&ctx, &request.prior_state, &request.planned_state)
            .await
        {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(diag) => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![diag],
            },
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(helpers::provider_not_configured());
            return DeleteResourceResponse { diagnostics };
        };

        let account_id = match helpers::required_uuid(&request.prior_state, "id", "Account") {
            Ok(id) => id,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        match provider_data.client.accounts().delete(&ctx, account_id).await {
            Err(e) if !e.is_not_found() => {
                diagnostics.push(helpers::api_error("deleting", KIND, &e))
            }
            _ => {}
        }

        DeleteResourceResponse { diagnostics }
    }

    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[async_trait]
impl ResourceWithConfigure for AccountResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        match PrefectProviderData::from_any(request.provider_data) {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureResourceResponse { diagnostics }
    }
}
