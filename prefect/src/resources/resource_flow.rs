//! Flow resource implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{StringLengthValidator, UuidValidator};

use super::helpers;
use crate::api::flows::{Flow, FlowCreate, FlowUpdate, FlowsApi};
use crate::provider_data::PrefectProviderData;

const KIND: &str = "flow";

#[derive(Default)]
pub struct FlowResource {
    provider_data: Option<PrefectProviderData>,
}

impl FlowResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("A registered workflow that deployments point at")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Flow ID (UUID)")
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
                AttributeBuilder::new("account_id", AttributeType::String)
                    .description("Account ID (UUID), defaults to the account set in the provider")
                    .optional()
                    .validator(UuidValidator)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workspace_id", AttributeType::String)
                    .description("Workspace ID (UUID), defaults to the workspace set in the provider")
                    .optional()
                    .validator(UuidValidator)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the flow. Changing it replaces the flow.")
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tags", AttributeType::list_of(AttributeType::String))
                    .description("Tags associated with the flow")
                    .optional()
                    .computed()
                    .default(StaticDefault::empty_list())
                    .build(),
            )
            .build()
    }

    fn to_state(flow: &Flow, source: &DynamicValue) -> DynamicValue {
        helpers::object([
            ("id", Dynamic::String(flow.id.to_string())),
            ("created", helpers::timestamp(flow.created)),
            ("updated", helpers::timestamp(flow.updated)),
            ("account_id", helpers::carry(source, "account_id")),
            ("workspace_id", helpers::carry(source, "workspace_id")),
            ("name", Dynamic::from(flow.name.as_str())),
            ("tags", helpers::strings(&flow.tags)),
        ])
    }

    fn api<'a>(&'a self, state: &DynamicValue) -> Result<FlowsApi<'a>, Diagnostic> {
        let provider_data = self
            .provider_data
            .as_ref()
            .ok_or_else(helpers::provider_not_configured)?;
        let (account_id, workspace_id) = helpers::scope(state)?;

        provider_data
            .client
            .flows(account_id, workspace_id)
            .map_err(|e| helpers::client_error(KIND, &e))
    }

    async fn create_flow(&self, ctx: &Context, plan: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let api = self.api(plan)?;
        let payload = FlowCreate {
            name: helpers::required_string(plan, "name")?,
            tags: helpers::string_list(plan, "tags")?,
        };

        tracing::debug!(name = %payload.name, "creating flow");
        let flow = api
            .create(ctx, &payload)
            .await
            .map_err(|e| helpers::api_error("creating", KIND, &e))?;

        Ok(Self::to_state(&flow, plan))
    }

    /// `Ok(None)` when the flow is gone
    async fn read_flow(
        &self,
        ctx: &Context,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let api = self.api(state)?;
        let flow_id = helpers::required_uuid(state, "id", "Flow")?;

        match api.get(ctx, flow_id).await {
            Ok(flow) => Ok(Some(Self::to_state(&flow, state))),
            Err(e) if e.is_not_found() => {
                tracing::warn!(%flow_id, "flow no longer exists, removing from state");
                Ok(None)
            }
            Err(e) => Err(helpers::api_error("refreshing", KIND, &e)),
        }
    }

    async fn update_flow(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let api = self.api(plan)?;
        let flow_id = helpers::required_uuid(prior, "id", "Flow")?;
        let payload = FlowUpdate {
            tags: helpers::string_list(plan, "tags")?,
        };

        api.update(ctx, flow_id, &payload)
            .await
            .map_err(|e| helpers::api_error("updating", KIND, &e))?;
        let flow = api
            .get(ctx, flow_id)
            .await
            .map_err(|e| helpers::api_error("refreshing", KIND, &e))?;

        Ok(Self::to_state(&flow, plan))
    }

    async fn delete_flow(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let api = self.api(prior)?;
        let flow_id = helpers::required_uuid(prior, "id", "Flow")?;

        match api.delete(ctx, flow_id).await {
            Err(e) if !e.is_not_found() => Err(helpers::api_error("deleting", KIND, &e)),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Resource for FlowResource {
    fn type_name(&self) -> &str {
        "prefect_flow"
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

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        match self.create_flow(&ctx, &request.planned_state).await {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(diag) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![diag],
            },
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        match self.read_flow(&ctx, &request.current_state).await {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(diag) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![diag],
            },
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        match self
            .update_flow(&ctx, &request.prior_state, &request.planned_state)
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
        DeleteResourceResponse {
            diagnostics: self
                .delete_flow(&ctx, &request.prior_state)
                .await
                .err()
                .into_iter()
                .collect(),
        }
    }

    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        helpers::import_scoped(&request, "id", "id,workspace_id")
    }
}

#[async_trait]
impl ResourceWithConfigure for FlowResource {
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
