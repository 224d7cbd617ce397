//! Work pool resource implementation
//!
//! Work pools are addressed by name rather than ID, so `name` is the key used
//! for read, update, delete and import.

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
use tfplug::validator::{JsonValidator, NumberRangeValidator, StringLengthValidator, UuidValidator};

use super::helpers;
use crate::api::work_pools::{
    WorkPool, WorkPoolCreate, WorkPoolUpdate, WorkPoolsApi, DEFAULT_WORK_POOL_TYPE,
};
use crate::provider_data::PrefectProviderData;

const KIND: &str = "work pool";

#[derive(Default)]
pub struct WorkPoolResource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkPoolResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description(
                "Work pools route scheduled deployment runs to workers of a given type",
            )
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Work pool ID (UUID)")
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
                    .description("Name of the work pool")
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("Type of the work pool, e.g. kubernetes or process")
                    .optional()
                    .computed()
                    .default(StaticDefault::string(DEFAULT_WORK_POOL_TYPE))
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description of the work pool")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("paused", AttributeType::Bool)
                    .description("Whether this work pool is paused")
                    .optional()
                    .computed()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("concurrency_limit", AttributeType::Number)
                    .description("Maximum number of concurrent runs in this work pool")
                    .optional()
                    .validator(NumberRangeValidator::at_least(0.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("base_job_template", AttributeType::String)
                    .description("Base job template for flow runs in this pool, as a JSON object string")
                    .optional()
                    .computed()
                    .validator(JsonValidator::object())
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("default_queue_id", AttributeType::String)
                    .description("ID of the work queue created alongside the pool")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .build()
    }

    fn to_state(pool: &WorkPool, source: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let prior_template = helpers::optional_string(source, "base_job_template")
            .ok()
            .flatten();
        let base_job_template = helpers::normalized_json(
            prior_template.as_deref(),
            &pool.base_job_template,
            "base_job_template",
        )?;

        Ok(helpers::object([
            ("id", Dynamic::String(pool.id.to_string())),
            ("created", helpers::timestamp(pool.created)),
            ("updated", helpers::timestamp(pool.updated)),
            ("account_id", helpers::carry(source, "account_id")),
            ("workspace_id", helpers::carry(source, "workspace_id")),
            ("name", Dynamic::from(pool.name.as_str())),
            ("type", Dynamic::from(pool.pool_type.as_str())),
            ("description", Dynamic::from(pool.description.clone())),
            ("paused", Dynamic::Bool(pool.is_paused)),
            (
                "concurrency_limit",
                pool.concurrency_limit
                    .map(|limit| Dynamic::Number(limit as f64))
                    .unwrap_or(Dynamic::Null),
            ),
            ("base_job_template", base_job_template),
            (
                "default_queue_id",
                helpers::optional_uuid_value(pool.default_queue_id),
            ),
        ]))
    }

    fn api<'a>(&'a self, state: &DynamicValue) -> Result<WorkPoolsApi<'a>, Diagnostic> {
        let provider_data = self
            .provider_data
            .as_ref()
            .ok_or_else(helpers::provider_not_configured)?;
        let (account_id, workspace_id) = helpers::scope(state)?;

        provider_data
            .client
            .work_pools(account_id, workspace_id)
            .map_err(|e| helpers::client_error(KIND, &e))
    }

    fn extract_create(plan: &DynamicValue) -> Result<WorkPoolCreate, Diagnostic> {
        Ok(WorkPoolCreate {
            name: helpers::required_string(plan, "name")?,
            description: helpers::optional_string(plan, "description")?,
            pool_type: helpers::optional_string(plan, "type")?
                .unwrap_or_else(|| DEFAULT_WORK_POOL_TYPE.to_string()),
            base_job_template: helpers::json_object(plan, "base_job_template")?,
            is_paused: helpers::optional_bool(plan, "paused")?.unwrap_or(false),
            concurrency_limit: helpers::optional_integer(plan, "concurrency_limit")?,
        })
    }

    fn extract_update(plan: &DynamicValue) -> Result<WorkPoolUpdate, Diagnostic> {
        Ok(WorkPoolUpdate {
            description: helpers::optional_string(plan, "description")?,
            is_paused: helpers::optional_bool(plan, "paused")?.unwrap_or(false),
            base_job_template: helpers::json_object(plan, "base_job_template")?,
            concurrency_limit: helpers::optional_integer(plan, "concurrency_limit")?,
        })
    }

    async fn create_pool(&self, ctx: &Context, plan: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let api = self.api(plan)?;
        let payload = Self::extract_create(plan)?;

        tracing::debug!(name = %payload.name, pool_type = %payload.pool_type, "creating work pool");
        let pool = api
            .create(ctx, &payload)
            .await
            .map_err(|e| helpers::api_error("creating", KIND, &e))?;

        Self::to_state(&pool, plan)
    }

    async fn read_pool(
        &self,
        ctx: &Context,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let api = self.api(state)?;
        let name = helpers::required_string(state, "name")?;

        match api.get(ctx, &name).await {
            Ok(pool) => Self::to_state(&pool, state).map(Some),
            Err(e) if e.is_not_found() => {
                tracing::warn!(%name, "work pool no longer exists, removing from state");
                Ok(None)
            }
            Err(e) => Err(helpers::api_error("refreshing", KIND, &e)),
        }
    }

    async fn update_pool(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let api = self.api(plan)?;
        let name = helpers::required_string(prior, "name")?;
        let payload = Self::extract_update(plan)?;

        api.update(ctx, &name, &payload)
            .await
            .map_err(|e| helpers::api_error("updating", KIND, &e))?;
        let pool = api
            .get(ctx, &name)
            .await
            .map_err(|e| helpers::api_error("refreshing", KIND, &e))?;

        Self::to_state(&pool, plan)
    }

    async fn delete_pool(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), Diagnostic> {
        let api = self.api(prior)?;
        let name = helpers::required_string(prior, "name")?;

        match api.delete(ctx, &name).await {
            Err(e) if !e.is_not_found() => Err(helpers::api_error("deleting", KIND, &e)),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Resource for WorkPoolResource {
    fn type_name(&self) -> &str {
        "prefect_work_pool"
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
        match self.create_pool(&ctx, &request.planned_state).await {
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
        match self.read_pool(&ctx, &request.current_state).await {
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
            .update_pool(&ctx, &request.prior_state, &request.planned_state)
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
        if let Err(diag) = self.delete_pool(&ctx, &request.prior_state).await {
            diagnostics.push(diag);
        }
        DeleteResourceResponse { diagnostics }
    }

    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        helpers::import_scoped(&request, "name", "name,workspace_id")
    }
}

#[async_trait]
impl ResourceWithConfigure for WorkPoolResource {
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
