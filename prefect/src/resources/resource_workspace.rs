//! Workspace resource implementation

use async_trait::async_trait;
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
use tfplug::validator::{StringLengthValidator, UuidValidator};

use super::helpers;
use crate::api::workspaces::{Workspace, WorkspaceCreate, WorkspaceUpdate, WorkspacesApi};
use crate::provider_data::PrefectProviderData;

const KIND: &str = "workspace";

#[derive(Default)]
pub struct WorkspaceResource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkspaceResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Resource representing a Prefect Cloud workspace")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Workspace ID (UUID)")
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
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the workspace")
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("handle", AttributeType::String)
                    .description("Unique handle for the workspace")
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description for the workspace")
                    .optional()
                    .build(),
            )
            .build()
    }

    fn to_state(workspace: &Workspace, source: &DynamicValue) -> DynamicValue {
        helpers::object([
            ("id", Dynamic::String(workspace.id.to_string())),
            ("created", helpers::timestamp(workspace.created)),
            ("updated", helpers::timestamp(workspace.updated)),
            ("account_id", helpers::carry(source, "account_id")),
            ("name", Dynamic::from(workspace.name.as_str())),
            ("handle", Dynamic::from(workspace.handle.as_str())),
            ("description", Dynamic::from(workspace.description.clone())),
        ])
    }

    fn api<'a>(&'a self, state: &DynamicValue) -> Result<WorkspacesApi<'a>, Diagnostic> {
        let provider_data = self
            .provider_data
            .as_ref()
            .ok_or_else(helpers::provider_not_configured)?;
        let account_id = helpers::optional_uuid(state, "account_id", "Account")?;

        provider_data
            .client
            .workspaces(account_id)
            .map_err(|e| helpers::client_error(KIND, &e))
    }
}

#[async_trait]
impl Resource for WorkspaceResource {
    fn type_name(&self) -> &str {
        "prefect_workspace"
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
        let plan = &request.planned_state;
        let result = async {
            let api = self.api(plan)?;
            let payload = WorkspaceCreate {
                name: helpers::required_string(plan, "name")?,
                handle: helpers::required_string(plan, "handle")?,
                description: helpers::optional_string(plan, "description")?,
            };

            tracing::debug!(handle = %payload.handle, "creating workspace");
            let workspace = api
                .create(&ctx, &payload)
                .await
                .map_err(|e| helpers::api_error("creating", KIND, &e))?;
            Ok::<_, Diagnostic>(Self::to_state(&workspace, plan))
        }
        .await;

        match result {
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
        let state = &request.current_state;
        let result = async {
            let api = self.api(state)?;
            let workspace_id = helpers::required_uuid(state, "id", "Workspace")?;

            match api.get(&ctx, workspace_id).await {
                Ok(workspace) => Ok(Some(Self::to_state(&workspace, state))),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(%workspace_id, "workspace no longer exists, removing from state");
                    Ok(None)
                }
                Err(e) => Err(helpers::api_error("refreshing", KIND, &e)),
            }
        }
        .await;

        match result {
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
        let plan = &request.planned_state;
        let result = async {
            let api = self.api(plan)?;
            let workspace_id = helpers::required_uuid(&request.prior_state, "id", "Workspace")?;
            let payload = WorkspaceUpdate {
                name: helpers::optional_string(plan, "name")?,
                handle: helpers::optional_string(plan, "handle")?,
                description: helpers::optional_string(plan, "description")?,
            };

            api.update(&ctx, workspace_id, &payload)
                .await
                .map_err(|e| helpers::api_error("updating", KIND, &e))?;
            let workspace = api
                .get(&ctx, workspace_id)
                .await
                .map_err(|e| helpers::api_error("refreshing", KIND, &e))?;
            Ok::<_, Diagnostic>(Self::to_state(&workspace, plan))
        }
        .await;

        match result {
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
        let prior = &request.prior_state;
        let result = async {
            let api = self.api(prior)?;
            let workspace_id = helpers::required_uuid(prior, "id", "Workspace")?;

            match api.delete(&ctx, workspace_id).await {
                Err(e) if !e.is_not_found() => Err(helpers::api_error("deleting", KIND, &e)),
                _ => Ok(()),
            }
        }
        .await;

        DeleteResourceResponse {
            diagnostics: result.err().into_iter().collect(),
        }
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
impl ResourceWithConfigure for WorkspaceResource {
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
