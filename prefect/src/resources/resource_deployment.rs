//! Deployment resource implementation
//!
//! Deployments live inside a workspace. In Prefect Cloud the workspace comes
//! from `account_id`/`workspace_id` on the resource or the provider defaults;
//! a self-hosted server has a single implicit workspace.

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
use tfplug::validator::{JsonValidator, UuidValidator};
use uuid::Uuid;

use super::helpers;
use crate::api::deployments::{Deployment, DeploymentCreate, DeploymentUpdate};
use crate::provider_data::PrefectProviderData;

const KIND: &str = "deployment";

#[derive(Default)]
pub struct DeploymentResource {
    provider_data: Option<PrefectProviderData>,
}

impl DeploymentResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description(
                "Deployments are server-side representations of flows. \
                 They store the crucial metadata needed for remote orchestration \
                 including when, where, and how a workflow should run.",
            )
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Deployment ID (UUID)")
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
                    .description("Workspace ID (UUID) to associate deployment to")
                    .optional()
                    .validator(UuidValidator)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the deployment")
                    .required()
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("flow_id", AttributeType::String)
                    .description("Flow ID (UUID) to associate deployment to")
                    .required()
                    .validator(UuidValidator)
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("paused", AttributeType::Bool)
                    .description("Whether or not the deployment is paused.")
                    .optional()
                    .computed()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enforce_parameter_schema", AttributeType::Bool)
                    .description("Whether or not the deployment should enforce the parameter schema.")
                    .optional()
                    .computed()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(optional_computed_string(
                "manifest_path",
                "The path to the flow's manifest file, relative to the chosen storage.",
            ))
            .attribute(optional_computed_string(
                "work_queue_name",
                "The work queue for the deployment. If no work queue is set, work will not be scheduled.",
            ))
            .attribute(optional_computed_string(
                "work_pool_name",
                "The name of the deployment's work pool.",
            ))
            .attribute(optional_computed_string(
                "description",
                "A description for the deployment.",
            ))
            .attribute(optional_computed_string(
                "path",
                "The path to the working directory for the workflow, relative to remote storage or an absolute path.",
            ))
            .attribute(optional_computed_string(
                "version",
                "An optional version for the deployment.",
            ))
            .attribute(optional_computed_string(
                "entrypoint",
                "The path to the entrypoint for the workflow, relative to the path.",
            ))
            .attribute(
                AttributeBuilder::new("tags", AttributeType::list_of(AttributeType::String))
                    .description("Tags associated with the deployment")
                    .optional()
                    .computed()
                    .default(StaticDefault::empty_list())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("parameters", AttributeType::String)
                    .description(
                        "Parameters for flow runs scheduled by the deployment, as a JSON object string.",
                    )
                    .optional()
                    .computed()
                    .validator(JsonValidator::object())
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .build()
    }

    /// Builds the state for `deployment`. The scope attributes are echoed from
    /// `source` since the API does not return them.
    fn to_state(
        deployment: &Deployment,
        source: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let prior_parameters = helpers::optional_string(source, "parameters").ok().flatten();
        let parameters = helpers::normalized_json(
            prior_parameters.as_deref(),
            &deployment.parameters,
            "parameters",
        )?;

        Ok(helpers::object([
            ("id", Dynamic::String(deployment.id.to_string())),
            ("created", helpers::timestamp(deployment.created)),
            ("updated", helpers::timestamp(deployment.updated)),
            ("account_id", helpers::carry(source, "account_id")),
            ("workspace_id", helpers::carry(source, "workspace_id")),
            ("name", Dynamic::from(deployment.name.as_str())),
            ("flow_id", Dynamic::String(deployment.flow_id.to_string())),
            ("paused", Dynamic::Bool(deployment.paused)),
            (
                "enforce_parameter_schema",
                Dynamic::Bool(deployment.enforce_parameter_schema),
            ),
            ("manifest_path", Dynamic::from(deployment.manifest_path.as_str())),
            ("work_queue_name", Dynamic::from(deployment.work_queue_name.as_str())),
            ("work_pool_name", Dynamic::from(deployment.work_pool_name.as_str())),
            ("description", Dynamic::from(deployment.description.as_str())),
            ("path", Dynamic::from(deployment.path.as_str())),
            ("version", Dynamic::from(deployment.version.as_str())),
            ("entrypoint", Dynamic::from(deployment.entrypoint.as_str())),
            ("tags", helpers::strings(&deployment.tags)),
            ("parameters", parameters),
        ]))
    }

    fn extract_create(plan: &DynamicValue) -> Result<DeploymentCreate, Diagnostic> {
        let update = Self::extract_update(plan)?;

        Ok(DeploymentCreate {
            name: helpers::required_string(plan, "name")?,
            flow_id: helpers::required_uuid(plan, "flow_id", "Flow")?,
            description: update.description,
            enforce_parameter_schema: update.enforce_parameter_schema,
            entrypoint: update.entrypoint,
            manifest_path: update.manifest_path,
            parameters: update.parameters,
            path: update.path,
            paused: update.paused,
            tags: update.tags,
            version: update.version,
            work_pool_name: update.work_pool_name,
            work_queue_name: update.work_queue_name,
        })
    }

    fn extract_update(plan: &DynamicValue) -> Result<DeploymentUpdate, Diagnostic> {
        Ok(DeploymentUpdate {
            description: helpers::optional_string(plan, "description")?,
            enforce_parameter_schema: helpers::optional_bool(plan, "enforce_parameter_schema")?
                .unwrap_or(false),
            entrypoint: helpers::optional_string(plan, "entrypoint")?,
            manifest_path: helpers::optional_string(plan, "manifest_path")?,
            parameters: helpers::json_object(plan, "parameters")?,
            path: helpers::optional_string(plan, "path")?,
            paused: helpers::optional_bool(plan, "paused")?.unwrap_or(false),
            tags: helpers::string_list(plan, "tags")?,
            version: helpers::optional_string(plan, "version")?,
            work_pool_name: helpers::optional_string(plan, "work_pool_name")?,
            work_queue_name: helpers::optional_string(plan, "work_queue_name")?,
        })
    }

    fn deployment_id(state: &DynamicValue) -> Result<Uuid, Diagnostic> {
        helpers::required_uuid(state, "id", "Deployment")
    }
}

fn optional_computed_string(name: &str, description: &str) -> tfplug::schema::Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .computed()
        .plan_modifier(UseStateForUnknown)
        .build()
}

#[async_trait]
impl Resource for DeploymentResource {
    fn type_name(&self) -> &str {
        "prefect_deployment"
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
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(helpers::provider_not_configured());
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics,
            };
        };

        let prepared = helpers::scope(&request.planned_state).and_then(|scope| {
            Self::extract_create(&request.planned_state).map(|payload| (scope, payload))
        });
        let ((account_id, workspace_id), payload) = match prepared {
            Ok(prepared) => prepared,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let api = match provider_data.client.deployments(account_id, workspace_id) {
            Ok(api) => api,
            Err(e) => {
                diagnostics.push(helpers::client_error(KIND, &e));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        tracing::debug!(name = %payload.name, flow_id = %payload.flow_id, "creating deployment");
        match api.create(&ctx, &payload).await {
            Ok(deployment) => match Self::to_state(&deployment, &request.planned_state) {
                Ok(new_state) => CreateResourceResponse {
                    new_state,
                    diagnostics,
                },
                Err(diag) => {
                    diagnostics.push(diag);
                    CreateResourceResponse {
                        new_state: request.planned_state,
                        diagnostics,
                    }
                }
            },
            Err(e) => {
                diagnostics.push(helpers::api_error("creating", KIND, &e));
                CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                }
            }
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

        let prepared = Self::deployment_id(&request.current_state).and_then(|id| {
            helpers::scope(&request.current_state).map(|scope| (id, scope))
        });
        let (deployment_id, (account_id, workspace_id)) = match prepared {
            Ok(prepared) => prepared,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        let api = match provider_data.client.deployments(account_id, workspace_id) {
            Ok(api) => api,
            Err(e) => {
                diagnostics.push(helpers::client_error(KIND, &e));
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        match api.get(&ctx, deployment_id).await {
            Ok(deployment) => match Self::to_state(&deployment, &request.current_state) {
                Ok(new_state) => ReadResourceResponse {
                    new_state: Some(new_state),
                    diagnostics,
                },
                Err(diag) => {
                    diagnostics.push(diag);
                    ReadResourceResponse {
                        new_state: Some(request.current_state),
                        diagnostics,
                    }
                }
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!(%deployment_id, "deployment no longer exists, removing from state");
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Error refreshing deployment state",
                    format!("Could not read Deployment, unexpected error: {}", e),
                ));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(helpers::provider_not_configured());
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        };

        let prepared = Self::deployment_id(&request.prior_state).and_then(|id| {
            let scope = helpers::scope(&request.planned_state)?;
            let payload = Self::extract_update(&request.planned_state)?;
            Ok((id, scope, payload))
        });
        let (deployment_id, (account_id, workspace_id), payload) = match prepared {
            Ok(prepared) => prepared,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let api = match provider_data.client.deployments(account_id, workspace_id) {
            Ok(api) => api,
            Err(e) => {
                diagnostics.push(helpers::client_error(KIND, &e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        if let Err(e) = api.update(&ctx, deployment_id, &payload).await {
            diagnostics.push(helpers::api_error("updating", KIND, &e));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        match api.get(&ctx, deployment_id).await {
            Ok(deployment) => match Self::to_state(&deployment, &request.planned_state) {
                Ok(new_state) => UpdateResourceResponse {
                    new_state,
                    diagnostics,
                },
                Err(diag) => {
                    diagnostics.push(diag);
                    UpdateResourceResponse {
                        new_state: request.planned_state,
                        diagnostics,
                    }
                }
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Error refreshing deployment state",
                    format!("Could not read Deployment, unexpected error: {}", e),
                ));
                UpdateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                }
            }
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(helpers::provider_not_configured());
            return DeleteResourceResponse { diagnostics };
        };

        let prepared = Self::deployment_id(&request.prior_state).and_then(|id| {
            helpers::scope(&request.prior_state).map(|scope| (id, scope))
        });
        let (deployment_id, (account_id, workspace_id)) = match prepared {
            Ok(prepared) => prepared,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        let api = match provider_data.client.deployments(account_id, workspace_id) {
            Ok(api) => api,
            Err(e) => {
                diagnostics.push(helpers::client_error(KIND, &e));
                return DeleteResourceResponse { diagnostics };
            }
        };

        match api.delete(&ctx, deployment_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(%deployment_id, "deployment already deleted");
            }
            Err(e) => diagnostics.push(Diagnostic::error(
                "Error deleting Deployment",
                format!("Could not delete Deployment, unexpected error: {}", e),
            )),
        }

        DeleteResourceResponse { diagnostics }
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
impl ResourceWithConfigure for DeploymentResource {
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

#[cfg(test)]
#[path = "./resource_deployment_test.rs"]
mod resource_deployment_test;
