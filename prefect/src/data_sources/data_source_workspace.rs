//! Workspace data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::UuidValidator;

use crate::provider_data::PrefectProviderData;
use crate::resources::helpers;

#[derive(Default)]
pub struct WorkspaceDataSource {
    provider_data: Option<PrefectProviderData>,
}

impl WorkspaceDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_workspace(
        &self,
        ctx: &Context,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let provider_data = self
            .provider_data
            .as_ref()
            .ok_or_else(helpers::provider_not_configured)?;
        let workspace_id = helpers::required_uuid(config, "id", "Workspace")?;
        let account_id = helpers::optional_uuid(config, "account_id", "Account")?;

        let workspace = provider_data
            .client
            .workspaces(account_id)
            .map_err(|e| helpers::client_error("workspace", &e))?
            .get(ctx, workspace_id)
            .await
            .map_err(|e| helpers::api_error("refreshing", "workspace", &e))?;

        let account_id = workspace
            .account_id
            .or(account_id)
            .or(provider_data.client.default_account_id());

        Ok(helpers::object([
            ("id", Dynamic::String(workspace.id.to_string())),
            ("account_id", helpers::optional_uuid_value(account_id)),
            ("created", helpers::timestamp(workspace.created)),
            ("updated", helpers::timestamp(workspace.updated)),
            ("name", Dynamic::from(workspace.name.as_str())),
            ("handle", Dynamic::from(workspace.handle.as_str())),
            ("description", Dynamic::from(workspace.description.clone())),
        ]))
    }
}

#[async_trait]
impl DataSource for WorkspaceDataSource {
    fn type_name(&self) -> &str {
        "prefect_workspace"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Get information about a Prefect Cloud workspace")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Workspace ID (UUID)")
                    .required()
                    .validator(UuidValidator)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("account_id", AttributeType::String)
                    .description("Account ID (UUID), defaults to the account set in the provider")
                    .optional()
                    .computed()
                    .validator(UuidValidator)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("Timestamp of when the resource was created (RFC3339)")
                    .computed()
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
                    .description("Name of the workspace")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("handle", AttributeType::String)
                    .description("Unique handle for the workspace")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description for the workspace")
                    .computed()
                    .build(),
            )
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        match self.read_workspace(&ctx, &request.config).await {
            Ok(state) => ReadDataSourceResponse {
                state,
                diagnostics: vec![],
            },
            Err(diag) => ReadDataSourceResponse {
                state: request.config,
                diagnostics: vec![diag],
            },
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for WorkspaceDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        match PrefectProviderData::from_any(request.provider_data) {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}
