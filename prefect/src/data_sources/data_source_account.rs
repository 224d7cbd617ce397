//! Account data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::UuidValidator;
use uuid::Uuid;

use crate::provider_data::PrefectProviderData;
use crate::resources::helpers;
use crate::resources::AccountResource;

#[derive(Default)]
pub struct AccountDataSource {
    provider_data: Option<PrefectProviderData>,
}

impl AccountDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_account(
        &self,
        ctx: &Context,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let provider_data = self
            .provider_data
            .as_ref()
            .ok_or_else(helpers::provider_not_configured)?;

        let account_id = match helpers::optional_uuid(config, "id", "Account")? {
            Some(id) => id,
            None => default_account(provider_data)?,
        };

        let account = provider_data
            .client
            .accounts()
            .get(ctx, account_id)
            .await
            .map_err(|e| helpers::api_error("refreshing", "account", &e))?;

        Ok(AccountResource::to_state(&account))
    }
}

fn default_account(provider_data: &PrefectProviderData) -> Result<Uuid, Diagnostic> {
    provider_data.client.default_account_id().ok_or_else(|| {
        Diagnostic::attribute_error(
            AttributePath::new("id"),
            "Missing account ID",
            "Set id on the data source or account_id in the provider configuration",
        )
    })
}

#[async_trait]
impl DataSource for AccountDataSource {
    fn type_name(&self) -> &str {
        "prefect_account"
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
        let computed_string = |name: &str, description: &str| {
            AttributeBuilder::new(name, AttributeType::String)
                .description(description)
                .computed()
                .build()
        };

        let schema = SchemaBuilder::new()
            .version(0)
            .description("Get information about a Prefect Cloud account")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Account ID (UUID), defaults to the account set in the provider")
                    .optional()
                    .computed()
                    .validator(UuidValidator)
                    .build(),
            )
            .attribute(computed_string("created", "Timestamp of when the resource was created (RFC3339)"))
            .attribute(computed_string("updated", "Timestamp of when the resource was updated (RFC3339)"))
            .attribute(computed_string("name", "Name of the account"))
            .attribute(computed_string("handle", "Unique handle of the account"))
            .attribute(computed_string("location", "Physical location of the account"))
            .attribute(computed_string("link", "External URL associated with the account"))
            .attribute(computed_string("billing_email", "Billing email of the account"))
            .attribute(
                AttributeBuilder::new(
                    "settings",
                    AttributeType::object([
                        ("allow_public_workspaces", AttributeType::Bool),
                        ("ai_log_summaries", AttributeType::Bool),
                        ("managed_execution", AttributeType::Bool),
                    ]),
                )
                .description("Account-wide feature toggles")
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
        match self.read_account(&ctx, &request.config).await {
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
impl DataSourceWithConfigure for AccountDataSource {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Client;
    use mockito::Server;
    use serde_json::json;
    use std::any::Any;
    use std::sync::Arc;
    use tfplug::types::Dynamic;

    const ACCOUNT_ID: &str = "3c2ab1a4-2f4b-4d6b-9d5e-5a4f6f0d1c01";

    async fn configured(endpoint: &str, account_id: Option<Uuid>) -> AccountDataSource {
        let client = Client::new(endpoint, Some("pnu_test"), account_id, None).unwrap();
        let data: Arc<dyn Any + Send + Sync> = Arc::new(PrefectProviderData::new(client));
        let mut data_source = AccountDataSource::new();
        let response = data_source
            .configure(
                Context::new(),
                ConfigureDataSourceRequest {
                    provider_data: Some(data),
                },
            )
            .await;
        assert!(response.diagnostics.is_empty());
        data_source
    }

    #[tokio::test]
    async fn reads_provider_account_by_default() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", format!("/api/accounts/{}", ACCOUNT_ID).as_str())
            .with_status(200)
            .with_body(
                json!({
                    "id": ACCOUNT_ID,
                    "name": "Acme",
                    "handle": "acme",
                    "settings": null
                })
                .to_string(),
            )
            .create_async()
            .await;

        let data_source =
            configured(&server.url(), Some(Uuid::parse_str(ACCOUNT_ID).unwrap())).await;
        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "prefect_account".to_string(),
                    config: helpers::object([("id", Dynamic::Null)]),
                },
            )
            .await;

        mock.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            response.state.get_string(&AttributePath::new("handle")).unwrap(),
            "acme"
        );
        assert_eq!(
            response
                .state
                .get_bool(&AttributePath::new("settings").attribute("managed_execution"))
                .unwrap(),
            false
        );
    }

    #[tokio::test]
    async fn requires_an_account_id() {
        let data_source = configured("http://localhost:4200", None).await;
        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "prefect_account".to_string(),
                    config: DynamicValue::object(),
                },
            )
            .await;

        assert_eq!(response.diagnostics[0].summary, "Missing account ID");
    }
}
