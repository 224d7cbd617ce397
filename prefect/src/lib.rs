//! Terraform provider for Prefect
//!
//! Manages accounts, workspaces, flows, deployments and work pools in Prefect
//! Cloud or a self-hosted Prefect server.

pub mod api;
pub mod config;
pub mod data_sources;
pub mod logging;
pub mod provider_data;
pub mod resources;

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory,
};
use tfplug::resource::ResourceWithConfigure;

pub use config::ProviderConfig;
pub use provider_data::PrefectProviderData;

#[derive(Default)]
pub struct PrefectProvider {
    provider_data: Option<PrefectProviderData>,
}

impl PrefectProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The data handed out by the last successful `configure`
    pub fn provider_data(&self) -> Option<&PrefectProviderData> {
        self.provider_data.as_ref()
    }
}

#[async_trait]
impl Provider for PrefectProvider {
    fn type_name(&self) -> &str {
        "prefect"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: config::provider_schema(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        logging::init_logging();

        let resolved = match ProviderConfig::from_config(&request.config) {
            Ok(resolved) => resolved,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        };

        let client = match resolved.build_client() {
            Ok(client) => client,
            Err(diag) => {
                return ConfigureProviderResponse {
                    diagnostics: vec![diag],
                    provider_data: None,
                }
            }
        };

        tracing::info!(
            endpoint = client.endpoint(),
            cloud = client.is_prefect_cloud(),
            terraform_version = %request.terraform_version,
            "configured Prefect provider"
        );

        let data = PrefectProviderData::new(client);
        self.provider_data = Some(data.clone());

        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(data) as Arc<dyn Any + Send + Sync>),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();

        factories.insert(
            "prefect_account".to_string(),
            Box::new(|| {
                Box::new(resources::AccountResource::new()) as Box<dyn ResourceWithConfigure>
            }),
        );
        factories.insert(
            "prefect_workspace".to_string(),
            Box::new(|| {
                Box::new(resources::WorkspaceResource::new()) as Box<dyn ResourceWithConfigure>
            }),
        );
        factories.insert(
            "prefect_flow".to_string(),
            Box::new(|| Box::new(resources::FlowResource::new()) as Box<dyn ResourceWithConfigure>),
        );
        factories.insert(
            "prefect_deployment".to_string(),
            Box::new(|| {
                Box::new(resources::DeploymentResource::new()) as Box<dyn ResourceWithConfigure>
            }),
        );
        factories.insert(
            "prefect_work_pool".to_string(),
            Box::new(|| {
                Box::new(resources::WorkPoolResource::new()) as Box<dyn ResourceWithConfigure>
            }),
        );

        factories
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut factories: HashMap<String, DataSourceFactory> = HashMap::new();

        factories.insert(
            "prefect_account".to_string(),
            Box::new(|| {
                Box::new(data_sources::AccountDataSource::new()) as Box<dyn DataSourceWithConfigure>
            }),
        );
        factories.insert(
            "prefect_workspace".to_string(),
            Box::new(|| {
                Box::new(data_sources::WorkspaceDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );

        factories
    }
}
