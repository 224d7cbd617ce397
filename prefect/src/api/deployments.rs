//! Deployment API implementation (workspace scoped)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tfplug::context::Context;
use uuid::Uuid;

use super::client::{EXPECT_CREATED, EXPECT_NO_CONTENT, EXPECT_OK};
use super::{null_as_default, ApiError, Client};

/// Deployment as returned by the API. Nullable strings decode to "".
#[derive(Debug, Clone, Deserialize)]
pub struct Deployment {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    pub flow_id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enforce_parameter_schema: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entrypoint: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub manifest_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub paused: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub work_pool_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub work_queue_name: String,
}

/// Request body for POST /deployments/
#[derive(Debug, Serialize)]
pub struct DeploymentCreate {
    pub name: String,
    pub flow_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enforce_parameter_schema: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<String>,
    pub parameters: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub paused: bool,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_pool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_queue_name: Option<String>,
}

/// Request body for PATCH /deployments/{id}; name and flow are immutable
#[derive(Debug, Serialize)]
pub struct DeploymentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enforce_parameter_schema: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<String>,
    pub parameters: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub paused: bool,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_pool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_queue_name: Option<String>,
}

pub struct DeploymentsApi<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> DeploymentsApi<'a> {
    pub fn new(client: &'a Client, base: String) -> Self {
        Self { client, base }
    }

    fn url(&self, deployment_id: Uuid) -> String {
        format!("{}/{}", self.base, deployment_id)
    }

    /// POST /deployments/
    pub async fn create(
        &self,
        ctx: &Context,
        data: &DeploymentCreate,
    ) -> Result<Deployment, ApiError> {
        let url = format!("{}/", self.base);
        self.client.post(ctx, &url, data, EXPECT_CREATED).await
    }

    /// GET /deployments/{id}
    pub async fn get(&self, ctx: &Context, deployment_id: Uuid) -> Result<Deployment, ApiError> {
        self.client
            .get(ctx, &self.url(deployment_id), EXPECT_OK)
            .await
    }

    /// PATCH /deployments/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        deployment_id: Uuid,
        data: &DeploymentUpdate,
    ) -> Result<(), ApiError> {
        self.client
            .patch(ctx, &self.url(deployment_id), data, EXPECT_NO_CONTENT)
            .await
    }

    /// DELETE /deployments/{id}
    pub async fn delete(&self, ctx: &Context, deployment_id: Uuid) -> Result<(), ApiError> {
        self.client
            .delete(ctx, &self.url(deployment_id), EXPECT_NO_CONTENT)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nullable_fields_decode_to_defaults() {
        let deployment: Deployment = serde_json::from_value(json!({
            "id": "7d9f0c4e-0f0a-4a39-9a1e-1d5c3f3b7a11",
            "name": "nightly",
            "flow_id": "5b4a6cda-4d41-4a33-8b9e-2a8e7b4f1c90",
            "description": null,
            "parameters": null,
            "tags": null,
            "work_pool_name": "k8s"
        }))
        .unwrap();

        assert_eq!(deployment.description, "");
        assert!(deployment.parameters.is_empty());
        assert!(deployment.tags.is_empty());
        assert_eq!(deployment.work_pool_name, "k8s");
        assert!(!deployment.paused);
        assert!(deployment.created.is_none());
    }

    #[test]
    fn create_payload_omits_unset_optionals() {
        let payload = DeploymentCreate {
            name: "nightly".to_string(),
            flow_id: Uuid::parse_str("5b4a6cda-4d41-4a33-8b9e-2a8e7b4f1c90").unwrap(),
            description: None,
            enforce_parameter_schema: false,
            entrypoint: Some("flows/etl.py:run".to_string()),
            manifest_path: None,
            parameters: Map::new(),
            path: None,
            paused: true,
            tags: vec!["prod".to_string()],
            version: None,
            work_pool_name: None,
            work_queue_name: None,
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "name": "nightly",
                "flow_id": "5b4a6cda-4d41-4a33-8b9e-2a8e7b4f1c90",
                "enforce_parameter_schema": false,
                "entrypoint": "flows/etl.py:run",
                "parameters": {},
                "paused": true,
                "tags": ["prod"]
            })
        );
    }
}
