//! Flow API implementation (workspace scoped)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tfplug::context::Context;
use uuid::Uuid;

use super::client::{EXPECT_CREATED, EXPECT_NO_CONTENT, EXPECT_OK};
use super::{null_as_default, ApiError, Client};

#[derive(Debug, Clone, Deserialize)]
pub struct Flow {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FlowCreate {
    pub name: String,
    pub tags: Vec<String>,
}

/// Only tags are mutable; renaming a flow means replacing it
#[derive(Debug, Serialize)]
pub struct FlowUpdate {
    pub tags: Vec<String>,
}

pub struct FlowsApi<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> FlowsApi<'a> {
    pub fn new(client: &'a Client, base: String) -> Self {
        Self { client, base }
    }

    fn url(&self, flow_id: Uuid) -> String {
        format!("{}/{}", self.base, flow_id)
    }

    /// POST /flows/
    pub async fn create(&self, ctx: &Context, data: &FlowCreate) -> Result<Flow, ApiError> {
        let url = format!("{}/", self.base);
        self.client.post(ctx, &url, data, EXPECT_CREATED).await
    }

    /// GET /flows/{id}
    pub async fn get(&self, ctx: &Context, flow_id: Uuid) -> Result<Flow, ApiError> {
        self.client.get(ctx, &self.url(flow_id), EXPECT_OK).await
    }

    /// PATCH /flows/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        flow_id: Uuid,
        data: &FlowUpdate,
    ) -> Result<(), ApiError> {
        self.client
            .patch(ctx, &self.url(flow_id), data, EXPECT_NO_CONTENT)
            .await
    }

    /// DELETE /flows/{id}
    pub async fn delete(&self, ctx: &Context, flow_id: Uuid) -> Result<(), ApiError> {
        self.client
            .delete(ctx, &self.url(flow_id), EXPECT_NO_CONTENT)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const FLOW_ID: &str = "5b4a6cda-4d41-4a33-8b9e-2a8e7b4f1c90";

    #[tokio::test]
    async fn self_hosted_flows_live_at_the_endpoint_root() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/api/flows/")
            .match_body(Matcher::Json(json!({"name": "etl", "tags": ["nightly"]})))
            .with_status(201)
            .with_body(json!({"id": FLOW_ID, "name": "etl", "tags": null}).to_string())
            .create_async()
            .await;
        let update = server
            .mock("PATCH", format!("/api/flows/{}", FLOW_ID).as_str())
            .match_body(Matcher::Json(json!({"tags": []})))
            .with_status(204)
            .create_async()
            .await;

        let client = Client::new(&server.url(), None, None, None).unwrap();
        let flows = client.flows(None, None).unwrap();
        let ctx = Context::new();

        let flow = flows
            .create(
                &ctx,
                &FlowCreate {
                    name: "etl".to_string(),
                    tags: vec!["nightly".to_string()],
                },
            )
            .await
            .unwrap();
        assert!(flow.tags.is_empty());

        flows
            .update(&ctx, flow.id, &FlowUpdate { tags: vec![] })
            .await
            .unwrap();

        create.assert_async().await;
        update.assert_async().await;
    }
}
