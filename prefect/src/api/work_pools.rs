//! Work pool API implementation (workspace scoped, keyed by name)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tfplug::context::Context;
use uuid::Uuid;

use super::client::{EXPECT_CREATED, EXPECT_NO_CONTENT, EXPECT_OK};
use super::{null_as_default, ApiError, Client};

pub const DEFAULT_WORK_POOL_TYPE: &str = "prefect-agent";

#[derive(Debug, Clone, Deserialize)]
pub struct WorkPool {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub pool_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub base_job_template: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_paused: bool,
    pub concurrency_limit: Option<i64>,
    pub default_queue_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct WorkPoolCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub pool_type: String,
    pub base_job_template: Map<String, Value>,
    pub is_paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_limit: Option<i64>,
}

/// Name and type are immutable. `None` for the description or the
/// concurrency limit clears it.
#[derive(Debug, Serialize)]
pub struct WorkPoolUpdate {
    pub description: Option<String>,
    pub is_paused: bool,
    pub base_job_template: Map<String, Value>,
    pub concurrency_limit: Option<i64>,
}

pub struct WorkPoolsApi<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> WorkPoolsApi<'a> {
    pub fn new(client: &'a Client, base: String) -> Self {
        Self { client, base }
    }

    fn url(&self, name: &str) -> String {
        format!("{}/{}", self.base, urlencoding::encode(name))
    }

    /// POST /work_pools/
    pub async fn create(&self, ctx: &Context, data: &WorkPoolCreate) -> Result<WorkPool, ApiError> {
        let url = format!("{}/", self.base);
        self.client.post(ctx, &url, data, EXPECT_CREATED).await
    }

    /// GET /work_pools/{name}
    pub async fn get(&self, ctx: &Context, name: &str) -> Result<WorkPool, ApiError> {
        self.client.get(ctx, &self.url(name), EXPECT_OK).await
    }

    /// PATCH /work_pools/{name}
    pub async fn update(
        &self,
        ctx: &Context,
        name: &str,
        data: &WorkPoolUpdate,
    ) -> Result<(), ApiError> {
        self.client
            .patch(ctx, &self.url(name), data, EXPECT_NO_CONTENT)
            .await
    }

    /// DELETE /work_pools/{name}
    pub async fn delete(&self, ctx: &Context, name: &str) -> Result<(), ApiError> {
        self.client
            .delete(ctx, &self.url(name), EXPECT_NO_CONTENT)
            .await
    }
}
