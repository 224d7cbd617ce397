//! Workspace API implementation (account scoped)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tfplug::context::Context;
use uuid::Uuid;

use super::client::{EXPECT_CREATED, EXPECT_NO_CONTENT, EXPECT_OK};
use super::{ApiError, Client};

#[derive(Debug, Clone, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub account_id: Option<Uuid>,
    pub name: String,
    pub handle: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorkspaceCreate {
    pub name: String,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `description: None` is sent as `null` and clears it.
#[derive(Debug, Default, Serialize)]
pub struct WorkspaceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub description: Option<String>,
}

pub struct WorkspacesApi<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> WorkspacesApi<'a> {
    pub fn new(client: &'a Client, base: String) -> Self {
        Self { client, base }
    }

    fn url(&self, workspace_id: Uuid) -> String {
        format!("{}/{}", self.base, workspace_id)
    }

    /// POST /accounts/{account_id}/workspaces/
    pub async fn create(
        &self,
        ctx: &Context,
        data: &WorkspaceCreate,
    ) -> Result<Workspace, ApiError> {
        let url = format!("{}/", self.base);
        self.client.post(ctx, &url, data, EXPECT_CREATED).await
    }

    /// GET /accounts/{account_id}/workspaces/{id}
    pub async fn get(&self, ctx: &Context, workspace_id: Uuid) -> Result<Workspace, ApiError> {
        self.client
            .get(ctx, &self.url(workspace_id), EXPECT_OK)
            .await
    }

    /// PATCH /accounts/{account_id}/workspaces/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        workspace_id: Uuid,
        data: &WorkspaceUpdate,
    ) -> Result<(), ApiError> {
        self.client
            .patch(ctx, &self.url(workspace_id), data, EXPECT_NO_CONTENT)
            .await
    }

    /// DELETE /accounts/{account_id}/workspaces/{id}
    pub async fn delete(&self, ctx: &Context, workspace_id: Uuid) -> Result<(), ApiError> {
        self.client
            .delete(ctx, &self.url(workspace_id), EXPECT_NO_CONTENT)
            .await
    }
}
