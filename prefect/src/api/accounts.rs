//! Account API implementation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tfplug::context::Context;
use uuid::Uuid;

use super::client::{EXPECT_NO_CONTENT, EXPECT_OK};
use super::{null_as_default, ApiError, Client};

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    pub handle: String,
    pub location: Option<String>,
    pub link: Option<String>,
    pub billing_email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub settings: AccountSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    pub allow_public_workspaces: bool,
    pub ai_log_summaries: bool,
    pub managed_execution: bool,
}

/// Request body for PATCH /accounts/{id}
///
/// `location` and `link` are always sent; `None` clears them.
#[derive(Debug, Default, Serialize)]
pub struct AccountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
}

/// Request body for PATCH /accounts/{id}/settings
#[derive(Debug, Serialize)]
pub struct AccountSettingsUpdate {
    pub settings: AccountSettings,
}

pub struct AccountsApi<'a> {
    client: &'a Client,
}

impl<'a> AccountsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn url(&self, account_id: Uuid) -> String {
        format!("{}/accounts/{}", self.client.endpoint(), account_id)
    }

    /// GET /accounts/{id}
    pub async fn get(&self, ctx: &Context, account_id: Uuid) -> Result<Account, ApiError> {
        self.client
            .get(ctx, &self.url(account_id), EXPECT_OK)
            .await
    }

    /// PATCH /accounts/{id}
    pub async fn update(
        &self,
        ctx: &Context,
        account_id: Uuid,
        data: &AccountUpdate,
    ) -> Result<(), ApiError> {
        self.client
            .patch(ctx, &self.url(account_id), data, EXPECT_NO_CONTENT)
            .await
    }

    /// PATCH /accounts/{id}/settings
    pub async fn update_settings(
        &self,
        ctx: &Context,
        account_id: Uuid,
        settings: &AccountSettings,
    ) -> Result<(), ApiError> {
        let url = format!("{}/settings", self.url(account_id));
        let body = AccountSettingsUpdate {
            settings: settings.clone(),
        };
        self.client
            .patch(ctx, &url, &body, EXPECT_NO_CONTENT)
            .await
    }

    /// DELETE /accounts/{id}
    pub async fn delete(&self, ctx: &Context, account_id: Uuid) -> Result<(), ApiError> {
        self.client
            .delete(ctx, &self.url(account_id), EXPECT_NO_CONTENT)
            .await
    }
}
