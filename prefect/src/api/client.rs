use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tfplug::context::Context;
use uuid::Uuid;

use super::accounts::AccountsApi;
use super::deployments::DeploymentsApi;
use super::error::ApiError;
use super::flows::FlowsApi;
use super::work_pools::WorkPoolsApi;
use super::workspaces::WorkspacesApi;

pub const PREFECT_CLOUD_HOST: &str = "api.prefect.cloud";

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub(crate) const EXPECT_OK: &[StatusCode] = &[StatusCode::OK];
pub(crate) const EXPECT_CREATED: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];
pub(crate) const EXPECT_NO_CONTENT: &[StatusCode] = &[StatusCode::OK, StatusCode::NO_CONTENT];

/// Prefect API client
///
/// Cloning is cheap; every clone shares the same connection pool.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
    account_id: Option<Uuid>,
    workspace_id: Option<Uuid>,
    cloud: bool,
}

impl Client {
    pub fn new(
        endpoint: &str,
        api_key: Option<&str>,
        account_id: Option<Uuid>,
        workspace_id: Option<Uuid>,
    ) -> Result<Self, ApiError> {
        let endpoint = normalize_endpoint(endpoint)?;
        let cloud = endpoint.host_str() == Some(PREFECT_CLOUD_HOST);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
                headers: default_headers(api_key)?,
                account_id,
                workspace_id,
                cloud,
            }),
        })
    }

    /// Base URL including the `/api` suffix
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub fn is_prefect_cloud(&self) -> bool {
        self.inner.cloud
    }

    pub fn default_account_id(&self) -> Option<Uuid> {
        self.inner.account_id
    }

    pub fn default_workspace_id(&self) -> Option<Uuid> {
        self.inner.workspace_id
    }

    /// `<endpoint>/accounts/<account_id>`, falling back to the provider account
    pub fn account_url(&self, account_id: Option<Uuid>) -> Result<String, ApiError> {
        let account_id = account_id.or(self.inner.account_id).ok_or_else(|| {
            ApiError::MissingScope(
                "an account ID is required; set account_id on the resource or in the provider configuration"
                    .to_string(),
            )
        })?;

        Ok(format!("{}/accounts/{}", self.inner.endpoint, account_id))
    }

    /// Builds the collection URL for a workspace-scoped resource.
    ///
    /// With both IDs known the URL is account/workspace scoped. A self-hosted
    /// server has no accounts, so the resource hangs off the endpoint directly.
    pub fn workspace_url(
        &self,
        account_id: Option<Uuid>,
        workspace_id: Option<Uuid>,
        resource: &str,
    ) -> Result<String, ApiError> {
        let account_id = account_id.or(self.inner.account_id);
        let workspace_id = workspace_id.or(self.inner.workspace_id);

        match (account_id, workspace_id) {
            (Some(account_id), Some(workspace_id)) => Ok(format!(
                "{}/accounts/{}/workspaces/{}/{}",
                self.inner.endpoint, account_id, workspace_id, resource
            )),
            _ if self.inner.cloud => Err(ApiError::MissingScope(format!(
                "account_id and workspace_id are required to manage {} in Prefect Cloud",
                resource
            ))),
            _ => Ok(format!("{}/{}", self.inner.endpoint, resource)),
        }
    }

    pub fn accounts(&self) -> AccountsApi<'_> {
        AccountsApi::new(self)
    }

    pub fn workspaces(&self, account_id: Option<Uuid>) -> Result<WorkspacesApi<'_>, ApiError> {
        let base = format!("{}/workspaces", self.account_url(account_id)?);
        Ok(WorkspacesApi::new(self, base))
    }

    pub fn flows(
        &self,
        account_id: Option<Uuid>,
        workspace_id: Option<Uuid>,
    ) -> Result<FlowsApi<'_>, ApiError> {
        let base = self.workspace_url(account_id, workspace_id, "flows")?;
        Ok(FlowsApi::new(self, base))
    }

    pub fn deployments(
        &self,
        account_id: Option<Uuid>,
        workspace_id: Option<Uuid>,
    ) -> Result<DeploymentsApi<'_>, ApiError> {
        let base = self.workspace_url(account_id, workspace_id, "deployments")?;
        Ok(DeploymentsApi::new(self, base))
    }

    pub fn work_pools(
        &self,
        account_id: Option<Uuid>,
        workspace_id: Option<Uuid>,
    ) -> Result<WorkPoolsApi<'_>, ApiError> {
        let base = self.workspace_url(account_id, workspace_id, "work_pools")?;
        Ok(WorkPoolsApi::new(self, base))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        url: &str,
        expected: &[StatusCode],
    ) -> Result<T, ApiError> {
        let body = self
            .execute(ctx, Method::GET, url, None::<&()>, expected)
            .await?;
        decode(&body)
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        url: &str,
        body: &B,
        expected: &[StatusCode],
    ) -> Result<T, ApiError> {
        let body = self
            .execute(ctx, Method::POST, url, Some(body), expected)
            .await?;
        decode(&body)
    }

    pub(crate) async fn patch<B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        url: &str,
        body: &B,
        expected: &[StatusCode],
    ) -> Result<(), ApiError> {
        self.execute(ctx, Method::PATCH, url, Some(body), expected)
            .await
            .map(|_| ())
    }

    pub(crate) async fn delete(
        &self,
        ctx: &Context,
        url: &str,
        expected: &[StatusCode],
    ) -> Result<(), ApiError> {
        self.execute(ctx, Method::DELETE, url, None::<&()>, expected)
            .await
            .map(|_| ())
    }

    /// Sends one request and returns the response body.
    ///
    /// Fails with `Cancelled` if `ctx` is cancelled before the response
    /// body has been read.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        method: Method,
        url: &str,
        body: Option<&B>,
        expected: &[StatusCode],
    ) -> Result<String, ApiError> {
        let mut request = self
            .inner
            .http
            .request(method.clone(), url)
            .headers(self.inner.headers.clone());

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(ApiError::Encode)?;
            request = request.body(bytes);
        }

        if ctx.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        tracing::debug!("{} request to: {}", method, url);

        tokio::select! {
            _ = ctx.cancelled() => {
                tracing::debug!("{} request to {} cancelled", method, url);
                Err(ApiError::Cancelled)
            }
            result = exchange(request, expected) => result,
        }
    }
}

async fn exchange(
    request: reqwest::RequestBuilder,
    expected: &[StatusCode],
) -> Result<String, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !expected.contains(&status) {
        tracing::error!("Unexpected status {}, body: {}", status, body);
        return Err(ApiError::UnexpectedStatus { status, body });
    }

    tracing::debug!("API response body: {}", body);
    Ok(body)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!("Failed to deserialize response: {}, body: {}", e, body);
        ApiError::Decode(e)
    })
}

/// Headers sent with every request: a bearer token when a key is
/// configured, and a JSON content type.
pub fn default_headers(api_key: Option<&str>) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|e| ApiError::InvalidApiKey(e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

/// Trims trailing slashes and appends `/api` unless already present
pub fn normalize_endpoint(raw: &str) -> Result<url::Url, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_api = if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{}/api", trimmed)
    };

    let invalid = |reason: String| ApiError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason,
    };

    let url = url::Url::parse(&with_api).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}
