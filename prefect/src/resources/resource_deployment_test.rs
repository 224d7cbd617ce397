use super::*;
use crate::api::Client;
use crate::resources::helpers::object;
use mockito::{Matcher, Server};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tfplug::types::AttributePath;

const DEPLOYMENT_ID: &str = "7d9f0c4e-0f0a-4a39-9a1e-1d5c3f3b7a11";
const FLOW_ID: &str = "5b4a6cda-4d41-4a33-8b9e-2a8e7b4f1c90";

async fn configured(endpoint: &str, api_key: Option<&str>) -> DeploymentResource {
    let client = Client::new(endpoint, api_key, None, None).unwrap();
    let data: Arc<dyn Any + Send + Sync> = Arc::new(PrefectProviderData::new(client));

    let mut resource = DeploymentResource::new();
    let response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(data),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    resource
}

fn deployment_body(paused: bool) -> String {
    json!({
        "id": DEPLOYMENT_ID,
        "created": "2024-03-01T10:00:00Z",
        "updated": "2024-03-01T10:05:00Z",
        "name": "nightly",
        "flow_id": FLOW_ID,
        "description": null,
        "enforce_parameter_schema": false,
        "entrypoint": "flows/etl.py:run",
        "manifest_path": null,
        "parameters": {"limit": 10, "source": "s3"},
        "path": "/opt/flows",
        "paused": paused,
        "tags": ["prod"],
        "version": "1.0.0",
        "work_pool_name": "k8s",
        "work_queue_name": "default"
    })
    .to_string()
}

fn planned_state() -> DynamicValue {
    object([
        ("id", Dynamic::Unknown),
        ("created", Dynamic::Unknown),
        ("updated", Dynamic::Unknown),
        ("account_id", Dynamic::Null),
        ("workspace_id", Dynamic::Null),
        ("name", Dynamic::from("nightly")),
        ("flow_id", Dynamic::from(FLOW_ID)),
        ("paused", Dynamic::Bool(false)),
        ("enforce_parameter_schema", Dynamic::Bool(false)),
        ("manifest_path", Dynamic::Unknown),
        ("work_queue_name", Dynamic::from("default")),
        ("work_pool_name", Dynamic::from("k8s")),
        ("description", Dynamic::Unknown),
        ("path", Dynamic::Unknown),
        ("version", Dynamic::Unknown),
        ("entrypoint", Dynamic::from("flows/etl.py:run")),
        ("tags", Dynamic::List(vec![Dynamic::from("prod")])),
        ("parameters", Dynamic::from(r#"{ "source": "s3", "limit": 10 }"#)),
    ])
}

fn current_state() -> DynamicValue {
    object([
        ("id", Dynamic::from(DEPLOYMENT_ID)),
        ("name", Dynamic::from("nightly")),
        ("flow_id", Dynamic::from(FLOW_ID)),
        ("parameters", Dynamic::from(r#"{"limit":10,"source":"s3"}"#)),
    ])
}

fn string_at(state: &DynamicValue, attr: &str) -> String {
    state.get_string(&AttributePath::new(attr)).unwrap()
}

#[test]
fn test_resource_type_name() {
    assert_eq!(DeploymentResource::new().type_name(), "prefect_deployment");
}

#[tokio::test]
async fn test_resource_schema() {
    let response = DeploymentResource::new()
        .schema(Context::new(), ResourceSchemaRequest)
        .await;
    let schema = response.schema;

    assert!(response.diagnostics.is_empty());
    assert!(schema.attribute("name").unwrap().required);
    assert!(schema.attribute("flow_id").unwrap().required);
    assert!(schema.attribute("id").unwrap().computed);
    assert!(schema.attribute("paused").unwrap().default.is_some());
    assert!(schema.attribute("tags").unwrap().default.is_some());
    let version = schema.attribute("version").unwrap();
    assert!(version.optional && version.computed);
}

#[tokio::test]
async fn test_create_without_provider_data() {
    let response = DeploymentResource::new()
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "prefect_deployment".to_string(),
                planned_state: planned_state(),
                config: planned_state(),
            },
        )
        .await;

    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
}

#[tokio::test]
async fn test_create_posts_payload_and_maps_response() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/deployments/")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "name": "nightly",
            "flow_id": FLOW_ID,
            "paused": false,
            "tags": ["prod"],
            "parameters": {"source": "s3", "limit": 10},
            "work_pool_name": "k8s"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(deployment_body(false))
        .create_async()
        .await;

    let resource = configured(&server.url(), None).await;
    let response = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "prefect_deployment".to_string(),
                planned_state: planned_state(),
                config: planned_state(),
            },
        )
        .await;

    mock.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

    let state = response.new_state;
    assert_eq!(string_at(&state, "id"), DEPLOYMENT_ID);
    assert_eq!(string_at(&state, "created"), "2024-03-01T10:00:00Z");
    assert_eq!(string_at(&state, "description"), "");
    assert_eq!(string_at(&state, "manifest_path"), "");
    assert_eq!(string_at(&state, "version"), "1.0.0");
    // Semantically equal JSON keeps the configured text
    assert_eq!(
        string_at(&state, "parameters"),
        r#"{ "source": "s3", "limit": 10 }"#
    );
    assert!(state.get(&AttributePath::new("workspace_id")).unwrap().is_null());
}

#[tokio::test]
async fn test_create_reports_status_errors() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/deployments/")
        .with_status(422)
        .with_body(r#"{"detail":"flow not found"}"#)
        .create_async()
        .await;

    let resource = configured(&server.url(), None).await;
    let response = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "prefect_deployment".to_string(),
                planned_state: planned_state(),
                config: planned_state(),
            },
        )
        .await;

    let diag = &response.diagnostics[0];
    assert_eq!(diag.summary, "Error creating deployment");
    assert!(diag.detail.contains("422"));
    assert!(diag.detail.contains("flow not found"));
}

fn planned_with_parameters(parameters: Dynamic) -> DynamicValue {
    let mut plan = planned_state();
    plan.set_value(&AttributePath::new("parameters"), parameters)
        .unwrap();
    plan
}

#[tokio::test]
async fn test_create_sends_empty_parameters_when_unknown() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/deployments/")
        .match_body(Matcher::Regex(r#""parameters":\{\}"#.to_string()))
        .with_status(201)
        .with_body(deployment_body(false))
        .create_async()
        .await;

    let plan = planned_with_parameters(Dynamic::Unknown);
    let resource = configured(&server.url(), None).await;
    let response = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "prefect_deployment".to_string(),
                planned_state: plan.clone(),
                config: plan,
            },
        )
        .await;

    mock.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let parameters: serde_json::Value =
        serde_json::from_str(&string_at(&response.new_state, "parameters")).unwrap();
    assert_eq!(parameters, json!({"limit": 10, "source": "s3"}));
}

#[tokio::test]
async fn test_create_rejects_non_object_parameters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/deployments/")
        .expect(0)
        .create_async()
        .await;

    let plan = planned_with_parameters(Dynamic::from("[1]"));
    let resource = configured(&server.url(), None).await;
    let response = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "prefect_deployment".to_string(),
                planned_state: plan.clone(),
                config: plan,
            },
        )
        .await;

    mock.assert_async().await;
    assert_eq!(response.diagnostics.len(), 1);
    let diag = &response.diagnostics[0];
    assert_eq!(diag.attribute, Some(AttributePath::new("parameters")));
    assert!(diag.detail.contains("must be a JSON object"));
}

#[tokio::test]
async fn test_create_in_cloud_requires_scope() {
    let resource = configured("https://api.prefect.cloud", Some("pnu_test")).await;
    let response = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "prefect_deployment".to_string(),
                planned_state: planned_state(),
                config: planned_state(),
            },
        )
        .await;

    assert_eq!(response.diagnostics[0].summary, "Error creating deployment client");
}

#[tokio::test]
async fn test_read_refreshes_state() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/api/deployments/{}", DEPLOYMENT_ID).as_str())
        .with_status(200)
        .with_body(deployment_body(true))
        .create_async()
        .await;

    let resource = configured(&server.url(), None).await;
    let response = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "prefect_deployment".to_string(),
                current_state: current_state(),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty());
    let state = response.new_state.unwrap();
    assert_eq!(state.get_bool(&AttributePath::new("paused")).unwrap(), true);
    assert_eq!(string_at(&state, "work_queue_name"), "default");
    assert_eq!(string_at(&state, "parameters"), r#"{"limit":10,"source":"s3"}"#);
}

#[tokio::test]
async fn test_read_missing_deployment_removes_state() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/api/deployments/{}", DEPLOYMENT_ID).as_str())
        .with_status(404)
        .with_body(r#"{"detail":"Deployment not found."}"#)
        .create_async()
        .await;

    let resource = configured(&server.url(), None).await;
    let response = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "prefect_deployment".to_string(),
                current_state: current_state(),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty());
    assert!(response.new_state.is_none());
}

#[tokio::test]
async fn test_read_server_error_keeps_state() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/api/deployments/{}", DEPLOYMENT_ID).as_str())
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let resource = configured(&server.url(), None).await;
    let response = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "prefect_deployment".to_string(),
                current_state: current_state(),
            },
        )
        .await;

    assert_eq!(response.diagnostics[0].summary, "Error refreshing deployment state");
    assert!(response.diagnostics[0].detail.contains("500"));
    assert_eq!(response.new_state, Some(current_state()));
}

#[tokio::test]
async fn test_read_rejects_invalid_id() {
    let resource = configured("http://localhost:4200", None).await;
    let response = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "prefect_deployment".to_string(),
                current_state: object([("id", Dynamic::from("not-a-uuid"))]),
            },
        )
        .await;

    let diag = &response.diagnostics[0];
    assert_eq!(diag.summary, "Error parsing Deployment ID");
    assert!(diag
        .detail
        .starts_with("Could not parse deployment ID to UUID, unexpected error:"));
}

#[tokio::test]
async fn test_update_patches_then_reads() {
    let mut server = Server::new_async().await;
    let patch = server
        .mock("PATCH", format!("/api/deployments/{}", DEPLOYMENT_ID).as_str())
        .match_body(Matcher::PartialJson(json!({"paused": true, "tags": ["prod"]})))
        .with_status(204)
        .create_async()
        .await;
    let get = server
        .mock("GET", format!("/api/deployments/{}", DEPLOYMENT_ID).as_str())
        .with_status(200)
        .with_body(deployment_body(true))
        .create_async()
        .await;

    let mut planned = planned_state();
    planned
        .set_string(&AttributePath::new("id"), DEPLOYMENT_ID.to_string())
        .unwrap();
    planned.set_bool(&AttributePath::new("paused"), true).unwrap();

    let resource = configured(&server.url(), None).await;
    let response = resource
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: "prefect_deployment".to_string(),
                prior_state: current_state(),
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;

    patch.assert_async().await;
    get.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response
            .new_state
            .get_bool(&AttributePath::new("paused"))
            .unwrap(),
        true
    );
}

#[tokio::test]
async fn test_delete_tolerates_missing_deployment() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", format!("/api/deployments/{}", DEPLOYMENT_ID).as_str())
        .with_status(404)
        .create_async()
        .await;

    let resource = configured(&server.url(), None).await;
    let response = resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "prefect_deployment".to_string(),
                prior_state: current_state(),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty());
}

#[tokio::test]
async fn test_delete_reports_failures() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", format!("/api/deployments/{}", DEPLOYMENT_ID).as_str())
        .with_status(409)
        .with_body("in use")
        .create_async()
        .await;

    let resource = configured(&server.url(), None).await;
    let response = resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "prefect_deployment".to_string(),
                prior_state: current_state(),
            },
        )
        .await;

    assert_eq!(response.diagnostics[0].summary, "Error deleting Deployment");
}

#[tokio::test]
async fn test_import_with_workspace() {
    let workspace_id = "9f6f0c8e-6d1c-4e1d-8d8a-6d0b1c2e3f04";
    let response = DeploymentResource::new()
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "prefect_deployment".to_string(),
                id: format!("{},{}", DEPLOYMENT_ID, workspace_id),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty());
    let state = &response.imported_resources[0].state;
    assert_eq!(string_at(state, "id"), DEPLOYMENT_ID);
    assert_eq!(string_at(state, "workspace_id"), workspace_id);
}

#[tokio::test]
async fn test_import_rejects_empty_parts() {
    let response = DeploymentResource::new()
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "prefect_deployment".to_string(),
                id: format!("{},", DEPLOYMENT_ID),
            },
        )
        .await;

    assert!(response.imported_resources.is_empty());
    assert_eq!(response.diagnostics[0].summary, "Unexpected Import Identifier");
}
