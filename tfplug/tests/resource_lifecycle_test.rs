//! End-to-end lifecycle of an in-memory resource through the framework helpers

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::import::{import_state_passthrough_id, parse_scoped_import_id};
use tfplug::plan::plan_resource_change;
use tfplug::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::StringLengthValidator;

type Store = Arc<RwLock<HashMap<String, DynamicValue>>>;

#[derive(Default)]
struct QueueResource {
    store: Option<Store>,
    next_id: std::sync::atomic::AtomicUsize,
}

impl QueueResource {
    fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("priority", AttributeType::Number)
                    .optional()
                    .computed()
                    .default(StaticDefault::number(1.0))
                    .build(),
            )
            .build()
    }

    fn store(&self) -> Result<&Store, Diagnostic> {
        self.store.as_ref().ok_or_else(|| {
            Diagnostic::error(
                "Provider not configured",
                "Provider data was not properly configured",
            )
        })
    }
}

#[async_trait]
impl Resource for QueueResource {
    fn type_name(&self) -> &str {
        "test_queue"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let store = match self.store() {
            Ok(store) => store,
            Err(diag) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![diag],
                }
            }
        };

        let id = format!(
            "queue-{}",
            self.next_id
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
        );
        let mut state = request.planned_state;
        state
            .set_string(&AttributePath::new("id"), id.clone())
            .unwrap();
        store.write().await.insert(id, state.clone());

        CreateResourceResponse {
            new_state: state,
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let id = request
            .current_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        let new_state = match self.store() {
            Ok(store) => store.read().await.get(&id).cloned(),
            Err(diag) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![diag],
                }
            }
        };

        ReadResourceResponse {
            new_state,
            diagnostics: vec![],
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let id = request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        if let Ok(store) = self.store() {
            store
                .write()
                .await
                .insert(id, request.planned_state.clone());
        }

        UpdateResourceResponse {
            new_state: request.planned_state,
            diagnostics: vec![],
        }
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let id = request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        if let Ok(store) = self.store() {
            store.write().await.remove(&id);
        }

        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }

    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[async_trait]
impl ResourceWithConfigure for QueueResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        match request
            .provider_data
            .and_then(|data| data.downcast_ref::<Store>().cloned())
        {
            Some(store) => self.store = Some(store),
            None => diagnostics.push(Diagnostic::error(
                "Invalid provider data",
                "Expected the in-memory store",
            )),
        }

        ConfigureResourceResponse { diagnostics }
    }
}

fn config(name: &str) -> DynamicValue {
    let mut config = DynamicValue::object();
    config
        .set_string(&AttributePath::new("name"), name.to_string())
        .unwrap();
    config
}

async fn configured_resource(store: &Store) -> QueueResource {
    let mut resource = QueueResource::default();
    let data: Arc<dyn Any + Send + Sync> = Arc::new(store.clone());
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

#[tokio::test]
async fn test_full_lifecycle() {
    let store: Store = Arc::default();
    let resource = configured_resource(&store).await;
    let schema = QueueResource::schema_static();

    // Plan and apply a create
    let config = config("default");
    let plan = plan_resource_change(&schema, &DynamicValue::null(), &config, &config);
    assert!(plan.requires_replace.is_empty());
    assert_eq!(
        plan.planned_state
            .get_number(&AttributePath::new("priority"))
            .unwrap(),
        1.0
    );

    let created = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "test_queue".to_string(),
                planned_state: plan.planned_state,
                config: config.clone(),
            },
        )
        .await;
    assert!(created.diagnostics.is_empty());
    let state = created.new_state;
    assert_eq!(store.read().await.len(), 1);

    // An unchanged config plans no changes and keeps the id
    let plan = plan_resource_change(&schema, &state, &config, &config);
    assert_eq!(plan.planned_state, state);

    // Raising the priority is an in-place update
    let mut raised = config.clone();
    raised
        .set_number(&AttributePath::new("priority"), 5.0)
        .unwrap();
    let plan = plan_resource_change(&schema, &state, &raised, &raised);
    assert!(plan.requires_replace.is_empty());
    assert_eq!(
        plan.planned_state.get_string(&AttributePath::new("id")).unwrap(),
        state.get_string(&AttributePath::new("id")).unwrap()
    );

    let updated = resource
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: "test_queue".to_string(),
                prior_state: state.clone(),
                planned_state: plan.planned_state,
                config: raised,
            },
        )
        .await;
    let state = updated.new_state;

    // Renaming forces replacement
    let renamed = config_with_priority("high", 5.0);
    let plan = plan_resource_change(&schema, &state, &renamed, &renamed);
    assert_eq!(plan.requires_replace, vec![AttributePath::new("name")]);

    // Refresh, then destroy
    let refreshed = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "test_queue".to_string(),
                current_state: state.clone(),
            },
        )
        .await;
    assert_eq!(refreshed.new_state, Some(state.clone()));

    resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "test_queue".to_string(),
                prior_state: state.clone(),
            },
        )
        .await;

    let gone = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "test_queue".to_string(),
                current_state: state,
            },
        )
        .await;
    assert!(gone.new_state.is_none());
}

fn config_with_priority(name: &str, priority: f64) -> DynamicValue {
    let mut config = config(name);
    config
        .set_number(&AttributePath::new("priority"), priority)
        .unwrap();
    config
}

#[tokio::test]
async fn test_default_validate_runs_schema_checks() {
    let resource = QueueResource::default();

    let response = resource
        .validate(
            Context::new(),
            ValidateResourceConfigRequest {
                type_name: "test_queue".to_string(),
                config: DynamicValue::object(),
            },
        )
        .await;
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Missing required argument");

    let mut with_id = config("default");
    with_id
        .set_string(&AttributePath::new("id"), "queue-9".to_string())
        .unwrap();
    let response = resource
        .validate(
            Context::new(),
            ValidateResourceConfigRequest {
                type_name: "test_queue".to_string(),
                config: with_id,
            },
        )
        .await;
    assert_eq!(
        response.diagnostics[0].summary,
        "Invalid Configuration for Read-Only Attribute"
    );
}

#[tokio::test]
async fn test_unconfigured_resource_reports_diagnostic() {
    let resource = QueueResource::default();
    let response = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "test_queue".to_string(),
                planned_state: config("default"),
                config: config("default"),
            },
        )
        .await;

    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
}

#[tokio::test]
async fn test_import_then_read() {
    let store: Store = Arc::default();
    store
        .write()
        .await
        .insert("queue-42".to_string(), config("imported"));
    let resource = configured_resource(&store).await;

    let imported = resource
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "test_queue".to_string(),
                id: "queue-42".to_string(),
            },
        )
        .await;
    let state = imported.imported_resources[0].state.clone();

    let read = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "test_queue".to_string(),
                current_state: state,
            },
        )
        .await;
    assert_eq!(
        read.new_state
            .unwrap()
            .get_string(&AttributePath::new("name"))
            .unwrap(),
        "imported"
    );
}

#[test]
fn test_scoped_import_ids() {
    let parsed = parse_scoped_import_id("nightly,ws-1", "name,workspace_id").unwrap();
    assert_eq!(parsed.identifier, "nightly");
    assert_eq!(parsed.scope, Some("ws-1"));

    let err = parse_scoped_import_id("a,b,c", "name,workspace_id").unwrap_err();
    assert!(err.detail.contains("name,workspace_id"));
}

#[tokio::test]
async fn test_context_timeout_cancels() {
    let ctx = Context::new().with_timeout(Duration::from_millis(20));
    assert!(!ctx.is_cancelled());

    tokio::time::timeout(Duration::from_secs(1), ctx.cancelled())
        .await
        .expect("context should be cancelled by its deadline");
    assert!(ctx.is_cancelled());
}
