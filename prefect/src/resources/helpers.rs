//! Conversions shared by every resource and data source
//!
//! Terraform values arrive as `DynamicValue`s; these helpers turn them into
//! API types and back, reporting problems as attribute-scoped diagnostics.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tfplug::import::parse_scoped_import_id;
use tfplug::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::TfplugError;
use uuid::Uuid;

use crate::api::ApiError;

/// Builds an object value from attribute/value pairs
pub fn object<I>(fields: I) -> DynamicValue
where
    I: IntoIterator<Item = (&'static str, Dynamic)>,
{
    DynamicValue::new(Dynamic::Map(
        fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect::<HashMap<_, _>>(),
    ))
}

pub fn attribute_error(attr: &str, err: TfplugError) -> Diagnostic {
    Diagnostic::attribute_error(
        AttributePath::new(attr),
        format!("Invalid value for {}", attr),
        err.to_string(),
    )
}

pub fn optional_string(value: &DynamicValue, attr: &str) -> Result<Option<String>, Diagnostic> {
    value
        .get_string_opt(&AttributePath::new(attr))
        .map_err(|e| attribute_error(attr, e))
}

pub fn required_string(value: &DynamicValue, attr: &str) -> Result<String, Diagnostic> {
    optional_string(value, attr)?.ok_or_else(|| {
        Diagnostic::attribute_error(
            AttributePath::new(attr),
            format!("Missing {}", attr),
            format!("The '{}' attribute is required", attr),
        )
    })
}

pub fn optional_bool(value: &DynamicValue, attr: &str) -> Result<Option<bool>, Diagnostic> {
    value
        .get_bool_opt(&AttributePath::new(attr))
        .map_err(|e| attribute_error(attr, e))
}

/// Whole numbers only; Terraform numbers arrive as f64
pub fn optional_integer(value: &DynamicValue, attr: &str) -> Result<Option<i64>, Diagnostic> {
    let Some(n) = value
        .get_number_opt(&AttributePath::new(attr))
        .map_err(|e| attribute_error(attr, e))?
    else {
        return Ok(None);
    };

    if n.fract() != 0.0 || n < i64::MIN as f64 || n > i64::MAX as f64 {
        return Err(Diagnostic::attribute_error(
            AttributePath::new(attr),
            format!("Invalid value for {}", attr),
            format!("{} must be a whole number, got {}", attr, n),
        ));
    }
    Ok(Some(n as i64))
}

/// A missing or null list reads as empty
pub fn string_list(value: &DynamicValue, attr: &str) -> Result<Vec<String>, Diagnostic> {
    value
        .get_string_list_opt(&AttributePath::new(attr))
        .map(Option::unwrap_or_default)
        .map_err(|e| attribute_error(attr, e))
}

/// Reads an optional UUID attribute, e.g. `account_id`
pub fn optional_uuid(
    value: &DynamicValue,
    attr: &str,
    label: &str,
) -> Result<Option<Uuid>, Diagnostic> {
    optional_string(value, attr)?
        .map(|raw| parse_uuid(&raw, attr, label))
        .transpose()
}

/// The optional `account_id` and `workspace_id` pair carried by
/// workspace-scoped resources
pub fn scope(value: &DynamicValue) -> Result<(Option<Uuid>, Option<Uuid>), Diagnostic> {
    Ok((
        optional_uuid(value, "account_id", "Account")?,
        optional_uuid(value, "workspace_id", "Workspace")?,
    ))
}

/// Echoes an attribute back into state unchanged, unknown becoming null
pub fn carry(value: &DynamicValue, attr: &str) -> Dynamic {
    match value.get(&AttributePath::new(attr)) {
        Some(v) if v.is_known() => v.clone(),
        _ => Dynamic::Null,
    }
}

pub fn required_uuid(value: &DynamicValue, attr: &str, label: &str) -> Result<Uuid, Diagnostic> {
    let raw = required_string(value, attr)?;
    parse_uuid(&raw, attr, label)
}

pub fn parse_uuid(raw: &str, attr: &str, label: &str) -> Result<Uuid, Diagnostic> {
    Uuid::parse_str(raw).map_err(|e| {
        Diagnostic::attribute_error(
            AttributePath::new(attr),
            format!("Error parsing {} ID", label),
            format!(
                "Could not parse {} ID to UUID, unexpected error: {}",
                label.to_lowercase(),
                e
            ),
        )
    })
}

/// Scope resolution failed before any request was made. The error names
/// the IDs that are missing.
pub fn client_error(kind: &str, err: &ApiError) -> Diagnostic {
    Diagnostic::error(
        format!("Error creating {} client", kind),
        format!("Could not create {} client, unexpected error: {}", kind, err),
    )
}

/// A failed API call, e.g. `api_error("creating", "deployment", &err)`
pub fn api_error(action: &str, kind: &str, err: &ApiError) -> Diagnostic {
    Diagnostic::error(
        format!("Error {} {}", action, kind),
        format!(
            "Could not {} {}, unexpected error: {}",
            verb(action),
            kind,
            err
        ),
    )
}

fn verb(action: &str) -> &str {
    match action {
        "creating" => "create",
        "reading" | "refreshing" => "read",
        "updating" => "update",
        "deleting" => "delete",
        other => other,
    }
}

pub fn provider_not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

pub fn timestamp(value: Option<DateTime<Utc>>) -> Dynamic {
    value
        .map(|t| Dynamic::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
        .unwrap_or(Dynamic::Null)
}

pub fn strings(values: &[String]) -> Dynamic {
    Dynamic::List(values.iter().cloned().map(Dynamic::String).collect())
}

pub fn optional_uuid_value(value: Option<Uuid>) -> Dynamic {
    value.map(|id| id.to_string()).into()
}

/// Parses a JSON-object attribute. Unset means an empty object.
pub fn json_object(value: &DynamicValue, attr: &str) -> Result<Map<String, Value>, Diagnostic> {
    let Some(raw) = optional_string(value, attr)? else {
        return Ok(Map::new());
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Diagnostic::attribute_error(
            AttributePath::new(attr),
            format!("Invalid {}", attr),
            format!("{} must be a JSON object, got {}", attr, json_kind(&other)),
        )),
        Err(e) => Err(Diagnostic::attribute_error(
            AttributePath::new(attr),
            format!("Invalid {}", attr),
            format!("Could not parse {} as JSON: {}", attr, e),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Serializes `value` for state. When `prior` holds semantically equal
/// JSON its text is kept, so formatting differences never show as drift.
pub fn normalized_json(
    prior: Option<&str>,
    value: &Map<String, Value>,
    attr: &str,
) -> Result<Dynamic, Diagnostic> {
    if let Some(prior) = prior {
        if let Ok(Value::Object(prior_map)) = serde_json::from_str::<Value>(prior) {
            if &prior_map == value {
                return Ok(Dynamic::String(prior.to_string()));
            }
        }
    }

    serde_json::to_string(value)
        .map(Dynamic::String)
        .map_err(|e| {
            Diagnostic::attribute_error(
                AttributePath::new(attr),
                "Failed to serialize data",
                format!("Could not serialize {} as JSON: {}", attr, e),
            )
        })
}

/// Handles `<identifier>` and `<identifier>,<workspace_id>` import IDs.
///
/// The identifier lands in `identifier_attr`; a workspace scope lands in
/// `workspace_id`.
pub fn import_scoped(
    request: &ImportResourceStateRequest,
    identifier_attr: &'static str,
    form: &str,
) -> ImportResourceStateResponse {
    let mut response = ImportResourceStateResponse::default();

    let parsed = match parse_scoped_import_id(&request.id, form) {
        Ok(parsed) => parsed,
        Err(diag) => {
            response.diagnostics.push(diag);
            return response;
        }
    };

    let mut fields = vec![(identifier_attr, Dynamic::from(parsed.identifier))];
    if let Some(scope) = parsed.scope {
        match parse_uuid(scope, "workspace_id", "Workspace") {
            Ok(workspace_id) => {
                fields.push(("workspace_id", Dynamic::String(workspace_id.to_string())))
            }
            Err(diag) => {
                response.diagnostics.push(diag);
                return response;
            }
        }
    }

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state: object(fields),
    });
    response
}
