//! Import helpers for simplifying resource import implementations

use crate::context::Context;
use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostic, DynamicValue};

/// Sets the import ID to a specific attribute in state
///
/// Example: ID "0b2a6e3c-..." -> state.id = "0b2a6e3c-..."
pub fn import_state_passthrough_id(
    _ctx: &Context,
    attr_path: AttributePath,
    request: &ImportResourceStateRequest,
    response: &mut ImportResourceStateResponse,
) {
    let mut state = DynamicValue::object();

    if let Err(e) = state.set_string(&attr_path, request.id.clone()) {
        response.diagnostics.push(Diagnostic::attribute_error(
            attr_path.clone(),
            format!("Failed to set import ID: {}", e),
            format!("Could not set attribute '{}' to value '{}'", attr_path, request.id),
        ));
        return;
    }

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
    });
}

/// An import identifier optionally followed by the workspace it lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopedImportId<'a> {
    pub identifier: &'a str,
    pub scope: Option<&'a str>,
}

/// Splits `<identifier>` or `<identifier>,<scope>`.
///
/// `form` is only used in error messages, e.g. `id,workspace_id`.
pub fn parse_scoped_import_id<'a>(
    id: &'a str,
    form: &str,
) -> std::result::Result<ScopedImportId<'a>, Diagnostic> {
    let parts: Vec<&str> = id.split(',').collect();

    match parts[..] {
        [identifier] => Ok(ScopedImportId {
            identifier,
            scope: None,
        }),
        [identifier, scope] if !identifier.is_empty() && !scope.is_empty() => {
            Ok(ScopedImportId {
                identifier,
                scope: Some(scope),
            })
        }
        [_, _] => Err(Diagnostic::error(
            "Unexpected Import Identifier",
            format!(
                "Expected non-empty import identifiers, in the form of `{}`. Got {:?}",
                form, id
            ),
        )),
        _ => Err(Diagnostic::error(
            "Unexpected Import Identifier",
            format!(
                "Expected a maximum of 2 import identifiers, in the form of `{}`. Got {:?}",
                form, id
            ),
        )),
    }
}
