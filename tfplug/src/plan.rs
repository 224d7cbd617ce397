//! Framework-side planning
//!
//! Mirrors what the plugin framework does before a resource sees a plan:
//! defaults fill unset optional+computed attributes, computed attributes left
//! unset become unknown when the resource changes, and plan modifiers run in
//! declaration order.

use crate::defaults::DefaultRequest;
use crate::plan_modifier::{values_equal, PlanModifyRequest};
use crate::schema::Schema;
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn plan_resource_change(
    schema: &Schema,
    prior_state: &DynamicValue,
    proposed_new_state: &DynamicValue,
    config: &DynamicValue,
) -> PlannedChange {
    let mut change = PlannedChange {
        planned_state: proposed_new_state.clone(),
        requires_replace: Vec::new(),
        diagnostics: Vec::new(),
    };

    // Destroy
    if proposed_new_state.is_null() {
        return change;
    }

    let is_create = prior_state.is_null();

    for attr in schema.attributes() {
        let path = AttributePath::new(&attr.name);
        if !config_value(config, &path).is_null() {
            continue;
        }
        if let Some(default) = &attr.default {
            let value = default
                .default_value(DefaultRequest { path: path.clone() })
                .value;
            set(&mut change, &path, value);
        }
    }

    let changed = is_create || !values_equal(&change.planned_state.value, &prior_state.value);
    tracing::debug!(is_create, changed, "planning resource change");
    if changed {
        for attr in schema.attributes() {
            let path = AttributePath::new(&attr.name);
            if attr.computed && attr.default.is_none() && config_value(config, &path).is_null() {
                set(&mut change, &path, Dynamic::Unknown);
            }
        }
    }

    for attr in schema.attributes() {
        if attr.plan_modifiers.is_empty() {
            continue;
        }
        let path = AttributePath::new(&attr.name);
        let state = prior_state.get(&path).cloned().unwrap_or(Dynamic::Null);
        let attr_config = config_value(config, &path);
        let mut plan = change
            .planned_state
            .get(&path)
            .cloned()
            .unwrap_or(Dynamic::Null);

        for modifier in &attr.plan_modifiers {
            let response = modifier.modify_plan(PlanModifyRequest {
                state: state.clone(),
                plan,
                config: attr_config.clone(),
                path: path.clone(),
            });
            plan = response.plan_value;
            change.diagnostics.extend(response.diagnostics);
            if response.requires_replace && !is_create && !change.requires_replace.contains(&path)
            {
                change.requires_replace.push(path.clone());
            }
        }

        set(&mut change, &path, plan);
    }

    change
}

fn config_value(config: &DynamicValue, path: &AttributePath) -> Dynamic {
    config.get(path).cloned().unwrap_or(Dynamic::Null)
}

fn set(change: &mut PlannedChange, path: &AttributePath, value: Dynamic) {
    if let Err(e) = change.planned_state.set_value(path, value) {
        change.diagnostics.push(Diagnostic::attribute_error(
            path.clone(),
            "Failed to plan attribute",
            e.to_string(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::StaticDefault;
    use crate::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
    use crate::schema::{AttributeBuilder, AttributeType, SchemaBuilder};

    fn schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("paused", AttributeType::Bool)
                    .optional()
                    .computed()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .build()
    }

    fn object(fields: &[(&str, Dynamic)]) -> DynamicValue {
        let mut value = DynamicValue::object();
        for (name, field) in fields {
            value
                .set_value(&AttributePath::new(name), field.clone())
                .unwrap();
        }
        value
    }

    fn prior() -> DynamicValue {
        object(&[
            ("id", "d-1".into()),
            ("updated", "2024-01-01T00:00:00Z".into()),
            ("name", "etl".into()),
            ("description", Dynamic::Null),
            ("paused", Dynamic::Bool(false)),
        ])
    }

    #[test]
    fn create_marks_computed_unknown_and_applies_defaults() {
        let config = object(&[("name", "etl".into())]);
        let proposed = object(&[
            ("id", Dynamic::Null),
            ("updated", Dynamic::Null),
            ("name", "etl".into()),
            ("paused", Dynamic::Null),
        ]);

        let change = plan_resource_change(&schema(), &DynamicValue::null(), &proposed, &config);
        let planned = &change.planned_state;

        assert_eq!(planned.get(&AttributePath::new("id")), Some(&Dynamic::Unknown));
        assert_eq!(
            planned.get(&AttributePath::new("updated")),
            Some(&Dynamic::Unknown)
        );
        assert_eq!(
            planned.get(&AttributePath::new("paused")),
            Some(&Dynamic::Bool(false))
        );
        assert!(change.requires_replace.is_empty());
        assert!(change.diagnostics.is_empty());
    }

    #[test]
    fn no_change_keeps_prior_state() {
        let config = object(&[("name", "etl".into())]);
        let change = plan_resource_change(&schema(), &prior(), &prior(), &config);

        assert_eq!(change.planned_state, prior());
        assert!(change.requires_replace.is_empty());
    }

    #[test]
    fn in_place_update_keeps_id_and_unknowns_updated() {
        let config = object(&[("name", "etl".into()), ("description", "nightly".into())]);
        let mut proposed = prior();
        proposed
            .set_string(&AttributePath::new("description"), "nightly".to_string())
            .unwrap();

        let change = plan_resource_change(&schema(), &prior(), &proposed, &config);
        let planned = &change.planned_state;

        assert_eq!(planned.get_string(&AttributePath::new("id")).unwrap(), "d-1");
        assert_eq!(
            planned.get(&AttributePath::new("updated")),
            Some(&Dynamic::Unknown)
        );
        assert!(change.requires_replace.is_empty());
    }

    #[test]
    fn renaming_requires_replace() {
        let config = object(&[("name", "elt".into())]);
        let mut proposed = prior();
        proposed
            .set_string(&AttributePath::new("name"), "elt".to_string())
            .unwrap();

        let change = plan_resource_change(&schema(), &prior(), &proposed, &config);

        assert_eq!(change.requires_replace, vec![AttributePath::new("name")]);
    }

    #[test]
    fn destroy_plan_is_passed_through() {
        let change = plan_resource_change(
            &schema(),
            &prior(),
            &DynamicValue::null(),
            &DynamicValue::null(),
        );
        assert!(change.planned_state.is_null());
        assert!(change.requires_replace.is_empty());
    }
}
