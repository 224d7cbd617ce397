//! Attribute plan modifiers
//!
//! Plan modifiers run after defaults have been applied and can:
//! - replace the planned value
//! - mark the attribute as requiring replacement
//! - add warnings or errors to the plan

use crate::types::{AttributePath, Diagnostic, Dynamic};

#[derive(Debug, Clone)]
pub struct PlanModifyRequest {
    pub state: Dynamic,
    pub plan: Dynamic,
    pub config: Dynamic,
    pub path: AttributePath,
}

#[derive(Debug, Clone)]
pub struct PlanModifyResponse {
    pub plan_value: Dynamic,
    pub requires_replace: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl PlanModifyResponse {
    fn unchanged(plan_value: Dynamic) -> Self {
        Self {
            plan_value,
            requires_replace: false,
            diagnostics: Vec::new(),
        }
    }
}

pub trait PlanModifier: Send + Sync {
    fn description(&self) -> String;

    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse;
}

/// Marks an attribute as requiring replacement when its value changes
pub struct RequiresReplaceIfChanged;

impl PlanModifier for RequiresReplaceIfChanged {
    fn description(&self) -> String {
        "changing this value forces a new resource".to_string()
    }

    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let requires_replace = !matches!(
            (&request.state, &request.plan),
            (Dynamic::Null, Dynamic::Null) | (Dynamic::Unknown, _) | (_, Dynamic::Unknown)
        ) && !values_equal(&request.state, &request.plan);

        PlanModifyResponse {
            plan_value: request.plan,
            requires_replace,
            diagnostics: Vec::new(),
        }
    }
}

/// Copies the prior state value into the plan when the plan is unknown.
///
/// Used for computed attributes that never change once set, like IDs and
/// creation timestamps.
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "once set, the value of this attribute in state will not change".to_string()
    }

    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        if request.plan.is_unknown() && !request.state.is_null() {
            return PlanModifyResponse::unchanged(request.state);
        }
        PlanModifyResponse::unchanged(request.plan)
    }
}

/// Structural equality with a tolerance for floating point numbers
pub fn values_equal(a: &Dynamic, b: &Dynamic) -> bool {
    match (a, b) {
        (Dynamic::Null, Dynamic::Null) => true,
        (Dynamic::Bool(a), Dynamic::Bool(b)) => a == b,
        (Dynamic::Number(a), Dynamic::Number(b)) => (a - b).abs() < f64::EPSILON,
        (Dynamic::String(a), Dynamic::String(b)) => a == b,
        (Dynamic::List(a), Dynamic::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Dynamic::Map(a), Dynamic::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|v2| values_equal(v, v2)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn request(state: Dynamic, plan: Dynamic) -> PlanModifyRequest {
        PlanModifyRequest {
            config: plan.clone(),
            state,
            plan,
            path: AttributePath::new("name"),
        }
    }

    #[test]
    fn requires_replace_if_changed_does_not_trigger_on_same_value() {
        let response = RequiresReplaceIfChanged.modify_plan(request(
            Dynamic::String("etl".to_string()),
            Dynamic::String("etl".to_string()),
        ));

        assert!(!response.requires_replace);
        assert!(response.diagnostics.is_empty());
    }

    #[test]
    fn requires_replace_if_changed_triggers_on_different_value() {
        let response = RequiresReplaceIfChanged.modify_plan(request(
            Dynamic::String("etl".to_string()),
            Dynamic::String("elt".to_string()),
        ));

        assert!(response.requires_replace);
    }

    #[test]
    fn requires_replace_if_changed_ignores_null_and_unknown() {
        let response = RequiresReplaceIfChanged.modify_plan(request(Dynamic::Null, Dynamic::Null));
        assert!(!response.requires_replace);

        let response = RequiresReplaceIfChanged.modify_plan(request(
            Dynamic::String("etl".to_string()),
            Dynamic::Unknown,
        ));
        assert!(!response.requires_replace);
    }

    #[test]
    fn use_state_for_unknown_preserves_state_when_unknown() {
        let response = UseStateForUnknown.modify_plan(request(
            Dynamic::String("2d1a6f0e".to_string()),
            Dynamic::Unknown,
        ));

        assert_eq!(response.plan_value, Dynamic::String("2d1a6f0e".to_string()));
        assert!(!response.requires_replace);
    }

    #[test]
    fn use_state_for_unknown_keeps_unknown_without_state() {
        let response = UseStateForUnknown.modify_plan(request(Dynamic::Null, Dynamic::Unknown));
        assert_eq!(response.plan_value, Dynamic::Unknown);
    }

    #[test]
    fn use_state_for_unknown_uses_plan_when_known() {
        let response = UseStateForUnknown.modify_plan(request(
            Dynamic::String("old".to_string()),
            Dynamic::String("new".to_string()),
        ));

        assert_eq!(response.plan_value, Dynamic::String("new".to_string()));
    }

    #[test]
    fn values_equal_handles_nested_types() {
        assert!(values_equal(&Dynamic::Number(42.0), &Dynamic::Number(42.0)));
        assert!(!values_equal(&Dynamic::Bool(true), &Dynamic::Bool(false)));

        let list1 = Dynamic::List(vec!["a".into(), Dynamic::Number(1.0)]);
        let list2 = Dynamic::List(vec!["a".into(), Dynamic::Number(1.0)]);
        let list3 = Dynamic::List(vec!["b".into(), Dynamic::Number(1.0)]);
        assert!(values_equal(&list1, &list2));
        assert!(!values_equal(&list1, &list3));

        let map1 = HashMap::from([("key".to_string(), Dynamic::from("value"))]);
        let map2 = HashMap::from([("key".to_string(), Dynamic::from("other"))]);
        assert!(values_equal(
            &Dynamic::Map(map1.clone()),
            &Dynamic::Map(map1.clone())
        ));
        assert!(!values_equal(&Dynamic::Map(map1), &Dynamic::Map(map2)));
    }
}
