//! Default value providers for attributes
//!
//! Defaults are evaluated during planning when an optional+computed attribute
//! is null in configuration. Explicit configuration always wins.
//!
//! ```no_run
//! use tfplug::schema::{AttributeBuilder, AttributeType};
//! use tfplug::defaults::StaticDefault;
//!
//! let paused = AttributeBuilder::new("paused", AttributeType::Bool)
//!     .optional()
//!     .computed()
//!     .default(StaticDefault::bool(false))
//!     .build();
//! ```

use crate::types::{AttributePath, Dynamic};

/// Provides a value for an attribute left unset in configuration
pub trait DefaultValue: Send + Sync {
    fn description(&self) -> String;

    fn default_value(&self, request: DefaultRequest) -> DefaultResponse;
}

pub struct DefaultRequest {
    pub path: AttributePath,
}

pub struct DefaultResponse {
    pub value: Dynamic,
}

/// StaticDefault provides a fixed default value
#[derive(Debug, Clone)]
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn string(value: &str) -> Self {
        Self::new(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Self {
        Self::new(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(Dynamic::Bool(value))
    }

    pub fn list(values: Vec<Dynamic>) -> Self {
        Self::new(Dynamic::List(values))
    }

    pub fn empty_list() -> Self {
        Self::list(Vec::new())
    }
}

impl DefaultValue for StaticDefault {
    fn description(&self) -> String {
        format!("static default value: {:?}", self.value)
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: self.value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DefaultRequest {
        DefaultRequest {
            path: AttributePath::new("test"),
        }
    }

    #[test]
    fn static_default_bool() {
        let default = StaticDefault::bool(false);
        assert_eq!(default.default_value(request()).value, Dynamic::Bool(false));
    }

    #[test]
    fn static_default_string() {
        let default = StaticDefault::string("prefect-agent");
        assert_eq!(
            default.default_value(request()).value,
            Dynamic::String("prefect-agent".to_string())
        );
    }

    #[test]
    fn static_default_empty_list() {
        let default = StaticDefault::empty_list();
        assert_eq!(default.default_value(request()).value, Dynamic::List(vec![]));
        assert!(default.description().contains("List"));
    }
}
