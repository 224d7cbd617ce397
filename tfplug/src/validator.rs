use crate::schema::Schema;
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// Validates a single known, non-null attribute value
pub trait Validator: Send + Sync {
    fn description(&self) -> String;

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>);
}

/// Runs presence checks and attribute validators over a configuration.
///
/// Unknown values are skipped; they are validated again once known.
pub fn validate_config(schema: &Schema, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for attr in schema.attributes() {
        let path = AttributePath::new(&attr.name);
        let value = config.get(&path).unwrap_or(&Dynamic::Null);

        if value.is_null() {
            if attr.required {
                diagnostics.push(Diagnostic::attribute_error(
                    path,
                    "Missing required argument",
                    format!("The argument \"{}\" is required, but no definition was found.", attr.name),
                ));
            }
            continue;
        }

        if value.is_unknown() {
            continue;
        }

        if attr.computed && !attr.optional && !attr.required {
            diagnostics.push(Diagnostic::attribute_error(
                path,
                "Invalid Configuration for Read-Only Attribute",
                format!("Cannot set value for attribute \"{}\", it is computed by the provider.", attr.name),
            ));
            continue;
        }

        for validator in &attr.validators {
            validator.validate(value, &path, &mut diagnostics);
        }
    }

    diagnostics
}

/// Requires a string that parses as a UUID
pub struct UuidValidator;

impl Validator for UuidValidator {
    fn description(&self) -> String {
        "value must be a valid UUID".to_string()
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(s) = value.as_str() {
            if let Err(e) = uuid::Uuid::parse_str(s) {
                diagnostics.push(Diagnostic::attribute_error(
                    path.clone(),
                    "Invalid UUID",
                    format!("{} must be a valid UUID, got {:?}: {}", path, s, e),
                ));
            }
        }
    }
}

/// Requires a string holding JSON text, optionally a JSON object
pub struct JsonValidator {
    pub require_object: bool,
}

impl JsonValidator {
    pub fn any() -> Self {
        Self {
            require_object: false,
        }
    }

    pub fn object() -> Self {
        Self {
            require_object: true,
        }
    }
}

impl Validator for JsonValidator {
    fn description(&self) -> String {
        if self.require_object {
            "value must be a JSON object".to_string()
        } else {
            "value must be valid JSON".to_string()
        }
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(s) = value.as_str() else {
            return;
        };

        match serde_json::from_str::<serde_json::Value>(s) {
            Ok(parsed) if self.require_object && !parsed.is_object() => {
                diagnostics.push(Diagnostic::attribute_error(
                    path.clone(),
                    "Invalid JSON String Value",
                    format!("{} must be a JSON object", path),
                ));
            }
            Ok(_) => {}
            Err(e) => diagnostics.push(Diagnostic::attribute_error(
                path.clone(),
                "Invalid JSON String Value",
                format!("A string value was provided that is not valid JSON: {}", e),
            )),
        }
    }
}

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl StringLengthValidator {
    pub fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("string length must be between {} and {}", min, max),
            (Some(min), None) => format!("string length must be at least {}", min),
            (None, Some(max)) => format!("string length must be at most {}", max),
            (None, None) => "any string length".to_string(),
        }
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(s) = value.as_str() else {
            return;
        };
        let len = s.chars().count();

        if let Some(min) = self.min {
            if len < min {
                diagnostics.push(Diagnostic::attribute_error(
                    path.clone(),
                    format!("{} must have minimum length of {}", path, min),
                    format!("Got length {}", len),
                ));
            }
        }
        if let Some(max) = self.max {
            if len > max {
                diagnostics.push(Diagnostic::attribute_error(
                    path.clone(),
                    format!("{} must have maximum length of {}", path, max),
                    format!("Got length {}", len),
                ));
            }
        }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRangeValidator {
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl Validator for NumberRangeValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("value must be between {} and {}", min, max),
            (Some(min), None) => format!("value must be at least {}", min),
            (None, Some(max)) => format!("value must be at most {}", max),
            (None, None) => "any number".to_string(),
        }
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(n) = value.as_number() else {
            return;
        };

        if let Some(min) = self.min {
            if n < min {
                diagnostics.push(Diagnostic::attribute_error(
                    path.clone(),
                    format!("{} must be at least {}", path, min),
                    format!("Got {}", n),
                ));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                diagnostics.push(Diagnostic::attribute_error(
                    path.clone(),
                    format!("{} must be at most {}", path, max),
                    format!("Got {}", n),
                ));
            }
        }
    }
}
