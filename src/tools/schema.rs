//! Tool argument schemas
//!
//! A small, explicit schema per tool. It renders to JSON Schema for the model
//! and validates whatever arguments the model sends back before any handler
//! sees them.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

/// Type of a single tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    /// String in YYYY-MM-DD form
    Date,
}

impl ParamType {
    fn json_type(self) -> &'static str {
        match self {
            ParamType::String | ParamType::Date => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Date => value
                .as_str()
                .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
                .unwrap_or(false),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            ParamType::Date => "a date in YYYY-MM-DD format",
            ParamType::String => "a string",
            ParamType::Integer => "an integer",
            ParamType::Number => "a number",
            ParamType::Boolean => "a boolean",
        }
    }
}

/// One named parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
    pub description: String,
}

/// Ordered set of parameters accepted by a tool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgSchema {
    params: Vec<ParamSpec>,
}

impl ArgSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required parameter
    pub fn required(self, name: &str, ty: ParamType, description: &str) -> Self {
        self.param(name, ty, true, description)
    }

    /// Add an optional parameter
    pub fn optional(self, name: &str, ty: ParamType, description: &str) -> Self {
        self.param(name, ty, false, description)
    }

    fn param(mut self, name: &str, ty: ParamType, required: bool, description: &str) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            ty,
            required,
            description: description.to_string(),
        });
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Render as a JSON Schema object for the model
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut prop = json!({
                "type": param.ty.json_type(),
                "description": param.description,
            });
            if param.ty == ParamType::Date {
                prop["format"] = json!("date");
            }
            properties.insert(param.name.clone(), prop);
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Check `args` against the schema, collecting every problem found.
    ///
    /// `null` is accepted as an empty argument object. Optional parameters may
    /// be explicitly `null`.
    pub fn validate(&self, args: &Value) -> std::result::Result<(), String> {
        let empty = Map::new();
        let object = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(format!(
                    "arguments must be a JSON object, got {}",
                    type_name(other)
                ))
            }
        };

        let mut problems = Vec::new();

        for param in &self.params {
            match object.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    problems.push(format!("missing required parameter '{}'", param.name));
                }
                None | Some(Value::Null) => {}
                Some(value) if !param.ty.accepts(value) => {
                    problems.push(format!(
                        "parameter '{}' must be {}, got {}",
                        param.name,
                        param.ty.expected(),
                        value
                    ));
                }
                Some(_) => {}
            }
        }

        for key in object.keys() {
            if !self.params.iter().any(|p| &p.name == key) {
                problems.push(format!("unexpected parameter '{}'", key));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }
}

/// Drop explicit `null`s so handlers see absent optionals; `null` itself
/// becomes an empty object.
pub fn strip_nulls(args: Value) -> Value {
    match args {
        Value::Object(map) => {
            Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect())
        }
        Value::Null => Value::Object(Map::new()),
        other => other,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ArgSchema {
        ArgSchema::new()
            .required("q", ParamType::String, "Location")
            .required("check_in_date", ParamType::Date, "Check-in")
            .optional("adults", ParamType::Integer, "Adults")
    }

    #[test]
    fn test_json_schema_shape() {
        let value = schema().to_json_schema();
        assert_eq!(value["type"], "object");
        assert_eq!(value["required"], json!(["q", "check_in_date"]));
        assert_eq!(value["properties"]["check_in_date"]["format"], "date");
        assert_eq!(value["properties"]["adults"]["type"], "integer");
    }

    #[test]
    fn test_valid_arguments() {
        let args = json!({"q": "Paris", "check_in_date": "2026-06-01", "adults": 2});
        assert!(schema().validate(&args).is_ok());

        let args = json!({"q": "Paris", "check_in_date": "2026-06-01", "adults": null});
        assert!(schema().validate(&args).is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let args = json!({"check_in_date": "June 1st", "adults": "two", "pets": 1});
        let err = schema().validate(&args).unwrap_err();
        assert!(err.contains("missing required parameter 'q'"));
        assert!(err.contains("'check_in_date' must be a date"));
        assert!(err.contains("'adults' must be an integer"));
        assert!(err.contains("unexpected parameter 'pets'"));
    }

    #[test]
    fn test_non_object_arguments() {
        let err = schema().validate(&json!("Paris")).unwrap_err();
        assert!(err.contains("must be a JSON object"));

        let empty = ArgSchema::new().optional("x", ParamType::Boolean, "flag");
        assert!(empty.validate(&Value::Null).is_ok());
    }

    #[test]
    fn test_strip_nulls() {
        assert_eq!(strip_nulls(json!({"a": 1, "b": null})), json!({"a": 1}));
        assert_eq!(strip_nulls(Value::Null), json!({}));
    }
}
