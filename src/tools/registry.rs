//! Tool registry - declares the tools the model may call
//!
//! Registration order is preserved so the model always sees the tools in the
//! same order. The registry is built once at startup and shared read-only.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{ItineraError, Result, ToolDefinition, ToolPayload};
use crate::search::{FlightSearch, HotelSearch};
use crate::tools::flights::FlightsFinder;
use crate::tools::hotels::HotelsFinder;
use crate::tools::schema::ArgSchema;

/// Error raised by a tool handler
#[derive(Debug, Clone, PartialEq)]
pub enum ToolError {
    /// Arguments passed the schema but are semantically wrong
    InvalidArguments(String),
    /// The underlying client failed
    Execution(String),
}

/// Execution capability behind a tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with schema-validated arguments (always a JSON object)
    async fn call(&self, args: Value) -> std::result::Result<ToolPayload, ToolError>;
}

/// Static descriptor of a callable tool
#[derive(Clone)]
pub struct ToolSpec {
    name: String,
    description: String,
    schema: ArgSchema,
    handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .finish()
    }
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ArgSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ArgSchema {
        &self.schema
    }

    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.handler)
    }

    /// Provider-facing function definition
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            self.name.clone(),
            self.description.clone(),
            self.schema.to_json_schema(),
        )
    }
}

/// Registry of available tools
#[derive(Debug, Default)]
pub struct ToolRegistry {
    /// Specs in registration order
    specs: Vec<ToolSpec>,
    /// Name -> position in `specs`
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard flight and hotel tools
    pub fn travel_defaults(
        flights: Arc<dyn FlightSearch>,
        hotels: Arc<dyn HotelSearch>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(FlightsFinder::spec(flights))?;
        registry.register(HotelsFinder::spec(hotels))?;
        Ok(registry)
    }

    /// Register a tool; names must be unique
    pub fn register(&mut self, spec: ToolSpec) -> Result<()> {
        if self.index.contains_key(spec.name()) {
            return Err(ItineraError::DuplicateTool(spec.name().to_string()));
        }
        self.index.insert(spec.name().to_string(), self.specs.len());
        self.specs.push(spec);
        Ok(())
    }

    /// Look up a tool by name
    pub fn lookup(&self, name: &str) -> Result<&ToolSpec> {
        self.index
            .get(name)
            .map(|&i| &self.specs[i])
            .ok_or_else(|| ItineraError::UnknownTool(name.to_string()))
    }

    /// All specs in registration order
    pub fn all_specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Function definitions for the model, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.specs.iter().map(ToolSpec::definition).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::schema::ParamType;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, _args: Value) -> std::result::Result<ToolPayload, ToolError> {
            Ok(ToolPayload::Flights(Vec::new()))
        }
    }

    fn spec(name: &str) -> ToolSpec {
        ToolSpec::new(
            name,
            "test tool",
            ArgSchema::new().required("q", ParamType::String, "query"),
            Arc::new(Echo),
        )
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(spec("a")).unwrap();
        registry.register(spec("b")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("b").unwrap().name(), "b");
        assert!(matches!(
            registry.lookup("c"),
            Err(ItineraError::UnknownTool(name)) if name == "c"
        ));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(spec("a")).unwrap();
        let err = registry.register(spec("a")).unwrap_err();
        assert!(matches!(err, ItineraError::DuplicateTool(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registration_order_is_stable() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(spec(name)).unwrap();
        }

        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
        let defs = registry.definitions();
        assert_eq!(defs[0].function.name, "zeta");
        assert_eq!(defs[2].function.parameters["required"][0], "q");
    }
}
