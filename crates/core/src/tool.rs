//! Tool trait — the abstraction over function schemas offered to the model.
//!
//! Tools here are never executed: the calls were made during the original
//! phone conversation. A tool only describes itself so its schema can be
//! attached to every training example.

use serde::{Deserialize, Serialize};

/// A tool schema in chat-completion format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Always `"function"`
    #[serde(rename = "type")]
    pub kind: String,

    /// The function schema
    pub function: FunctionSchema,
}

/// Name, description and JSON Schema of a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    /// The function name
    pub name: String,

    /// Description of what the function does
    pub description: String,

    /// JSON Schema describing the function's parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Names of parameters the schema marks as required.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.function.parameters["required"]
            .as_array()
            .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }
}

/// The core Tool trait.
///
/// Each catalog entry (create_order, check_availability, end_call, etc.)
/// implements this trait and is registered in a [`ToolCatalog`].
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "create_order").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Convert this tool into a ToolDefinition for a training example.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            kind: "function".into(),
            function: FunctionSchema {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters_schema(),
            },
        }
    }
}

/// An ordered catalog of tools.
///
/// Registration order is the order schemas appear in every exported
/// example, so output stays byte-for-byte reproducible.
pub struct ToolCatalog {
    version: String,
    tools: Vec<Box<dyn Tool>>,
}

impl ToolCatalog {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            tools: Vec::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// All tool definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// All registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Catalog version label.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCatalog")
            .field("version", &self.version)
            .field("tools", &self.names())
            .finish()
    }
}
