//! Call control.

use callmill_core::tool::Tool;
use serde_json::json;

/// Hangs up. Takes no arguments.
pub struct EndCallTool;

impl Tool for EndCallTool {
    fn name(&self) -> &str {
        "end_call"
    }

    fn description(&self) -> &str {
        "End the current phone call"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }
}
