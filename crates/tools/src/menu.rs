//! Lookup and notification tools: specials, order history, menu link by SMS.

use callmill_core::tool::Tool;
use serde_json::json;

pub struct GetSpecialsTool;

impl Tool for GetSpecialsTool {
    fn name(&self) -> &str {
        "get_specials"
    }

    fn description(&self) -> &str {
        "Get today's specials and promotions"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }
}

pub struct GetPastOrdersTool;

impl Tool for GetPastOrdersTool {
    fn name(&self) -> &str {
        "get_past_orders"
    }

    fn description(&self) -> &str {
        "Look up a customer's past orders"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "customerPhone": {"type": "string", "description": "Customer's phone number"}
            },
            "required": ["customerPhone"]
        })
    }
}

pub struct SendMenuLinkTool;

impl Tool for SendMenuLinkTool {
    fn name(&self) -> &str {
        "send_menu_link"
    }

    fn description(&self) -> &str {
        "Send a link to the online menu via SMS"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "customerPhone": {"type": "string", "description": "Customer's phone number"}
            },
            "required": ["customerPhone"]
        })
    }
}
