//! Pickup order tools: create, cancel, and amend an order.

use callmill_core::tool::Tool;
use serde_json::json;

pub struct CreateOrderTool;

impl Tool for CreateOrderTool {
    fn name(&self) -> &str {
        "create_order"
    }

    fn description(&self) -> &str {
        "Create a pickup order for the customer"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "customerName": {"type": "string", "description": "Customer's name"},
                "customerPhone": {"type": "string", "description": "Customer's phone number"},
                "items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "itemName": {"type": "string"},
                            "quantity": {"type": "integer"},
                            "modifiers": {"type": "array", "items": {"type": "string"}},
                            "specialInstructions": {"type": "string"}
                        },
                        "required": ["itemName", "quantity"]
                    }
                },
                "specialInstructions": {
                    "type": "string",
                    "description": "Special instructions for the whole order"
                }
            },
            "required": ["customerName", "customerPhone", "items"]
        })
    }
}

pub struct CancelOrderTool;

impl Tool for CancelOrderTool {
    fn name(&self) -> &str {
        "cancel_order"
    }

    fn description(&self) -> &str {
        "Cancel an existing order"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "orderId": {"type": "string", "description": "The order ID to cancel"},
                "reason": {"type": "string", "description": "Reason for cancellation"}
            },
            "required": ["orderId"]
        })
    }
}

pub struct RemoveItemTool;

impl Tool for RemoveItemTool {
    fn name(&self) -> &str {
        "remove_item"
    }

    fn description(&self) -> &str {
        "Remove an item from an existing order"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "orderId": {"type": "string", "description": "The order ID"},
                "itemName": {"type": "string", "description": "Name of the item to remove"}
            },
            "required": ["orderId", "itemName"]
        })
    }
}

pub struct ModifyItemTool;

impl Tool for ModifyItemTool {
    fn name(&self) -> &str {
        "modify_item"
    }

    fn description(&self) -> &str {
        "Modify an item in an existing order"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "orderId": {"type": "string", "description": "The order ID"},
                "itemName": {"type": "string", "description": "Name of the item to modify"},
                "modifications": {"type": "string", "description": "Description of modifications"}
            },
            "required": ["orderId", "itemName", "modifications"]
        })
    }
}
