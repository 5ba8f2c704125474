//! Table reservation tools.

use callmill_core::tool::Tool;
use serde_json::json;

pub struct CheckAvailabilityTool;

impl Tool for CheckAvailabilityTool {
    fn name(&self) -> &str {
        "check_availability"
    }

    fn description(&self) -> &str {
        "Check table availability for a reservation"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "date": {"type": "string", "description": "Date in YYYY-MM-DD format"},
                "time": {"type": "string", "description": "Time in HH:MM format"},
                "partySize": {"type": "integer", "description": "Number of guests"}
            },
            "required": ["date", "time", "partySize"]
        })
    }
}

pub struct CreateReservationTool;

impl Tool for CreateReservationTool {
    fn name(&self) -> &str {
        "create_reservation"
    }

    fn description(&self) -> &str {
        "Create a table reservation"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "customerName": {"type": "string", "description": "Customer's name"},
                "customerPhone": {"type": "string", "description": "Customer's phone number"},
                "partySize": {"type": "integer", "description": "Number of guests"},
                "date": {"type": "string", "description": "Date in YYYY-MM-DD format"},
                "time": {"type": "string", "description": "Time in HH:MM format"},
                "specialRequests": {"type": "string", "description": "Any special requests"}
            },
            "required": ["customerName", "customerPhone", "partySize", "date", "time"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_special_requests_optional() {
        let required = CreateReservationTool.to_definition();
        assert!(!required.required_parameters().contains(&"specialRequests"));
        assert_eq!(required.required_parameters().len(), 5);
    }
}
