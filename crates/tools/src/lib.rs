//! The static tool catalog for callmill training examples.
//!
//! These are the ten functions the restaurant voice agent can call during a
//! phone conversation: placing and amending pickup orders, booking tables,
//! looking things up, texting the menu, and hanging up. The catalog is
//! configuration data; it is never derived from conversation content.

pub mod call;
pub mod menu;
pub mod orders;
pub mod reservations;

use callmill_core::tool::ToolCatalog;

/// Version label of the built-in catalog.
pub const CATALOG_VERSION: &str = "2025-01";

/// Create the catalog with all built-in tools, in export order.
pub fn default_catalog() -> ToolCatalog {
    let mut catalog = ToolCatalog::new(CATALOG_VERSION);
    catalog.register(Box::new(orders::CreateOrderTool));
    catalog.register(Box::new(orders::CancelOrderTool));
    catalog.register(Box::new(orders::RemoveItemTool));
    catalog.register(Box::new(orders::ModifyItemTool));
    catalog.register(Box::new(reservations::CheckAvailabilityTool));
    catalog.register(Box::new(reservations::CreateReservationTool));
    catalog.register(Box::new(menu::GetSpecialsTool));
    catalog.register(Box::new(menu::GetPastOrdersTool));
    catalog.register(Box::new(call::EndCallTool));
    catalog.register(Box::new(menu::SendMenuLinkTool));
    catalog
}
