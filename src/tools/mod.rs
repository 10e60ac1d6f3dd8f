//! Tools module - tools the agent can call
//!
//! Contains the flight and hotel tools, their argument schemas, and the tool
//! registry.

pub mod flights;
pub mod hotels;
pub mod registry;
pub mod schema;

pub use flights::{FlightsFinder, FLIGHTS_TOOL};
pub use hotels::{HotelsFinder, HOTELS_TOOL};
pub use registry::{ToolError, ToolHandler, ToolRegistry, ToolSpec};
pub use schema::{ArgSchema, ParamType};
