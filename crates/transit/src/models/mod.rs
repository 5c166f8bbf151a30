//! Fleet data models and types.

pub mod color;
pub mod types;

// Re-exports for convenience
pub use color::{RouteColor, RouteColorEntry, RouteColors};
pub use types::{EtaRecord, PathTrace, Result, Stop, TransitError, Vehicle, WaitSuggestion};
