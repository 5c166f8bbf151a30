//! # busline-transit
//!
//! Domain model for a live bus fleet: vehicles, stops, route path traces and
//! arrival estimates, plus the feed abstraction the client engine polls.
//!
//! ## Features
//!
//! - **Lenient ingestion**: wire records convert infallibly; bad coordinates
//!   become `None` instead of errors
//! - **Route normalization**: `"EE Route"` and `"EE"` compare equal as [`RouteKey`]s
//! - **Route colors**: a registered color table with drawing fallbacks
//! - **Pluggable networking**: implement [`FleetFeed`] for your own transport
//!
//! ## Example
//!
//! ```
//! use busline_transit::prelude::*;
//! use busline_api_types::{FeedId, Numeric, StopDto};
//!
//! let stop = Stop::from(StopDto {
//!     id: FeedId::Number(10034),
//!     name: "College Ave Student Center".into(),
//!     latitude: Numeric::from("40.5030"),
//!     longitude: Numeric::from("-74.4522"),
//!     routes: vec!["A Route".into(), "EE Route".into()],
//! });
//!
//! assert!(stop.serves(&RouteKey::normalize("EE Route")));
//! assert!(stop.location.is_some());
//! ```

pub mod identifiers;
pub mod models;
pub mod network;
pub mod provider;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::{color::*, types::*};
    pub use crate::network::traits::*;
    pub use crate::provider::static_feed::StaticFeed;
}

pub use prelude::*;
