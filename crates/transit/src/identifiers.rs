//! Type-safe identifiers for fleet entities.
//!
//! All identifiers use Arc<str> for cheap cloning, since the same id is held by
//! the latest poll result, the animation map and the render frame at once.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use busline_api_types::FeedId;

macro_rules! impl_identifier {
    ($name:ident) => {
        #[derive(Clone, Debug)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(s.as_ref().into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.cmp(&other.0)
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<&FeedId> for $name {
            fn from(id: &FeedId) -> Self {
                Self::new(id.to_string())
            }
        }
    };
}

impl_identifier!(VehicleIdentifier);
impl_identifier!(StopIdentifier);
impl_identifier!(RouteKey);

/// Cosmetic suffix the feeds append to most route names ("EE Route").
const ROUTE_SUFFIX: &str = " Route";

impl RouteKey {
    /// Normalize a raw feed route name: `"EE Route"` and `"EE"` both become `EE`.
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        let short = trimmed.strip_suffix(ROUTE_SUFFIX).unwrap_or(trimmed);
        Self::new(short.trim_end())
    }

    /// Key under which the path feed serves this route's trace.
    pub fn path_key(&self) -> String {
        self.as_str().replace('/', "_")
    }
}
