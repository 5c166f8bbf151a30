//! Engine settings.
//!
//! Every field has a default, so an empty configuration source yields the
//! stock behavior: poll every 10 s, animate over 1.5 s, keep 3 labels per route.

use std::time::Duration;

use busline_transit::{RouteColorEntry, RouteColors};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum EngineConfigError {
    #[error("{field} must be greater than zero")]
    ZeroPeriod { field: &'static str },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub vehicle_poll_interval_secs: u64,
    pub animation_duration_ms: u64,
    pub frame_interval_ms: u64,
    /// Poll cycles an unseen vehicle keeps its animation state; 0 keeps it forever
    pub eviction_cycles: u32,
    pub max_eta_labels: usize,
    pub route_colors: Vec<RouteColorEntry>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vehicle_poll_interval_secs: 10,
            animation_duration_ms: 1500,
            frame_interval_ms: 16,
            eviction_cycles: 6,
            max_eta_labels: 3,
            route_colors: RouteColors::default().entries(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.vehicle_poll_interval_secs == 0 {
            return Err(EngineConfigError::ZeroPeriod {
                field: "vehicle_poll_interval_secs",
            });
        }
        if self.frame_interval_ms == 0 {
            return Err(EngineConfigError::ZeroPeriod {
                field: "frame_interval_ms",
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.vehicle_poll_interval_secs.max(1))
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn route_colors(&self) -> RouteColors {
        RouteColors::from_entries(self.route_colors.iter().cloned())
    }
}
