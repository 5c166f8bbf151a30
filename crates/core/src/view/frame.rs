//! What the map surface draws.

use std::sync::Arc;

use busline_transit::{
    RouteColor, RouteColors, RouteKey, Stop, StopIdentifier, Vehicle, VehicleIdentifier,
};
use geo::Point;
use itertools::Itertools;

use crate::eta::EtaDisplay;
use crate::filter::{ColoredTrace, RouteSelection};

pub const NO_ARRIVALS_TEXT: &str = "No buses arriving soon";

// ============================================================================
// Markers
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct VehicleMarker {
    pub id: VehicleIdentifier,
    pub route: RouteKey,
    /// Interpolated position, not necessarily the last report
    pub position: Point,
    pub heading: f64,
    pub color: RouteColor,
    pub animating: bool,
    pub summary: VehicleSummary,
}

/// Popup text of a vehicle marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VehicleSummary {
    pub title: String,
    pub occupancy: Option<String>,
    pub wait: Option<String>,
}

impl VehicleSummary {
    pub fn of(vehicle: &Vehicle) -> Self {
        Self {
            title: format!("{} Bus #{}", vehicle.route_key(), vehicle.name),
            occupancy: vehicle.occupancy.map(|pax| format!("{pax}% full")),
            wait: vehicle.wait_suggestion.as_ref().map(|wait| {
                format!("Wait {} min at {}", wait.wait_minutes(), wait.stop_name)
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StopMarker {
    pub id: StopIdentifier,
    pub name: Arc<str>,
    pub position: Point,
    pub routes: Vec<RouteKey>,
}

impl StopMarker {
    pub(crate) fn new(stop: &Stop, position: Point) -> Self {
        Self {
            id: stop.id.clone(),
            name: Arc::clone(&stop.name),
            position,
            routes: stop
                .routes
                .iter()
                .map(|raw| RouteKey::normalize(raw))
                .unique()
                .collect(),
        }
    }
}

// ============================================================================
// Stop popups
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct EtaLine {
    pub route: RouteKey,
    pub text: String,
    pub badge: RouteColor,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EtaContent {
    Loading,
    NoArrivals,
    Lines(Vec<EtaLine>),
}

impl EtaContent {
    pub(crate) fn new(display: &EtaDisplay, colors: &RouteColors) -> Self {
        match display {
            EtaDisplay::Loading => EtaContent::Loading,
            EtaDisplay::NoArrivals => EtaContent::NoArrivals,
            EtaDisplay::Rows(rows) => EtaContent::Lines(
                rows.iter()
                    .map(|row| EtaLine {
                        route: row.route.clone(),
                        text: row.text(),
                        badge: colors.badge(&row.route),
                    })
                    .collect(),
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StopEtas {
    pub stop: StopIdentifier,
    pub content: EtaContent,
}

// ============================================================================
// Frame
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct RouteToggle {
    pub route: RouteKey,
    pub color: RouteColor,
    pub selected: bool,
}

/// Everything on screen at one instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderFrame {
    pub vehicles: Vec<VehicleMarker>,
    pub stops: Vec<StopMarker>,
    pub traces: Vec<ColoredTrace>,
    pub etas: Vec<StopEtas>,
    pub selection: RouteSelection,
    pub routes: Vec<RouteToggle>,
    /// Poll cycles applied so far
    pub poll_cycle: u64,
}

impl RenderFrame {
    pub fn vehicle(&self, id: &VehicleIdentifier) -> Option<&VehicleMarker> {
        self.vehicles.iter().find(|marker| marker.id == *id)
    }

    pub fn etas_for(&self, stop: &StopIdentifier) -> Option<&EtaContent> {
        self.etas
            .iter()
            .find(|etas| etas.stop == *stop)
            .map(|etas| &etas.content)
    }
}
