//! Route-based narrowing of what reaches the map.
//!
//! [`filter_view`] is a pure function of its arguments: it holds no state and
//! calling it twice with the same inputs yields the same view.

use std::sync::Arc;

use busline_transit::{PathTrace, RouteColor, RouteColors, RouteKey, Stop, Vehicle};
use geo::Point;

/// The route the user focused, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteSelection(Option<RouteKey>);

impl RouteSelection {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn route(route: RouteKey) -> Self {
        Self(Some(route))
    }

    pub fn selected(&self) -> Option<&RouteKey> {
        self.0.as_ref()
    }

    pub fn is_selected(&self, route: &RouteKey) -> bool {
        self.0.as_ref() == Some(route)
    }

    /// Selecting the selected route clears the selection.
    pub fn toggle(&mut self, route: RouteKey) {
        if self.is_selected(&route) {
            self.0 = None;
        } else {
            self.0 = Some(route);
        }
    }
}

/// A path trace and the color it is drawn in.
#[derive(Clone, Debug, PartialEq)]
pub struct ColoredTrace {
    pub trace: Arc<PathTrace>,
    pub color: RouteColor,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilteredView {
    pub vehicles: Vec<Vehicle>,
    pub stops: Vec<Stop>,
    pub traces: Vec<ColoredTrace>,
}

impl FilteredView {
    /// Vehicles that can be drawn, with their reported position.
    pub fn renderable_vehicles(&self) -> impl Iterator<Item = (&Vehicle, Point)> {
        self.vehicles
            .iter()
            .filter_map(|vehicle| vehicle.location.map(|location| (vehicle, location)))
    }

    pub fn renderable_stops(&self) -> impl Iterator<Item = (&Stop, Point)> {
        self.stops
            .iter()
            .filter_map(|stop| stop.location.map(|location| (stop, location)))
    }
}

pub fn filter_view(
    vehicles: &[Vehicle],
    stops: &[Stop],
    traces: &[Arc<PathTrace>],
    selection: &RouteSelection,
    colors: &RouteColors,
) -> FilteredView {
    let Some(route) = selection.selected() else {
        return FilteredView {
            vehicles: vehicles.to_vec(),
            stops: stops.to_vec(),
            traces: traces
                .iter()
                .map(|trace| ColoredTrace {
                    trace: Arc::clone(trace),
                    color: colors.unselected_trace,
                })
                .collect(),
        };
    };

    FilteredView {
        vehicles: vehicles
            .iter()
            .filter(|vehicle| vehicle.route_key() == *route)
            .cloned()
            .collect(),
        stops: stops
            .iter()
            .filter(|stop| stop.serves(route))
            .cloned()
            .collect(),
        traces: traces
            .iter()
            .filter(|trace| trace.route == *route)
            .map(|trace| ColoredTrace {
                trace: Arc::clone(trace),
                color: colors.selected_trace(route),
            })
            .collect(),
    }
}
