//! Route display colors.

use std::fmt;
use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::identifiers::RouteKey;
use crate::models::types::TransitError;

/// An opaque sRGB color, written as `#RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteColor(Srgb<u8>);

impl RouteColor {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self(Srgb::new(red, green, blue))
    }

    pub fn srgb(&self) -> Srgb<u8> {
        self.0
    }
}

impl FromStr for RouteColor {
    type Err = TransitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Srgb::<u8>::from_str(s.trim())
            .map(Self)
            .map_err(|e| TransitError::InvalidData(format!("color {s:?}: {e}")))
    }
}

impl TryFrom<String> for RouteColor {
    type Error = TransitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RouteColor> for String {
    fn from(color: RouteColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for RouteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0.red, self.0.green, self.0.blue)
    }
}

/// A route and its registered color, as written in configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteColorEntry {
    pub route: String,
    pub color: RouteColor,
}

/// Registered route colors plus the fallbacks used when drawing.
///
/// The entry order is the order routes are offered for selection, and the set
/// of registered routes is the set whose path traces get fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteColors {
    entries: Vec<(RouteKey, RouteColor)>,
    /// Every trace when no route is selected
    pub unselected_trace: RouteColor,
    /// Selected trace of a route with no registered color
    pub selected_fallback: RouteColor,
    /// ETA badge of a route with no registered color
    pub badge_fallback: RouteColor,
}

impl RouteColors {
    pub fn from_entries(entries: impl IntoIterator<Item = RouteColorEntry>) -> Self {
        let mut colors = Self {
            entries: Vec::new(),
            ..Self::default()
        };

        for entry in entries {
            colors.insert(RouteKey::normalize(&entry.route), entry.color);
        }

        colors
    }

    /// Register or recolor a route. A new route is appended to the end.
    pub fn insert(&mut self, route: RouteKey, color: RouteColor) {
        match self.entries.iter_mut().find(|(key, _)| *key == route) {
            Some((_, existing)) => *existing = color,
            None => self.entries.push((route, color)),
        }
    }

    pub fn get(&self, route: &RouteKey) -> Option<RouteColor> {
        self.entries
            .iter()
            .find(|(key, _)| key == route)
            .map(|(_, color)| *color)
    }

    pub fn known_routes(&self) -> impl Iterator<Item = &RouteKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn selected_trace(&self, route: &RouteKey) -> RouteColor {
        self.get(route).unwrap_or(self.selected_fallback)
    }

    pub fn badge(&self, route: &RouteKey) -> RouteColor {
        self.get(route).unwrap_or(self.badge_fallback)
    }

    pub fn entries(&self) -> Vec<RouteColorEntry> {
        self.entries
            .iter()
            .map(|(route, color)| RouteColorEntry {
                route: route.to_string(),
                color: *color,
            })
            .collect()
    }
}

impl Default for RouteColors {
    fn default() -> Self {
        let entries = [
            ("EE", RouteColor::rgb(0xFF, 0x80, 0x00)),
            ("F", RouteColor::rgb(0xFF, 0x00, 0x00)),
            ("REXL", RouteColor::rgb(0x66, 0xB2, 0xFF)),
            ("REXB", RouteColor::rgb(0x66, 0x33, 0x00)),
            ("A", RouteColor::rgb(0xFF, 0x00, 0xFF)),
            ("H", RouteColor::rgb(0x00, 0x00, 0x99)),
            ("C", RouteColor::rgb(0x00, 0x80, 0x80)),
            ("LX", RouteColor::rgb(0xCC, 0x99, 0xFF)),
            ("B", RouteColor::rgb(0xFF, 0xFF, 0x00)),
            ("B/L Loop", RouteColor::rgb(0x99, 0x66, 0x33)),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(route, color)| (RouteKey::new(route), color))
                .collect(),
            unselected_trace: RouteColor::rgb(0xFF, 0x00, 0x00),
            selected_fallback: RouteColor::rgb(0x00, 0x00, 0xFF),
            badge_fallback: RouteColor::rgb(0x99, 0x99, 0x99),
        }
    }
}
