//! Wire shapes of the fleet feeds.
//!
//! These mirror the JSON exactly as the backend serves it. Numeric fields are
//! lenient: a feed may send `40.5` or `"40.5"`, and the domain layer decides
//! what to do when neither parses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A number that may arrive as a JSON number or as a numeric string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// The finite value of this field, if there is one.
    pub fn to_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse::<f64>().ok()?,
        };

        value.is_finite().then_some(value)
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Number(value)
    }
}

impl From<&str> for Numeric {
    fn from(value: &str) -> Self {
        Numeric::Text(value.to_owned())
    }
}

/// Entity identifiers are integers on some feeds and strings on others.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedId {
    Number(i64),
    Text(String),
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedId::Number(n) => write!(f, "{n}"),
            FeedId::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One item of `GET /buses`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDto {
    pub id: FeedId,
    #[serde(default)]
    pub name: Option<String>,
    pub route: String,
    pub lat: Numeric,
    pub lon: Numeric,
    #[serde(default)]
    pub course: Option<Numeric>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub pax_load: Option<Numeric>,
    #[serde(default)]
    pub wait_suggestion: Option<WaitSuggestionDto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitSuggestionDto {
    pub wait_seconds: Numeric,
    #[serde(default)]
    pub at_stop_id: Option<FeedId>,
    #[serde(default)]
    pub at_stop_name: Option<String>,
}

/// One item of `GET /stops`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StopDto {
    pub id: FeedId,
    pub name: String,
    pub latitude: Numeric,
    pub longitude: Numeric,
    #[serde(default)]
    pub routes: Vec<String>,
}

/// One item of `GET /eta/{stop_id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtaDto {
    pub route: String,
    pub eta: String,
}

/// Body of `GET /route_polyline/{path_key}`: `[lat, lon]` pairs.
pub type PathDto = Vec<[f64; 2]>;
