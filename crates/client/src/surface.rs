//! Headless stand-in for a map surface: logs what would be drawn.

use std::collections::HashMap;

use busline_core::view::{EtaContent, NO_ARRIVALS_TEXT, RenderFrame};
use busline_transit::StopIdentifier;
use tracing::{debug, info};

#[derive(Default)]
pub struct HeadlessSurface {
    last_cycle: Option<u64>,
    popups: HashMap<StopIdentifier, EtaContent>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, frame: &RenderFrame) {
        if self.last_cycle != Some(frame.poll_cycle) {
            self.last_cycle = Some(frame.poll_cycle);
            self.draw_cycle(frame);
        } else {
            let moving = frame.vehicles.iter().filter(|v| v.animating).count();
            debug!(cycle = frame.poll_cycle, moving, "animation frame");
        }

        for etas in &frame.etas {
            if self.popups.get(&etas.stop) == Some(&etas.content) {
                continue;
            }
            for line in popup_lines(&etas.content) {
                info!(stop = %etas.stop, "{line}");
            }
            self.popups.insert(etas.stop.clone(), etas.content.clone());
        }
    }

    fn draw_cycle(&self, frame: &RenderFrame) {
        info!(
            cycle = frame.poll_cycle,
            vehicles = frame.vehicles.len(),
            stops = frame.stops.len(),
            traces = frame.traces.len(),
            selected = ?frame.selection.selected(),
            "poll cycle"
        );

        for marker in &frame.vehicles {
            debug!(
                vehicle = %marker.id,
                lat = marker.position.y(),
                lon = marker.position.x(),
                heading = marker.heading,
                color = %marker.color,
                occupancy = marker.summary.occupancy.as_deref().unwrap_or("-"),
                wait = marker.summary.wait.as_deref().unwrap_or("-"),
                "{}",
                marker.summary.title
            );
        }
    }
}

/// Text of a stop popup, one entry per line.
pub fn popup_lines(content: &EtaContent) -> Vec<String> {
    match content {
        EtaContent::Loading => vec!["Loading...".to_owned()],
        EtaContent::NoArrivals => vec![NO_ARRIVALS_TEXT.to_owned()],
        EtaContent::Lines(lines) => lines
            .iter()
            .map(|line| format!("[{}] {}: {}", line.badge, line.route, line.text))
            .collect(),
    }
}
