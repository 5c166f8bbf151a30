use std::sync::Arc;

use busline_transit::{EtaRecord, RouteKey};
use itertools::Itertools;

use crate::eta::rank::rank_label;

/// Display row for one route at a stop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EtaRow {
    pub route: RouteKey,
    /// Soonest labels first, as the feed wrote them
    pub labels: Vec<Arc<str>>,
    /// Rank of the soonest arrival on this route
    pub min_rank: i64,
}

impl EtaRow {
    pub fn text(&self) -> String {
        self.labels.iter().join(", ")
    }
}

/// What a stop's popup shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EtaDisplay {
    /// Requested, nothing accepted yet
    Loading,
    NoArrivals,
    Rows(Vec<EtaRow>),
}

impl EtaDisplay {
    pub fn from_records(records: &[EtaRecord], max_labels: usize) -> Self {
        if records.is_empty() {
            return EtaDisplay::NoArrivals;
        }
        EtaDisplay::Rows(aggregate(records, max_labels))
    }

    pub fn rows(&self) -> &[EtaRow] {
        match self {
            EtaDisplay::Rows(rows) => rows,
            EtaDisplay::Loading | EtaDisplay::NoArrivals => &[],
        }
    }
}

/// Group records by normalized route, soonest route first.
///
/// Each group keeps its `max_labels` soonest labels. Equal ranks keep feed
/// order, both within a group and between groups.
pub fn aggregate(records: &[EtaRecord], max_labels: usize) -> Vec<EtaRow> {
    let mut groups: Vec<(RouteKey, Vec<(i64, &Arc<str>)>)> = Vec::new();

    for record in records {
        let route = record.route_key();
        let ranked = (rank_label(&record.label), &record.label);

        match groups.iter_mut().find(|(key, _)| *key == route) {
            Some((_, entries)) => entries.push(ranked),
            None => groups.push((route, vec![ranked])),
        }
    }

    groups
        .into_iter()
        .map(|(route, mut entries)| {
            entries.sort_by_key(|(rank, _)| *rank);
            EtaRow {
                route,
                min_rank: entries[0].0,
                labels: entries
                    .iter()
                    .take(max_labels)
                    .map(|(_, label)| Arc::clone(label))
                    .collect(),
            }
        })
        .sorted_by_key(|row| row.min_rank)
        .collect()
}
