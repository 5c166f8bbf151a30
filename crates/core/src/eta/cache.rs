//! Per-stop ETA cache with request tagging.
//!
//! Every fetch is issued a ticket carrying the stop and a sequence number that
//! only grows. A response is accepted only when its ticket is still the latest
//! one issued for that stop, so a slow early response can never overwrite a
//! later one.

use std::collections::HashMap;

use busline_transit::{EtaRecord, StopIdentifier};
use tracing::debug;

use crate::eta::aggregate::EtaDisplay;

static LOADING: EtaDisplay = EtaDisplay::Loading;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestSeq(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EtaTicket {
    pub stop: StopIdentifier,
    pub seq: RequestSeq,
}

#[derive(Debug)]
struct Entry {
    latest: RequestSeq,
    display: Option<EtaDisplay>,
}

#[derive(Debug)]
pub struct EtaCache {
    next_seq: u64,
    max_labels: usize,
    entries: HashMap<StopIdentifier, Entry>,
}

impl EtaCache {
    pub fn new(max_labels: usize) -> Self {
        Self {
            next_seq: 0,
            max_labels,
            entries: HashMap::new(),
        }
    }

    /// Tag a new request for `stop`. Any older ticket for it becomes stale.
    pub fn issue(&mut self, stop: StopIdentifier) -> EtaTicket {
        self.next_seq += 1;
        let seq = RequestSeq(self.next_seq);

        self.entries
            .entry(stop.clone())
            .and_modify(|entry| entry.latest = seq)
            .or_insert(Entry {
                latest: seq,
                display: None,
            });

        EtaTicket { stop, seq }
    }

    pub fn is_current(&self, ticket: &EtaTicket) -> bool {
        self.entries
            .get(&ticket.stop)
            .is_some_and(|entry| entry.latest == ticket.seq)
    }

    /// Replace the cached rows for the ticket's stop. Returns `false` and
    /// changes nothing when the ticket is stale.
    pub fn accept(&mut self, ticket: &EtaTicket, records: &[EtaRecord]) -> bool {
        if !self.is_current(ticket) {
            debug!(stop = %ticket.stop, seq = ticket.seq.0, "discarding stale eta response");
            return false;
        }

        let display = EtaDisplay::from_records(records, self.max_labels);
        if let Some(entry) = self.entries.get_mut(&ticket.stop) {
            entry.display = Some(display);
        }
        true
    }

    /// What the stop's popup shows, or `None` if it was never requested.
    pub fn display(&self, stop: &StopIdentifier) -> Option<&EtaDisplay> {
        self.entries
            .get(stop)
            .map(|entry| entry.display.as_ref().unwrap_or(&LOADING))
    }

    /// Requested stops, in a stable order.
    pub fn stops(&self) -> Vec<&StopIdentifier> {
        let mut stops: Vec<_> = self.entries.keys().collect();
        stops.sort();
        stops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: &str) -> StopIdentifier {
        StopIdentifier::new(id)
    }

    #[test]
    fn test_loading_until_accepted() {
        let mut cache = EtaCache::new(3);
        assert!(cache.display(&stop("10034")).is_none());

        let ticket = cache.issue(stop("10034"));
        assert_eq!(cache.display(&stop("10034")), Some(&EtaDisplay::Loading));

        assert!(cache.accept(&ticket, &[]));
        assert_eq!(cache.display(&stop("10034")), Some(&EtaDisplay::NoArrivals));
    }

    #[test]
    fn test_late_response_of_older_request_is_discarded() {
        let mut cache = EtaCache::new(3);
        let first = cache.issue(stop("10034"));
        let second = cache.issue(stop("10034"));

        assert!(cache.accept(&second, &[EtaRecord::new("A Route", "Arriving")]));
        assert!(!cache.accept(&first, &[EtaRecord::new("A Route", "12 min")]));

        let rows = cache.display(&stop("10034")).unwrap().rows();
        assert_eq!(rows[0].labels[0].as_ref(), "Arriving");
    }

    #[test]
    fn test_tickets_are_per_stop() {
        let mut cache = EtaCache::new(3);
        let a = cache.issue(stop("1"));
        let b = cache.issue(stop("2"));

        assert!(cache.is_current(&a));
        assert!(cache.is_current(&b));
        assert!(a.seq < b.seq);
        assert_eq!(cache.stops(), vec![&stop("1"), &stop("2")]);
    }

    #[test]
    fn test_reissue_keeps_previous_rows_until_replaced() {
        let mut cache = EtaCache::new(3);
        let first = cache.issue(stop("1"));
        cache.accept(&first, &[EtaRecord::new("H", "4 min")]);

        cache.issue(stop("1"));
        assert_eq!(cache.display(&stop("1")).unwrap().rows().len(), 1);
    }
}
