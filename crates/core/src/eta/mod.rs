//! Arrival estimates: label ranking, per-route grouping and the per-stop cache.

pub mod aggregate;
pub mod cache;
pub mod rank;

pub use aggregate::{EtaDisplay, EtaRow, aggregate};
pub use cache::{EtaCache, EtaTicket, RequestSeq};
pub use rank::{UNPARSABLE_RANK, rank_label};
