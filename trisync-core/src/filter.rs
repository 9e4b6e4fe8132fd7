//! Cheap pre-filter on listing rows before the per-row detail fetch.

use chrono::NaiveDate;

use crate::checkpoint::Checkpoint;

/// A listing row whose date can be read without fetching its detail.
pub trait Dated {
    fn listed_date(&self) -> NaiveDate;
}

impl Dated for NaiveDate {
    fn listed_date(&self) -> NaiveDate {
        *self
    }
}

/// Keep rows dated strictly after the checkpoint, in their original order.
///
/// Only a cost gate: rows in the overlap window are deduplicated downstream
/// by their import id.
pub fn select_since<R: Dated>(rows: impl IntoIterator<Item = R>, checkpoint: &Checkpoint) -> Vec<R> {
    rows.into_iter()
        .filter(|row| row.listed_date() > checkpoint.last_import_date)
        .collect()
}
