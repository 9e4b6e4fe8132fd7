//! Reduce either raw shape to a canonical [`Transaction`].
//!
//! Pure: no I/O, nothing read from the environment.

use trisync_core::{FlowType, Iban, Transaction, parse_amount, parse_date};

use crate::error::{IngestError, Result};
use crate::types::{RawCsvRow, RawDetailRecord};

pub const DESCRIPTION_MAX_CHARS: usize = 100;

pub trait Normalize {
    fn normalize(&self) -> Result<Transaction>;
}

impl Normalize for RawDetailRecord {
    fn normalize(&self) -> Result<Transaction> {
        let inflow = self.inflow.as_deref().filter(|s| !s.is_empty());
        let outflow = self.outflow.as_deref().filter(|s| !s.is_empty());

        // Inflow wins when both are filled in
        let (flow, raw_amount) = match (inflow, outflow) {
            (Some(a), _) => (FlowType::Inflow, a),
            (None, Some(a)) => (FlowType::Outflow, a),
            (None, None) => (FlowType::Outflow, ""),
        };

        let date = parse_date(&self.date).ok_or_else(|| IngestError::InvalidDate(self.date.clone()))?;
        let description = clean_description(&self.description);

        Ok(Transaction {
            date,
            amount: parse_amount(raw_amount).unwrap_or(0),
            flow,
            payee: payee_or_description(&self.name, &description),
            description,
            account_number: counterparty_iban(&self.counterparty_account),
        })
    }
}

impl Normalize for RawCsvRow {
    fn normalize(&self) -> Result<Transaction> {
        let flow = if self.is_credit() {
            FlowType::Inflow
        } else {
            FlowType::Outflow
        };
        let description = clean_description(&self.description);

        Ok(Transaction {
            date: self.booked(),
            amount: parse_amount(&self.amount).unwrap_or(0),
            flow,
            payee: payee_or_description(&self.payee_name, &description),
            description,
            account_number: counterparty_iban(&self.payee_account),
        })
    }
}

/// The bank appends a secondary field after a literal backslash; keep the
/// part before it, trimmed, capped at [`DESCRIPTION_MAX_CHARS`].
pub fn clean_description(raw: &str) -> String {
    let head = raw.split('\\').next().unwrap_or_default();
    head.trim().chars().take(DESCRIPTION_MAX_CHARS).collect()
}

fn payee_or_description(name: &str, description: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        description.to_string()
    } else {
        name.to_string()
    }
}

/// Invalid or empty counterparty accounts become `None`, never an error.
fn counterparty_iban(raw: &str) -> Option<Iban> {
    Iban::parse(raw).ok()
}
