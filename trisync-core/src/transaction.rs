//! Canonical transaction shape shared by every raw input format

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::iban::Iban;

/// Direction of a transaction. The amount itself is always unsigned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FlowType {
    #[serde(rename = "inflow")]
    Inflow,
    #[serde(rename = "outflow")]
    Outflow,
}

impl FlowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Inflow => "inflow",
            FlowType::Outflow => "outflow",
        }
    }

    /// Apply this direction to an unsigned amount.
    pub fn signed(&self, amount: u64) -> i64 {
        let magnitude = i64::try_from(amount).unwrap_or(i64::MAX);
        match self {
            FlowType::Inflow => magnitude,
            FlowType::Outflow => -magnitude,
        }
    }
}

/// A bank transaction after normalization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Booking date (calendar date, no time component)
    pub date: NaiveDate,
    /// Non-negative amount in milliunits; the sign lives in `flow`
    pub amount: u64,
    #[serde(rename = "type")]
    pub flow: FlowType,
    /// Counterparty name, or the description when the bank has none
    pub payee: String,
    /// First segment of the bank description, trimmed, at most 100 chars
    pub description: String,
    /// Counterparty IBAN, absent when the raw value did not validate
    pub account_number: Option<Iban>,
}

impl Transaction {
    pub fn is_inflow(&self) -> bool {
        self.flow == FlowType::Inflow
    }

    /// Amount with the direction applied (inflow positive)
    pub fn signed_amount(&self) -> i64 {
        self.flow.signed(self.amount)
    }
}
