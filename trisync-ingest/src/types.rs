use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trisync_core::{Dated, parse_date};

use crate::error::{IngestError, Result};

/// Labels shown in the portal's transaction detail view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetailField {
    Inflow,
    Outflow,
    Date,
    Description,
    Name,
    CounterpartyAccount,
}

impl DetailField {
    pub const ALL: [DetailField; 6] = [
        DetailField::Inflow,
        DetailField::Outflow,
        DetailField::Date,
        DetailField::Description,
        DetailField::Name,
        DetailField::CounterpartyAccount,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DetailField::Inflow => "Bedrag bij",
            DetailField::Outflow => "Bedrag af",
            DetailField::Date => "Transactiedatum",
            DetailField::Description => "Omschrijving",
            DetailField::Name => "Naam",
            DetailField::CounterpartyAccount => "Tegenrekening",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_end_matches(':').trim_end();
        Self::ALL.into_iter().find(|f| f.label() == label)
    }
}

/// One transaction as scraped from the detail view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDetailRecord {
    /// `Bedrag bij`
    pub inflow: Option<String>,
    /// `Bedrag af`
    pub outflow: Option<String>,
    /// `Transactiedatum`, DD-MM-YYYY
    pub date: String,
    /// `Omschrijving`
    pub description: String,
    /// `Naam`
    pub name: String,
    /// `Tegenrekening`
    pub counterparty_account: String,
}

impl RawDetailRecord {
    /// Build a record from the label and value columns of the detail view,
    /// paired by position. Unknown labels are ignored; date, description,
    /// name and counterparty must be present, plus at least one amount.
    pub fn from_labeled<L, V>(labels: &[L], values: &[V]) -> Result<Self>
    where
        L: AsRef<str>,
        V: AsRef<str>,
    {
        if labels.len() != values.len() {
            return Err(IngestError::LabelValueMismatch {
                labels: labels.len(),
                values: values.len(),
            });
        }

        let pairs = labels
            .iter()
            .zip(values)
            .filter_map(|(l, v)| DetailField::from_label(l.as_ref()).map(|f| (f, v.as_ref().trim())));

        let mut inflow = None;
        let mut outflow = None;
        let mut date = None;
        let mut description = None;
        let mut name = None;
        let mut counterparty_account = None;

        for (field, value) in pairs {
            let slot = match field {
                DetailField::Inflow => &mut inflow,
                DetailField::Outflow => &mut outflow,
                DetailField::Date => &mut date,
                DetailField::Description => &mut description,
                DetailField::Name => &mut name,
                DetailField::CounterpartyAccount => &mut counterparty_account,
            };
            *slot = Some(value.to_string());
        }

        if inflow.is_none() && outflow.is_none() {
            return Err(IngestError::MissingAmount);
        }

        Ok(Self {
            inflow,
            outflow,
            date: date.ok_or(IngestError::MissingLabel(DetailField::Date))?,
            description: description.ok_or(IngestError::MissingLabel(DetailField::Description))?,
            name: name.ok_or(IngestError::MissingLabel(DetailField::Name))?,
            counterparty_account: counterparty_account
                .ok_or(IngestError::MissingLabel(DetailField::CounterpartyAccount))?,
        })
    }
}

/// One row of the bank's CSV export. Columns, in order: date, own account,
/// amount, type marker (`Credit` = inflow), counterparty name, counterparty
/// account, transaction code, description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCsvRow {
    pub date: String,
    pub to_account: String,
    pub amount: String,
    pub type_marker: String,
    pub payee_name: String,
    pub payee_account: String,
    pub code: String,
    pub description: String,
    booked: NaiveDate,
}

impl RawCsvRow {
    pub const COLUMNS: usize = 8;

    /// Validates the date column up front so rows can be filtered by date
    /// before normalization.
    pub fn from_fields(fields: [String; 8]) -> Result<Self> {
        let [date, to_account, amount, type_marker, payee_name, payee_account, code, description] = fields;
        let booked = parse_date(&date).ok_or_else(|| IngestError::InvalidDate(date.clone()))?;
        Ok(Self {
            date,
            to_account,
            amount,
            type_marker,
            payee_name,
            payee_account,
            code,
            description,
            booked,
        })
    }

    pub fn booked(&self) -> NaiveDate {
        self.booked
    }

    pub fn is_credit(&self) -> bool {
        self.type_marker.trim() == "Credit"
    }
}

impl Dated for RawCsvRow {
    fn listed_date(&self) -> NaiveDate {
        self.booked
    }
}
