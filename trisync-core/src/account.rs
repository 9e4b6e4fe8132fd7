//! Decide which budgeting-service accounts map onto a bank account.
//!
//! An account is linked by putting the bank IBAN in its free-text note.

use serde::{Deserialize, Serialize};

use crate::iban::Iban;

/// Substring identifying an IBAN issued by the bank (its BIC prefix).
pub const DEFAULT_BANK_MARKER: &str = "TRIO";

/// A budgeting-service account and its note field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Note is a valid bank IBAN and not excluded
    Sync(Iban),
    /// Note is a valid bank IBAN but listed in the exclude list
    Excluded(Iban),
    /// Not linked to this bank
    NotLinked,
}

#[derive(Debug, Clone)]
pub struct AccountMatcher {
    marker: String,
    /// Electronic-form IBANs that are never synced
    exclude: Vec<String>,
}

impl Default for AccountMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_BANK_MARKER, Vec::<String>::new())
    }
}

impl AccountMatcher {
    /// Exclude entries may be given in print or electronic form.
    pub fn new<S: AsRef<str>>(marker: impl Into<String>, exclude: impl IntoIterator<Item = S>) -> Self {
        let exclude = exclude
            .into_iter()
            .map(|s| canonical(s.as_ref()))
            .collect();
        Self {
            marker: marker.into(),
            exclude,
        }
    }

    /// Note is non-empty, mentions the bank marker, validates as an IBAN,
    /// and is not on the exclude list.
    pub fn is_sync_target(&self, account: &LinkedAccount) -> bool {
        matches!(self.classify(account), MatchResult::Sync(_))
    }

    pub fn is_excluded(&self, iban: &Iban) -> bool {
        self.exclude.iter().any(|e| e == iban.electronic())
    }

    pub fn classify(&self, account: &LinkedAccount) -> MatchResult {
        let Some(note) = account.note.as_deref().filter(|n| !n.is_empty()) else {
            return MatchResult::NotLinked;
        };
        if !note.contains(&self.marker) {
            return MatchResult::NotLinked;
        }
        let Ok(iban) = Iban::parse(note) else {
            return MatchResult::NotLinked;
        };

        if self.is_excluded(&iban) {
            MatchResult::Excluded(iban)
        } else {
            MatchResult::Sync(iban)
        }
    }
}

/// Compact lookup key for an account note: separators removed, uppercased.
pub fn canonical_account_number(account: &LinkedAccount) -> String {
    canonical(account.note.as_deref().unwrap_or_default())
}

fn canonical(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
