//! Wire types for the YNAB v1 API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trisync_core::{LinkedAccount, Transaction, import_id};

pub const MEMO_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cleared {
    Cleared,
    Uncleared,
    Reconciled,
}

/// Transaction as posted to `POST /budgets/{id}/transactions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YnabTransaction {
    pub account_id: String,
    pub date: NaiveDate,
    pub payee_name: String,
    /// Signed milliunits: inflow positive, outflow negative
    pub amount: i64,
    pub memo: Option<String>,
    pub approved: bool,
    pub cleared: Cleared,
    pub import_id: String,
}

impl YnabTransaction {
    pub fn from_transaction(account_id: &str, txn: &Transaction) -> Self {
        let memo = if txn.description.is_empty() {
            None
        } else {
            Some(txn.description.chars().take(MEMO_MAX_CHARS).collect())
        };

        Self {
            account_id: account_id.to_string(),
            date: txn.date,
            payee_name: txn.payee.clone(),
            amount: txn.signed_amount(),
            memo,
            approved: false,
            cleared: Cleared::Cleared,
            import_id: import_id(txn),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveTransactionsRequest<'a> {
    pub transactions: &'a [YnabTransaction],
}

#[derive(Debug, Deserialize)]
pub(crate) struct BudgetsData {
    pub budgets: Vec<Budget>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountsData {
    pub accounts: Vec<LinkedAccount>,
}

/// Response of a bulk transaction create
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SavedTransactions {
    #[serde(default)]
    pub transaction_ids: Vec<String>,
    /// Import ids the budget already had; these were not created again
    #[serde(default)]
    pub duplicate_import_ids: Vec<String>,
}
