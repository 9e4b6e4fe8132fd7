//! trisync-ynab: YNAB API client, payload mapping, and the sync run loop

pub mod client;
pub mod sync;
pub mod types;

pub use client::{ApiError, BudgetApi, DEFAULT_BASE_URL, YnabClient};
pub use sync::{AccountOutcome, AccountReport, BankSource, FailureStage, RunSummary, SyncOptions, run_sync};
pub use types::{Budget, Cleared, SavedTransactions, YnabTransaction};
