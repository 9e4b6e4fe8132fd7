//! One sync run: budgets → linked accounts → new bank transactions → YNAB.
//!
//! Runs strictly sequentially. A failure while handling one account is
//! recorded in the [`RunSummary`] and the run moves on to the next account;
//! only failing to list budgets aborts the run.

use anyhow::{Context, Result};
use std::fmt;
use tracing::{debug, error, info, warn};
use trisync_core::{AccountMatcher, Checkpoint, Dated, Iban, LinkedAccount, MatchResult, Transaction, select_since};

use crate::client::BudgetApi;
use crate::types::{Budget, YnabTransaction};

/// Where bank transactions come from.
///
/// Listing is cheap and yields dated rows; fetching a row's detail may be
/// expensive, so only rows newer than the checkpoint are fetched.
#[allow(async_fn_in_trait)]
pub trait BankSource {
    type Row: Dated;

    async fn list_rows(&mut self, iban: &Iban) -> Result<Vec<Self::Row>>;

    async fn fetch_detail(&mut self, row: Self::Row) -> Result<Transaction>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Build payloads but do not post them
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    ListAccounts,
    Fetch,
    Submit,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureStage::ListAccounts => "list accounts",
            FailureStage::Fetch => "fetch transactions",
            FailureStage::Submit => "submit transactions",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    Submitted { sent: usize, duplicates: usize },
    NothingNew,
    Excluded,
    DryRun { count: usize },
    Failed { stage: FailureStage, message: String },
}

#[derive(Debug, Clone)]
pub struct AccountReport {
    pub budget: String,
    /// `None` when the budget's accounts could not be listed
    pub account: Option<String>,
    pub iban: Option<Iban>,
    pub outcome: AccountOutcome,
    /// Transactions normalized for this account, whether or not they were sent
    pub transactions: Vec<Transaction>,
}

impl AccountReport {
    fn new(budget: &Budget, account: &LinkedAccount, iban: Iban, outcome: AccountOutcome) -> Self {
        Self {
            budget: budget.name.clone(),
            account: Some(account.name.clone()),
            iban: Some(iban),
            outcome,
            transactions: Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, AccountOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<AccountReport>,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &AccountReport> {
        self.reports.iter().filter(|r| r.is_failure())
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Transactions accepted by the API as new
    pub fn submitted(&self) -> usize {
        self.reports
            .iter()
            .map(|r| match r.outcome {
                AccountOutcome::Submitted { sent, duplicates } => sent.saturating_sub(duplicates),
                _ => 0,
            })
            .sum()
    }

    pub fn synced_accounts(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, AccountOutcome::Submitted { .. } | AccountOutcome::NothingNew))
            .count()
    }
}

pub async fn run_sync<A, S>(
    api: &A,
    source: &mut S,
    checkpoint: &Checkpoint,
    matcher: &AccountMatcher,
    options: SyncOptions,
) -> Result<RunSummary>
where
    A: BudgetApi,
    S: BankSource,
{
    info!("fetching budgets");
    let budgets = api.budgets().await.context("listing budgets")?;

    let mut summary = RunSummary::default();

    for budget in &budgets {
        info!(budget = %budget.name, "fetching accounts");

        let accounts = match api.accounts(&budget.id).await {
            Ok(a) => a,
            Err(e) => {
                error!(budget = %budget.name, error = %e, "could not list accounts");
                summary.reports.push(AccountReport {
                    budget: budget.name.clone(),
                    account: None,
                    iban: None,
                    outcome: AccountOutcome::Failed {
                        stage: FailureStage::ListAccounts,
                        message: e.to_string(),
                    },
                    transactions: Vec::new(),
                });
                continue;
            }
        };

        for account in &accounts {
            let iban = match matcher.classify(account) {
                MatchResult::NotLinked => continue,
                MatchResult::Excluded(iban) => {
                    info!(account = %account.name, iban = %iban, "ignoring excluded IBAN");
                    summary
                        .reports
                        .push(AccountReport::new(budget, account, iban, AccountOutcome::Excluded));
                    continue;
                }
                MatchResult::Sync(iban) => iban,
            };

            let report = sync_account(api, source, budget, account, iban, checkpoint, options).await;
            summary.reports.push(report);
        }
    }

    Ok(summary)
}

async fn sync_account<A, S>(
    api: &A,
    source: &mut S,
    budget: &Budget,
    account: &LinkedAccount,
    iban: Iban,
    checkpoint: &Checkpoint,
    options: SyncOptions,
) -> AccountReport
where
    A: BudgetApi,
    S: BankSource,
{
    info!(account = %account.name, iban = %iban.electronic(), "fetching transactions");

    let fail = |stage: FailureStage, e: &dyn fmt::Display| {
        warn!(account = %account.name, %stage, error = %e, "account skipped");
        AccountOutcome::Failed {
            stage,
            message: e.to_string(),
        }
    };

    let rows = match source.list_rows(&iban).await {
        Ok(rows) => rows,
        Err(e) => {
            let outcome = fail(FailureStage::Fetch, &format!("{e:#}"));
            return AccountReport::new(budget, account, iban, outcome);
        }
    };

    let listed = rows.len();
    let rows = select_since(rows, checkpoint);
    debug!(listed, selected = rows.len(), since = %checkpoint.last_import_date, "filtered rows");

    let mut transactions = Vec::with_capacity(rows.len());
    for row in rows {
        match source.fetch_detail(row).await {
            Ok(t) => transactions.push(t),
            Err(e) => {
                let outcome = fail(FailureStage::Fetch, &format!("{e:#}"));
                return AccountReport::new(budget, account, iban, outcome);
            }
        }
    }

    let payload: Vec<YnabTransaction> = transactions
        .iter()
        .map(|t| YnabTransaction::from_transaction(&account.id, t))
        .collect();

    let outcome = if payload.is_empty() {
        info!(account = %account.name, "no new transactions");
        AccountOutcome::NothingNew
    } else if options.dry_run {
        info!(account = %account.name, count = payload.len(), "dry run, not sending");
        AccountOutcome::DryRun { count: payload.len() }
    } else {
        info!(account = %account.name, count = payload.len(), "sending transactions to YNAB");
        match api.create_transactions(&budget.id, &payload).await {
            Ok(saved) => {
                if !saved.duplicate_import_ids.is_empty() {
                    debug!(duplicates = saved.duplicate_import_ids.len(), "already imported");
                }
                AccountOutcome::Submitted {
                    sent: payload.len(),
                    duplicates: saved.duplicate_import_ids.len(),
                }
            }
            Err(e) => fail(FailureStage::Submit, &e),
        }
    };

    AccountReport {
        transactions,
        ..AccountReport::new(budget, account, iban, outcome)
    }
}
