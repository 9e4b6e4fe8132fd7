use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use trisync_core::Transaction;
use trisync_ynab::{AccountOutcome, AccountReport, RunSummary};

/// Milliunits as a decimal amount with two places, e.g. `-1234.56`
pub fn format_milliunits(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 1000, (abs % 1000) / 10)
}

pub fn describe(report: &AccountReport) -> String {
    let who = match (&report.account, &report.iban) {
        (Some(name), Some(iban)) => format!("{} / {} ({})", report.budget, name, iban),
        (Some(name), None) => format!("{} / {}", report.budget, name),
        _ => report.budget.clone(),
    };

    let what = match &report.outcome {
        AccountOutcome::Submitted { sent, duplicates } => {
            format!("sent {sent} ({duplicates} already imported)")
        }
        AccountOutcome::NothingNew => "nothing new".to_string(),
        AccountOutcome::Excluded => "excluded".to_string(),
        AccountOutcome::DryRun { count } => format!("dry run, {count} ready"),
        AccountOutcome::Failed { stage, message } => format!("FAILED to {stage}: {message}"),
    };

    format!("{who}: {what}")
}

pub fn print_summary(summary: &RunSummary) {
    if summary.reports.is_empty() {
        println!("No linked accounts found.");
        return;
    }
    for r in &summary.reports {
        println!("- {}", describe(r));
    }
    println!(
        "\nAccounts synced: {} | new transactions: {} | failures: {}",
        summary.synced_accounts(),
        summary.submitted(),
        summary.failures().count()
    );
}

/// Write each account's normalized transactions to `<dir>/<IBAN>.json`.
pub fn dump_transactions(dir: &Path, summary: &RunSummary) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    let mut written = Vec::new();
    for report in &summary.reports {
        let Some(iban) = &report.iban else { continue };
        if report.transactions.is_empty() {
            continue;
        }
        let path = dir.join(format!("{}.json", iban.electronic()));
        write_json(&path, &report.transactions)?;
        written.push(path);
    }
    Ok(written)
}

fn write_json(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let json = serde_json::to_string_pretty(transactions).context("serialize transactions")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))
}
