use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use trisync_core::{Checkpoint, CheckpointStore, import_id, select_since};
use trisync_ingest::{Normalize, read_export};
use trisync_ynab::{RunSummary, SyncOptions, YnabClient, run_sync};

mod config;
mod logging;
mod report;
mod source;
mod state;

use config::{Config, Secrets};
use source::ExportDirSource;

#[derive(Parser, Debug)]
#[command(
    name = "trisync",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TRISYNC_BUILD_SHA"), ")"),
    about = "Sync Triodos bank transactions into YNAB"
)]
struct Cli {
    /// Debug logging (overridden by TRISYNC_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push new bank transactions for every linked YNAB account
    Sync {
        /// Directory with `<IBAN>.csv` exports (default: bank.exports_dir)
        #[arg(long)]
        exports: Option<PathBuf>,

        /// Build everything but do not post to YNAB or move the checkpoint
        #[arg(long)]
        dry_run: bool,

        /// Also write the normalized transactions to `<dir>/<IBAN>.json`
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },

    /// Normalize a CSV export and print it with import ids (no network)
    Normalize {
        #[arg(long)]
        csv: PathBuf,

        /// Only rows dated after this day (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
    },

    /// Inspect or reset the last-import-date checkpoint
    Checkpoint {
        #[command(subcommand)]
        command: CheckpointCommand,
    },

    /// Manage ~/.trisync/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CheckpointCommand {
    /// Print the date the next sync starts after
    Show,
    /// Delete the checkpoint file
    Reset,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let cfg = config::load_config()?;

    match cli.command {
        Command::Sync {
            exports,
            dry_run,
            dump_dir,
        } => {
            sync(&cfg, exports, dry_run, dump_dir).await?;
        }

        Command::Normalize { csv, since } => {
            normalize(csv, since)?;
        }

        Command::Checkpoint { command } => {
            let store = cfg.checkpoint_store();
            match command {
                CheckpointCommand::Show => {
                    let cp = store.load(cfg.today()?);
                    let origin = if store.path().exists() { "stored" } else { "default" };
                    println!("{} ({origin}, {})", cp.last_import_date, store.path().display());
                }
                CheckpointCommand::Reset => {
                    if store.reset()? {
                        println!("Removed {}", store.path().display());
                    } else {
                        println!("No checkpoint at {}", store.path().display());
                    }
                }
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

async fn sync(cfg: &Config, exports: Option<PathBuf>, dry_run: bool, dump_dir: Option<PathBuf>) -> Result<()> {
    let secrets = Secrets::from_env()?;
    let today = cfg.today()?;

    let store = cfg.checkpoint_store();
    let checkpoint = store.load(today);
    info!(since = %checkpoint.last_import_date, path = %store.path().display(), "loaded checkpoint");

    let client = YnabClient::new(cfg.ynab.base_url.as_str(), &secrets.access_token)?;
    let mut source = ExportDirSource::new(exports.unwrap_or_else(|| cfg.bank.exports_dir.clone()));
    info!(dir = %source.dir().display(), "reading bank exports");

    let summary = run_sync(
        &client,
        &mut source,
        &checkpoint,
        &cfg.matcher(),
        SyncOptions { dry_run },
    )
    .await?;

    finish_run(&summary, &store, &checkpoint, today, dry_run, dump_dir.as_deref())?;

    let failed = summary.failures().count();
    if failed > 0 {
        warn!(failed, "some accounts were not synced");
        bail!("{failed} account(s) failed; re-run to retry, import ids prevent duplicates");
    }

    println!("All done!");
    Ok(())
}

/// Print the summary, move the checkpoint and write the optional dump.
/// Transactions are already posted by now, so a failed dump is only logged.
fn finish_run(
    summary: &RunSummary,
    store: &CheckpointStore,
    checkpoint: &Checkpoint,
    today: NaiveDate,
    dry_run: bool,
    dump_dir: Option<&Path>,
) -> Result<()> {
    report::print_summary(summary);

    // Saved once per run, after every account, even when some failed
    if !dry_run {
        let next = store.save(checkpoint, today)?;
        info!(last_import_date = %next, "checkpoint updated");
    }

    if let Some(dir) = dump_dir {
        match report::dump_transactions(dir, summary) {
            Ok(paths) => {
                for path in paths {
                    info!(path = %path.display(), "wrote transactions");
                }
            }
            Err(e) => error!(dir = %dir.display(), error = %format!("{e:#}"), "could not write transaction dump"),
        }
    }

    Ok(())
}

fn normalize(csv: PathBuf, since: Option<NaiveDate>) -> Result<()> {
    let rows = read_export(&csv)?;
    let total = rows.len();
    let rows = match since {
        Some(d) => select_since(rows, &Checkpoint::new(d)),
        None => rows,
    };

    println!("Parsed {} rows from {} ({} selected)\n", total, csv.display(), rows.len());

    for row in rows {
        let t = row
            .normalize()
            .with_context(|| format!("normalizing row dated {}", row.date))?;
        println!(
            "{} | {:>10} | {} | {} | {} | {}",
            t.date,
            report::format_milliunits(t.signed_amount()),
            t.payee,
            t.account_number
                .as_ref()
                .map(|i| i.to_string())
                .unwrap_or_else(|| "-".to_string()),
            t.description,
            import_id(&t),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trisync_core::{CheckpointPolicy, FlowType, Iban, Transaction};
    use trisync_ynab::{AccountOutcome, AccountReport};

    fn submitted_summary() -> RunSummary {
        RunSummary {
            reports: vec![AccountReport {
                budget: "Home".to_string(),
                account: Some("Joint".to_string()),
                iban: Iban::parse("NL70TRIO0123456789").ok(),
                outcome: AccountOutcome::Submitted { sent: 1, duplicates: 0 },
                transactions: vec![Transaction {
                    date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
                    amount: 1_000,
                    flow: FlowType::Outflow,
                    payee: "J Doe".to_string(),
                    description: "Groceries".to_string(),
                    account_number: None,
                }],
            }],
        }
    }

    #[test]
    fn test_checkpoint_saved_when_dump_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the dump directory should go
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let store = CheckpointStore::new(dir.path().join(".sync-config"), CheckpointPolicy::default());
        let today = NaiveDate::from_ymd_opt(2020, 3, 10).unwrap();
        let checkpoint = store.load(today);

        finish_run(
            &submitted_summary(),
            &store,
            &checkpoint,
            today,
            false,
            Some(&blocker.join("dump")),
        )
        .unwrap();

        assert_eq!(
            store.load(today).last_import_date,
            NaiveDate::from_ymd_opt(2020, 3, 7).unwrap()
        );
    }

    #[test]
    fn test_dry_run_leaves_checkpoint_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join(".sync-config"), CheckpointPolicy::default());
        let today = NaiveDate::from_ymd_opt(2020, 3, 10).unwrap();
        let dump = dir.path().join("dump");

        finish_run(&submitted_summary(), &store, &store.load(today), today, true, Some(&dump)).unwrap();

        assert!(!store.path().exists());
        assert!(dump.join("NL70TRIO0123456789.json").exists());
    }
}
