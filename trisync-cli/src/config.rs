use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use trisync_core::checkpoint::{DEFAULT_INITIAL_LOOKBACK_DAYS, DEFAULT_RESCAN_LOOKBACK_DAYS};
use trisync_core::{AccountMatcher, CheckpointPolicy, CheckpointStore, account::DEFAULT_BANK_MARKER};

use crate::state::ensure_trisync_home;

pub const ACCESS_TOKEN_VAR: &str = "YNAB_ACCESS_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ynab: YnabSection,
    #[serde(default)]
    pub bank: BankSection,
    #[serde(default)]
    pub checkpoint: CheckpointSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YnabSection {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSection {
    /// Substring an account note must contain to be synced
    pub marker: String,
    /// IBANs never synced, even when linked
    #[serde(default)]
    pub exclude_ibans: Vec<String>,
    /// Directory holding `<IBAN>.csv` exports
    pub exports_dir: PathBuf,
    /// IANA timezone used to decide what "today" is
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointSection {
    pub path: PathBuf,
    pub initial_lookback_days: u64,
    pub rescan_lookback_days: u64,
}

impl Default for YnabSection {
    fn default() -> Self {
        Self {
            base_url: trisync_ynab::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for BankSection {
    fn default() -> Self {
        Self {
            marker: DEFAULT_BANK_MARKER.to_string(),
            exclude_ibans: Vec::new(),
            exports_dir: PathBuf::from("tmp"),
            timezone: "Europe/Amsterdam".to_string(),
        }
    }
}

impl Default for CheckpointSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".sync-config"),
            initial_lookback_days: DEFAULT_INITIAL_LOOKBACK_DAYS,
            rescan_lookback_days: DEFAULT_RESCAN_LOOKBACK_DAYS,
        }
    }
}

impl Config {
    pub fn matcher(&self) -> AccountMatcher {
        AccountMatcher::new(self.bank.marker.clone(), &self.bank.exclude_ibans)
    }

    pub fn checkpoint_store(&self) -> CheckpointStore {
        CheckpointStore::new(
            self.checkpoint.path.clone(),
            CheckpointPolicy {
                initial_lookback_days: self.checkpoint.initial_lookback_days,
                rescan_lookback_days: self.checkpoint.rescan_lookback_days,
            },
        )
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.bank
            .timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid timezone: {}", self.bank.timezone))
    }

    /// Today's date in the configured timezone
    pub fn today(&self) -> Result<NaiveDate> {
        let tz = self.timezone()?;
        Ok(chrono::Utc::now().with_timezone(&tz).date_naive())
    }
}

/// Secrets are only ever read from the environment (or `.env`).
#[derive(Clone)]
pub struct Secrets {
    pub access_token: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets").field("access_token", &"<redacted>").finish()
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        match lookup(ACCESS_TOKEN_VAR).map(|s| s.trim().to_string()) {
            Some(token) if !token.is_empty() => Ok(Self { access_token: token }),
            _ => bail!("No {ACCESS_TOKEN_VAR} found! Set it in the environment or in .env"),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_trisync_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}
