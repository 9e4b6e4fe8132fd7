//! Bank source backed by a directory of CSV exports, one per account.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use trisync_core::{Iban, Transaction};
use trisync_ingest::{Normalize, RawCsvRow, read_export};
use trisync_ynab::BankSource;

#[derive(Debug, Clone)]
pub struct ExportDirSource {
    dir: PathBuf,
}

impl ExportDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/<IBAN in electronic form>.csv`
    pub fn export_path(&self, iban: &Iban) -> PathBuf {
        self.dir.join(format!("{}.csv", iban.electronic()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl BankSource for ExportDirSource {
    type Row = RawCsvRow;

    async fn list_rows(&mut self, iban: &Iban) -> Result<Vec<RawCsvRow>> {
        let path = self.export_path(iban);
        if !path.exists() {
            anyhow::bail!("no export for {} at {}", iban, path.display());
        }
        read_export(&path)
    }

    async fn fetch_detail(&mut self, row: RawCsvRow) -> Result<Transaction> {
        row.normalize()
            .with_context(|| format!("normalizing row dated {}", row.date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use trisync_core::{Checkpoint, FlowType, select_since};

    const EXPORT: &str = "\
05-03-2020,NL70TRIO0123456789,\"42,00\",Credit,Werkgever BV,NL91ABNA0417164300,OV,Salaris\\maart
06-03-2020,NL70TRIO0123456789,\"3,10\",Debet,,,BA,Koffie\\pas 12
";

    #[tokio::test]
    async fn test_reads_export_for_iban() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("NL70TRIO0123456789.csv"), EXPORT).unwrap();

        let mut source = ExportDirSource::new(dir.path());
        let iban = Iban::parse("NL70 TRIO 0123 4567 89").unwrap();
        let rows = source.list_rows(&iban).await.unwrap();
        assert_eq!(rows.len(), 2);

        let since = Checkpoint::new(NaiveDate::from_ymd_opt(2020, 3, 5).unwrap());
        let mut picked = select_since(rows, &since);
        assert_eq!(picked.len(), 1);

        let txn = source.fetch_detail(picked.remove(0)).await.unwrap();
        assert_eq!(txn.flow, FlowType::Outflow);
        assert_eq!(txn.payee, "Koffie");
        assert_eq!(txn.amount, 3_100);
    }

    #[tokio::test]
    async fn test_missing_export_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ExportDirSource::new(dir.path());
        let iban = Iban::parse("NL63TRIO0212345678").unwrap();
        let err = source.list_rows(&iban).await.unwrap_err();
        assert!(err.to_string().contains("NL63TRIO0212345678.csv"));
    }
}
