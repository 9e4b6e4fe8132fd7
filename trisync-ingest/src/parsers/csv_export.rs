//! Reader for the bank's CSV transaction export.
//!
//! The export has no header row and exactly eight columns:
//!   01-03-2020,NL70TRIO0123456789,"150,00",Credit,J Doe,NL48BANK1111111111,Z001,Groceries\extra

use anyhow::{Context, Result};
use csv::ByteRecord;
use std::io::Read;
use std::path::Path;

use crate::error::IngestError;
use crate::types::RawCsvRow;

/// Parse an export file into raw rows. Blank lines are skipped; any
/// malformed row fails the whole file.
pub fn read_export(path: impl AsRef<Path>) -> Result<Vec<RawCsvRow>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_export(file).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_export(mut reader: impl Read) -> Result<Vec<RawCsvRow>> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input).context("reading export")?;

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(input.as_slice());

    let mut rows = Vec::new();
    let mut record = ByteRecord::new();

    while rdr.read_byte_record(&mut record)? {
        if record.iter().all(|f| f.iter().all(u8::is_ascii_whitespace)) {
            continue;
        }

        // Exports are not always UTF-8
        let fields: Vec<String> = record
            .iter()
            .map(|f| String::from_utf8_lossy(f).trim().to_string())
            .collect();

        let fields: [String; RawCsvRow::COLUMNS] = fields.try_into().map_err(|f: Vec<String>| {
            IngestError::ColumnCount {
                row: record_line(&input, &record),
                found: f.len(),
            }
        })?;

        rows.push(RawCsvRow::from_fields(fields)?);
    }

    Ok(rows)
}

/// 1-based file line the record starts on. The reader stamps a record with
/// the position before any blank lines it skipped, so those are added here.
fn record_line(input: &[u8], record: &ByteRecord) -> usize {
    let Some(pos) = record.position() else {
        return 0;
    };
    let skipped = input
        .get(pos.byte() as usize..)
        .unwrap_or_default()
        .iter()
        .take_while(|&&b| b == b'\n' || b == b'\r')
        .filter(|&&b| b == b'\n')
        .count();
    pos.line() as usize + skipped
}
