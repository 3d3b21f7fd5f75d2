//! Row input and output.
//!
//! Two encodings are supported: a JSON array of objects, and JSON Lines
//! with one object per line.

use std::io::{BufRead, ErrorKind, Write};

use clap::ValueEnum;
use invoicegen_shared::types::Row;
use invoicegen_shared::{AppError, AppResult};

/// Row encoding on input and output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RowFormat {
    /// A single JSON array of row objects.
    #[default]
    Json,
    /// One JSON object per line.
    Jsonl,
}

/// Reads all rows from `reader`.
pub fn read_rows<R: BufRead>(reader: R, format: RowFormat) -> AppResult<Vec<Row>> {
    match format {
        RowFormat::Json => Ok(serde_json::from_reader(reader)?),
        RowFormat::Jsonl => {
            let mut rows = Vec::new();
            for (index, line) in reader.lines().enumerate() {
                let line = line.map_err(|e| {
                    if e.kind() == ErrorKind::InvalidData {
                        AppError::InvalidInput(format!("line {}: {e}", index + 1))
                    } else {
                        AppError::from(e)
                    }
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                let row = serde_json::from_str(&line).map_err(|e| {
                    AppError::InvalidInput(format!("line {}: {e}", index + 1))
                })?;
                rows.push(row);
            }
            Ok(rows)
        }
    }
}

/// Writes `rows` to `writer` and flushes it.
pub fn write_rows<W: Write>(mut writer: W, rows: &[Row], format: RowFormat) -> AppResult<()> {
    match format {
        RowFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, rows)?;
            writeln!(writer)?;
        }
        RowFormat::Jsonl => {
            for row in rows {
                serde_json::to_writer(&mut writer, row)?;
                writeln!(writer)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}
