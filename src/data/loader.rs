//! Dataset loading and contract validation
//!
//! Tender datasets arrive as CSV, JSON, or Parquet exports of the scraper
//! database. Every consumer in this crate assumes the base contract columns
//! are present; enrichment adds the PDF-derived columns on top.

use crate::error::{Result, TenderError};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Columns every tender record carries
pub const CONTRACT_COLUMNS: [&str; 5] = ["title", "ca", "procedure", "pdf_url", "bid"];

/// Columns added by PDF enrichment
pub const ENRICHED_COLUMNS: [&str; 3] = ["pdf_text", "detected_codes", "codes_count"];

/// Load a dataset, dispatching on the file extension
pub fn load_dataframe(path: &Path) -> Result<DataFrame> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let df = match ext.as_str() {
        "csv" => CsvReadOptions::default()
            .with_infer_schema_length(Some(1000))
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        "json" => JsonReader::new(File::open(path)?).finish()?,
        "parquet" => ParquetReader::new(File::open(path)?).finish()?,
        _ => {
            return Err(TenderError::DataError(format!(
                "Unsupported file format: '{}' (expected csv, json, or parquet)",
                ext
            )))
        }
    };

    debug!(
        rows = df.height(),
        cols = df.width(),
        path = %path.display(),
        "dataset loaded"
    );
    Ok(df)
}

/// Check that a frame carries the tender record contract.
///
/// All missing columns are reported at once rather than one at a time.
pub fn validate_contract(df: &DataFrame, enriched: bool) -> Result<()> {
    let present: HashSet<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();

    let mut missing: Vec<&str> = CONTRACT_COLUMNS
        .iter()
        .filter(|c| !present.contains(**c))
        .copied()
        .collect();
    if enriched {
        missing.extend(
            ENRICHED_COLUMNS
                .iter()
                .filter(|c| !present.contains(**c))
                .copied(),
        );
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(TenderError::DataError(format!(
            "missing contract columns: {}",
            missing.join(", ")
        )))
    }
}

/// Write a frame as CSV
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    debug!(rows = df.height(), path = %path.display(), "csv written");
    Ok(())
}

/// Write a frame as Parquet
pub fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    ParquetWriter::new(file).finish(df)?;
    debug!(rows = df.height(), path = %path.display(), "parquet written");
    Ok(())
}

/// Write a frame, dispatching on the file extension
pub fn write_dataframe(df: &mut DataFrame, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => write_csv(df, path),
        "parquet" => write_parquet(df, path),
        _ => Err(TenderError::DataError(format!(
            "Unsupported output format: '{}' (expected csv or parquet)",
            ext
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_frame() -> DataFrame {
        df! {
            "title" => ["Road resurfacing", "IT support services"],
            "ca" => ["Council A", "Council B"],
            "procedure" => ["Open", "Open"],
            "pdf_url" => ["http://a/x.pdf", ""],
            "bid" => [Some(1i64), None],
        }
        .unwrap()
    }

    #[test]
    fn test_validate_contract_base() {
        let df = base_frame();
        assert!(validate_contract(&df, false).is_ok());

        let r = validate_contract(&df, true);
        assert!(r.is_err());
        let msg = r.unwrap_err().to_string();
        assert!(msg.contains("pdf_text"));
        assert!(msg.contains("detected_codes"));
        assert!(msg.contains("codes_count"));
    }

    #[test]
    fn test_validate_contract_reports_all_missing() {
        let df = df! { "title" => ["x"] }.unwrap();
        let msg = validate_contract(&df, false).unwrap_err().to_string();
        assert!(msg.contains("ca"));
        assert!(msg.contains("procedure"));
        assert!(msg.contains("pdf_url"));
        assert!(msg.contains("bid"));
        assert!(!msg.contains("title,"));
    }

    #[test]
    fn test_unsupported_extension() {
        let r = load_dataframe(Path::new("/tmp/data.xlsx"));
        assert!(r.is_err());
        assert!(r.unwrap_err().to_string().contains("Unsupported"));
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tenders.csv");

        let mut df = base_frame();
        write_csv(&mut df, &path).unwrap();

        let loaded = load_dataframe(&path).unwrap();
        assert_eq!(loaded.height(), 2);
        assert!(validate_contract(&loaded, false).is_ok());
    }

    #[test]
    fn test_parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tenders.parquet");

        let mut df = base_frame();
        write_parquet(&mut df, &path).unwrap();

        let loaded = load_dataframe(&path).unwrap();
        assert_eq!(loaded.shape(), df.shape());
    }
}
