//! Dataset cleaning and derived-feature preparation
//!
//! Cleaning drops records only when the title is missing or blank; every
//! optional field is defaulted instead. `detected_codes` is normalized to a
//! list column whether it arrives as lists or as `;`-joined text, and
//! `codes_count` is derived from it when absent.

use crate::data::loader::{CONTRACT_COLUMNS, ENRICHED_COLUMNS};
use crate::error::{Result, TenderError};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Minimum PDF text length for a row to be usable for modeling
pub const DEFAULT_MIN_TEXT_CHARS: usize = 10;
/// Minimum detected code count for a row to be usable for modeling
pub const DEFAULT_MIN_CODES: i64 = 0;

const STRING_FILL_COLUMNS: [&str; 4] = ["ca", "procedure", "pdf_url", "pdf_text"];

/// Clean a raw tender frame.
///
/// Keeps the contract columns that are present, drops rows with blank
/// titles, fills missing strings with `""`, normalizes `detected_codes`
/// and `codes_count`. With `labelled_only` the frame is restricted to
/// rows with a known outcome and `bid` is cast to integer.
pub fn clean(df: &DataFrame, labelled_only: bool) -> Result<DataFrame> {
    let present: HashSet<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
    let keep: Vec<&str> = CONTRACT_COLUMNS
        .iter()
        .chain(ENRICHED_COLUMNS.iter())
        .copied()
        .filter(|c| present.contains(c))
        .collect();
    let mut out = df.select(keep)?;

    let titles = out
        .column("title")
        .map_err(|_| TenderError::ColumnNotFound("title".to_string()))?
        .cast(&DataType::String)?;
    let titles = titles.as_materialized_series().str()?.clone();
    let mask: BooleanChunked = titles
        .into_iter()
        .map(|t| Some(t.map_or(false, |s| !s.trim().is_empty())))
        .collect();
    out = out.filter(&mask)?;

    for name in STRING_FILL_COLUMNS {
        if out.column(name).is_err() {
            continue;
        }
        let ca = out
            .column(name)?
            .cast(&DataType::String)?
            .as_materialized_series()
            .str()?
            .clone();
        let filled: StringChunked = ca.into_iter().map(|v| Some(v.unwrap_or(""))).collect();
        out.with_column(filled.with_name(name.into()).into_series())?;
    }

    let codes = if out.column("detected_codes").is_ok() {
        Some(code_lists(&out)?)
    } else {
        None
    };
    if let Some(rows) = &codes {
        let inner: Vec<Series> = rows
            .iter()
            .map(|r| Series::new("".into(), r.as_slice()))
            .collect();
        out.with_column(Series::new("detected_codes".into(), inner))?;
    }

    if out.column("codes_count").is_ok() {
        let ca = out
            .column("codes_count")?
            .cast(&DataType::Int64)?
            .as_materialized_series()
            .i64()?
            .clone();
        let filled: Int64Chunked = ca.into_iter().map(|v| Some(v.unwrap_or(0))).collect();
        out.with_column(filled.with_name("codes_count".into()).into_series())?;
    } else if let Some(rows) = &codes {
        let counts: Vec<i64> = rows.iter().map(|r| r.len() as i64).collect();
        out.with_column(Series::new("codes_count".into(), counts))?;
    }

    if labelled_only {
        let bid = out
            .column("bid")
            .map_err(|_| TenderError::ColumnNotFound("bid".to_string()))?;
        let mask = bid.as_materialized_series().is_not_null();
        out = out.filter(&mask)?;
        let cast = out.column("bid")?.cast(&DataType::Int64)?;
        out.with_column(cast)?;
    }

    debug!(
        raw = df.height(),
        cleaned = out.height(),
        labelled_only,
        "frame cleaned"
    );
    Ok(out)
}

/// Add derived length, ratio, and flag columns.
///
/// Enrichment columns that are absent contribute zeros rather than errors,
/// so the same derivations work on basic and enriched frames.
pub fn engineer(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();
    let n = out.height();

    let titles = string_rows(&out, "title")?;
    let pdf_texts = optional_string_rows(&out, "pdf_text")?;
    let pdf_urls = optional_string_rows(&out, "pdf_url")?;
    let codes = optional_numeric_rows(&out, "codes_count")?;

    let title_len: Vec<i64> = titles.iter().map(|t| t.chars().count() as i64).collect();
    let title_words: Vec<i64> = titles.iter().map(|t| t.split_whitespace().count() as i64).collect();
    let pdf_len: Vec<i64> = pdf_texts.iter().map(|t| t.chars().count() as i64).collect();
    let pdf_words: Vec<i64> = pdf_texts
        .iter()
        .map(|t| t.split_whitespace().count() as i64)
        .collect();

    let mut ratio = Vec::with_capacity(n);
    let mut density = Vec::with_capacity(n);
    for i in 0..n {
        ratio.push(pdf_len[i] as f64 / (title_len[i] as f64 + 1.0));
        density.push(codes[i] / (pdf_len[i] as f64 / 1000.0 + 1.0));
    }

    let has_pdf: Vec<bool> = pdf_urls.iter().map(|u| !u.trim().is_empty()).collect();
    let has_pdf_content: Vec<bool> = pdf_texts.iter().map(|t| !t.trim().is_empty()).collect();
    let has_codes: Vec<bool> = codes.iter().map(|c| *c > 0.0).collect();

    out.with_column(Series::new("title_length".into(), title_len))?;
    out.with_column(Series::new("title_word_count".into(), title_words))?;
    out.with_column(Series::new("pdf_text_length".into(), pdf_len))?;
    out.with_column(Series::new("pdf_text_word_count".into(), pdf_words))?;
    out.with_column(Series::new("pdf_to_title_ratio".into(), ratio))?;
    out.with_column(Series::new("code_density".into(), density))?;
    out.with_column(Series::new("has_pdf".into(), has_pdf))?;
    out.with_column(Series::new("has_pdf_content".into(), has_pdf_content))?;
    out.with_column(Series::new("has_codes".into(), has_codes))?;

    Ok(out)
}

/// Restrict a frame to rows with enough signal to model on
pub fn filter_modeling_rows(
    df: &DataFrame,
    min_text_chars: usize,
    min_codes: i64,
) -> Result<DataFrame> {
    let titles = string_rows(df, "title")?;
    let texts = optional_string_rows(df, "pdf_text")?;
    let codes = optional_numeric_rows(df, "codes_count")?;

    let mask: BooleanChunked = (0..df.height())
        .map(|i| {
            Some(
                !titles[i].trim().is_empty()
                    && texts[i].chars().count() >= min_text_chars
                    && codes[i] as i64 >= min_codes,
            )
        })
        .collect();
    let out = df.filter(&mask)?;
    debug!(before = df.height(), after = out.height(), "modeling rows filtered");
    Ok(out)
}

/// Occurrence counts for every detected code, most frequent first
pub fn code_statistics(df: &DataFrame) -> Result<DataFrame> {
    let rows = code_lists(df)?;
    let total = df.height();

    let mut counts: HashMap<String, u32> = HashMap::new();
    for row in &rows {
        for code in row {
            *counts.entry(code.clone()).or_insert(0) += 1;
        }
    }

    let mut pairs: Vec<(String, u32)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let codes: Vec<String> = pairs.iter().map(|(c, _)| c.clone()).collect();
    let freqs: Vec<u32> = pairs.iter().map(|(_, f)| *f).collect();
    let pct: Vec<f64> = pairs
        .iter()
        .map(|(_, f)| {
            if total == 0 {
                0.0
            } else {
                *f as f64 / total as f64 * 100.0
            }
        })
        .collect();

    Ok(df! {
        "code" => codes,
        "frequency" => freqs,
        "percentage" => pct,
    }?)
}

/// Append `code_<code>` indicator columns, one per distinct detected code
pub fn codes_one_hot(df: &DataFrame) -> Result<DataFrame> {
    let rows = code_lists(df)?;

    let mut distinct: Vec<String> = rows
        .iter()
        .flatten()
        .cloned()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    distinct.sort();

    let mut out = df.clone();
    for code in &distinct {
        let values: Vec<i32> = rows
            .iter()
            .map(|r| i32::from(r.iter().any(|c| c == code)))
            .collect();
        out.with_column(Series::new(format!("code_{}", code).into(), values))?;
    }
    Ok(out)
}

fn code_lists(df: &DataFrame) -> Result<Vec<Vec<String>>> {
    let column = df
        .column("detected_codes")
        .map_err(|_| TenderError::ColumnNotFound("detected_codes".to_string()))?;

    match column.dtype() {
        DataType::List(_) => {
            let list = column.as_materialized_series().list()?.clone();
            let mut rows = Vec::with_capacity(list.len());
            for value in list.into_iter() {
                match value {
                    Some(inner) => {
                        let inner = inner.cast(&DataType::String)?;
                        let ca = inner.str()?;
                        rows.push(
                            ca.into_iter()
                                .flatten()
                                .map(|s| s.trim().to_string())
                                .filter(|s| !s.is_empty())
                                .collect(),
                        );
                    }
                    None => rows.push(Vec::new()),
                }
            }
            Ok(rows)
        }
        DataType::String => {
            let ca = column.as_materialized_series().str()?.clone();
            Ok(ca.into_iter().map(|v| split_codes(v.unwrap_or(""))).collect())
        }
        DataType::Null => Ok(vec![Vec::new(); df.height()]),
        other => Err(TenderError::DataError(format!(
            "detected_codes has unsupported dtype {:?}",
            other
        ))),
    }
}

fn split_codes(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn string_rows(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let ca = df
        .column(name)
        .map_err(|_| TenderError::ColumnNotFound(name.to_string()))?
        .cast(&DataType::String)?
        .as_materialized_series()
        .str()?
        .clone();
    Ok(ca.into_iter().map(|v| v.unwrap_or("").to_string()).collect())
}

pub(crate) fn optional_string_rows(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    if df.column(name).is_err() {
        return Ok(vec![String::new(); df.height()]);
    }
    string_rows(df, name)
}

fn optional_numeric_rows(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    if df.column(name).is_err() {
        return Ok(vec![0.0; df.height()]);
    }
    let ca = df
        .column(name)?
        .cast(&DataType::Float64)?
        .as_materialized_series()
        .f64()?
        .clone();
    Ok(ca.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}
