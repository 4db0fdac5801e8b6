//! Delimited-text parsing shared by the stats feed and the scouting upload.
//!
//! Both inputs are small CSV/TSV documents that only differ in how strictly
//! they must be validated, so everything here is deliberately lenient: fields
//! are trimmed, quoted fields may contain the delimiter, ragged rows are kept
//! and missing trailing columns simply read as absent.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use thiserror::Error;

const BOM: char = '\u{feff}';

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed delimited text: {0}")]
    Csv(#[from] csv::Error),

    #[error("input has no header row")]
    MissingHeader,

    #[error("line {line}: column '{column}' is not numeric ('{value}')")]
    NotNumeric { line: u64, column: String, value: String }
}

/// One raw line of the input, positions preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: u64,
    pub fields: Vec<String>
}

impl Record {
    fn from_string_record(record: &StringRecord, fallback_line: u64) -> Record {
        let line = record.position().map(|p| p.line()).unwrap_or(fallback_line);

        Record {
            line,
            fields: record.iter().map(|f| f.trim_start_matches(BOM).to_string()).collect()
        }
    }

    /// Positional access, `None` for a missing or empty field.
    pub fn field(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(|f| f.as_str()).filter(|f| !f.is_empty())
    }

    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|f| f.is_empty())
    }
}

/// A header-driven table. Column lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    records: Vec<Record>
}

impl Table {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(&normalize_header(column))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records.iter().map(|record| Row {
            index: &self.index,
            record
        })
    }
}

/// Borrowed view of a single data row with typed accessors.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    index: &'a HashMap<String, usize>,
    record: &'a Record
}

impl<'a> Row<'a> {
    pub fn line(&self) -> u64 {
        self.record.line
    }

    pub fn get_str(&self, column: &str) -> Option<&'a str> {
        let idx = *self.index.get(&normalize_header(column))?;
        self.record.field(idx)
    }

    pub fn get_f64(&self, column: &str) -> Result<Option<f64>, ParseError> {
        match self.get_str(column) {
            None => Ok(None),
            Some(value) => value
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.not_numeric(column, value))
        }
    }

    pub fn get_i32(&self, column: &str) -> Result<Option<i32>, ParseError> {
        match self.get_str(column) {
            None => Ok(None),
            Some(value) => parse_integral(value)
                .and_then(|v| i32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| self.not_numeric(column, value))
        }
    }

    pub fn get_u32(&self, column: &str) -> Result<Option<u32>, ParseError> {
        match self.get_str(column) {
            None => Ok(None),
            Some(value) => parse_integral(value)
                .and_then(|v| u32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| self.not_numeric(column, value))
        }
    }

    /// Counting columns: absent reads as zero, garbage is still an error.
    pub fn count(&self, column: &str) -> Result<u32, ParseError> {
        Ok(self.get_u32(column)?.unwrap_or(0))
    }

    fn not_numeric(&self, column: &str, value: &str) -> ParseError {
        ParseError::NotNumeric {
            line: self.record.line,
            column: column.to_string(),
            value: value.to_string()
        }
    }
}

/// Integers are sometimes exported as `12.0`; accept those but nothing fractional.
fn parse_integral(value: &str) -> Option<i64> {
    if let Ok(v) = value.parse::<i64>() {
        return Some(v);
    }

    let v = value.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 {
        return Some(v as i64);
    }

    None
}

fn normalize_header(header: &str) -> String {
    header.trim().trim_start_matches(BOM).to_ascii_lowercase()
}

/// Comma unless the first line is clearly tab separated.
pub fn detect_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.contains('\t') && !first_line.contains(',') {
        return b'\t';
    }

    b','
}

/// Reads every line as a raw [`Record`], skipping blank lines.
pub fn parse_records(text: &str, delimiter: u8) -> Result<Vec<Record>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = Record::from_string_record(&result?, i as u64 + 1);
        if !record.is_blank() {
            records.push(record);
        }
    }

    Ok(records)
}

/// Parses `text` treating the first non-blank line as the header row.
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Table, ParseError> {
    let mut records = parse_records(text, delimiter)?.into_iter();
    let header = records.next().ok_or(ParseError::MissingHeader)?;

    let headers: Vec<String> = header.fields.iter().map(|h| normalize_header(h)).collect();
    let index = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.is_empty())
        .map(|(i, h)| (h.clone(), i))
        .collect();

    Ok(Table {
        headers,
        index,
        records: records.collect()
    })
}
