//! Raw tabular input: ordered headers plus ordered rows of loosely typed cells.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

use crate::detector::ColumnMapping;
use crate::error::{JituError, Result};

/// One raw cell as handed over by the file-decoding collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Blank,
}

impl RawValue {
    /// Blank cells and NaN numbers carry no value.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Blank => true,
            RawValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Hashable identity used for duplicate detection over raw rows.
    pub(crate) fn key(&self) -> String {
        match self {
            RawValue::Text(s) => format!("t:{s}"),
            RawValue::Number(n) => format!("n:{}", n.to_bits()),
            RawValue::Date(d) => format!("d:{d}"),
            RawValue::Blank => "b".to_string(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Number(n as f64)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(d: NaiveDate) -> Self {
        RawValue::Date(d)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(RawValue::Blank, Into::into)
    }
}

/// A complete, already loaded snapshot of an uploaded table.
///
/// Rows are stored positionally; every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with blanks, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<RawValue>) {
        row.resize(self.headers.len(), RawValue::Blank);
        self.rows.push(row);
    }

    pub fn with_row(mut self, row: Vec<RawValue>) -> Self {
        self.push_row(row);
        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell at (`row`, `header`), or `None` when the header is unknown.
    pub fn value(&self, row: usize, header: &str) -> Option<&RawValue> {
        let idx = self.column_index(header)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Rename exactly the mapped headers to their canonical names.
    /// Values and unmapped headers are left untouched.
    ///
    /// A header mapped to several fields is renamed for the first of them
    /// and appended as a copy under each further canonical name.
    pub fn apply_mapping(&self, mapping: &ColumnMapping) -> Result<RawTable> {
        let mut headers = self.headers.clone();
        let mut rows = self.rows.clone();
        let mut renamed = vec![false; headers.len()];
        for (field, source) in mapping.iter() {
            let idx = self
                .column_index(source)
                .ok_or_else(|| JituError::ColumnNotFound(source.to_string()))?;
            if !renamed[idx] {
                headers[idx] = field.as_str().to_string();
                renamed[idx] = true;
                continue;
            }
            headers.push(field.as_str().to_string());
            for row in &mut rows {
                let copy = row[idx].clone();
                row.push(copy);
            }
        }
        tracing::debug!(columns = ?headers, "Applied column mapping");
        Ok(RawTable { headers, rows })
    }

    /// Build a raw table from a polars DataFrame.
    ///
    /// String columns become text, numeric columns become numbers (null and
    /// NaN become blanks), anything else is rendered to text. Column names
    /// are trimmed.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let headers: Vec<String> = df
            .get_column_names_str()
            .iter()
            .map(|c| c.trim().to_string())
            .collect();

        let mut columns: Vec<Vec<RawValue>> = Vec::with_capacity(headers.len());
        for column in df.get_columns() {
            let values: Vec<RawValue> = match column.dtype() {
                DataType::String => column
                    .str()?
                    .into_iter()
                    .map(|v| v.map_or(RawValue::Blank, |s| RawValue::Text(s.to_string())))
                    .collect(),
                dt if dt.is_numeric() => column
                    .cast(&DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .map(|v| match v {
                        Some(n) if !n.is_nan() => RawValue::Number(n),
                        _ => RawValue::Blank,
                    })
                    .collect(),
                _ => column
                    .cast(&DataType::String)?
                    .str()?
                    .into_iter()
                    .map(|v| v.map_or(RawValue::Blank, |s| RawValue::Text(s.to_string())))
                    .collect(),
            };
            columns.push(values);
        }

        let height = df.height();
        let mut rows: Vec<Vec<RawValue>> = (0..height)
            .map(|_| Vec::with_capacity(headers.len()))
            .collect();
        for values in columns {
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
        }

        tracing::info!(
            rows = height,
            columns = headers.len(),
            "Loaded raw table from frame"
        );
        Ok(Self { headers, rows })
    }
}
