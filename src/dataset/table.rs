//! In-memory tables loaded from CSV uploads or Google Sheets

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::types::{AppError, AppResult};

/// One row: column name → cell, in column order
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

/// How the cells of a CSV column are typed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl Table {
    /// Parse CSV bytes with a header row
    ///
    /// Columns whose non-empty cells are all integers (or all numbers) become
    /// JSON numbers; everything else stays text. Empty cells are `null`.
    pub fn from_csv(bytes: &[u8]) -> AppResult<Self> {
        let invalid = |_| AppError::InvalidRequest("Invalid CSV file.".to_string());

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let columns = dedup_columns(reader.headers().map_err(invalid)?.iter().map(String::from));
        if columns.is_empty() || columns.iter().all(String::is_empty) {
            return Err(AppError::InvalidRequest("Invalid CSV file.".to_string()));
        }

        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(invalid)?;
            if record.len() > columns.len() {
                return Err(AppError::InvalidRequest("Invalid CSV file.".to_string()));
            }
            raw_rows.push(record.iter().map(String::from).collect());
        }

        let kinds: Vec<ColumnKind> = (0..columns.len())
            .map(|i| column_kind(raw_rows.iter().filter_map(|r| r.get(i).map(String::as_str))))
            .collect();

        let rows = raw_rows
            .into_iter()
            .map(|cells| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        let cell = cells.get(i).map(String::as_str).unwrap_or("");
                        (column.clone(), typed_cell(cell, kinds[i]))
                    })
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Build a table from raw sheet rows; the first row is the header
    ///
    /// The header is widened to the widest row with empty names, and rows
    /// shorter than the header are padded with empty strings.
    pub fn from_string_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut header = rows.remove(0);
        header.resize(width, String::new());
        let columns = dedup_columns(header);
        let rows = rows
            .into_iter()
            .map(|cells| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        let cell = cells.get(i).cloned().unwrap_or_default();
                        (column.clone(), Value::String(cell))
                    })
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Rows `[start_row, end_row)`, clamped to what exists; never fails
    pub fn slice(&self, start_row: usize, end_row: Option<usize>) -> Table {
        let len = self.rows.len();
        let start = start_row.min(len);
        let end = end_row.unwrap_or(len).min(len).max(start);
        Table {
            columns: self.columns.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Table {
        self.slice(0, Some(n))
    }

    /// Values of one column, top to bottom
    pub fn column_values(&self, column: &str) -> AppResult<Vec<Value>> {
        if !self.columns.iter().any(|c| c == column) {
            return Err(AppError::InvalidRequest(format!("Unknown column: {}", column)));
        }
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
            .collect())
    }
}

/// Repeated names get `.1`, `.2`, ... suffixes, skipping names already taken
fn dedup_columns(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::new();
    for name in names {
        let mut name = name;
        let mut count = counts.get(&name).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(name.clone(), count + 1);
            name = format!("{}.{}", name, count);
            count = counts.get(&name).copied().unwrap_or(0);
        }
        counts.insert(name.clone(), count + 1);
        columns.push(name);
    }
    columns
}

fn column_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Integer;
    let mut seen = false;
    for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
        seen = true;
        if kind == ColumnKind::Integer && cell.parse::<i64>().is_ok() {
            continue;
        }
        match cell.parse::<f64>() {
            Ok(f) if f.is_finite() => kind = ColumnKind::Float,
            _ => return ColumnKind::Text,
        }
    }
    if seen {
        kind
    } else {
        ColumnKind::Text
    }
}

fn typed_cell(cell: &str, kind: ColumnKind) -> Value {
    if cell.trim().is_empty() {
        return Value::Null;
    }
    let number = match kind {
        ColumnKind::Integer => cell.trim().parse::<i64>().ok().map(Number::from),
        ColumnKind::Float => cell.trim().parse::<f64>().ok().and_then(Number::from_f64),
        ColumnKind::Text => None,
    };
    match number {
        Some(n) => Value::Number(n),
        None => Value::String(cell.to_string()),
    }
}
