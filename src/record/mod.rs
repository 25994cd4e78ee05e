//! Flow records: recognized field catalogue, cell values, labels.

mod batch;
mod field;

pub use batch::{FlowBatch, LabelSummary, LabeledBatch};
pub use field::{normalize_column, Field};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One parsed cell. Absent is distinct from `Number(0.0)`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Empty → absent, numeric → number (NaN → absent), anything else → text.
    pub fn parse(raw: &str) -> Self {
        let t = raw.trim();
        if t.is_empty() {
            return FieldValue::Absent;
        }
        match t.parse::<f64>() {
            Ok(v) if v.is_nan() => FieldValue::Absent,
            Ok(v) => FieldValue::Number(v),
            Err(_) => FieldValue::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FieldValue::Text(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "NAP")]
    Nap,
    Benign,
    Malicious,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Nap => "NAP",
            Label::Benign => "Benign",
            Label::Malicious => "Malicious",
        }
    }

    /// Fixed class-id table for the binary classifier.
    pub fn from_class_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(Label::Benign),
            1 => Some(Label::Malicious),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column layout shared by every record of a batch.
#[derive(Debug)]
pub struct Schema {
    columns: Vec<String>,
    by_name: HashMap<String, usize>,
    by_field: HashMap<Field, usize>,
}

impl Schema {
    /// Header names are trimmed; the first occurrence of a duplicate name wins for lookups.
    pub fn new(columns: Vec<String>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(|c| c.trim().to_string()).collect();
        let mut by_name = HashMap::new();
        let mut by_field = HashMap::new();
        for (idx, col) in columns.iter().enumerate() {
            by_name.entry(normalize_column(col)).or_insert(idx);
            if let Some(field) = Field::from_column(col) {
                by_field.entry(field).or_insert(idx);
            }
        }
        Self {
            columns,
            by_name,
            by_field,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(&normalize_column(name)).copied()
    }

    pub fn index_of_field(&self, field: Field) -> Option<usize> {
        self.by_field.get(&field).copied()
    }
}

static ABSENT: FieldValue = FieldValue::Absent;

#[derive(Debug, Clone)]
struct Cell {
    raw: String,
    value: FieldValue,
}

/// One flow row. Cells keep their raw text so output is byte-for-byte what came in.
#[derive(Debug, Clone)]
pub struct FlowRecord {
    schema: Arc<Schema>,
    cells: Vec<Cell>,
}

impl FlowRecord {
    /// Build from raw cells; missing trailing cells are absent.
    pub fn from_cells(schema: Arc<Schema>, raw: Vec<String>) -> Self {
        let mut cells: Vec<Cell> = raw
            .into_iter()
            .map(|r| Cell {
                value: FieldValue::parse(&r),
                raw: r,
            })
            .collect();
        while cells.len() < schema.len() {
            cells.push(Cell {
                raw: String::new(),
                value: FieldValue::Absent,
            });
        }
        Self { schema, cells }
    }

    /// Standalone record from `(column, value)` pairs; `None` is written as an empty cell.
    pub fn from_values<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<f64>)>,
        S: Into<String>,
    {
        let (columns, raw): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(name, v)| (name.into(), v.map(format_number).unwrap_or_default()))
            .unzip();
        Self::from_cells(Arc::new(Schema::new(columns)), raw)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Numeric value of a recognized field, `None` when absent or non-numeric.
    pub fn get(&self, field: Field) -> Option<f64> {
        self.schema
            .index_of_field(field)
            .and_then(|i| self.cells.get(i))
            .and_then(|c| c.value.as_number())
    }

    /// Lookup by column name (normalized).
    pub fn value(&self, name: &str) -> &FieldValue {
        self.schema
            .index_of(name)
            .and_then(|i| self.cells.get(i))
            .map(|c| &c.value)
            .unwrap_or(&ABSENT)
    }

    pub fn value_at(&self, idx: usize) -> &FieldValue {
        self.cells.get(idx).map(|c| &c.value).unwrap_or(&ABSENT)
    }

    pub fn raw_at(&self, idx: usize) -> &str {
        self.cells.get(idx).map(|c| c.raw.as_str()).unwrap_or("")
    }
}

fn format_number(v: f64) -> String {
    if v.is_infinite() {
        if v > 0.0 { "inf".into() } else { "-inf".into() }
    } else {
        v.to_string()
    }
}
