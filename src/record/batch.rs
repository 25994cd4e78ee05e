//! Delimited-text batches: header + rows in, same rows + label column out.

use super::{FlowRecord, Label, Schema};
use crate::error::{LabelError, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FlowBatch {
    schema: Arc<Schema>,
    records: Vec<FlowRecord>,
}

impl FlowBatch {
    pub fn new(schema: Arc<Schema>, records: Vec<FlowRecord>) -> Result<Self> {
        if schema.is_empty() || records.is_empty() {
            return Err(LabelError::EmptyBatch);
        }
        Ok(Self { schema, records })
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_reader(text.as_bytes())
    }

    /// Parse CSV. Blank lines are skipped; short rows are padded with absent cells.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = LogicalLines::new(reader);
        let header = loop {
            match lines.next_line()? {
                Some((_, l)) if l.trim().is_empty() => continue,
                Some((line_no, l)) => break split_csv_line(&l, line_no)?,
                None => return Err(LabelError::EmptyBatch),
            }
        };
        let schema = Arc::new(Schema::new(header));

        let mut records = Vec::new();
        while let Some((line_no, line)) = lines.next_line()? {
            if line.trim().is_empty() {
                continue;
            }
            let cells = split_csv_line(&line, line_no)?;
            if cells.len() > schema.len() {
                return Err(LabelError::Malformed {
                    line: line_no,
                    reason: format!("expected {} fields, saw {}", schema.len(), cells.len()),
                });
            }
            records.push(FlowRecord::from_cells(schema.clone(), cells));
        }
        Self::new(schema, records)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn records(&self) -> &[FlowRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Per-label counts for one labeled batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSummary {
    pub rows: usize,
    pub nap: usize,
    pub benign: usize,
    pub malicious: usize,
    /// Valid rows that could not be scored and fell back to NAP (included in `nap`)
    pub unscoreable: usize,
}

impl LabelSummary {
    pub fn from_labels(labels: &[Label]) -> Self {
        let mut s = LabelSummary {
            rows: labels.len(),
            ..Default::default()
        };
        for l in labels {
            match l {
                Label::Nap => s.nap += 1,
                Label::Benign => s.benign += 1,
                Label::Malicious => s.malicious += 1,
            }
        }
        s
    }
}

/// A batch with exactly one label per record, in record order.
#[derive(Debug, Clone)]
pub struct LabeledBatch {
    batch: FlowBatch,
    labels: Vec<Label>,
    summary: LabelSummary,
}

impl LabeledBatch {
    pub(crate) fn new(batch: FlowBatch, labels: Vec<Label>, unscoreable: usize) -> Self {
        debug_assert_eq!(batch.len(), labels.len());
        let mut summary = LabelSummary::from_labels(&labels);
        summary.unscoreable = unscoreable;
        Self {
            batch,
            labels,
            summary,
        }
    }

    pub fn batch(&self) -> &FlowBatch {
        &self.batch
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn summary(&self) -> LabelSummary {
        self.summary
    }

    /// Original columns (minus any stale label column) followed by `label_column`.
    pub fn write_csv<W: Write>(&self, w: &mut W, label_column: &str) -> std::io::Result<()> {
        let schema = self.batch.schema();
        let stale = schema.index_of(label_column);
        let keep: Vec<usize> = (0..schema.len()).filter(|i| Some(*i) != stale).collect();

        let mut header: Vec<&str> = keep.iter().map(|&i| schema.columns()[i].as_str()).collect();
        header.push(label_column);
        write_csv_row(w, header.into_iter())?;

        for (record, label) in self.batch.records().iter().zip(&self.labels) {
            let row = keep
                .iter()
                .map(|&i| record.raw_at(i))
                .chain(std::iter::once(label.as_str()));
            write_csv_row(w, row)?;
        }
        Ok(())
    }

    pub fn to_csv(&self, label_column: &str) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_csv(&mut out, label_column);
        String::from_utf8_lossy(&out).into_owned()
    }
}

fn write_csv_row<'a, W: Write>(w: &mut W, cells: impl Iterator<Item = &'a str>) -> std::io::Result<()> {
    let mut first = true;
    for cell in cells {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        if cell.contains([',', '"', '\n', '\r']) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Physical lines joined while a quoted cell is still open.
struct LogicalLines<R> {
    reader: R,
    line_no: usize,
}

impl<R: BufRead> LogicalLines<R> {
    fn new(reader: R) -> Self {
        Self { reader, line_no: 0 }
    }

    /// Returns the 1-based starting line number with the logical line.
    fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        let mut buf = String::new();
        let start = self.line_no + 1;
        loop {
            let mut part = String::new();
            if self.reader.read_line(&mut part)? == 0 {
                if buf.is_empty() {
                    return Ok(None);
                }
                return Err(LabelError::Malformed {
                    line: start,
                    reason: "unterminated quoted field".into(),
                });
            }
            self.line_no += 1;
            // Spreadsheet exports often lead with a UTF-8 byte order mark.
            let part = match self.line_no {
                1 => part.strip_prefix('\u{feff}').unwrap_or(&part),
                _ => part.as_str(),
            };
            buf.push_str(part);
            if buf.matches('"').count() % 2 == 0 {
                let trimmed = buf.trim_end_matches(['\n', '\r']).to_string();
                return Ok(Some((start, trimmed)));
            }
        }
    }
}

fn split_csv_line(line: &str, line_no: usize) -> Result<Vec<String>> {
    let mut cells = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if cur.is_empty() => in_quotes = true,
            ('"', false) => {
                return Err(LabelError::Malformed {
                    line: line_no,
                    reason: "quote inside unquoted field".into(),
                })
            }
            (',', false) => cells.push(std::mem::take(&mut cur)),
            (c, _) => cur.push(c),
        }
    }
    cells.push(cur);
    Ok(cells)
}
