//! Valid records → feature matrix. A row whose feature cell is absent, textual or not
//! representable as a finite f32 is set aside as unscoreable; other rows are unaffected.

use super::FeatureMatrix;
use crate::error::{LabelError, Result};
use crate::record::{FieldValue, FlowBatch};

pub struct FeaturePreparer {
    /// Explicit model columns, in model order
    columns: Option<Vec<String>>,
    /// Never a feature (the output label column)
    exclude: String,
}

/// Matrix rows map back to batch positions through `rows`.
#[derive(Debug, Clone, Default)]
pub struct PreparedFeatures {
    pub matrix: FeatureMatrix,
    pub rows: Vec<usize>,
    pub unscoreable: Vec<usize>,
}

impl FeaturePreparer {
    pub fn new(columns: Option<Vec<String>>, exclude: impl Into<String>) -> Self {
        Self {
            columns,
            exclude: exclude.into(),
        }
    }

    /// Build the matrix for `candidates` (indices of valid records, ascending).
    pub fn prepare(&self, batch: &FlowBatch, candidates: &[usize]) -> Result<PreparedFeatures> {
        let indices = self.feature_indices(batch, candidates)?;
        let schema = batch.schema();
        let mut out = PreparedFeatures {
            matrix: FeatureMatrix::new(indices.iter().map(|&i| schema.columns()[i].clone()).collect()),
            ..Default::default()
        };

        let mut row = Vec::with_capacity(indices.len());
        for &idx in candidates {
            let record = &batch.records()[idx];
            row.clear();
            let complete = indices.iter().all(|&col| match feature_value(record.value_at(col)) {
                Some(v) => {
                    row.push(v);
                    true
                }
                None => false,
            });
            if complete {
                out.matrix.push_row(&row);
                out.rows.push(idx);
            } else {
                out.unscoreable.push(idx);
            }
        }
        Ok(out)
    }

    fn feature_indices(&self, batch: &FlowBatch, candidates: &[usize]) -> Result<Vec<usize>> {
        let schema = batch.schema();
        match &self.columns {
            Some(names) => names
                .iter()
                .map(|name| {
                    schema
                        .index_of(name)
                        .ok_or_else(|| LabelError::MissingColumn(name.clone()))
                })
                .collect(),
            None => {
                let excluded = schema.index_of(&self.exclude);
                Ok((0..schema.len())
                    .filter(|&i| Some(i) != excluded && holds_number(batch, candidates, i))
                    .collect())
            }
        }
    }
}

fn feature_value(value: &FieldValue) -> Option<f32> {
    let v = value.as_number()? as f32;
    v.is_finite().then_some(v)
}

/// Auto-selected columns: at least one valid row carries a number there. NAP rows never
/// influence the choice.
fn holds_number(batch: &FlowBatch, candidates: &[usize], idx: usize) -> bool {
    candidates
        .iter()
        .any(|&r| batch.records()[r].value_at(idx).as_number().is_some())
}
