//! Classifier input preparation: numeric columns only, complete rows only.

mod pipeline;

pub use pipeline::{FeaturePreparer, PreparedFeatures};

/// Dense row-major f32 matrix for model input.
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Vec<f32>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            values: Vec::new(),
        }
    }

    /// Append one row; `row.len()` must equal `dim()`.
    pub fn push_row(&mut self, row: &[f32]) {
        debug_assert_eq!(row.len(), self.dim());
        self.values.extend_from_slice(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn dim(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        if self.dim() == 0 {
            0
        } else {
            self.values.len() / self.dim()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, i: usize) -> &[f32] {
        let d = self.dim();
        &self.values[i * d..(i + 1) * d]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}
