//! Labeling pipeline: validity mask → NAP rows, valid rows → one scoring strategy → labels in
//! input order.

use crate::config::{LabelerConfig, ScoringMode};
use crate::error::{LabelError, Result};
use crate::features::FeaturePreparer;
use crate::model::SharedClassifier;
use crate::record::{FlowBatch, Label, LabeledBatch};
use crate::risk::HeuristicScorer;
use crate::validate::RecordValidator;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct LabelingPipeline {
    validator: RecordValidator,
    scorer: HeuristicScorer,
    preparer: FeaturePreparer,
    classifier: Option<SharedClassifier>,
    mode: ScoringMode,
}

impl LabelingPipeline {
    /// `classifier` is the process-wide handle loaded at startup, or `None` if unavailable.
    pub fn new(config: &LabelerConfig, classifier: Option<SharedClassifier>) -> Self {
        Self {
            validator: RecordValidator::new(),
            scorer: HeuristicScorer::new(config.heuristic.clone()),
            preparer: FeaturePreparer::new(
                config.scoring.feature_columns.clone(),
                config.output.label_column.clone(),
            ),
            classifier,
            mode: config.scoring.mode,
        }
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    pub fn classifier_available(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn validator(&self) -> &RecordValidator {
        &self.validator
    }

    /// Label every record of `batch`. Batch-level failures are returned, never folded into labels.
    pub fn label_batch(&self, batch: FlowBatch) -> Result<LabeledBatch> {
        let batch_id = Uuid::new_v4();
        let (labels, unscoreable) = self.label(&batch)?;
        let labeled = LabeledBatch::new(batch, labels, unscoreable);
        let s = labeled.summary();
        info!(
            %batch_id,
            mode = ?self.mode,
            batch_rows = s.rows,
            nap = s.nap,
            benign = s.benign,
            malicious = s.malicious,
            unscoreable = s.unscoreable,
            "batch labeled"
        );
        Ok(labeled)
    }

    /// Labels plus the count of valid-but-unscoreable rows that fell back to NAP.
    pub fn label(&self, batch: &FlowBatch) -> Result<(Vec<Label>, usize)> {
        let mut labels = vec![Label::Nap; batch.len()];
        let mut valid = Vec::with_capacity(batch.len());
        for (idx, record) in batch.records().iter().enumerate() {
            match self.validator.check(record) {
                Ok(()) => valid.push(idx),
                Err(violation) => debug!(row = idx, %violation, "record is NAP"),
            }
        }

        let unscoreable = match self.mode {
            ScoringMode::Heuristic => {
                for &idx in &valid {
                    labels[idx] = self.scorer.score(&batch.records()[idx]);
                }
                0
            }
            ScoringMode::Classifier => self.classify(batch, &valid, &mut labels)?,
        };
        Ok((labels, unscoreable))
    }

    fn classify(&self, batch: &FlowBatch, valid: &[usize], labels: &mut [Label]) -> Result<usize> {
        let Some(classifier) = self.classifier.as_ref() else {
            warn!(rows = valid.len(), "classifier unavailable; valid rows fall back to NAP");
            return Ok(valid.len());
        };

        let prepared = self.preparer.prepare(batch, valid)?;
        if !prepared.unscoreable.is_empty() {
            debug!(rows = prepared.unscoreable.len(), "valid rows with incomplete features");
        }
        if prepared.rows.is_empty() {
            return Ok(prepared.unscoreable.len());
        }

        debug!(classifier = classifier.name(), rows = prepared.rows.len(), "scoring valid rows");
        let ids = classifier.predict(&prepared.matrix)?;
        if ids.len() != prepared.rows.len() {
            warn!(classifier = classifier.name(), expected = prepared.rows.len(), got = ids.len(), "prediction count mismatch");
            return Err(LabelError::PredictionCount {
                expected: prepared.rows.len(),
                got: ids.len(),
            });
        }
        // Map everything first so a bad id leaves no partial labels behind.
        let mapped = ids
            .iter()
            .map(|&id| Label::from_class_id(id).ok_or(LabelError::UnknownClass(id)))
            .collect::<Result<Vec<_>>>()?;
        for (&idx, label) in prepared.rows.iter().zip(mapped) {
            labels[idx] = label;
        }
        Ok(prepared.unscoreable.len())
    }
}
