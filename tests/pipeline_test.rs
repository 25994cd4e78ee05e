//! Labeling pipeline: NAP merge, strategy routing, classifier fallbacks and batch errors.

use flow_labeler::config::{LabelerConfig, ScoringMode};
use flow_labeler::features::FeatureMatrix;
use flow_labeler::model::{Classifier, ClassifierError};
use flow_labeler::{FlowBatch, Label, LabelError, LabelingPipeline};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const HEADER: &str = "Flow ID,Flow Duration,Tot Fwd Pkts,Tot Bwd Pkts,TotLen Fwd Pkts,TotLen Bwd Pkts,Flow Pkts/s,Flow IAT Min,Flow IAT Max";

fn batch(rows: &[&str]) -> FlowBatch {
    let mut text = String::from(HEADER);
    for r in rows {
        text.push('\n');
        text.push_str(r);
    }
    FlowBatch::from_csv_str(&text).unwrap()
}

fn config(mode: ScoringMode) -> LabelerConfig {
    let mut c = LabelerConfig::default();
    c.scoring.mode = mode;
    c
}

/// Predicts Malicious when forward packets (second numeric feature) exceed 3; records every matrix it sees.
struct StubClassifier {
    calls: AtomicUsize,
    seen: Mutex<Vec<FeatureMatrix>>,
}

impl StubClassifier {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl Classifier for StubClassifier {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(features.clone());
        let fwd = features
            .columns()
            .iter()
            .position(|c| c == "Tot Fwd Pkts")
            .ok_or_else(|| ClassifierError::Shape("no Tot Fwd Pkts".into()))?;
        Ok((0..features.len())
            .map(|i| if features.row(i)[fwd] > 3.0 { 1 } else { 0 })
            .collect())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn predict(&self, _: &FeatureMatrix) -> Result<Vec<i64>, ClassifierError> {
        Err(ClassifierError::Output("boom".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Returns a fixed answer regardless of input size.
struct FixedClassifier(Vec<i64>);

impl Classifier for FixedClassifier {
    fn predict(&self, _: &FeatureMatrix) -> Result<Vec<i64>, ClassifierError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[test]
fn heuristic_scenarios() {
    let b = batch(&[
        // A: one-sided → Malicious
        "a,100,5,0,500,0,50,,",
        // B: balanced → Benign
        "b,100,2,2,200,180,20,,",
        // D: IAT min > max → NAP
        "d,100,2,2,200,180,20,50,10",
        // duration 0 with infinite rate → NAP
        "e,0,2,2,200,180,inf,,",
    ]);
    let p = LabelingPipeline::new(&config(ScoringMode::Heuristic), None);
    let labeled = p.label_batch(b).unwrap();
    assert_eq!(
        labeled.labels(),
        &[Label::Malicious, Label::Benign, Label::Nap, Label::Nap]
    );
    let s = labeled.summary();
    assert_eq!((s.rows, s.nap, s.benign, s.malicious, s.unscoreable), (4, 2, 1, 1, 0));
}

#[test]
fn missing_duration_column_makes_every_row_nap() {
    let b = FlowBatch::from_csv_str("Tot Fwd Pkts,Tot Bwd Pkts\n2,2\n5,0\n").unwrap();
    let p = LabelingPipeline::new(&config(ScoringMode::Heuristic), None);
    let labeled = p.label_batch(b).unwrap();
    assert!(labeled.labels().iter().all(|l| *l == Label::Nap));
}

#[test]
fn nap_iff_validator_rejects() {
    let b = batch(&[
        "a,100,5,0,500,0,50,,",
        "b,-1,2,2,200,180,20,,",
        "c,100,0,2,7,180,20,,",
        "d,100,2,2,200,180,20,1,2",
        "e,,2,2,200,180,20,1,2",
    ]);
    let p = LabelingPipeline::new(&config(ScoringMode::Heuristic), None);
    let (labels, _) = p.label(&b).unwrap();
    for (record, label) in b.records().iter().zip(&labels) {
        assert_eq!(*label == Label::Nap, !p.validator().is_valid(record));
    }
}

#[test]
fn labels_do_not_depend_on_row_order() {
    let rows = [
        "a,100,5,0,500,0,50,,",
        "b,100,2,2,200,180,20,,",
        "c,100,0,2,7,180,20,,",
        "d,1,60,0,0,0,90000,,",
    ];
    let p = LabelingPipeline::new(&config(ScoringMode::Heuristic), None);
    let forward = p.label(&batch(&rows)).unwrap().0;
    let mut reversed_rows = rows;
    reversed_rows.reverse();
    let mut backward = p.label(&batch(&reversed_rows)).unwrap().0;
    backward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn relabeling_output_is_idempotent() {
    let p = LabelingPipeline::new(&config(ScoringMode::Heuristic), None);
    let label_column = LabelerConfig::default().output.label_column;
    let first = p
        .label_batch(batch(&["a,100,5,0,500,0,50,,", "b,100,2,2,200,180,20,,", "c,-4,1,1,1,1,1,,"]))
        .unwrap();
    let csv = first.to_csv(&label_column);

    let second = p.label_batch(FlowBatch::from_csv_str(&csv).unwrap()).unwrap();
    assert_eq!(first.labels(), second.labels());
    // Stale label column is replaced, not duplicated.
    assert_eq!(second.to_csv(&label_column), csv);
}

#[test]
fn classifier_scores_valid_rows_only() {
    let stub = Arc::new(StubClassifier::new());
    let p = LabelingPipeline::new(&config(ScoringMode::Classifier), Some(stub.clone()));
    let b = batch(&[
        "a,100,5,1,500,10,50,1,2",
        "b,-1,5,1,500,10,50,1,2",
        "c,100,2,2,200,180,20,1,2",
    ]);
    let labeled = p.label_batch(b).unwrap();
    assert_eq!(labeled.labels(), &[Label::Malicious, Label::Nap, Label::Benign]);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);

    let seen = stub.seen.lock().unwrap();
    // Flow ID is text and never reaches the model.
    assert!(!seen[0].columns().iter().any(|c| c == "Flow ID"));
    assert_eq!(seen[0].len(), 2);
}

#[test]
fn incomplete_features_fall_back_to_nap() {
    let stub = Arc::new(StubClassifier::new());
    let p = LabelingPipeline::new(&config(ScoringMode::Classifier), Some(stub));
    let b = batch(&[
        "a,100,5,1,500,10,50,1,2",
        // Valid (IAT fields absent) but incomplete for the model.
        "b,100,5,1,500,10,50,,",
    ]);
    let labeled = p.label_batch(b).unwrap();
    assert_eq!(labeled.labels(), &[Label::Malicious, Label::Nap]);
    assert_eq!(labeled.summary().unscoreable, 1);
}

#[test]
fn classifier_not_called_when_nothing_is_scoreable() {
    let stub = Arc::new(StubClassifier::new());
    let mut c = config(ScoringMode::Classifier);
    c.scoring.feature_columns = Some(vec!["Tot Fwd Pkts".into(), "Flow IAT Min".into()]);
    let p = LabelingPipeline::new(&c, Some(stub.clone()));
    let labeled = p.label_batch(batch(&["a,-1,5,1,500,10,50,1,2", "b,100,5,1,500,10,50,,"])).unwrap();
    assert_eq!(labeled.labels(), &[Label::Nap, Label::Nap]);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unavailable_classifier_resolves_valid_rows_to_nap() {
    let p = LabelingPipeline::new(&config(ScoringMode::Classifier), None);
    assert!(!p.classifier_available());
    let labeled = p.label_batch(batch(&["a,100,5,1,500,10,50,1,2", "b,-1,1,1,1,1,1,1,2"])).unwrap();
    assert_eq!(labeled.labels(), &[Label::Nap, Label::Nap]);
    assert_eq!(labeled.summary().unscoreable, 1);
}

#[test]
fn classifier_failure_is_a_batch_error() {
    let p = LabelingPipeline::new(&config(ScoringMode::Classifier), Some(Arc::new(FailingClassifier)));
    let err = p.label_batch(batch(&["a,100,5,1,500,10,50,1,2"])).unwrap_err();
    assert!(matches!(err, LabelError::Classifier(_)));
    assert!(!err.is_client_error());
}

#[test]
fn prediction_count_mismatch_is_a_batch_error() {
    let p = LabelingPipeline::new(&config(ScoringMode::Classifier), Some(Arc::new(FixedClassifier(vec![0]))));
    let err = p
        .label_batch(batch(&["a,100,5,1,500,10,50,1,2", "b,100,2,2,200,180,20,1,2"]))
        .unwrap_err();
    assert!(matches!(err, LabelError::PredictionCount { expected: 2, got: 1 }));
}

#[test]
fn unknown_class_id_is_a_batch_error() {
    let p = LabelingPipeline::new(&config(ScoringMode::Classifier), Some(Arc::new(FixedClassifier(vec![0, 7]))));
    let err = p
        .label_batch(batch(&["a,100,5,1,500,10,50,1,2", "b,100,2,2,200,180,20,1,2"]))
        .unwrap_err();
    assert!(matches!(err, LabelError::UnknownClass(7)));
}

#[test]
fn configured_feature_columns_must_exist() {
    let mut c = config(ScoringMode::Classifier);
    c.scoring.feature_columns = Some(vec!["Flow Duration".into(), "Dst Port".into()]);
    let p = LabelingPipeline::new(&c, Some(Arc::new(StubClassifier::new())));
    let err = p.label_batch(batch(&["a,100,5,1,500,10,50,1,2"])).unwrap_err();
    assert!(matches!(err, LabelError::MissingColumn(ref col) if col == "Dst Port"));
    assert!(err.is_client_error());
}

#[test]
fn text_in_a_feature_cell_only_affects_its_row() {
    let csv = "Flow Duration,Tot Fwd Pkts,Tot Bwd Pkts\n100,2,2\n100,n/a,2\n";
    let columns = vec!["Flow Duration".to_string(), "Tot Fwd Pkts".into(), "Tot Bwd Pkts".into()];

    for configured in [None, Some(columns.clone())] {
        let stub = Arc::new(StubClassifier::new());
        let mut c = config(ScoringMode::Classifier);
        c.scoring.feature_columns = configured;
        let p = LabelingPipeline::new(&c, Some(stub.clone()));
        let labeled = p.label_batch(FlowBatch::from_csv_str(csv).unwrap()).unwrap();
        assert_eq!(labeled.labels(), &[Label::Benign, Label::Nap]);
        assert_eq!(labeled.summary().unscoreable, 1);
        assert_eq!(stub.seen.lock().unwrap()[0].columns(), columns.as_slice());
    }
}

#[test]
fn nap_rows_do_not_shape_inferred_features() {
    let stub = Arc::new(StubClassifier::new());
    let p = LabelingPipeline::new(&config(ScoringMode::Classifier), Some(stub.clone()));
    // `Note` is numeric only in the NAP row, so it is not a feature.
    let b = FlowBatch::from_csv_str("Flow Duration,Tot Fwd Pkts,Note\n100,5,x\n-1,5,7\n").unwrap();
    let labeled = p.label_batch(b).unwrap();
    assert_eq!(labeled.labels(), &[Label::Malicious, Label::Nap]);
    assert_eq!(labeled.summary().unscoreable, 0);
    assert_eq!(
        stub.seen.lock().unwrap()[0].columns(),
        &["Flow Duration".to_string(), "Tot Fwd Pkts".to_string()]
    );
}

#[test]
fn feature_beyond_f32_range_is_unscoreable() {
    let p = LabelingPipeline::new(&config(ScoringMode::Classifier), Some(Arc::new(StubClassifier::new())));
    let labeled = p
        .label_batch(batch(&["a,100,5,1,500,10,1e39,1,2", "b,100,5,1,500,10,50,1,2"]))
        .unwrap();
    assert_eq!(labeled.labels(), &[Label::Nap, Label::Malicious]);
    assert_eq!(labeled.summary().unscoreable, 1);
}

#[test]
fn configured_feature_columns_fix_model_order() {
    let stub = Arc::new(StubClassifier::new());
    let mut c = config(ScoringMode::Classifier);
    c.scoring.feature_columns = Some(vec!["Tot Fwd Pkts".into(), "Flow Duration".into()]);
    let p = LabelingPipeline::new(&c, Some(stub.clone()));
    // IAT columns empty but not model features: row stays scoreable.
    let labeled = p.label_batch(batch(&["a,100,5,1,500,10,50,,"])).unwrap();
    assert_eq!(labeled.labels(), &[Label::Malicious]);
    let seen = stub.seen.lock().unwrap();
    assert_eq!(seen[0].columns(), &["Tot Fwd Pkts".to_string(), "Flow Duration".to_string()]);
    assert_eq!(seen[0].row(0), &[5.0, 100.0]);
}

#[test]
fn concurrent_batches_do_not_interfere() {
    let p = Arc::new(LabelingPipeline::new(&config(ScoringMode::Heuristic), None));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let p = p.clone();
            std::thread::spawn(move || {
                let row = if i % 2 == 0 { "a,100,5,0,500,0,50,," } else { "b,100,2,2,200,180,20,," };
                p.label(&batch(&[row; 50])).unwrap().0
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        let labels = h.join().unwrap();
        let expected = if i % 2 == 0 { Label::Malicious } else { Label::Benign };
        assert!(labels.iter().all(|l| *l == expected));
    }
}
