//! CSV batch parsing and labeled output.

use flow_labeler::record::{Field, FieldValue};
use flow_labeler::{FlowBatch, Label, LabelError, LabelingPipeline, LabelerConfig};

#[test]
fn header_names_are_trimmed_and_aliases_resolve() {
    let b = FlowBatch::from_csv_str(" Flow Duration , Total Fwd Packets ,Src IP\n10,3,1.2.3.4\n").unwrap();
    assert_eq!(b.schema().columns(), &["Flow Duration", "Total Fwd Packets", "Src IP"]);
    let r = &b.records()[0];
    assert_eq!(r.get(Field::FlowDuration), Some(10.0));
    assert_eq!(r.get(Field::TotFwdPkts), Some(3.0));
    assert!(r.value("src ip").is_text());
}

#[test]
fn short_rows_are_padded_with_absent_cells() {
    let b = FlowBatch::from_csv_str("Flow Duration,Tot Fwd Pkts,Tot Bwd Pkts\n5,1\n").unwrap();
    let r = &b.records()[0];
    assert_eq!(r.value_at(2), &FieldValue::Absent);
    assert_eq!(r.get(Field::TotBwdPkts), None);
}

#[test]
fn long_rows_are_malformed() {
    let err = FlowBatch::from_csv_str("a,b\n1,2\n1,2,3\n").unwrap_err();
    assert!(matches!(err, LabelError::Malformed { line: 3, .. }));
    assert!(err.is_client_error());
}

#[test]
fn quoted_cells_keep_commas_quotes_and_newlines() {
    let text = "Flow ID,Flow Duration,Note\n\"a,b\",10,\"say \"\"hi\"\"\"\n\"multi\nline\",20,x\n";
    let b = FlowBatch::from_csv_str(text).unwrap();
    assert_eq!(b.len(), 2);
    assert_eq!(b.records()[0].raw_at(0), "a,b");
    assert_eq!(b.records()[0].raw_at(2), "say \"hi\"");
    assert_eq!(b.records()[1].raw_at(0), "multi\nline");
    assert_eq!(b.records()[1].get(Field::FlowDuration), Some(20.0));
}

#[test]
fn unterminated_quote_is_malformed() {
    let err = FlowBatch::from_csv_str("a,b\n\"open,1\n").unwrap_err();
    assert!(matches!(err, LabelError::Malformed { line: 2, .. }));
}

#[test]
fn blank_lines_are_skipped() {
    let b = FlowBatch::from_csv_str("\nFlow Duration\n\n1\n\r\n2\n").unwrap();
    assert_eq!(b.len(), 2);
}

#[test]
fn header_only_or_empty_input_is_empty_batch() {
    assert!(matches!(FlowBatch::from_csv_str(""), Err(LabelError::EmptyBatch)));
    assert!(matches!(FlowBatch::from_csv_str("Flow Duration\n"), Err(LabelError::EmptyBatch)));
}

#[test]
fn output_appends_label_and_requotes() {
    let mut config = LabelerConfig::default();
    config.scoring.mode = flow_labeler::config::ScoringMode::Heuristic;
    let b = FlowBatch::from_csv_str("Flow ID,Flow Duration\n\"x,y\",-1\nz,10\n").unwrap();
    let labeled = LabelingPipeline::new(&config, None).label_batch(b).unwrap();
    assert_eq!(labeled.labels(), &[Label::Nap, Label::Benign]);
    assert_eq!(
        labeled.to_csv("Predicted_Label"),
        "Flow ID,Flow Duration,Predicted_Label\n\"x,y\",-1,NAP\nz,10,Benign\n"
    );
}

#[test]
fn stale_label_column_is_replaced() {
    let mut config = LabelerConfig::default();
    config.scoring.mode = flow_labeler::config::ScoringMode::Heuristic;
    let b = FlowBatch::from_csv_str("Predicted_Label,Flow Duration\nMalicious,10\n").unwrap();
    let labeled = LabelingPipeline::new(&config, None).label_batch(b).unwrap();
    assert_eq!(
        labeled.to_csv("Predicted_Label"),
        "Flow Duration,Predicted_Label\n10,Benign\n"
    );
}

#[test]
fn summary_counts_every_row_once() {
    let mut config = LabelerConfig::default();
    config.scoring.mode = flow_labeler::config::ScoringMode::Heuristic;
    let b = FlowBatch::from_csv_str("Flow Duration,Tot Fwd Pkts,Tot Bwd Pkts\n1,9,0\n1,1,1\n-1,1,1\n,1,1\n").unwrap();
    let s = LabelingPipeline::new(&config, None).label_batch(b).unwrap().summary();
    assert_eq!(s.rows, 4);
    assert_eq!(s.nap + s.benign + s.malicious, s.rows);
    assert_eq!((s.nap, s.benign, s.malicious), (2, 1, 1));
}

#[test]
fn leading_byte_order_mark_is_ignored() {
    let b = FlowBatch::from_csv_str("\u{feff}Flow Duration,Tot Fwd Pkts,Tot Bwd Pkts,TotLen Fwd Pkts,TotLen Bwd Pkts\n100,2,2,200,180\n").unwrap();
    assert_eq!(b.schema().columns()[0], "Flow Duration");
    assert_eq!(b.records()[0].get(Field::FlowDuration), Some(100.0));

    let mut config = LabelerConfig::default();
    config.scoring.mode = flow_labeler::config::ScoringMode::Heuristic;
    let labeled = LabelingPipeline::new(&config, None).label_batch(b).unwrap();
    assert_eq!(labeled.labels(), &[Label::Benign]);
}
