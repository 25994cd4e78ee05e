//! Flow labeler: assigns every network-flow summary record exactly one label,
//! NAP (structurally implausible), Benign or Malicious.
//!
//! Modular structure:
//! - [`record`]: Field catalogue, flow records, CSV batches, labels
//! - [`validate`]: Structural validity rules (NAP detection)
//! - [`risk`]: Heuristic suspicion scoring
//! - [`features`]: Classifier input preparation
//! - [`model`]: Classifier seam and ONNX implementation
//! - [`pipeline`]: Validity mask + scoring strategy → labels
//! - [`storage`]: Archive of labeled batches
//! - [`server`]: HTTP boundary
//! - [`logging`]: Structured logging

pub mod config;
pub mod error;
pub mod record;
pub mod validate;
pub mod risk;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod storage;
pub mod server;
pub mod logging;

pub use config::LabelerConfig;
pub use error::LabelError;
pub use record::{Field, FlowBatch, FlowRecord, Label, LabeledBatch};
pub use validate::RecordValidator;
pub use risk::HeuristicScorer;
pub use model::{Classifier, SharedClassifier};
pub use pipeline::LabelingPipeline;
pub use storage::BatchArchive;
pub use logging::StructuredLogger;
