//! Labeler configuration. Loaded once at startup; every section has a usable default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelerConfig {
    /// Path to the ONNX binary classifier (class 0 = Benign, 1 = Malicious)
    pub model_path: PathBuf,
    /// Which strategy scores valid records
    pub scoring: ScoringConfig,
    /// Heuristic rule weights and thresholds
    pub heuristic: HeuristicConfig,
    /// Output table shape
    pub output: OutputConfig,
    /// Archive of labeled batches
    pub archive: ArchiveConfig,
    /// HTTP service
    pub server: ServerConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    Heuristic,
    Classifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub mode: ScoringMode,
    /// Columns fed to the classifier, in model order. `None` means every numeric column.
    pub feature_columns: Option<Vec<String>>,
}

/// How the heuristic treats a recognized field that is absent from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentFieldPolicy {
    /// Absent counts as numeric 0.
    Zero,
    /// A rule that needs an absent field does not fire.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Score at or above this is Malicious
    pub malicious_threshold: u32,
    /// Forward packets needed before a flow with no replies counts as one-sided
    pub one_sided_min_fwd_pkts: f64,
    /// Packets/second above this is a flood
    pub flood_pkts_per_sec: f64,
    /// Minimum fwd+bwd packets for the header-only rule
    pub header_only_min_pkts: f64,
    /// Backward/forward byte ratio above this is exfiltration-like
    pub exfil_ratio: f64,
    /// First port of the ephemeral range
    pub ephemeral_port_start: f64,
    pub absent_fields: AbsentFieldPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Name of the appended label column
    pub label_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub enabled: bool,
    /// Directory holding archived CSVs and the index database
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Upper bound on a single uploaded batch
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.onnx"),
            scoring: ScoringConfig::default(),
            heuristic: HeuristicConfig::default(),
            output: OutputConfig::default(),
            archive: ArchiveConfig::default(),
            server: ServerConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            mode: ScoringMode::Classifier,
            feature_columns: None,
        }
    }
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            malicious_threshold: 2,
            one_sided_min_fwd_pkts: 3.0,
            flood_pkts_per_sec: 10_000.0,
            header_only_min_pkts: 3.0,
            exfil_ratio: 50.0,
            ephemeral_port_start: 49_152.0,
            absent_fields: AbsentFieldPolicy::Zero,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            label_column: "Predicted_Label".to_string(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("classified_outputs"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LabelerConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<LabelerConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }
}
