//! Weighted rules over one valid record; thresholded into Benign/Malicious.

use crate::config::{AbsentFieldPolicy, HeuristicConfig};
use crate::record::{Field, FlowRecord, Label};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicRule {
    /// Forward-only flow: scan or flood
    OneSided,
    /// Packet rate above the flood threshold
    Flood,
    /// Several packets, no payload bytes either way
    HeaderOnly,
    /// Response dwarfs request
    Exfiltration,
    /// Ephemeral destination port on an already-suspicious flow
    EphemeralPort,
}

impl HeuristicRule {
    pub fn weight(self) -> u32 {
        match self {
            HeuristicRule::OneSided | HeuristicRule::Flood | HeuristicRule::HeaderOnly => 2,
            HeuristicRule::Exfiltration | HeuristicRule::EphemeralPort => 1,
        }
    }
}

/// Score plus the rules that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicScore {
    pub points: u32,
    pub fired: Vec<HeuristicRule>,
    pub label: Label,
}

pub struct HeuristicScorer {
    config: HeuristicConfig,
}

impl HeuristicScorer {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    /// Benign or Malicious; never NAP. Callers validate first.
    pub fn score(&self, record: &FlowRecord) -> Label {
        self.evaluate(record).label
    }

    pub fn evaluate(&self, record: &FlowRecord) -> HeuristicScore {
        let c = &self.config;
        // Under `Skip`, a comparison against an absent field is simply false.
        let get = |f: Field| match c.absent_fields {
            AbsentFieldPolicy::Zero => Some(record.get(f).unwrap_or(0.0)),
            AbsentFieldPolicy::Skip => record.get(f),
        };
        let fwd_pkts = get(Field::TotFwdPkts);
        let bwd_pkts = get(Field::TotBwdPkts);
        let fwd_bytes = get(Field::TotLenFwdPkts);
        let bwd_bytes = get(Field::TotLenBwdPkts);
        let duration = get(Field::FlowDuration);
        let pkt_rate = record.get(Field::FlowPktsPerSec);
        let dst_port = record.get(Field::DstPort);

        let mut fired = Vec::new();
        if let (Some(f), Some(b)) = (fwd_pkts, bwd_pkts) {
            if f >= c.one_sided_min_fwd_pkts && b == 0.0 {
                fired.push(HeuristicRule::OneSided);
            }
        }
        if pkt_rate.is_some_and(|r| r > c.flood_pkts_per_sec) {
            fired.push(HeuristicRule::Flood);
        }
        if let (Some(f), Some(b), Some(fb), Some(bb)) = (fwd_pkts, bwd_pkts, fwd_bytes, bwd_bytes) {
            if f + b >= c.header_only_min_pkts && fb == 0.0 && bb == 0.0 {
                fired.push(HeuristicRule::HeaderOnly);
            }
        }
        if let (Some(fb), Some(bb), Some(d)) = (fwd_bytes, bwd_bytes, duration) {
            if fb > 0.0 && bb / fb > c.exfil_ratio && d > 0.0 {
                fired.push(HeuristicRule::Exfiltration);
            }
        }

        let mut points: u32 = fired.iter().map(|r| r.weight()).sum();
        // Compounds existing suspicion only; never triggers alone.
        if points > 0 && dst_port.is_some_and(|p| p >= c.ephemeral_port_start) {
            fired.push(HeuristicRule::EphemeralPort);
            points += HeuristicRule::EphemeralPort.weight();
        }

        let label = if points >= c.malicious_threshold {
            Label::Malicious
        } else {
            Label::Benign
        };
        HeuristicScore {
            points,
            fired,
            label,
        }
    }
}
