//! Recognized CICFlowMeter fields. Each has a short canonical name plus the long
//! CIC-IDS2017 spelling; matching is case- and whitespace-insensitive.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    FlowDuration,
    FwdPktLenMax,
    FwdPktLenMean,
    BwdPktLenMax,
    BwdPktLenMean,
    TotLenFwdPkts,
    TotLenBwdPkts,
    PktSizeAvg,
    TotFwdPkts,
    TotBwdPkts,
    FlowBytesPerSec,
    FlowPktsPerSec,
    FlowIatMean,
    FlowIatStd,
    FlowIatMax,
    FlowIatMin,
    FwdIatMean,
    FwdIatStd,
    BwdIatMean,
    FinFlagCnt,
    SynFlagCnt,
    RstFlagCnt,
    PshFlagCnt,
    AckFlagCnt,
    UrgFlagCnt,
    EceFlagCnt,
    DstPort,
}

impl Field {
    pub const ALL: [Field; 27] = [
        Field::FlowDuration,
        Field::FwdPktLenMax,
        Field::FwdPktLenMean,
        Field::BwdPktLenMax,
        Field::BwdPktLenMean,
        Field::TotLenFwdPkts,
        Field::TotLenBwdPkts,
        Field::PktSizeAvg,
        Field::TotFwdPkts,
        Field::TotBwdPkts,
        Field::FlowBytesPerSec,
        Field::FlowPktsPerSec,
        Field::FlowIatMean,
        Field::FlowIatStd,
        Field::FlowIatMax,
        Field::FlowIatMin,
        Field::FwdIatMean,
        Field::FwdIatStd,
        Field::BwdIatMean,
        Field::FinFlagCnt,
        Field::SynFlagCnt,
        Field::RstFlagCnt,
        Field::PshFlagCnt,
        Field::AckFlagCnt,
        Field::UrgFlagCnt,
        Field::EceFlagCnt,
        Field::DstPort,
    ];

    pub const SIZES: [Field; 7] = [
        Field::FwdPktLenMax,
        Field::FwdPktLenMean,
        Field::BwdPktLenMax,
        Field::BwdPktLenMean,
        Field::TotLenFwdPkts,
        Field::TotLenBwdPkts,
        Field::PktSizeAvg,
    ];

    pub const IATS: [Field; 7] = [
        Field::FlowIatMean,
        Field::FlowIatStd,
        Field::FlowIatMax,
        Field::FlowIatMin,
        Field::FwdIatMean,
        Field::FwdIatStd,
        Field::BwdIatMean,
    ];

    pub const FLAGS: [Field; 7] = [
        Field::FinFlagCnt,
        Field::SynFlagCnt,
        Field::RstFlagCnt,
        Field::PshFlagCnt,
        Field::AckFlagCnt,
        Field::UrgFlagCnt,
        Field::EceFlagCnt,
    ];

    /// Canonical column name.
    pub fn name(self) -> &'static str {
        self.spellings()[0]
    }

    fn spellings(self) -> &'static [&'static str] {
        match self {
            Field::FlowDuration => &["Flow Duration"],
            Field::FwdPktLenMax => &["Fwd Pkt Len Max", "Fwd Packet Length Max"],
            Field::FwdPktLenMean => &["Fwd Pkt Len Mean", "Fwd Packet Length Mean"],
            Field::BwdPktLenMax => &["Bwd Pkt Len Max", "Bwd Packet Length Max"],
            Field::BwdPktLenMean => &["Bwd Pkt Len Mean", "Bwd Packet Length Mean"],
            Field::TotLenFwdPkts => &["TotLen Fwd Pkts", "Total Length of Fwd Packets"],
            Field::TotLenBwdPkts => &["TotLen Bwd Pkts", "Total Length of Bwd Packets"],
            Field::PktSizeAvg => &["Pkt Size Avg", "Average Packet Size"],
            Field::TotFwdPkts => &["Tot Fwd Pkts", "Total Fwd Packets"],
            Field::TotBwdPkts => &["Tot Bwd Pkts", "Total Backward Packets"],
            Field::FlowBytesPerSec => &["Flow Byts/s", "Flow Bytes/s"],
            Field::FlowPktsPerSec => &["Flow Pkts/s", "Flow Packets/s"],
            Field::FlowIatMean => &["Flow IAT Mean"],
            Field::FlowIatStd => &["Flow IAT Std"],
            Field::FlowIatMax => &["Flow IAT Max"],
            Field::FlowIatMin => &["Flow IAT Min"],
            Field::FwdIatMean => &["Fwd IAT Mean"],
            Field::FwdIatStd => &["Fwd IAT Std"],
            Field::BwdIatMean => &["Bwd IAT Mean"],
            Field::FinFlagCnt => &["FIN Flag Cnt", "FIN Flag Count"],
            Field::SynFlagCnt => &["SYN Flag Cnt", "SYN Flag Count"],
            Field::RstFlagCnt => &["RST Flag Cnt", "RST Flag Count"],
            Field::PshFlagCnt => &["PSH Flag Cnt", "PSH Flag Count"],
            Field::AckFlagCnt => &["ACK Flag Cnt", "ACK Flag Count"],
            Field::UrgFlagCnt => &["URG Flag Cnt", "URG Flag Count"],
            Field::EceFlagCnt => &["ECE Flag Cnt", "ECE Flag Count"],
            Field::DstPort => &["Dst Port", "Destination Port"],
        }
    }

    pub fn from_column(column: &str) -> Option<Field> {
        let key = normalize_column(column);
        Field::ALL.into_iter().find(|f| {
            f.spellings()
                .iter()
                .any(|s| normalize_column(s) == key)
        })
    }

    /// Size fields describing one packet (or an average of packets) rather than a flow total.
    pub fn is_per_packet_size(self) -> bool {
        matches!(
            self,
            Field::FwdPktLenMax
                | Field::FwdPktLenMean
                | Field::BwdPktLenMax
                | Field::BwdPktLenMean
                | Field::PktSizeAvg
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercase, trimmed, internal whitespace collapsed to one space.
pub fn normalize_column(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
