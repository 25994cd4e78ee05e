use crate::record::{Field, FlowRecord};
use std::fmt;
use thiserror::Error;

/// Ceiling for a single packet's length or an averaged packet size. Well above a 1500-byte MTU.
pub const MAX_PACKET_SIZE: f64 = 2000.0;

/// Slack for float rounding when comparing a mean against its max.
pub const MEAN_MAX_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("flow duration is missing")]
    MissingDuration,
    #[error("flow duration {0} is negative")]
    NegativeDuration(f64),
    #[error("{field} = {value} is negative")]
    NegativeSize { field: Field, value: f64 },
    #[error("{field} = {value} exceeds the per-packet ceiling")]
    OversizedPacket { field: Field, value: f64 },
    #[error("{0} packet length mean exceeds max")]
    MeanExceedsMax(Direction),
    #[error("{field} = {value} is negative")]
    NegativePacketCount { field: Field, value: f64 },
    #[error("{0} direction carries bytes without packets")]
    BytesWithoutPackets(Direction),
    #[error("{field} = {value} is not a finite non-negative rate")]
    InvalidRate { field: Field, value: f64 },
    #[error("{field} = {value} is negative")]
    NegativeIat { field: Field, value: f64 },
    #[error("flow IAT min exceeds max")]
    IatMinExceedsMax,
    #[error("{field} = {value} is negative or exceeds total packets")]
    FlagCount { field: Field, value: f64 },
}

pub(super) fn duration(r: &FlowRecord) -> Option<Violation> {
    match r.get(Field::FlowDuration) {
        None => Some(Violation::MissingDuration),
        Some(d) if d < 0.0 => Some(Violation::NegativeDuration(d)),
        Some(_) => None,
    }
}

pub(super) fn sizes(r: &FlowRecord) -> Option<Violation> {
    Field::SIZES.into_iter().find_map(|field| {
        let value = r.get(field)?;
        if value < 0.0 {
            Some(Violation::NegativeSize { field, value })
        } else if field.is_per_packet_size() && value > MAX_PACKET_SIZE {
            Some(Violation::OversizedPacket { field, value })
        } else {
            None
        }
    })
}

fn mean_within_max(r: &FlowRecord, mean: Field, max: Field, dir: Direction) -> Option<Violation> {
    let (mean, max) = (r.get(mean)?, r.get(max)?);
    (mean > max + MEAN_MAX_TOLERANCE).then_some(Violation::MeanExceedsMax(dir))
}

pub(super) fn fwd_mean_within_max(r: &FlowRecord) -> Option<Violation> {
    mean_within_max(r, Field::FwdPktLenMean, Field::FwdPktLenMax, Direction::Forward)
}

pub(super) fn bwd_mean_within_max(r: &FlowRecord) -> Option<Violation> {
    mean_within_max(r, Field::BwdPktLenMean, Field::BwdPktLenMax, Direction::Backward)
}

pub(super) fn packet_counts(r: &FlowRecord) -> Option<Violation> {
    [Field::TotFwdPkts, Field::TotBwdPkts]
        .into_iter()
        .find_map(|field| {
            let value = r.get(field)?;
            (value < 0.0).then_some(Violation::NegativePacketCount { field, value })
        })
}

pub(super) fn bytes_need_packets(r: &FlowRecord) -> Option<Violation> {
    [
        (Field::TotFwdPkts, Field::TotLenFwdPkts, Direction::Forward),
        (Field::TotBwdPkts, Field::TotLenBwdPkts, Direction::Backward),
    ]
    .into_iter()
    .find_map(|(pkts, bytes, dir)| {
        let (pkts, bytes) = (r.get(pkts)?, r.get(bytes)?);
        (pkts == 0.0 && bytes != 0.0).then_some(Violation::BytesWithoutPackets(dir))
    })
}

/// An infinite rate means the rate was divided by a zero duration upstream.
pub(super) fn rates(r: &FlowRecord) -> Option<Violation> {
    [Field::FlowBytesPerSec, Field::FlowPktsPerSec]
        .into_iter()
        .find_map(|field| {
            let value = r.get(field)?;
            (value < 0.0 || value.is_infinite()).then_some(Violation::InvalidRate { field, value })
        })
}

pub(super) fn iats(r: &FlowRecord) -> Option<Violation> {
    Field::IATS.into_iter().find_map(|field| {
        let value = r.get(field)?;
        (value < 0.0).then_some(Violation::NegativeIat { field, value })
    })
}

pub(super) fn iat_min_within_max(r: &FlowRecord) -> Option<Violation> {
    let (min, max) = (r.get(Field::FlowIatMin)?, r.get(Field::FlowIatMax)?);
    (min > max).then_some(Violation::IatMinExceedsMax)
}

pub(super) fn flag_counts(r: &FlowRecord) -> Option<Violation> {
    let total = match (r.get(Field::TotFwdPkts), r.get(Field::TotBwdPkts)) {
        (None, None) => None,
        (fwd, bwd) => Some(fwd.unwrap_or(0.0) + bwd.unwrap_or(0.0)),
    };
    Field::FLAGS.into_iter().find_map(|field| {
        let value = r.get(field)?;
        let over = total.is_some_and(|t| value > t);
        (value < 0.0 || over).then_some(Violation::FlagCount { field, value })
    })
}
