//! Structural validity of a single flow record. A record failing any rule is NAP.

mod rules;

pub use rules::{Direction, Violation, MAX_PACKET_SIZE, MEAN_MAX_TOLERANCE};

use crate::record::FlowRecord;

type Rule = fn(&FlowRecord) -> Option<Violation>;

const RULES: [Rule; 10] = [
    rules::duration,
    rules::sizes,
    rules::fwd_mean_within_max,
    rules::bwd_mean_within_max,
    rules::packet_counts,
    rules::bytes_need_packets,
    rules::rates,
    rules::iats,
    rules::iat_min_within_max,
    rules::flag_counts,
];

/// Stateless; one instance can be shared by every pipeline and thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordValidator;

impl RecordValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn is_valid(&self, record: &FlowRecord) -> bool {
        RULES.iter().all(|rule| rule(record).is_none())
    }

    /// First failing rule, in rule order.
    pub fn check(&self, record: &FlowRecord) -> Result<(), Violation> {
        match RULES.iter().find_map(|rule| rule(record)) {
            Some(v) => Err(v),
            None => Ok(()),
        }
    }

    /// One entry per failing rule.
    pub fn violations(&self, record: &FlowRecord) -> Vec<Violation> {
        RULES.iter().filter_map(|rule| rule(record)).collect()
    }
}
