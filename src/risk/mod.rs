//! Rule-based suspicion scoring for valid flow records.

mod heuristic;

pub use heuristic::{HeuristicRule, HeuristicScore, HeuristicScorer};
