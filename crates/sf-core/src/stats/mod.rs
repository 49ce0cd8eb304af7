//! Statistics model: counters, sliding window, and transition matrix.

pub mod snapshot;

pub use snapshot::{BatchOutcome, Distribution, StatisticsSnapshot, TransitionMatrix};
