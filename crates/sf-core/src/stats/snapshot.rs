//! The statistics snapshot: every counter the engine maintains.
//!
//! All mutation goes through methods that keep the invariants intact:
//! - `sum(global_counts) == total_observed`
//! - `recent_window.len() <= window_limit` passed to [`StatisticsSnapshot::observe`]
//! - `correct_predictions <= total_predictions`
//! - `transition_counts[a][b]` counts each adjacent observed pair once
//!
//! Distribution queries are pure functions of the counters.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sf_common::{Error, Result, Symbol, SYMBOL_COUNT};
use sf_math::{uniform, AdditiveSmoothing};
use std::collections::VecDeque;

/// Probability per symbol, indexed by symbol value.
pub type Distribution = [f64; SYMBOL_COUNT];

/// Square table of `from -> to` transition counts.
pub type TransitionMatrix = [[u64; SYMBOL_COUNT]; SYMBOL_COUNT];

/// Outcome of applying a batch of raw symbol values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Values recorded as observations.
    pub accepted: usize,
    /// Values rejected as out of range.
    pub skipped: usize,
}

/// Persisted statistics aggregate.
///
/// Field names on the wire follow the long-standing `shared_data.json` layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    #[serde(rename = "allCounts")]
    pub(crate) global_counts: [u64; SYMBOL_COUNT],

    #[serde(rename = "recent")]
    pub(crate) recent_window: VecDeque<Symbol>,

    #[serde(rename = "totalAll")]
    pub(crate) total_observed: u64,

    #[serde(rename = "correctPredictions")]
    pub(crate) correct_predictions: u64,

    #[serde(rename = "totalPredictions")]
    pub(crate) total_predictions: u64,

    #[serde(rename = "transitionCounts")]
    pub(crate) transition_counts: TransitionMatrix,

    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

impl Default for StatisticsSnapshot {
    fn default() -> Self {
        Self {
            global_counts: [0; SYMBOL_COUNT],
            recent_window: VecDeque::new(),
            total_observed: 0,
            correct_predictions: 0,
            total_predictions: 0,
            transition_counts: [[0; SYMBOL_COUNT]; SYMBOL_COUNT],
            updated_at: None,
        }
    }
}

fn increment(value: u64, counter: &'static str) -> Result<u64> {
    value
        .checked_add(1)
        .ok_or(Error::CounterOverflow { counter })
}

impl StatisticsSnapshot {
    /// Empty snapshot with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn global_counts(&self) -> &[u64; SYMBOL_COUNT] {
        &self.global_counts
    }

    pub fn recent_window(&self) -> &VecDeque<Symbol> {
        &self.recent_window
    }

    pub fn total_observed(&self) -> u64 {
        self.total_observed
    }

    pub fn correct_predictions(&self) -> u64 {
        self.correct_predictions
    }

    pub fn total_predictions(&self) -> u64 {
        self.total_predictions
    }

    pub fn transition_counts(&self) -> &TransitionMatrix {
        &self.transition_counts
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Most recently observed symbol still in the window.
    pub fn last_symbol(&self) -> Option<Symbol> {
        self.recent_window.back().copied()
    }

    /// Per-symbol counts inside the recent window.
    pub fn window_counts(&self) -> [u64; SYMBOL_COUNT] {
        let mut counts = [0u64; SYMBOL_COUNT];
        for symbol in &self.recent_window {
            counts[symbol.index()] += 1;
        }
        counts
    }

    /// Prediction accuracy in percent; zero before any feedback.
    pub fn accuracy_percent(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            self.correct_predictions as f64 / self.total_predictions as f64 * 100.0
        }
    }

    // ── Mutation ────────────────────────────────────────────────────────

    /// Record one observed symbol.
    ///
    /// The transition source is the current window tail, so consecutive
    /// calls chain naturally across batch boundaries. Fails without mutating
    /// when any counter involved is already at `u64::MAX`.
    pub fn observe(&mut self, symbol: Symbol, window_limit: usize) -> Result<()> {
        let to = symbol.index();
        let transition = self
            .last_symbol()
            .map(|prev| {
                let from = prev.index();
                increment(self.transition_counts[from][to], "transitionCounts")
                    .map(|count| (from, count))
            })
            .transpose()?;
        let count = increment(self.global_counts[to], "allCounts")?;
        let total = increment(self.total_observed, "totalAll")?;

        if let Some((from, count)) = transition {
            self.transition_counts[from][to] = count;
        }
        self.global_counts[to] = count;
        self.recent_window.push_back(symbol);
        self.truncate_window(window_limit);
        self.total_observed = total;
        Ok(())
    }

    /// Record raw values in order, skipping any outside the symbol range.
    ///
    /// Skipped values do not break the transition chain: the next valid
    /// value transitions from the last valid one. On error the values before
    /// the failing one stay applied; the engine discards the whole batch.
    pub fn observe_batch<I>(&mut self, values: I, window_limit: usize) -> Result<BatchOutcome>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut outcome = BatchOutcome::default();
        for value in values {
            match Symbol::new(value) {
                Some(symbol) => {
                    self.observe(symbol, window_limit)?;
                    outcome.accepted += 1;
                }
                None => outcome.skipped += 1,
            }
        }
        Ok(outcome)
    }

    /// Record prediction feedback.
    pub fn record_feedback(&mut self, was_top_prediction: bool) -> Result<()> {
        let total = increment(self.total_predictions, "totalPredictions")?;
        if was_top_prediction {
            self.correct_predictions =
                increment(self.correct_predictions, "correctPredictions")?;
        }
        self.total_predictions = total;
        Ok(())
    }

    /// Drop the oldest window entries beyond `window_limit`.
    ///
    /// Returns how many entries were evicted.
    pub fn truncate_window(&mut self, window_limit: usize) -> usize {
        let excess = self.recent_window.len().saturating_sub(window_limit);
        self.recent_window.drain(..excess);
        excess
    }

    /// Stamp the snapshot with the current time.
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    // ── Distributions ───────────────────────────────────────────────────

    /// Smoothed distribution over lifetime counts; uniform with no data.
    pub fn global_distribution(&self, smoothing: &AdditiveSmoothing) -> Distribution {
        if self.total_observed == 0 {
            return uniform();
        }
        smoothing.apply_fixed(&self.global_counts)
    }

    /// Smoothed distribution over the recent window; uniform when empty.
    pub fn window_distribution(&self, smoothing: &AdditiveSmoothing) -> Distribution {
        if self.recent_window.is_empty() {
            return uniform();
        }
        smoothing.apply_fixed(&self.window_counts())
    }

    /// Smoothed transition row of the last observed symbol.
    ///
    /// Falls back to the window distribution when the window is empty or the
    /// row has no observations.
    pub fn markov_distribution(&self, smoothing: &AdditiveSmoothing) -> Distribution {
        let Some(last) = self.last_symbol() else {
            return self.window_distribution(smoothing);
        };
        let row = &self.transition_counts[last.index()];
        if row.iter().all(|&c| c == 0) {
            return self.window_distribution(smoothing);
        }
        smoothing.apply_fixed(row)
    }
}
