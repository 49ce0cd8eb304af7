//! Statistics engine: owns the snapshot and persists every mutation.
//!
//! Each mutating call is one unit of work: mutate, stamp, save. If the save
//! fails the in-memory snapshot is rolled back, so memory and disk never
//! diverge and the caller sees `Error::PersistenceWrite`.
//!
//! The engine itself is single-threaded; [`SharedEngine`] wraps it in a
//! mutex so concurrent chat sessions serialize their updates.

use chrono::{DateTime, Utc};
use sf_common::{Error, Result, Symbol, SYMBOL_COUNT};
use sf_config::{Config, PredictionModel};
use sf_math::{top_k, AdditiveSmoothing};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::stats::{BatchOutcome, Distribution, StatisticsSnapshot};
use crate::store::SnapshotStore;

/// Engine parameters derived from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub model: PredictionModel,
    pub window_size: usize,
    pub top_k: usize,
    pub smoothing: AdditiveSmoothing,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            model: config.model,
            window_size: config.window_size,
            top_k: config.top_k(),
            smoothing: config.smoothing,
        }
    }
}

/// Point-in-time copy of everything the statistics view displays.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    pub model: PredictionModel,
    pub global: Distribution,
    pub window: Distribution,
    pub markov: Distribution,
    pub global_counts: [u64; SYMBOL_COUNT],
    pub total_observed: u64,
    pub window_len: usize,
    pub window_size: usize,
    pub correct_predictions: u64,
    pub total_predictions: u64,
    pub accuracy_percent: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Owner of the statistics snapshot and its store.
pub struct StatisticsEngine {
    snapshot: StatisticsSnapshot,
    store: Box<dyn SnapshotStore>,
    settings: EngineSettings,
}

impl std::fmt::Debug for StatisticsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsEngine")
            .field("store", &self.store.describe())
            .field("settings", &self.settings)
            .field("total_observed", &self.snapshot.total_observed())
            .finish()
    }
}

impl StatisticsEngine {
    /// Load the persisted snapshot from `store` and build an engine around it.
    ///
    /// A persisted window longer than the configured size keeps its newest
    /// entries.
    pub fn open(store: Box<dyn SnapshotStore>, settings: EngineSettings) -> Self {
        let mut snapshot = store.load();
        let evicted = snapshot.truncate_window(settings.window_size);
        if evicted > 0 {
            warn!(
                evicted,
                window_size = settings.window_size,
                "persisted window exceeds configured size, dropping oldest entries"
            );
        }
        info!(
            store = %store.describe(),
            model = %settings.model,
            total_observed = snapshot.total_observed(),
            window_len = snapshot.recent_window().len(),
            "statistics engine ready"
        );
        Self {
            snapshot,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> &StatisticsSnapshot {
        &self.snapshot
    }

    /// Apply `mutate`, then persist; roll back if either step fails.
    fn commit<T>(
        &mut self,
        mutate: impl FnOnce(&mut StatisticsSnapshot) -> Result<T>,
    ) -> Result<T> {
        let previous = self.snapshot.clone();
        let out = match mutate(&mut self.snapshot) {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, code = e.code(), "update rejected, rolling back");
                self.snapshot = previous;
                return Err(e);
            }
        };
        self.snapshot.touch();
        if let Err(e) = self.store.save(&self.snapshot) {
            warn!(error = %e, store = %self.store.describe(), "save failed, rolling back");
            self.snapshot = previous;
            return Err(e);
        }
        Ok(out)
    }

    // ── Updates ─────────────────────────────────────────────────────────

    /// Record one raw symbol value.
    ///
    /// Returns `Ok(false)` without touching state when the value is outside
    /// the symbol range.
    pub fn record_symbol(&mut self, value: i64) -> Result<bool> {
        let Some(symbol) = Symbol::new(value) else {
            debug!(value, "rejecting out-of-range symbol");
            return Ok(false);
        };
        self.record(symbol)?;
        Ok(true)
    }

    /// Record one validated symbol.
    pub fn record(&mut self, symbol: Symbol) -> Result<()> {
        let window_size = self.settings.window_size;
        self.commit(|s| s.observe(symbol, window_size))?;
        debug!(%symbol, total_observed = self.snapshot.total_observed(), "symbol recorded");
        Ok(())
    }

    /// Record raw values in order with a single save at the end.
    ///
    /// Out-of-range values are skipped and counted in the outcome.
    pub fn record_symbol_batch<I>(&mut self, values: I) -> Result<BatchOutcome>
    where
        I: IntoIterator<Item = i64>,
    {
        let window_size = self.settings.window_size;
        let outcome = self.commit(|s| s.observe_batch(values, window_size))?;
        info!(
            accepted = outcome.accepted,
            skipped = outcome.skipped,
            total_observed = self.snapshot.total_observed(),
            "batch recorded"
        );
        Ok(outcome)
    }

    /// Record prediction feedback.
    pub fn record_feedback(&mut self, was_top_prediction: bool) -> Result<()> {
        self.commit(|s| s.record_feedback(was_top_prediction))?;
        debug!(was_top_prediction, "feedback recorded");
        Ok(())
    }

    /// Record feedback (if any) and the actual symbol under one save.
    pub fn record_outcome(&mut self, symbol: Symbol, feedback: Option<bool>) -> Result<()> {
        let window_size = self.settings.window_size;
        self.commit(|s| {
            if let Some(was_top) = feedback {
                s.record_feedback(was_top)?;
            }
            s.observe(symbol, window_size)
        })?;
        debug!(%symbol, ?feedback, "outcome recorded");
        Ok(())
    }

    /// Replace every counter with its default and persist.
    pub fn reset(&mut self) -> Result<()> {
        self.commit(|s| {
            *s = StatisticsSnapshot::default();
            Ok(())
        })?;
        info!("statistics reset");
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn global_distribution(&self) -> Distribution {
        self.snapshot.global_distribution(&self.settings.smoothing)
    }

    pub fn window_distribution(&self) -> Distribution {
        self.snapshot.window_distribution(&self.settings.smoothing)
    }

    pub fn markov_distribution(&self) -> Distribution {
        self.snapshot.markov_distribution(&self.settings.smoothing)
    }

    /// Distribution backing the given model.
    pub fn distribution(&self, model: PredictionModel) -> Distribution {
        match model {
            PredictionModel::WindowFrequency => self.window_distribution(),
            PredictionModel::MarkovChain => self.markov_distribution(),
        }
    }

    /// Top-K symbols under the configured model.
    pub fn predict(&self) -> Vec<Symbol> {
        let dist = self.distribution(self.settings.model);
        top_k(&dist, self.settings.top_k)
            .into_iter()
            .filter_map(|i| Symbol::try_from(i).ok())
            .collect()
    }

    pub fn accuracy_percent(&self) -> f64 {
        self.snapshot.accuracy_percent()
    }

    /// Copy of the values shown by the statistics view.
    pub fn stats_view(&self) -> StatsView {
        StatsView {
            model: self.settings.model,
            global: self.global_distribution(),
            window: self.window_distribution(),
            markov: self.markov_distribution(),
            global_counts: *self.snapshot.global_counts(),
            total_observed: self.snapshot.total_observed(),
            window_len: self.snapshot.recent_window().len(),
            window_size: self.settings.window_size,
            correct_predictions: self.snapshot.correct_predictions(),
            total_predictions: self.snapshot.total_predictions(),
            accuracy_percent: self.snapshot.accuracy_percent(),
            updated_at: self.snapshot.updated_at(),
        }
    }
}

/// Engine shared across sessions; every call holds the lock for its whole
/// mutate-and-persist cycle.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<StatisticsEngine>>,
}

impl SharedEngine {
    pub fn new(engine: StatisticsEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Exclusive access to the engine.
    pub fn lock(&self) -> Result<MutexGuard<'_, StatisticsEngine>> {
        self.inner.lock().map_err(|_| Error::StatePoisoned)
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<T>(&self, f: impl FnOnce(&mut StatisticsEngine) -> Result<T>) -> Result<T> {
        let mut engine = self.lock()?;
        f(&mut engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn engine_with(store: &MemoryStore) -> StatisticsEngine {
        StatisticsEngine::open(Box::new(store.clone()), EngineSettings::default())
    }

    fn legacy_settings() -> EngineSettings {
        EngineSettings {
            model: PredictionModel::WindowFrequency,
            top_k: 4,
            ..EngineSettings::default()
        }
    }

    #[test]
    fn record_symbol_rejects_out_of_range() {
        let store = MemoryStore::new();
        let mut engine = engine_with(&store);
        assert!(!engine.record_symbol(8).unwrap());
        assert!(!engine.record_symbol(-1).unwrap());
        assert_eq!(engine.snapshot().total_observed(), 0);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn record_symbol_persists_each_call() {
        let store = MemoryStore::new();
        let mut engine = engine_with(&store);
        assert!(engine.record_symbol(4).unwrap());
        assert!(engine.record_symbol(1).unwrap());
        assert_eq!(store.save_count(), 2);
        let saved = store.saved().unwrap();
        assert_eq!(saved.global_counts()[4], 1);
        assert!(saved.updated_at().is_some());
    }

    #[test]
    fn batch_saves_once() {
        let store = MemoryStore::new();
        let mut engine = engine_with(&store);
        let mut values: Vec<i64> = (0..29).map(|i| i % 8).collect();
        values[10] = 9;
        let outcome = engine.record_symbol_batch(values).unwrap();
        assert_eq!(outcome.accepted, 28);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(engine.snapshot().total_observed(), 28);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn batch_chains_from_prior_tail() {
        let store = MemoryStore::new();
        let mut engine = engine_with(&store);
        engine.record_symbol(6).unwrap();
        engine.record_symbol_batch([3, 1]).unwrap();
        let t = engine.snapshot().transition_counts();
        assert_eq!(t[6][3], 1);
        assert_eq!(t[3][1], 1);
    }

    #[test]
    fn reset_clears_everything() {
        let store = MemoryStore::new();
        let mut engine = engine_with(&store);
        engine.record_symbol_batch([1, 2, 3, 3]).unwrap();
        engine.record_feedback(true).unwrap();
        engine.reset().unwrap();

        let s = engine.snapshot();
        assert_eq!(s.total_observed(), 0);
        assert_eq!(s.total_predictions(), 0);
        assert!(s.recent_window().is_empty());
        assert!(s.transition_counts().iter().flatten().all(|&c| c == 0));
        for dist in [
            engine.global_distribution(),
            engine.window_distribution(),
            engine.markov_distribution(),
        ] {
            assert!(dist.iter().all(|&p| (p - 0.125).abs() < 1e-12));
        }
        assert_eq!(store.saved().unwrap().total_observed(), 0);
    }

    #[test]
    fn failed_save_rolls_back() {
        let store = MemoryStore::new();
        let mut engine = engine_with(&store);
        engine.record_symbol(2).unwrap();
        store.set_fail_writes(true);

        let err = engine.record_symbol(5).unwrap_err();
        assert!(matches!(err, Error::PersistenceWrite(_)));
        assert_eq!(engine.snapshot().total_observed(), 1);
        assert_eq!(engine.snapshot().last_symbol(), Symbol::new(2));

        assert!(engine.reset().is_err());
        assert_eq!(engine.snapshot().total_observed(), 1);
    }

    #[test]
    fn feedback_bookkeeping() {
        let store = MemoryStore::new();
        let mut engine = engine_with(&store);
        engine.record_feedback(true).unwrap();
        engine.record_feedback(false).unwrap();
        assert_eq!(engine.snapshot().correct_predictions(), 1);
        assert_eq!(engine.snapshot().total_predictions(), 2);
        assert!((engine.accuracy_percent() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn record_outcome_is_one_save() {
        let store = MemoryStore::new();
        let mut engine = engine_with(&store);
        engine
            .record_outcome(Symbol::new(3).unwrap(), Some(false))
            .unwrap();
        assert_eq!(store.save_count(), 1);
        let saved = store.saved().unwrap();
        assert_eq!(saved.total_predictions(), 1);
        assert_eq!(saved.correct_predictions(), 0);
        assert_eq!(saved.global_counts()[3], 1);
    }

    #[test]
    fn predict_uses_configured_model_and_k() {
        let store = MemoryStore::new();
        let mut engine = StatisticsEngine::open(Box::new(store.clone()), legacy_settings());
        engine.record_symbol_batch([5, 5, 5, 2, 2, 7]).unwrap();
        let top: Vec<u8> = engine.predict().into_iter().map(Symbol::value).collect();
        // Window counts: 5→3, 2→2, 7→1, then ties at zero by index.
        assert_eq!(top, vec![5, 2, 7, 0]);

        let mut markov = engine_with(&store);
        // Loaded from the same store: last symbol 7 has no outgoing transitions,
        // so the window distribution drives the ranking.
        assert_eq!(markov.predict().len(), 3);
        markov.record_symbol_batch([1, 7, 1]).unwrap();
        // Row 1 now holds 1→7 once; 7→1 twice; last symbol is 1.
        assert_eq!(markov.predict()[0].value(), 7);
    }

    #[test]
    fn open_truncates_oversized_window() {
        let mut seeded = StatisticsSnapshot::new();
        seeded.observe_batch((0..40).map(|i| i % 8), 100).unwrap();
        let store = MemoryStore::with_snapshot(seeded);
        let engine = engine_with(&store);
        assert_eq!(engine.snapshot().recent_window().len(), 29);
        assert_eq!(engine.snapshot().total_observed(), 40);
    }

    #[test]
    fn stats_view_reflects_state() {
        let store = MemoryStore::new();
        let mut engine = engine_with(&store);
        engine.record_symbol_batch([0, 1, 1]).unwrap();
        let view = engine.stats_view();
        assert_eq!(view.total_observed, 3);
        assert_eq!(view.window_len, 3);
        assert_eq!(view.window_size, 29);
        assert_eq!(view.global_counts[1], 2);
        assert_eq!(view.model, PredictionModel::MarkovChain);
        assert!(view.updated_at.is_some());
    }

    #[test]
    fn shared_engine_serializes_writers() {
        let store = MemoryStore::new();
        let shared = SharedEngine::new(engine_with(&store));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        shared
                            .with(|engine| engine.record_symbol((t + i) % 8).map(|_| ()))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let engine = shared.lock().unwrap();
        let s = engine.snapshot();
        assert_eq!(s.total_observed(), 200);
        assert_eq!(s.global_counts().iter().sum::<u64>(), 200);
        let transitions: u64 = s.transition_counts().iter().flatten().sum();
        assert_eq!(transitions, 199);
        assert_eq!(store.save_count(), 200);
    }

    #[test]
    fn saturated_counter_is_rejected_without_saving() {
        let mut seeded = StatisticsSnapshot::new();
        seeded.global_counts[0] = u64::MAX;
        seeded.total_observed = u64::MAX;
        let store = MemoryStore::with_snapshot(seeded.clone());
        let mut engine = engine_with(&store);

        let err = engine.record_symbol(0).unwrap_err();
        assert!(matches!(err, Error::CounterOverflow { .. }));
        assert_eq!(engine.snapshot(), &seeded);
        assert_eq!(store.save_count(), 0);

        // The leading 3 is discarded along with the rejected 0.
        let err = engine.record_symbol_batch([3, 0]).unwrap_err();
        assert!(matches!(err, Error::CounterOverflow { .. }));
        assert_eq!(engine.snapshot(), &seeded);

        // Reset clears the saturation.
        engine.reset().unwrap();
        assert!(engine.record_symbol(0).unwrap());
    }

    #[test]
    fn saturated_outcome_leaves_feedback_untouched() {
        let mut seeded = StatisticsSnapshot::new();
        seeded.global_counts[6] = u64::MAX;
        seeded.total_observed = u64::MAX;
        let store = MemoryStore::with_snapshot(seeded);
        let mut engine = engine_with(&store);

        assert!(engine
            .record_outcome(Symbol::new(6).unwrap(), Some(true))
            .is_err());
        assert_eq!(engine.snapshot().total_predictions(), 0);
        assert_eq!(engine.snapshot().correct_predictions(), 0);
    }
}
