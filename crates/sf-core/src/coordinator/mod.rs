//! Session coordinator: turns inbound commands, button presses and text
//! into engine calls and replies.
//!
//! The coordinator is transport-neutral. A chat adapter (or the stdin REPL in
//! `main.rs`) converts its events into [`Inbound`] and delivers the returned
//! [`Reply`] values in order. All sessions share one [`SharedEngine`].

pub mod messages;
pub mod render;

use sf_common::{Error, Result, SYMBOL_COUNT};
use sf_config::Config;
use tracing::{debug, info};

use crate::engine::SharedEngine;
use crate::entry::parse_batch;
pub use messages::{Action, Button, Command, Inbound, Reply};

/// Routes inbound events to the shared engine.
#[derive(Debug, Clone)]
pub struct SessionCoordinator {
    engine: SharedEngine,
    window_size: usize,
    top_k: usize,
    allow_reset: bool,
}

impl SessionCoordinator {
    pub fn new(engine: SharedEngine, config: &Config) -> Self {
        Self {
            engine,
            window_size: config.window_size,
            top_k: config.top_k(),
            allow_reset: config.allow_reset(),
        }
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    /// Handle one inbound event.
    ///
    /// Persistence failures propagate; the engine has already rolled back,
    /// so the caller only needs to tell the player to retry.
    pub fn handle(&self, inbound: &Inbound) -> Result<Vec<Reply>> {
        match inbound {
            Inbound::Command(command) => self.handle_command(*command),
            Inbound::Action(action) => self.handle_action(*action),
            Inbound::Text(text) => self.handle_text(text),
        }
    }

    fn handle_command(&self, command: Command) -> Result<Vec<Reply>> {
        debug!(?command, "command");
        match command {
            Command::Start => Ok(vec![
                Reply::text(render::render_welcome(
                    self.top_k,
                    self.allow_reset,
                    self.window_size,
                )),
                self.prediction()?,
            ]),
            Command::Help => Ok(vec![Reply::text(render::render_help(self.allow_reset))]),
            Command::Stats => {
                let view = self.engine.lock()?.stats_view();
                Ok(vec![Reply::text(render::render_stats(&view))])
            }
            Command::Predict => Ok(vec![self.prediction()?]),
            Command::Reset if self.allow_reset => Ok(vec![render::render_reset_prompt()]),
            Command::Reset => Ok(vec![Reply::text("⛔ Reset is disabled.")]),
        }
    }

    fn handle_action(&self, action: Action) -> Result<Vec<Reply>> {
        debug!(payload = %action.payload(), "action");
        match action {
            Action::ConfirmPrediction(symbol) => {
                self.engine
                    .with(|e| e.record_outcome(symbol, Some(true)))?;
                info!(%symbol, correct = true, "prediction feedback");
                Ok(vec![
                    Reply::edit(format!(
                        "✅ Correct! The round landed on {}.\nStatistics updated.",
                        symbol.label()
                    )),
                    self.prediction()?,
                ])
            }
            Action::MarkWrong => Ok(vec![render::render_symbol_picker()]),
            Action::PickActual(symbol) => {
                self.engine
                    .with(|e| e.record_outcome(symbol, Some(false)))?;
                info!(%symbol, correct = false, "prediction feedback");
                Ok(vec![
                    Reply::edit(format!(
                        "📝 Recorded: the round landed on {}.\nStatistics updated.",
                        symbol.label()
                    )),
                    self.prediction()?,
                ])
            }
            Action::ResetConfirm if self.allow_reset => {
                self.engine.with(|e| e.reset())?;
                Ok(vec![
                    Reply::edit("♻️ All data has been reset."),
                    self.prediction()?,
                ])
            }
            Action::ResetConfirm => Ok(vec![Reply::edit("⛔ Reset is disabled.")]),
            Action::ResetCancel => Ok(vec![Reply::edit("❌ Reset cancelled.")]),
        }
    }

    fn handle_text(&self, text: &str) -> Result<Vec<Reply>> {
        let digits = match parse_batch(text, self.window_size) {
            Ok(Some(digits)) => digits,
            Ok(None) => {
                return Ok(vec![Reply::text(format!(
                    "Use the buttons to report each round, or paste the last {} results \
                     as digits 0-7. Type /help for commands.",
                    self.window_size
                ))]);
            }
            Err(Error::MalformedBatchInput { expected, found }) => {
                debug!(expected, found, "batch entry with wrong length");
                return Ok(vec![Reply::text(format!(
                    "⚠️ Expected exactly {expected} digits but found {found}. \
                     Nothing was recorded; please send the list again."
                ))]);
            }
            Err(e) => return Err(e),
        };

        let outcome = self.engine.with(|e| e.record_symbol_batch(digits))?;
        let mut text = format!("📥 Recorded {} outcomes.", outcome.accepted);
        if outcome.skipped > 0 {
            text.push_str(&format!(
                " Skipped {} digits outside 0-{}.",
                outcome.skipped,
                SYMBOL_COUNT - 1
            ));
        }
        Ok(vec![Reply::text(text), self.prediction()?])
    }

    fn prediction(&self) -> Result<Reply> {
        let top = self.engine.lock()?.predict();
        Ok(render::render_prediction(&top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineSettings, StatisticsEngine};
    use crate::store::MemoryStore;
    use sf_config::PredictionModel;

    fn coordinator(config: &Config) -> (SessionCoordinator, MemoryStore) {
        let store = MemoryStore::new();
        let engine = StatisticsEngine::open(Box::new(store.clone()), EngineSettings::from(config));
        (
            SessionCoordinator::new(SharedEngine::new(engine), config),
            store,
        )
    }

    fn action(payload: &str) -> Inbound {
        Inbound::Action(Action::parse(payload).unwrap())
    }

    #[test]
    fn start_greets_then_predicts() {
        let (c, _) = coordinator(&Config::default());
        let replies = c.handle(&Inbound::Command(Command::Start)).unwrap();
        assert_eq!(replies.len(), 2);
        assert!(replies[0].text.contains("Welcome"));
        // Markov default: 3 predictions plus "wrong".
        assert_eq!(replies[1].buttons.len(), 4);
        assert_eq!(replies[1].buttons[0][0].payload, "pred_0");
    }

    #[test]
    fn confirm_counts_as_correct() {
        let (c, store) = coordinator(&Config::default());
        let replies = c.handle(&action("pred_2")).unwrap();
        assert!(replies[0].edit_previous);
        assert!(replies[0].text.starts_with("✅ Correct!"));
        let saved = store.saved().unwrap();
        assert_eq!(saved.correct_predictions(), 1);
        assert_eq!(saved.total_predictions(), 1);
        assert_eq!(saved.global_counts()[2], 1);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn wrong_then_pick_records_miss() {
        let (c, store) = coordinator(&Config::default());
        let picker = c.handle(&action("wrong")).unwrap();
        assert_eq!(picker[0].buttons.len(), 8);
        assert_eq!(store.save_count(), 0);

        c.handle(&action("correct_6")).unwrap();
        let saved = store.saved().unwrap();
        assert_eq!(saved.correct_predictions(), 0);
        assert_eq!(saved.total_predictions(), 1);
        assert_eq!(saved.global_counts()[6], 1);
    }

    #[test]
    fn batch_entry_records_and_predicts() {
        let (c, store) = coordinator(&Config::default());
        let text = "2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 9";
        let replies = c.handle(&Inbound::Text(text.into())).unwrap();
        assert!(replies[0].text.contains("Recorded 28 outcomes"));
        assert!(replies[0].text.contains("Skipped 1"));
        assert_eq!(replies[1].buttons[0][0].payload, "pred_2");
        assert_eq!(store.saved().unwrap().total_observed(), 28);
    }

    #[test]
    fn malformed_batch_leaves_state_unchanged() {
        let (c, store) = coordinator(&Config::default());
        let replies = c.handle(&Inbound::Text("1 2 3".into())).unwrap();
        assert!(replies[0].text.contains("Expected exactly 29 digits but found 3"));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn stray_text_gets_hint() {
        let (c, store) = coordinator(&Config::default());
        let replies = c.handle(&Inbound::Text("hello".into())).unwrap();
        assert!(replies[0].text.contains("/help"));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn reset_respects_configuration() {
        let (markov, _) = coordinator(&Config::default());
        let replies = markov.handle(&Inbound::Command(Command::Reset)).unwrap();
        assert!(replies[0].buttons.is_empty());
        assert!(replies[0].text.contains("disabled"));

        let config = Config {
            model: PredictionModel::WindowFrequency,
            ..Config::default()
        };
        let (legacy, store) = coordinator(&config);
        legacy.handle(&action("pred_1")).unwrap();
        let prompt = legacy.handle(&Inbound::Command(Command::Reset)).unwrap();
        assert_eq!(prompt[0].buttons.len(), 2);

        let cancelled = legacy.handle(&action("reset_cancel")).unwrap();
        assert!(cancelled[0].text.contains("cancelled"));
        assert_eq!(store.saved().unwrap().total_observed(), 1);

        let replies = legacy.handle(&action("reset_confirm")).unwrap();
        assert!(replies[0].edit_previous);
        assert_eq!(store.saved().unwrap().total_observed(), 0);
        // Window model offers four symbols.
        assert_eq!(replies[1].buttons.len(), 5);
    }

    #[test]
    fn persistence_failure_propagates() {
        let (c, store) = coordinator(&Config::default());
        store.set_fail_writes(true);
        let err = c.handle(&action("pred_0")).unwrap_err();
        assert!(matches!(err, Error::PersistenceWrite(_)));
        let view = c.engine().lock().unwrap().stats_view();
        assert_eq!(view.total_observed, 0);
    }

    #[test]
    fn stats_command_renders_view() {
        let (c, _) = coordinator(&Config::default());
        c.handle(&action("pred_3")).unwrap();
        let replies = c.handle(&Inbound::Command(Command::Stats)).unwrap();
        assert!(replies[0].text.contains("📊 Total rounds: 1"));
        assert!(replies[0].text.contains("📈 Accuracy: 100.00%"));
    }
}
