//! Text rendering for statistics and prediction messages.

use sf_common::Symbol;
use std::fmt::Write;

use super::messages::{Action, Button, Reply};
use crate::engine::StatsView;

/// Format a probability as a percentage with two decimals.
fn pct(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

/// Statistics message: accuracy, per-symbol probabilities, totals.
pub fn render_stats(view: &StatsView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📊 Learning statistics");
    let _ = writeln!(out, "✅ Correct predictions: {}", view.correct_predictions);
    let _ = writeln!(out, "🔮 Total predictions: {}", view.total_predictions);
    let _ = writeln!(out, "📈 Accuracy: {:.2}%", view.accuracy_percent);
    let _ = writeln!(out);
    let _ = writeln!(out, "🎯 Current probabilities (model: {})", view.model);
    for symbol in Symbol::all() {
        let i = symbol.index();
        let info = symbol.info();
        let _ = writeln!(
            out,
            "{} `{}x` | global: {} | window: {} | markov: {} | seen: {}",
            info.icon,
            info.multiplier,
            pct(view.global[i]),
            pct(view.window[i]),
            pct(view.markov[i]),
            view.global_counts[i],
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "📊 Total rounds: {}", view.total_observed);
    let _ = write!(
        out,
        "🔄 Last {} outcomes in the window (max {})",
        view.window_len, view.window_size
    );
    if let Some(ts) = view.updated_at {
        let _ = write!(out, "\n🕒 Last updated: {}", ts.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    out
}

/// Prediction message with one button per ranked symbol plus "wrong".
pub fn render_prediction(top: &[Symbol]) -> Reply {
    let text = format!(
        "🔮 My prediction for the next round:\n\
         Tap the right symbol if it is among these {}, or tap \"Wrong\" and pick the actual one.",
        top.len()
    );
    let mut rows: Vec<Vec<Button>> = top
        .iter()
        .map(|&s| vec![Button::new(s.label(), Action::ConfirmPrediction(s))])
        .collect();
    rows.push(vec![Button::new("❌ Wrong", Action::MarkWrong)]);
    Reply::text(text).with_buttons(rows)
}

/// Full symbol list shown after the player marks a prediction wrong.
pub fn render_symbol_picker() -> Reply {
    let rows = Symbol::all()
        .map(|s| vec![Button::new(s.label(), Action::PickActual(s))])
        .collect();
    Reply::edit("❌ Pick the actual symbol from the list:").with_buttons(rows)
}

/// Reset confirmation prompt.
pub fn render_reset_prompt() -> Reply {
    Reply::text("Are you sure you want to erase all shared data?").with_buttons(vec![
        vec![Button::new("Yes", Action::ResetConfirm)],
        vec![Button::new("No", Action::ResetCancel)],
    ])
}

/// Greeting for `/start`.
pub fn render_welcome(top_k: usize, allow_reset: bool, window_size: usize) -> String {
    let mut out = format!(
        "👋 Welcome to the round predictor!\n\n\
         Every round I offer my top {top_k} symbols.\n\
         When the round ends, tap the right one if it was offered,\n\
         or tap \"❌ Wrong\" and choose the actual symbol from the list.\n\
         You can also paste the last {window_size} results as digits (0-7) to seed the statistics.\n\n"
    );
    out.push_str(&render_help(allow_reset));
    out.push_str("\n\nLet's start with the first prediction:");
    out
}

/// Command list for `/help`.
pub fn render_help(allow_reset: bool) -> String {
    let mut out = String::from(
        "Available commands:\n\
         /predict - show a fresh prediction\n\
         /stats - show statistics and current probabilities",
    );
    if allow_reset {
        out.push_str("\n/reset - erase all shared data");
    }
    out.push_str("\n/help - show this help");
    out
}
