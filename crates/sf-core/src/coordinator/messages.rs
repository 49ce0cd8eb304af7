//! Transport-neutral inbound events and outbound replies.

use sf_common::Symbol;
use std::fmt;

/// Slash commands understood by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Stats,
    Predict,
    Reset,
}

impl Command {
    /// Parse `/name` or `/name@botname`, ignoring trailing arguments.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let name = token.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "stats" => Some(Command::Stats),
            "predict" | "prediction" => Some(Command::Predict),
            "reset" => Some(Command::Reset),
            _ => None,
        }
    }
}

/// Button presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The actual symbol was among the offered predictions.
    ConfirmPrediction(Symbol),
    /// None of the offered predictions was right; show the full list.
    MarkWrong,
    /// Actual symbol picked from the full list after `MarkWrong`.
    PickActual(Symbol),
    ResetConfirm,
    ResetCancel,
}

impl Action {
    /// Parse a button payload. Unknown payloads and invalid symbols yield `None`.
    pub fn parse(data: &str) -> Option<Self> {
        let data = data.trim();
        match data {
            "wrong" => return Some(Action::MarkWrong),
            "reset_confirm" => return Some(Action::ResetConfirm),
            "reset_cancel" => return Some(Action::ResetCancel),
            _ => {}
        }
        let (kind, value) = data.split_once('_')?;
        let symbol = Symbol::new(value.parse().ok()?)?;
        match kind {
            "pred" => Some(Action::ConfirmPrediction(symbol)),
            "correct" => Some(Action::PickActual(symbol)),
            _ => None,
        }
    }

    /// Payload carried by a button for this action.
    pub fn payload(&self) -> String {
        match self {
            Action::ConfirmPrediction(s) => format!("pred_{s}"),
            Action::MarkWrong => "wrong".to_string(),
            Action::PickActual(s) => format!("correct_{s}"),
            Action::ResetConfirm => "reset_confirm".to_string(),
            Action::ResetCancel => "reset_cancel".to_string(),
        }
    }
}

/// Everything a transport can hand to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Command(Command),
    Action(Action),
    Text(String),
}

impl Inbound {
    /// Classify a typed message: a known command, otherwise free text.
    pub fn from_message(text: &str) -> Self {
        match Command::parse(text) {
            Some(command) => Inbound::Command(command),
            None => Inbound::Text(text.to_string()),
        }
    }
}

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            payload: action.payload(),
        }
    }
}

/// A message for the transport to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub text: String,
    /// Rows of buttons.
    pub buttons: Vec<Vec<Button>>,
    /// Replace the message whose button was pressed instead of sending anew.
    pub edit_previous: bool,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn edit(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            edit_previous: true,
            ..Default::default()
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Vec<Button>>) -> Self {
        self.buttons = buttons;
        self
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)?;
        for row in &self.buttons {
            writeln!(f)?;
            for (i, button) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "[{}] {}", button.payload, button.label)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("/stats"), Some(Command::Stats));
        assert_eq!(Command::parse("  /START  "), Some(Command::Start));
        assert_eq!(Command::parse("/reset@forecast_bot"), Some(Command::Reset));
        assert_eq!(Command::parse("/predict now"), Some(Command::Predict));
        assert_eq!(Command::parse("/unknown"), None);
        assert_eq!(Command::parse("stats"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn parses_actions() {
        let fish = Symbol::new(2).unwrap();
        assert_eq!(Action::parse("pred_2"), Some(Action::ConfirmPrediction(fish)));
        assert_eq!(Action::parse("correct_2"), Some(Action::PickActual(fish)));
        assert_eq!(Action::parse("wrong"), Some(Action::MarkWrong));
        assert_eq!(Action::parse("reset_confirm"), Some(Action::ResetConfirm));
        assert_eq!(Action::parse("reset_cancel"), Some(Action::ResetCancel));
    }

    #[test]
    fn rejects_bad_payloads() {
        assert_eq!(Action::parse("pred_8"), None);
        assert_eq!(Action::parse("pred_x"), None);
        assert_eq!(Action::parse("guess_1"), None);
        assert_eq!(Action::parse(""), None);
    }

    #[test]
    fn payload_roundtrips() {
        let actions = [
            Action::ConfirmPrediction(Symbol::new(7).unwrap()),
            Action::MarkWrong,
            Action::PickActual(Symbol::new(0).unwrap()),
            Action::ResetConfirm,
            Action::ResetCancel,
        ];
        for action in actions {
            assert_eq!(Action::parse(&action.payload()), Some(action));
        }
    }

    #[test]
    fn inbound_from_message() {
        assert_eq!(
            Inbound::from_message("/help"),
            Inbound::Command(Command::Help)
        );
        assert_eq!(
            Inbound::from_message("1 2 3"),
            Inbound::Text("1 2 3".to_string())
        );
    }

    #[test]
    fn reply_display_lists_buttons() {
        let reply = Reply::text("Pick one").with_buttons(vec![
            vec![Button::new("🐟 Fish (45x)", Action::ConfirmPrediction(Symbol::new(2).unwrap()))],
            vec![Button::new("❌ Wrong", Action::MarkWrong)],
        ]);
        assert_eq!(
            reply.to_string(),
            "Pick one\n[pred_2] 🐟 Fish (45x)\n[wrong] ❌ Wrong"
        );
    }
}
