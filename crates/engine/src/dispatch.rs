// ABOUTME: Inbound command handling for one page context: toggles, reader actions and the calm overlay.
// ABOUTME: Commands arrive as (action, JSON payload) messages and map onto the engine components.

use serde_json::Value;
use tracing::debug;

use crate::bionic::{ActivationSummary, ReversalSummary, Segmenter};
use crate::calm::{CalmOverlay, CalmingContent};
use crate::error::{EngineError, Result};
use crate::options::{EngineBuilder, Options};
use crate::page::Page;
use crate::reader::{OpenOutcome, ReaderAction, ReaderView};
use crate::typing::TypingAssist;

/// A command sent to the page by the extension UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetReadingAid(bool),
    SetFocusView(bool),
    Reader(ReaderAction),
    TriggerCalm(Option<CalmingContent>),
    DismissCalm,
    /// A suggestion for the editor widget's ghost text.
    ShowPrediction(String),
    /// Tab-equivalent: take the ghost text as the input value.
    AcceptPrediction,
}

impl Command {
    pub const TOGGLE_BIONIC: &'static str = "TOGGLE_BIONIC";
    pub const TOGGLE_CLUTTER_FREE: &'static str = "TOGGLE_CLUTTER_FREE";
    pub const TRIGGER_PANIC: &'static str = "TRIGGER_PANIC";
    pub const DISMISS_PANIC: &'static str = "DISMISS_PANIC";
    pub const READER_ACTION: &'static str = "READER_ACTION";
    pub const SHOW_PREDICTION: &'static str = "SHOW_PREDICTION";
    pub const ACCEPT_PREDICTION: &'static str = "ACCEPT_PREDICTION";

    /// Parse a `{ action, data }` message.
    pub fn from_message(action: &str, data: &Value) -> Result<Self> {
        match action {
            Self::TOGGLE_BIONIC => Ok(Command::SetReadingAid(toggle_value(action, data)?)),
            Self::TOGGLE_CLUTTER_FREE => Ok(Command::SetFocusView(toggle_value(action, data)?)),
            Self::TRIGGER_PANIC => {
                let empty = match data {
                    Value::Null => true,
                    Value::Object(map) => map.is_empty(),
                    _ => false,
                };
                if empty {
                    return Ok(Command::TriggerCalm(None));
                }
                let content: CalmingContent = serde_json::from_value(data.clone())
                    .map_err(|e| EngineError::parse(action, Some(e.into())))?;
                Ok(Command::TriggerCalm(Some(content)))
            }
            Self::DISMISS_PANIC => Ok(Command::DismissCalm),
            Self::READER_ACTION => {
                let name = data.get("action").and_then(Value::as_str).unwrap_or_default();
                ReaderAction::parse(name)
                    .map(Command::Reader)
                    .ok_or_else(|| EngineError::command(name))
            }
            Self::SHOW_PREDICTION => {
                let value = data.get("value").and_then(Value::as_str).unwrap_or_default();
                Ok(Command::ShowPrediction(value.to_string()))
            }
            Self::ACCEPT_PREDICTION => Ok(Command::AcceptPrediction),
            other => Err(EngineError::command(other)),
        }
    }

    /// The wire name this command is sent under.
    pub fn action(&self) -> &'static str {
        match self {
            Command::SetReadingAid(_) => Self::TOGGLE_BIONIC,
            Command::SetFocusView(_) => Self::TOGGLE_CLUTTER_FREE,
            Command::Reader(_) => Self::READER_ACTION,
            Command::TriggerCalm(_) => Self::TRIGGER_PANIC,
            Command::DismissCalm => Self::DISMISS_PANIC,
            Command::ShowPrediction(_) => Self::SHOW_PREDICTION,
            Command::AcceptPrediction => Self::ACCEPT_PREDICTION,
        }
    }
}

fn toggle_value(action: &str, data: &Value) -> Result<bool> {
    data.get("value").and_then(Value::as_bool).ok_or_else(|| {
        EngineError::parse(
            action,
            Some(anyhow::anyhow!("payload needs a boolean \"value\"")),
        )
    })
}

/// The effect a dispatched command had on the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Annotated(ActivationSummary),
    Restored(ReversalSummary),
    ReaderOpened(OpenOutcome),
    ReaderUpdated(ReaderAction),
    ReaderClosed,
    CalmShown,
    CalmDismissed,
    PredictionShown,
    PredictionAccepted(String),
    /// The command asked for the state the page is already in.
    Unchanged,
}

impl Outcome {
    /// Short machine-readable name, used by the CLI and the FFI bridge.
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Annotated(_) => "annotated",
            Outcome::Restored(_) => "restored",
            Outcome::ReaderOpened(OpenOutcome::Reused) => "reader-reused",
            Outcome::ReaderOpened(_) => "reader-opened",
            Outcome::ReaderUpdated(_) => "reader-updated",
            Outcome::ReaderClosed => "reader-closed",
            Outcome::CalmShown => "calm-shown",
            Outcome::CalmDismissed => "calm-dismissed",
            Outcome::PredictionShown => "prediction-shown",
            Outcome::PredictionAccepted(_) => "prediction-accepted",
            Outcome::Unchanged => "unchanged",
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Outcome::Unchanged)
    }
}

/// Owns the per-page engine state and routes commands to it.
#[derive(Debug)]
pub struct Dispatcher {
    opts: Options,
    segmenter: Segmenter,
    reader: ReaderView,
    calm: CalmOverlay,
    typing: TypingAssist,
}

impl Dispatcher {
    pub fn new(opts: Options) -> Self {
        Self {
            segmenter: Segmenter::new(&opts),
            reader: ReaderView::new(&opts),
            calm: CalmOverlay::new(),
            typing: TypingAssist::new(opts.typing_debounce()),
            opts,
        }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    pub fn reader(&self) -> &ReaderView {
        &self.reader
    }

    pub fn calm(&self) -> &CalmOverlay {
        &self.calm
    }

    pub fn typing(&self) -> &TypingAssist {
        &self.typing
    }

    pub fn typing_mut(&mut self) -> &mut TypingAssist {
        &mut self.typing
    }

    pub fn dispatch(&mut self, page: &Page, cmd: Command) -> Result<Outcome> {
        debug!(action = cmd.action(), "dispatching command");
        let outcome = match cmd {
            Command::SetReadingAid(true) => {
                let summary = self.segmenter.activate(&page.body())?;
                if summary.emphasized_words == 0 {
                    Outcome::Unchanged
                } else {
                    Outcome::Annotated(summary)
                }
            }
            Command::SetReadingAid(false) => {
                let was_active = self.segmenter.is_active();
                let summary = self.segmenter.deactivate(page.document());
                if summary.restored == 0 && !was_active {
                    Outcome::Unchanged
                } else {
                    Outcome::Restored(summary)
                }
            }
            Command::SetFocusView(true) => match self.reader.open(page) {
                OpenOutcome::AlreadyOpen => Outcome::Unchanged,
                opened => Outcome::ReaderOpened(opened),
            },
            Command::SetFocusView(false) => {
                if self.reader.close(page) {
                    Outcome::ReaderClosed
                } else {
                    Outcome::Unchanged
                }
            }
            Command::Reader(action) => {
                if !self.reader.apply(page, action) {
                    Outcome::Unchanged
                } else if matches!(action, ReaderAction::Close | ReaderAction::Escape) {
                    Outcome::ReaderClosed
                } else {
                    Outcome::ReaderUpdated(action)
                }
            }
            Command::TriggerCalm(content) => {
                self.calm.show(page, &content.unwrap_or_default());
                Outcome::CalmShown
            }
            Command::DismissCalm => {
                if self.calm.dismiss(page) {
                    Outcome::CalmDismissed
                } else {
                    Outcome::Unchanged
                }
            }
            Command::ShowPrediction(value) => {
                if value.is_empty() {
                    Outcome::Unchanged
                } else {
                    self.typing.on_suggestion(&value);
                    Outcome::PredictionShown
                }
            }
            Command::AcceptPrediction => match self.typing.accept() {
                Some(value) => Outcome::PredictionAccepted(value),
                None => Outcome::Unchanged,
            },
        };
        Ok(outcome)
    }
}
