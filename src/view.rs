//! Host-agnostic view model driven by [`crate::ui_controller::UiController`].
//!
//! Hosts (the TUI, the one-shot CLI) only read this; all mutation goes through the
//! controller.

use crate::messages;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: MessageKind,
    pub at: OffsetDateTime,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            text: text.into(),
            kind,
            at: OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
        }
    }

    /// `HH:MM:SS` of when the message was set.
    pub fn clock(&self) -> String {
        self.at
            .format(time::macros::format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeTab {
    pub id: String,
    pub name: String,
    pub description: String,
    pub active: bool,
}

/// A submit button: disabled with a busy label while its request is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: &'static str,
    pub enabled: bool,
    idle_label: &'static str,
    busy_label: &'static str,
}

impl Control {
    fn new(idle_label: &'static str, busy_label: &'static str) -> Self {
        Self {
            label: idle_label,
            enabled: true,
            idle_label,
            busy_label,
        }
    }

    /// Returns false if the control is already busy.
    pub(crate) fn acquire(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.enabled = false;
        self.label = self.busy_label;
        true
    }

    pub(crate) fn release(&mut self) {
        self.enabled = true;
        self.label = self.idle_label;
    }
}

#[derive(Debug, Clone)]
pub struct View {
    pub tabs: Vec<ModeTab>,
    pub title: String,
    pub description: String,
    pub input: String,
    /// Shared status surface; `None` when hidden.
    pub message: Option<StatusMessage>,
    /// AI response panel; `None` when hidden. Always plain text.
    pub ai_response: Option<String>,
    pub save_control: Control,
    pub ask_control: Control,
}

impl Default for View {
    fn default() -> Self {
        Self {
            tabs: Vec::new(),
            title: messages::NO_MODE_TITLE.to_string(),
            description: String::new(),
            input: String::new(),
            message: None,
            ai_response: None,
            save_control: Control::new(messages::SAVE_LABEL, messages::SAVE_BUSY_LABEL),
            ask_control: Control::new(messages::ASK_LABEL, messages::ASK_BUSY_LABEL),
        }
    }
}

impl View {
    pub fn active_tab(&self) -> Option<usize> {
        self.tabs.iter().position(|t| t.active)
    }
}
