//! Session controller: mode catalog, current selection, and the save / ask-ai flows.
//!
//! Each submission is split into `begin_*` (validate, mark the control busy, build the
//! request) and [`UiController::finish`] (render the outcome, release the control). The
//! [`Ticket`] returned by `begin_*` is the only way to call `finish`, so every busy
//! control is released exactly once whatever the outcome. Hosts that can block on the
//! request use [`UiController::save_content`] / [`UiController::ask_ai`], which pair the
//! two around a single call.

use crate::api::{ApiError, Backend};
use crate::messages;
use crate::model::{AskAiRequest, Mode, ModeCatalog, SaveRequest, SubmissionResult};
use crate::orchestrator::compose_status;
use crate::view::{Control, MessageKind, ModeTab, StatusMessage, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Save,
    AskAi,
}

/// Busy-state token for one in-flight submission.
#[must_use = "pass the ticket to UiController::finish to release its control"]
#[derive(Debug)]
pub struct Ticket {
    action: Action,
}

impl Ticket {
    pub fn action(&self) -> Action {
        self.action
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRequest {
    Save(SaveRequest),
    AskAi(AskAiRequest),
}

impl SubmitRequest {
    pub async fn send<B: Backend + ?Sized>(
        &self,
        backend: &B,
    ) -> Result<SubmissionResult, ApiError> {
        match self {
            SubmitRequest::Save(req) => backend.save(req).await,
            SubmitRequest::AskAi(req) => backend.ask_ai(req).await,
        }
    }
}

#[derive(Debug)]
pub struct Submission {
    pub ticket: Ticket,
    pub request: SubmitRequest,
}

#[derive(Debug, Default)]
pub struct UiController {
    catalog: Option<ModeCatalog>,
    selected: Option<String>,
    filename: Option<String>,
    view: View,
}

impl UiController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filename sent with every submission; the server picks one when unset.
    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.filename = filename;
        self
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn catalog(&self) -> Option<&ModeCatalog> {
        self.catalog.as_ref()
    }

    /// The selected mode, looked up in the catalog on every call.
    pub fn current_mode(&self) -> Option<&Mode> {
        self.catalog.as_ref()?.find(self.selected.as_deref()?)
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.view.input = text.into();
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.view.input
    }

    pub fn show_message(&mut self, text: impl Into<String>, kind: MessageKind) {
        self.view.message = Some(StatusMessage::new(text, kind));
    }

    pub async fn initialize<B: Backend + ?Sized>(&mut self, backend: &B) {
        let res = backend.fetch_modes().await;
        self.apply_catalog(res);
    }

    /// Install the result of the startup catalog fetch.
    pub fn apply_catalog(&mut self, res: Result<ModeCatalog, ApiError>) {
        match res {
            Ok(catalog) => {
                self.view.tabs = catalog
                    .modes
                    .iter()
                    .map(|m| ModeTab {
                        id: m.id.clone(),
                        name: m.name.clone(),
                        description: m.description.clone(),
                        active: false,
                    })
                    .collect();
                let initial = if catalog.find(&catalog.default_mode_id).is_some() {
                    Some(catalog.default_mode_id.clone())
                } else {
                    if !catalog.modes.is_empty() {
                        tracing::warn!(
                            default = %catalog.default_mode_id,
                            "default mode is not in the catalog, selecting the first mode"
                        );
                    }
                    catalog.modes.first().map(|m| m.id.clone())
                };
                self.catalog = Some(catalog);
                if let Some(id) = initial {
                    self.select_mode(&id);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load mode catalog");
                self.catalog = None;
                self.selected = None;
                self.view.tabs.clear();
                self.show_message(format!("{}: {e}", messages::MODES_FAILED), MessageKind::Error);
            }
        }
    }

    /// Select a mode by id. Unknown ids are ignored.
    pub fn select_mode(&mut self, id: &str) {
        let Some(mode) = self.catalog.as_ref().and_then(|c| c.find(id)).cloned() else {
            tracing::debug!(id, "ignoring selection of unknown mode");
            return;
        };
        tracing::debug!(id = %mode.id, "mode selected");
        for tab in &mut self.view.tabs {
            tab.active = tab.id == mode.id;
        }
        self.view.title = mode.name;
        self.view.description = mode.description;
        self.view.ai_response = None;
        self.view.message = None;
        self.selected = Some(mode.id);
    }

    /// Move the selection by `offset` positions, wrapping around the catalog.
    pub fn cycle_mode(&mut self, offset: isize) {
        let Some(catalog) = self.catalog.as_ref() else {
            return;
        };
        let len = catalog.modes.len() as isize;
        if len == 0 {
            return;
        }
        let pos = self
            .selected
            .as_deref()
            .and_then(|id| catalog.position(id))
            .unwrap_or(0) as isize;
        let next = (pos + offset).rem_euclid(len) as usize;
        let id = catalog.modes[next].id.clone();
        self.select_mode(&id);
    }

    /// Validate the input and mark the save control busy.
    ///
    /// Returns `None` when validation fails (the message is already shown) or a save is
    /// already in flight.
    pub fn begin_save(&mut self) -> Option<Submission> {
        if !self.view.save_control.enabled {
            return None;
        }
        if self.view.input.trim().is_empty() {
            self.show_message(messages::CONTENT_REQUIRED, MessageKind::Error);
            return None;
        }
        self.view.save_control.acquire();
        Some(Submission {
            ticket: Ticket {
                action: Action::Save,
            },
            request: SubmitRequest::Save(SaveRequest {
                content: self.view.input.clone(),
                filename: self.filename.clone(),
            }),
        })
    }

    /// Validate the input and selection, mark the ask control busy and hide the previous
    /// AI response.
    pub fn begin_ask_ai(&mut self) -> Option<Submission> {
        if !self.view.ask_control.enabled {
            return None;
        }
        if self.view.input.trim().is_empty() {
            self.show_message(messages::CONTENT_REQUIRED, MessageKind::Error);
            return None;
        }
        let Some(mode_id) = self.current_mode().map(|m| m.id.clone()) else {
            self.show_message(messages::NO_MODE_SELECTED, MessageKind::Error);
            return None;
        };
        self.view.ask_control.acquire();
        self.view.ai_response = None;
        Some(Submission {
            ticket: Ticket {
                action: Action::AskAi,
            },
            request: SubmitRequest::AskAi(AskAiRequest {
                content: self.view.input.clone(),
                mode_id,
                filename: self.filename.clone(),
            }),
        })
    }

    /// Render the outcome of a submission and release its control.
    ///
    /// Hands the server result back on success so hosts can print it.
    pub fn finish(
        &mut self,
        ticket: Ticket,
        outcome: Result<SubmissionResult, ApiError>,
    ) -> Option<SubmissionResult> {
        let action = ticket.action;
        let delivered = match outcome {
            Ok(result) => {
                let (text, kind) = compose_status(&result);
                tracing::info!(?action, ?kind, "submission completed");
                self.show_message(text, kind);
                match action {
                    Action::Save => self.view.input.clear(),
                    Action::AskAi => {
                        self.view.ai_response = Some(result.ai_response.clone().unwrap_or_default())
                    }
                }
                Some(result)
            }
            Err(ApiError::Application { status, detail }) => {
                tracing::warn!(?action, status, "submission rejected");
                let fallback = match action {
                    Action::Save => messages::SAVE_FAILED,
                    Action::AskAi => messages::ASK_AI_FAILED,
                };
                self.show_message(detail.unwrap_or_else(|| fallback.to_string()), MessageKind::Error);
                None
            }
            Err(ApiError::Transport(msg)) => {
                tracing::warn!(?action, error = %msg, "submission failed");
                self.show_message(msg, MessageKind::Error);
                None
            }
        };
        self.control_mut(action).release();
        delivered
    }

    pub async fn save_content<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
    ) -> Option<SubmissionResult> {
        let submission = self.begin_save()?;
        self.complete(submission, backend).await
    }

    pub async fn ask_ai<B: Backend + ?Sized>(&mut self, backend: &B) -> Option<SubmissionResult> {
        let submission = self.begin_ask_ai()?;
        self.complete(submission, backend).await
    }

    async fn complete<B: Backend + ?Sized>(
        &mut self,
        submission: Submission,
        backend: &B,
    ) -> Option<SubmissionResult> {
        let Submission { ticket, request } = submission;
        let outcome = request.send(backend).await;
        self.finish(ticket, outcome)
    }

    fn control_mut(&mut self, action: Action) -> &mut Control {
        match action {
            Action::Save => &mut self.view.save_control,
            Action::AskAi => &mut self.view.ask_control,
        }
    }
}
