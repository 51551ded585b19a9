//! Output builder for one-shot CLI modes.
//!
//! Renders the controller's view as text lines or as JSON.

use crate::model::SubmissionResult;
use crate::ui_controller::UiController;
use crate::view::MessageKind;
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct OutcomeJson<'a> {
    kind: MessageKind,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_response: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a SubmissionResult>,
}

/// Lines for `--list-modes`. When the catalog could not be loaded this renders the
/// view's error status like [`outcome_lines`] does.
pub(crate) fn catalog_lines(ui: &UiController, json: bool) -> Result<Vec<String>> {
    let Some(catalog) = ui.catalog() else {
        return outcome_lines(ui, None, json);
    };
    if json {
        return Ok(vec![serde_json::to_string_pretty(catalog)?]);
    }

    let width = catalog
        .modes
        .iter()
        .map(|m| m.id.chars().count())
        .max()
        .unwrap_or(0);
    let lines = catalog
        .modes
        .iter()
        .map(|m| {
            let marker = if m.id == catalog.default_mode_id { '*' } else { ' ' };
            let mut line = format!("{marker} {:<width$}  {}", m.id, m.name);
            if !m.description.trim().is_empty() {
                line.push_str(&format!(" - {}", m.description));
            }
            line
        })
        .collect();
    Ok(lines)
}

/// Lines for `--save` / `--ask`.
///
/// Text mode leaves error statuses out; the caller reports those on stderr.
pub(crate) fn outcome_lines(
    ui: &UiController,
    result: Option<&SubmissionResult>,
    json: bool,
) -> Result<Vec<String>> {
    let view = ui.view();
    let (message, kind) = view
        .message
        .as_ref()
        .map(|m| (m.text.as_str(), m.kind))
        .unwrap_or(("", MessageKind::Info));

    if json {
        let out = OutcomeJson {
            kind,
            message,
            ai_response: view.ai_response.as_deref(),
            result,
        };
        return Ok(vec![serde_json::to_string_pretty(&out)?]);
    }

    let mut lines = Vec::new();
    if kind != MessageKind::Error && !message.is_empty() {
        lines.push(message.to_string());
    }
    if let Some(path) = result.and_then(|r| r.filepath.as_deref()) {
        lines.push(format!("Saved to: {path}"));
    }
    if let Some(answer) = view.ai_response.as_deref() {
        lines.push(String::new());
        lines.extend(answer.lines().map(str::to_string));
    }
    Ok(lines)
}
