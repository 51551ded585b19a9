//! Post-response processing.
//!
//! Turns a successful submission body into the status line shown to the user.

use crate::messages;
use crate::model::SubmissionResult;
use crate::view::MessageKind;

/// Compose the status text and style for a 2xx submission.
///
/// Styled success only when the server reports a completed Git push; a save whose push
/// failed (or was skipped) is still a warning.
pub(crate) fn compose_status(result: &SubmissionResult) -> (String, MessageKind) {
    let mut text = result.message.clone();
    if result.pushed() {
        text.push_str(&format!(" ({})", messages::GIT_PUSH_OK));
    }
    if let Some(err) = result.git_error.as_deref().filter(|e| !e.is_empty()) {
        text.push_str(&format!(" ({}: {err})", messages::GIT_PUSH_FAILED));
    }
    let kind = if result.pushed() {
        MessageKind::Success
    } else {
        MessageKind::Warning
    };
    (text, kind)
}
