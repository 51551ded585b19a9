use crate::messages;
use crate::ui_controller::{Submission, UiController};
use crate::view::MessageKind;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};

pub struct UiState {
    pub ui: UiController,
    pub show_help: bool,
    /// True until the catalog fetch completes.
    pub loading: bool,
    pub ai_scroll: u16,
    /// Largest useful `ai_scroll` for the last rendered AI panel.
    pub ai_scroll_max: u16,
}

impl UiState {
    pub fn new(ui: UiController) -> Self {
        Self {
            ui,
            show_help: false,
            loading: true,
            ai_scroll: 0,
            ai_scroll_max: 0,
        }
    }

    /// Record the AI panel's inner size and clamp the scroll offset to its content.
    pub fn fit_ai_scroll(&mut self, width: u16, height: u16) {
        let lines = self
            .ui
            .view()
            .ai_response
            .as_deref()
            .map_or(0, |text| wrapped_line_count(text, width));
        self.ai_scroll_max = lines.saturating_sub(height);
        self.ai_scroll = self.ai_scroll.min(self.ai_scroll_max);
    }
}

/// Rows `text` takes when wrapped to `width` columns. Word wrapping can need a few
/// more rows than this.
pub fn wrapped_line_count(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = text
        .lines()
        .map(|line| Line::raw(line).width().div_ceil(width).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// What the render loop should do after a key press.
#[derive(Debug)]
pub enum KeyAction {
    None,
    Submit(Submission),
    Copy(String),
    Quit,
}

pub fn handle_key(state: &mut UiState, k: KeyEvent) -> KeyAction {
    if k.kind != KeyEventKind::Press {
        return KeyAction::None;
    }
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);

    if state.show_help {
        match k.code {
            KeyCode::Char('c') if ctrl => return KeyAction::Quit,
            KeyCode::F(1) | KeyCode::Esc | KeyCode::Char('q') => state.show_help = false,
            _ => {}
        }
        return KeyAction::None;
    }

    match k.code {
        KeyCode::Char('c') if ctrl => KeyAction::Quit,
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::F(1) => {
            state.show_help = true;
            KeyAction::None
        }
        KeyCode::Char('s') if ctrl => state
            .ui
            .begin_save()
            .map_or(KeyAction::None, KeyAction::Submit),
        KeyCode::Char('a') if ctrl => match state.ui.begin_ask_ai() {
            Some(s) => {
                state.ai_scroll = 0;
                KeyAction::Submit(s)
            }
            None => KeyAction::None,
        },
        KeyCode::Char('y') if ctrl => match state.ui.view().ai_response.clone() {
            Some(text) if !text.is_empty() => KeyAction::Copy(text),
            _ => {
                state
                    .ui
                    .show_message(messages::NOTHING_TO_COPY, MessageKind::Info);
                KeyAction::None
            }
        },
        KeyCode::Left => {
            state.ui.cycle_mode(-1);
            state.ai_scroll = 0;
            KeyAction::None
        }
        KeyCode::Right => {
            state.ui.cycle_mode(1);
            state.ai_scroll = 0;
            KeyAction::None
        }
        KeyCode::PageUp => {
            state.ai_scroll = state.ai_scroll.saturating_sub(5);
            KeyAction::None
        }
        KeyCode::PageDown => {
            state.ai_scroll = state.ai_scroll.saturating_add(5).min(state.ai_scroll_max);
            KeyAction::None
        }
        KeyCode::Enter => {
            state.ui.input_mut().push('\n');
            KeyAction::None
        }
        KeyCode::Backspace => {
            state.ui.input_mut().pop();
            KeyAction::None
        }
        KeyCode::Tab => {
            state.ui.input_mut().push('\t');
            KeyAction::None
        }
        KeyCode::Char(c) if !ctrl && !k.modifiers.contains(KeyModifiers::ALT) => {
            state.ui.input_mut().push(c);
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

/// Append pasted text, normalizing line endings.
pub fn handle_paste(state: &mut UiState, text: &str) {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    state.ui.input_mut().push_str(&normalized);
}

/// Push `label: value` wrapped to the inner width of a bordered box.
pub fn push_wrapped_kv(out: &mut Vec<Line<'static>>, label: &str, value: &str, area_width: u16) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(line_text),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
        }

        remaining = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::catalog;
    use crate::ui_controller::Action;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn ready() -> UiState {
        let mut ui = UiController::new();
        ui.apply_catalog(Ok(catalog(&["a", "b"], "a")));
        let mut state = UiState::new(ui);
        state.loading = false;
        state
    }

    fn type_text(state: &mut UiState, text: &str) {
        for c in text.chars() {
            let _ = handle_key(state, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn typing_edits_input() {
        let mut state = ready();
        type_text(&mut state, "hi");
        let _ = handle_key(&mut state, key(KeyCode::Enter));
        type_text(&mut state, "yo");
        let _ = handle_key(&mut state, key(KeyCode::Backspace));
        assert_eq!(state.ui.view().input, "hi\ny");
    }

    #[test]
    fn ctrl_s_submits_only_valid_input() {
        let mut state = ready();
        assert!(matches!(handle_key(&mut state, ctrl('s')), KeyAction::None));
        assert_eq!(
            state.ui.view().message.as_ref().map(|m| m.text.as_str()),
            Some(messages::CONTENT_REQUIRED)
        );

        type_text(&mut state, "note");
        match handle_key(&mut state, ctrl('s')) {
            KeyAction::Submit(s) => assert_eq!(s.ticket.action(), Action::Save),
            other => panic!("unexpected action: {other:?}"),
        }
        // Busy control swallows a second press.
        assert!(matches!(handle_key(&mut state, ctrl('s')), KeyAction::None));
    }

    #[test]
    fn ctrl_a_asks_with_selected_mode() {
        let mut state = ready();
        type_text(&mut state, "q");
        let _ = handle_key(&mut state, key(KeyCode::Right));
        state.ai_scroll = 10;
        match handle_key(&mut state, ctrl('a')) {
            KeyAction::Submit(s) => {
                assert_eq!(s.ticket.action(), Action::AskAi);
                match s.request {
                    crate::ui_controller::SubmitRequest::AskAi(req) => assert_eq!(req.mode_id, "b"),
                    other => panic!("unexpected request: {other:?}"),
                }
            }
            other => panic!("unexpected action: {other:?}"),
        }
        assert_eq!(state.ai_scroll, 0);
    }

    #[test]
    fn copy_without_answer_shows_info() {
        let mut state = ready();
        assert!(matches!(handle_key(&mut state, ctrl('y')), KeyAction::None));
        let msg = state.ui.view().message.as_ref().expect("message");
        assert_eq!(msg.kind, MessageKind::Info);
    }

    #[test]
    fn help_swallows_keys_until_closed() {
        let mut state = ready();
        let _ = handle_key(&mut state, key(KeyCode::F(1)));
        assert!(state.show_help);
        type_text(&mut state, "x");
        assert!(state.ui.view().input.is_empty());
        assert!(matches!(handle_key(&mut state, key(KeyCode::Esc)), KeyAction::None));
        assert!(!state.show_help);
        assert!(matches!(handle_key(&mut state, key(KeyCode::Esc)), KeyAction::Quit));
    }

    #[test]
    fn page_down_stops_at_the_end_of_the_answer() {
        let mut state = ready();
        state.ui.set_input("q");
        let sub = state.ui.begin_ask_ai().expect("ask");
        let answer = (1..=12).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let _ = state.ui.finish(
            sub.ticket,
            Ok(crate::model::SubmissionResult {
                ai_response: Some(answer),
                ..Default::default()
            }),
        );

        // 12 rows of content in a 10-row panel leaves 2 rows to scroll.
        state.fit_ai_scroll(40, 10);
        assert_eq!(state.ai_scroll_max, 2);
        for _ in 0..3 {
            let _ = handle_key(&mut state, key(KeyCode::PageDown));
        }
        assert_eq!(state.ai_scroll, 2);
        let _ = handle_key(&mut state, key(KeyCode::PageUp));
        assert_eq!(state.ai_scroll, 0);

        // A taller panel shrinks the limit and pulls the offset back.
        state.ai_scroll = 2;
        state.fit_ai_scroll(40, 12);
        assert_eq!(state.ai_scroll, 0);
    }

    #[test]
    fn wrapped_line_count_counts_wrapped_rows() {
        assert_eq!(wrapped_line_count("abcdefghij\n\nxy", 4), 3 + 1 + 1);
        assert_eq!(wrapped_line_count("", 4), 0);
        assert_eq!(wrapped_line_count("日本語", 4), 2);
    }

    #[test]
    fn paste_normalizes_line_endings() {
        let mut state = ready();
        handle_paste(&mut state, "a\r\nb\rc");
        assert_eq!(state.ui.view().input, "a\nb\nc");
    }

    #[test]
    fn wrapped_kv_splits_long_values() {
        let mut out = Vec::new();
        push_wrapped_kv(&mut out, "説明", "abcdefghij", 12);
        // usable 8, first line 8 - 4 = 4 chars, then 6 per line
        assert_eq!(out.len(), 2);
        push_wrapped_kv(&mut out, "x", "   ", 12);
        assert_eq!(out.len(), 2);
    }
}
