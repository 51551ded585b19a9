mod clipboard;
mod help;
mod state;

use crate::api::SynapsisClient;
use crate::cli::{build_config, Cli};
use crate::messages;
use crate::orchestrator::{self, UiCommand, UiEvent};
use crate::ui_controller::UiController;
use crate::view::{Control, MessageKind, View};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Terminal,
};
use state::{handle_key, handle_paste, push_wrapped_kv, KeyAction, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let client = Arc::new(SynapsisClient::new(&build_config(&args)).context("build HTTP client")?);
    let (event_tx, event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let res = orchestrator::run_controller(client, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<UiEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::new(UiController::new().with_filename(args.filename.clone()));

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut dirty = true;

    let res = loop {
        // Drain completions without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
            dirty = true;
        }

        if dirty || last_tick.elapsed() >= tick_rate {
            terminal
                .draw(|f| draw(f.area(), f, &mut state, &args.base_url))
                .ok();
            last_tick = Instant::now();
            dirty = false;
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        dirty = true;
        match event::read() {
            Ok(Event::Key(k)) => match handle_key(&mut state, k) {
                KeyAction::None => {}
                KeyAction::Submit(submission) => {
                    if let Err(mpsc::error::SendError(UiCommand::Submit(s))) =
                        cmd_tx.send(UiCommand::Submit(submission))
                    {
                        // Controller is gone; release the control instead of leaving it busy.
                        state.ui.finish(
                            s.ticket,
                            Err(crate::api::ApiError::Transport(
                                "request controller stopped".into(),
                            )),
                        );
                    }
                }
                KeyAction::Copy(text) => match clipboard::copy_to_clipboard(&text) {
                    Ok(()) => state.ui.show_message(messages::COPIED, MessageKind::Info),
                    Err(e) => state
                        .ui
                        .show_message(format!("Clipboard copy failed: {e:#}"), MessageKind::Error),
                },
                KeyAction::Quit => {
                    let _ = cmd_tx.send(UiCommand::Quit);
                    break Ok(());
                }
            },
            Ok(Event::Paste(text)) => handle_paste(&mut state, &text),
            _ => {}
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen).ok();
    res
}

fn apply_event(state: &mut UiState, ev: UiEvent) {
    match ev {
        UiEvent::CatalogLoaded(res) => {
            state.loading = false;
            state.ui.apply_catalog(res);
        }
        UiEvent::SubmissionFinished { ticket, outcome } => {
            state.ui.finish(ticket, outcome);
        }
    }
}

fn kind_color(kind: MessageKind) -> Color {
    match kind {
        MessageKind::Info => Color::Cyan,
        MessageKind::Success => Color::Green,
        MessageKind::Warning => Color::Yellow,
        MessageKind::Error => Color::Red,
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &mut UiState, base_url: &str) {
    if state.show_help {
        help::draw_help(area, f, base_url);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3), Constraint::Length(1)].as_ref())
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(rows[0]);

    draw_modes(cols[0], f, state);
    draw_main(cols[1], f, state);
    draw_status(rows[1], f, state.ui.view());

    let hints = Line::from(vec![
        Span::styled("←/→", Style::default().fg(Color::Magenta)),
        Span::raw(" mode  "),
        Span::styled("Ctrl-S", Style::default().fg(Color::Magenta)),
        Span::raw(" save  "),
        Span::styled("Ctrl-A", Style::default().fg(Color::Magenta)),
        Span::raw(" ask  "),
        Span::styled("Ctrl-Y", Style::default().fg(Color::Magenta)),
        Span::raw(" copy  "),
        Span::styled("F1", Style::default().fg(Color::Magenta)),
        Span::raw(" help  "),
        Span::styled("Esc", Style::default().fg(Color::Magenta)),
        Span::raw(" quit"),
    ]);
    f.render_widget(Paragraph::new(hints), rows[2]);
}

fn draw_modes(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let view = state.ui.view();
    let block = Block::default().borders(Borders::ALL).title("Modes");

    if state.loading {
        let p = Paragraph::new(messages::LOADING_MODES)
            .style(Style::default().fg(Color::Gray))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let items: Vec<ListItem> = view
        .tabs
        .iter()
        .map(|tab| {
            let (marker, name_style) = if tab.active {
                (
                    "▶ ",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ("  ", Style::default())
            };
            let mut lines = vec![Line::from(vec![
                Span::styled(marker, name_style),
                Span::styled(tab.name.clone(), name_style),
            ])];
            if !tab.description.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("  {}", tab.description),
                    Style::default().fg(Color::Gray),
                )));
            }
            ListItem::new(lines)
        })
        .collect();
    // Stateful so a long catalog scrolls to keep the active mode visible.
    let mut list_state = ListState::default().with_selected(view.active_tab());
    f.render_stateful_widget(List::new(items).block(block), area, &mut list_state);
}

fn control_span(key: &'static str, control: &Control) -> Span<'static> {
    let style = if control.enabled {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!("[{key} {}]", control.label), style)
}

fn draw_main(area: Rect, f: &mut ratatui::Frame, state: &mut UiState) {
    let mut header = Vec::new();
    push_wrapped_kv(&mut header, "モード", &state.ui.view().title, area.width);
    push_wrapped_kv(&mut header, "説明", &state.ui.view().description, area.width);
    let header_height = (header.len() as u16).saturating_add(2).min(area.height / 3).max(3);

    let show_answer = state.ui.view().ai_response.is_some();
    let mut constraints = vec![Constraint::Length(header_height), Constraint::Min(5)];
    if show_answer {
        constraints.push(Constraint::Percentage(50));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    if show_answer {
        // Inside the borders.
        state.fit_ai_scroll(chunks[2].width.saturating_sub(2), chunks[2].height.saturating_sub(2));
    }
    let view = state.ui.view();

    f.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("Mode")),
        chunks[0],
    );

    draw_input(chunks[1], f, view);

    if let Some(answer) = view.ai_response.as_deref() {
        // Raw text: the response is never interpreted as markup.
        let p = Paragraph::new(Text::raw(answer))
            .wrap(Wrap { trim: false })
            .scroll((state.ai_scroll, 0))
            .block(Block::default().borders(Borders::ALL).title("AI回答"));
        f.render_widget(p, chunks[2]);
    }
}

fn draw_input(area: Rect, f: &mut ratatui::Frame, view: &View) {
    let controls = Line::from(vec![
        control_span("Ctrl-S", &view.save_control),
        Span::raw(" "),
        control_span("Ctrl-A", &view.ask_control),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("入力")
        .title_bottom(controls);

    let mut text = Text::raw(view.input.as_str());
    // Trailing block cursor.
    if text.lines.is_empty() || view.input.ends_with('\n') {
        text.lines.push(Line::from(""));
    }
    if let Some(last) = text.lines.last_mut() {
        last.spans
            .push(Span::styled("█", Style::default().fg(Color::Gray)));
    }

    // Keep the end of the input in view; wrapping makes this an estimate.
    let inner_height = area.height.saturating_sub(2);
    let scroll = (text.lines.len() as u16).saturating_sub(inner_height);

    let p = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(block);
    f.render_widget(p, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, view: &View) {
    let (line, title) = match view.message.as_ref() {
        Some(msg) => (
            Line::from(Span::styled(
                msg.text.clone(),
                Style::default().fg(kind_color(msg.kind)),
            )),
            format!("Status {}", msg.clock()),
        ),
        None => (Line::from(""), "Status".to_string()),
    };
    let p = Paragraph::new(line)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}
