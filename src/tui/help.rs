use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const KEYS: &[(&str, &str)] = &[
    ("←/→", "Switch mode"),
    ("Ctrl-S", "Save input as-is"),
    ("Ctrl-A", "Ask the AI using the selected mode"),
    ("Ctrl-Y", "Copy AI response to clipboard"),
    ("PgUp/PgDn", "Scroll AI response"),
    ("Enter", "New line"),
    ("F1", "Toggle this help"),
    ("Esc / Ctrl-C", "Quit"),
];

fn key_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{key:<14}"), Style::default().fg(Color::Magenta)),
        Span::raw(desc),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame, base_url: &str) {
    let mut lines = vec![Line::from("Keybinds:")];
    lines.extend(KEYS.iter().map(|&(k, d)| key_line(k, d)));
    lines.push(Line::from(""));
    lines.push(Line::from(
        "Saving stores the text on the server and pushes it to Git. Asking the AI stores",
    ));
    lines.push(Line::from("both the question and the answer under the mode's folder."));
    lines.push(Line::from(""));
    lines.push(Line::from("Server:"));
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(base_url.to_string(), Style::default().fg(Color::Cyan)),
    ]));

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
