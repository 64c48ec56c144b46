use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, ChatRole, FocusPane, InputMode};
use crate::backend::SourceRef;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    if app.show_documents {
        let [transcript_area, documents_area] = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(38),
        ])
        .areas(body_area);

        render_transcript(app, frame, transcript_area);
        render_documents(app, frame, documents_area);
    } else {
        app.documents_area = None;
        render_transcript(app, frame, body_area);
    }

    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" RAG Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" {} ", app.client.base_url()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store the area for mouse hit-testing and the inner size for the
    // scroll-to-bottom wrap calculation.
    app.transcript_area = Some(area);
    app.transcript_height = area.height.saturating_sub(2);
    app.transcript_width = area.width.saturating_sub(2);

    let focused = app.focus == FocusPane::Transcript;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    let mut lines: Vec<Line> = Vec::new();

    for message in &app.messages {
        match message.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in message.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Assistant:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                if message.is_error {
                    for line in message.content.lines() {
                        lines.push(Line::from(Span::styled(
                            line.to_string(),
                            Style::default().fg(Color::Red),
                        )));
                    }
                } else {
                    for line in message.content.lines() {
                        lines.push(styled_answer_line(line));
                    }
                }
                if !message.sources.is_empty() {
                    lines.push(Line::from(Span::styled(
                        "Sources:",
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::ITALIC),
                    )));
                    for source in &message.sources {
                        lines.push(source_line(source));
                    }
                }
            }
        }
        lines.push(Line::default());
    }

    if app.loading {
        lines.push(Line::from(Span::styled(
            "Assistant:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let transcript = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.transcript_scroll, 0));

    frame.render_widget(transcript, area);
}

fn source_line(source: &SourceRef) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(
            source_display_name(&source.file_path).to_string(),
            Style::default().fg(Color::Blue),
        ),
        Span::styled(
            format!(" ({})", format_score(source.score)),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Basename only; where the backend keeps its ingest root is its business.
fn source_display_name(file_path: &str) -> &str {
    match file_path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => file_path,
    }
}

fn format_score(score: f64) -> String {
    format!("{}%", (score * 100.0).round() as i64)
}

/// Answers come from an LLM, so render **bold** spans; everything else is
/// left as-is.
fn styled_answer_line(text: &str) -> Line<'static> {
    if !text.contains("**") {
        return Line::from(text.to_string());
    }

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    loop {
        let Some(open) = rest.find("**") else {
            if !rest.is_empty() {
                spans.push(Span::raw(rest.to_string()));
            }
            break;
        };
        let Some(close) = rest[open + 2..].find("**") else {
            // Unterminated marker stays literal
            spans.push(Span::raw(rest.to_string()));
            break;
        };

        if open > 0 {
            spans.push(Span::raw(rest[..open].to_string()));
        }
        let bold = &rest[open + 2..open + 2 + close];
        if !bold.is_empty() {
            spans.push(Span::styled(
                bold.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        rest = &rest[open + 2 + close + 2..];
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn render_documents(app: &mut App, frame: &mut Frame, area: Rect) {
    app.documents_area = Some(area);

    let focused = app.focus == FocusPane::Documents;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Documents ({}) ", app.documents.len()));

    if app.documents.is_empty() {
        let placeholder = Paragraph::new("No documents ingested yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem> = app
        .documents
        .iter()
        .map(|doc| {
            let mut detail = format!("  {}", format_ingested_at(&doc.ingested_at));
            if let Some(chunks) = doc.chunks_count {
                detail.push_str(&format!(", {} chunks", chunks));
            }
            ListItem::new(Text::from(vec![
                Line::from(doc.filename.clone()),
                Line::from(Span::styled(detail, Style::default().fg(Color::DarkGray))),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.documents_state);
}

/// Trim the backend's ingest timestamp to minute precision for display.
fn format_ingested_at(raw: &str) -> String {
    let minute_precision: String = raw.chars().take(16).collect();
    minute_precision.replace('T', " ")
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;

    let border_color = if app.loading {
        Color::DarkGray
    } else if editing || app.focus == FocusPane::Input {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if app.loading {
        " Ask (waiting for the current answer) "
    } else {
        " Ask "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible in long questions.
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if editing && !app.loading {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " VIEW ",
        InputMode::Editing => " ASK ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" ask ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
            ];
            hints.extend(vec![
                Span::styled(" d ", key_style),
                Span::styled(
                    if app.show_documents { " hide docs " } else { " docs " },
                    label_style,
                ),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names_are_stripped_to_basename() {
        assert_eq!(source_display_name("a/b.pdf"), "b.pdf");
        assert_eq!(source_display_name("deep/nested/dir/notes.md"), "notes.md");
        assert_eq!(source_display_name("plain.txt"), "plain.txt");
        assert_eq!(source_display_name("trailing/"), "trailing/");
    }

    #[test]
    fn scores_render_as_rounded_percentages() {
        assert_eq!(format_score(0.42), "42%");
        assert_eq!(format_score(0.005), "1%");
        assert_eq!(format_score(1.0), "100%");
        assert_eq!(format_score(0.0), "0%");
    }

    #[test]
    fn ingest_timestamps_trim_to_minutes() {
        assert_eq!(
            format_ingested_at("2026-08-05T14:03:22.123456"),
            "2026-08-05 14:03"
        );
        assert_eq!(format_ingested_at("2026-08-05"), "2026-08-05");
        assert_eq!(format_ingested_at(""), "");
    }

    #[test]
    fn bold_markers_become_styled_spans() {
        let line = styled_answer_line("see **the report** for details");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "the report");

        // Unterminated markers stay literal
        let line = styled_answer_line("broken **bold");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "broken **bold");

        let line = styled_answer_line("no markup at all");
        assert_eq!(line.spans.len(), 1);
    }
}
