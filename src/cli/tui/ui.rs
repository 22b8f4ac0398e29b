//! TUI rendering with ratatui

use kasirise_core::{option_label, Accent, AgentId, AssessmentQuestion, Role, Turn};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::app::{App, Screen};

const SPINNER_FRAMES: &[&str] = &["   ", ".  ", ".. ", "..."];

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &App) {
    match app.screen {
        Screen::Select => draw_select(frame, app),
        Screen::Session => draw_session(frame, app),
    }
}

fn accent_color(accent: Accent) -> Color {
    match accent {
        Accent::Blue => Color::Blue,
        Accent::Green => Color::Green,
        Accent::Purple => Color::Magenta,
        Accent::Amber => Color::Yellow,
    }
}

// ── selection screen ────────────────────────────────────────────────────

fn draw_select(frame: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(3),    // agent list
            Constraint::Length(1), // hint
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled("KasiRise Scholar", Style::default().bold()),
        Span::styled(
            "  Empowering Township Talent",
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, outer[0]);

    let mut lines: Vec<Line> = vec![Line::raw(""), Line::from(Span::styled(
        "Select Your Agent",
        Style::default().bold(),
    )), Line::raw("")];

    for (idx, descriptor) in kasirise_core::list_agents().iter().enumerate() {
        let selected = idx == app.cursor;
        let marker = if selected { "\u{25b8} " } else { "  " };
        let name_style = if selected {
            Style::default().fg(accent_color(descriptor.accent)).bold()
        } else {
            Style::default().fg(accent_color(descriptor.accent))
        };

        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().bold()),
            Span::styled(descriptor.name, name_style),
        ]));
        lines.push(Line::from(Span::styled(
            format!("    {}", descriptor.description),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::raw(""));
    }

    let list = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    frame.render_widget(list, outer[1]);

    let hint = Paragraph::new(Line::from(Span::styled(
        " \u{2191}/\u{2193} select \u{00b7} Enter start session \u{00b7} q quit",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(hint, outer[2]);
}

// ── session screen ──────────────────────────────────────────────────────

fn draw_session(frame: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(3),    // transcript
            Constraint::Length(1), // notice (blank when none)
            Constraint::Length(3), // input
        ])
        .split(frame.area());

    draw_status_bar(frame, app, outer[0]);
    draw_transcript(frame, app, outer[1]);
    draw_notice(frame, app, outer[2]);
    draw_input(frame, app, outer[3]);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let version = env!("CARGO_PKG_VERSION");
    let agent_name = app.active_agent().map(|a| a.name).unwrap_or("-");

    let info_text = format!(
        " KasiRise Scholar \u{00b7} {} \u{00b7} gemini:{} v{}",
        agent_name,
        app.model(),
        version,
    );

    let center = if app.is_loading {
        let dots = SPINNER_FRAMES[app.loading_tick % SPINNER_FRAMES.len()];
        format!("Thinking{}", dots)
    } else {
        String::new()
    };

    let right = "Esc back \u{00b7} Ctrl+C quit".to_string();

    let width = area.width as usize;
    let used = info_text.width() + center.width() + right.width();
    let remaining = width.saturating_sub(used);
    let left_spacer = remaining / 2;
    let right_spacer = remaining.saturating_sub(left_spacer);

    let mut spans = vec![Span::raw(info_text)];
    if left_spacer > 0 {
        spans.push(Span::raw(" ".repeat(left_spacer)));
    }
    if !center.is_empty() {
        spans.push(Span::styled(center, Style::default().fg(Color::Yellow).bold()));
    }
    if right_spacer > 0 {
        spans.push(Span::raw(" ".repeat(right_spacer)));
    }
    spans.push(Span::styled(right, Style::default().fg(Color::DarkGray)));

    let p = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::Rgb(20, 20, 20)).fg(Color::White));
    frame.render_widget(p, area);
}

fn draw_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let Some(conversation) = app.conversation.as_ref() else {
        return;
    };
    let descriptor = kasirise_core::describe(conversation.agent());
    let accent = accent_color(descriptor.accent);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", descriptor.name));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let mut all_lines: Vec<Line> = Vec::new();
    for turn in conversation.turns() {
        match turn.role {
            Role::User => {
                all_lines.push(Line::from(Span::styled("You", Style::default().bold())));
                for line_text in turn.content.split('\n') {
                    all_lines.push(Line::from(vec![
                        Span::raw("  "),
                        Span::raw(line_text.to_string()),
                    ]));
                }
            }
            Role::Assistant => {
                all_lines.push(Line::from(Span::styled(
                    descriptor.name,
                    Style::default().fg(accent).bold(),
                )));
                push_assistant_content(&mut all_lines, turn, conversation.agent(), accent);
            }
        }
        // Spacer between turns
        all_lines.push(Line::raw(""));
    }

    // Loading indicator inline
    if app.is_loading {
        let dots = SPINNER_FRAMES[app.loading_tick % SPINNER_FRAMES.len()];
        all_lines.push(Line::from(vec![
            Span::styled(format!("{} ", descriptor.name), Style::default().fg(accent).bold()),
            Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).italic(),
            ),
        ]));
    }

    let text = Text::from(all_lines);
    let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });

    // Scroll logic: offset counts lines up from the bottom
    let total_lines = paragraph.line_count(inner.width) as u16;
    let view_height = inner.height;
    let max_scroll = total_lines.saturating_sub(view_height);

    let scroll_pos = if app.scroll_offset > max_scroll as usize {
        0
    } else {
        max_scroll.saturating_sub(app.scroll_offset as u16)
    };

    let mut scrollbar_state =
        ScrollbarState::new(max_scroll as usize).position(scroll_pos as usize);

    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("\u{25b2}"))
            .end_symbol(Some("\u{25bc}"))
            .track_symbol(Some("\u{2502}"))
            .thumb_symbol("\u{2588}"),
        area,
        &mut scrollbar_state,
    );

    frame.render_widget(paragraph.scroll((scroll_pos, 0)), inner);
}

/// Render one assistant turn's body: error text, a decoded assessment
/// payload, or markdown, plus the agent-specific decorations.
fn push_assistant_content(lines: &mut Vec<Line<'static>>, turn: &Turn, agent: AgentId, accent: Color) {
    if turn.is_error {
        for line_text in turn.content.split('\n') {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(line_text.to_string(), Style::default().fg(Color::Red)),
            ]));
        }
        return;
    }

    if turn.is_json_assessment {
        match AssessmentQuestion::from_turn(turn) {
            Some(question) => {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(question.question.clone(), Style::default().bold()),
                ]));
                lines.push(Line::raw(""));
                for (idx, option) in question.options.iter().enumerate() {
                    lines.push(Line::from(vec![
                        Span::raw("  "),
                        Span::styled(
                            format!("{}. ", option_label(idx)),
                            Style::default().fg(accent).bold(),
                        ),
                        Span::raw(option.clone()),
                    ]));
                }
                // explanation / correctAnswer are grading-only and stay hidden
            }
            None => {
                // Decode failed: fall back to the literal text
                for line_text in turn.content.split('\n') {
                    lines.push(Line::from(vec![
                        Span::raw("  "),
                        Span::raw(line_text.to_string()),
                    ]));
                }
            }
        }
    } else {
        let md_text = tui_markdown::from_str(&turn.content);
        for line in md_text.lines {
            let mut indented = vec![Span::raw("  ")];
            indented.extend(
                line.spans
                    .into_iter()
                    .map(|s| Span::styled(s.content.to_string(), s.style)),
            );
            lines.push(Line::from(indented));
        }
    }

    if !turn.grounding_sources.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                "Verified Sources",
                Style::default().fg(Color::DarkGray).bold(),
            ),
        ]));
        for source in &turn.grounding_sources {
            lines.push(Line::from(vec![
                Span::raw("  \u{2022} "),
                Span::styled(source.title.clone(), Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!(" ({})", source.uri),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
    }

    if agent == AgentId::Advocacy {
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                "Human-in-the-Loop: this draft requires review by a mentor before submission.",
                Style::default().fg(Color::Yellow).italic(),
            ),
        ]));
    }
}

fn draw_notice(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(notice) = &app.notice {
        let p = Paragraph::new(Line::from(Span::styled(
            format!(" {notice}"),
            Style::default().fg(Color::Magenta),
        )));
        frame.render_widget(p, area);
    }
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.is_loading {
        " Input (waiting for reply) "
    } else {
        " Input "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if app.is_loading {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Blue)
        })
        .title(title);

    let mut textarea = app.textarea.clone();
    textarea.set_block(block);
    frame.render_widget(&textarea, area);
}
