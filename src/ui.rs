use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use jtype::drill::{CharOutcome, CompareMode};
use jtype::judge::RunKind;
use jtype::topic::derive_topic;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().add_modifier(Modifier::DIM);
        let green_bold = bold.fg(Color::Green);
        let red_bold = bold.fg(Color::Red);
        let cursor_style = dim.patch(bold).add_modifier(Modifier::UNDERLINED);

        let Some(example) = self.current() else {
            let placeholder = Paragraph::new(Span::styled(
                "No examples loaded — check the notes source.",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            placeholder.render(area, buf);
            return;
        };

        let expected_height = example
            .output
            .as_ref()
            .map(|o| (o.lines().count() as u16 + 2).min(6))
            .unwrap_or(0);
        let run_busy = self.tracker.in_flight(RunKind::Target) || self.tracker.in_flight(RunKind::Typed);
        let run_height = if run_busy || self.run_display.is_some() {
            let body = self.run_display.as_deref().unwrap_or("");
            (body.lines().count().max(1) as u16 + 2).min(8)
        } else {
            0
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(1)
            .constraints([
                Constraint::Length(1),               // header
                Constraint::Min(4),                  // code pane
                Constraint::Length(2),               // status
                Constraint::Length(expected_height), // expected output
                Constraint::Length(run_height),      // run output
                Constraint::Length(1),               // key help
            ])
            .split(area);

        // header: filename, topic, position; title when there is room
        let topic = derive_topic(example);
        let position = format!("{}/{}", self.index + 1, self.examples.len());
        let mut header_spans = vec![
            Span::styled(example.filename.clone(), bold),
            Span::raw("  "),
            Span::styled(topic.to_string(), Style::default().fg(Color::Cyan)),
            Span::raw("  "),
            Span::styled(position, dim),
        ];
        let used: usize = header_spans.iter().map(|s| s.content.width()).sum();
        if used + 2 + example.title.width() <= chunks[0].width as usize {
            header_spans.push(Span::raw("  "));
            header_spans.push(Span::styled(example.title.clone(), dim));
        }
        Paragraph::new(Line::from(header_spans)).render(chunks[0], buf);

        // code pane: target text, colored per typed outcome
        let mut lines: Vec<Line> = Vec::new();
        let mut spans: Vec<Span> = Vec::new();
        for (idx, ch) in self.drill.target.chars().enumerate() {
            let at_cursor = idx == self.drill.cursor_pos() && !self.drill.is_complete();
            if ch == '\n' {
                if at_cursor {
                    spans.push(Span::styled(" ", cursor_style));
                }
                lines.push(Line::from(std::mem::take(&mut spans)));
                continue;
            }
            let span = match self.drill.char_outcome(idx) {
                CharOutcome::Pending => {
                    let style = if at_cursor { cursor_style } else { dim };
                    Span::styled(ch.to_string(), style)
                }
                CharOutcome::Correct => Span::styled(ch.to_string(), green_bold),
                CharOutcome::Incorrect => Span::styled(
                    match ch {
                        ' ' => "·".to_owned(),
                        c => c.to_string(),
                    },
                    red_bold,
                ),
            };
            spans.push(span);
        }
        if !spans.is_empty() {
            lines.push(Line::from(spans));
        }
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .render(chunks[1], buf);

        // status: timer, then results and the countdown once complete
        let status = if self.drill.is_complete() {
            let countdown = self
                .drill
                .advance_in_secs()
                .map(|s| format!(" — next in {s}s (Enter to skip)"))
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(
                    format!("{:.1}s", self.drill.elapsed_ms() as f64 / 1000.0),
                    bold.fg(Color::Magenta),
                ),
                Span::styled(
                    format!(
                        "  {} wpm / {}% acc{countdown}",
                        self.drill.wpm(),
                        self.drill.accuracy()
                    ),
                    dim,
                ),
            ])
        } else {
            let (typed, total) = (self.drill.cursor_pos(), self.drill.target_len());
            let mode = match self.drill.mode() {
                CompareMode::Strict => String::new(),
                other => format!("  [{other}]"),
            };
            Line::from(vec![
                Span::styled(
                    format!("{:.1}s", self.drill.elapsed_ms() as f64 / 1000.0),
                    bold.fg(Color::Magenta),
                ),
                Span::styled(format!("  {typed}/{total}{mode}"), dim),
            ])
        };
        Paragraph::new(status).render(chunks[2], buf);

        if let Some(output) = &example.output {
            Paragraph::new(output.clone())
                .block(Block::default().borders(Borders::ALL).title("Expected Output"))
                .style(dim)
                .wrap(Wrap { trim: false })
                .render(chunks[3], buf);
        }

        if run_height > 0 {
            let body = if let Some(text) = &self.run_display {
                text.clone()
            } else {
                "running…".to_string()
            };
            Paragraph::new(body)
                .block(Block::default().borders(Borders::ALL).title("Run Output"))
                .wrap(Wrap { trim: false })
                .render(chunks[4], buf);
        }

        let help = Paragraph::new(
            "type to practice · tab next · ctrl+p prev · ctrl+r restart · ctrl+o run · ctrl+t run typed · esc quit",
        )
        .style(dim.add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
        help.render(chunks[5], buf);
    }
}
