//! Payment screen.

use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::application::dto::FlowView;
use crate::domain::entities::{FlowExit, FlowStepKind, PaymentResult};
use crate::presentation::widgets::{FooterBar, KeyHint, step_color};

const RESULT_ROWS: u16 = 5;

const QUIT: KeyHint = KeyHint::new("Quit", "q");
const NEW_REQUEST: KeyHint = KeyHint::new("Simulate POS", "n");
const CLEAR_REQUEST: KeyHint = KeyHint::new("Clear POS", "x");

/// Renders a [`FlowView`] for the operator.
pub struct PaymentScreen<'a> {
    view: &'a FlowView,
    terminal_name: &'a str,
}

impl<'a> PaymentScreen<'a> {
    /// Creates screen for a view snapshot.
    #[must_use]
    pub const fn new(view: &'a FlowView, terminal_name: &'a str) -> Self {
        Self {
            view,
            terminal_name,
        }
    }

    /// Keys available for the current step.
    #[must_use]
    pub fn key_hints(view: &FlowView) -> Vec<KeyHint> {
        if !view.is_active() {
            return vec![NEW_REQUEST, QUIT];
        }

        let mut hints = match view.step {
            FlowStepKind::Ready => vec![
                KeyHint::new("Charge", "Enter"),
                KeyHint::new("Cancel", "Esc"),
            ],
            FlowStepKind::Creating | FlowStepKind::Collecting => {
                vec![KeyHint::new("Cancel", "Esc")]
            }
            FlowStepKind::Processing => Vec::new(),
            FlowStepKind::Complete => vec![KeyHint::new("Done", "Enter")],
            FlowStepKind::Cancelled => {
                vec![KeyHint::new("Retry", "r"), KeyHint::new("Done", "d")]
            }
            FlowStepKind::Error => vec![
                KeyHint::new("Retry", "r"),
                KeyHint::new("Cancel", "Esc"),
            ],
        };
        hints.push(CLEAR_REQUEST);
        hints.push(QUIT);
        hints
    }

    fn body_lines(&self) -> Vec<Line<'a>> {
        let view = self.view;
        let mut lines = Vec::new();

        if let Some(money) = &view.money {
            lines.push(Line::from(Span::styled(
                money.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        if let Some(description) = &view.description {
            lines.push(Line::from(Span::styled(
                description.clone(),
                Style::default().fg(Color::Gray),
            )));
        }
        match view.item_count {
            0 => {}
            1 => lines.push(Line::from("1 item")),
            n => lines.push(Line::from(format!("{n} items"))),
        }
        lines.push(Line::default());

        let detail = match view.step {
            FlowStepKind::Ready => "Press Enter to charge the customer".to_string(),
            FlowStepKind::Creating => "Preparing the card reader...".to_string(),
            FlowStepKind::Collecting => "Tap, insert or swipe a card".to_string(),
            FlowStepKind::Processing => "Authorising, do not remove the card".to_string(),
            FlowStepKind::Complete => "Approved".to_string(),
            FlowStepKind::Cancelled => "No charge was made".to_string(),
            FlowStepKind::Error => view
                .message
                .clone()
                .unwrap_or_else(|| "Payment failed".to_string()),
        };
        lines.push(Line::from(Span::styled(
            detail,
            Style::default().fg(step_color(view.step)),
        )));

        if let Some(intent_id) = &view.intent_id {
            lines.push(Line::from(Span::styled(
                intent_id.to_string(),
                Style::default().fg(Color::DarkGray),
            )));
        }

        lines
    }

    fn idle_lines(&self) -> Vec<Line<'a>> {
        let reason = match self.view.exit {
            Some(FlowExit::Completed) => "Last payment completed",
            Some(FlowExit::Dismissed) => "Last payment dismissed",
            Some(FlowExit::RequestCleared) => "The POS withdrew the request",
            None => "",
        };

        vec![
            Line::from(Span::styled(
                "Waiting for a payment request from the POS",
                Style::default().fg(Color::White),
            )),
            Line::default(),
            Line::from(Span::styled(reason, Style::default().fg(Color::DarkGray))),
        ]
    }

    fn result_line(result: &PaymentResult) -> Line<'static> {
        let (mark, color) = if result.is_success() {
            ("paid     ", Color::Green)
        } else {
            ("cancelled", Color::Gray)
        };
        let at = result.recorded_at.with_timezone(&Local).format("%H:%M:%S");

        Line::from(vec![
            Span::styled(format!("{at}  "), Style::default().fg(Color::DarkGray)),
            Span::styled(mark, Style::default().fg(color)),
            Span::raw(format!("  {}  ", result.money)),
            Span::styled(result.request_id.clone(), Style::default().fg(Color::DarkGray)),
        ])
    }

    fn render_card(&self, area: Rect, buf: &mut Buffer) {
        let vertical = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(9),
            Constraint::Fill(1),
        ]);
        let [_, center, _] = vertical.areas(area);
        let horizontal = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Min(48),
            Constraint::Fill(1),
        ]);
        let [_, card, _] = horizontal.areas(center);

        Clear.render(card, buf);

        let (title, border, lines) = if self.view.is_active() {
            (
                self.view.headline(),
                step_color(self.view.step),
                self.body_lines(),
            )
        } else {
            ("Idle", Color::DarkGray, self.idle_lines())
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(format!(" {title} "));

        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(card, buf);
    }

    fn render_results(&self, area: Rect, buf: &mut Buffer) {
        let lines: Vec<Line<'_>> = self
            .view
            .recent_results
            .iter()
            .rev()
            .take(RESULT_ROWS as usize)
            .map(Self::result_line)
            .collect();

        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Recent ");
        Paragraph::new(lines).block(block).render(area, buf);
    }
}

impl Widget for PaymentScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [header, body, results, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(RESULT_ROWS + 1),
            Constraint::Length(1),
        ])
        .areas(area);

        Paragraph::new(Line::from(vec![
            Span::styled(
                " mizpos terminal ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(self.terminal_name, Style::default().fg(Color::Gray)),
        ]))
        .render(header, buf);

        self.render_card(body, buf);
        self.render_results(results, buf);

        let hints = Self::key_hints(self.view);
        let mut bar = FooterBar::new(&hints);
        if self.view.is_active() {
            bar = bar.step(self.view.step);
        }
        bar.render(footer, buf);
    }
}
