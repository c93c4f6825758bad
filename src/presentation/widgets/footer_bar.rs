//! Footer with the step badge and key hints.

use crate::domain::entities::FlowStepKind;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// One key binding shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHint {
    /// What the key does.
    pub label: &'static str,
    /// How the key is written.
    pub key: &'static str,
}

impl KeyHint {
    /// Creates hint.
    #[must_use]
    pub const fn new(label: &'static str, key: &'static str) -> Self {
        Self { label, key }
    }
}

/// Colour of the step badge.
#[must_use]
pub const fn step_color(step: FlowStepKind) -> Color {
    match step {
        FlowStepKind::Ready => Color::Cyan,
        FlowStepKind::Creating | FlowStepKind::Collecting | FlowStepKind::Processing => {
            Color::Yellow
        }
        FlowStepKind::Complete => Color::Green,
        FlowStepKind::Cancelled => Color::Gray,
        FlowStepKind::Error => Color::Red,
    }
}

/// Footer colours.
pub struct FooterBarStyle {
    /// Fill behind the bar.
    pub background: Style,
    /// Hint label.
    pub label_style: Style,
    /// Hint key.
    pub key_style: Style,
    /// Right-aligned info text.
    pub info: Style,
}

impl Default for FooterBarStyle {
    fn default() -> Self {
        Self {
            background: Style::default(),
            label_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            key_style: Style::default().fg(Color::White).bg(Color::DarkGray),
            info: Style::default().fg(Color::DarkGray),
        }
    }
}

/// Footer bar widget.
pub struct FooterBar<'a> {
    hints: &'a [KeyHint],
    step: Option<FlowStepKind>,
    right_info: Option<&'a str>,
    style: FooterBarStyle,
}

impl<'a> FooterBar<'a> {
    /// Creates bar showing `hints`.
    #[must_use]
    pub fn new(hints: &'a [KeyHint]) -> Self {
        Self {
            hints,
            step: None,
            right_info: None,
            style: FooterBarStyle::default(),
        }
    }

    /// Shows the step badge.
    #[must_use]
    pub const fn step(mut self, step: FlowStepKind) -> Self {
        self.step = Some(step);
        self
    }

    /// Sets right-aligned text.
    #[must_use]
    pub const fn right_info(mut self, info: Option<&'a str>) -> Self {
        self.right_info = info;
        self
    }

    /// Sets colours.
    #[must_use]
    pub const fn style(mut self, style: FooterBarStyle) -> Self {
        self.style = style;
        self
    }

    fn build_left_spans(&self) -> Vec<Span<'_>> {
        let mut spans = Vec::new();

        if let Some(step) = self.step {
            spans.push(Span::styled(
                format!(" {} ", step.as_str().to_uppercase()),
                Style::default()
                    .fg(step_color(step))
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(" "));
        }

        for (i, hint) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(format!(" {} ", hint.label), self.style.label_style));
            spans.push(Span::styled(format!(" {} ", hint.key), self.style.key_style));
        }

        spans
    }
}

impl Widget for FooterBar<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        for x in area.left()..area.right() {
            buf[(x, area.y)]
                .set_char(' ')
                .set_style(self.style.background);
        }

        let right_width = self.right_info.map_or(0, |s| s.chars().count() as u16);
        let left_width = area.width.saturating_sub(right_width + 1);
        let left_area = Rect::new(area.x, area.y, left_width, 1);
        Paragraph::new(Line::from(self.build_left_spans())).render(left_area, buf);

        if let Some(info) = self.right_info {
            if right_width < area.width {
                let right_x = area.right().saturating_sub(right_width);
                let right_area = Rect::new(right_x, area.y, right_width, 1);
                Paragraph::new(Line::from(Span::styled(info, self.style.info)))
                    .render(right_area, buf);
            }
        }
    }
}
