use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
};

/// Gutter marker of a source line, in decreasing precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    ArrowInBreakpoint,
    Arrow,
    Breakpoint,
    DisabledBreakpoint,
    Blank,
}

#[derive(Debug, Clone)]
pub struct Glyphs {
    pub arrow: &'static str,
    pub arrow_in_breakpoint: &'static str,
    pub breakpoint: &'static str,
    pub blank: &'static str,
    pub selected_frame: &'static str,
}

impl Default for Glyphs {
    fn default() -> Self {
        Self {
            arrow: " ▶ ",
            arrow_in_breakpoint: "●▶ ",
            breakpoint: " ● ",
            blank: "   ",
            selected_frame: "▶ ",
        }
    }
}

/// Every style used when drawing, passed down to each render call
#[derive(Debug, Clone)]
pub struct Theme {
    pub glyphs: Glyphs,
    pub text: Style,
    pub muted: Style,
    pub gutter: Style,
    pub cursor_gutter: Style,
    pub arrow: Style,
    pub arrow_in_breakpoint: Style,
    pub breakpoint: Style,
    pub disabled_breakpoint: Style,
    pub condition: Style,
    pub selected: Style,
    pub current_file: Style,
    pub border: Style,
    pub border_focused: Style,
    pub title: Style,
    pub title_focused: Style,
    pub banner: Style,
    pub session_ended: Style,
    pub hint: Style,
    pub stderr: Style,
    pub command: Style,
    pub error: Style,
    pub prompt: Style,
}

impl Default for Theme {
    fn default() -> Self {
        let purple = Color::Rgb(0x7d, 0x56, 0xf4);
        Self {
            glyphs: Glyphs::default(),
            text: Style::default(),
            muted: Style::default().fg(Color::DarkGray),
            gutter: Style::default().fg(Color::DarkGray),
            cursor_gutter: Style::default()
                .bg(purple)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            arrow: Style::default().fg(Color::Green),
            arrow_in_breakpoint: Style::default().fg(Color::Red),
            breakpoint: Style::default().fg(Color::Red),
            disabled_breakpoint: Style::default().fg(Color::Gray),
            condition: Style::default().fg(Color::Yellow),
            selected: Style::default().bg(Color::DarkGray),
            current_file: Style::default().fg(Color::Cyan),
            border: Style::default().fg(Color::Gray),
            border_focused: Style::default().fg(Color::Green),
            title: Style::default(),
            title_focused: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            banner: Style::default()
                .fg(Color::Black)
                .bg(Color::Rgb(0xff, 0x8c, 0x00)),
            session_ended: Style::default().fg(Color::Yellow),
            hint: Style::default().fg(Color::DarkGray),
            stderr: Style::default().fg(Color::Red),
            command: Style::default().fg(Color::Cyan),
            error: Style::default().fg(Color::Red),
            prompt: Style::default().fg(Color::Green),
        }
    }
}

impl Theme {
    pub fn marker(&self, marker: Marker) -> Span<'static> {
        let g = &self.glyphs;
        match marker {
            Marker::ArrowInBreakpoint => {
                Span::styled(g.arrow_in_breakpoint, self.arrow_in_breakpoint)
            }
            Marker::Arrow => Span::styled(g.arrow, self.arrow),
            Marker::Breakpoint => Span::styled(g.breakpoint, self.breakpoint),
            Marker::DisabledBreakpoint => Span::styled(g.breakpoint, self.disabled_breakpoint),
            Marker::Blank => Span::raw(g.blank),
        }
    }

    pub fn breakpoint_dot(&self, disabled: bool) -> Span<'static> {
        if disabled {
            self.marker(Marker::DisabledBreakpoint)
        } else {
            self.marker(Marker::Breakpoint)
        }
    }
}
