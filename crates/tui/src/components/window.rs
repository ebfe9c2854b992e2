use ratatui::{
    Frame,
    layout::Rect,
    text::Span,
    widgets::{Block, Borders},
};

use super::{Context, Pane};
use crate::{
    message::{Cmd, Message, WindowId},
    theme::Theme,
};

/// Bordered, titled frame around a pane.
///
/// Tracks its own focus from `WindowFocused` broadcasts and hands the pane
/// its size minus the border.
pub struct Window<P> {
    id: WindowId,
    title: String,
    focused: bool,
    width: u16,
    height: u16,
    pane: P,
}

impl<P: Pane> Window<P> {
    pub fn new(id: WindowId, title: impl Into<String>, pane: P) -> Self {
        Self {
            id,
            title: title.into(),
            focused: false,
            width: 0,
            height: 0,
            pane,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn pane(&self) -> &P {
        &self.pane
    }
}

impl<P: Pane> Pane for Window<P> {
    fn init(&mut self, ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        self.pane.init(ctx)
    }

    fn update(&mut self, msg: &Message, ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        match msg {
            Message::Resize { width, height } => {
                self.width = *width;
                self.height = *height;
                let inner = Message::Resize {
                    width: width.saturating_sub(2),
                    height: height.saturating_sub(2),
                };
                return self.pane.update(&inner, ctx);
            }
            Message::WindowFocused(id) => self.focused = *id == self.id,
            Message::WindowTitleChanged { id, title } if *id == self.id => {
                self.title = title.clone();
                return Ok(Cmd::None);
            }
            _ => {}
        }
        self.pane.update(msg, ctx)
    }

    fn view(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let (border, title) = if self.focused {
            (theme.border_focused, theme.title_focused)
        } else {
            (theme.border, theme.title)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(format!("[{}] {}", self.id, self.title), title));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.pane.view(frame, inner, theme);
    }

    fn captures_input(&self) -> bool {
        self.pane.captures_input()
    }

    fn hint(&self) -> &str {
        self.pane.hint()
    }
}

#[cfg(test)]
mod tests {
    use debugger::testing::FakeBackend;
    use ratatui::{Terminal, backend::TestBackend, widgets::Paragraph};

    use super::*;
    use crate::{cache::ContentCache, highlight::PlainHighlighter};

    /// Records every message it receives
    #[derive(Default)]
    struct Probe {
        seen: Vec<Message>,
    }

    impl Pane for Probe {
        fn update(&mut self, msg: &Message, _ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
            self.seen.push(msg.clone());
            Ok(Cmd::None)
        }

        fn view(&self, frame: &mut Frame, area: Rect, _theme: &Theme) {
            frame.render_widget(Paragraph::new("inside"), area);
        }
    }

    fn send(window: &mut Window<Probe>, msg: Message) {
        let mut backend = FakeBackend::stopped_at("main.go", 1);
        let mut cache = ContentCache::new(1, Box::new(PlainHighlighter));
        let theme = Theme::default();
        let mut ctx = Context {
            backend: &mut backend,
            cache: &mut cache,
            theme: &theme,
        };
        window.update(&msg, &mut ctx).unwrap();
    }

    #[test]
    fn pane_gets_inner_size() {
        let mut window = Window::new(1, "Probe", Probe::default());
        send(&mut window, Message::Resize { width: 40, height: 10 });
        assert_eq!(window.size(), (40, 10));
        assert_eq!(
            window.pane().seen,
            [Message::Resize { width: 38, height: 8 }]
        );
    }

    #[test]
    fn focus_follows_broadcasts() {
        let mut window = Window::new(2, "Probe", Probe::default());
        send(&mut window, Message::WindowFocused(2));
        assert!(window.is_focused());
        send(&mut window, Message::WindowFocused(3));
        assert!(!window.is_focused());
        assert_eq!(window.pane().seen.len(), 2);
    }

    #[test]
    fn title_changes_only_apply_to_the_addressed_window() {
        let mut window = Window::new(5, "Output", Probe::default());
        send(
            &mut window,
            Message::WindowTitleChanged {
                id: 4,
                title: "Other".to_string(),
            },
        );
        assert_eq!(window.title(), "Output");
        send(
            &mut window,
            Message::WindowTitleChanged {
                id: 5,
                title: "Command Mode".to_string(),
            },
        );
        assert_eq!(window.title(), "Command Mode");
    }

    #[test]
    fn renders_border_and_title() {
        let window = Window::new(3, "Call Stack", Probe::default());
        let mut terminal = Terminal::new(TestBackend::new(20, 3)).unwrap();
        terminal
            .draw(|frame| window.view(frame, frame.area(), &Theme::default()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let top: String = (0..20).map(|x| buffer[(x, 0)].symbol()).collect();
        let middle: String = (0..20).map(|x| buffer[(x, 1)].symbol()).collect();
        assert!(top.starts_with("┌[3] Call Stack"), "{top}");
        assert!(middle.starts_with("│inside"), "{middle}");
    }
}
