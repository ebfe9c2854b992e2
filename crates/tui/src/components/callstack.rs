use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use debugger::{Location, StackFrame};
use eyre::WrapErr;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::{
    Context, Pane,
    list::{Keyed, SelectableList},
};
use crate::{
    message::{Cmd, Message},
    paths,
    theme::Theme,
};

const HINT: &str = "enter: show frame, h/l: page";
/// Function line plus location line
const ROWS_PER_FRAME: usize = 2;

impl Keyed for StackFrame {
    type Key = usize;

    fn key(&self) -> usize {
        self.index
    }
}

pub struct CallStackPane {
    root: Option<PathBuf>,
    list: SelectableList<StackFrame>,
    /// File shown in the source pane; its frames are highlighted
    shown_file: Option<PathBuf>,
}

impl CallStackPane {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            list: SelectableList::default(),
            shown_file: None,
        }
    }

    pub fn list(&self) -> &SelectableList<StackFrame> {
        &self.list
    }

    pub fn shown_file(&self) -> Option<&std::path::Path> {
        self.shown_file.as_deref()
    }

    fn refresh(&mut self, follow_execution: bool, ctx: &mut Context<'_>) -> eyre::Result<()> {
        let frames = ctx.backend.call_stack().wrap_err("loading call stack")?;
        if follow_execution {
            self.shown_file = frames.first().map(|frame| frame.filename.clone());
        }
        self.list.replace(frames);
        Ok(())
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Cmd {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.list.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.list.select_previous(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => self.list.next_page(),
            KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => self.list.previous_page(),
            KeyCode::Enter => {
                if let Some(frame) = self.list.selected() {
                    let location = Location::new(frame.filename.clone(), frame.line);
                    return Cmd::msg(Message::FileRequested(location));
                }
            }
            _ => {}
        }
        Cmd::None
    }

    fn rows(
        &self,
        index: usize,
        frame: &StackFrame,
        width: usize,
        theme: &Theme,
    ) -> [Line<'static>; 2] {
        let selected = index == self.list.selected_index();
        let marker = if selected { theme.glyphs.selected_frame } else { "  " };
        let in_shown_file = self.shown_file.as_deref() == Some(frame.filename.as_path());

        let function_style = if in_shown_file { theme.current_file } else { theme.text };
        let function = Line::from(vec![
            Span::styled(marker, theme.arrow),
            Span::styled(format!("{}()", frame.function), function_style),
        ]);

        let path = paths::relative_to(&frame.filename, self.root.as_deref());
        let location = format!("{}:{}", path.display(), frame.line);
        let location = Line::from(Span::styled(
            format!("    {}", paths::truncate(&location, width.saturating_sub(4))),
            theme.muted,
        ));

        if selected {
            [function.style(theme.selected), location.style(theme.selected)]
        } else {
            [function, location]
        }
    }
}

impl Pane for CallStackPane {
    fn update(&mut self, msg: &Message, ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        match msg {
            Message::Resize { height, .. } => {
                let rows = usize::from(height.saturating_sub(1));
                self.list.set_per_page(rows / ROWS_PER_FRAME);
            }
            Message::Key(key) => return Ok(self.handle_key(key)),
            Message::FileRequested(location) => self.shown_file = Some(location.filename.clone()),
            Message::RefreshContent | Message::DebuggerStepped | Message::DebuggerRestarted => {
                self.refresh(true, ctx)?
            }
            msg if msg.is_lifecycle() => self.refresh(false, ctx)?,
            _ => {}
        }
        Ok(Cmd::None)
    }

    fn view(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if area.height == 0 {
            return;
        }
        let body = Rect::new(area.x, area.y, area.width, area.height - 1);
        let footer = Rect::new(area.x, area.bottom() - 1, area.width, 1);
        let width = usize::from(area.width);

        let lines: Vec<Line> = self
            .list
            .visible()
            .flat_map(|(index, stack_frame)| self.rows(index, stack_frame, width, theme))
            .collect();
        frame.render_widget(Paragraph::new(lines), body);
        frame.render_widget(
            Paragraph::new(self.list.footer()).style(theme.muted),
            footer,
        );
    }

    fn hint(&self) -> &str {
        HINT
    }
}
