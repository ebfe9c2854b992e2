use crossterm::event::{KeyCode, KeyEvent};
use debugger::Variable;
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
    theme::Theme,
};

const HINT: &str = "enter: inspect, h/l: page";
const VIEWER_HINT: &str = "esc: close, j/k: scroll";

impl Keyed for Variable {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// Full rendering of one variable
struct Viewer {
    name: String,
    lines: Vec<Line<'static>>,
    scroll: usize,
}

/// Local variables and arguments of the current frame
#[derive(Default)]
pub struct VariablesPane {
    list: SelectableList<Variable>,
    viewer: Option<Viewer>,
}

impl VariablesPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &SelectableList<Variable> {
        &self.list
    }

    /// Name of the variable open in the viewer
    pub fn inspecting(&self) -> Option<&str> {
        self.viewer.as_ref().map(|viewer| viewer.name.as_str())
    }

    fn refresh(&mut self, ctx: &mut Context<'_>) -> eyre::Result<()> {
        let variables = ctx
            .backend
            .local_variables()
            .wrap_err("loading local variables")?;
        self.list.replace(variables);
        Ok(())
    }

    fn inspect(&mut self, ctx: &mut Context<'_>) -> eyre::Result<()> {
        let Some(variable) = self.list.selected() else {
            return Ok(());
        };
        let lines = ctx
            .cache
            .highlighter()
            .highlight(variable.detailed_value(), "go")?;
        self.viewer = Some(Viewer {
            name: variable.name.clone(),
            lines,
            scroll: 0,
        });
        Ok(())
    }

    fn handle_viewer_key(&mut self, key: &KeyEvent) {
        if key.code == KeyCode::Esc {
            self.viewer = None;
            return;
        }
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        let last = viewer.lines.len().saturating_sub(1);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => viewer.scroll = (viewer.scroll + 1).min(last),
            KeyCode::Char('k') | KeyCode::Up => viewer.scroll = viewer.scroll.saturating_sub(1),
            KeyCode::Char('g') => viewer.scroll = 0,
            KeyCode::Char('G') => viewer.scroll = last,
            _ => {}
        }
    }

    fn handle_key(&mut self, key: &KeyEvent, ctx: &mut Context<'_>) -> eyre::Result<()> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.list.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.list.select_previous(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => self.list.next_page(),
            KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => self.list.previous_page(),
            KeyCode::Enter => self.inspect(ctx)?,
            _ => {}
        }
        Ok(())
    }

    fn view_viewer(viewer: &Viewer, frame: &mut Frame, area: Rect, theme: &Theme) {
        let mut lines = vec![Line::from(Span::styled(viewer.name.clone(), theme.title_focused))];
        lines.extend(viewer.lines.iter().skip(viewer.scroll).cloned());
        frame.render_widget(Paragraph::new(lines), area);
    }
}

impl Pane for VariablesPane {
    fn update(&mut self, msg: &Message, ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        match msg {
            Message::Resize { height, .. } => {
                self.list.set_per_page(usize::from(height.saturating_sub(1)));
            }
            Message::Key(key) if self.viewer.is_some() => self.handle_viewer_key(key),
            Message::Key(key) => self.handle_key(key, ctx)?,
            msg if msg.is_lifecycle() => {
                self.refresh(ctx)?;
                if let Some(viewer) = &self.viewer {
                    if !self.list.items().iter().any(|v| v.name == viewer.name) {
                        self.viewer = None;
                    }
                }
            }
            _ => {}
        }
        Ok(Cmd::None)
    }

    fn view(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if area.height == 0 {
            return;
        }
        if let Some(viewer) = &self.viewer {
            Self::view_viewer(viewer, frame, area, theme);
            return;
        }

        let body = Rect::new(area.x, area.y, area.width, area.height - 1);
        let footer = Rect::new(area.x, area.bottom() - 1, area.width, 1);
        let rows: Vec<Line> = self
            .list
            .visible()
            .map(|(index, variable)| {
                let row = Line::from(vec![
                    Span::styled(variable.name.clone(), theme.current_file),
                    Span::styled(" = ", theme.muted),
                    Span::styled(variable.value.clone(), theme.text),
                ]);
                if index == self.list.selected_index() {
                    row.style(theme.selected)
                } else {
                    row
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(rows), body);
        frame.render_widget(
            Paragraph::new(self.list.footer()).style(theme.muted),
            footer,
        );
    }

    fn hint(&self) -> &str {
        if self.viewer.is_some() { VIEWER_HINT } else { HINT }
    }
}
