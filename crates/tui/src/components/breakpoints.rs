use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use debugger::{Breakpoint, BreakpointId, Location};
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
    text_input::TextInput,
};
use crate::{
    message::{Cmd, Message, WindowId},
    paths,
    theme::Theme,
};

const HINT: &str = "t: toggle, d: delete, c: condition, r: rename, enter: show";
const EDIT_HINT: &str = "enter: save, esc: cancel";

impl Keyed for Breakpoint {
    type Key = BreakpointId;

    fn key(&self) -> BreakpointId {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Condition,
    Alias,
}

impl Field {
    fn prompt(self) -> &'static str {
        match self {
            Field::Condition => "condition> ",
            Field::Alias => "name> ",
        }
    }
}

struct Editor {
    field: Field,
    target: BreakpointId,
    input: TextInput,
}

/// All breakpoints, with editing of conditions and names
pub struct BreakpointsPane {
    id: WindowId,
    root: Option<PathBuf>,
    list: SelectableList<Breakpoint>,
    editor: Option<Editor>,
}

impl BreakpointsPane {
    pub fn new(id: WindowId, root: Option<PathBuf>) -> Self {
        Self {
            id,
            root,
            list: SelectableList::default(),
            editor: None,
        }
    }

    pub fn list(&self) -> &SelectableList<Breakpoint> {
        &self.list
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    fn refresh(&mut self, ctx: &mut Context<'_>) -> eyre::Result<()> {
        let mut breakpoints = ctx.backend.breakpoints().wrap_err("listing breakpoints")?;
        breakpoints.sort_by_key(|bp| bp.id);
        self.list.replace(breakpoints);
        Ok(())
    }

    fn start_editing(&mut self, field: Field) {
        let Some(bp) = self.list.selected() else {
            return;
        };
        let current = match field {
            Field::Condition => bp.condition.clone(),
            Field::Alias => bp.alias.clone(),
        };
        self.editor = Some(Editor {
            field,
            target: bp.id,
            input: TextInput::with_value(current.unwrap_or_default()),
        });
    }

    fn handle_editor_key(&mut self, key: &KeyEvent, ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        match key.code {
            KeyCode::Esc => self.editor = None,
            KeyCode::Enter => {
                let Some(editor) = self.editor.take() else {
                    return Ok(Cmd::None);
                };
                let value = editor.input.value().trim();
                let bp = match editor.field {
                    Field::Condition => ctx
                        .backend
                        .add_condition_to_breakpoint(editor.target, value)
                        .wrap_err_with(|| {
                            format!("setting condition on breakpoint {}", editor.target)
                        })?,
                    Field::Alias => ctx
                        .backend
                        .add_alias_to_breakpoint(editor.target, value)
                        .wrap_err_with(|| format!("naming breakpoint {}", editor.target))?,
                };
                return Ok(Cmd::msg(Message::BreakpointAmended((&bp).into())));
            }
            _ => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.input.handle_key(key);
                }
            }
        }
        Ok(Cmd::None)
    }

    #[tracing::instrument(skip(self, ctx), level = "debug")]
    fn handle_key(&mut self, key: &KeyEvent, ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.list.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.list.select_previous(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => self.list.next_page(),
            KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => self.list.previous_page(),
            KeyCode::Char('c') => self.start_editing(Field::Condition),
            KeyCode::Char('r') => self.start_editing(Field::Alias),
            KeyCode::Char('t') => {
                if let Some(selected) = self.list.selected() {
                    let bp = ctx
                        .backend
                        .toggle_breakpoint(selected.id)
                        .wrap_err_with(|| format!("toggling breakpoint {}", selected.id))?;
                    return Ok(Cmd::msg(Message::BreakpointToggled((&bp).into())));
                }
            }
            KeyCode::Char('d') => {
                if let Some(selected) = self.list.selected() {
                    let bp = ctx
                        .backend
                        .clear_breakpoint(selected.id)
                        .wrap_err_with(|| format!("clearing breakpoint {}", selected.id))?;
                    return Ok(Cmd::msg(Message::BreakpointCleared((&bp).into())));
                }
            }
            KeyCode::Enter => {
                if let Some(bp) = self.list.selected() {
                    let location = Location::new(bp.filename.clone(), bp.line);
                    return Ok(Cmd::msg(Message::FileRequested(location)));
                }
            }
            _ => {}
        }
        Ok(Cmd::None)
    }

    fn name(&self, bp: &Breakpoint, width: usize) -> String {
        paths::truncate(&bp.display_name(self.root.as_deref()), width)
    }

    fn row(&self, bp: &Breakpoint, width: usize, theme: &Theme) -> Line<'static> {
        let mut spans = vec![theme.breakpoint_dot(bp.disabled)];
        let mut used = theme.glyphs.breakpoint.chars().count();
        if let Some(condition) = &bp.condition {
            let when = format!("when {condition} ");
            used += when.chars().count();
            spans.push(Span::styled(when, theme.condition));
        }
        spans.push(Span::styled(
            self.name(bp, width.saturating_sub(used)),
            theme.text,
        ));
        Line::from(spans)
    }
}

impl Pane for BreakpointsPane {
    fn update(&mut self, msg: &Message, ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        match msg {
            Message::Resize { height, .. } => {
                // one row for the footer
                self.list.set_per_page(usize::from(height.saturating_sub(1)));
            }
            Message::Key(key) if self.editor.is_some() => return self.handle_editor_key(key, ctx),
            Message::Key(key) => return self.handle_key(key, ctx),
            Message::BreakpointSelected(id) => {
                if self.list.select(id) {
                    return Ok(Cmd::msg(Message::WindowFocused(self.id)));
                }
            }
            msg if msg.is_lifecycle() => self.refresh(ctx)?,
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

        let rows: Vec<Line> = self
            .list
            .visible()
            .map(|(index, bp)| {
                let row = self.row(bp, width, theme);
                if index == self.list.selected_index() {
                    row.style(theme.selected)
                } else {
                    row
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(rows), body);

        match &self.editor {
            Some(editor) => editor
                .input
                .view(frame, footer, editor.field.prompt(), theme),
            None => frame.render_widget(
                Paragraph::new(self.list.footer()).style(theme.muted),
                footer,
            ),
        }
    }

    fn captures_input(&self) -> bool {
        self.editor.is_some()
    }

    fn hint(&self) -> &str {
        if self.editor.is_some() { EDIT_HINT } else { HINT }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crossterm::event::KeyModifiers;
    use debugger::{DebugBackend, testing::FakeBackend};
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::{cache::ContentCache, highlight::PlainHighlighter, message::BreakpointRef};

    struct Harness {
        backend: FakeBackend,
        cache: ContentCache,
        theme: Theme,
        pane: BreakpointsPane,
    }

    impl Harness {
        fn with_breakpoints(lines: &[usize]) -> Self {
            let mut backend = FakeBackend::stopped_at("/src/app/main.go", 1);
            for line in lines {
                backend
                    .create_breakpoint(Path::new("/src/app/main.go"), *line)
                    .unwrap();
            }
            let mut h = Self {
                backend,
                cache: ContentCache::new(1, Box::new(PlainHighlighter)),
                theme: Theme::default(),
                pane: BreakpointsPane::new(2, Some(PathBuf::from("/src/app"))),
            };
            h.send(Message::Resize {
                width: 40,
                height: 4,
            })
            .unwrap();
            h.send(Message::RefreshContent).unwrap();
            h
        }

        fn send(&mut self, msg: Message) -> eyre::Result<Cmd> {
            let mut ctx = Context {
                backend: &mut self.backend,
                cache: &mut self.cache,
                theme: &self.theme,
            };
            self.pane.update(&msg, &mut ctx)
        }

        fn key(&mut self, code: KeyCode) -> Cmd {
            self.send(Message::Key(KeyEvent::new(code, KeyModifiers::NONE)))
                .unwrap()
        }

        fn typed(&mut self, text: &str) {
            for c in text.chars() {
                self.key(KeyCode::Char(c));
            }
        }

        fn render(&self) -> Vec<String> {
            let mut terminal = Terminal::new(TestBackend::new(40, 4)).unwrap();
            terminal
                .draw(|frame| self.pane.view(frame, frame.area(), &self.theme))
                .unwrap();
            let buffer = terminal.backend().buffer();
            (0..4)
                .map(|y| {
                    (0..40)
                        .map(|x| buffer[(x, y)].symbol())
                        .collect::<String>()
                        .trim_end()
                        .to_string()
                })
                .collect()
        }
    }

    #[test]
    fn lists_breakpoints_by_id_with_pages() {
        let h = Harness::with_breakpoints(&[10, 5, 7, 20]);
        let ids: Vec<_> = h.pane.list().items().iter().map(|bp| bp.id.0).collect();
        assert_eq!(ids, [1, 2, 3, 4]);
        assert_eq!(
            h.render(),
            [" ● main.go:10", " ● main.go:5", " ● main.go:7", "page 1 of 2"]
        );
    }

    #[test]
    fn paging_with_h_and_l() {
        let mut h = Harness::with_breakpoints(&[10, 5, 7, 20]);
        h.key(KeyCode::Char('l'));
        assert_eq!(h.pane.list().selected_index(), 3);
        assert_eq!(h.render()[3], "page 2 of 2");
        h.key(KeyCode::Left);
        assert_eq!(h.pane.list().selected_index(), 0);
    }

    #[test]
    fn condition_editor_captures_input_and_commits() {
        let mut h = Harness::with_breakpoints(&[10]);
        h.key(KeyCode::Char('c'));
        assert!(h.pane.captures_input());
        h.typed("x > 3");
        let cmd = h.key(KeyCode::Enter);
        assert!(matches!(cmd, Cmd::Msg(Message::BreakpointAmended(_))));
        assert!(!h.pane.captures_input());
        assert_eq!(
            h.backend.breakpoint(BreakpointId(1)).unwrap().condition.as_deref(),
            Some("x > 3")
        );

        let amended = h.backend.breakpoint(BreakpointId(1)).unwrap();
        h.send(Message::BreakpointAmended(BreakpointRef::from(&amended)))
            .unwrap();
        assert_eq!(h.render()[0], " ● when x > 3 main.go:10");
    }

    #[test]
    fn editor_is_prefilled_and_empty_value_clears() {
        let mut h = Harness::with_breakpoints(&[10]);
        h.backend
            .add_condition_to_breakpoint(BreakpointId(1), "i == 2")
            .unwrap();
        h.send(Message::RefreshContent).unwrap();

        h.key(KeyCode::Char('c'));
        for _ in 0.."i == 2".len() {
            h.key(KeyCode::Backspace);
        }
        h.key(KeyCode::Enter);
        assert_eq!(h.backend.breakpoint(BreakpointId(1)).unwrap().condition, None);
    }

    #[test]
    fn escape_cancels_editing() {
        let mut h = Harness::with_breakpoints(&[10]);
        h.key(KeyCode::Char('r'));
        h.typed("loop");
        assert_eq!(h.key(KeyCode::Esc), Cmd::None);
        assert!(!h.pane.is_editing());
        assert_eq!(h.backend.call_count("add_alias_to_breakpoint"), 0);
    }

    #[test]
    fn aliases_replace_the_location() {
        let mut h = Harness::with_breakpoints(&[10]);
        h.key(KeyCode::Char('r'));
        h.typed("hot loop");
        h.key(KeyCode::Enter);
        h.send(Message::RefreshContent).unwrap();
        assert_eq!(h.render()[0], " ● hot loop");
    }

    #[test]
    fn selection_survives_refresh() {
        let mut h = Harness::with_breakpoints(&[10, 5, 7]);
        h.key(KeyCode::Down);
        h.key(KeyCode::Down);
        h.backend.clear_breakpoint(BreakpointId(1)).unwrap();
        h.send(Message::RefreshContent).unwrap();
        assert_eq!(h.pane.list().selected().map(|bp| bp.id), Some(BreakpointId(3)));
    }

    #[test]
    fn toggle_delete_and_show() {
        let mut h = Harness::with_breakpoints(&[10]);
        assert!(matches!(
            h.key(KeyCode::Char('t')),
            Cmd::Msg(Message::BreakpointToggled(_))
        ));
        assert!(h.backend.breakpoint(BreakpointId(1)).unwrap().disabled);

        assert_eq!(
            h.key(KeyCode::Enter),
            Cmd::msg(Message::FileRequested(Location::new("/src/app/main.go", 10)))
        );

        assert!(matches!(
            h.key(KeyCode::Char('d')),
            Cmd::Msg(Message::BreakpointCleared(_))
        ));
        assert!(h.backend.breakpoints().unwrap().is_empty());
    }

    #[test]
    fn selection_requests_focus() {
        let mut h = Harness::with_breakpoints(&[10, 5]);
        assert_eq!(
            h.send(Message::BreakpointSelected(BreakpointId(2))).unwrap(),
            Cmd::msg(Message::WindowFocused(2))
        );
        assert_eq!(h.pane.list().selected_index(), 1);
        assert_eq!(
            h.send(Message::BreakpointSelected(BreakpointId(9))).unwrap(),
            Cmd::None
        );
    }

    #[test]
    fn failed_refresh_keeps_the_list() {
        let mut h = Harness::with_breakpoints(&[10]);
        h.backend.fail_next(debugger::BackendError::NoLocation);
        assert!(h.send(Message::DebuggerStepped).is_err());
        assert_eq!(h.pane.list().len(), 1);
    }
}
