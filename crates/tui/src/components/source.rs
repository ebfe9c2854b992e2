use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use eyre::WrapErr;
use ratatui::{Frame, layout::Rect};

use super::{Context, Pane, viewport::Viewport};
use crate::{
    message::{Cmd, Message, WindowId},
    theme::Theme,
};

const HINT: &str = "n: next, s/S: step in/out, c: continue, r: restart, b: breakpoint, d: delete";

/// Source code of the executing file, with execution controls
pub struct SourcePane {
    id: WindowId,
    viewport: Viewport,
}

impl SourcePane {
    pub fn new(id: WindowId) -> Self {
        Self {
            id,
            viewport: Viewport::new(),
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn show_current_location(&mut self, ctx: &mut Context<'_>) -> eyre::Result<()> {
        let location = ctx
            .backend
            .current_file()
            .wrap_err("querying current location")?;
        self.viewport
            .open_file(&location.filename, location.line, ctx)
    }

    fn follow_execution(&mut self, ctx: &mut Context<'_>) -> eyre::Result<()> {
        let location = ctx
            .backend
            .current_file()
            .wrap_err("querying current location")?;
        if self.viewport.filename() != Some(location.filename.as_path()) {
            return self
                .viewport
                .open_file(&location.filename, location.line, ctx);
        }
        self.viewport.set_arrow(Some(location.line), ctx.theme);
        self.viewport.jump_to_line(location.line, ctx.theme);
        Ok(())
    }

    fn sync_breakpoints(&mut self, ctx: &mut Context<'_>) -> eyre::Result<()> {
        let Some(filename) = self.viewport.filename() else {
            return Ok(());
        };
        let breakpoints = ctx
            .backend
            .file_breakpoints(filename)
            .wrap_err("loading breakpoints")?;
        self.viewport.set_breakpoints(breakpoints, ctx.theme);
        Ok(())
    }

    fn toggle_or_create_breakpoint(&mut self, ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        let Some(filename) = self.viewport.filename() else {
            return Ok(Cmd::None);
        };
        let line = self.viewport.cursor();
        match self.viewport.breakpoint_at(line) {
            Some(existing) => {
                let bp = ctx
                    .backend
                    .toggle_breakpoint(existing.id)
                    .wrap_err_with(|| format!("toggling breakpoint {}", existing.id))?;
                Ok(Cmd::msg(Message::BreakpointToggled((&bp).into())))
            }
            None => {
                let bp = ctx
                    .backend
                    .create_breakpoint(filename, line)
                    .wrap_err_with(|| format!("creating breakpoint at line {line}"))?;
                tracing::debug!(id = %bp.id, line, "created breakpoint");
                Ok(Cmd::msg(Message::BreakpointCreated((&bp).into())))
            }
        }
    }

    fn clear_breakpoint(&mut self, ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        let Some(existing) = self.viewport.breakpoint_at(self.viewport.cursor()) else {
            return Ok(Cmd::None);
        };
        let bp = ctx
            .backend
            .clear_breakpoint(existing.id)
            .wrap_err_with(|| format!("clearing breakpoint {}", existing.id))?;
        Ok(Cmd::msg(Message::BreakpointCleared((&bp).into())))
    }

    #[tracing::instrument(skip(self, ctx), level = "debug")]
    fn handle_key(&mut self, key: &KeyEvent, ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        let theme = ctx.theme;
        let half_page = (self.viewport.height() / 2).max(1);
        let page = self.viewport.height().max(1);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let chord = key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);

        match key.code {
            KeyCode::Char('d') if ctrl => self.viewport.move_down(half_page, theme),
            KeyCode::Char('u') if ctrl => self.viewport.move_up(half_page, theme),
            // other chords are unbound
            _ if chord => {}
            KeyCode::Char('n') => {
                ctx.backend.next().wrap_err("stepping over")?;
                return Ok(Cmd::msg(Message::DebuggerStepped));
            }
            KeyCode::Char('s') => {
                ctx.backend.step_in().wrap_err("stepping in")?;
                return Ok(Cmd::msg(Message::DebuggerStepped));
            }
            KeyCode::Char('S') => {
                ctx.backend.step_out().wrap_err("stepping out")?;
                return Ok(Cmd::msg(Message::DebuggerStepped));
            }
            KeyCode::Char('c') => {
                ctx.backend.continue_().wrap_err("continuing execution")?;
                return Ok(Cmd::msg(Message::DebuggerStepped));
            }
            KeyCode::Char('r') => {
                ctx.backend.restart().wrap_err("restarting")?;
                return Ok(Cmd::msg(Message::DebuggerRestarted));
            }
            KeyCode::Char('b') => return self.toggle_or_create_breakpoint(ctx),
            KeyCode::Char('d') => return self.clear_breakpoint(ctx),
            KeyCode::Enter => {
                if let Some(bp) = self.viewport.breakpoint_at(self.viewport.cursor()) {
                    return Ok(Cmd::msg(Message::BreakpointSelected(bp.id)));
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.viewport.move_down(1, theme),
            KeyCode::Char('k') | KeyCode::Up => self.viewport.move_up(1, theme),
            KeyCode::PageDown => self.viewport.move_down(page, theme),
            KeyCode::PageUp => self.viewport.move_up(page, theme),
            KeyCode::Char('g') | KeyCode::Home => self.viewport.go_to_top(theme),
            KeyCode::Char('G') | KeyCode::End => self.viewport.go_to_bottom(theme),
            KeyCode::Char('z') => self.viewport.center(),
            _ => {}
        }
        Ok(Cmd::None)
    }
}

impl Pane for SourcePane {
    fn update(&mut self, msg: &Message, ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        match msg {
            Message::Resize { width, height } => self.viewport.resize(*width, *height),
            Message::Key(key) => return self.handle_key(key, ctx),
            Message::RefreshContent | Message::DebuggerRestarted => {
                self.show_current_location(ctx)?
            }
            Message::DebuggerStepped => self.follow_execution(ctx)?,
            Message::BreakpointCreated(_)
            | Message::BreakpointToggled(_)
            | Message::BreakpointCleared(_)
            | Message::BreakpointAmended(_) => self.sync_breakpoints(ctx)?,
            Message::FileRequested(location) => {
                self.viewport
                    .open_file(&location.filename, location.line, ctx)?;
                return Ok(Cmd::msg(Message::WindowFocused(self.id)));
            }
            _ => {}
        }
        Ok(Cmd::None)
    }

    fn view(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.viewport.view(frame, area, theme);
    }

    fn hint(&self) -> &str {
        HINT
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use debugger::{BreakpointId, DebugBackend, Location, testing::FakeBackend};

    use super::*;
    use crate::{cache::ContentCache, highlight::PlainHighlighter};

    struct Harness {
        dir: tempfile::TempDir,
        backend: FakeBackend,
        cache: ContentCache,
        theme: Theme,
        pane: SourcePane,
    }

    impl Harness {
        fn new(steps: Vec<(&str, usize)>) -> Self {
            let dir = tempfile::tempdir().unwrap();
            for name in ["main.go", "util.go"] {
                let lines: Vec<String> = (1..=30).map(|i| format!("// {name} {i}")).collect();
                std::fs::write(dir.path().join(name), lines.join("\n")).unwrap();
            }
            let steps: Vec<Location> = steps
                .into_iter()
                .map(|(name, line)| Location::new(dir.path().join(name), line))
                .collect();
            let backend = FakeBackend::stopped_at(dir.path().join("main.go"), 3).with_steps(steps);
            let mut h = Self {
                dir,
                backend,
                cache: ContentCache::new(5, Box::new(PlainHighlighter)),
                theme: Theme::default(),
                pane: SourcePane::new(4),
            };
            h.send(Message::Resize {
                width: 80,
                height: 10,
            })
            .unwrap();
            h.send(Message::RefreshContent).unwrap();
            h
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn send(&mut self, msg: Message) -> eyre::Result<Cmd> {
            let mut ctx = Context {
                backend: &mut self.backend,
                cache: &mut self.cache,
                theme: &self.theme,
            };
            self.pane.update(&msg, &mut ctx)
        }

        fn key(&mut self, code: KeyCode) -> eyre::Result<Cmd> {
            self.send(Message::Key(KeyEvent::new(code, KeyModifiers::NONE)))
        }

        fn filename(&self) -> Option<&Path> {
            self.pane.viewport().filename()
        }
    }

    #[test]
    fn refresh_opens_the_executing_file() {
        let h = Harness::new(vec![]);
        assert_eq!(h.filename(), Some(h.path("main.go").as_path()));
        assert_eq!(h.pane.viewport().cursor(), 3);
        assert_eq!(h.pane.viewport().arrow_line(), Some(3));
    }

    #[test]
    fn chorded_keys_do_not_drive_the_debugger() {
        let mut h = Harness::new(vec![("main.go", 4)]);
        for (c, modifiers) in [
            ('n', KeyModifiers::CONTROL),
            ('s', KeyModifiers::ALT),
            ('c', KeyModifiers::CONTROL),
            ('r', KeyModifiers::CONTROL),
            ('b', KeyModifiers::CONTROL),
        ] {
            let cmd = h
                .send(Message::Key(KeyEvent::new(KeyCode::Char(c), modifiers)))
                .unwrap();
            assert_eq!(cmd, Cmd::None, "{modifiers:?}+{c}");
        }
        for call in ["next", "step_in", "continue", "restart", "create_breakpoint"] {
            assert_eq!(h.backend.call_count(call), 0, "{call}");
        }
        assert_eq!(h.pane.viewport().arrow_line(), Some(3));

        // shifted letters arrive with SHIFT set
        let cmd = h
            .send(Message::Key(KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT)))
            .unwrap();
        assert_eq!(cmd, Cmd::msg(Message::DebuggerStepped));
        assert_eq!(h.backend.call_count("step_out"), 1);
    }

    #[test]
    fn stepping_within_a_file_moves_the_arrow() {
        let mut h = Harness::new(vec![("main.go", 4)]);
        let cmd = h.key(KeyCode::Char('n')).unwrap();
        assert_eq!(cmd, Cmd::msg(Message::DebuggerStepped));
        h.send(Message::DebuggerStepped).unwrap();
        assert_eq!(h.pane.viewport().arrow_line(), Some(4));
        assert_eq!(h.pane.viewport().cursor(), 4);
        assert_eq!(h.backend.call_count("file_breakpoints"), 1, "no reload");
    }

    #[test]
    fn stepping_into_another_file_opens_it() {
        let mut h = Harness::new(vec![("util.go", 20)]);
        h.key(KeyCode::Char('s')).unwrap();
        h.send(Message::DebuggerStepped).unwrap();
        assert_eq!(h.filename(), Some(h.path("util.go").as_path()));
        assert_eq!(h.pane.viewport().arrow_line(), Some(20));
        assert!(h.pane.viewport().visible_lines().contains(&20));
    }

    #[test]
    fn b_creates_then_toggles() {
        let mut h = Harness::new(vec![]);
        h.key(KeyCode::Char('j')).unwrap();
        let cmd = h.key(KeyCode::Char('b')).unwrap();
        let Cmd::Msg(Message::BreakpointCreated(created)) = cmd else {
            panic!("unexpected {cmd:?}");
        };
        assert_eq!(created.line, 4);
        h.send(Message::BreakpointCreated(created.clone())).unwrap();
        assert!(h.pane.viewport().breakpoint_at(4).is_some());

        let cmd = h.key(KeyCode::Char('b')).unwrap();
        assert!(matches!(cmd, Cmd::Msg(Message::BreakpointToggled(_))));
        h.send(Message::BreakpointToggled(created)).unwrap();
        assert!(h.pane.viewport().breakpoint_at(4).unwrap().disabled);
    }

    #[test]
    fn enter_on_a_breakpoint_selects_it() {
        let mut h = Harness::new(vec![]);
        assert_eq!(h.key(KeyCode::Enter).unwrap(), Cmd::None);
        let file = h.path("main.go");
        let bp = h.backend.create_breakpoint(&file, 3).unwrap();
        h.send(Message::BreakpointCreated((&bp).into())).unwrap();
        assert_eq!(
            h.key(KeyCode::Enter).unwrap(),
            Cmd::msg(Message::BreakpointSelected(BreakpointId(1)))
        );
    }

    #[test]
    fn d_clears_the_breakpoint_under_the_cursor() {
        let mut h = Harness::new(vec![]);
        let file = h.path("main.go");
        let bp = h.backend.create_breakpoint(&file, 3).unwrap();
        h.send(Message::BreakpointCreated((&bp).into())).unwrap();
        let cmd = h.key(KeyCode::Char('d')).unwrap();
        assert!(matches!(cmd, Cmd::Msg(Message::BreakpointCleared(_))));
        assert!(h.backend.breakpoints().unwrap().is_empty());
    }

    #[test]
    fn file_requests_take_focus() {
        let mut h = Harness::new(vec![]);
        let cmd = h
            .send(Message::FileRequested(Location::new(h.path("util.go"), 12)))
            .unwrap();
        assert_eq!(cmd, Cmd::msg(Message::WindowFocused(4)));
        assert_eq!(h.pane.viewport().cursor(), 12);
        assert_eq!(h.pane.viewport().arrow_line(), None);
    }

    #[test]
    fn failed_step_reports_and_keeps_state() {
        let mut h = Harness::new(vec![]);
        let err = h.key(KeyCode::Char('n')).unwrap_err();
        assert!(
            err.chain()
                .any(|e| e.downcast_ref::<debugger::BackendError>().is_some())
        );
        assert_eq!(h.pane.viewport().arrow_line(), Some(3));
    }

    #[test]
    fn half_page_movement() {
        let mut h = Harness::new(vec![]);
        h.send(Message::Key(KeyEvent::new(
            KeyCode::Char('d'),
            KeyModifiers::CONTROL,
        )))
        .unwrap();
        assert_eq!(h.pane.viewport().cursor(), 8);
        assert_eq!(h.backend.call_count("clear_breakpoint"), 0);
    }
}
