//! Scrollable, line-addressable view of one source file.
//!
//! Lines are rendered once when a file is opened and afterwards only the
//! lines whose gutter changes are rendered again: the old and new cursor
//! lines, the old and new arrow lines, and lines whose breakpoint changed.
use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
};

use debugger::{BackendError, Breakpoint};
use eyre::WrapErr;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::Context;
use crate::{
    cache::Content,
    theme::{Marker, Theme},
};

/// Gutter marker for `line`, given the arrow line and the breakpoints of the file
pub fn marker_for(
    line: usize,
    arrow: Option<usize>,
    breakpoints: &HashMap<usize, Breakpoint>,
) -> Marker {
    let breakpoint = breakpoints.get(&line);
    if arrow == Some(line) {
        match breakpoint {
            Some(bp) if !bp.disabled => Marker::ArrowInBreakpoint,
            _ => Marker::Arrow,
        }
    } else {
        match breakpoint {
            Some(bp) if bp.disabled => Marker::DisabledBreakpoint,
            Some(_) => Marker::Breakpoint,
            None => Marker::Blank,
        }
    }
}

pub struct Viewport {
    filename: Option<PathBuf>,
    content: Content,
    rendered: Vec<Line<'static>>,
    /// 1-based
    cursor: usize,
    /// index of the first visible line
    top: usize,
    arrow: Option<usize>,
    breakpoints: HashMap<usize, Breakpoint>,
    width: u16,
    height: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            filename: None,
            content: Vec::new().into(),
            rendered: Vec::new(),
            cursor: 1,
            top: 0,
            arrow: None,
            breakpoints: HashMap::new(),
            width: 0,
            height: 0,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn arrow_line(&self) -> Option<usize> {
        self.arrow
    }

    pub fn breakpoints(&self) -> &HashMap<usize, Breakpoint> {
        &self.breakpoints
    }

    pub fn breakpoint_at(&self, line: usize) -> Option<&Breakpoint> {
        self.breakpoints.get(&line)
    }

    pub fn line_count(&self) -> usize {
        self.content.len()
    }

    pub fn height(&self) -> usize {
        usize::from(self.height)
    }

    pub fn rendered(&self) -> &[Line<'static>] {
        &self.rendered
    }

    /// 1-based line numbers currently on screen
    pub fn visible_lines(&self) -> std::ops::RangeInclusive<usize> {
        let end = (self.top + self.height()).min(self.line_count());
        self.top + 1..=end
    }

    /// Load `filename` and place the cursor on `line`.
    ///
    /// Nothing changes when any of the lookups fail.
    pub fn open_file(
        &mut self,
        filename: &Path,
        line: usize,
        ctx: &mut Context<'_>,
    ) -> eyre::Result<()> {
        tracing::debug!(filename = %filename.display(), line, "opening file");
        let content = ctx.cache.get(filename)?;
        let breakpoints = ctx
            .backend
            .file_breakpoints(filename)
            .wrap_err_with(|| format!("loading breakpoints for {}", filename.display()))?;
        let arrow = match ctx.backend.current_file() {
            Ok(location) => (location.filename == filename).then_some(location.line),
            Err(BackendError::ProcessExited { .. } | BackendError::NoLocation) => None,
            Err(e) => return Err(e).wrap_err("querying current location"),
        };

        self.filename = Some(filename.to_path_buf());
        self.content = content;
        self.breakpoints = breakpoints;
        self.arrow = arrow;
        self.cursor = line.clamp(1, self.line_count().max(1));
        self.rendered = (1..=self.line_count())
            .map(|n| self.format_line(n, ctx.theme))
            .collect();
        self.center();
        Ok(())
    }

    /// Move the cursor, keeping the scroll position unless the cursor leaves the screen.
    ///
    /// Lines outside the file are ignored.
    pub fn set_cursor(&mut self, line: usize, theme: &Theme) {
        if line < 1 || line > self.line_count() || line == self.cursor {
            return;
        }
        let previous = std::mem::replace(&mut self.cursor, line);
        self.render_line(previous, theme);
        self.render_line(line, theme);
        self.ensure_cursor_visible();
    }

    /// Move the cursor and center the view on it
    pub fn jump_to_line(&mut self, line: usize, theme: &Theme) {
        self.set_cursor(line.clamp(1, self.line_count().max(1)), theme);
        self.center();
    }

    pub fn move_down(&mut self, lines: usize, theme: &Theme) {
        let target = (self.cursor + lines).min(self.line_count());
        self.set_cursor(target, theme);
    }

    pub fn move_up(&mut self, lines: usize, theme: &Theme) {
        let target = self.cursor.saturating_sub(lines).max(1);
        self.set_cursor(target, theme);
    }

    pub fn go_to_top(&mut self, theme: &Theme) {
        self.set_cursor(1, theme);
        self.top = 0;
    }

    pub fn go_to_bottom(&mut self, theme: &Theme) {
        self.set_cursor(self.line_count(), theme);
        self.top = self.max_top();
    }

    /// Move the execution arrow, re-rendering the lines it left and entered
    pub fn set_arrow(&mut self, line: Option<usize>, theme: &Theme) {
        let previous = std::mem::replace(&mut self.arrow, line);
        if previous == line {
            return;
        }
        for line in previous.into_iter().chain(line) {
            self.render_line(line, theme);
        }
    }

    /// Replace the breakpoint overlay, re-rendering lines whose breakpoint changed
    pub fn set_breakpoints(&mut self, breakpoints: HashMap<usize, Breakpoint>, theme: &Theme) {
        let changed: BTreeSet<usize> = self
            .breakpoints
            .keys()
            .chain(breakpoints.keys())
            .copied()
            .filter(|line| self.breakpoints.get(line) != breakpoints.get(line))
            .collect();
        self.breakpoints = breakpoints;
        for line in changed {
            self.render_line(line, theme);
        }
    }

    /// Recompute the rendering of one line; lines outside the file are ignored
    pub fn render_line(&mut self, line: usize, theme: &Theme) {
        if line < 1 || line > self.line_count() {
            return;
        }
        self.rendered[line - 1] = self.format_line(line, theme);
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.ensure_cursor_visible();
    }

    /// Scroll so the cursor sits in the middle of the screen
    pub fn center(&mut self) {
        let offset = (self.cursor - 1).saturating_sub(self.height() / 2);
        self.top = offset.min(self.max_top());
    }

    fn max_top(&self) -> usize {
        self.line_count().saturating_sub(self.height())
    }

    fn ensure_cursor_visible(&mut self) {
        let index = self.cursor - 1;
        if index < self.top || index >= self.top + self.height() {
            self.center();
        }
    }

    fn format_line(&self, line: usize, theme: &Theme) -> Line<'static> {
        let gutter_style = if line == self.cursor {
            theme.cursor_gutter
        } else {
            theme.gutter
        };
        let source = &self.content[line - 1];
        let mut spans = Vec::with_capacity(source.spans.len() + 2);
        spans.push(Span::styled(format!("{line:>4} │ "), gutter_style));
        spans.push(theme.marker(marker_for(line, self.arrow, &self.breakpoints)));
        spans.extend(source.spans.iter().cloned());
        Line::from(spans)
    }

    pub fn view(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if self.filename.is_none() {
            frame.render_widget(Paragraph::new("no file open").style(theme.muted), area);
            return;
        }
        let end = (self.top + usize::from(area.height)).min(self.rendered.len());
        let start = self.top.min(end);
        for (row, line) in self.rendered[start..end].iter().enumerate() {
            let row_area = Rect::new(area.x, area.y + row as u16, area.width, 1);
            frame.render_widget(line, row_area);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use debugger::{BreakpointId, DebugBackend, testing::FakeBackend};

    use super::*;
    use crate::{cache::ContentCache, highlight::PlainHighlighter};

    struct Harness {
        _dir: tempfile::TempDir,
        file: PathBuf,
        other: PathBuf,
        backend: FakeBackend,
        cache: ContentCache,
        theme: Theme,
        viewport: Viewport,
    }

    impl Harness {
        /// A 10 line file with execution stopped on line 1
        fn new(height: u16) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let file = dir.path().join("main.go");
            let lines: Vec<String> = (1..=10).map(|i| format!("line {i}")).collect();
            std::fs::write(&file, lines.join("\n")).unwrap();
            let other = dir.path().join("other.go");
            std::fs::write(&other, "package other\n\nfunc f() {}\n").unwrap();

            let backend = FakeBackend::stopped_at(&file, 1);
            let mut viewport = Viewport::new();
            viewport.resize(80, height);
            Self {
                _dir: dir,
                file,
                other,
                backend,
                cache: ContentCache::new(5, Box::new(PlainHighlighter)),
                theme: Theme::default(),
                viewport,
            }
        }

        fn open(&mut self, line: usize) -> eyre::Result<()> {
            let file = self.file.clone();
            self.open_path(&file, line)
        }

        fn open_path(&mut self, file: &Path, line: usize) -> eyre::Result<()> {
            let mut ctx = Context {
                backend: &mut self.backend,
                cache: &mut self.cache,
                theme: &self.theme,
            };
            self.viewport.open_file(file, line, &mut ctx)
        }

        fn text(&self, line: usize) -> String {
            self.viewport.rendered()[line - 1]
                .spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect()
        }

        fn marker(&self, line: usize) -> String {
            self.viewport.rendered()[line - 1].spans[1].content.to_string()
        }
    }

    #[test]
    fn open_file_renders_every_line() {
        let mut h = Harness::new(5);
        h.open(1).unwrap();
        assert_eq!(h.viewport.line_count(), 10);
        assert_eq!(h.viewport.rendered().len(), 10);
        assert_eq!(h.text(1), "   1 │  ▶ line 1");
        assert_eq!(h.text(10), "  10 │    line 10");
        assert_eq!(h.viewport.arrow_line(), Some(1));
        assert_eq!(h.viewport.rendered()[0].spans[0].style, h.theme.cursor_gutter);
        assert_eq!(h.viewport.rendered()[1].spans[0].style, h.theme.gutter);
    }

    #[test]
    fn open_file_is_idempotent() {
        let mut h = Harness::new(5);
        let file = h.file.clone();
        h.backend.create_breakpoint(&file, 4).unwrap();
        h.open(6).unwrap();
        let first = (
            h.viewport.rendered().to_vec(),
            h.viewport.arrow_line(),
            h.viewport.breakpoints().clone(),
            h.viewport.top(),
        );
        h.open(6).unwrap();
        let second = (
            h.viewport.rendered().to_vec(),
            h.viewport.arrow_line(),
            h.viewport.breakpoints().clone(),
            h.viewport.top(),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_cursor_moves_are_ignored() {
        let mut h = Harness::new(5);
        h.open(3).unwrap();
        for line in [0, 11, 500] {
            h.viewport.set_cursor(line, &h.theme);
            assert_eq!(h.viewport.cursor(), 3);
        }
    }

    #[test]
    fn set_cursor_scrolls_only_when_leaving_the_screen() {
        let mut h = Harness::new(4);
        h.open(1).unwrap();
        assert_eq!(h.viewport.top(), 0);

        h.viewport.set_cursor(4, &h.theme);
        assert_eq!(h.viewport.top(), 0, "line 4 is still visible");

        h.viewport.set_cursor(5, &h.theme);
        assert_eq!(h.viewport.top(), 2, "recentered around line 5");
        assert!(h.viewport.visible_lines().contains(&5));
    }

    #[test]
    fn set_cursor_rerenders_both_gutters() {
        let mut h = Harness::new(5);
        h.open(2).unwrap();
        h.viewport.set_cursor(3, &h.theme);
        assert_eq!(h.viewport.rendered()[1].spans[0].style, h.theme.gutter);
        assert_eq!(h.viewport.rendered()[2].spans[0].style, h.theme.cursor_gutter);
    }

    #[test]
    fn jump_always_recenters() {
        let mut h = Harness::new(4);
        h.open(1).unwrap();
        h.viewport.jump_to_line(6, &h.theme);
        assert_eq!(h.viewport.cursor(), 6);
        assert_eq!(h.viewport.top(), 3);

        h.viewport.jump_to_line(10, &h.theme);
        assert_eq!(h.viewport.top(), 6, "clamped to the last screen");

        h.viewport.jump_to_line(99, &h.theme);
        assert_eq!(h.viewport.cursor(), 10);
    }

    #[test]
    fn arrow_inside_enabled_breakpoint() {
        let mut h = Harness::new(5);
        let file = h.file.clone();
        h.backend.create_breakpoint(&file, 1).unwrap();
        h.open(1).unwrap();
        assert_eq!(h.marker(1), h.theme.glyphs.arrow_in_breakpoint);
        assert_eq!(
            marker_for(1, h.viewport.arrow_line(), h.viewport.breakpoints()),
            Marker::ArrowInBreakpoint
        );
    }

    #[test]
    fn marker_precedence() {
        let bp = |disabled| Breakpoint {
            id: BreakpointId(1),
            filename: PathBuf::from("main.go"),
            line: 3,
            disabled,
            condition: None,
            alias: None,
        };
        let enabled = HashMap::from([(3, bp(false))]);
        let disabled = HashMap::from([(3, bp(true))]);
        let none = HashMap::new();

        assert_eq!(marker_for(3, Some(3), &enabled), Marker::ArrowInBreakpoint);
        assert_eq!(marker_for(3, Some(3), &disabled), Marker::Arrow);
        assert_eq!(marker_for(3, Some(3), &none), Marker::Arrow);
        assert_eq!(marker_for(3, None, &enabled), Marker::Breakpoint);
        assert_eq!(marker_for(3, Some(4), &disabled), Marker::DisabledBreakpoint);
        assert_eq!(marker_for(3, None, &none), Marker::Blank);
    }

    #[test]
    fn breakpoint_overlay_updates_changed_lines() {
        let mut h = Harness::new(5);
        h.open(1).unwrap();
        let file = h.file.clone();
        let bp = h.backend.create_breakpoint(&file, 6).unwrap();
        let breakpoints = h.backend.file_breakpoints(&file).unwrap();
        h.viewport.set_breakpoints(breakpoints, &h.theme);
        assert_eq!(h.marker(6), h.theme.glyphs.breakpoint);

        h.backend.toggle_breakpoint(bp.id).unwrap();
        let breakpoints = h.backend.file_breakpoints(&file).unwrap();
        h.viewport.set_breakpoints(breakpoints, &h.theme);
        assert_eq!(
            h.viewport.rendered()[5].spans[1].style,
            h.theme.disabled_breakpoint
        );

        h.viewport.set_breakpoints(HashMap::new(), &h.theme);
        assert_eq!(h.marker(6), h.theme.glyphs.blank);
    }

    #[test]
    fn arrow_moves_rerender_old_and_new_lines() {
        let mut h = Harness::new(5);
        h.open(1).unwrap();
        h.viewport.set_arrow(Some(2), &h.theme);
        assert_eq!(h.marker(1), h.theme.glyphs.blank);
        assert_eq!(h.marker(2), h.theme.glyphs.arrow);
    }

    #[test]
    fn arrow_only_shows_in_the_executing_file() {
        let mut h = Harness::new(5);
        let other = h.other.clone();
        h.open_path(&other, 3).unwrap();
        assert_eq!(h.viewport.arrow_line(), None);
        assert_eq!(h.viewport.line_count(), 3);
        assert_eq!(h.viewport.cursor(), 3);
    }

    #[test]
    fn failed_open_leaves_state_alone() {
        let mut h = Harness::new(5);
        h.open(4).unwrap();
        let before = h.viewport.rendered().to_vec();

        h.backend.fail_next(BackendError::NoLocation);
        let other = h.other.clone();
        assert!(h.open_path(&other, 1).is_err());
        assert_eq!(h.viewport.filename(), Some(h.file.as_path()));
        assert_eq!(h.viewport.cursor(), 4);
        assert_eq!(h.viewport.rendered(), before.as_slice());

        let missing = h.file.with_file_name("missing.go");
        assert!(h.open_path(&missing, 1).is_err());
        assert_eq!(h.viewport.filename(), Some(h.file.as_path()));
    }

    #[test]
    fn exited_process_still_opens_files() {
        let mut h = Harness::new(5);
        h.backend = FakeBackend::stopped_at(h.file.clone(), 1).with_steps(Vec::new());
        assert!(h.backend.next().unwrap_err().is_process_exit());
        h.open(2).unwrap();
        assert_eq!(h.viewport.arrow_line(), None);
        assert!(h.backend.location().is_none());
    }

    #[test]
    fn empty_files_ignore_cursor_moves() {
        let mut h = Harness::new(5);
        let empty = h.file.with_file_name("empty.go");
        std::fs::write(&empty, "").unwrap();
        h.open_path(&empty, 7).unwrap();
        assert_eq!(h.viewport.line_count(), 0);
        assert_eq!(h.viewport.cursor(), 1);
        h.viewport.set_cursor(1, &h.theme);
        h.viewport.move_down(3, &h.theme);
        h.viewport.jump_to_line(2, &h.theme);
        assert_eq!(h.viewport.cursor(), 1);
        assert_eq!(h.viewport.top(), 0);
    }
}
