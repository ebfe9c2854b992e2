//! Debuggee output and the command prompt.
use std::collections::VecDeque;

use crossterm::event::{KeyCode, KeyEvent};
use debugger::{Output, OutputSource};
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::{Context, Pane, text_input::TextInput};
use crate::{
    message::{Cmd, Message, WindowId},
    theme::Theme,
};

pub const OUTPUT_TITLE: &str = "Output";
pub const COMMAND_TITLE: &str = "Command Mode";

const PROMPT: &str = "> ";
const MAX_ENTRIES: usize = 10_000;
const HINT: &str = "i: command mode, j/k: scroll, G: follow";
const COMMAND_HINT: &str = "enter: run, up/down: history, esc: leave";
const HELP: &[&str] = &[
    "print <expr>, p <expr>   evaluate an expression in the current frame",
    "help                     show this message",
];

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Output(Output),
    Highlighted(Line<'static>),
    Error(String),
}

impl Entry {
    fn render(&self, theme: &Theme) -> Line<'static> {
        match self {
            Entry::Output(output) => {
                let style = match output.source {
                    OutputSource::Stdout => theme.text,
                    OutputSource::Stderr => theme.stderr,
                    OutputSource::Command => theme.command,
                };
                Line::from(Span::styled(output.content.clone(), style))
            }
            Entry::Highlighted(line) => line.clone(),
            Entry::Error(message) => Line::from(Span::styled(message.clone(), theme.error)),
        }
    }

    fn text(&self) -> String {
        match self {
            Entry::Output(output) => output.content.clone(),
            Entry::Highlighted(line) => line.spans.iter().map(|s| s.content.as_ref()).collect(),
            Entry::Error(message) => message.clone(),
        }
    }
}

/// Previously run commands, browsed with up and down
#[derive(Debug, Default)]
struct History {
    entries: Vec<String>,
    position: Option<usize>,
}

impl History {
    fn push(&mut self, command: &str) {
        if self.entries.last().map(String::as_str) != Some(command) {
            self.entries.push(command.to_string());
        }
        self.position = None;
    }

    fn previous(&mut self) -> Option<&str> {
        let position = match self.position {
            None => self.entries.len().checked_sub(1)?,
            Some(position) => position.saturating_sub(1),
        };
        self.position = Some(position);
        self.entries.get(position).map(String::as_str)
    }

    /// `None` once past the newest entry
    fn next(&mut self) -> Option<&str> {
        let position = self.position? + 1;
        if position >= self.entries.len() {
            self.position = None;
            return None;
        }
        self.position = Some(position);
        self.entries.get(position).map(String::as_str)
    }
}

pub struct OutputPane {
    id: WindowId,
    entries: VecDeque<Entry>,
    /// index of the first visible entry
    top: usize,
    follow: bool,
    height: u16,
    command_mode: bool,
    input: TextInput,
    history: History,
}

impl OutputPane {
    pub fn new(id: WindowId) -> Self {
        Self {
            id,
            entries: VecDeque::new(),
            top: 0,
            follow: true,
            height: 0,
            command_mode: false,
            input: TextInput::default(),
            history: History::default(),
        }
    }

    pub fn in_command_mode(&self) -> bool {
        self.command_mode
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    /// Plain text of every line, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(Entry::text).collect()
    }

    fn rows(&self) -> usize {
        let reserved = usize::from(self.command_mode);
        usize::from(self.height).saturating_sub(reserved)
    }

    fn max_top(&self) -> usize {
        self.entries.len().saturating_sub(self.rows())
    }

    fn push(&mut self, entry: Entry) {
        self.entries.push_back(entry);
        if self.entries.len() > MAX_ENTRIES {
            self.entries.pop_front();
            self.top = self.top.saturating_sub(1);
        }
        if self.follow {
            self.top = self.max_top();
        }
    }

    fn scroll_to(&mut self, top: usize) {
        self.top = top.min(self.max_top());
        self.follow = self.top == self.max_top();
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.top = 0;
        self.follow = true;
    }

    #[tracing::instrument(skip_all, fields(command = %self.input.value()))]
    fn run_command(&mut self, ctx: &mut Context<'_>) {
        let command = self.input.take();
        let command = command.trim();
        if command.is_empty() {
            return;
        }
        self.history.push(command);
        self.push(Entry::Output(Output::new(
            OutputSource::Command,
            format!("{PROMPT}{command}"),
        )));

        let (verb, rest) = command.split_once(' ').unwrap_or((command, ""));
        let rest = rest.trim();
        match verb {
            "print" | "p" if rest.is_empty() => {
                self.push(Entry::Error("usage: print <expr>".to_string()));
            }
            "print" | "p" => self.print(rest, ctx),
            "help" => {
                for line in HELP {
                    self.push(Entry::Output(Output::new(OutputSource::Command, *line)));
                }
            }
            other => self.push(Entry::Error(format!("unknown command: {other}"))),
        }
    }

    fn print(&mut self, expr: &str, ctx: &mut Context<'_>) {
        let variable = match ctx.backend.eval_variable(expr) {
            Ok(variable) => variable,
            Err(e) => {
                tracing::debug!(error = %e, expr, "evaluation failed");
                self.push(Entry::Error(e.to_string()));
                return;
            }
        };
        match ctx
            .cache
            .highlighter()
            .highlight(variable.detailed_value(), "go")
        {
            Ok(lines) => {
                for line in lines {
                    self.push(Entry::Highlighted(line));
                }
            }
            Err(e) => {
                tracing::warn!(error = ?e, "highlighting value");
                for line in variable.detailed_value().lines() {
                    self.push(Entry::Output(Output::new(OutputSource::Command, line)));
                }
            }
        }
    }

    fn handle_command_key(&mut self, key: &KeyEvent, ctx: &mut Context<'_>) -> Cmd {
        match key.code {
            KeyCode::Esc => {
                self.command_mode = false;
                self.input.clear();
                self.history.position = None;
                return Cmd::msg(Message::WindowTitleChanged {
                    id: self.id,
                    title: OUTPUT_TITLE.to_string(),
                });
            }
            KeyCode::Enter => {
                self.follow = true;
                self.run_command(ctx);
            }
            KeyCode::Up => {
                if let Some(command) = self.history.previous() {
                    let command = command.to_string();
                    self.input.set_value(command);
                }
            }
            KeyCode::Down => match self.history.next() {
                Some(command) => {
                    let command = command.to_string();
                    self.input.set_value(command);
                }
                None => self.input.clear(),
            },
            _ => {
                self.input.handle_key(key);
            }
        }
        Cmd::None
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Cmd {
        match key.code {
            KeyCode::Char('i') => {
                self.command_mode = true;
                if self.follow {
                    self.top = self.max_top();
                }
                return Cmd::msg(Message::WindowTitleChanged {
                    id: self.id,
                    title: COMMAND_TITLE.to_string(),
                });
            }
            KeyCode::Char('j') | KeyCode::Down => self.scroll_to(self.top + 1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_to(self.top.saturating_sub(1)),
            KeyCode::Char('g') | KeyCode::Home => self.scroll_to(0),
            KeyCode::Char('G') | KeyCode::End => self.scroll_to(self.max_top()),
            _ => {}
        }
        Cmd::None
    }
}

impl Pane for OutputPane {
    fn init(&mut self, _ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        Ok(Cmd::AwaitOutput)
    }

    fn update(&mut self, msg: &Message, ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        let cmd = match msg {
            Message::Resize { height, .. } => {
                self.height = *height;
                self.scroll_to(if self.follow { self.max_top() } else { self.top });
                Cmd::None
            }
            Message::OutputReceived(output) => {
                self.push(Entry::Output(output.clone()));
                Cmd::AwaitOutput
            }
            Message::DebuggerRestarted => {
                self.clear();
                Cmd::None
            }
            Message::Key(key) if self.command_mode => self.handle_command_key(key, ctx),
            Message::Key(key) => self.handle_key(key),
            _ => Cmd::None,
        };
        Ok(cmd)
    }

    fn view(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let rows = if self.command_mode {
            area.height.saturating_sub(1)
        } else {
            area.height
        };
        let lines: Vec<Line> = self
            .entries
            .iter()
            .skip(self.top)
            .take(usize::from(rows))
            .map(|entry| entry.render(theme))
            .collect();
        frame.render_widget(
            Paragraph::new(lines),
            Rect::new(area.x, area.y, area.width, rows),
        );

        if self.command_mode && area.height > 0 {
            let prompt = Rect::new(area.x, area.bottom() - 1, area.width, 1);
            self.input.view(frame, prompt, PROMPT, theme);
        }
    }

    fn captures_input(&self) -> bool {
        self.command_mode
    }

    fn hint(&self) -> &str {
        if self.command_mode { COMMAND_HINT } else { HINT }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;
    use debugger::{Variable, testing::FakeBackend};

    use super::*;
    use crate::{cache::ContentCache, highlight::PlainHighlighter};

    struct Harness {
        backend: FakeBackend,
        cache: ContentCache,
        theme: Theme,
        pane: OutputPane,
    }

    impl Harness {
        fn new(height: u16) -> Self {
            let backend = FakeBackend::stopped_at("main.go", 1).with_evaluation(
                "p",
                Variable {
                    name: "p".to_string(),
                    value: "main.Person {Age: 31}".to_string(),
                    multiline_value: Some("main.Person {\n  Age: 31,\n}".to_string()),
                },
            );
            let mut h = Self {
                backend,
                cache: ContentCache::new(1, Box::new(PlainHighlighter)),
                theme: Theme::default(),
                pane: OutputPane::new(5),
            };
            h.send(Message::Resize {
                width: 40,
                height,
            });
            h
        }

        fn send(&mut self, msg: Message) -> Cmd {
            let mut ctx = Context {
                backend: &mut self.backend,
                cache: &mut self.cache,
                theme: &self.theme,
            };
            self.pane.update(&msg, &mut ctx).unwrap()
        }

        fn key(&mut self, code: KeyCode) -> Cmd {
            self.send(Message::Key(KeyEvent::new(code, KeyModifiers::NONE)))
        }

        fn run(&mut self, command: &str) {
            for c in command.chars() {
                self.key(KeyCode::Char(c));
            }
            self.key(KeyCode::Enter);
        }

        fn stdout(&mut self, line: &str) -> Cmd {
            self.send(Message::OutputReceived(Output::new(OutputSource::Stdout, line)))
        }
    }

    #[test]
    fn received_output_rearms_the_subscription() {
        let mut h = Harness::new(5);
        assert_eq!(h.stdout("hello"), Cmd::AwaitOutput);
        assert_eq!(h.pane.lines(), ["hello"]);
    }

    #[test]
    fn follows_the_tail_until_scrolled_back() {
        let mut h = Harness::new(3);
        for i in 0..5 {
            h.stdout(&format!("line {i}"));
        }
        assert_eq!(h.pane.top, 2);

        h.key(KeyCode::Char('k'));
        h.stdout("line 5");
        assert_eq!(h.pane.top, 1, "scrolled back, stays put");

        h.key(KeyCode::Char('G'));
        h.stdout("line 6");
        assert_eq!(h.pane.top, 4);
    }

    #[test]
    fn scrollback_drops_the_oldest_lines() {
        let mut h = Harness::new(3);
        for i in 0..MAX_ENTRIES {
            h.stdout(&format!("line {i}"));
        }
        h.key(KeyCode::Char('k'));
        let top = h.pane.top;

        h.stdout("newest");
        h.stdout("newer still");
        let lines = h.pane.lines();
        assert_eq!(lines.len(), MAX_ENTRIES);
        assert_eq!(lines[0], "line 2");
        assert_eq!(lines[MAX_ENTRIES - 1], "newer still");
        assert_eq!(h.pane.top, top - 2, "the scrolled view keeps showing the same lines");
    }

    #[test]
    fn command_mode_round_trip() {
        let mut h = Harness::new(5);
        assert_eq!(
            h.key(KeyCode::Char('i')),
            Cmd::msg(Message::WindowTitleChanged {
                id: 5,
                title: COMMAND_TITLE.to_string()
            })
        );
        assert!(h.pane.captures_input());

        h.run("print p");
        assert!(h.pane.in_command_mode(), "stays in command mode");
        assert_eq!(
            h.pane.lines(),
            ["> print p", "main.Person {", "  Age: 31,", "}"]
        );

        assert_eq!(
            h.key(KeyCode::Esc),
            Cmd::msg(Message::WindowTitleChanged {
                id: 5,
                title: OUTPUT_TITLE.to_string()
            })
        );
        assert!(!h.pane.captures_input());
    }

    #[test]
    fn evaluation_errors_are_shown_inline() {
        let mut h = Harness::new(5);
        h.key(KeyCode::Char('i'));
        h.run("p missing");
        let lines = h.pane.lines();
        assert_eq!(lines[0], "> p missing");
        assert!(lines[1].contains("could not find symbol value for missing"), "{lines:?}");
    }

    #[test]
    fn unknown_commands_and_usage() {
        let mut h = Harness::new(5);
        h.key(KeyCode::Char('i'));
        h.run("frobnicate now");
        h.run("print");
        assert_eq!(
            h.pane.lines(),
            [
                "> frobnicate now",
                "unknown command: frobnicate",
                "> print",
                "usage: print <expr>"
            ]
        );
        h.run("help");
        assert_eq!(h.pane.lines().len(), 5 + HELP.len());
    }

    #[test]
    fn history_navigation() {
        let mut h = Harness::new(5);
        h.key(KeyCode::Char('i'));
        h.run("p a");
        h.run("p b");
        h.key(KeyCode::Up);
        assert_eq!(h.pane.input().value(), "p b");
        h.key(KeyCode::Up);
        assert_eq!(h.pane.input().value(), "p a");
        h.key(KeyCode::Up);
        assert_eq!(h.pane.input().value(), "p a");
        h.key(KeyCode::Down);
        assert_eq!(h.pane.input().value(), "p b");
        h.key(KeyCode::Down);
        assert_eq!(h.pane.input().value(), "");
    }

    #[test]
    fn restart_clears_the_output() {
        let mut h = Harness::new(5);
        h.stdout("before");
        h.send(Message::DebuggerRestarted);
        assert!(h.pane.lines().is_empty());
    }

    #[test]
    fn stderr_is_styled() {
        let h_theme = Theme::default();
        let entry = Entry::Output(Output::new(OutputSource::Stderr, "panic"));
        assert_eq!(entry.render(&h_theme).spans[0].style, h_theme.stderr);
    }
}
