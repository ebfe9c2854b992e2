//! Top-level shell: owns the windows, routes keys and broadcasts lifecycle messages.
//!
//! Every message goes through a queue. Messages returned by panes are queued
//! behind the one being handled, so panes always observe them in order.
use std::{collections::VecDeque, path::PathBuf};

use config::LayoutConfig;
use crossbeam_channel::Receiver;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use debugger::{DebugBackend, Output};
use eyre::WrapErr;
use ratatui::{Frame, Terminal, backend::Backend, layout::Rect};

use crate::{
    cache::ContentCache,
    components::{
        BreakpointsPane, CallStackPane, Context, OutputPane, Pane, SourcePane, StatusBar,
        VariablesPane, Window, output::OUTPUT_TITLE,
    },
    layout::AppLayout,
    message::{Cmd, Message, WindowId},
    theme::Theme,
};

pub const VARIABLES: WindowId = 1;
pub const BREAKPOINTS: WindowId = 2;
pub const CALL_STACK: WindowId = 3;
pub const SOURCE: WindowId = 4;
pub const OUTPUT: WindowId = 5;

const SIDEBAR_PANELS: usize = 3;

struct Windows {
    variables: Window<VariablesPane>,
    breakpoints: Window<BreakpointsPane>,
    callstack: Window<CallStackPane>,
    source: Window<SourcePane>,
    output: Window<OutputPane>,
}

impl Windows {
    fn new(root: Option<PathBuf>) -> Self {
        Self {
            variables: Window::new(VARIABLES, "Variables", VariablesPane::new()),
            breakpoints: Window::new(
                BREAKPOINTS,
                "Breakpoints",
                BreakpointsPane::new(BREAKPOINTS, root.clone()),
            ),
            callstack: Window::new(CALL_STACK, "Call Stack", CallStackPane::new(root)),
            source: Window::new(SOURCE, "Source Code", SourcePane::new(SOURCE)),
            output: Window::new(OUTPUT, OUTPUT_TITLE, OutputPane::new(OUTPUT)),
        }
    }

    /// In id order
    fn all(&self) -> [&dyn Pane; 5] {
        [
            &self.variables,
            &self.breakpoints,
            &self.callstack,
            &self.source,
            &self.output,
        ]
    }

    fn all_mut(&mut self) -> [&mut dyn Pane; 5] {
        [
            &mut self.variables,
            &mut self.breakpoints,
            &mut self.callstack,
            &mut self.source,
            &mut self.output,
        ]
    }

    fn get(&self, id: WindowId) -> Option<&dyn Pane> {
        id.checked_sub(1).and_then(|index| self.all().get(index).copied())
    }

    fn get_mut(&mut self, id: WindowId) -> Option<&mut dyn Pane> {
        let index = id.checked_sub(1)?;
        self.all_mut().into_iter().nth(index)
    }
}

/// A pane that took over the keyboard, and who had focus before it
#[derive(Debug, Clone, Copy)]
struct InputOwner {
    owner: WindowId,
    previous: WindowId,
}

pub struct App<B> {
    backend: B,
    cache: ContentCache,
    theme: Theme,
    layout_config: LayoutConfig,
    layout: Option<AppLayout>,
    windows: Windows,
    status: StatusBar,
    focused: WindowId,
    input_owner: Option<InputOwner>,
    queue: VecDeque<Message>,
    awaiting_output: bool,
    output_closed: bool,
    should_quit: bool,
}

impl<B: DebugBackend> App<B> {
    pub fn new(
        backend: B,
        cache: ContentCache,
        theme: Theme,
        layout_config: LayoutConfig,
        root: Option<PathBuf>,
    ) -> Self {
        Self {
            backend,
            cache,
            theme,
            layout_config,
            layout: None,
            windows: Windows::new(root),
            status: StatusBar::default(),
            focused: SOURCE,
            input_owner: None,
            queue: VecDeque::new(),
            awaiting_output: false,
            output_closed: false,
            should_quit: false,
        }
    }

    /// Initialise the panes, focus the source window and load the session state
    pub fn start(&mut self) {
        let mut cmds = Vec::new();
        let mut ctx = Context {
            backend: &mut self.backend,
            cache: &mut self.cache,
            theme: &self.theme,
        };
        let mut errors = Vec::new();
        for pane in self.windows.all_mut() {
            match pane.init(&mut ctx) {
                Ok(cmd) => cmds.push(cmd),
                Err(e) => errors.push(e),
            }
        }
        for err in errors {
            self.report(err);
        }
        self.apply(Cmd::batch(cmds));
        self.queue.push_back(Message::WindowFocused(SOURCE));
        self.queue.push_back(Message::RefreshContent);
        self.drain();
    }

    /// Handle `msg` and everything it leads to
    pub fn handle(&mut self, msg: Message) {
        self.queue.push_back(msg);
        self.drain();
    }

    fn drain(&mut self) {
        while let Some(msg) = self.queue.pop_front() {
            tracing::trace!(?msg, "dispatching");
            let cmd = self.dispatch(msg);
            self.apply(cmd);
            self.sync_input_owner();
        }
    }

    fn dispatch(&mut self, msg: Message) -> Cmd {
        match msg {
            Message::Key(key) => self.handle_key(key),
            Message::Resize { width, height } => self.resize(width, height),
            Message::WindowFocused(id) => {
                if self.windows.get(id).is_none() {
                    tracing::debug!(id, "ignoring focus request for unknown window");
                    return Cmd::None;
                }
                self.focused = id;
                self.broadcast(&msg)
            }
            Message::OutputReceived(_) => self.deliver(OUTPUT, &msg),
            Message::DebuggerRestarted => {
                self.status.session_restarted();
                self.broadcast(&msg)
            }
            msg => self.broadcast(&msg),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Cmd {
        if key.kind != KeyEventKind::Press {
            return Cmd::None;
        }
        self.status.clear_error();

        if let Some(input) = self.input_owner {
            return self.deliver(input.owner, &Message::Key(key));
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Cmd::Quit,
            KeyCode::Char('q') => Cmd::Quit,
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let id = c.to_digit(10).map_or(0, |d| d as WindowId);
                Cmd::msg(Message::WindowFocused(id))
            }
            _ => self.deliver(self.focused, &Message::Key(key)),
        }
    }

    fn resize(&mut self, width: u16, height: u16) -> Cmd {
        let layout = AppLayout::compute(width, height, SIDEBAR_PANELS, &self.layout_config);
        let areas = [
            layout.sidebar[0],
            layout.sidebar[1],
            layout.sidebar[2],
            layout.source,
            layout.output,
        ];
        self.layout = Some(layout);

        let cmds: Vec<Cmd> = (VARIABLES..=OUTPUT)
            .zip(areas)
            .map(|(id, area)| {
                let resize = Message::Resize {
                    width: area.width,
                    height: area.height,
                };
                self.deliver(id, &resize)
            })
            .collect();
        Cmd::batch(cmds)
    }

    /// Send `msg` to one window
    fn deliver(&mut self, id: WindowId, msg: &Message) -> Cmd {
        let Some(pane) = self.windows.get_mut(id) else {
            return Cmd::None;
        };
        let mut ctx = Context {
            backend: &mut self.backend,
            cache: &mut self.cache,
            theme: &self.theme,
        };
        match pane.update(msg, &mut ctx) {
            Ok(cmd) => cmd,
            Err(e) => {
                self.report(e);
                Cmd::None
            }
        }
    }

    /// Send `msg` to every window
    fn broadcast(&mut self, msg: &Message) -> Cmd {
        let mut ctx = Context {
            backend: &mut self.backend,
            cache: &mut self.cache,
            theme: &self.theme,
        };
        let mut cmds = Vec::new();
        let mut errors = Vec::new();
        for pane in self.windows.all_mut() {
            match pane.update(msg, &mut ctx) {
                Ok(cmd) => cmds.push(cmd),
                Err(e) => errors.push(e),
            }
        }
        for err in errors {
            self.report(err);
        }
        Cmd::batch(cmds)
    }

    fn report(&mut self, err: eyre::Report) {
        if self.status.report(&err) {
            tracing::warn!(error = ?err, "operation failed");
        } else {
            tracing::warn!(error = ?err, "further error while another is displayed");
        }
    }

    fn apply(&mut self, cmd: Cmd) {
        let mut effects = Vec::new();
        cmd.flatten(&mut effects);
        for effect in effects {
            match effect {
                Cmd::Msg(msg) => self.queue.push_back(msg),
                Cmd::AwaitOutput => self.awaiting_output = !self.output_closed,
                Cmd::Quit => self.should_quit = true,
                Cmd::None | Cmd::Batch(_) => {}
            }
        }
    }

    /// Track which pane holds the keyboard, restoring focus when it lets go
    fn sync_input_owner(&mut self) {
        let capturing = self
            .windows
            .all()
            .iter()
            .position(|pane| pane.captures_input())
            .map(|index| index + 1);
        match (self.input_owner, capturing) {
            (None, Some(owner)) => {
                tracing::debug!(owner, "pane captured input");
                self.input_owner = Some(InputOwner {
                    owner,
                    previous: self.focused,
                });
            }
            (Some(input), None) => {
                tracing::debug!(owner = input.owner, "pane released input");
                self.input_owner = None;
                self.queue.push_back(Message::WindowFocused(input.previous));
            }
            (Some(input), Some(owner)) if input.owner != owner => {
                self.input_owner = Some(InputOwner { owner, ..input });
            }
            _ => {}
        }
    }

    pub fn view(&self, frame: &mut Frame) {
        let Some(layout) = &self.layout else {
            return;
        };
        let screen = frame.area();
        let areas = [
            layout.sidebar[0],
            layout.sidebar[1],
            layout.sidebar[2],
            layout.source,
            layout.output,
        ];
        for (pane, area) in self.windows.all().into_iter().zip(areas) {
            let area = area.intersection(screen);
            if area.area() > 0 {
                pane.view(frame, area, &self.theme);
            }
        }
        let hint = self.windows.get(self.focused).map_or("", |pane| pane.hint());
        let status_area = layout.status.intersection(screen);
        if status_area.area() > 0 {
            self.status.view(frame, status_area, &self.theme, hint);
        }
    }

    /// Draw and react to keys and debuggee output until asked to quit
    pub fn run<T: Backend>(
        mut self,
        terminal: &mut Terminal<T>,
        output: Receiver<Output>,
    ) -> eyre::Result<()> {
        // set up background thread polling for keyboard events
        let (tx, events) = crossbeam_channel::unbounded();
        std::thread::spawn(move || loop {
            match event::read() {
                Ok(event) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "error reading from event stream");
                }
            }
        });

        let size = terminal.size().wrap_err("reading terminal size")?;
        self.handle(Message::Resize {
            width: size.width,
            height: size.height,
        });
        self.start();

        let never = crossbeam_channel::never();
        loop {
            if self.should_quit {
                tracing::info!("terminating application");
                return Ok(());
            }
            terminal
                .draw(|frame| self.view(frame))
                .wrap_err("drawing frame")?;

            let armed = if self.awaiting_output { &output } else { &never };
            crossbeam_channel::select! {
                recv(events) -> event => match event.wrap_err("keyboard thread stopped")? {
                    Event::Key(key) => self.handle(Message::Key(key)),
                    Event::Resize(width, height) => self.handle(Message::Resize { width, height }),
                    _ => {}
                },
                recv(armed) -> line => match line {
                    Ok(line) => {
                        self.awaiting_output = false;
                        self.handle(Message::OutputReceived(line));
                    }
                    Err(_) => {
                        tracing::info!("debuggee output closed");
                        self.awaiting_output = false;
                        self.output_closed = true;
                    }
                },
            }
        }
    }

    pub fn focused(&self) -> WindowId {
        self.focused
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn awaiting_output(&self) -> bool {
        self.awaiting_output
    }

    /// Window holding the keyboard, if any
    pub fn input_owner(&self) -> Option<WindowId> {
        self.input_owner.map(|input| input.owner)
    }

    pub fn error(&self) -> Option<&str> {
        self.status.error()
    }

    pub fn session_ended(&self) -> bool {
        self.status.session_ended()
    }

    pub fn layout(&self) -> Option<&AppLayout> {
        self.layout.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn variables(&self) -> &Window<VariablesPane> {
        &self.windows.variables
    }

    pub fn breakpoints(&self) -> &Window<BreakpointsPane> {
        &self.windows.breakpoints
    }

    pub fn callstack(&self) -> &Window<CallStackPane> {
        &self.windows.callstack
    }

    pub fn source(&self) -> &Window<SourcePane> {
        &self.windows.source
    }

    pub fn output(&self) -> &Window<OutputPane> {
        &self.windows.output
    }

    /// Area of a window in the current layout
    pub fn window_area(&self, id: WindowId) -> Option<Rect> {
        let layout = self.layout.as_ref()?;
        match id {
            VARIABLES..=CALL_STACK => layout.sidebar.get(id - 1).copied(),
            SOURCE => Some(layout.source),
            OUTPUT => Some(layout.output),
            _ => None,
        }
    }
}
