//! [`DebugBackend`] implementation talking to a headless Delve server over JSON-RPC
use std::{
    io::{BufRead, BufReader, Write},
    net::{TcpStream, ToSocketAddrs},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    BackendError, Breakpoint, BreakpointId, DebugBackend, Location, Result, StackFrame, Variable,
};

pub(crate) mod api;
mod format;

/// Number of frames requested for call stacks
const STACK_DEPTH: i64 = 50;

#[derive(Serialize)]
struct Request<P> {
    method: String,
    params: [P; 1],
    id: u64,
}

#[derive(Deserialize)]
struct Response {
    id: u64,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Blocking JSON-RPC connection to a Delve server
pub struct DelveBackend {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    next_id: u64,
}

impl DelveBackend {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let writer = TcpStream::connect(addr)?;
        writer.set_nodelay(true)?;
        let reader = BufReader::new(writer.try_clone()?);
        tracing::debug!(peer = ?writer.peer_addr().ok(), "connected to delve");
        Ok(Self {
            reader,
            writer,
            next_id: 0,
        })
    }

    #[tracing::instrument(skip(self, params), level = "debug")]
    fn call<P, R>(&mut self, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.next_id += 1;
        let id = self.next_id;
        let request = Request {
            method: format!("RPCServer.{method}"),
            params: [params],
            id,
        };
        let mut body = serde_json::to_vec(&request)?;
        body.push(b'\n');
        self.writer.write_all(&body)?;
        self.writer.flush()?;

        let response = loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(BackendError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "delve closed the connection",
                )));
            }
            if line.trim().is_empty() {
                continue;
            }
            let response: Response = serde_json::from_str(&line)?;
            if response.id == id {
                break response;
            }
            tracing::warn!(expected = id, got = response.id, "skipping unexpected response");
        };

        if let Some(message) = response.error {
            tracing::debug!(%message, "rpc call failed");
            return Err(BackendError::from_rpc(method, message));
        }
        let result = match response.result {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        Ok(serde_json::from_value(result)?)
    }

    fn state(&mut self) -> Result<api::DebuggerState> {
        let out: api::StateOut = self.call("State", api::StateIn { non_blocking: true })?;
        Ok(out.state)
    }

    fn command(&mut self, name: &str) -> Result<()> {
        let out: api::CommandOut = self.call("Command", api::CommandIn { name })?;
        if out.state.exited {
            return Err(BackendError::ProcessExited {
                status: out.state.exit_status,
            });
        }
        Ok(())
    }

    fn current_goroutine(&mut self) -> Result<i64> {
        let state = self.state()?;
        if state.exited {
            return Err(BackendError::ProcessExited {
                status: state.exit_status,
            });
        }
        state
            .current_thread
            .map(|thread| thread.goroutine_id)
            .ok_or(BackendError::NoLocation)
    }

    fn raw_breakpoint(&mut self, id: BreakpointId) -> Result<api::Breakpoint> {
        let out: api::BreakpointOut = self
            .call("GetBreakpoint", by_id(id))
            .map_err(|e| not_found(e, id))?;
        Ok(out.breakpoint)
    }

    fn amend(&mut self, breakpoint: api::Breakpoint) -> Result<Breakpoint> {
        let id = BreakpointId(breakpoint.id as u64);
        let _: api::Empty = self.call("AmendBreakpoint", api::BreakpointIn { breakpoint })?;
        self.breakpoint(id)
    }
}

impl Drop for DelveBackend {
    fn drop(&mut self) {
        tracing::debug!("detaching from delve");
        if let Err(e) = self.call::<_, api::Empty>("Detach", api::DetachIn { kill: true }) {
            tracing::debug!(error = %e, "detach failed");
        }
    }
}

fn by_id(id: BreakpointId) -> api::BreakpointIdIn {
    api::BreakpointIdIn {
        id: id.0 as i64,
        name: String::new(),
    }
}

fn not_found(error: BackendError, id: BreakpointId) -> BackendError {
    match error {
        BackendError::Rpc { ref message, .. } if message.contains("not found") => {
            BackendError::BreakpointNotFound(id)
        }
        other => other,
    }
}

fn convert_breakpoint(bp: api::Breakpoint) -> Breakpoint {
    Breakpoint {
        id: BreakpointId(bp.id as u64),
        filename: PathBuf::from(bp.file),
        line: bp.line.max(0) as usize,
        disabled: bp.disabled,
        condition: (!bp.cond.is_empty()).then_some(bp.cond),
        alias: (!bp.name.is_empty()).then_some(bp.name),
    }
}

impl DebugBackend for DelveBackend {
    fn current_file(&mut self) -> Result<Location> {
        let state = self.state()?;
        if state.exited {
            return Err(BackendError::ProcessExited {
                status: state.exit_status,
            });
        }
        let thread = state.current_thread.ok_or(BackendError::NoLocation)?;
        Ok(Location::new(thread.file, thread.line.max(0) as usize))
    }

    fn breakpoints(&mut self) -> Result<Vec<Breakpoint>> {
        let out: api::ListBreakpointsOut =
            self.call("ListBreakpoints", api::ListBreakpointsIn { all: false })?;
        // negative ids are delve's internal panic and fatal error breakpoints
        Ok(out
            .breakpoints
            .into_iter()
            .filter(|bp| bp.id > 0)
            .map(convert_breakpoint)
            .collect())
    }

    fn breakpoint(&mut self, id: BreakpointId) -> Result<Breakpoint> {
        self.raw_breakpoint(id).map(convert_breakpoint)
    }

    #[tracing::instrument(skip(self))]
    fn create_breakpoint(&mut self, filename: &Path, line: usize) -> Result<Breakpoint> {
        let breakpoint = api::Breakpoint {
            file: filename.display().to_string(),
            line: line as i64,
            ..Default::default()
        };
        let out: api::BreakpointOut =
            self.call("CreateBreakpoint", api::BreakpointIn { breakpoint })?;
        Ok(convert_breakpoint(out.breakpoint))
    }

    fn toggle_breakpoint(&mut self, id: BreakpointId) -> Result<Breakpoint> {
        let out: api::BreakpointOut = self
            .call("ToggleBreakpoint", by_id(id))
            .map_err(|e| not_found(e, id))?;
        Ok(convert_breakpoint(out.breakpoint))
    }

    fn clear_breakpoint(&mut self, id: BreakpointId) -> Result<Breakpoint> {
        let out: api::BreakpointOut = self
            .call("ClearBreakpoint", by_id(id))
            .map_err(|e| not_found(e, id))?;
        Ok(convert_breakpoint(out.breakpoint))
    }

    fn add_condition_to_breakpoint(&mut self, id: BreakpointId, expr: &str) -> Result<Breakpoint> {
        let mut breakpoint = self.raw_breakpoint(id)?;
        breakpoint.cond = expr.trim().to_string();
        self.amend(breakpoint)
    }

    fn add_alias_to_breakpoint(&mut self, id: BreakpointId, name: &str) -> Result<Breakpoint> {
        let mut breakpoint = self.raw_breakpoint(id)?;
        breakpoint.name = name.trim().to_string();
        self.amend(breakpoint)
    }

    fn next(&mut self) -> Result<()> {
        self.command("next")
    }

    fn step_in(&mut self) -> Result<()> {
        self.command("step")
    }

    fn step_out(&mut self) -> Result<()> {
        self.command("stepOut")
    }

    fn continue_(&mut self) -> Result<()> {
        self.command("continue")
    }

    fn restart(&mut self) -> Result<()> {
        let _: api::Empty = self.call(
            "Restart",
            api::RestartIn {
                position: String::new(),
                reset_args: false,
                new_args: Vec::new(),
                rerecord: false,
                rebuild: false,
            },
        )?;
        Ok(())
    }

    fn local_variables(&mut self) -> Result<Vec<Variable>> {
        let scope = api::EvalScope::goroutine(self.current_goroutine()?);
        let args: api::ListFunctionArgsOut = self.call(
            "ListFunctionArgs",
            api::ScopedIn {
                scope,
                cfg: api::LoadConfig::default(),
            },
        )?;
        let locals: api::ListLocalVarsOut = self.call(
            "ListLocalVars",
            api::ScopedIn {
                scope,
                cfg: api::LoadConfig::default(),
            },
        )?;
        Ok(args
            .args
            .iter()
            .chain(locals.variables.iter())
            .map(|v| format::to_variable(&v.name, v))
            .collect())
    }

    fn eval_variable(&mut self, expr: &str) -> Result<Variable> {
        let scope = api::EvalScope::goroutine(self.current_goroutine()?);
        let out: api::EvalOut = self.call(
            "Eval",
            api::EvalIn {
                scope,
                expr,
                cfg: api::LoadConfig::default(),
            },
        )?;
        Ok(format::to_variable(expr, &out.variable))
    }

    fn call_stack(&mut self) -> Result<Vec<StackFrame>> {
        let goroutine = self.current_goroutine()?;
        let out: api::StacktraceOut = self.call(
            "Stacktrace",
            api::StacktraceIn {
                id: goroutine,
                depth: STACK_DEPTH,
                full: false,
            },
        )?;
        Ok(out
            .locations
            .into_iter()
            .enumerate()
            .map(|(index, frame)| StackFrame {
                index,
                function: frame.function.map(|f| f.name).unwrap_or_default(),
                filename: PathBuf::from(frame.file),
                line: frame.line.max(0) as usize,
            })
            .collect())
    }
}
