use std::{collections::HashMap, path::Path};

use crate::{Breakpoint, BreakpointId, Location, Result, StackFrame, Variable};

/// Synchronous interface to a debugging engine.
///
/// Every call blocks until the engine answers. Execution control methods
/// (`next`, `continue_`, ...) return once the debuggee has stopped again, so a
/// `continue_` without a reachable breakpoint blocks until the process exits.
pub trait DebugBackend {
    /// Location the debuggee is currently stopped at
    fn current_file(&mut self) -> Result<Location>;

    /// Breakpoints in `filename`, keyed by line
    fn file_breakpoints(&mut self, filename: &Path) -> Result<HashMap<usize, Breakpoint>> {
        Ok(self
            .breakpoints()?
            .into_iter()
            .filter(|bp| bp.is_in(filename))
            .map(|bp| (bp.line, bp))
            .collect())
    }

    fn breakpoints(&mut self) -> Result<Vec<Breakpoint>>;

    fn breakpoint(&mut self, id: BreakpointId) -> Result<Breakpoint>;

    fn create_breakpoint(&mut self, filename: &Path, line: usize) -> Result<Breakpoint>;

    /// Create a breakpoint at the current execution point
    fn create_breakpoint_now(&mut self) -> Result<Breakpoint> {
        let Location { filename, line } = self.current_file()?;
        self.create_breakpoint(&filename, line)
    }

    fn toggle_breakpoint(&mut self, id: BreakpointId) -> Result<Breakpoint>;

    fn clear_breakpoint(&mut self, id: BreakpointId) -> Result<Breakpoint>;

    /// Attach a condition to a breakpoint; an empty expression removes it
    fn add_condition_to_breakpoint(&mut self, id: BreakpointId, expr: &str) -> Result<Breakpoint>;

    fn add_alias_to_breakpoint(&mut self, id: BreakpointId, name: &str) -> Result<Breakpoint>;

    fn next(&mut self) -> Result<()>;

    fn step_in(&mut self) -> Result<()>;

    fn step_out(&mut self) -> Result<()>;

    fn continue_(&mut self) -> Result<()>;

    fn restart(&mut self) -> Result<()>;

    fn local_variables(&mut self) -> Result<Vec<Variable>>;

    fn eval_variable(&mut self, expr: &str) -> Result<Variable>;

    fn call_stack(&mut self) -> Result<Vec<StackFrame>>;
}
