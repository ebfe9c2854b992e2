//! In-memory [`DebugBackend`] for exercising front-end code without a debuggee.
//!
//! Execution follows a scripted list of locations: every step or continue
//! moves to the next entry, and stepping past the end reports that the
//! process exited with status 0.
use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    path::{Path, PathBuf},
};

use crate::{
    BackendError, Breakpoint, BreakpointId, DebugBackend, Location, Result, StackFrame, Variable,
};

#[derive(Debug, Default)]
pub struct FakeBackend {
    location: Option<Location>,
    script: VecDeque<Location>,
    initial: Option<Location>,
    initial_script: VecDeque<Location>,
    breakpoints: BTreeMap<BreakpointId, Breakpoint>,
    next_id: u64,
    stack: Vec<StackFrame>,
    variables: Vec<Variable>,
    evaluations: HashMap<String, Variable>,
    fail_next: Option<BackendError>,
    exited: bool,
    calls: Vec<&'static str>,
}

impl FakeBackend {
    /// A debuggee stopped at `filename:line`
    pub fn stopped_at(filename: impl Into<PathBuf>, line: usize) -> Self {
        let location = Location::new(filename, line);
        Self {
            location: Some(location.clone()),
            initial: Some(location),
            ..Default::default()
        }
    }

    /// Locations reported after each successive step or continue
    pub fn with_steps(mut self, steps: impl IntoIterator<Item = Location>) -> Self {
        self.script = steps.into_iter().collect();
        self.initial_script = self.script.clone();
        self
    }

    pub fn with_stack(mut self, stack: Vec<StackFrame>) -> Self {
        self.stack = stack;
        self
    }

    pub fn with_variables(mut self, variables: Vec<Variable>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_evaluation(mut self, expr: &str, variable: Variable) -> Self {
        self.evaluations.insert(expr.to_string(), variable);
        self
    }

    /// Make the next backend call fail with `error`
    pub fn fail_next(&mut self, error: BackendError) {
        self.fail_next = Some(error);
    }

    pub fn set_stack(&mut self, stack: Vec<StackFrame>) {
        self.stack = stack;
    }

    pub fn set_variables(&mut self, variables: Vec<Variable>) {
        self.variables = variables;
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.iter().filter(|call| **call == name).count()
    }

    fn enter(&mut self, name: &'static str) -> Result<()> {
        self.calls.push(name);
        match self.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.exited {
            return Err(BackendError::ProcessExited { status: 0 });
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<()> {
        self.ensure_running()?;
        match self.script.pop_front() {
            Some(location) => {
                self.location = Some(location);
                Ok(())
            }
            None => {
                self.exited = true;
                self.location = None;
                Err(BackendError::ProcessExited { status: 0 })
            }
        }
    }

    fn existing(&mut self, id: BreakpointId) -> Result<&mut Breakpoint> {
        self.breakpoints
            .get_mut(&id)
            .ok_or(BackendError::BreakpointNotFound(id))
    }
}

impl DebugBackend for FakeBackend {
    fn current_file(&mut self) -> Result<Location> {
        self.enter("current_file")?;
        self.ensure_running()?;
        self.location.clone().ok_or(BackendError::NoLocation)
    }

    fn file_breakpoints(&mut self, filename: &Path) -> Result<HashMap<usize, Breakpoint>> {
        self.enter("file_breakpoints")?;
        Ok(self
            .breakpoints
            .values()
            .filter(|bp| bp.is_in(filename))
            .map(|bp| (bp.line, bp.clone()))
            .collect())
    }

    fn breakpoints(&mut self) -> Result<Vec<Breakpoint>> {
        self.enter("breakpoints")?;
        Ok(self.breakpoints.values().cloned().collect())
    }

    fn breakpoint(&mut self, id: BreakpointId) -> Result<Breakpoint> {
        self.enter("breakpoint")?;
        self.existing(id).map(|bp| bp.clone())
    }

    fn create_breakpoint(&mut self, filename: &Path, line: usize) -> Result<Breakpoint> {
        self.enter("create_breakpoint")?;
        if let Some(existing) = self
            .breakpoints
            .values()
            .find(|bp| bp.is_in(filename) && bp.line == line)
        {
            return Err(BackendError::from_rpc(
                "CreateBreakpoint",
                format!(
                    "Breakpoint exists at {}:{} at {}",
                    filename.display(),
                    line,
                    existing.id
                ),
            ));
        }
        self.next_id += 1;
        let breakpoint = Breakpoint {
            id: BreakpointId(self.next_id),
            filename: filename.to_path_buf(),
            line,
            disabled: false,
            condition: None,
            alias: None,
        };
        self.breakpoints.insert(breakpoint.id, breakpoint.clone());
        Ok(breakpoint)
    }

    fn toggle_breakpoint(&mut self, id: BreakpointId) -> Result<Breakpoint> {
        self.enter("toggle_breakpoint")?;
        let breakpoint = self.existing(id)?;
        breakpoint.disabled = !breakpoint.disabled;
        Ok(breakpoint.clone())
    }

    fn clear_breakpoint(&mut self, id: BreakpointId) -> Result<Breakpoint> {
        self.enter("clear_breakpoint")?;
        self.breakpoints
            .remove(&id)
            .ok_or(BackendError::BreakpointNotFound(id))
    }

    fn add_condition_to_breakpoint(&mut self, id: BreakpointId, expr: &str) -> Result<Breakpoint> {
        self.enter("add_condition_to_breakpoint")?;
        let breakpoint = self.existing(id)?;
        let expr = expr.trim();
        breakpoint.condition = (!expr.is_empty()).then(|| expr.to_string());
        Ok(breakpoint.clone())
    }

    fn add_alias_to_breakpoint(&mut self, id: BreakpointId, name: &str) -> Result<Breakpoint> {
        self.enter("add_alias_to_breakpoint")?;
        let breakpoint = self.existing(id)?;
        let name = name.trim();
        breakpoint.alias = (!name.is_empty()).then(|| name.to_string());
        Ok(breakpoint.clone())
    }

    fn next(&mut self) -> Result<()> {
        self.enter("next")?;
        self.advance()
    }

    fn step_in(&mut self) -> Result<()> {
        self.enter("step_in")?;
        self.advance()
    }

    fn step_out(&mut self) -> Result<()> {
        self.enter("step_out")?;
        self.advance()
    }

    fn continue_(&mut self) -> Result<()> {
        self.enter("continue")?;
        self.advance()
    }

    fn restart(&mut self) -> Result<()> {
        self.enter("restart")?;
        self.exited = false;
        self.location = self.initial.clone();
        self.script = self.initial_script.clone();
        Ok(())
    }

    fn local_variables(&mut self) -> Result<Vec<Variable>> {
        self.enter("local_variables")?;
        self.ensure_running()?;
        Ok(self.variables.clone())
    }

    fn eval_variable(&mut self, expr: &str) -> Result<Variable> {
        self.enter("eval_variable")?;
        self.ensure_running()?;
        self.evaluations.get(expr).cloned().ok_or_else(|| {
            BackendError::from_rpc("Eval", format!("could not find symbol value for {expr}"))
        })
    }

    fn call_stack(&mut self) -> Result<Vec<StackFrame>> {
        self.enter("call_stack")?;
        self.ensure_running()?;
        Ok(self.stack.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_follow_the_script_then_exit() {
        let mut backend = FakeBackend::stopped_at("main.go", 1)
            .with_steps([Location::new("main.go", 2)]);

        backend.next().unwrap();
        assert_eq!(backend.current_file().unwrap(), Location::new("main.go", 2));

        assert!(backend.next().unwrap_err().is_process_exit());
        assert!(backend.current_file().unwrap_err().is_process_exit());

        backend.restart().unwrap();
        assert_eq!(backend.current_file().unwrap(), Location::new("main.go", 1));
    }

    #[test]
    fn breakpoint_ids_are_sequential() {
        let mut backend = FakeBackend::stopped_at("main.go", 1);
        let first = backend.create_breakpoint(Path::new("main.go"), 3).unwrap();
        let second = backend.create_breakpoint_now().unwrap();
        assert_eq!(first.id, BreakpointId(1));
        assert_eq!(second.id, BreakpointId(2));
        assert_eq!(second.line, 1);
        assert!(backend.create_breakpoint(Path::new("main.go"), 3).is_err());
    }

    #[test]
    fn injected_failures_fire_once() {
        let mut backend = FakeBackend::stopped_at("main.go", 1);
        backend.fail_next(BackendError::NoLocation);
        assert!(backend.breakpoints().is_err());
        assert!(backend.breakpoints().is_ok());
        assert_eq!(backend.call_count("breakpoints"), 2);
    }
}
