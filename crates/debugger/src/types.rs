use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Identifier assigned to a breakpoint by the backend.
///
/// Ids are stable for the lifetime of the breakpoint and never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BreakpointId(pub u64);

impl fmt::Display for BreakpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub id: BreakpointId,
    pub filename: PathBuf,
    pub line: usize,
    pub disabled: bool,
    pub condition: Option<String>,
    pub alias: Option<String>,
}

impl Breakpoint {
    /// Name shown to the user: the alias when one is set, otherwise `file:line`
    /// with the file relative to `root` when it lives below it
    pub fn display_name(&self, root: Option<&Path>) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        let filename = root
            .and_then(|root| self.filename.strip_prefix(root).ok())
            .unwrap_or(&self.filename);
        format!("{}:{}", filename.display(), self.line)
    }

    pub fn is_in(&self, filename: &Path) -> bool {
        self.filename == filename
    }
}

/// A position in a source file, with a 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub filename: PathBuf,
    pub line: usize,
}

impl Location {
    pub fn new(filename: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            filename: filename.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename.display(), self.line)
    }
}

/// Parse a `file:line` pair, as given on the command line
impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (file, line) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("invalid breakpoint location {s:?}: expected file:line"))?;
        if file.is_empty() {
            return Err(format!("invalid breakpoint location {s:?}: missing file name"));
        }
        let line: usize = line.parse().map_err(|_| {
            format!("invalid breakpoint location {s:?}: {line:?} is not a line number")
        })?;
        if line == 0 {
            return Err(format!("invalid breakpoint location {s:?}: lines start at 1"));
        }
        Ok(Location::new(file, line))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub index: usize,
    pub function: String,
    pub filename: PathBuf,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: String,
    pub multiline_value: Option<String>,
}

impl Variable {
    /// The most detailed rendering available
    pub fn detailed_value(&self) -> &str {
        self.multiline_value.as_deref().unwrap_or(&self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSource {
    Stdout,
    Stderr,
    Command,
}

/// A single line of output from the debuggee or from a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub source: OutputSource,
    pub content: String,
}

impl Output {
    pub fn new(source: OutputSource, content: impl Into<String>) -> Self {
        Self {
            source,
            content: content.into(),
        }
    }
}
