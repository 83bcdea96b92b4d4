use serde::Serialize;
use std::fmt;

/// Result of printing an expression in the stopped frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VariableValue {
    Available(String),
    /// The compiler eliminated the storage at this stop point.
    OptimizedOut,
}

impl VariableValue {
    pub fn is_optimized_out(&self) -> bool {
        matches!(self, VariableValue::OptimizedOut)
    }

    pub fn as_str(&self) -> &str {
        match self {
            VariableValue::Available(text) => text,
            VariableValue::OptimizedOut => OPTIMIZED_OUT,
        }
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const OPTIMIZED_OUT: &str = "<optimized out>";

/// Full `type = ...` rendering of `ptype`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDescription(pub String);

impl TypeDescription {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The description without the leading `type = `.
    pub fn body(&self) -> &str {
        self.0.strip_prefix("type = ").unwrap_or(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameKind {
    Normal,
    EagerDeopt,
    LazyDeopt,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub level: usize,
    pub address: Option<String>,
    pub function: Option<String>,
    /// Argument list without the enclosing parentheses.
    pub args: Option<String>,
    /// `File.java:12` or a library path after `from`.
    pub location: Option<String>,
    pub kind: FrameKind,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Backtrace {
    pub frames: Vec<Frame>,
    pub raw: String,
}

impl Backtrace {
    pub fn contains(&self, needle: &str) -> bool {
        self.raw.contains(needle)
    }

    pub fn has_kind(&self, kind: FrameKind) -> bool {
        self.frames.iter().any(|f| f.kind == kind)
    }

    pub fn find_function(&self, name: &str) -> Option<&Frame> {
        self.frames
            .iter()
            .find(|f| f.function.as_deref() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedModule {
    pub name: String,
    /// Backed by a JIT buffer rather than a file on disk.
    pub in_memory: bool,
}

pub const IN_MEMORY_PREFIX: &str = "<in-memory@";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakpointEntry {
    /// Breakpoint number; for fan-out locations the parent number.
    pub number: u32,
    /// `Some(n)` for location row `number.n`.
    pub location_index: Option<u32>,
    pub kind: Option<String>,
    pub enabled: bool,
    /// Hex address, `<PENDING>` or `<MULTIPLE>`.
    pub address: Option<String>,
    pub what: String,
    pub hits: u32,
}

impl BreakpointEntry {
    pub fn is_pending(&self) -> bool {
        self.address.as_deref() == Some("<PENDING>")
    }

    pub fn is_multiple(&self) -> bool {
        self.address.as_deref() == Some("<MULTIPLE>")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FunctionListing {
    pub raw: String,
    pub signatures: Vec<String>,
}

impl FunctionListing {
    pub fn occurrences(&self, name: &str) -> usize {
        self.raw.matches(name).count()
    }
}

/// Parsed `info breakpoints` together with the text it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BreakpointTable {
    pub entries: Vec<BreakpointEntry>,
    pub raw: String,
}

impl BreakpointTable {
    pub fn occurrences(&self, symbol: &str) -> usize {
        self.raw.matches(symbol).count()
    }
}
