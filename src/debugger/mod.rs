mod breakpoints;
mod context;
mod session;
mod stepping;

pub use breakpoints::{BreakpointSet, Breakpoints};
pub use context::DebugContext;
pub use session::{CommandChannel, GdbSession};
pub use stepping::{SessionState, StopReason};
