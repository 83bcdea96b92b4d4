//! Drives GDB against a VM image that compiles code at run time, to check the
//! image's dynamic debug info: pending breakpoints that resolve when JIT code
//! is installed, in-memory objfiles that come and go with compilations,
//! variable and type inspection, and unwinding through deoptimized frames.

pub mod config;
pub mod debugger;
pub mod error;
pub mod executor;
pub mod parser;

pub use config::SessionConfig;
pub use debugger::{DebugContext, SessionState, StopReason};
pub use error::{ConfigError, Result, SessionError};
