//! Extraction functions over the debugger's free-text replies.
//!
//! Each submodule understands exactly one command's output format, so a
//! format change in the debugger breaks one parser and its tests.

mod backtrace;
mod breakpoints;
mod functions;
mod objfiles;
mod stop;
mod text;
mod types;
mod values;

pub use backtrace::{frame_kind, parse_backtrace, parse_frame};
pub use breakpoints::{
    last_address, parse_break_response, parse_breakpoint_table, resolved_locations,
    BreakResponse,
};
pub use functions::parse_function_listing;
pub use objfiles::{count_in_memory, parse_objfiles};
pub use stop::parse_stop_reason;
pub use text::{
    count_occurrences, error_line, leading_error, matching_paren, strip_history_prefix,
};
pub use types::{
    Backtrace, BreakpointEntry, BreakpointTable, Frame, FrameKind, FunctionListing, LoadedModule,
    TypeDescription, VariableValue, IN_MEMORY_PREFIX, OPTIMIZED_OUT,
};
pub use values::{parse_print, parse_ptype};
