use super::text::strip_history_prefix;
use crate::debugger::StopReason;

/// Classify the output of `continue`, `finish`, `start` or `run`.
pub fn parse_stop_reason(output: &str) -> StopReason {
    let lines: Vec<&str> = output.lines().map(str::trim).collect();

    if let Some(code) = lines.iter().rev().find_map(|l| exit_code(l)) {
        return StopReason::Exited { code };
    }
    if let Some(signal) = lines
        .iter()
        .rev()
        .find_map(|l| signal_after(l, "Program terminated with signal "))
    {
        return StopReason::Killed { signal };
    }
    if let Some(name) = lines
        .iter()
        .rev()
        .find_map(|l| signal_after(l, "received signal "))
    {
        return StopReason::Signal { name };
    }
    if let Some((number, location)) = lines.iter().rev().find_map(|l| breakpoint_hit(l)) {
        return StopReason::Breakpoint { number, location };
    }
    if lines.iter().any(|l| l.starts_with("Run till exit from")) {
        let returned = lines.iter().find_map(|l| {
            l.strip_prefix("Value returned is ")
                .map(|v| strip_history_prefix(v).unwrap_or(v).to_string())
        });
        return StopReason::FrameFinished { returned };
    }
    StopReason::Unknown(output.to_string())
}

/// `[Inferior 1 (process 42) exited normally]` or `... exited with code 01]`.
/// GDB prints the code in octal.
fn exit_code(line: &str) -> Option<i32> {
    if !line.starts_with("[Inferior ") {
        return None;
    }
    if line.ends_with("exited normally]") {
        return Some(0);
    }
    let start = line.find("exited with code ")? + "exited with code ".len();
    let digits = line[start..].trim_end_matches(']');
    i32::from_str_radix(digits, 8).ok()
}

fn signal_after(line: &str, marker: &str) -> Option<String> {
    let start = line.find(marker)? + marker.len();
    let name = line[start..]
        .split(|c: char| c == ',' || c.is_whitespace())
        .next()?;
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

/// `Breakpoint 2, f (...) at F.java:3`, `Thread 1 "x" hit Breakpoint 1.2, ...`
/// or `Temporary breakpoint 1, main () at m.c:4`.
fn breakpoint_hit(line: &str) -> Option<(String, String)> {
    for marker in ["Breakpoint ", "breakpoint "] {
        let mut search = line;
        while let Some(idx) = search.find(marker) {
            let rest = &search[idx + marker.len()..];
            let len = rest
                .bytes()
                .take_while(|b| b.is_ascii_digit() || *b == b'.')
                .count();
            if len > 0 {
                if let Some(location) = rest[len..].strip_prefix(", ") {
                    return Some((rest[..len].to_string(), location.to_string()));
                }
            }
            search = rest;
        }
    }
    None
}
