use super::text::matching_paren;
use super::types::{Backtrace, Frame, FrameKind};

const EAGER_TAG: &str = "[EAGER DEOPT FRAME]";
const LAZY_TAG: &str = "[LAZY DEOPT FRAME]";

/// Parse `backtrace N` output. Continuation lines are folded into the
/// preceding frame; trailer lines such as `(More stack frames follow...)`
/// are kept only in `raw`.
pub fn parse_backtrace(output: &str) -> Backtrace {
    let mut texts: Vec<String> = Vec::new();
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            texts.push(trimmed.to_string());
        } else if !trimmed.is_empty() && !trimmed.starts_with('(') {
            if let Some(last) = texts.last_mut() {
                last.push(' ');
                last.push_str(trimmed);
            }
        }
    }

    Backtrace {
        frames: texts.iter().filter_map(|t| parse_frame(t)).collect(),
        raw: output.to_string(),
    }
}

/// Classify a frame line by its unwinder tag; anything unresolved is `Unknown`.
pub fn frame_kind(text: &str) -> FrameKind {
    if text.contains(EAGER_TAG) {
        FrameKind::EagerDeopt
    } else if text.contains(LAZY_TAG) {
        FrameKind::LazyDeopt
    } else if text.contains("??") || text.contains("Unknown Frame at") {
        FrameKind::Unknown
    } else {
        FrameKind::Normal
    }
}

pub fn parse_frame(text: &str) -> Option<Frame> {
    let rest = text.strip_prefix('#')?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let level: usize = rest[..digits].parse().ok()?;
    let mut rest = rest[digits..].trim_start();

    let mut address = None;
    if rest.starts_with("0x") {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        address = Some(rest[..end].to_string());
        rest = rest[end..].trim_start();
        rest = rest.strip_prefix("in ").unwrap_or(rest).trim_start();
    }

    let kind = frame_kind(text);
    for tag in [EAGER_TAG, LAZY_TAG] {
        if let Some(stripped) = rest.strip_prefix(tag) {
            rest = stripped.trim_start();
        }
    }

    let mut function = None;
    let mut args = None;
    let mut tail = rest;
    if let Some(open) = rest.find(" (").map(|i| i + 1) {
        let name = rest[..open].trim();
        if !name.is_empty() && name != "at" {
            function = Some(name.to_string());
            match matching_paren(rest, open) {
                Some(close) => {
                    args = Some(rest[open + 1..close].to_string());
                    tail = rest[close + 1..].trim_start();
                }
                None => {
                    args = Some(rest[open + 1..].to_string());
                    tail = "";
                }
            }
        }
    }

    let location = tail
        .strip_prefix("at ")
        .or_else(|| tail.strip_prefix("from "))
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());

    Some(Frame {
        level,
        address,
        function,
        args,
        location,
        kind,
        text: text.to_string(),
    })
}
