use super::types::BreakpointEntry;

/// What `break <symbol>` reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakResponse {
    pub number: u32,
    pub locations: usize,
    pub pending: bool,
}

/// Parse the reply to `break <symbol>`.
///
/// Accepts `Breakpoint 3 at 0x...: file F, line 7.`,
/// `Breakpoint 3 at 0x...: sym. (2 locations)` and `Breakpoint 3 (sym) pending.`
pub fn parse_break_response(output: &str) -> Option<BreakResponse> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("Breakpoint "))?;
    let rest = &line["Breakpoint ".len()..];
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let number = rest[..digits].parse().ok()?;

    let pending = line.ends_with("pending.");
    let locations = match line.rfind(" locations)") {
        Some(end) => {
            let start = line[..end].rfind('(')? + 1;
            line[start..end].trim().parse().ok()?
        }
        None if pending => 0,
        None => 1,
    };

    Some(BreakResponse {
        number,
        locations,
        pending,
    })
}

const DISPOSITIONS: &[&str] = &["keep", "del", "dis", "dstp"];

/// Parse the `info breakpoints` table.
pub fn parse_breakpoint_table(output: &str) -> Vec<BreakpointEntry> {
    let mut entries: Vec<BreakpointEntry> = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if let Some(hits) = parse_hit_count(trimmed) {
            if let Some(parent) = entries.iter_mut().rev().find(|e| e.location_index.is_none()) {
                parent.hits = hits;
            }
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            continue;
        };
        let Some((number, location_index)) = parse_number(first) else {
            continue;
        };

        let entry = if location_index.is_some() {
            let enabled = tokens.get(1).is_some_and(|t| t.starts_with('y'));
            let (address, what) = split_address(&tokens[2.min(tokens.len())..]);
            BreakpointEntry {
                number,
                location_index,
                kind: None,
                enabled,
                address,
                what,
                hits: 0,
            }
        } else {
            let Some(disp) = tokens.iter().position(|t| DISPOSITIONS.contains(t)) else {
                continue;
            };
            let kind = tokens[1..disp].join(" ");
            let enabled = tokens.get(disp + 1).is_some_and(|t| t.starts_with('y'));
            let (address, what) = split_address(&tokens[(disp + 2).min(tokens.len())..]);
            BreakpointEntry {
                number,
                location_index,
                kind: Some(kind),
                enabled,
                address,
                what,
                hits: 0,
            }
        };
        entries.push(entry);
    }

    entries
}

/// Resolved code locations of breakpoint `number`: location rows when it fans
/// out, otherwise the main row itself unless pending.
pub fn resolved_locations(entries: &[BreakpointEntry], number: u32) -> usize {
    let rows: Vec<&BreakpointEntry> = entries.iter().filter(|e| e.number == number).collect();
    let locations = rows.iter().filter(|e| e.location_index.is_some()).count();
    if locations > 0 {
        return locations;
    }
    rows.iter()
        .filter(|e| e.address.is_some() && !e.is_pending() && !e.is_multiple())
        .count()
}

/// The last code address printed in the listing, without its `0x`.
pub fn last_address(output: &str) -> Option<&str> {
    output.rsplit("0x").next().filter(|_| output.contains("0x"))
}

fn parse_number(token: &str) -> Option<(u32, Option<u32>)> {
    match token.split_once('.') {
        Some((main, loc)) => Some((main.parse().ok()?, Some(loc.parse().ok()?))),
        None => Some((token.parse().ok()?, None)),
    }
}

fn split_address(tokens: &[&str]) -> (Option<String>, String) {
    match tokens.first() {
        Some(t) if t.starts_with("0x") || *t == "<PENDING>" || *t == "<MULTIPLE>" => {
            (Some(t.to_string()), tokens[1..].join(" "))
        }
        _ => (None, tokens.join(" ")),
    }
}

fn parse_hit_count(line: &str) -> Option<u32> {
    let rest = line.strip_prefix("breakpoint already hit ")?;
    rest.split_whitespace().next()?.parse().ok()
}
