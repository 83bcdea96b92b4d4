/// Strip the value-history prefix of `print` output: `$3 = 42` becomes `42`.
pub fn strip_history_prefix(output: &str) -> Option<&str> {
    let rest = output.trim_start().strip_prefix('$')?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    rest[digits..].strip_prefix(" = ")
}

/// Find the byte index of the parenthesis closing the one at `open`,
/// honoring double-quoted strings and backslash escapes.
pub fn matching_paren(text: &str, open: usize) -> Option<usize> {
    if text.as_bytes().get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, ch) in text[open..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if !in_quotes {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(open + i);
                    }
                }
                _ => {}
            }
        }
    }
    None
}

/// Number of non-overlapping occurrences of `needle`.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// GDB error messages that mean the command did nothing.
const ERROR_MARKERS: &[&str] = &[
    "No symbol ",
    "No frame selected.",
    "The program is not being run.",
    "No symbol table is loaded.",
    "Cannot access memory at address",
    "not meaningful in the outermost frame",
    "No such file or directory.",
    "Undefined ",
    "A syntax error in expression",
];

/// First line of `output` that carries a GDB error message.
pub fn error_line(output: &str) -> Option<&str> {
    output
        .lines()
        .map(str::trim)
        .find(|line| ERROR_MARKERS.iter().any(|m| line.contains(m)))
}

/// The first non-empty line, when it is a GDB error message. Unlike
/// [`error_line`] this ignores errors embedded in rendered values.
pub fn leading_error(output: &str) -> Option<&str> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| ERROR_MARKERS.iter().any(|m| line.contains(m)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_prefix() {
        assert_eq!(strip_history_prefix("$1 = 42"), Some("42"));
        assert_eq!(strip_history_prefix("$127 = \"test\""), Some("\"test\""));
        assert_eq!(strip_history_prefix("$ = 1"), None);
        assert_eq!(strip_history_prefix("No symbol \"x\" in current context."), None);
    }

    #[test]
    fn paren_matching_skips_quoted_parens() {
        let text = r#"f (a="x)y", b=g(1)) at F.java:3"#;
        let open = text.find('(').unwrap();
        let close = matching_paren(text, open).unwrap();
        assert_eq!(&text[open..=close], r#"(a="x)y", b=g(1))"#);
    }

    #[test]
    fn paren_matching_unbalanced() {
        assert_eq!(matching_paren("f (a, b", 2), None);
        assert_eq!(matching_paren("f a", 0), None);
    }

    #[test]
    fn error_lines() {
        assert_eq!(
            error_line("No symbol \"param9\" in current context."),
            Some("No symbol \"param9\" in current context.")
        );
        assert_eq!(error_line("$1 = 3"), None);
        assert_eq!(
            error_line("Undefined maintenance set command: \"dwarf type-signature-fallback\".  Try \"help maintenance set\"."),
            Some("Undefined maintenance set command: \"dwarf type-signature-fallback\".  Try \"help maintenance set\".")
        );
    }

    #[test]
    fn leading_errors_only() {
        assert_eq!(
            leading_error("\nThe program is not being run.\n"),
            Some("The program is not being run.")
        );
        assert_eq!(
            leading_error("Breakpoint 1, f (this=<error: Cannot access memory at address 0x8>) at F.java:2"),
            None
        );
    }
}
