use super::types::FunctionListing;

/// Parse `info functions <regex>`: debug signatures (with their line-number
/// prefix removed) and non-debugging symbol names, in listing order.
pub fn parse_function_listing(output: &str) -> FunctionListing {
    let mut signatures = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with("All ")
            || trimmed.starts_with("File ")
            || trimmed.starts_with("Non-debugging symbols")
        {
            continue;
        }

        if let Some((prefix, rest)) = trimmed.split_once(':') {
            if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) {
                signatures.push(rest.trim().to_string());
                continue;
            }
        }
        if trimmed.starts_with("0x") {
            if let Some(name) = trimmed.split_once(char::is_whitespace).map(|(_, n)| n.trim()) {
                signatures.push(name.to_string());
            }
            continue;
        }
        if trimmed.ends_with(';') {
            signatures.push(trimmed.to_string());
        }
    }

    FunctionListing {
        raw: output.to_string(),
        signatures,
    }
}
