use super::text::{error_line, strip_history_prefix};
use super::types::{TypeDescription, VariableValue, OPTIMIZED_OUT};

/// Interpret `print <expr>` output. `Err` carries the debugger's message.
///
/// Warnings may precede the `$N = ` line; the value runs from there to the
/// end of the output.
pub fn parse_print(output: &str) -> Result<VariableValue, String> {
    let mut offset = 0;
    for line in output.split_inclusive('\n') {
        if let Some(value) = strip_history_prefix(line) {
            let start = offset + line.len() - value.len();
            let value = output[start..].trim_end();
            return Ok(if value == OPTIMIZED_OUT {
                VariableValue::OptimizedOut
            } else {
                VariableValue::Available(value.to_string())
            });
        }
        offset += line.len();
    }
    Err(error_message(output.trim()))
}

/// Interpret `ptype <expr>` output, keeping the `type = ` prefix.
pub fn parse_ptype(output: &str) -> Result<TypeDescription, String> {
    let trimmed = output.trim_start();
    match trimmed.find("type = ") {
        Some(start) if error_line(&trimmed[..start]).is_none() => {
            Ok(TypeDescription(trimmed[start..].to_string()))
        }
        _ => Err(error_message(trimmed)),
    }
}

fn error_message(output: &str) -> String {
    error_line(output)
        .or_else(|| output.lines().next())
        .unwrap_or("no output")
        .to_string()
}
