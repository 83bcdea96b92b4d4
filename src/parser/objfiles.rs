use super::types::{LoadedModule, IN_MEMORY_PREFIX};

/// Parse `maintenance info objfiles`: one module per `Object file NAME:` header.
pub fn parse_objfiles(output: &str) -> Vec<LoadedModule> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Object file "))
        .filter_map(|rest| {
            let end = rest.find(":  Objfile").or_else(|| rest.rfind(':'))?;
            let name = rest[..end].trim();
            if name.is_empty() {
                return None;
            }
            Some(LoadedModule {
                name: name.to_string(),
                in_memory: name.starts_with(IN_MEMORY_PREFIX),
            })
        })
        .collect()
}

pub fn count_in_memory(modules: &[LoadedModule]) -> usize {
    modules.iter().filter(|m| m.in_memory).count()
}
