use serde::Serialize;
use std::collections::BTreeMap;

/// Handle for one `break <symbol>` request. A single symbol may resolve to
/// several code locations, e.g. its AOT body and a JIT-installed copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakpointSet {
    pub number: u32,
    pub symbol: String,
    pub locations: usize,
    /// Set before the owning module was loaded; resolves later on its own.
    pub pending: bool,
}

/// Breakpoints requested in the current session, keyed by symbol.
#[derive(Debug, Default)]
pub struct Breakpoints {
    sets: BTreeMap<String, BreakpointSet>,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, set: BreakpointSet) {
        tracing::info!(
            symbol = %set.symbol,
            number = set.number,
            locations = set.locations,
            pending = set.pending,
            "breakpoint set"
        );
        self.sets.insert(set.symbol.clone(), set);
    }

    pub fn get(&self, symbol: &str) -> Option<&BreakpointSet> {
        self.sets.get(symbol)
    }

    /// Record a fresh location count read back from the debugger.
    pub fn update_locations(&mut self, symbol: &str, locations: usize) -> Option<&BreakpointSet> {
        let set = self.sets.get_mut(symbol)?;
        if set.locations != locations {
            tracing::debug!(
                symbol,
                before = set.locations,
                after = locations,
                "breakpoint locations changed"
            );
        }
        set.locations = locations;
        set.pending = locations == 0;
        Some(set)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BreakpointSet> {
        self.sets.values()
    }

    pub fn clear(&mut self) {
        self.sets.clear();
    }
}
