//! Short, collision-free aliases for tables, derived tables and columns.

use std::collections::HashMap;

/// Hands out `seed + index` names, counting per seed.
///
/// One generator lives for one translation run, so the same query always
/// yields the same aliases (`b0`, `b1`, `sq0`, `UserId_jk0`).
#[derive(Debug, Clone, Default)]
pub struct UniqueNameGenerator {
    counters: HashMap<String, usize>,
}

impl UniqueNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused name for `seed`.
    pub fn next(&mut self, seed: &str) -> String {
        let counter = self.counters.entry(seed.to_string()).or_insert(0);
        let name = format!("{}{}", seed, counter);
        *counter += 1;
        name
    }
}
