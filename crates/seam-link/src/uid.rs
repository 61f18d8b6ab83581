//! Fresh identifier generation for one linking run.

use rustc_hash::{FxHashMap, FxHashSet};

/// Hands out names that collide with nothing the run has seen.
///
/// Every name registered with [`reserve`](Self::reserve) or produced by
/// [`fresh`](Self::fresh) is taken for the rest of the run. Suffixes grow
/// monotonically per base name: `foo$1`, `foo$2`, ...
#[derive(Debug, Default, Clone)]
pub struct UidGenerator {
    taken: FxHashSet<String>,
    counters: FxHashMap<String, u32>,
}

impl UidGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// A new name derived from `base`.
    pub fn fresh(&mut self, base: &str) -> String {
        let counter = self.counters.entry(base.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{base}${counter}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Forget everything, ready for the next run.
    pub fn reset(&mut self) {
        self.taken.clear();
        self.counters.clear();
    }
}
