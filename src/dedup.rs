use std::collections::HashSet;

/// Tracks the `uri`s seen during one build run. First occurrence wins.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
    repeated: u64,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `uri` is seen and `false` afterwards.
    pub fn admit(&mut self, uri: &str) -> bool {
        if !self.seen.insert(uri.to_string()) {
            self.repeated += 1;
            return false;
        }
        true
    }

    pub fn repeated(&self) -> u64 {
        self.repeated
    }

    pub fn distinct(&self) -> usize {
        self.seen.len()
    }
}
