use std::fmt::Display;

/// Counters that oracles keep about the queries they were asked. They are informational
/// only and have no influence on a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Membership queries that were posed.
    pub membership_queries: usize,
    /// Membership queries answered from the cache.
    pub cache_hits: usize,
    /// Membership queries that had to be forwarded.
    pub cache_misses: usize,
    /// Equivalence queries that were posed.
    pub equivalence_queries: usize,
    /// Equivalence queries that were answered without a complete check.
    pub approximate_equivalences: usize,
}

impl Statistics {
    /// The fraction of membership queries that were answered from the cache.
    pub fn hit_rate(&self) -> f64 {
        if self.membership_queries == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.membership_queries as f64
        }
    }
}

impl Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "membership queries: {}", self.membership_queries)?;
        writeln!(f, "cache hits: {}", self.cache_hits)?;
        writeln!(f, "cache misses: {}", self.cache_misses)?;
        writeln!(f, "equivalence queries: {}", self.equivalence_queries)?;
        write!(
            f,
            "approximate equivalences: {}",
            self.approximate_equivalences
        )
    }
}
