/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
/// Iteration follows insertion order, which keeps every scan over a set reproducible.
pub type Set<S> = indexmap::IndexSet<S>;

/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
/// Iteration follows insertion order.
pub type Map<K, V> = indexmap::IndexMap<K, V>;
