use tracing::warn;

/// Default bound on the number of iterations of a run. Debug builds give up much earlier.
pub const ITERATION_THRESHOLD: usize = if cfg!(debug_assertions) { 300 } else { 200000 };

/// Bounds for a single learning run, which protect against targets that are not regular.
/// Iterations count every change of the observation table as well as every equivalence
/// query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LStarConfig {
    /// Bound on the number of iterations.
    pub max_iterations: usize,
    /// Optional bound on the number of states of a hypothesis.
    pub max_states: Option<usize>,
}

impl Default for LStarConfig {
    fn default() -> Self {
        Self {
            max_iterations: ITERATION_THRESHOLD,
            max_states: None,
        }
    }
}

impl LStarConfig {
    /// Starts from the defaults and overrides them with the values of the environment
    /// variables `LSTAR_MAX_ITERATIONS` and `LSTAR_MAX_STATES`, if they are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(value) = parse_var("LSTAR_MAX_ITERATIONS", &lookup) {
            config.max_iterations = value;
        }
        if let Some(value) = parse_var("LSTAR_MAX_STATES", &lookup) {
            config.max_states = Some(value);
        }
        config
    }

    /// Sets the bound on the number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the bound on the number of hypothesis states.
    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = Some(max_states);
        self
    }
}

fn parse_var(key: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("ignoring {key}={raw:?}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LStarConfig, ITERATION_THRESHOLD};

    #[test_log::test]
    fn environment_overrides() {
        let config = LStarConfig::from_lookup(|key| match key {
            "LSTAR_MAX_ITERATIONS" => Some("42".to_string()),
            "LSTAR_MAX_STATES" => Some("many".to_string()),
            _ => None,
        });
        assert_eq!(config.max_iterations, 42);
        assert_eq!(config.max_states, None);

        let config = LStarConfig::from_lookup(|_| None).with_max_states(3);
        assert_eq!(config.max_iterations, ITERATION_THRESHOLD);
        assert_eq!(config.max_states, Some(3));
    }
}
