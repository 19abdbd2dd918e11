use lstar_core::prelude::*;
use thiserror::Error;

use crate::active::OracleError;

/// Everything that can end a learning run before it has converged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LearnError {
    /// The oracle could not answer a query at all.
    #[error("oracle unavailable: {0}")]
    OracleUnavailable(#[from] OracleError),
    /// The oracle returned a counterexample with a symbol outside of the alphabet.
    #[error("counterexample \"{word}\" contains symbol {} that is not in the alphabet", .symbol.show())]
    MalformedCounterexample {
        /// The counterexample as it was received.
        word: String,
        /// The first offending symbol.
        symbol: Symbol,
    },
    /// The oracle returned a word on which the hypothesis and the target agree.
    #[error("\"{0}\" is not a counterexample, hypothesis and target agree on it")]
    SpuriousCounterexample(String),
    /// The hypothesis could not be turned into a regular expression.
    #[error(transparent)]
    IllFormedAutomaton(#[from] IllFormedAutomaton),
    /// A configured bound was hit, the target is possibly not regular.
    #[error("exceeded the limit of {limit} {resource}")]
    ResourceExhausted {
        /// What ran out, e.g. iterations or states.
        resource: &'static str,
        /// The configured bound.
        limit: usize,
    },
    /// An internal invariant does not hold, which points to a bug.
    #[error("invariant violated: {0}")]
    InvariantViolated(String),
}

impl From<AutomatonError> for LearnError {
    fn from(value: AutomatonError) -> Self {
        LearnError::InvariantViolated(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use lstar_core::prelude::*;

    use super::LearnError;

    #[test]
    fn ill_formed_hypothesis_is_reported() {
        let convert = |aut: Automaton| -> Result<Regex, LearnError> { Ok(aut.to_regex()?) };
        let result = convert(Automaton::new(Alphabet::from("ab")));
        assert_eq!(
            result,
            Err(LearnError::IllFormedAutomaton(IllFormedAutomaton::NoStartState))
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "the automaton has no start state"
        );
    }
}
