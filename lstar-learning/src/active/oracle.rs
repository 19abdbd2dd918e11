use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use lstar_core::{
    math::{Map, Set},
    prelude::*,
    show_duration,
};
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::Statistics;

/// The answer to an equivalence query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The hypothesis accepts exactly the target language.
    Equivalent,
    /// The oracle ran out of time before it found a difference. This is not a guarantee of
    /// equivalence, but the learner accepts the hypothesis nonetheless.
    TimedOut,
    /// A word on which hypothesis and target disagree.
    Counterexample(Word),
}

/// Failure of an oracle to produce any answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The oracle cannot be reached or has failed internally.
    #[error("{0}")]
    Unavailable(String),
}

/// A minimally adequate teacher for learning a regular language. It answers membership
/// queries, which ask whether a word belongs to the target language, and equivalence
/// queries, which either confirm a hypothesis or return a counterexample.
///
/// Membership answers must not change over the course of a run. Both kinds of query may
/// block for as long as the oracle needs, the learner waits for every answer before it
/// continues.
pub trait Oracle {
    /// Decides whether `word` belongs to the target language.
    fn membership(&mut self, word: &[Symbol]) -> Result<bool, OracleError>;

    /// Checks whether `hypothesis` accepts the target language. A counterexample must be a
    /// word on which the hypothesis and the target disagree.
    fn equivalence(&mut self, hypothesis: &Automaton) -> Result<Verdict, OracleError>;

    /// Counters about the queries answered so far, if the oracle keeps any.
    fn statistics(&self) -> Option<Statistics> {
        None
    }
}

impl<O: Oracle + ?Sized> Oracle for &mut O {
    fn membership(&mut self, word: &[Symbol]) -> Result<bool, OracleError> {
        (**self).membership(word)
    }

    fn equivalence(&mut self, hypothesis: &Automaton) -> Result<Verdict, OracleError> {
        (**self).equivalence(hypothesis)
    }

    fn statistics(&self) -> Option<Statistics> {
        (**self).statistics()
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn membership(&mut self, word: &[Symbol]) -> Result<bool, OracleError> {
        (**self).membership(word)
    }

    fn equivalence(&mut self, hypothesis: &Automaton) -> Result<Verdict, OracleError> {
        (**self).equivalence(hypothesis)
    }

    fn statistics(&self) -> Option<Statistics> {
        (**self).statistics()
    }
}

/// An oracle that is given by a predicate on words. Equivalence queries compare the
/// hypothesis and the predicate on all words over the alphabet of the hypothesis up to a
/// maximal length, shortest words first, so the first counterexample found is a shortest
/// one. Optionally a time budget bounds the total time spent in equivalence queries,
/// measured from the creation of the oracle. Once it is exhausted, equivalence queries are
/// answered with [`Verdict::TimedOut`].
pub struct PredicateOracle<F> {
    predicate: F,
    max_length: usize,
    time_budget: Option<Duration>,
    created: Instant,
    stats: Statistics,
}

impl<F: Fn(&[Symbol]) -> bool> PredicateOracle<F> {
    /// Creates an oracle that checks words up to length 8.
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            max_length: 8,
            time_budget: None,
            created: Instant::now(),
            stats: Statistics::default(),
        }
    }

    /// Sets the length up to which equivalence queries compare.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Bounds the wall-clock time that may pass before equivalence queries give up.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    fn out_of_time(&self) -> bool {
        self.time_budget
            .is_some_and(|budget| self.created.elapsed() > budget)
    }
}

impl<F: Fn(&[Symbol]) -> bool> Oracle for PredicateOracle<F> {
    fn membership(&mut self, word: &[Symbol]) -> Result<bool, OracleError> {
        self.stats.membership_queries += 1;
        Ok((self.predicate)(word))
    }

    fn equivalence(&mut self, hypothesis: &Automaton) -> Result<Verdict, OracleError> {
        self.stats.equivalence_queries += 1;
        let symbols = hypothesis.alphabet().symbols().to_vec();
        for word in KleeneStar::up_to(symbols, self.max_length) {
            if self.out_of_time() {
                warn!(
                    "time budget exhausted after {}, accepting hypothesis without a complete check",
                    show_duration(self.created.elapsed())
                );
                self.stats.approximate_equivalences += 1;
                return Ok(Verdict::TimedOut);
            }
            if hypothesis.accepts(word.iter().copied()) != (self.predicate)(&word) {
                debug!("found counterexample {}", word.show());
                return Ok(Verdict::Counterexample(word));
            }
        }
        Ok(Verdict::Equivalent)
    }

    fn statistics(&self) -> Option<Statistics> {
        Some(self.stats)
    }
}

/// An oracle for the language of a known automaton. Equivalence queries search the product
/// of target and hypothesis breadth first and return a shortest word on which they differ,
/// so the answers are exact.
#[derive(Debug, Clone)]
pub struct AutomatonOracle {
    target: Automaton,
    stats: Statistics,
}

impl AutomatonOracle {
    /// Creates an oracle for the language of `target`.
    pub fn new(target: Automaton) -> Self {
        Self {
            target,
            stats: Statistics::default(),
        }
    }

    /// The automaton whose language is taught.
    pub fn target(&self) -> &Automaton {
        &self.target
    }
}

type ProductState = (Option<StateId>, Option<StateId>);

impl Oracle for AutomatonOracle {
    fn membership(&mut self, word: &[Symbol]) -> Result<bool, OracleError> {
        self.stats.membership_queries += 1;
        Ok(self.target.accepts(word.iter().copied()))
    }

    fn equivalence(&mut self, hypothesis: &Automaton) -> Result<Verdict, OracleError> {
        self.stats.equivalence_queries += 1;
        let accepting = |aut: &Automaton, q: Option<StateId>| {
            q.and_then(|q| aut.state(q))
                .is_some_and(|state| state.is_accepting())
        };
        let origin: ProductState = (
            self.target.start_states().next(),
            hypothesis.start_states().next(),
        );

        let mut seen: Set<ProductState> = Set::default();
        let mut access: Map<ProductState, Word> = Map::default();
        let mut queue = VecDeque::from([origin]);
        seen.insert(origin);
        access.insert(origin, vec![]);

        while let Some(pair) = queue.pop_front() {
            let current = access.get(&pair).cloned().unwrap_or_default();
            if accepting(&self.target, pair.0) != accepting(hypothesis, pair.1) {
                debug!("found counterexample {}", current.show());
                return Ok(Verdict::Counterexample(current));
            }
            for sym in self.target.alphabet().universe() {
                let next = (
                    pair.0.and_then(|q| self.target.successor(q, sym)),
                    pair.1.and_then(|q| hypothesis.successor(q, sym)),
                );
                if seen.insert(next) {
                    trace!("visiting product state {next:?}");
                    access.insert(next, word::extend(&current, sym));
                    queue.push_back(next);
                }
            }
        }
        Ok(Verdict::Equivalent)
    }

    fn statistics(&self) -> Option<Statistics> {
        Some(self.stats)
    }
}

/// Wraps an oracle and remembers the answers to membership queries. The cache lives as long
/// as the wrapper, which should therefore not outlive a single run. Words shorter than a
/// minimal length are rejected without asking, which is useful when the target is known to
/// only accept long words.
pub struct CachingOracle<O> {
    inner: O,
    cache: Map<Word, bool>,
    min_length: usize,
    stats: Statistics,
}

impl<O: Oracle> CachingOracle<O> {
    /// Wraps `inner` with an empty cache.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            cache: Map::default(),
            min_length: 0,
            stats: Statistics::default(),
        }
    }

    /// Answers membership queries for words shorter than `min_length` with `false`.
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// The number of cached answers.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Gives back the wrapped oracle.
    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<O: Oracle> Oracle for CachingOracle<O> {
    fn membership(&mut self, word: &[Symbol]) -> Result<bool, OracleError> {
        self.stats.membership_queries += 1;
        if word.len() < self.min_length {
            // counted as a hit, the answer is known without forwarding
            self.stats.cache_hits += 1;
            return Ok(false);
        }
        if let Some(answer) = self.cache.get(word) {
            self.stats.cache_hits += 1;
            return Ok(*answer);
        }
        self.stats.cache_misses += 1;
        let answer = self.inner.membership(word)?;
        self.cache.insert(word.to_vec(), answer);
        Ok(answer)
    }

    fn equivalence(&mut self, hypothesis: &Automaton) -> Result<Verdict, OracleError> {
        self.stats.equivalence_queries += 1;
        let verdict = self.inner.equivalence(hypothesis)?;
        if verdict == Verdict::TimedOut {
            self.stats.approximate_equivalences += 1;
        }
        Ok(verdict)
    }

    fn statistics(&self) -> Option<Statistics> {
        Some(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lstar_core::prelude::*;

    use super::{AutomatonOracle, CachingOracle, Oracle, PredicateOracle, Verdict};

    fn accept_all() -> Automaton {
        AutomatonBuilder::default()
            .with_alphabet(Alphabet::from("ab"))
            .with_initial(0)
            .with_accepting([0])
            .with_class_transitions([(0, CharClass::compress("ab".chars()), 0)])
            .build()
            .unwrap()
    }

    #[test_log::test]
    fn predicate_oracle_finds_shortest_counterexample() {
        let mut oracle = PredicateOracle::new(|w: &[char]| !w.contains(&'b'));
        assert_eq!(oracle.membership(&['a', 'a']), Ok(true));
        assert_eq!(
            oracle.equivalence(&accept_all()),
            Ok(Verdict::Counterexample(vec!['b']))
        );
        let mut all = PredicateOracle::new(|_: &[char]| true).with_max_length(4);
        assert_eq!(all.equivalence(&accept_all()), Ok(Verdict::Equivalent));
        let stats = oracle.statistics().unwrap();
        assert_eq!(stats.membership_queries, 1);
        assert_eq!(stats.equivalence_queries, 1);
    }

    #[test_log::test]
    fn exhausted_budget_times_out() {
        let mut oracle =
            PredicateOracle::new(|_: &[char]| false).with_time_budget(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(oracle.equivalence(&accept_all()), Ok(Verdict::TimedOut));
        assert_eq!(oracle.statistics().unwrap().approximate_equivalences, 1);
    }

    #[test_log::test]
    fn automaton_oracle_is_exact() {
        // words that end in `b`
        let target = AutomatonBuilder::default()
            .with_initial(0)
            .with_accepting([1])
            .with_transitions([(0, 'a', 0), (0, 'b', 1), (1, 'a', 0), (1, 'b', 1)])
            .build()
            .unwrap();
        let mut oracle = AutomatonOracle::new(target.clone());
        assert_eq!(oracle.membership(&['a', 'b']), Ok(true));
        assert_eq!(
            oracle.equivalence(&accept_all()),
            Ok(Verdict::Counterexample(vec![]))
        );
        assert_eq!(oracle.equivalence(&target), Ok(Verdict::Equivalent));

        let partial = AutomatonBuilder::default()
            .with_alphabet(Alphabet::from("ab"))
            .with_initial(0)
            .with_transitions([(0, 'a', 0)])
            .build()
            .unwrap();
        assert_eq!(
            oracle.equivalence(&partial),
            Ok(Verdict::Counterexample(vec!['b']))
        );
    }

    #[test_log::test]
    fn caching_forwards_each_word_once() {
        let mut oracle =
            CachingOracle::new(PredicateOracle::new(|w: &[char]| w.len() % 2 == 0))
                .with_min_length(2);
        assert_eq!(oracle.membership(&[]), Ok(false));
        assert_eq!(oracle.membership(&['a', 'b']), Ok(true));
        assert_eq!(oracle.membership(&['a', 'b']), Ok(true));
        assert_eq!(oracle.membership(&['a', 'b', 'a']), Ok(false));

        let stats = oracle.statistics().unwrap();
        assert_eq!(stats.membership_queries, 4);
        assert_eq!(stats.cache_hits, 2);
        assert_eq!(stats.cache_misses, 2);
        assert_eq!(oracle.cached(), 2);
        let inner = oracle.into_inner();
        assert_eq!(inner.statistics().unwrap().membership_queries, 2);
    }
}
