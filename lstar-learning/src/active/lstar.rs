use std::fmt::Display;

use lstar_core::{prelude::*, show_duration};
use tracing::{debug, info, trace, warn};

use super::{LStarConfig, ObservationTable, Oracle, Statistics, Verdict};
use crate::LearnError;

/// The stage a run of [`LStar`] is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The table is being made closed and consistent.
    BuildingTable,
    /// A hypothesis has been built and awaits the verdict of the oracle.
    HypothesisReady,
    /// The oracle accepted the last hypothesis, the run is over.
    Done,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::BuildingTable => write!(f, "building table"),
            Phase::HypothesisReady => write!(f, "hypothesis ready"),
            Phase::Done => write!(f, "done"),
        }
    }
}

/// An implementation of Angluin's L* algorithm, which learns the minimal deterministic
/// automaton for a regular language by asking membership and equivalence queries.
///
/// The learner owns an [`ObservationTable`] and repeats the following rounds. First the
/// table is made closed and consistent, then the hypothesis it describes is built and
/// pruned of dead states and handed to the oracle. If the oracle accepts it, the run ends,
/// otherwise all prefixes of the counterexample are added to the table.
///
/// ```
/// use lstar_core::prelude::*;
/// use lstar_learning::active::{LStar, PredicateOracle};
///
/// let oracle = PredicateOracle::new(|w: &[char]| w.iter().filter(|c| **c == 'a').count() % 2 == 0);
/// let learned = LStar::new(Alphabet::from("ab"), oracle).infer().unwrap();
/// assert_eq!(learned.size(), 2);
/// ```
pub struct LStar<O> {
    table: ObservationTable<O>,
    config: LStarConfig,
    phase: Phase,
    iterations: usize,
    rounds: usize,
    approximate: usize,
}

impl<O: Oracle> LStar<O> {
    /// Creates a learner for a language over `alphabet`, bounded by the configuration that
    /// [`LStarConfig::from_env`] yields.
    pub fn new(alphabet: Alphabet, oracle: O) -> Self {
        Self {
            table: ObservationTable::new(alphabet, oracle),
            config: LStarConfig::from_env(),
            phase: Phase::BuildingTable,
            iterations: 0,
            rounds: 0,
            approximate: 0,
        }
    }

    /// Replaces the bounds of the run.
    pub fn with_config(mut self, config: LStarConfig) -> Self {
        self.config = config;
        self
    }

    /// The stage the run is in.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The observation table in its current state.
    pub fn table(&self) -> &ObservationTable<O> {
        &self.table
    }

    /// Mutable access to the observation table, e.g. to check it for closedness.
    pub fn table_mut(&mut self) -> &mut ObservationTable<O> {
        &mut self.table
    }

    /// Ends the run and gives back the oracle.
    pub fn into_oracle(self) -> O {
        self.table.into_oracle()
    }

    /// Counters for the queries that the learner has posed so far. Membership queries are
    /// counted as they are asked of the table, so answers that the table already knew
    /// count as cache hits.
    pub fn statistics(&self) -> Statistics {
        Statistics {
            equivalence_queries: self.rounds,
            approximate_equivalences: self.approximate,
            ..self.table.statistics()
        }
    }

    fn tick(&mut self) -> Result<(), LearnError> {
        self.iterations += 1;
        if self.iterations > self.config.max_iterations {
            return Err(LearnError::ResourceExhausted {
                resource: "iterations",
                limit: self.config.max_iterations,
            });
        }
        Ok(())
    }

    fn check_states(&self, states: usize) -> Result<(), LearnError> {
        match self.config.max_states {
            Some(limit) if states > limit => Err(LearnError::ResourceExhausted {
                resource: "states",
                limit,
            }),
            _ => Ok(()),
        }
    }

    /// Extends the table until it is closed and consistent at the same time. Resolving an
    /// inconsistency takes precedence over closing the table, and after every change both
    /// properties are checked again.
    pub fn close(&mut self) -> Result<(), LearnError> {
        self.phase = Phase::BuildingTable;
        loop {
            if let Some(witness) = self.table.find_inconsistency()? {
                self.tick()?;
                trace!(
                    "{} and {} are told apart by {}",
                    witness.left.show(),
                    witness.right.show(),
                    word::prepend(witness.symbol, &witness.suffix).show()
                );
                if !self.table.add_suffix(witness.symbol, &witness.suffix)? {
                    return Err(LearnError::InvariantViolated(format!(
                        "distinguishing experiment {} is already present",
                        word::prepend(witness.symbol, &witness.suffix).show()
                    )));
                }
                continue;
            }
            if let Some((prefix, symbol)) = self.table.find_unclosed()? {
                self.tick()?;
                if !self.table.add_prefix(&prefix, symbol)? {
                    return Err(LearnError::InvariantViolated(format!(
                        "row of {} is already represented",
                        word::extend(&prefix, symbol).show()
                    )));
                }
                continue;
            }
            break;
        }
        let rows = self.table.partition()?.len();
        self.check_states(rows)?;
        debug!(
            "table closed and consistent with {} prefixes, {} experiments and {rows} rows",
            self.table.prefixes().count(),
            self.table.experiments().count()
        );
        trace!("observation table\n{:?}", self.table);
        Ok(())
    }

    /// Builds the hypothesis of the current table and prunes its dead states. The table is
    /// expected to be closed and consistent, see [`LStar::close`].
    pub fn hypothesis(&mut self) -> Result<Automaton, LearnError> {
        let mut hypothesis = self.table.hypothesis()?;
        let removed = hypothesis.prune();
        self.check_states(hypothesis.size())?;
        debug!(
            "hypothesis has {} states after pruning {}",
            hypothesis.size(),
            removed.len()
        );
        self.phase = Phase::HypothesisReady;
        Ok(hypothesis)
    }

    /// Runs the algorithm until the oracle accepts a hypothesis, which is then returned.
    pub fn infer(&mut self) -> Result<Automaton, LearnError> {
        let start = std::time::Instant::now();
        info!(
            "starting L* over alphabet {}",
            self.table.alphabet()
        );
        loop {
            self.close()?;
            let hypothesis = self.hypothesis()?;
            self.tick()?;
            self.rounds += 1;
            info!(
                "equivalence query {} with a hypothesis of {} states",
                self.rounds,
                hypothesis.size()
            );
            match self.table.oracle_mut().equivalence(&hypothesis)? {
                Verdict::Equivalent => {
                    self.phase = Phase::Done;
                    info!(
                        "learned {} states in {} rounds, took {}",
                        hypothesis.size(),
                        self.rounds,
                        show_duration(start.elapsed())
                    );
                    return Ok(hypothesis);
                }
                Verdict::TimedOut => {
                    self.phase = Phase::Done;
                    self.approximate += 1;
                    warn!(
                        "oracle timed out, keeping the hypothesis with {} states after {}",
                        hypothesis.size(),
                        show_duration(start.elapsed())
                    );
                    return Ok(hypothesis);
                }
                Verdict::Counterexample(word) => {
                    self.process_counterexample(&hypothesis, word)?;
                }
            }
        }
    }

    /// Runs [`LStar::infer`] and derives a regular expression for the learned language from
    /// the final hypothesis.
    pub fn infer_regex(&mut self) -> Result<Regex, LearnError> {
        let hypothesis = self.infer()?;
        let regex = hypothesis.to_regex()?;
        info!("learned expression {regex} of size {}", regex.size());
        Ok(regex)
    }

    fn process_counterexample(
        &mut self,
        hypothesis: &Automaton,
        counterexample: Word,
    ) -> Result<(), LearnError> {
        if let Some(symbol) = self.table.alphabet().first_foreign_symbol(&counterexample) {
            return Err(LearnError::MalformedCounterexample {
                word: counterexample.iter().collect(),
                symbol,
            });
        }
        let expected = self.table.membership(&counterexample)?;
        if hypothesis.accepts(counterexample.iter().copied()) == expected {
            return Err(LearnError::SpuriousCounterexample(counterexample.show()));
        }
        let added = self.table.add_prefixes_of(&counterexample);
        debug!(
            "counterexample {} contributed {added} new prefixes",
            counterexample.show()
        );
        Ok(())
    }
}

impl<O> std::fmt::Debug for LStar<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "L* ({}, iteration {})", self.phase, self.iterations)?;
        write!(f, "{:?}", self.table)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use lstar_core::prelude::*;

    use super::{LStar, Phase};
    use crate::{
        active::{
            AutomatonOracle, CachingOracle, LStarConfig, Oracle, OracleError, PredicateOracle,
            Verdict,
        },
        LearnError,
    };

    /// Answers the first equivalence queries from a script and defers everything else.
    struct Scripted<O> {
        answers: VecDeque<Verdict>,
        inner: O,
    }

    impl<O: Oracle> Oracle for Scripted<O> {
        fn membership(&mut self, word: &[char]) -> Result<bool, OracleError> {
            self.inner.membership(word)
        }

        fn equivalence(&mut self, hypothesis: &Automaton) -> Result<Verdict, OracleError> {
            match self.answers.pop_front() {
                Some(verdict) => Ok(verdict),
                None => self.inner.equivalence(hypothesis),
            }
        }
    }

    fn scripted<O>(inner: O, answers: impl IntoIterator<Item = Verdict>) -> Scripted<O> {
        Scripted {
            answers: answers.into_iter().collect(),
            inner,
        }
    }

    fn ab_star(w: &[char]) -> bool {
        w.len() % 2 == 0 && w.chunks(2).all(|c| c == ['a', 'b'])
    }

    fn a_star_or_b_star(w: &[char]) -> bool {
        w.iter().all(|c| *c == 'a') || w.iter().all(|c| *c == 'b')
    }

    fn config() -> LStarConfig {
        LStarConfig::default().with_max_iterations(300)
    }

    #[test_log::test]
    fn learns_alternating_words() {
        let mut lstar =
            LStar::new(Alphabet::from("ab"), PredicateOracle::new(ab_star)).with_config(config());
        let learned = lstar.infer().unwrap();
        assert_eq!(lstar.phase(), Phase::Done);
        // the rejecting sink is pruned
        assert_eq!(learned.size(), 2);

        let regex = learned.to_regex().unwrap();
        for word in KleeneStar::up_to(vec!['a', 'b'], 6) {
            assert_eq!(regex.matches(&word), ab_star(&word), "{regex} on {word:?}");
        }
        for (word, expected) in [("", true), ("ab", true), ("abab", true), ("a", false), ("aab", false)] {
            assert_eq!(learned.accepts(word.chars()), expected);
        }
    }

    #[test_log::test]
    fn learns_expression() {
        let mut lstar =
            LStar::new(Alphabet::from("ab"), PredicateOracle::new(ab_star)).with_config(config());
        let regex = lstar.infer_regex().unwrap();
        assert_eq!(regex.to_string(), "(ab)*");
        assert_eq!(lstar.phase(), Phase::Done);
    }

    #[test_log::test]
    fn incorporates_counterexample() {
        let oracle = scripted(
            PredicateOracle::new(a_star_or_b_star),
            [Verdict::Counterexample("aaab".into_word())],
        );
        let mut lstar = LStar::new(Alphabet::from("ab"), oracle).with_config(config());
        let learned = lstar.infer().unwrap();
        assert!(!learned.accepts("aaab".chars()));
        for word in ["", "a", "aaa", "bbb"] {
            assert!(learned.accepts(word.chars()), "rejects {word}");
        }
        for prefix in ["", "a", "aa", "aaa", "aaab"] {
            assert!(lstar.table().prefixes().any(|p| *p == prefix.into_word()));
        }
        assert!(lstar.statistics().equivalence_queries >= 2);
    }

    #[test_log::test]
    fn empty_language_in_one_round() {
        let mut lstar = LStar::new(Alphabet::from("ab"), PredicateOracle::new(|_: &[char]| false))
            .with_config(config());
        let learned = lstar.infer().unwrap();
        assert_eq!(learned.size(), 1);
        let start = learned.state(0).unwrap();
        assert!(start.is_initial() && !start.is_accepting());
        assert_eq!(lstar.statistics().equivalence_queries, 1);
        assert_eq!(learned.to_regex().unwrap(), Regex::Empty);
    }

    #[test_log::test]
    fn table_is_closed_and_consistent_after_closing() {
        let oracle = PredicateOracle::new(|w: &[char]| w.ends_with(&['a', 'b']));
        let mut lstar = LStar::new(Alphabet::from("ab"), oracle).with_config(config());
        lstar.close().unwrap();
        lstar.table_mut().add_prefixes_of(&"babab".into_word());
        lstar.close().unwrap();
        assert!(lstar.table_mut().is_closed().unwrap());
        assert!(lstar.table_mut().is_consistent().unwrap());
        assert_eq!(lstar.phase(), Phase::BuildingTable);
        lstar.hypothesis().unwrap();
        assert_eq!(lstar.phase(), Phase::HypothesisReady);
    }

    #[test_log::test]
    fn learns_target_automaton_exactly() {
        // words over {a, b, c} whose number of `a` is divisible by three
        let target = AutomatonBuilder::default()
            .with_initial(0)
            .with_accepting([0])
            .with_class_transitions([
                (0, CharClass::single('a'), 1),
                (1, CharClass::single('a'), 2),
                (2, CharClass::single('a'), 0),
                (0, CharClass::compress("bc".chars()), 0),
                (1, CharClass::compress("bc".chars()), 1),
                (2, CharClass::compress("bc".chars()), 2),
            ])
            .build()
            .unwrap();
        let oracle = CachingOracle::new(AutomatonOracle::new(target.clone()));
        let mut lstar = LStar::new(target.alphabet().clone(), oracle).with_config(config());
        let learned = lstar.infer().unwrap();
        assert_eq!(learned.size(), 3);

        let stats = lstar.into_oracle().statistics().unwrap();
        assert!(stats.cache_misses <= stats.membership_queries);
        assert!(stats.equivalence_queries >= 1);

        let mut check = AutomatonOracle::new(target);
        assert_eq!(check.equivalence(&learned), Ok(Verdict::Equivalent));
    }

    #[test_log::test]
    fn timed_out_hypothesis_is_accepted() {
        let oracle = scripted(PredicateOracle::new(ab_star), [Verdict::TimedOut]);
        let mut lstar = LStar::new(Alphabet::from("ab"), oracle).with_config(config());
        lstar.infer().unwrap();
        assert_eq!(lstar.statistics().approximate_equivalences, 1);
        assert_eq!(lstar.phase(), Phase::Done);
    }

    #[test_log::test]
    fn malformed_counterexample() {
        let oracle = scripted(
            PredicateOracle::new(ab_star),
            [Verdict::Counterexample("abx".into_word())],
        );
        let result = LStar::new(Alphabet::from("ab"), oracle)
            .with_config(config())
            .infer();
        assert_eq!(
            result,
            Err(LearnError::MalformedCounterexample {
                word: "abx".to_string(),
                symbol: 'x'
            })
        );
    }

    #[test_log::test]
    fn spurious_counterexample() {
        // the first hypothesis already accepts `ab`
        let oracle = scripted(
            PredicateOracle::new(ab_star),
            [Verdict::Counterexample("ab".into_word())],
        );
        let result = LStar::new(Alphabet::from("ab"), oracle)
            .with_config(config())
            .infer();
        assert_eq!(result, Err(LearnError::SpuriousCounterexample("ab".to_string())));
    }

    struct Offline;

    impl Oracle for Offline {
        fn membership(&mut self, _word: &[char]) -> Result<bool, OracleError> {
            Err(OracleError::Unavailable("connection refused".to_string()))
        }

        fn equivalence(&mut self, _hypothesis: &Automaton) -> Result<Verdict, OracleError> {
            Err(OracleError::Unavailable("connection refused".to_string()))
        }
    }

    #[test_log::test]
    fn unavailable_oracle_aborts() {
        let result = LStar::new(Alphabet::from("ab"), Offline).infer();
        assert_eq!(
            result,
            Err(LearnError::OracleUnavailable(OracleError::Unavailable(
                "connection refused".to_string()
            )))
        );
    }

    #[test_log::test]
    fn bounds_are_enforced() {
        let result = LStar::new(Alphabet::from("ab"), PredicateOracle::new(ab_star))
            .with_config(LStarConfig::default().with_max_iterations(1))
            .infer();
        assert_eq!(
            result,
            Err(LearnError::ResourceExhausted {
                resource: "iterations",
                limit: 1
            })
        );

        let result = LStar::new(Alphabet::from("ab"), PredicateOracle::new(ab_star))
            .with_config(config().with_max_states(1))
            .infer();
        assert_eq!(
            result,
            Err(LearnError::ResourceExhausted {
                resource: "states",
                limit: 1
            })
        );
    }
}
