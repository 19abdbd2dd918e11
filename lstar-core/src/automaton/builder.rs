use itertools::Itertools;

use crate::{
    alphabet::{Alphabet, Symbol},
    class::CharClass,
};

use super::{Automaton, AutomatonError, StateId};

/// Helper struct for the construction of automata from lists of edges. States are numbered
/// from zero and created in ascending order, so the ids used in the edges are the ids of the
/// resulting states. Every number up to the largest one mentioned anywhere becomes a state.
///
/// # Example
///
/// We want an automaton with two states 0 and 1 over the alphabet `['a', 'b']` that accepts
/// the words with an odd number of `b`s. State 0 is initial and state 1 is accepting.
/// ```
/// use lstar_core::prelude::*;
///
/// let aut = AutomatonBuilder::default()
///     .with_initial(0)
///     .with_accepting([1])
///     .with_transitions([(0, 'a', 0), (0, 'b', 1), (1, 'a', 1), (1, 'b', 0)])
///     .build()
///     .unwrap();
/// assert!(aut.accepts("abaa".chars()));
/// assert!(!aut.accepts("bb".chars()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutomatonBuilder {
    alphabet: Option<Alphabet>,
    initial: Vec<StateId>,
    accepting: Vec<StateId>,
    states: usize,
    edges: Vec<(StateId, CharClass, StateId)>,
}

impl AutomatonBuilder {
    /// Fixes the alphabet. Without it, the alphabet consists of the symbols that appear on
    /// some transition, in ascending order.
    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    /// Marks `state` as a start state.
    pub fn with_initial(mut self, state: StateId) -> Self {
        self.initial.push(state);
        self
    }

    /// Marks all given states as accepting.
    pub fn with_accepting<I: IntoIterator<Item = StateId>>(mut self, states: I) -> Self {
        self.accepting.extend(states);
        self
    }

    /// Makes sure that at least `count` states exist, even if some of them have no edges.
    pub fn with_states(mut self, count: usize) -> Self {
        self.states = self.states.max(count);
        self
    }

    /// Adds transitions that are given as `(source, symbol, target)` triples.
    pub fn with_transitions<I: IntoIterator<Item = (StateId, Symbol, StateId)>>(
        mut self,
        iter: I,
    ) -> Self {
        self.edges.extend(
            iter.into_iter()
                .map(|(p, sym, q)| (p, CharClass::single(sym), q)),
        );
        self
    }

    /// Adds transitions that are labelled with whole classes of symbols.
    pub fn with_class_transitions<I: IntoIterator<Item = (StateId, CharClass, StateId)>>(
        mut self,
        iter: I,
    ) -> Self {
        self.edges.extend(iter);
        self
    }

    /// Assembles the automaton, failing if the edges violate determinism or use symbols
    /// outside of a fixed alphabet.
    pub fn build(self) -> Result<Automaton, AutomatonError> {
        let alphabet = self.alphabet.unwrap_or_else(|| {
            Alphabet::new(
                self.edges
                    .iter()
                    .flat_map(|(_, class, _)| class.symbols())
                    .sorted(),
            )
        });

        let count = self
            .edges
            .iter()
            .flat_map(|(p, _, q)| [*p, *q])
            .chain(self.initial.iter().copied())
            .chain(self.accepting.iter().copied())
            .map(|q| q as usize + 1)
            .chain([self.states])
            .max()
            .unwrap_or(0);

        let mut aut = Automaton::new(alphabet);
        for i in 0..count {
            let q = i as StateId;
            aut.add_state(self.initial.contains(&q), self.accepting.contains(&q));
        }
        for (p, class, q) in self.edges {
            aut.add_transition(p, class, q)?;
        }
        Ok(aut)
    }
}
