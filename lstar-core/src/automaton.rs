use std::collections::VecDeque;

use itertools::Itertools;
use thiserror::Error;
use tracing::trace;

use crate::{
    alphabet::{Alphabet, Symbol},
    class::CharClass,
    math::{Map, Set},
    show::Show,
    DefaultIdType,
};

mod builder;
pub use builder::AutomatonBuilder;

mod prune;

/// Identifies a state of an [`Automaton`].
pub type StateId = DefaultIdType;

/// Errors that can occur while assembling an [`Automaton`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomatonError {
    /// A state id was used that does not belong to the automaton.
    #[error("state {} does not exist", .0.show())]
    UnknownState(StateId),
    /// Adding the transition would give `state` two successors on `symbol`.
    #[error("state {} would have two successors on symbol {}", .state.show(), .symbol.show())]
    Nondeterministic {
        /// The source state of the offending transition.
        state: StateId,
        /// A symbol on which two transitions overlap.
        symbol: Symbol,
    },
    /// Transitions must be labelled with at least one symbol.
    #[error("transition leaving {} has an empty symbol set", .state.show())]
    EmptySymbolSet {
        /// The source state of the offending transition.
        state: StateId,
    },
    /// The symbol is not part of the alphabet of the automaton.
    #[error("symbol {} is not part of the alphabet", .0.show())]
    ForeignSymbol(Symbol),
}

/// An outgoing transition of a [`State`]. It is labelled with a non-empty [`CharClass`] and
/// points to the id of its target, the state that owns it is the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transition {
    /// The symbols on which the transition is taken.
    pub symbols: CharClass,
    /// The state that is reached.
    pub target: StateId,
}

impl Transition {
    /// Creates a new transition.
    pub fn new(symbols: CharClass, target: StateId) -> Self {
        Self { symbols, target }
    }
}

/// A state of an [`Automaton`] together with its outgoing transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    id: StateId,
    initial: bool,
    accepting: bool,
    transitions: Vec<Transition>,
}

impl State {
    /// The id of the state.
    pub fn id(&self) -> StateId {
        self.id
    }

    /// Returns true if a run may begin in this state.
    pub fn is_initial(&self) -> bool {
        self.initial
    }

    /// Returns true if a run that ends in this state accepts.
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// The outgoing transitions, at most one of which matches a given symbol.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// The state that is reached on `symbol`, if any.
    pub fn successor(&self, symbol: Symbol) -> Option<StateId> {
        self.transitions
            .iter()
            .find(|t| t.symbols.contains(symbol))
            .map(|t| t.target)
    }

    /// Returns true if the state has a transition to a state other than itself.
    pub fn has_exit(&self) -> bool {
        self.transitions.iter().any(|t| t.target != self.id)
    }
}

/// A deterministic finite automaton whose transitions are labelled with classes of symbols.
///
/// States are kept in the order in which they were added and are identified by a
/// [`StateId`] that is never reused, even after a state has been removed. Determinism is
/// enforced on insertion: [`Automaton::add_transition`] refuses a class that overlaps with
/// one already leaving the same state towards a different target. A state may be missing
/// a transition for some symbol, a run reading such a symbol rejects.
///
/// Usually an automaton is either built by the learner or with an [`AutomatonBuilder`].
/// ```
/// use lstar_core::prelude::*;
///
/// let aut = AutomatonBuilder::default()
///     .with_initial(0)
///     .with_accepting([0])
///     .with_transitions([(0, 'a', 1), (1, 'b', 0)])
///     .build()
///     .unwrap();
/// assert!(aut.accepts("abab".chars()));
/// assert!(!aut.accepts("aba".chars()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    alphabet: Alphabet,
    states: Map<StateId, State>,
    next_id: StateId,
}

impl Automaton {
    /// Creates an automaton without any states over the given alphabet.
    pub fn new(alphabet: Alphabet) -> Self {
        Self {
            alphabet,
            states: Map::default(),
            next_id: 0,
        }
    }

    /// The alphabet over which the automaton reads.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Adds a new state without transitions and returns its id.
    pub fn add_state(&mut self, initial: bool, accepting: bool) -> StateId {
        let id = self.next_id;
        self.next_id += 1;
        self.states.insert(
            id,
            State {
                id,
                initial,
                accepting,
                transitions: vec![],
            },
        );
        id
    }

    /// Adds a transition from `source` to `target` on all symbols in `symbols`. If there is
    /// already a transition from `source` to `target`, the two classes are merged.
    pub fn add_transition(
        &mut self,
        source: StateId,
        symbols: CharClass,
        target: StateId,
    ) -> Result<(), AutomatonError> {
        if !self.states.contains_key(&target) {
            return Err(AutomatonError::UnknownState(target));
        }
        if symbols.is_empty() {
            return Err(AutomatonError::EmptySymbolSet { state: source });
        }
        if let Some(sym) = symbols.symbols().find(|sym| !self.alphabet.contains(*sym)) {
            return Err(AutomatonError::ForeignSymbol(sym));
        }
        let state = self
            .states
            .get_mut(&source)
            .ok_or(AutomatonError::UnknownState(source))?;

        for existing in state.transitions.iter().filter(|t| t.target != target) {
            if existing.symbols.overlaps(&symbols) {
                let symbol = symbols
                    .symbols()
                    .find(|sym| existing.symbols.contains(*sym))
                    .unwrap_or_default();
                return Err(AutomatonError::Nondeterministic {
                    state: source,
                    symbol,
                });
            }
        }

        trace!(
            "adding transition {} --{}--> {}",
            source.show(),
            symbols,
            target.show()
        );
        match state.transitions.iter_mut().find(|t| t.target == target) {
            Some(existing) => existing.symbols = existing.symbols.union(&symbols),
            None => state.transitions.push(Transition::new(symbols, target)),
        }
        Ok(())
    }

    /// Removes the state with the given id together with every transition that leaves or
    /// enters it. Returns the removed state if it existed.
    pub fn remove_state(&mut self, id: StateId) -> Option<State> {
        let removed = self.states.shift_remove(&id)?;
        for state in self.states.values_mut() {
            state.transitions.retain(|t| t.target != id);
        }
        Some(removed)
    }

    /// Looks up a state by its id.
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(&id)
    }

    /// Iterates over all states in the order in which they were added.
    pub fn states(&self) -> impl Iterator<Item = &State> + '_ {
        self.states.values()
    }

    /// Iterates over the ids of all states.
    pub fn state_ids(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states.keys().copied()
    }

    /// Iterates over the ids of all states in which a run may begin.
    pub fn start_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states().filter(|q| q.initial).map(|q| q.id)
    }

    /// Iterates over the ids of all accepting states.
    pub fn accepting_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states().filter(|q| q.accepting).map(|q| q.id)
    }

    /// Iterates over all transitions, each paired with the id of its source.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, &Transition)> + '_ {
        self.states()
            .flat_map(|q| q.transitions.iter().map(move |t| (q.id, t)))
    }

    /// The successor of `state` on `symbol`, if the state exists and has one.
    pub fn successor(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        self.state(state)?.successor(symbol)
    }

    /// Follows `word` from `origin` and returns the state it ends in.
    pub fn run_from<W>(&self, origin: StateId, word: W) -> Option<StateId>
    where
        W: IntoIterator<Item = Symbol>,
    {
        word.into_iter()
            .try_fold(origin, |q, sym| self.successor(q, sym))
    }

    /// Returns true if the run on `word` from some start state ends in an accepting state.
    pub fn accepts<W>(&self, word: W) -> bool
    where
        W: IntoIterator<Item = Symbol>,
    {
        let word = word.into_iter().collect_vec();
        self.start_states().any(|q| {
            self.run_from(q, word.iter().copied())
                .and_then(|p| self.state(p))
                .is_some_and(State::is_accepting)
        })
    }

    /// Iterates over the states reachable from `origin` in breadth-first order, beginning
    /// with `origin` itself.
    pub fn reachable_from(&self, origin: StateId) -> Reachable<'_> {
        Reachable::new(self, origin)
    }

    /// Collects the states reachable from any start state, in breadth-first order.
    pub fn reachable_states(&self) -> Set<StateId> {
        self.start_states()
            .flat_map(|q| self.reachable_from(q))
            .collect()
    }

    /// The number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Returns true if the automaton has no states.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// The number of transitions over all states.
    pub fn transition_count(&self) -> usize {
        self.states().map(|q| q.transitions.len()).sum()
    }
}

impl std::fmt::Display for Automaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for state in self.states() {
            let mut flags = vec![];
            if state.initial {
                flags.push("start");
            }
            if state.accepting {
                flags.push("accepting");
            }
            write!(f, "{}", state.id.show())?;
            if !flags.is_empty() {
                write!(f, " ({})", flags.join(", "))?;
            }
            writeln!(f)?;
            for t in &state.transitions {
                writeln!(f, "  {} -> {}", t.symbols, t.target.show())?;
            }
        }
        Ok(())
    }
}

/// Iterator over the states that can be reached from some origin, see
/// [`Automaton::reachable_from`]. Ids of states that do not exist are skipped.
#[derive(Debug, Clone)]
pub struct Reachable<'a> {
    automaton: &'a Automaton,
    seen: Set<StateId>,
    queue: VecDeque<StateId>,
}

impl<'a> Reachable<'a> {
    fn new(automaton: &'a Automaton, origin: StateId) -> Self {
        let mut seen = Set::with_capacity(automaton.size());
        let mut queue = VecDeque::with_capacity(automaton.size());
        if automaton.state(origin).is_some() {
            seen.insert(origin);
            queue.push_back(origin);
        }
        Self {
            automaton,
            seen,
            queue,
        }
    }
}

impl Iterator for Reachable<'_> {
    type Item = StateId;

    fn next(&mut self) -> Option<Self::Item> {
        let q = self.queue.pop_front()?;
        if let Some(state) = self.automaton.state(q) {
            for t in &state.transitions {
                if self.seen.insert(t.target) {
                    self.queue.push_back(t.target);
                }
            }
        }
        Some(q)
    }
}
