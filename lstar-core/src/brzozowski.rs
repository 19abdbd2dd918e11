use std::rc::Rc;

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::{
    automaton::{Automaton, StateId},
    math::Map,
    network::Network,
    regex::{Regex, Simplifier},
    show::{show_duration, Show},
};

/// Reasons for refusing to derive a regular expression from an automaton.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllFormedAutomaton {
    /// There is no state or element in which a run could begin.
    #[error("the automaton has no start state")]
    NoStartState,
    /// Some states cannot be reached from any start state.
    #[error("states {} cannot be reached from the start", u32::show_collection(.0))]
    Disconnected(Vec<StateId>),
}

/// State elimination on the linear system `X = A·X ∪ B`, where `X[i]` is the language that
/// is accepted when starting in node `i`. Node 0 stands for the moment before any input has
/// been read, so once all nodes are eliminated `B[0]` describes the whole language.
struct Elimination {
    a: Vec<Vec<Rc<Regex>>>,
    b: Vec<Rc<Regex>>,
    simplifier: Simplifier,
}

impl Elimination {
    fn new(size: usize) -> Self {
        let empty = Rc::new(Regex::Empty);
        Self {
            a: vec![vec![Rc::clone(&empty); size]; size],
            b: vec![empty; size],
            simplifier: Simplifier::default(),
        }
    }

    /// Adds `label` as an alternative to the edge from `i` to `j`.
    fn connect(&mut self, i: usize, j: usize, label: Regex) {
        let current = Rc::clone(&self.a[i][j]);
        self.a[i][j] = if *current == Regex::Empty {
            Rc::new(label)
        } else {
            Rc::new(Regex::Union(current, Rc::new(label)))
        };
    }

    fn accept(&mut self, i: usize) {
        self.b[i] = Rc::new(Regex::Epsilon);
    }

    fn simplify(&mut self, regex: Regex) -> Rc<Regex> {
        self.simplifier.simplify_rc(&Rc::new(regex))
    }

    fn star_concat(&mut self, n: usize, rest: &Rc<Regex>) -> Rc<Regex> {
        let looping = self.simplify(Regex::Star(Rc::clone(&self.a[n][n])));
        self.simplify(Regex::Concat(looping, Rc::clone(rest)))
    }

    fn solve(mut self) -> Regex {
        let start = std::time::Instant::now();
        let m = self.b.len();
        for n in (0..m).rev() {
            let bn = Rc::clone(&self.b[n]);
            self.b[n] = self.star_concat(n, &bn);
            for j in 0..n {
                let anj = Rc::clone(&self.a[n][j]);
                self.a[n][j] = self.star_concat(n, &anj);
            }
            for i in 0..n {
                let ain = Rc::clone(&self.a[i][n]);
                if *ain == Regex::Empty {
                    // every rule below would leave the entries untouched
                    continue;
                }
                let through = self.simplify(Regex::Concat(Rc::clone(&ain), Rc::clone(&self.b[n])));
                self.b[i] = self.simplify(Regex::Union(Rc::clone(&self.b[i]), through));
                for j in 0..n {
                    let through =
                        self.simplify(Regex::Concat(Rc::clone(&ain), Rc::clone(&self.a[n][j])));
                    self.a[i][j] = self.simplify(Regex::Union(Rc::clone(&self.a[i][j]), through));
                }
            }
            let empty = self.simplify(Regex::Empty);
            for i in 0..n {
                self.a[i][n] = Rc::clone(&empty);
            }
            trace!("eliminated node {n}, {} nodes interned", self.simplifier.interned());
        }
        let result = self.simplifier.simplify(&self.b[0]);
        debug!(
            "eliminated {} nodes in {}, result has size {}",
            m,
            show_duration(start.elapsed()),
            result.size()
        );
        result
    }
}

impl Automaton {
    /// Derives a regular expression that matches exactly the words accepted by `self`, using
    /// Brzozowski's algebraic method.
    ///
    /// The automaton needs at least one start state, and every state has to be reachable
    /// from one of them, otherwise an [`IllFormedAutomaton`] error is returned before any
    /// elimination happens. States are numbered in the order in which they were added, each
    /// start state is connected to an additional node 0 by an ε-edge, and nodes are then
    /// eliminated from the highest number down to 0.
    ///
    /// ```
    /// use lstar_core::prelude::*;
    ///
    /// let aut = AutomatonBuilder::default()
    ///     .with_initial(0)
    ///     .with_accepting([0])
    ///     .with_transitions([(0, 'a', 1), (1, 'b', 0)])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(aut.to_regex().unwrap().to_string(), "(ab)*");
    /// ```
    pub fn to_regex(&self) -> Result<Regex, IllFormedAutomaton> {
        let starts = self.start_states().collect_vec();
        if starts.is_empty() {
            return Err(IllFormedAutomaton::NoStartState);
        }
        let reachable = self.reachable_states();
        let unreachable = self
            .state_ids()
            .filter(|q| !reachable.contains(q))
            .collect_vec();
        if !unreachable.is_empty() {
            return Err(IllFormedAutomaton::Disconnected(unreachable));
        }

        info!("constructing regex from automaton with {} states", self.size());
        let index: Map<StateId, usize> = self
            .state_ids()
            .enumerate()
            .map(|(i, q)| (q, i + 1))
            .collect();

        let mut elimination = Elimination::new(self.size() + 1);
        for start in starts {
            elimination.connect(0, index[&start], Regex::Epsilon);
        }
        for state in self.states() {
            let i = index[&state.id()];
            if state.is_accepting() {
                elimination.accept(i);
            }
            for t in state.transitions() {
                elimination.connect(i, index[&t.target], Regex::literal(t.symbols.clone()));
            }
        }
        Ok(elimination.solve())
    }
}

impl Network {
    /// Derives a regular expression for the words on which the network reports.
    ///
    /// Node 0 is connected to every start element and every element is connected to its
    /// successors, in both cases labelled with the symbols of the element that is entered.
    /// As networks never accept the empty word, neither does the resulting expression.
    pub fn to_regex(&self) -> Result<Regex, IllFormedAutomaton> {
        if !self.elements().iter().any(|e| e.start) {
            return Err(IllFormedAutomaton::NoStartState);
        }
        let unreachable = self.unreachable_elements();
        if !unreachable.is_empty() {
            return Err(IllFormedAutomaton::Disconnected(
                unreachable.into_iter().map(|pos| pos as StateId).collect(),
            ));
        }

        info!(
            "constructing regex from network with {} elements",
            self.elements().len()
        );
        let mut elimination = Elimination::new(self.elements().len() + 1);
        for (pos, element) in self.elements().iter().enumerate() {
            if element.start {
                elimination.connect(0, pos + 1, Regex::literal(element.symbols.clone()));
            }
            if element.report {
                elimination.accept(pos + 1);
            }
        }
        for edge in self.edges() {
            let symbols = self.elements()[edge.target].symbols.clone();
            elimination.connect(edge.source + 1, edge.target + 1, Regex::literal(symbols));
        }
        Ok(elimination.solve())
    }
}
