use std::collections::VecDeque;

use itertools::Itertools;
use lstar_core::{math::Map, prelude::*, show_duration};
use tracing::debug;

use super::{ObservationTable, Oracle, Signature};
use crate::LearnError;

impl<O: Oracle> ObservationTable<O> {
    /// Builds the automaton that the table describes. The table has to be closed and
    /// consistent, otherwise [`LearnError::InvariantViolated`] is returned.
    ///
    /// Every distinct row of a prefix becomes a state, which accepts if its row does and is
    /// initial if it is the row of ε. The successor of a state on a symbol is the state for
    /// the row of its first member extended by that symbol. All symbols leading to the same
    /// successor are merged into one compressed [`CharClass`]. States are numbered in the
    /// order in which a breadth first search from the initial state finds them, so states
    /// that cannot be reached are never created.
    pub fn hypothesis(&mut self) -> Result<Automaton, LearnError> {
        let start = std::time::Instant::now();
        let classes = self.partition()?;
        let Some((initial, _)) = classes.first() else {
            return Err(LearnError::InvariantViolated(
                "observation table has no prefixes".to_string(),
            ));
        };

        let mut order: Vec<Signature> = vec![initial.clone()];
        let mut discovered: Map<Signature, usize> = Map::from_iter([(initial.clone(), 0)]);
        let mut queue = VecDeque::from([initial.clone()]);
        let mut edges: Vec<(usize, Vec<Symbol>, usize)> = vec![];

        while let Some(row) = queue.pop_front() {
            let source = discovered[&row];
            let members = &classes[&row];
            let mut grouped: Map<usize, Vec<Symbol>> = Map::default();

            for symbol in self.alphabet().clone().universe() {
                let target_row = self.row_of(&word::extend(&members[0], symbol))?;
                for other in &members[1..] {
                    if self.row_of(&word::extend(other, symbol))? != target_row {
                        return Err(LearnError::InvariantViolated(format!(
                            "{} and {} share a row but differ after {}",
                            members[0].show(),
                            other.show(),
                            symbol.show()
                        )));
                    }
                }
                if !classes.contains_key(&target_row) {
                    return Err(LearnError::InvariantViolated(format!(
                        "row {target_row} of {} is not the row of a prefix",
                        word::extend(&members[0], symbol).show()
                    )));
                }
                let target = match discovered.get(&target_row) {
                    Some(&id) => id,
                    None => {
                        let id = order.len();
                        discovered.insert(target_row.clone(), id);
                        order.push(target_row.clone());
                        queue.push_back(target_row);
                        id
                    }
                };
                grouped.entry(target).or_default().push(symbol);
            }
            edges.extend(
                grouped
                    .into_iter()
                    .map(|(target, symbols)| (source, symbols, target)),
            );
        }

        let mut automaton = Automaton::new(self.alphabet().clone());
        let ids = order
            .iter()
            .enumerate()
            .map(|(i, row)| automaton.add_state(i == 0, row.accepting()))
            .collect_vec();
        for (source, symbols, target) in edges {
            automaton.add_transition(ids[source], CharClass::compress(symbols), ids[target])?;
        }

        debug!(
            "built hypothesis with {} states and {} transitions from {} rows in {}",
            automaton.size(),
            automaton.transition_count(),
            classes.len(),
            show_duration(start.elapsed())
        );
        Ok(automaton)
    }
}
