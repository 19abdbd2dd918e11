use itertools::Itertools;
use tracing::{debug, trace};

use crate::{math::Set, show::Show};

use super::{Automaton, StateId};

/// Context of one depth-first traversal that begins in a single start state.
#[derive(Debug, Default)]
struct Traversal {
    visited: Set<StateId>,
    report_seen: bool,
}

impl Traversal {
    fn pre_visit(&mut self, automaton: &Automaton, q: StateId) {
        self.report_seen |= automaton.state(q).is_some_and(|s| s.is_accepting());
    }

    /// Decides whether `q` is dead once all of its successors have been post-visited.
    fn post_visit(&self, automaton: &Automaton, q: StateId) -> bool {
        let Some(state) = automaton.state(q) else {
            return false;
        };
        if state.is_initial() || state.is_accepting() {
            return false;
        }
        !state.has_exit() || !self.report_seen
    }
}

impl Automaton {
    /// Removes the states from which no accepting state can be reached and returns the ids
    /// of the removed states.
    ///
    /// From every start state a depth-first traversal visits all reachable states. While
    /// descending it records whether any accepting state was seen. When ascending, so after
    /// all successors of a state are handled, a state that is neither accepting nor a start
    /// state is removed if it has no transition to some other state left, or if the
    /// traversal has not come across any accepting state at all. Removals may turn further
    /// states into dead ends, so traversals are repeated until nothing changes. This makes
    /// pruning idempotent. States that cannot be reached from a start state are left alone.
    pub fn prune(&mut self) -> Vec<StateId> {
        let mut removed = vec![];
        loop {
            let pass = self.prune_pass();
            if pass.is_empty() {
                break;
            }
            removed.extend(pass);
        }
        debug!(
            "pruning removed {} states, {} remain",
            removed.len(),
            self.size()
        );
        removed
    }

    /// Consuming variant of [`Automaton::prune`].
    pub fn remove_dead_states(mut self) -> Self {
        self.prune();
        self
    }

    fn prune_pass(&mut self) -> Vec<StateId> {
        let mut removed = vec![];
        for start in self.start_states().collect_vec() {
            let mut ctx = Traversal::default();
            let mut pending = vec![start];
            let mut finished = vec![];

            while let Some(q) = pending.pop() {
                if !ctx.visited.insert(q) {
                    continue;
                }
                ctx.pre_visit(self, q);
                finished.push(q);
                if let Some(state) = self.state(q) {
                    pending.extend(
                        state
                            .transitions()
                            .iter()
                            .rev()
                            .map(|t| t.target)
                            .filter(|p| !ctx.visited.contains(p)),
                    );
                }
            }

            // states are decided in reverse discovery order
            while let Some(q) = finished.pop() {
                if ctx.post_visit(self, q) {
                    trace!("removing dead state {}", q.show());
                    self.remove_state(q);
                    removed.push(q);
                }
            }
        }
        removed
    }
}
