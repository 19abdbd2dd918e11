use std::fmt::Write;

use itertools::Itertools;
use tracing::debug;

use crate::{
    alphabet::Symbol,
    automaton::{Automaton, StateId},
    class::CharClass,
    math::{Map, Set},
};

/// One element of a [`Network`]. An element is entered on the symbols of its class, so all
/// edges leading into it share the same label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Unique identifier, `_0`, `_1` and so on.
    pub id: String,
    /// The automaton state this element stands for.
    pub state: StateId,
    /// The symbols on which this element matches.
    pub symbols: CharClass,
    /// Whether the element may match on the first symbol of the input.
    pub start: bool,
    /// Whether a match of this element reports, i.e. the word read so far is accepted.
    pub report: bool,
}

/// An edge between two elements, given by their positions in [`Network::elements`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkEdge {
    /// Index of the element that activates.
    pub source: usize,
    /// Index of the element that is activated.
    pub target: usize,
}

/// The homogeneous shape of an automaton, in which symbols label the elements instead of the
/// edges. This is the form in which automata are handed to automata-network tools, and
/// [`Network::to_anml`] writes it as an ANML document.
///
/// A state of the automaton turns into one element for each distinct class on which the
/// state is entered. An element reports if its state is accepting and is a start element if
/// it is entered from a start state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    name: String,
    elements: Vec<Element>,
    edges: Vec<NetworkEdge>,
}

impl Network {
    /// Converts `automaton` into its homogeneous shape. States without incoming transitions
    /// have no element, so a start state that is accepting does not make the network accept
    /// the empty word.
    pub fn from_automaton(name: impl Into<String>, automaton: &Automaton) -> Self {
        let mut elements: Vec<Element> = vec![];
        let mut index: Map<(StateId, &CharClass), usize> = Map::default();

        for (source, transition) in automaton.transitions() {
            let from_start = automaton
                .state(source)
                .is_some_and(|q| q.is_initial());
            let key = (transition.target, &transition.symbols);
            match index.get(&key) {
                Some(&pos) => elements[pos].start |= from_start,
                None => {
                    index.insert(key, elements.len());
                    elements.push(Element {
                        id: format!("_{}", elements.len()),
                        state: transition.target,
                        symbols: transition.symbols.clone(),
                        start: from_start,
                        report: automaton
                            .state(transition.target)
                            .is_some_and(|q| q.is_accepting()),
                    });
                }
            }
        }

        let mut edges = vec![];
        for (source, transition) in automaton.transitions() {
            let Some(&target) = index.get(&(transition.target, &transition.symbols)) else {
                continue;
            };
            for (pos, _) in elements.iter().enumerate().filter(|(_, e)| e.state == source) {
                edges.push(NetworkEdge {
                    source: pos,
                    target,
                });
            }
        }
        edges.sort_unstable_by_key(|e| (e.source, e.target));
        edges.dedup();

        debug!(
            "homogeneous network with {} elements and {} edges from {} states",
            elements.len(),
            edges.len(),
            automaton.size()
        );
        Self {
            name: name.into(),
            elements,
            edges,
        }
    }

    /// The name of the network.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All elements, the position of an element is the index used by the edges.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// All edges, ordered by source and then by target.
    pub fn edges(&self) -> &[NetworkEdge] {
        &self.edges
    }

    /// Iterates over the positions of the elements that `source` activates.
    pub fn successors(&self, source: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.source == source)
            .map(|e| e.target)
    }

    /// Simulates the network on `word`, which is accepted if some element that reports
    /// matches its last symbol. The empty word is never accepted.
    pub fn accepts<W: IntoIterator<Item = Symbol>>(&self, word: W) -> bool {
        let mut matched: Option<Set<usize>> = None;
        for sym in word {
            let candidates = match &matched {
                None => self
                    .elements
                    .iter()
                    .positions(|e| e.start)
                    .collect::<Set<_>>(),
                Some(active) => active
                    .iter()
                    .flat_map(|pos| self.successors(*pos))
                    .collect(),
            };
            let next = candidates
                .into_iter()
                .filter(|pos| self.elements[*pos].symbols.contains(sym))
                .collect::<Set<_>>();
            if next.is_empty() {
                return false;
            }
            matched = Some(next);
        }
        matched.is_some_and(|active| active.iter().any(|pos| self.elements[*pos].report))
    }

    /// Writes the network as an ANML document.
    pub fn to_anml(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "<anml version=\"1.0\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">"
        );
        let _ = writeln!(out, "<automata-network id=\"{}\">", self.name);
        for (pos, element) in self.elements.iter().enumerate() {
            let _ = writeln!(
                out,
                "<state-transition-element id=\"{}\" symbol-set=\"{}\" start=\"{}\" latch=\"false\">",
                element.id,
                element.symbols.to_anml(),
                if element.start { "start-of-data" } else { "none" }
            );
            if element.report {
                let _ = writeln!(out, "    <report-on-match />");
            }
            for target in self.successors(pos) {
                let _ = writeln!(
                    out,
                    "    <activate-on-match element=\"{}\" />",
                    self.elements[target].id
                );
            }
            let _ = writeln!(out, "</state-transition-element>");
        }
        let _ = writeln!(out, "</automata-network>");
        let _ = write!(out, "</anml>");
        out
    }

    /// Writes the network as an MNRL document, the JSON counterpart of [`Network::to_anml`].
    /// Every element becomes a homogeneous state (`hState`) with one input port `i` and one
    /// output port `o` that activates the successors.
    pub fn to_mnrl(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{{");
        let _ = writeln!(out, "  \"id\": \"{}\",", json_escape(&self.name));
        let _ = writeln!(out, "  \"nodes\": [");
        for (pos, element) in self.elements.iter().enumerate() {
            let activate = self
                .successors(pos)
                .map(|target| {
                    format!(
                        "{{\"id\": \"{}\", \"portId\": \"i\"}}",
                        self.elements[target].id
                    )
                })
                .join(", ");
            let _ = write!(
                out,
                "    {{\"id\": \"{}\", \"type\": \"hState\", \"enable\": \"{}\", \
                 \"report\": {}, \"inputDefs\": [{{\"portId\": \"i\", \"width\": 1}}], \
                 \"outputDefs\": [{{\"portId\": \"o\", \"width\": 1, \"activate\": [{activate}]}}], \
                 \"attributes\": {{\"symbolSet\": \"{}\", \"latched\": false}}}}",
                element.id,
                if element.start {
                    "onStartAndActivateIn"
                } else {
                    "onActivateIn"
                },
                element.report,
                json_escape(&element.symbols.to_anml()),
            );
            let _ = writeln!(
                out,
                "{}",
                if pos + 1 < self.elements.len() { "," } else { "" }
            );
        }
        let _ = writeln!(out, "  ]");
        let _ = write!(out, "}}");
        out
    }

    /// Returns the positions of the elements that cannot be activated at all, as they are
    /// neither start elements nor the target of an edge.
    pub fn unreachable_elements(&self) -> Vec<usize> {
        let targets = self.edges.iter().map(|e| e.target).collect::<Set<_>>();
        (0..self.elements.len())
            .filter(|pos| !self.elements[*pos].start && !targets.contains(pos))
            .collect()
    }
}

fn json_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::Network;
    use crate::{automaton::AutomatonBuilder, class::CharClass, kleene::KleeneStar};

    #[test_log::test]
    fn homogeneous_shape() {
        // a(b|c)*, state 1 is entered on `a` and on `[bc]`
        let aut = AutomatonBuilder::default()
            .with_initial(0)
            .with_accepting([1])
            .with_transitions([(0, 'a', 1)])
            .with_class_transitions([(1, CharClass::compress("bc".chars()), 1)])
            .build()
            .unwrap();
        let network = Network::from_automaton("test", &aut);
        assert_eq!(network.elements().len(), 2);
        let start = &network.elements()[0];
        assert!(start.start && start.report);
        assert_eq!(start.symbols, CharClass::single('a'));
        let looping = &network.elements()[1];
        assert!(!looping.start && looping.report);
        assert_eq!(network.successors(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(network.successors(1).collect::<Vec<_>>(), vec![1]);
        assert!(network.unreachable_elements().is_empty());

        let anml = network.to_anml();
        assert!(anml.contains("<automata-network id=\"test\">"));
        assert!(anml.contains(
            "<state-transition-element id=\"_0\" symbol-set=\"[\\x61]\" start=\"start-of-data\" latch=\"false\">"
        ));
        assert!(anml.contains("<activate-on-match element=\"_1\" />"));
        assert_eq!(anml.matches("<report-on-match />").count(), 2);
    }

    #[test_log::test]
    fn mnrl_export() {
        let aut = AutomatonBuilder::default()
            .with_initial(0)
            .with_accepting([1])
            .with_transitions([(0, 'a', 1)])
            .with_class_transitions([(1, CharClass::compress("bcd".chars()), 1)])
            .build()
            .unwrap();
        let mnrl = Network::from_automaton("lstar", &aut).to_mnrl();
        assert!(mnrl.starts_with("{\n  \"id\": \"lstar\","));
        assert!(mnrl.contains(
            "{\"id\": \"_0\", \"type\": \"hState\", \"enable\": \"onStartAndActivateIn\", \"report\": true,"
        ));
        assert!(mnrl.contains("\"enable\": \"onActivateIn\""));
        // backslashes of the symbol set are escaped for JSON
        assert!(mnrl.contains("\"symbolSet\": \"[\\\\x62-\\\\x64]\""));
        assert_eq!(
            mnrl.matches("\"activate\": [{\"id\": \"_1\", \"portId\": \"i\"}]").count(),
            2
        );
        assert!(mnrl.ends_with("  ]\n}"));
    }

    #[test_log::test]
    fn simulation_agrees_with_automaton() {
        let aut = AutomatonBuilder::default()
            .with_initial(0)
            .with_accepting([2])
            .with_transitions([
                (0, 'a', 1),
                (0, 'b', 0),
                (1, 'a', 2),
                (1, 'b', 0),
                (2, 'a', 2),
                (2, 'b', 1),
            ])
            .build()
            .unwrap();
        let network = Network::from_automaton("agree", &aut);
        for word in KleeneStar::non_empty(vec!['a', 'b']).take_while(|w| w.len() <= 6) {
            assert_eq!(
                network.accepts(word.iter().copied()),
                aut.accepts(word.iter().copied()),
                "disagreement on {word:?}"
            );
        }
        assert!(!network.accepts("".chars()));
    }
}
