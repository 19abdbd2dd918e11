use std::fmt::Display;

use itertools::Itertools;

use crate::{automaton::Automaton, network::Network, show::Show};

/// Types that can be rendered in the DOT format of graphviz. Implementors list their nodes
/// and edges, [`Dottable::dot_representation`] assembles the document.
pub trait Dottable {
    /// Compute the graphviz representation, for more information on the DOT format,
    /// see the [graphviz documentation](https://graphviz.org/doc/info/lang.html).
    fn dot_representation(&self) -> String {
        let header = std::iter::once(format!(
            "digraph {} {{",
            sanitize_dot_ident(&self.dot_name().unwrap_or("A".to_string()))
        ))
        .chain(self.dot_header_statements());
        let nodes = self.dot_nodes().into_iter().map(|(ident, attrs)| {
            format!(
                "{} [{}]",
                sanitize_dot_ident(&ident),
                attrs.into_iter().map(|attr| attr.to_string()).join(", ")
            )
        });
        let edges = self.dot_edges().into_iter().map(|(source, target, attrs)| {
            format!(
                "{} -> {} [{}]",
                sanitize_dot_ident(&source),
                sanitize_dot_ident(&target),
                attrs.into_iter().map(|attr| attr.to_string()).join(", ")
            )
        });
        header
            .chain(nodes)
            .chain(edges)
            .chain(std::iter::once("}".to_string()))
            .join("\n")
    }

    /// Additional statements that are placed right after the opening of the graph.
    fn dot_header_statements(&self) -> Vec<String> {
        vec![]
    }

    /// The name of the graph.
    fn dot_name(&self) -> Option<String>;

    /// Identifiers of all nodes together with their attributes.
    fn dot_nodes(&self) -> Vec<(String, Vec<DotStateAttribute>)>;

    /// All edges as source identifier, target identifier and attributes.
    fn dot_edges(&self) -> Vec<(String, String, Vec<DotTransitionAttribute>)>;
}

impl Dottable for Automaton {
    fn dot_header_statements(&self) -> Vec<String> {
        self.start_states()
            .map(|q| format!("init{} [label=\"\", shape=none]\ninit{} -> {}", q, q, q.show()))
            .collect()
    }

    fn dot_name(&self) -> Option<String> {
        Some("Automaton".to_string())
    }

    fn dot_nodes(&self) -> Vec<(String, Vec<DotStateAttribute>)> {
        self.states()
            .map(|q| {
                let shape = if q.is_accepting() {
                    "doublecircle"
                } else {
                    "circle"
                };
                (
                    q.id().show(),
                    vec![
                        DotStateAttribute::Label(q.id().show()),
                        DotStateAttribute::Shape(shape.to_string()),
                    ],
                )
            })
            .collect()
    }

    fn dot_edges(&self) -> Vec<(String, String, Vec<DotTransitionAttribute>)> {
        self.transitions()
            .map(|(source, t)| {
                (
                    source.show(),
                    t.target.show(),
                    vec![DotTransitionAttribute::Label(t.symbols.to_string())],
                )
            })
            .collect()
    }
}

impl Dottable for Network {
    fn dot_name(&self) -> Option<String> {
        Some(self.name().to_string())
    }

    fn dot_nodes(&self) -> Vec<(String, Vec<DotStateAttribute>)> {
        self.elements()
            .iter()
            .map(|e| {
                let mut attrs = vec![
                    DotStateAttribute::Label(format!("{}: {}", e.id, e.symbols)),
                    DotStateAttribute::Shape(
                        if e.report { "doublecircle" } else { "circle" }.to_string(),
                    ),
                ];
                if e.start {
                    attrs.push(DotStateAttribute::Color("green".to_string()));
                }
                (e.id.clone(), attrs)
            })
            .collect()
    }

    fn dot_edges(&self) -> Vec<(String, String, Vec<DotTransitionAttribute>)> {
        self.edges()
            .iter()
            .map(|e| {
                (
                    self.elements()[e.source].id.clone(),
                    self.elements()[e.target].id.clone(),
                    vec![],
                )
            })
            .collect()
    }
}

/// Enum that abstracts attributes in the DOT format.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DotStateAttribute {
    /// The label of a node
    Label(String),
    /// The shape of a node
    Shape(String),
    /// The color of a node
    Color(String),
}

impl Display for DotStateAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotStateAttribute::Label(s) => write!(f, "label=\"{}\"", escape_label(s)),
            DotStateAttribute::Shape(s) => write!(f, "shape=\"{}\"", s),
            DotStateAttribute::Color(c) => write!(f, "color=\"{}\"", c),
        }
    }
}

/// Attributes of an edge in the DOT format.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DotTransitionAttribute {
    /// The label of an edge
    Label(String),
}

impl Display for DotTransitionAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotTransitionAttribute::Label(lbl) => write!(f, "label=\"{}\"", escape_label(lbl)),
        }
    }
}

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

fn sanitize_dot_ident(name: &str) -> String {
    name.chars()
        .filter_map(|chr| match chr {
            c if c.is_alphanumeric() || c == '_' => Some(c),
            '|' | ':' | ',' | '-' => Some('_'),
            _ => None,
        })
        .join("")
}

#[cfg(test)]
mod tests {
    use super::Dottable;
    use crate::{automaton::AutomatonBuilder, class::CharClass, network::Network};

    #[test]
    fn automaton_to_dot() {
        let aut = AutomatonBuilder::default()
            .with_initial(0)
            .with_accepting([1])
            .with_class_transitions([(0, CharClass::compress("abc".chars()), 1)])
            .with_transitions([(1, '"', 0)])
            .build()
            .unwrap();
        let dot = aut.dot_representation();
        assert!(dot.starts_with("digraph Automaton {"));
        assert!(dot.contains("q1 [label=\"q1\", shape=\"doublecircle\"]"));
        assert!(dot.contains("q0 -> q1 [label=\"[a-c]\"]"));
        assert!(dot.contains("q1 -> q0 [label=\"\\\"\"]"));
        assert!(dot.ends_with('}'));

        let network = Network::from_automaton("net-work", &aut);
        let dot = network.dot_representation();
        assert!(dot.starts_with("digraph net_work {"));
        assert!(dot.contains("_0 -> _1 []"));
    }
}
