//! Building blocks for learning regular languages: ordered alphabets and finite words,
//! compressed symbol classes, deterministic automata over symbol classes together with a
//! dead-state pruning pass, a homogeneous export shape, and regular expressions that are
//! derived from automata through Brzozowski's algebraic method.
#![deny(rustdoc::broken_intra_doc_links)]

/// Defines the collection types that are used throughout, hiding which concrete
/// implementation of sets and maps is in use.
pub mod math;

mod show;
pub use show::{show_duration, Show};

/// An alphabet is an explicitly ordered, finite collection of symbols.
pub mod alphabet;

/// Finite words over an alphabet and some helpers to take them apart and put them together.
pub mod word;

/// Enumeration of all finite words over a set of symbols in length-lexicographic order.
pub mod kleene;

/// Sets of symbols that are compressed into single symbols and contiguous ranges.
pub mod class;

/// Deterministic automata whose transitions are labelled with symbol classes.
pub mod automaton;

/// The homogeneous export shape of an automaton, where each element carries the
/// symbol class on which it is entered.
pub mod network;

/// Graphviz rendering of automata and networks.
pub mod dot;

/// Regular expressions as a tree with a confluent simplification rewrite system.
pub mod regex;

/// Conversion of automata into regular expressions by state elimination.
pub mod brzozowski;

/// Alias for the default integer type that is used for identifying states.
pub type DefaultIdType = u32;

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use lstar_core::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::{Alphabet, Symbol},
        automaton::{Automaton, AutomatonBuilder, AutomatonError, State, StateId, Transition},
        brzozowski::IllFormedAutomaton,
        class::{CharClass, ClassItem},
        dot::Dottable,
        kleene::KleeneStar,
        math,
        network::{Element, Network, NetworkEdge},
        regex::{Regex, Simplifier},
        show::Show,
        word::{self, IntoWord, Word},
        DefaultIdType,
    };
}
