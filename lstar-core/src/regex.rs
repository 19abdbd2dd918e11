use std::{fmt::Display, rc::Rc};

use crate::{alphabet::Symbol, class::CharClass};

mod simplify;
pub use simplify::Simplifier;

/// A regular expression, represented as a tree. Children are reference counted so that
/// subexpressions can be shared between many trees, which happens all the time during state
/// elimination. Equality is structural: two expressions are equal if they are built the same
/// way, not if they denote the same language.
///
/// The constructors [`Regex::union`], [`Regex::concat`] and [`Regex::star`] build nodes
/// as they are, normalisation is the job of the [`Simplifier`].
///
/// # Example
/// ```
/// use lstar_core::prelude::*;
///
/// let ab = Regex::concat(Regex::symbol('a'), Regex::symbol('b'));
/// let re = Regex::star(Regex::union(ab, Regex::Epsilon));
/// assert_eq!(re.to_string(), "(ab|ε)*");
/// assert!(re.matches(&['a', 'b', 'a', 'b']));
/// assert!(!re.matches(&['a', 'b', 'a']));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Regex {
    /// Matches nothing at all.
    Empty,
    /// Matches only the empty word.
    Epsilon,
    /// Matches any single symbol of the class.
    Literal(CharClass),
    /// Matches what either side matches.
    Union(Rc<Regex>, Rc<Regex>),
    /// Matches a word of the left side followed by a word of the right side.
    Concat(Rc<Regex>, Rc<Regex>),
    /// Matches any number of repetitions, including none.
    Star(Rc<Regex>),
}

impl Regex {
    /// A literal matching a single symbol.
    pub fn symbol(symbol: Symbol) -> Self {
        Regex::Literal(CharClass::single(symbol))
    }

    /// A literal matching any symbol of `class`.
    pub fn literal(class: CharClass) -> Self {
        Regex::Literal(class)
    }

    /// The union of two expressions.
    pub fn union(left: Regex, right: Regex) -> Self {
        Regex::Union(Rc::new(left), Rc::new(right))
    }

    /// The concatenation of two expressions.
    pub fn concat(left: Regex, right: Regex) -> Self {
        Regex::Concat(Rc::new(left), Rc::new(right))
    }

    /// The Kleene star of an expression.
    pub fn star(inner: Regex) -> Self {
        Regex::Star(Rc::new(inner))
    }

    fn precedence(&self) -> u8 {
        match self {
            Regex::Union(_, _) => 0,
            Regex::Concat(_, _) => 1,
            Regex::Star(_) => 2,
            Regex::Empty | Regex::Epsilon | Regex::Literal(_) => 3,
        }
    }

    /// Returns true for expressions without subexpressions.
    pub fn is_atomic(&self) -> bool {
        self.precedence() == 3
    }

    /// Counts the nodes of the tree. A shared subexpression is counted once for every
    /// place it occurs in.
    pub fn size(&self) -> usize {
        let mut stack = vec![self];
        let mut count = 0;
        while let Some(node) = stack.pop() {
            count += 1;
            match node {
                Regex::Union(l, r) | Regex::Concat(l, r) => {
                    stack.push(l);
                    stack.push(r);
                }
                Regex::Star(inner) => stack.push(inner),
                _ => {}
            }
        }
        count
    }

    /// Returns true if the expression matches the empty word.
    pub fn nullable(&self) -> bool {
        match self {
            Regex::Empty | Regex::Literal(_) => false,
            Regex::Epsilon | Regex::Star(_) => true,
            Regex::Union(l, r) => l.nullable() || r.nullable(),
            Regex::Concat(l, r) => l.nullable() && r.nullable(),
        }
    }

    /// Computes the Brzozowski derivative with respect to `symbol`, which matches a word `w`
    /// if and only if `self` matches `symbol` followed by `w`. The result is not simplified.
    pub fn derivative(&self, symbol: Symbol) -> Regex {
        match self {
            Regex::Empty | Regex::Epsilon => Regex::Empty,
            Regex::Literal(class) => {
                if class.contains(symbol) {
                    Regex::Epsilon
                } else {
                    Regex::Empty
                }
            }
            Regex::Union(l, r) => Regex::union(l.derivative(symbol), r.derivative(symbol)),
            Regex::Concat(l, r) => {
                let head = Regex::Concat(Rc::new(l.derivative(symbol)), Rc::clone(r));
                if l.nullable() {
                    Regex::union(head, r.derivative(symbol))
                } else {
                    head
                }
            }
            Regex::Star(inner) => Regex::Concat(
                Rc::new(inner.derivative(symbol)),
                Rc::new(Regex::Star(Rc::clone(inner))),
            ),
        }
    }

    /// Decides whether the expression matches `word` by taking derivatives symbol by symbol.
    /// Every derivative is simplified before the next one is taken, which keeps the
    /// intermediate expressions small.
    pub fn matches(&self, word: &[Symbol]) -> bool {
        let mut simplifier = Simplifier::default();
        let mut current = simplifier.simplify_rc(&Rc::new(self.clone()));
        for sym in word {
            if *current == Regex::Empty {
                return false;
            }
            current = simplifier.simplify_rc(&Rc::new(current.derivative(*sym)));
        }
        current.nullable()
    }

    /// Applies the simplification rules until none applies any more.
    pub fn simplify(&self) -> Regex {
        Simplifier::default().simplify(self)
    }
}

enum Piece<'a> {
    Node(&'a Regex, u8),
    Text(&'static str),
}

impl Display for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // explicit stack, trees produced by elimination can be very deep
        let mut stack = vec![Piece::Node(self, 0)];
        while let Some(piece) = stack.pop() {
            let (node, min) = match piece {
                Piece::Text(text) => {
                    write!(f, "{text}")?;
                    continue;
                }
                Piece::Node(node, min) => (node, min),
            };
            let wrap = node.precedence() < min;
            if wrap {
                write!(f, "(")?;
                stack.push(Piece::Text(")"));
            }
            match node {
                Regex::Empty => write!(f, "∅")?,
                Regex::Epsilon => write!(f, "ε")?,
                Regex::Literal(class) => write!(f, "{class}")?,
                Regex::Union(l, r) => {
                    stack.push(Piece::Node(r, 0));
                    stack.push(Piece::Text("|"));
                    stack.push(Piece::Node(l, 0));
                }
                Regex::Concat(l, r) => {
                    stack.push(Piece::Node(r, 1));
                    stack.push(Piece::Node(l, 1));
                }
                Regex::Star(inner) => {
                    stack.push(Piece::Text("*"));
                    stack.push(Piece::Node(inner, 3));
                }
            }
        }
        Ok(())
    }
}

impl From<CharClass> for Regex {
    fn from(value: CharClass) -> Self {
        Regex::Literal(value)
    }
}
