use std::rc::Rc;

use tracing::trace;

use crate::{class::CharClass, math::Map};

use super::Regex;

/// The shape of a simplified node, with children referred to by their id. Two simplified
/// expressions are structurally equal exactly if they have the same id.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum Shape {
    Empty,
    Epsilon,
    Literal(CharClass),
    Union(usize, usize),
    Concat(usize, usize),
    Star(usize),
}

enum Task<'a> {
    Visit(&'a Regex),
    Finish(&'a Regex),
}

/// Rewrites regular expressions bottom up with the rules
/// - `a|a → a`, `a|∅ → a` and `∅|a → a`,
/// - `aε → a`, `εa → a`, `a∅ → ∅` and `∅a → ∅`,
/// - `∅* → ε` and `ε* → ε`,
///
/// where nested unions and concatenations are first re-associated to the right, so that
/// `(a|b)|c` is treated as `a|(b|c)`. Each rule removes nodes, so the rewriting terminates,
/// and the result is a fixpoint: simplifying it again gives the same expression.
///
/// Simplified nodes are interned by their shape. Identical subexpressions therefore become
/// one shared node, the `a|a` rule boils down to comparing ids, and subexpressions that were
/// produced by an earlier call are recognised and not traversed again. Keeping one
/// simplifier around for a whole sequence of related calls, as state elimination does, is
/// what makes this pay off. Traversal uses an explicit stack, so the depth of an expression
/// is not limited by the call stack.
#[derive(Debug, Default)]
pub struct Simplifier {
    shapes: Map<Shape, usize>,
    nodes: Vec<Rc<Regex>>,
    known: Map<*const Regex, usize>,
}

impl Simplifier {
    /// Simplifies `regex`.
    pub fn simplify(&mut self, regex: &Regex) -> Regex {
        let id = self.run(regex);
        self.nodes[id].as_ref().clone()
    }

    /// Simplifies `regex` and returns the shared node that represents the result.
    pub fn simplify_rc(&mut self, regex: &Rc<Regex>) -> Rc<Regex> {
        let id = self.run(regex.as_ref());
        Rc::clone(&self.nodes[id])
    }

    /// The number of distinct simplified nodes that have been produced so far.
    pub fn interned(&self) -> usize {
        self.nodes.len()
    }

    fn run(&mut self, root: &Regex) -> usize {
        // ids of the nodes of this tree that have been handled, keyed by address
        let mut seen: Map<*const Regex, usize> = Map::default();
        let mut results: Vec<usize> = vec![];
        let mut tasks = vec![Task::Visit(root)];

        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(node) => {
                    let ptr = node as *const Regex;
                    if let Some(id) = self.known.get(&ptr).or_else(|| seen.get(&ptr)) {
                        results.push(*id);
                        continue;
                    }
                    tasks.push(Task::Finish(node));
                    match node {
                        Regex::Union(l, r) | Regex::Concat(l, r) => {
                            tasks.push(Task::Visit(r));
                            tasks.push(Task::Visit(l));
                        }
                        Regex::Star(inner) => tasks.push(Task::Visit(inner)),
                        Regex::Empty | Regex::Epsilon | Regex::Literal(_) => {}
                    }
                }
                Task::Finish(node) => {
                    let id = match node {
                        Regex::Empty => self.intern(Shape::Empty),
                        Regex::Epsilon => self.intern(Shape::Epsilon),
                        Regex::Literal(class) => self.intern(Shape::Literal(class.clone())),
                        Regex::Union(_, _) => {
                            let (l, r) = pop_pair(&mut results);
                            self.union(l, r)
                        }
                        Regex::Concat(_, _) => {
                            let (l, r) = pop_pair(&mut results);
                            self.concat(l, r)
                        }
                        Regex::Star(_) => {
                            let inner = pop(&mut results);
                            self.star(inner)
                        }
                    };
                    seen.insert(node as *const Regex, id);
                    results.push(id);
                }
            }
        }
        pop(&mut results)
    }

    fn intern(&mut self, shape: Shape) -> usize {
        if let Some(id) = self.shapes.get(&shape) {
            return *id;
        }
        let node = match &shape {
            Shape::Empty => Regex::Empty,
            Shape::Epsilon => Regex::Epsilon,
            Shape::Literal(class) => Regex::Literal(class.clone()),
            Shape::Union(l, r) => {
                Regex::Union(Rc::clone(&self.nodes[*l]), Rc::clone(&self.nodes[*r]))
            }
            Shape::Concat(l, r) => {
                Regex::Concat(Rc::clone(&self.nodes[*l]), Rc::clone(&self.nodes[*r]))
            }
            Shape::Star(inner) => Regex::Star(Rc::clone(&self.nodes[*inner])),
        };
        let id = self.nodes.len();
        let node = Rc::new(node);
        // the node stays alive in `nodes`, so its address remains valid
        self.known.insert(Rc::as_ptr(&node), id);
        self.nodes.push(node);
        self.shapes.insert(shape, id);
        id
    }

    fn shape(&self, id: usize) -> Option<&Shape> {
        self.shapes.get_index(id).map(|(shape, _)| shape)
    }

    fn is(&self, id: usize, expected: &Shape) -> bool {
        self.shape(id) == Some(expected)
    }

    /// Collects the right spine of a chain of nodes that `split` recognises, e.g. turns
    /// `a|(b|c)` into `[a, b, c]`.
    fn spine(&self, mut id: usize, split: fn(&Shape) -> Option<(usize, usize)>) -> Vec<usize> {
        let mut items = vec![];
        while let Some((l, r)) = self.shape(id).and_then(split) {
            items.push(l);
            id = r;
        }
        items.push(id);
        items
    }

    fn union(&mut self, l: usize, r: usize) -> usize {
        if l == r {
            return l;
        }
        let items = self.spine(l, |s| match s {
            Shape::Union(a, b) => Some((*a, *b)),
            _ => None,
        });
        if items.len() > 1 {
            trace!("re-associating union of {} alternatives", items.len() + 1);
        }
        items
            .into_iter()
            .rev()
            .fold(r, |acc, item| self.union_flat(item, acc))
    }

    fn union_flat(&mut self, l: usize, r: usize) -> usize {
        if l == r || self.is(r, &Shape::Empty) {
            l
        } else if self.is(l, &Shape::Empty) {
            r
        } else {
            self.intern(Shape::Union(l, r))
        }
    }

    fn concat(&mut self, l: usize, r: usize) -> usize {
        let items = self.spine(l, |s| match s {
            Shape::Concat(a, b) => Some((*a, *b)),
            _ => None,
        });
        items
            .into_iter()
            .rev()
            .fold(r, |acc, item| self.concat_flat(item, acc))
    }

    fn concat_flat(&mut self, l: usize, r: usize) -> usize {
        if self.is(l, &Shape::Epsilon) {
            r
        } else if self.is(r, &Shape::Epsilon) {
            l
        } else if self.is(l, &Shape::Empty) || self.is(r, &Shape::Empty) {
            self.intern(Shape::Empty)
        } else {
            self.intern(Shape::Concat(l, r))
        }
    }

    fn star(&mut self, inner: usize) -> usize {
        if self.is(inner, &Shape::Empty) || self.is(inner, &Shape::Epsilon) {
            self.intern(Shape::Epsilon)
        } else {
            self.intern(Shape::Star(inner))
        }
    }
}

fn pop(results: &mut Vec<usize>) -> usize {
    results
        .pop()
        .expect("every visited node leaves exactly one result")
}

fn pop_pair(results: &mut Vec<usize>) -> (usize, usize) {
    let r = pop(results);
    let l = pop(results);
    (l, r)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::Simplifier;
    use crate::regex::Regex;

    fn sym(c: char) -> Regex {
        Regex::symbol(c)
    }

    #[test]
    fn rules() {
        let a = sym('a');
        assert_eq!(Regex::union(a.clone(), a.clone()).simplify(), a);
        assert_eq!(Regex::union(a.clone(), Regex::Empty).simplify(), a);
        assert_eq!(Regex::union(Regex::Empty, a.clone()).simplify(), a);
        assert_eq!(Regex::concat(a.clone(), Regex::Epsilon).simplify(), a);
        assert_eq!(Regex::concat(Regex::Epsilon, a.clone()).simplify(), a);
        assert_eq!(Regex::concat(a.clone(), Regex::Empty).simplify(), Regex::Empty);
        assert_eq!(Regex::concat(Regex::Empty, a.clone()).simplify(), Regex::Empty);
        assert_eq!(Regex::star(Regex::Empty).simplify(), Regex::Epsilon);
        assert_eq!(Regex::star(Regex::Epsilon).simplify(), Regex::Epsilon);
        assert_eq!(
            Regex::star(Regex::concat(Regex::Epsilon, Regex::Empty)).simplify(),
            Regex::Epsilon
        );
    }

    #[test]
    fn reassociation() {
        let (a, b, c) = (sym('a'), sym('b'), sym('c'));
        let left = Regex::union(Regex::union(a.clone(), b.clone()), c.clone());
        let right = Regex::union(a.clone(), Regex::union(b.clone(), c.clone()));
        assert_eq!(left.simplify(), right);

        let nested = Regex::concat(
            Regex::concat(Regex::concat(a.clone(), Regex::Epsilon), b.clone()),
            c.clone(),
        );
        assert_eq!(
            nested.simplify(),
            Regex::concat(a.clone(), Regex::concat(b.clone(), c.clone()))
        );
        assert_eq!(nested.simplify().to_string(), "abc");

        // after re-association the duplicate becomes visible: (a|b)|(a|b) → a|b
        let ab = Regex::union(a.clone(), b.clone());
        assert_eq!(Regex::union(ab.clone(), ab.clone()).simplify(), ab);
    }

    fn samples() -> Vec<Regex> {
        let (a, b) = (sym('a'), sym('b'));
        let mut out = vec![Regex::Empty, Regex::Epsilon, a.clone(), b.clone()];
        // two rounds of combining everything with everything
        for _ in 0..2 {
            let current = out.clone();
            for (i, l) in current.iter().enumerate().step_by(2) {
                for r in current.iter().skip(i % 3).step_by(3).take(4) {
                    out.push(Regex::union(l.clone(), r.clone()));
                    out.push(Regex::concat(l.clone(), r.clone()));
                }
                out.push(Regex::star(l.clone()));
            }
        }
        out
    }

    #[test]
    fn simplification_is_idempotent() {
        let mut simplifier = Simplifier::default();
        for x in samples() {
            let once = x.simplify();
            assert_eq!(once.simplify(), once, "not a fixpoint: {x}");
            assert_eq!(simplifier.simplify(&x), once);
            assert!(once.size() <= x.size());
        }
    }

    #[test]
    fn simplification_keeps_the_language() {
        use crate::kleene::KleeneStar;
        for x in samples().into_iter().take(60) {
            let once = x.simplify();
            for word in KleeneStar::up_to(vec!['a', 'b'], 4) {
                assert_eq!(x.matches(&word), once.matches(&word), "{x} vs {once}");
            }
        }
    }

    #[test]
    fn shared_nodes_are_reused() {
        let mut simplifier = Simplifier::default();
        let ab = Rc::new(Regex::union(sym('a'), sym('b')));
        let first = simplifier.simplify_rc(&ab);
        let interned = simplifier.interned();
        let wrapped = Rc::new(Regex::Star(Rc::clone(&first)));
        let star = simplifier.simplify_rc(&wrapped);
        assert_eq!(simplifier.interned(), interned + 1);
        match star.as_ref() {
            Regex::Star(inner) => assert!(Rc::ptr_eq(inner, &first)),
            other => panic!("expected a star, got {other}"),
        }
    }

    #[test]
    fn deep_expressions_do_not_overflow() {
        let mut deep = Regex::Epsilon;
        for i in 0..50_000 {
            deep = if i % 2 == 0 {
                Regex::concat(deep, Regex::Epsilon)
            } else {
                Regex::union(Regex::Empty, deep)
            };
        }
        assert_eq!(deep.simplify(), Regex::Epsilon);
        // dropping a tree this deep recursively would overflow the stack
        std::mem::forget(deep);
    }
}
