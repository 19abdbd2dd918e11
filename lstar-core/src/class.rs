use std::fmt::{Display, Write};

use itertools::Itertools;

use crate::{alphabet::Symbol, show::Show};

/// Runs of at least this many consecutive code points are written as a range.
pub const MIN_RANGE_LENGTH: u32 = 3;

/// One item of a [`CharClass`], either a single symbol or an inclusive range of symbols.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum ClassItem {
    /// A single symbol.
    Symbol(Symbol),
    /// All symbols from the first up to and including the second.
    Range(Symbol, Symbol),
}

impl ClassItem {
    /// The smallest symbol covered by this item.
    pub fn low(&self) -> Symbol {
        match self {
            ClassItem::Symbol(sym) | ClassItem::Range(sym, _) => *sym,
        }
    }

    /// The largest symbol covered by this item.
    pub fn high(&self) -> Symbol {
        match self {
            ClassItem::Symbol(sym) | ClassItem::Range(_, sym) => *sym,
        }
    }

    /// Returns true if `symbol` is covered.
    pub fn contains(&self, symbol: Symbol) -> bool {
        self.low() <= symbol && symbol <= self.high()
    }

    /// The number of symbols covered.
    pub fn len(&self) -> usize {
        // ranges never span the surrogate block, compression only joins adjacent code points
        (self.high() as u32 - self.low() as u32) as usize + 1
    }

    /// Iterates over all covered symbols in ascending order.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> {
        self.low()..=self.high()
    }
}

/// A set of symbols, stored as a sorted list of disjoint [`ClassItem`]s. The representation
/// is canonical: a class is always built through [`CharClass::compress`], which turns every
/// maximal run of [`MIN_RANGE_LENGTH`] or more consecutive code points into a range and keeps
/// all other symbols as they are. As a consequence two classes are equal if and only if they
/// contain the same symbols, and expanding a class with [`CharClass::symbols`] reproduces
/// exactly the set it was built from.
///
/// # Example
/// ```
/// use lstar_core::class::CharClass;
/// let class = CharClass::compress("zxcab".chars());
/// assert_eq!(class.to_string(), "[a-cxz]");
/// assert_eq!(class.symbols().collect::<String>(), "abcxz");
/// ```
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct CharClass(Vec<ClassItem>);

impl CharClass {
    /// The class that contains no symbol at all.
    pub fn empty() -> Self {
        Self(vec![])
    }

    /// The class consisting of exactly `symbol`.
    pub fn single(symbol: Symbol) -> Self {
        Self(vec![ClassItem::Symbol(symbol)])
    }

    /// Compresses a set of symbols. The input may be in any order and may contain duplicates.
    pub fn compress<I: IntoIterator<Item = Symbol>>(symbols: I) -> Self {
        let sorted = symbols.into_iter().sorted().dedup().collect_vec();
        let mut items = Vec::new();
        let mut start = 0;
        while start < sorted.len() {
            let mut end = start;
            while end + 1 < sorted.len() && sorted[end] as u32 + 1 == sorted[end + 1] as u32 {
                end += 1;
            }
            if (end - start + 1) as u32 >= MIN_RANGE_LENGTH {
                items.push(ClassItem::Range(sorted[start], sorted[end]));
            } else {
                items.extend(sorted[start..=end].iter().map(|sym| ClassItem::Symbol(*sym)));
            }
            start = end + 1;
        }
        Self(items)
    }

    /// The items of this class in ascending order.
    pub fn items(&self) -> &[ClassItem] {
        &self.0
    }

    /// Expands the class into its symbols in ascending order.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.0.iter().flat_map(|item| item.symbols())
    }

    /// Returns true if `symbol` belongs to the class.
    pub fn contains(&self, symbol: Symbol) -> bool {
        // items are sorted and disjoint
        match self.0.binary_search_by(|item| item.high().cmp(&symbol)) {
            Ok(_) => true,
            Err(pos) => self.0.get(pos).is_some_and(|item| item.contains(symbol)),
        }
    }

    /// Returns true if some symbol belongs to both classes.
    pub fn overlaps(&self, other: &CharClass) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            let (left, right) = (&self.0[i], &other.0[j]);
            if left.high() < right.low() {
                i += 1;
            } else if right.high() < left.low() {
                j += 1;
            } else {
                return true;
            }
        }
        false
    }

    /// Builds the class that contains the symbols of both.
    pub fn union(&self, other: &CharClass) -> CharClass {
        CharClass::compress(self.symbols().chain(other.symbols()))
    }

    /// The number of symbols in the class.
    pub fn len(&self) -> usize {
        self.0.iter().map(ClassItem::len).sum()
    }

    /// Returns true if the class contains no symbols.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// If the class consists of exactly one symbol, that symbol is returned.
    pub fn as_single(&self) -> Option<Symbol> {
        match self.0.as_slice() {
            [ClassItem::Symbol(sym)] => Some(*sym),
            _ => None,
        }
    }

    /// Renders the class in the hex-escaped form used for ANML symbol sets, e.g. `[\x61-\x63]`.
    pub fn to_anml(&self) -> String {
        let mut out = String::from("[");
        for item in &self.0 {
            match item {
                ClassItem::Symbol(sym) => {
                    let _ = write!(out, "\\x{:02x}", *sym as u32);
                }
                ClassItem::Range(low, high) => {
                    let _ = write!(out, "\\x{:02x}-\\x{:02x}", *low as u32, *high as u32);
                }
            }
        }
        out.push(']');
        out
    }
}

/// Escapes a symbol that appears on its own, outside of brackets.
fn escape_bare(symbol: Symbol) -> String {
    match symbol {
        '(' | ')' | '[' | ']' | '*' | '|' | '\\' | '.' | '+' | '?' | '{' | '}' => {
            format!("\\{symbol}")
        }
        _ => symbol.show(),
    }
}

/// Escapes a symbol that appears inside of brackets.
fn escape_bracketed(symbol: Symbol) -> String {
    match symbol {
        ']' | '[' | '\\' | '-' | '^' => format!("\\{symbol}"),
        _ => symbol.show(),
    }
}

impl Display for CharClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(sym) = self.as_single() {
            return write!(f, "{}", escape_bare(sym));
        }
        write!(f, "[")?;
        for item in &self.0 {
            match item {
                ClassItem::Symbol(sym) => write!(f, "{}", escape_bracketed(*sym))?,
                ClassItem::Range(low, high) => write!(
                    f,
                    "{}-{}",
                    escape_bracketed(*low),
                    escape_bracketed(*high)
                )?,
            }
        }
        write!(f, "]")
    }
}

impl FromIterator<Symbol> for CharClass {
    fn from_iter<T: IntoIterator<Item = Symbol>>(iter: T) -> Self {
        Self::compress(iter)
    }
}

impl From<Symbol> for CharClass {
    fn from(value: Symbol) -> Self {
        Self::single(value)
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::{CharClass, ClassItem};
    use crate::alphabet::Alphabet;

    #[test]
    fn compression_example() {
        let class = CharClass::compress(['a', 'b', 'c', 'x', 'z']);
        assert_eq!(
            class.items(),
            &[
                ClassItem::Range('a', 'c'),
                ClassItem::Symbol('x'),
                ClassItem::Symbol('z')
            ]
        );
        assert_eq!(class.to_string(), "[a-cxz]");
        assert_eq!(class.to_anml(), "[\\x61-\\x63\\x78\\x7a]");
        assert_eq!(class.len(), 5);
    }

    #[test]
    fn short_runs_stay_literal() {
        let class = CharClass::compress("ab".chars());
        assert_eq!(class.items(), &[ClassItem::Symbol('a'), ClassItem::Symbol('b')]);
        assert_eq!(class.to_string(), "[ab]");
        assert_eq!(CharClass::single('a').to_string(), "a");
        assert_eq!(CharClass::single('*').to_string(), "\\*");
        assert_eq!(CharClass::empty().to_string(), "[]");
        assert_eq!(CharClass::compress("-]^".chars()).to_string(), "[\\-\\]\\^]");
    }

    #[test]
    fn every_subset_round_trips() {
        // every subset of a seven letter alphabet, encoded as the bits of a number
        let alphabet = Alphabet::from("abcdfgh");
        for mask in 0u32..(1 << alphabet.size()) {
            let subset = alphabet
                .universe()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, sym)| sym)
                .collect_vec();
            let class = CharClass::compress(subset.iter().copied());
            assert_eq!(class.symbols().collect_vec(), subset);
            assert_eq!(class.len(), subset.len());
            for sym in alphabet.universe() {
                assert_eq!(class.contains(sym), subset.contains(&sym));
            }
        }
    }

    #[test]
    fn byte_classes() {
        let class: CharClass = Alphabet::bytes().universe().filter(|c| *c != 'q').collect();
        assert_eq!(class.len(), 255);
        assert!(!class.contains('q'));
        assert_eq!(class.items().len(), 2);
    }

    #[test]
    fn overlapping_and_union() {
        let left = CharClass::compress("abcde".chars());
        let right = CharClass::compress("xyz".chars());
        assert!(!left.overlaps(&right));
        assert!(left.overlaps(&CharClass::single('c')));
        assert!(CharClass::compress("ez".chars()).overlaps(&right));
        let union = left.union(&right);
        assert_eq!(union.to_string(), "[a-ex-z]");
        let filled = CharClass::compress("abd".chars()).union(&CharClass::single('c'));
        assert_eq!(filled.to_string(), "[a-d]");
    }
}
