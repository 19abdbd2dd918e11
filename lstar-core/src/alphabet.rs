use itertools::Itertools;

use crate::{class::CharClass, regex::Regex};

/// A symbol of an alphabet, which is also the type of the symbols in a word. Symbols are
/// ordered by their code point, which is what symbol classes rely on when they compress
/// runs of consecutive symbols into ranges.
pub type Symbol = char;

/// Represents an alphabet where a [`Symbol`] is just a single `char`. The order in which
/// symbols are given is kept and determines the order in which the learner scans them, so
/// two runs over the same alphabet pose the same queries in the same order.
///
/// # Example
/// ```
/// use lstar_core::alphabet::Alphabet;
/// let alphabet = Alphabet::from("ba");
/// assert_eq!(alphabet.universe().collect::<String>(), "ba");
/// assert!(alphabet.contains('a') && !alphabet.contains('c'));
/// ```
#[derive(Clone, Hash, PartialEq, Eq, Debug)]
pub struct Alphabet(Vec<Symbol>);

impl Alphabet {
    /// Creates a new alphabet from the given symbols. Duplicates are dropped, only the first
    /// occurrence of a symbol determines its position.
    pub fn new<I: IntoIterator<Item = Symbol>>(symbols: I) -> Self {
        Self(symbols.into_iter().unique().collect())
    }

    /// Creates a new [`Alphabet`] of the given size. The symbols are just the first `size`
    /// letters of the latin alphabet, i.e. 'a' to 'z'.
    pub fn of_size(size: usize) -> Self {
        assert!(size <= 26, "Alphabet is too large");
        Self((0..size).map(|i| (b'a' + i as u8) as char).collect())
    }

    /// The alphabet consisting of all 256 byte values, which is what inputs to a native
    /// target are drawn from when nothing more specific is known.
    pub fn bytes() -> Self {
        Self((0u8..=255).map(char::from).collect())
    }

    /// Returns an iterator over all symbols in the order in which they were given.
    pub fn universe(&self) -> std::iter::Copied<std::slice::Iter<'_, Symbol>> {
        self.0.iter().copied()
    }

    /// Returns the symbols as a slice.
    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    /// Returns true if the given symbol is present in the alphabet.
    pub fn contains(&self, symbol: Symbol) -> bool {
        self.0.contains(&symbol)
    }

    /// Gives the position of `symbol` in the alphabet, if it is present.
    pub fn position(&self, symbol: Symbol) -> Option<usize> {
        self.0.iter().position(|s| *s == symbol)
    }

    /// Returns the number of symbols in the alphabet.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the alphabet has no symbols at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Finds the first symbol of `word` that does not belong to the alphabet.
    pub fn first_foreign_symbol(&self, word: &[Symbol]) -> Option<Symbol> {
        word.iter().copied().find(|sym| !self.contains(*sym))
    }

    /// The whole alphabet as one compressed [`CharClass`].
    pub fn class(&self) -> CharClass {
        CharClass::compress(self.universe())
    }

    /// The regular expression `(Σ)*` matching every word over this alphabet.
    pub fn universal_regex(&self) -> Regex {
        Regex::star(Regex::literal(self.class()))
    }
}

impl std::ops::Index<usize> for Alphabet {
    type Output = Symbol;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<Symbol>> for Alphabet {
    fn from(value: Vec<Symbol>) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Alphabet {
    fn from(value: &str) -> Self {
        Self::new(value.chars())
    }
}

impl FromIterator<Symbol> for Alphabet {
    fn from_iter<T: IntoIterator<Item = Symbol>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl std::fmt::Display for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.class())
    }
}

#[cfg(test)]
mod tests {
    use super::Alphabet;

    #[test]
    fn order_is_kept_and_duplicates_dropped() {
        let alphabet = Alphabet::from("cabca");
        assert_eq!(alphabet.symbols(), &['c', 'a', 'b']);
        assert_eq!(alphabet.position('b'), Some(2));
        assert_eq!(alphabet[0], 'c');
    }

    #[test]
    fn foreign_symbols() {
        let alphabet = Alphabet::of_size(2);
        assert_eq!(alphabet.first_foreign_symbol(&['a', 'b', 'a']), None);
        assert_eq!(alphabet.first_foreign_symbol(&['a', 'x', 'y']), Some('x'));
    }

    #[test]
    fn byte_alphabet() {
        let bytes = Alphabet::bytes();
        assert_eq!(bytes.size(), 256);
        assert_eq!(bytes.to_string(), "[\\x00-ÿ]");
        assert!(bytes.universal_regex().matches(&['\u{0}', 'a', '\u{ff}']));
    }
}
