use crate::{alphabet::Symbol, word::Word};

/// Enumerates the words over a list of symbols in length-lexicographic order, where the
/// order among symbols of the same length is given by their position in the list. Starting
/// with ε, all words of length one follow, then all words of length two and so on.
#[derive(Clone, Debug)]
pub struct KleeneStar {
    symbols: Vec<Symbol>,
    current: Vec<usize>,
    max_len: Option<usize>,
}

impl Iterator for KleeneStar {
    type Item = Word;
    fn next(&mut self) -> Option<Self::Item> {
        if self.max_len.is_some_and(|max| self.current.len() > max) {
            return None;
        }
        let out = self.current.iter().map(|i| self.symbols[*i]).collect();

        if self.symbols.is_empty() {
            // only ε exists over the empty set of symbols
            self.max_len = Some(0);
            self.current.push(0);
            return Some(out);
        }

        let mut carry = true;
        let mut i = self.current.len();
        while carry && i > 0 {
            i -= 1;
            self.current[i] += 1;
            if self.current[i] >= self.symbols.len() {
                self.current[i] = 0;
                carry = true;
            } else {
                carry = false;
            }
        }

        if carry {
            self.current = std::iter::repeat(0).take(self.current.len() + 1).collect();
        }

        Some(out)
    }
}

impl KleeneStar {
    /// Creates an unbounded enumeration, beginning with ε.
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self {
            symbols,
            current: vec![],
            max_len: None,
        }
    }

    /// Enumerates only the words of length at most `max_len`.
    pub fn up_to(symbols: Vec<Symbol>, max_len: usize) -> Self {
        Self {
            symbols,
            current: vec![],
            max_len: Some(max_len),
        }
    }

    /// Skips ε and starts with the words of length one.
    pub fn non_empty(symbols: Vec<Symbol>) -> Self {
        assert!(!symbols.is_empty(), "need at least one symbol");
        Self {
            symbols,
            current: vec![0],
            max_len: None,
        }
    }
}
