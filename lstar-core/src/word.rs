//! Finite words over an [`crate::alphabet::Alphabet`] and the few operations the learner
//! performs on them. A word is just a `Vec<Symbol>`, borrowed as `&[Symbol]` wherever it is
//! only read.
use crate::alphabet::Symbol;

/// A finite sequence of symbols. The empty word ε is the empty vector.
pub type Word = Vec<Symbol>;

/// Concatenates two words into a freshly allocated one.
pub fn concat(left: &[Symbol], right: &[Symbol]) -> Word {
    let mut out = Vec::with_capacity(left.len() + right.len());
    out.extend_from_slice(left);
    out.extend_from_slice(right);
    out
}

/// Returns `word` followed by `symbol`.
pub fn extend(word: &[Symbol], symbol: Symbol) -> Word {
    let mut out = Vec::with_capacity(word.len() + 1);
    out.extend_from_slice(word);
    out.push(symbol);
    out
}

/// Returns `symbol` followed by `word`.
pub fn prepend(symbol: Symbol, word: &[Symbol]) -> Word {
    let mut out = Vec::with_capacity(word.len() + 1);
    out.push(symbol);
    out.extend_from_slice(word);
    out
}

/// Iterates over all prefixes of `word`, starting with ε and ending with `word` itself.
///
/// # Example
/// ```
/// use lstar_core::word::prefixes;
/// let word = ['a', 'b'];
/// let all = prefixes(&word).map(|p| p.iter().collect::<String>()).collect::<Vec<_>>();
/// assert_eq!(all, vec!["", "a", "ab"]);
/// ```
pub fn prefixes(word: &[Symbol]) -> Prefixes<'_> {
    Prefixes { word, next: 0 }
}

/// Iterator returned by [`prefixes`].
#[derive(Clone, Debug)]
pub struct Prefixes<'a> {
    word: &'a [Symbol],
    next: usize,
}

impl<'a> Iterator for Prefixes<'a> {
    type Item = &'a [Symbol];

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.word.len() {
            return None;
        }
        let out = &self.word[..self.next];
        self.next += 1;
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.word.len() + 1).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Prefixes<'_> {}

/// Conversion into an owned [`Word`], implemented for the usual ways of writing one down.
pub trait IntoWord {
    /// Turns `self` into a [`Word`].
    fn into_word(self) -> Word;
}

impl IntoWord for &str {
    fn into_word(self) -> Word {
        self.chars().collect()
    }
}

impl IntoWord for String {
    fn into_word(self) -> Word {
        self.chars().collect()
    }
}

impl IntoWord for Word {
    fn into_word(self) -> Word {
        self
    }
}

impl IntoWord for &[Symbol] {
    fn into_word(self) -> Word {
        self.to_vec()
    }
}

impl<const N: usize> IntoWord for [Symbol; N] {
    fn into_word(self) -> Word {
        self.to_vec()
    }
}
