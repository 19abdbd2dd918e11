use std::fmt::{Debug, Display};

use fixedbitset::FixedBitSet;
use lstar_core::{
    math::{Map, Set},
    prelude::*,
};
use tracing::trace;

use super::{Oracle, Statistics};
use crate::LearnError;

/// The row of a prefix `s`, which holds at position `i` whether `s` followed by the `i`-th
/// experiment is accepted. As the empty experiment always comes first, bit 0 tells whether
/// `s` itself is accepted. Rows are compared and hashed as bit vectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(FixedBitSet);

impl Signature {
    /// Whether the prefix of this row is accepted.
    pub fn accepting(&self) -> bool {
        self.0.contains(0)
    }

    /// The number of experiments the row covers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the row covers no experiment.
    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }

    /// The entry for the experiment at position `i`.
    pub fn get(&self, i: usize) -> bool {
        self.0.contains(i)
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.0.len() {
            write!(f, "{}", if self.0.contains(i) { '1' } else { '0' })?;
        }
        Ok(())
    }
}

/// Witness for an inconsistent table: `left` and `right` have the same row, but
/// `left·symbol·suffix` and `right·symbol·suffix` are classified differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inconsistency {
    /// The first of the two prefixes.
    pub left: Word,
    /// The second of the two prefixes.
    pub right: Word,
    /// The symbol after which the two prefixes are told apart.
    pub symbol: Symbol,
    /// The experiment that tells them apart.
    pub suffix: Word,
}

/// The observation table of L*. It consists of a set of prefixes `S`, a set of experiments
/// `E` and the answers to the membership queries for all words `s·e` and `s·a·e` with `s` in
/// `S`, `a` a symbol and `e` in `E`. Answers are obtained lazily from the oracle and kept,
/// so every word is asked about at most once per table.
///
/// Both `S` and `E` start out as `{ε}` and only ever grow. Their insertion order is the
/// order in which all scans over the table proceed, which makes every witness that is
/// returned deterministic.
pub struct ObservationTable<O> {
    alphabet: Alphabet,
    oracle: O,
    prefixes: Set<Word>,
    experiments: Set<Word>,
    cells: Map<Word, bool>,
    stats: Statistics,
}

impl<O: Oracle> ObservationTable<O> {
    /// Creates the initial table with `S = E = {ε}` without asking any query yet.
    pub fn new(alphabet: Alphabet, oracle: O) -> Self {
        Self {
            alphabet,
            oracle,
            prefixes: Set::from_iter([vec![]]),
            experiments: Set::from_iter([vec![]]),
            cells: Map::default(),
            stats: Statistics::default(),
        }
    }

    /// The alphabet over which the table is built.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The prefixes `S` in insertion order.
    pub fn prefixes(&self) -> impl Iterator<Item = &Word> + '_ {
        self.prefixes.iter()
    }

    /// The experiments `E` in insertion order, beginning with ε.
    pub fn experiments(&self) -> impl Iterator<Item = &Word> + '_ {
        self.experiments.iter()
    }

    /// Counters for the membership queries posed through this table. Queries that are
    /// answered from the table itself count as cache hits.
    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    /// Gives access to the oracle.
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Gives access to the oracle.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Consumes the table and gives back the oracle.
    pub fn into_oracle(self) -> O {
        self.oracle
    }

    /// Looks up whether `word` is accepted, asking the oracle if the answer is not known yet.
    pub fn membership(&mut self, word: &[Symbol]) -> Result<bool, LearnError> {
        self.stats.membership_queries += 1;
        if let Some(answer) = self.cells.get(word) {
            self.stats.cache_hits += 1;
            return Ok(*answer);
        }
        self.stats.cache_misses += 1;
        let answer = self.oracle.membership(word)?;
        trace!("membership query {} answered with {answer}", word.show());
        self.cells.insert(word.to_vec(), answer);
        Ok(answer)
    }

    /// Computes the row of `prefix`, which needs not be an element of `S`.
    pub fn row_of(&mut self, prefix: &[Symbol]) -> Result<Signature, LearnError> {
        let mut bits = FixedBitSet::with_capacity(self.experiments.len());
        for i in 0..self.experiments.len() {
            let query = word::concat(prefix, &self.experiments[i]);
            if self.membership(&query)? {
                bits.insert(i);
            }
        }
        Ok(Signature(bits))
    }

    fn prefix_rows(&mut self) -> Result<Vec<Signature>, LearnError> {
        (0..self.prefixes.len())
            .map(|i| {
                let prefix = self.prefixes[i].clone();
                self.row_of(&prefix)
            })
            .collect()
    }

    /// Finds the first prefix `s` and symbol `a` such that the row of `s·a` is not the row
    /// of any prefix. Prefixes are scanned in order and symbols in alphabet order.
    pub fn find_unclosed(&mut self) -> Result<Option<(Word, Symbol)>, LearnError> {
        let known = self.prefix_rows()?.into_iter().collect::<Set<_>>();
        for i in 0..self.prefixes.len() {
            for j in 0..self.alphabet.size() {
                let (prefix, symbol) = (self.prefixes[i].clone(), self.alphabet[j]);
                let row = self.row_of(&word::extend(&prefix, symbol))?;
                if !known.contains(&row) {
                    return Ok(Some((prefix, symbol)));
                }
            }
        }
        Ok(None)
    }

    /// Returns true if the row of every one-symbol extension of a prefix is the row of
    /// some prefix.
    pub fn is_closed(&mut self) -> Result<bool, LearnError> {
        Ok(self.find_unclosed()?.is_none())
    }

    /// Finds the first witness of an inconsistency, scanning pairs of prefixes `(s1, s2)`
    /// with `s1` inserted before `s2`, then symbols, then experiments.
    pub fn find_inconsistency(&mut self) -> Result<Option<Inconsistency>, LearnError> {
        let rows = self.prefix_rows()?;
        for i in 0..self.prefixes.len() {
            for j in (i + 1)..self.prefixes.len() {
                if rows[i] != rows[j] {
                    continue;
                }
                for k in 0..self.alphabet.size() {
                    for l in 0..self.experiments.len() {
                        let symbol = self.alphabet[k];
                        let suffix = self.experiments[l].clone();
                        let left = self.prefixes[i].clone();
                        let right = self.prefixes[j].clone();
                        let tail = word::prepend(symbol, &suffix);
                        if self.membership(&word::concat(&left, &tail))?
                            != self.membership(&word::concat(&right, &tail))?
                        {
                            return Ok(Some(Inconsistency {
                                left,
                                right,
                                symbol,
                                suffix,
                            }));
                        }
                    }
                }
            }
        }
        Ok(None)
    }

    /// Returns true if prefixes with the same row also have the same rows after any symbol.
    pub fn is_consistent(&mut self) -> Result<bool, LearnError> {
        Ok(self.find_inconsistency()?.is_none())
    }

    /// Adds `prefix·symbol` to `S`, unless its row is already the row of some prefix.
    /// Returns whether the prefix was added.
    pub fn add_prefix(&mut self, prefix: &[Symbol], symbol: Symbol) -> Result<bool, LearnError> {
        let extended = word::extend(prefix, symbol);
        let row = self.row_of(&extended)?;
        if self.prefix_rows()?.contains(&row) {
            trace!("not adding prefix {}, its row {row} exists", extended.show());
            return Ok(false);
        }
        trace!("adding prefix {} with row {row}", extended.show());
        Ok(self.prefixes.insert(extended))
    }

    /// Adds `symbol·suffix` to `E` and fills the new column for every prefix and every
    /// one-symbol extension of a prefix. Returns whether the experiment was new.
    pub fn add_suffix(&mut self, symbol: Symbol, suffix: &[Symbol]) -> Result<bool, LearnError> {
        let experiment = word::prepend(symbol, suffix);
        if !self.experiments.insert(experiment.clone()) {
            return Ok(false);
        }
        trace!("adding experiment {}", experiment.show());
        for i in 0..self.prefixes.len() {
            let prefix = self.prefixes[i].clone();
            self.membership(&word::concat(&prefix, &experiment))?;
            for j in 0..self.alphabet.size() {
                let extended = word::extend(&prefix, self.alphabet[j]);
                self.membership(&word::concat(&extended, &experiment))?;
            }
        }
        Ok(true)
    }

    /// Adds every prefix of `word`, from ε up to `word` itself, to `S` unless it is there
    /// already. Returns the number of prefixes that were added.
    pub fn add_prefixes_of(&mut self, word: &[Symbol]) -> usize {
        let added = word::prefixes(word)
            .filter(|p| self.prefixes.insert(p.to_vec()))
            .count();
        trace!("added {added} prefixes of {}", word.show());
        added
    }

    /// Groups the prefixes by their rows. Groups appear in the order of their first member
    /// and list their members in insertion order.
    pub fn partition(&mut self) -> Result<Map<Signature, Vec<Word>>, LearnError> {
        let rows = self.prefix_rows()?;
        let mut classes: Map<Signature, Vec<Word>> = Map::default();
        for (prefix, row) in self.prefixes.iter().zip(rows) {
            classes.entry(row).or_default().push(prefix.clone());
        }
        Ok(classes)
    }
}

impl<O> Debug for ObservationTable<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = tabled::builder::Builder::default();
        let mut header = vec!["S".to_string()];
        for e in &self.experiments {
            header.push(e.show());
        }
        builder.push_record(header);

        let extensions = self
            .prefixes
            .iter()
            .flat_map(|s| self.alphabet.universe().map(|a| word::extend(s, a)))
            .filter(|w| !self.prefixes.contains(w))
            .collect::<Set<_>>();

        let rows = self
            .prefixes
            .iter()
            .map(|s| (s, ""))
            .chain(extensions.iter().map(|w| (w, "·")));
        for (prefix, marker) in rows {
            let mut record = vec![format!("{marker}{}", prefix.show())];
            for e in &self.experiments {
                let cell = match self.cells.get(&word::concat(prefix, e)) {
                    Some(true) => "1",
                    Some(false) => "0",
                    None => "?",
                };
                record.push(cell.to_string());
            }
            builder.push_record(record);
        }

        write!(f, "{}", builder.build())
    }
}

#[cfg(test)]
mod tests {
    use lstar_core::prelude::*;

    use super::{Inconsistency, ObservationTable};
    use crate::active::{Oracle, PredicateOracle};

    fn ab_star(w: &[char]) -> bool {
        w.len() % 2 == 0 && w.chunks(2).all(|c| c == ['a', 'b'])
    }

    #[test_log::test]
    fn rows_and_closedness() {
        let mut table = ObservationTable::new(Alphabet::from("ab"), PredicateOracle::new(ab_star));
        assert_eq!(table.row_of(&[]).unwrap().to_string(), "1");
        assert!(table.row_of(&[]).unwrap().accepting());
        assert_eq!(table.find_unclosed().unwrap(), Some((vec![], 'a')));
        assert!(table.add_prefix(&[], 'a').unwrap());
        // `b` has the same row as `a`
        assert!(!table.add_prefix(&[], 'b').unwrap());
        assert!(table.is_closed().unwrap());
        assert_eq!(table.prefixes().count(), 2);
    }

    #[test_log::test]
    fn inconsistencies_are_found_and_resolved() {
        let mut table = ObservationTable::new(Alphabet::from("ab"), PredicateOracle::new(ab_star));
        table.add_prefix(&[], 'a').unwrap();
        // `b` and `a` share the row 0, but `ab` is accepted and `bb` is not
        table.add_prefixes_of(&['b']);
        let witness = table.find_inconsistency().unwrap();
        assert_eq!(
            witness,
            Some(Inconsistency {
                left: vec!['a'],
                right: vec!['b'],
                symbol: 'b',
                suffix: vec![]
            })
        );
        assert!(table.add_suffix('b', &[]).unwrap());
        assert!(!table.add_suffix('b', &[]).unwrap());
        assert!(table.is_consistent().unwrap());
        assert_eq!(table.row_of(&['a']).unwrap().to_string(), "01");
        assert_eq!(table.row_of(&['b']).unwrap().to_string(), "00");

        let rendered = format!("{table:?}");
        assert!(rendered.contains('ε'));
        assert!(rendered.contains("·ab"));
    }

    #[test_log::test]
    fn queries_are_cached() {
        let mut table = ObservationTable::new(Alphabet::from("ab"), PredicateOracle::new(ab_star));
        table.row_of(&['a', 'b']).unwrap();
        table.row_of(&['a', 'b']).unwrap();
        let stats = table.statistics();
        assert_eq!(stats.membership_queries, 2);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(table.into_oracle().statistics().unwrap().membership_queries, 1);
    }

    #[test_log::test]
    fn partition_groups_rows() {
        let mut table = ObservationTable::new(Alphabet::from("ab"), PredicateOracle::new(ab_star));
        table.add_prefixes_of(&['a', 'b', 'b']);
        let classes = table.partition().unwrap();
        assert_eq!(classes.len(), 2);
        let (first, members) = classes.get_index(0).unwrap();
        assert!(first.accepting());
        assert_eq!(members, &vec![vec![], vec!['a', 'b']]);
    }
}
