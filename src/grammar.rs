//! Dense storage for binary CNF productions.
//!
//! All rules are binary (`lhs -> r1 r2`). Singleton/unit rules are excluded:
//! the caller handles them by seeding the recognizer's table directly.

use std::fmt;
use thiserror::Error;

/// Grammar symbol. `0` is the reserved sentinel/empty marker; positive
/// values are non-terminals.
pub type Sym = u32;

/// Position in the token string.
pub type Pos = u32;

/// A binary production `(lhs, r1, r2)` stored as a dense triple.
/// An all-zero triple marks the end of a production row.
pub type Production = [Sym; 3];

/// Errors raised by grammar mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("production row for symbol {0} is full")]
    Capacity(Sym),
}

/// A binary CNF grammar stored as an `N x M` table of productions, indexed
/// by left-hand symbol. Row `l` lists the productions with LHS `l`; the
/// first all-zero triple terminates the row (rows never have gaps).
#[derive(Clone, Debug)]
pub struct Grammar {
    /// Number of symbols (valid LHS values are `1..n`).
    n: usize,
    /// Maximum number of productions per LHS.
    m: usize,
    /// `table[l]` holds row `l`'s `m` production slots.
    table: Vec<Vec<Production>>,
}

impl Grammar {
    /// Create an empty grammar for `n` symbols with room for `m`
    /// productions per LHS.
    pub fn new(n: usize, m: usize) -> Self {
        Grammar {
            n,
            m,
            table: vec![vec![[0; 3]; m]; n],
        }
    }

    /// Number of symbols.
    pub fn num_symbols(&self) -> usize {
        self.n
    }

    /// Maximum number of productions per LHS.
    pub fn max_productions(&self) -> usize {
        self.m
    }

    /// Append the production `l -> r1 r2` at the first free slot of row
    /// `l`. Fails when the row already holds `m` productions.
    pub fn add(&mut self, l: Sym, r1: Sym, r2: Sym) -> Result<(), GrammarError> {
        assert!(l >= 1 && (l as usize) < self.n, "LHS symbol out of range: {}", l);
        let row = &mut self.table[l as usize];
        match row.iter_mut().find(|slot| slot[0] == 0) {
            Some(slot) => {
                *slot = [l, r1, r2];
                Ok(())
            }
            None => Err(GrammarError::Capacity(l)),
        }
    }

    /// Dense view of row `l`: all `m` slots, terminated by the first
    /// all-zero triple. Hot-loop counterpart of [`Grammar::productions`].
    #[inline(always)]
    pub fn productions_with_lhs(&self, l: Sym) -> &[Production] {
        &self.table[l as usize]
    }

    /// Iterate the productions with LHS `l`, stopping at the sentinel.
    pub fn productions(&self, l: Sym) -> impl Iterator<Item = &Production> {
        self.table[l as usize].iter().take_while(|p| p[0] != 0)
    }

    /// Iterate every production in the grammar, in row order.
    pub fn iter(&self) -> impl Iterator<Item = &Production> {
        self.table
            .iter()
            .flat_map(|row| row.iter().take_while(|p| p[0] != 0))
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "grammar [n = {}, m = {}]", self.n, self.m)?;
        for p in self.iter() {
            writeln!(f, "{} => {} {}", p[0], p[1], p[2])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut g = Grammar::new(4, 2);
        g.add(1, 2, 3).unwrap();
        g.add(1, 3, 2).unwrap();
        g.add(2, 3, 3).unwrap();

        let ps: Vec<_> = g.productions(1).collect();
        assert_eq!(ps, vec![&[1, 2, 3], &[1, 3, 2]]);

        // The dense view exposes all slots; the sentinel terminates row 3.
        assert_eq!(g.productions_with_lhs(3)[0], [0, 0, 0]);
        assert_eq!(g.productions(3).count(), 0);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut g = Grammar::new(3, 3);
        g.add(1, 1, 2).unwrap();
        g.add(1, 2, 1).unwrap();
        g.add(1, 2, 2).unwrap();

        let rhs: Vec<(Sym, Sym)> = g.productions(1).map(|p| (p[1], p[2])).collect();
        assert_eq!(rhs, vec![(1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_capacity_error() {
        let mut g = Grammar::new(3, 1);
        g.add(1, 2, 2).unwrap();
        assert_eq!(g.add(1, 2, 1), Err(GrammarError::Capacity(1)));
        // The full row is left untouched.
        assert_eq!(g.productions(1).count(), 1);
    }

    #[test]
    #[should_panic]
    fn test_lhs_zero_rejected() {
        let mut g = Grammar::new(3, 1);
        let _ = g.add(0, 1, 1);
    }

    #[test]
    fn test_display() {
        let mut g = Grammar::new(3, 1);
        g.add(2, 1, 1).unwrap();
        let s = format!("{}", g);
        assert!(s.contains("2 => 1 1"));
    }
}
