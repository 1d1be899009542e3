//! Dense CYK recognition over a tokenized input.
//!
//! The recognizer owns a boolean table `R[nt][i][l]` meaning "non-terminal
//! `nt` derives the `l`-token substring starting at `i`". Callers pre-seed
//! the `l = 1` layer (singleton/unit derivations are handled outside the
//! binary sweep) and then run either a blocking [`Cyk::parse`] or the
//! chunked [`Cyk::parse_partial`] loop, which yields to the caller between
//! chunks so an interactive host can stay responsive.

use crate::diag::trace;
use crate::grammar::{Grammar, Pos, Sym};
use std::fmt;

/// Number of successive span lengths processed by one call to a
/// `*_partial` entry point. Part of the public contract: callers drive
/// their redraw loop by it.
pub const CHUNK_LEN: usize = 10;

/// CYK recognition table plus the grammar it is computed from.
///
/// The recognizer takes its [`Grammar`] by move: it is the grammar's last
/// holder and drops it together with the tables.
#[derive(Clone, Debug)]
pub struct Cyk {
    /// 1 + number of symbols.
    n: usize,
    /// Length of the token string.
    m: usize,
    /// `1 + m`; spans have lengths `1..lmax`.
    lmax: usize,
    /// `table[nt][i][l]`.
    table: Vec<Vec<Vec<bool>>>,
    grammar: Grammar,
}

impl Cyk {
    /// Create a recognizer for `n` symbols over `m` tokens.
    pub fn new(n: usize, m: usize, grammar: Grammar) -> Self {
        let lmax = m + 1;
        Cyk {
            n,
            m,
            lmax,
            table: vec![vec![vec![false; lmax]; m]; n],
            grammar,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Length of the token string.
    pub fn input_len(&self) -> usize {
        self.m
    }

    pub fn num_symbols(&self) -> usize {
        self.n
    }

    /// One past the longest span length.
    pub fn lmax(&self) -> usize {
        self.lmax
    }

    /// Set `R[nt][i][l]`. Used to pre-seed singleton derivations before
    /// parsing, and to pin entries (see [`Cyk::parse`]).
    pub fn set(&mut self, nt: Sym, i: Pos, l: Pos) {
        self.table[nt as usize][i as usize][l as usize] = true;
    }

    /// Clear `R[nt][i][l]`.
    pub fn unset(&mut self, nt: Sym, i: Pos, l: Pos) {
        self.table[nt as usize][i as usize][l as usize] = false;
    }

    /// Read `R[nt][i][l]`.
    pub fn get(&self, nt: Sym, i: Pos, l: Pos) -> bool {
        self.table[nt as usize][i as usize][l as usize]
    }

    /// Compute one cell from the layers below it.
    ///
    /// A cell that is already true on entry is *pinned*: the caller set it
    /// before the sweep reached it, and the sweep must not rederive it.
    /// The match reports false so the assignment writes false back,
    /// excluding the pinned derivation from the table.
    fn match_span(&self, nt: usize, i: usize, l: usize) -> bool {
        if self.table[nt][i][l] {
            return false;
        }

        for p in self.grammar.productions_with_lhs(nt as Sym) {
            if p[0] == 0 {
                break;
            }
            let (a, b) = (p[1] as usize, p[2] as usize);
            for k in 1..l {
                if self.table[a][i][k] && self.table[b][i + k][l - k] {
                    return true;
                }
            }
        }
        false
    }

    /// Fill one `(l, nt, i)` layer of the table.
    fn fill_layer(&mut self, l: usize) {
        for nt in 1..self.n {
            for i in 0..=self.m - l {
                let derived = self.match_span(nt, i, l);
                self.table[nt][i][l] = derived;
            }
        }
    }

    /// Perform a complete parse. May block for a long time on large
    /// inputs; interactive hosts should prefer [`Cyk::parse_partial`].
    pub fn parse(&mut self) {
        trace!(n = self.n, m = self.m, "parse");
        for l in 2..self.lmax {
            self.fill_layer(l);
        }
    }

    /// Fill the table for [`CHUNK_LEN`] values of `l` starting at `l0`,
    /// then return the next value of `l` to resume from, or `0` once all
    /// span lengths are done. The caller typically redraws between calls;
    /// it must not mutate the grammar or the table while the sweep is in
    /// flight.
    pub fn parse_partial(&mut self, l0: usize) -> usize {
        let next_l = l0 + CHUNK_LEN;
        let mut l = l0;
        while l < self.lmax && l < next_l {
            self.fill_layer(l);
            l += 1;
        }
        if l >= self.lmax {
            0
        } else {
            next_l
        }
    }
}

impl fmt::Display for Cyk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cyk table [n = {}, m = {}, lmax = {}]", self.n, self.m, self.lmax)?;
        for nt in 0..self.n {
            writeln!(f, "=== {} ===", nt)?;
            for i in 0..self.m {
                write!(f, "i={} |", i)?;
                for l in 0..self.lmax {
                    write!(f, " {}", u8::from(self.table[nt][i][l]))?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
