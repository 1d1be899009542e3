//! Best-segmentation coloring over a completed CYK table.
//!
//! For every span `(i, l)` the colorizer records the best-scoring
//! segmentation into maximal non-terminal spans: either a "full" coloring
//! (one or more non-ignored non-terminals cover the whole span) or the
//! best combination of two sub-span colorings. Like the recognizer it can
//! run blocking or chunked.

use crate::color::{Color, ColorSet, Score};
use crate::cyk::{Cyk, CHUNK_LEN};
use crate::diag::trace;
use crate::grammar::{Pos, Sym};
use rustc_hash::FxHashSet;
use std::fmt;

/// Coloring and score tables for one recognizer run.
///
/// The tables read the CYK table through a shared borrow passed to each
/// entry point; the recognizer must be left untouched between chunks of a
/// partial colorization.
#[derive(Clone, Debug)]
pub struct Colorizer {
    m: usize,
    lmax: usize,
    /// `col[i][l]`.
    col: Vec<Vec<ColorSet>>,
    /// `score[i][l]`.
    score: Vec<Vec<Score>>,
    /// Non-terminals excluded from coloring.
    ignored: FxHashSet<Sym>,
}

impl Colorizer {
    /// Create zeroed tables sized for `cyk`'s input.
    pub fn new(cyk: &Cyk) -> Self {
        let m = cyk.input_len();
        let lmax = cyk.lmax();
        Colorizer {
            m,
            lmax,
            col: vec![vec![ColorSet::new(); lmax]; m],
            score: vec![vec![Score::default(); lmax]; m],
            ignored: FxHashSet::default(),
        }
    }

    /// Exclude `nt` from colorings. Call before colorizing.
    pub fn ignore(&mut self, nt: Sym) {
        self.ignored.insert(nt);
    }

    pub fn is_ignored(&self, nt: Sym) -> bool {
        self.ignored.contains(&nt)
    }

    /// The colors assigned to span `(i, l)`.
    pub fn colors(&self, i: Pos, l: Pos) -> &ColorSet {
        &self.col[i as usize][l as usize]
    }

    /// The score of span `(i, l)`'s coloring.
    pub fn score(&self, i: Pos, l: Pos) -> Score {
        self.score[i as usize][l as usize]
    }

    /// Populate the `l = 1` layer: every non-ignored singleton derivation
    /// becomes a color scoring `(1, 1, -1)`.
    fn init_singletons(&mut self, cyk: &Cyk) {
        for i in 0..self.m {
            for nt in 1..cyk.num_symbols() {
                if !self.is_ignored(nt as Sym) && cyk.get(nt as Sym, i as Pos, 1) {
                    self.col[i][1].add(nt as Sym, i as Pos, 1);
                    self.score[i][1] = Score::new(1, 1, -1);
                }
            }
        }
    }

    /// Compute the coloring of span `(i, l)` from the layers below it.
    fn compute_color(&mut self, cyk: &Cyk, i: usize, l: usize) {
        // Full case: some non-ignored nt covers the entire span.
        let mut full = false;
        for nt in 1..cyk.num_symbols() {
            if !self.is_ignored(nt as Sym) && cyk.get(nt as Sym, i as Pos, l as Pos) {
                self.col[i][l].add(nt as Sym, i as Pos, l as Pos);
                self.score[i][l] = Score::new(l as i32, l as i32, -1);
                full = true;
            }
        }
        if full {
            return;
        }

        // Partial case: pick the best split. Ties accumulate candidates in
        // increasing-k order, which makes coloring deterministic.
        let mut best_score = Score::new(0, 0, -1_000_000);
        let mut best: Vec<(usize, usize)> = Vec::new();
        for k in 1..l {
            let left = self.score[i][k];
            let right = self.score[i + k][l - k];
            let combined = Score::new(
                left.coverage + right.coverage,
                left.largest.max(right.largest),
                left.num + right.num,
            );

            if combined > best_score {
                best_score = combined;
                best.clear();
            } else if combined != best_score {
                continue;
            }
            if !self.col[i][k].is_empty() {
                best.push((i, k));
            }
            if !self.col[i + k][l - k].is_empty() {
                best.push((i + k, l - k));
            }
        }

        let merged: Vec<Color> = best
            .iter()
            .flat_map(|&(ci, cl)| self.col[ci][cl].iter().copied())
            .collect();
        let cell = &mut self.col[i][l];
        for c in merged {
            cell.add(c.nt, c.i, c.l);
        }
        self.score[i][l] = best_score;
    }

    /// Fill one `l` layer of the coloring tables.
    fn fill_layer(&mut self, cyk: &Cyk, l: usize) {
        for i in 0..=self.m - l {
            self.compute_color(cyk, i, l);
        }
    }

    /// Colorize every span in one blocking sweep.
    pub fn colorize(&mut self, cyk: &Cyk) {
        trace!(m = self.m, "colorize");
        self.init_singletons(cyk);
        for l in 2..self.lmax {
            self.fill_layer(cyk, l);
        }
    }

    /// Initialize the `l = 1` layer in preparation for
    /// [`Colorizer::colorize_partial`].
    pub fn init_partial(&mut self, cyk: &Cyk) {
        self.init_singletons(cyk);
    }

    /// Colorize [`CHUNK_LEN`] span lengths starting at `l0`; returns the
    /// next `l0`, or `0` once all lengths are done. Same chunking contract
    /// as [`Cyk::parse_partial`].
    pub fn colorize_partial(&mut self, cyk: &Cyk, l0: usize) -> usize {
        let next_l = l0 + CHUNK_LEN;
        let mut l = l0;
        while l < self.lmax && l < next_l {
            self.fill_layer(cyk, l);
            l += 1;
        }
        if l >= self.lmax {
            0
        } else {
            next_l
        }
    }
}

impl fmt::Display for Colorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "color table [m = {}]", self.m)?;
        for l in 0..self.lmax {
            for i in 0..self.m {
                let cs = &self.col[i][l];
                if !cs.is_empty() {
                    writeln!(f, "{} {} | {}", i, l, cs)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    /// 1=S, 2=A, 3=B with S -> A B over "a b", parsed.
    fn parsed_ab() -> Cyk {
        let mut g = Grammar::new(4, 1);
        g.add(1, 2, 3).unwrap();
        let mut cyk = Cyk::new(4, 2, g);
        cyk.set(2, 0, 1);
        cyk.set(3, 1, 1);
        cyk.parse();
        cyk
    }

    #[test]
    fn test_full_coloring() {
        let cyk = parsed_ab();
        let mut col = Colorizer::new(&cyk);
        col.colorize(&cyk);

        assert_eq!(col.colors(0, 2).as_slice(), &[Color { nt: 1, i: 0, l: 2 }]);
        assert_eq!(col.score(0, 2), Score::new(2, 2, -1));
    }

    #[test]
    fn test_partial_coloring_with_ignored_root() {
        let cyk = parsed_ab();
        let mut col = Colorizer::new(&cyk);
        col.ignore(1);
        col.colorize(&cyk);

        // With S ignored, the best coloring of the whole input is the
        // union of the two singleton colorings.
        assert_eq!(
            col.colors(0, 2).as_slice(),
            &[Color { nt: 2, i: 0, l: 1 }, Color { nt: 3, i: 1, l: 1 }]
        );
        assert_eq!(col.score(0, 2), Score::new(2, 1, -2));
    }

    #[test]
    fn test_singleton_layer() {
        let cyk = parsed_ab();
        let mut col = Colorizer::new(&cyk);
        col.init_partial(&cyk);

        assert_eq!(col.colors(0, 1).as_slice(), &[Color { nt: 2, i: 0, l: 1 }]);
        assert_eq!(col.colors(1, 1).as_slice(), &[Color { nt: 3, i: 1, l: 1 }]);
        assert_eq!(col.score(0, 1), Score::new(1, 1, -1));
        // Nothing above l = 1 yet.
        assert!(col.colors(0, 2).is_empty());
    }

    #[test]
    fn test_uncovered_gap_scores_partially() {
        // 1=S, 2=A, 3=B over "a ? b": the middle token derives nothing, so
        // every larger span falls to the partial case.
        let mut g = Grammar::new(4, 1);
        g.add(1, 2, 3).unwrap();
        let mut cyk = Cyk::new(4, 3, g);
        cyk.set(2, 0, 1);
        cyk.set(3, 2, 1);
        cyk.parse();

        let mut col = Colorizer::new(&cyk);
        col.colorize(&cyk);

        // Span (0, 3) covers two of three tokens in two extents.
        assert_eq!(col.score(0, 3), Score::new(2, 1, -2));
        assert_eq!(
            col.colors(0, 3).as_slice(),
            &[Color { nt: 2, i: 0, l: 1 }, Color { nt: 3, i: 2, l: 1 }]
        );
    }

    #[test]
    fn test_chunked_matches_full() {
        // A 13-token run of X's under S -> X X, X -> X X needs two chunks.
        let m = 13;
        let mut g = Grammar::new(3, 2);
        g.add(1, 2, 2).unwrap();
        g.add(2, 2, 2).unwrap();
        let mut cyk = Cyk::new(3, m, g);
        for i in 0..m as Pos {
            cyk.set(2, i, 1);
        }
        cyk.parse();

        let mut full = Colorizer::new(&cyk);
        full.colorize(&cyk);

        let mut chunked = Colorizer::new(&cyk);
        chunked.init_partial(&cyk);
        assert_eq!(chunked.colorize_partial(&cyk, 2), 12);
        assert_eq!(chunked.colorize_partial(&cyk, 12), 0);

        for i in 0..m {
            for l in 1..=m - i {
                assert_eq!(
                    full.colors(i as Pos, l as Pos),
                    chunked.colors(i as Pos, l as Pos)
                );
                assert_eq!(
                    full.score(i as Pos, l as Pos),
                    chunked.score(i as Pos, l as Pos)
                );
            }
        }
    }
}
