//! Color scoring: per-span colors and the segmentation-quality order.
//!
//! A *color* asserts that non-terminal `nt` derives the `l`-token span at
//! position `i`. A span's coloring is the set of colors chosen for it, and
//! a [`Score`] ranks alternative segmentations of the same span.

use crate::grammar::{Pos, Sym};
use std::fmt;

/// A single color: non-terminal `nt` covering the `l`-token span at `i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub nt: Sym,
    pub i: Pos,
    pub l: Pos,
}

/// The colors assigned to one span. Insertion order is preserved and
/// observable; duplicates are dropped on insertion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorSet {
    colors: Vec<Color>,
}

impl ColorSet {
    pub fn new() -> Self {
        ColorSet::default()
    }

    /// Add the color `(nt, i, l)` unless it is already present.
    pub fn add(&mut self, nt: Sym, i: Pos, l: Pos) {
        let color = Color { nt, i, l };
        if !self.colors.contains(&color) {
            self.colors.push(color);
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, j: usize) -> Option<&Color> {
        self.colors.get(j)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Color> {
        self.colors.iter()
    }

    pub fn as_slice(&self) -> &[Color] {
        &self.colors
    }
}

impl fmt::Display for ColorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.colors {
            write!(f, "[{} {} {}] ", c.nt, c.i, c.l)?;
        }
        Ok(())
    }
}

/// Quality of a span coloring: `(coverage, largest, num)`, compared
/// lexicographically with all three fields descending. The derived `Ord`
/// gives exactly that order, so "better than" is `>` and ties are `==`.
///
/// `num` counts extents negatively (one full color scores `-1`), so a
/// greater `num` means fewer pieces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score {
    /// Number of tokens covered by colors.
    pub coverage: i32,
    /// Largest single color in the segmentation.
    pub largest: i32,
    /// Negated number of extents.
    pub num: i32,
}

impl Score {
    pub fn new(coverage: i32, largest: i32, num: i32) -> Self {
        Score {
            coverage,
            largest,
            num,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Score({},{},{})", self.coverage, self.largest, self.num)
    }
}
