//! Shortest-path extraction over constraint graphs.
//!
//! The solver finds the shortest start-to-end paths of a constraint state,
//! reports each path's vertices and edge labels, and compresses the
//! alternatives into one per-position union of candidate symbols. All entry
//! points fill an output [`Solution`] and leave it empty when the state is
//! unsatisfiable.

use crate::constraint::ConstraintState;
use crate::diag::{debug, trace};
use crate::grammar::{Pos, Sym};
use crate::graph::VertexId;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::fmt;

/// Hard cap on path-extension iterations, a structural safeguard against
/// pathological graphs. A capped search reports an empty, flagged solution.
pub const PATH_ITERATION_LIMIT: usize = 100;

/// The result of a shortest-path solve: for each shortest path its vertex
/// position-lists (`raws`) and per-edge symbol lists (`paths`), plus the
/// per-position union over all paths (`compressed_path`).
#[derive(Clone, Debug, Default)]
pub struct Solution {
    raws: Vec<Vec<Vec<Pos>>>,
    paths: Vec<Vec<Vec<Sym>>>,
    compressed_path: Vec<Vec<Sym>>,
    truncated: bool,
}

impl Solution {
    pub fn new() -> Self {
        Solution::default()
    }

    /// Per path, the ordered vertex position-lists.
    pub fn raws(&self) -> &[Vec<Vec<Pos>>] {
        &self.raws
    }

    /// Per path, the ordered per-edge symbol lists.
    pub fn paths(&self) -> &[Vec<Vec<Sym>>] {
        &self.paths
    }

    /// At each edge position, the sorted union of symbols across all
    /// paths.
    pub fn compressed_path(&self) -> &[Vec<Sym>] {
        &self.compressed_path
    }

    /// True when the search hit [`PATH_ITERATION_LIMIT`] before finding a
    /// path; the solution is then empty but the inputs were not proven
    /// unsatisfiable.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Rebuild `compressed_path` from `paths`: position by position, the
    /// sorted duplicate-free union of every path's symbols.
    pub fn compress(&mut self) {
        self.compressed_path.clear();
        let Some(first) = self.paths.first() else {
            return;
        };

        let mut staging: Vec<BTreeSet<Sym>> = vec![BTreeSet::new(); first.len()];
        for path in &self.paths {
            for (j, syms) in path.iter().enumerate() {
                staging[j].extend(syms.iter().copied());
            }
        }
        self.compressed_path = staging
            .into_iter()
            .map(|set| set.into_iter().collect())
            .collect();
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "solution ({} paths) :", self.paths.len())?;
        for path in &self.paths {
            write!(f, "  ")?;
            for syms in path {
                write!(f, "#{{")?;
                for s in syms {
                    write!(f, " {}", s)?;
                }
                write!(f, " }} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl ConstraintState {
    /// Level-by-level backward search from `snk`: every partial path is
    /// extended by each distinct in-neighbour inside the kept vertex set.
    /// The first level that reaches `src` wins; every path of that level
    /// not reaching `src` is discarded. Returns the solution paths and
    /// whether the iteration cap cut the search short.
    fn shortest_paths(
        &self,
        kept: &FxHashSet<VertexId>,
        src: VertexId,
        snk: VertexId,
    ) -> (Vec<Vec<VertexId>>, bool) {
        let mut frontier = vec![vec![snk]];
        for _ in 0..PATH_ITERATION_LIMIT {
            let mut extended: Vec<Vec<VertexId>> = Vec::new();
            let mut found = false;
            for path in &frontier {
                let head = path[0];
                for e in self.graph().in_edges(head) {
                    let pred = self.graph().source(e);
                    if !kept.contains(&pred) {
                        continue;
                    }
                    let mut longer = Vec::with_capacity(path.len() + 1);
                    longer.push(pred);
                    longer.extend_from_slice(path);
                    if pred == src {
                        found = true;
                    }
                    extended.push(longer);
                }
            }

            if found {
                extended.retain(|p| p[0] == src);
                return (extended, false);
            }
            if extended.is_empty() {
                trace!("no solution paths");
                return (Vec::new(), false);
            }
            frontier = extended;
        }
        debug!(limit = PATH_ITERATION_LIMIT, "path search truncated");
        (Vec::new(), true)
    }

    /// Extract the shortest start-to-end paths into `solution`. The state
    /// itself is not modified; an unsatisfiable state leaves `solution`
    /// empty.
    pub fn solve_shortest(&self, solution: &mut Solution) {
        let Some((src, snk, kept)) = self.solution_span() else {
            return;
        };

        let (paths, truncated) = self.shortest_paths(&kept, src, snk);
        solution.truncated = truncated;
        debug!(count = paths.len(), "solution paths");

        for path in paths {
            let raw: Vec<Vec<Pos>> = path
                .iter()
                .map(|&v| self.graph().vertex(v).positions().to_vec())
                .collect();
            solution.raws.push(raw);

            let syms: Vec<Vec<Sym>> = path
                .windows(2)
                .filter_map(|pair| {
                    self.graph()
                        .find_edge(pair[0], pair[1])
                        .map(|e| self.graph().edge(e).syms().to_vec())
                })
                .collect();
            solution.paths.push(syms);
        }
        solution.compress();
    }

    /// Like [`ConstraintState::solve_shortest`], but first strips the unit
    /// edge (a direct start-to-end edge labelled only by terminals), so a
    /// solution that merely restates the examples as terminal strings is
    /// not reported.
    pub fn solve_shortest_non_unit(&mut self, solution: &mut Solution) {
        self.remove_unit_paths();
        self.solve_shortest(solution);
    }
}
