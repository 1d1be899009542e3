//! Constraint graphs over derivation position tuples.
//!
//! A [`ConstraintState`] bundles the derivations of one example (or of a
//! joint constraint produced by intersection): a directed graph whose
//! vertices are position tuples and whose edges carry symbol sets, plus the
//! provenance recording which example parses the state was built from and
//! the set of symbols designated as terminals. There is at most one edge
//! per ordered vertex pair; labels accumulate on it in sorted order.

use crate::diag::{debug, trace};
use crate::grammar::{Pos, Sym};
use crate::graph::{DiGraph, EdgeId, VertexId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::fmt;

/// Vertex identity: one position per interleaved example, compared and
/// ordered lexicographically.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexInfo {
    positions: Vec<Pos>,
}

impl VertexInfo {
    pub fn new() -> Self {
        VertexInfo::default()
    }

    /// Append a position.
    pub fn push(&mut self, position: Pos) {
        self.positions.push(position);
    }

    pub fn positions(&self) -> &[Pos] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Concatenation of `self`'s and `other`'s positions, in that order.
    pub fn concat(&self, other: &VertexInfo) -> VertexInfo {
        let mut positions = self.positions.clone();
        positions.extend_from_slice(&other.positions);
        VertexInfo { positions }
    }
}

impl From<Vec<Pos>> for VertexInfo {
    fn from(positions: Vec<Pos>) -> Self {
        VertexInfo { positions }
    }
}

impl fmt::Display for VertexInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (j, p) in self.positions.iter().enumerate() {
            if j > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, "]")
    }
}

/// Edge label: a sorted, duplicate-free list of symbols. The sort order is
/// required for label intersection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeInfo {
    syms: Vec<Sym>,
}

impl EdgeInfo {
    pub fn new() -> Self {
        EdgeInfo::default()
    }

    /// Insert `sym`, keeping the list sorted; duplicates are dropped.
    pub fn push(&mut self, sym: Sym) {
        if let Err(at) = self.syms.binary_search(&sym) {
            self.syms.insert(at, sym);
        }
    }

    pub fn syms(&self) -> &[Sym] {
        &self.syms
    }

    pub fn len(&self) -> usize {
        self.syms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syms.is_empty()
    }

    /// Sorted-set intersection with `other` (two-pointer merge).
    pub fn intersection(&self, other: &EdgeInfo) -> EdgeInfo {
        let mut syms = Vec::new();
        let (mut a, mut b) = (0, 0);
        while a < self.syms.len() && b < other.syms.len() {
            match self.syms[a].cmp(&other.syms[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    syms.push(self.syms[a]);
                    a += 1;
                    b += 1;
                }
            }
        }
        EdgeInfo { syms }
    }
}

impl fmt::Display for EdgeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{{")?;
        for (j, s) in self.syms.iter().enumerate() {
            if j > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", s)?;
        }
        write!(f, "}}")
    }
}

/// One derivation a constraint state was built from: non-terminal `nt`
/// spans the `l` tokens at `i` of example `sample_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProvenanceElement {
    pub sample_id: u32,
    pub nt: Sym,
    pub i: Pos,
    pub l: Pos,
}

impl fmt::Display for ProvenanceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} [{} {} {}]]", self.sample_id, self.nt, self.i, self.l)
    }
}

/// Ordered sequence of [`ProvenanceElement`]s; intersection concatenates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Provenance {
    elems: Vec<ProvenanceElement>,
}

impl Provenance {
    pub fn new() -> Self {
        Provenance::default()
    }

    pub fn push(&mut self, sample_id: u32, nt: Sym, i: Pos, l: Pos) {
        self.elems.push(ProvenanceElement { sample_id, nt, i, l });
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn get(&self, n: usize) -> Option<&ProvenanceElement> {
        self.elems.get(n)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProvenanceElement> {
        self.elems.iter()
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for e in &self.elems {
            write!(f, " {}", e)?;
        }
        write!(f, " ]")
    }
}

/// The graph-and-provenance bundle representing all derivations of a single
/// example or of a joint constraint.
#[derive(Clone, Debug, Default)]
pub struct ConstraintState {
    provenance: Provenance,
    graph: DiGraph<VertexInfo, EdgeInfo>,
    /// Identical position tuples collapse to one vertex through this map.
    /// Pruning removes a vertex here while its arena slot stays reserved.
    vertex_map: FxHashMap<VertexInfo, VertexId>,
    terminals: FxHashSet<Sym>,
}

impl ConstraintState {
    pub fn new() -> Self {
        ConstraintState::default()
    }

    /// Record that this state derives from non-terminal `nt` spanning the
    /// `l` tokens at `i` of example `sample_id`.
    pub fn add_provenance(&mut self, sample_id: u32, nt: Sym, i: Pos, l: Pos) {
        self.provenance.push(sample_id, nt, i, l);
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Designate `sym` a terminal for the unit-edge pass.
    pub fn mark_as_terminal(&mut self, sym: Sym) {
        self.terminals.insert(sym);
    }

    pub fn is_terminal(&self, sym: Sym) -> bool {
        self.terminals.contains(&sym)
    }

    pub fn has_vertex(&self, info: &VertexInfo) -> bool {
        self.vertex_map.contains_key(info)
    }

    /// Look up or create the vertex for `info`.
    pub(crate) fn ensure_vertex(&mut self, info: &VertexInfo) -> VertexId {
        if let Some(&v) = self.vertex_map.get(info) {
            return v;
        }
        let v = self.graph.add_vertex(info.clone());
        self.vertex_map.insert(info.clone(), v);
        v
    }

    /// The unique edge `u -> v`, created unlabelled if absent.
    fn ensure_edge(&mut self, u: VertexId, v: VertexId) -> EdgeId {
        match self.graph.find_edge(u, v) {
            Some(e) => e,
            None => self.graph.add_edge(u, v, EdgeInfo::new()),
        }
    }

    /// Ensure the edge `from -> to` exists, creating either vertex if
    /// absent. Does not attach symbols.
    pub fn add_edge(&mut self, from: &VertexInfo, to: &VertexInfo) {
        let u = self.ensure_vertex(from);
        let v = self.ensure_vertex(to);
        self.ensure_edge(u, v);
    }

    /// Merge `sym` into the label set of the edge between two *existing*
    /// vertices, creating the edge if needed; the set stays sorted.
    ///
    /// Silently does nothing when either endpoint is absent from the vertex
    /// map. This is a documented precondition, not an error: pruning relies
    /// on cleared vertices staying unaddressable, so a late `add_edge_sym`
    /// cannot resurrect them.
    pub fn add_edge_sym(&mut self, from: &VertexInfo, to: &VertexInfo, sym: Sym) {
        let (Some(&u), Some(&v)) = (self.vertex_map.get(from), self.vertex_map.get(to)) else {
            return;
        };
        let e = self.ensure_edge(u, v);
        self.graph.edge_mut(e).push(sym);
    }

    /// Merge `syms` into the edge `from -> to`, creating vertices and edge
    /// as needed. Used by intersection, where `syms` is already sorted.
    pub(crate) fn add_labelled_edge(&mut self, from: &VertexInfo, to: &VertexInfo, syms: &[Sym]) {
        let u = self.ensure_vertex(from);
        let v = self.ensure_vertex(to);
        let e = self.ensure_edge(u, v);
        for &s in syms {
            self.graph.edge_mut(e).push(s);
        }
    }

    pub(crate) fn graph(&self) -> &DiGraph<VertexInfo, EdgeInfo> {
        &self.graph
    }

    pub(crate) fn merge_provenance_from(&mut self, other: &ConstraintState) {
        self.provenance.elems.extend_from_slice(&other.provenance.elems);
    }

    pub(crate) fn merge_terminals_from(&mut self, other: &ConstraintState) {
        self.terminals.extend(other.terminals.iter().copied());
    }

    /// Vertices with no incoming edges (cleared slots included: they have
    /// no edges at all and contribute nothing downstream).
    pub(crate) fn root_vertices(&self) -> Vec<VertexId> {
        self.graph
            .vertex_ids()
            .filter(|&v| self.graph.in_edges(v).next().is_none())
            .collect()
    }

    /// The start node: each provenance element's `i`, in order.
    pub fn start_node(&self) -> VertexInfo {
        let mut vi = VertexInfo::new();
        for e in self.provenance.iter() {
            vi.push(e.i);
        }
        vi
    }

    /// The end node: each provenance element's `i + l`, in order.
    pub fn end_node(&self) -> VertexInfo {
        let mut vi = VertexInfo::new();
        for e in self.provenance.iter() {
            vi.push(e.i + e.l);
        }
        vi
    }

    /// True when the graph has no live edges. After intersection this is
    /// how a jointly-unsatisfiable constraint reports itself.
    pub fn is_empty(&self) -> bool {
        self.graph.num_edges() == 0
    }

    /// Export every live edge as parallel (source positions, target
    /// positions, symbols) rows, in edge insertion order.
    pub fn edges(&self) -> (Vec<Vec<Pos>>, Vec<Vec<Pos>>, Vec<Vec<Sym>>) {
        let mut sources = Vec::new();
        let mut targets = Vec::new();
        let mut syms = Vec::new();
        for e in self.graph.edge_ids() {
            sources.push(self.graph.vertex(self.graph.source(e)).positions().to_vec());
            targets.push(self.graph.vertex(self.graph.target(e)).positions().to_vec());
            syms.push(self.graph.edge(e).syms().to_vec());
        }
        (sources, targets, syms)
    }

    /// Start vertex, end vertex, and the set of vertices lying on at least
    /// one start-to-end walk. `None` when either node is missing or the end
    /// is not reachable from the start.
    ///
    /// Forward pass: `F` = vertices reachable from the start. Backward
    /// pass: walk in-edges from the end, restricted to sources in `F`. The
    /// result is `F ∩ B`.
    pub(crate) fn solution_span(&self) -> Option<(VertexId, VertexId, FxHashSet<VertexId>)> {
        let &src = self.vertex_map.get(&self.start_node())?;
        let &snk = self.vertex_map.get(&self.end_node())?;

        let mut forward = FxHashSet::default();
        let mut queue = VecDeque::new();
        forward.insert(src);
        queue.push_back(src);
        while let Some(u) = queue.pop_front() {
            for e in self.graph.out_edges(u) {
                let t = self.graph.target(e);
                if forward.insert(t) {
                    queue.push_back(t);
                }
            }
        }
        if !forward.contains(&snk) {
            trace!("end node unreachable from start node");
            return None;
        }

        let mut kept = FxHashSet::default();
        kept.insert(snk);
        queue.push_back(snk);
        while let Some(v) = queue.pop_front() {
            for e in self.graph.in_edges(v) {
                let s = self.graph.source(e);
                if forward.contains(&s) && kept.insert(s) {
                    queue.push_back(s);
                }
            }
        }
        Some((src, snk, kept))
    }

    /// Disconnect every vertex that lies on no start-to-end walk and drop
    /// it from the vertex map (its arena slot stays reserved). When the
    /// start or end node is missing or unreachable, nothing is on a walk
    /// and the whole graph is cleared, leaving the state `is_empty()`.
    pub fn remove_non_solution_nodes(&mut self) {
        let kept = match self.solution_span() {
            Some((_, _, kept)) => kept,
            None => FxHashSet::default(),
        };
        debug!(kept = kept.len(), total = self.graph.num_vertices(), "prune");
        for v in 0..self.graph.num_vertices() {
            if !kept.contains(&v) {
                self.vertex_map.remove(self.graph.vertex(v));
                self.graph.clear_vertex(v);
            }
        }
    }

    /// Remove the direct start-to-end edge if its labels are all terminals
    /// (a "unit path" that explains the examples without any non-terminal
    /// structure). An endpoint whose degree drops to zero is dropped from
    /// the vertex map.
    pub fn remove_unit_paths(&mut self) {
        let (from, to) = (self.start_node(), self.end_node());
        let (Some(&u), Some(&v)) = (self.vertex_map.get(&from), self.vertex_map.get(&to)) else {
            return;
        };
        let Some(e) = self.graph.find_edge(u, v) else {
            return;
        };

        if !self.graph.edge(e).syms().iter().all(|&s| self.is_terminal(s)) {
            return;
        }

        debug!("remove unit edge");
        self.graph.remove_edge(e);
        for (w, info) in [(u, from), (v, to)] {
            if self.graph.degree(w) == 0 {
                self.vertex_map.remove(&info);
            }
        }
    }
}

impl fmt::Display for ConstraintState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "constraint state ({} vertices, {} edges, provenance = {}) :",
            self.graph.num_vertices(),
            self.graph.num_edges(),
            self.provenance
        )?;
        for e in self.graph.edge_ids() {
            writeln!(
                f,
                "    | {} -> {} : {}",
                self.graph.vertex(self.graph.source(e)),
                self.graph.vertex(self.graph.target(e)),
                self.graph.edge(e)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vi(positions: &[Pos]) -> VertexInfo {
        VertexInfo::from(positions.to_vec())
    }

    /// start -> mid -> end over one example spanning (0, 2).
    fn chain(label1: Sym, label2: Sym) -> ConstraintState {
        let mut c = ConstraintState::new();
        c.add_provenance(0, 1, 0, 2);
        c.add_edge(&vi(&[0]), &vi(&[1]));
        c.add_edge(&vi(&[1]), &vi(&[2]));
        c.add_edge_sym(&vi(&[0]), &vi(&[1]), label1);
        c.add_edge_sym(&vi(&[1]), &vi(&[2]), label2);
        c
    }

    #[test]
    fn test_edge_info_sorted_dedup() {
        let mut ei = EdgeInfo::new();
        ei.push(3);
        ei.push(1);
        ei.push(3);
        ei.push(2);
        assert_eq!(ei.syms(), &[1, 2, 3]);
    }

    #[test]
    fn test_edge_info_intersection() {
        let mut a = EdgeInfo::new();
        let mut b = EdgeInfo::new();
        for s in [1, 3, 5, 7] {
            a.push(s);
        }
        for s in [2, 3, 7, 8] {
            b.push(s);
        }
        assert_eq!(a.intersection(&b).syms(), &[3, 7]);
        assert!(a.intersection(&EdgeInfo::new()).is_empty());
    }

    #[test]
    fn test_vertex_info_order() {
        assert!(vi(&[0, 1]) < vi(&[0, 2]));
        assert!(vi(&[1, 0]) > vi(&[0, 9]));
        assert_eq!(vi(&[2, 2]), vi(&[2, 2]));
    }

    #[test]
    fn test_identical_tuples_collapse() {
        let mut c = ConstraintState::new();
        c.add_edge(&vi(&[0]), &vi(&[1]));
        c.add_edge(&vi(&[1]), &vi(&[2]));
        c.add_edge(&vi(&[0]), &vi(&[1]));
        assert_eq!(c.graph().num_vertices(), 3);
        assert_eq!(c.graph().num_edges(), 2);
    }

    #[test]
    fn test_labels_accumulate_on_one_edge() {
        let mut c = ConstraintState::new();
        c.add_edge(&vi(&[0]), &vi(&[1]));
        c.add_edge_sym(&vi(&[0]), &vi(&[1]), 9);
        c.add_edge_sym(&vi(&[0]), &vi(&[1]), 4);
        c.add_edge_sym(&vi(&[0]), &vi(&[1]), 9);

        let (_, _, syms) = c.edges();
        assert_eq!(c.graph().num_edges(), 1);
        assert_eq!(syms, vec![vec![4, 9]]);
    }

    #[test]
    fn test_add_edge_sym_requires_vertices() {
        let mut c = ConstraintState::new();
        c.add_edge_sym(&vi(&[0]), &vi(&[1]), 5);
        assert!(c.is_empty());
        assert!(!c.has_vertex(&vi(&[0])));

        // One existing endpoint is not enough.
        c.add_edge(&vi(&[0]), &vi(&[1]));
        c.add_edge_sym(&vi(&[1]), &vi(&[2]), 5);
        assert_eq!(c.graph().num_edges(), 1);
    }

    #[test]
    fn test_start_end_nodes() {
        let mut c = ConstraintState::new();
        c.add_provenance(0, 1, 0, 2);
        c.add_provenance(1, 1, 3, 4);
        assert_eq!(c.start_node(), vi(&[0, 3]));
        assert_eq!(c.end_node(), vi(&[2, 7]));
    }

    #[test]
    fn test_edges_export() {
        let c = chain(4, 9);
        let (sources, targets, syms) = c.edges();
        assert_eq!(sources, vec![vec![0], vec![1]]);
        assert_eq!(targets, vec![vec![1], vec![2]]);
        assert_eq!(syms, vec![vec![4], vec![9]]);
    }

    #[test]
    fn test_prune_keeps_on_path_vertices() {
        let mut c = chain(4, 9);
        // A dead-end branch off the chain.
        c.add_edge(&vi(&[0]), &vi(&[7]));
        assert_eq!(c.graph().num_edges(), 3);

        c.remove_non_solution_nodes();

        assert!(!c.has_vertex(&vi(&[7])));
        assert!(c.has_vertex(&vi(&[0])));
        assert!(c.has_vertex(&vi(&[1])));
        assert!(c.has_vertex(&vi(&[2])));
        assert_eq!(c.graph().num_edges(), 2);
    }

    #[test]
    fn test_prune_clears_all_when_end_missing() {
        let mut c = ConstraintState::new();
        c.add_provenance(0, 1, 0, 2);
        // Only half the chain: the end node [2] never becomes a vertex.
        c.add_edge(&vi(&[0]), &vi(&[1]));
        c.add_edge_sym(&vi(&[0]), &vi(&[1]), 4);

        c.remove_non_solution_nodes();

        assert!(c.is_empty());
        assert!(!c.has_vertex(&vi(&[0])));
        assert!(!c.has_vertex(&vi(&[1])));
    }

    #[test]
    fn test_prune_idempotent() {
        let mut c = chain(4, 9);
        c.add_edge(&vi(&[0]), &vi(&[7]));
        c.remove_non_solution_nodes();
        let first = c.edges();
        c.remove_non_solution_nodes();
        assert_eq!(c.edges(), first);
    }

    #[test]
    fn test_remove_unit_paths() {
        let mut c = ConstraintState::new();
        c.add_provenance(0, 1, 0, 2);
        c.add_edge(&vi(&[0]), &vi(&[2]));
        c.add_edge_sym(&vi(&[0]), &vi(&[2]), 5);
        c.mark_as_terminal(5);

        c.remove_unit_paths();

        assert!(c.is_empty());
        assert!(!c.has_vertex(&vi(&[0])));
        assert!(!c.has_vertex(&vi(&[2])));
    }

    #[test]
    fn test_remove_unit_paths_keeps_mixed_edge() {
        let mut c = ConstraintState::new();
        c.add_provenance(0, 1, 0, 2);
        c.add_edge(&vi(&[0]), &vi(&[2]));
        c.add_edge_sym(&vi(&[0]), &vi(&[2]), 5);
        c.add_edge_sym(&vi(&[0]), &vi(&[2]), 6);
        c.mark_as_terminal(5);

        c.remove_unit_paths();

        // The non-terminal 6 keeps the edge alive.
        assert_eq!(c.graph().num_edges(), 1);
        assert!(c.has_vertex(&vi(&[0])));
        assert!(c.has_vertex(&vi(&[2])));
    }

    #[test]
    fn test_remove_unit_paths_spares_other_edges() {
        // The unit edge goes, the rest of the graph stays.
        let mut c = chain(4, 9);
        c.add_edge(&vi(&[0]), &vi(&[2]));
        c.add_edge_sym(&vi(&[0]), &vi(&[2]), 5);
        c.mark_as_terminal(5);

        c.remove_unit_paths();

        assert_eq!(c.graph().num_edges(), 2);
        // The endpoints still anchor the chain, so they survive.
        assert!(c.has_vertex(&vi(&[0])));
        assert!(c.has_vertex(&vi(&[2])));
    }

    #[test]
    fn test_remove_unit_paths_idempotent() {
        let mut c = ConstraintState::new();
        c.add_provenance(0, 1, 0, 2);
        c.add_edge(&vi(&[0]), &vi(&[2]));
        c.add_edge_sym(&vi(&[0]), &vi(&[2]), 5);
        c.mark_as_terminal(5);

        c.remove_unit_paths();
        assert!(c.is_empty());
        let snapshot = c.edges();
        c.remove_unit_paths();
        assert_eq!(c.edges(), snapshot);
    }

    #[test]
    fn test_display() {
        let c = chain(4, 9);
        let s = format!("{}", c);
        assert!(s.contains("[0] -> [1]"));
        assert!(s.contains("#{4}"));
    }
}
