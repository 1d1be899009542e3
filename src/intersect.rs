//! Pairwise intersection of constraint states.
//!
//! The intersection of two constraint graphs walks the pair product of
//! their vertices from the root pairs, keeping an edge pair only when its
//! labels share at least one symbol. Chained pairwise, this gives the n-ary
//! intersection across any number of examples.

use crate::constraint::ConstraintState;
use crate::diag::{debug, trace};
use crate::graph::VertexId;
use std::collections::BTreeSet;

/// Intersect `c1` and `c2` into the freshly-created `dest`.
///
/// Vertices of `dest` are concatenations of a `c1` vertex and a `c2`
/// vertex (`c1` first); an edge pair survives with the sorted-set
/// intersection of its labels. Provenances concatenate (`c1` first),
/// terminal sets union, and `dest` is pruned to the vertices lying on a
/// start-to-end walk. A jointly-unsatisfiable pair leaves `dest` with
/// `is_empty() == true`.
pub fn intersect(c1: &ConstraintState, c2: &ConstraintState, dest: &mut ConstraintState) {
    // Seed with the cross-product of root vertices. The ordered set makes
    // the walk, and so dest's vertex numbering, deterministic.
    let mut pairs: BTreeSet<(VertexId, VertexId)> = BTreeSet::new();
    for &u in &c1.root_vertices() {
        for &v in &c2.root_vertices() {
            pairs.insert((u, v));
        }
    }
    debug!(roots = pairs.len(), "intersect");

    while let Some((u, v)) = pairs.pop_first() {
        for e1 in c1.graph().out_edges(u) {
            let usucc = c1.graph().target(e1);
            for e2 in c2.graph().out_edges(v) {
                let vsucc = c2.graph().target(e2);

                let shared = c1.graph().edge(e1).intersection(c2.graph().edge(e2));
                if shared.is_empty() {
                    trace!("label mismatch, edge pair dropped");
                    continue;
                }

                let from = c1.graph().vertex(u).concat(c2.graph().vertex(v));
                let to = c1.graph().vertex(usucc).concat(c2.graph().vertex(vsucc));
                dest.add_labelled_edge(&from, &to, shared.syms());
                pairs.insert((usucc, vsucc));
            }
        }
    }

    dest.merge_provenance_from(c1);
    dest.merge_provenance_from(c2);
    dest.merge_terminals_from(c1);
    dest.merge_terminals_from(c2);

    dest.remove_non_solution_nodes();
}
