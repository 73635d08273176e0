//! Build triangle-to-triangle adjacency graphs from shared vertices.
//!
//! Two triangles of the same level are
//! - *point adjacent* when they share at least one vertex, and
//! - *edge adjacent* when they share at least two vertices (a whole edge).
//!
//! Determinism:
//! - Vertex indices are the caller's; graph vertices follow the input order
//!   of the triangle list, and neighbor lists are always sorted by that order
//!   and deduplicated.

use hashbrown::HashMap;

use crate::topology::mesh::Adjacency;
use crate::topology::point::TriLabel;

/// CSR-style adjacency graph for a chosen triangle ordering.
#[derive(Debug, Clone)]
pub struct AdjacencyGraph {
    /// CSR offsets into `adjncy` for each triangle.
    pub xadj: Vec<usize>,
    /// CSR adjacency list (indices into `order`).
    pub adjncy: Vec<usize>,
    /// Triangle ordering that defines graph vertex indices.
    pub order: Vec<TriLabel>,
}

impl AdjacencyGraph {
    /// Return the neighbor index slice for graph vertex `i`.
    #[inline]
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.adjncy[self.xadj[i]..self.xadj[i + 1]]
    }

    /// Neighbor labels of graph vertex `i`, in graph order.
    pub fn neighbor_labels(&self, i: usize) -> Vec<TriLabel> {
        self.neighbors(i).iter().map(|&j| self.order[j]).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Build point- and edge-adjacency graphs for one level of triangles.
///
/// Returns `(point_graph, edge_graph)`; both share the same `order`.
pub fn build_triangle_adjacency(
    triangles: &[(TriLabel, [usize; 3])],
) -> (AdjacencyGraph, AdjacencyGraph) {
    let n = triangles.len();
    let order: Vec<TriLabel> = triangles.iter().map(|(l, _)| *l).collect();
    if n == 0 {
        let empty = AdjacencyGraph {
            xadj: vec![0],
            adjncy: Vec::new(),
            order,
        };
        return (empty.clone(), empty);
    }

    let mut incident: HashMap<usize, Vec<usize>> = HashMap::with_capacity(n * 3);
    for (i, (_, verts)) in triangles.iter().enumerate() {
        let mut verts = *verts;
        verts.sort_unstable();
        for (k, &v) in verts.iter().enumerate() {
            // a triangle listing the same vertex twice still counts once
            if k > 0 && verts[k - 1] == v {
                continue;
            }
            incident.entry(v).or_default().push(i);
        }
    }

    // number of shared vertices per unordered triangle pair
    let mut shared: HashMap<(usize, usize), u8> = HashMap::new();
    for tris_on_v in incident.values() {
        if tris_on_v.len() < 2 {
            continue;
        }
        for a in 0..tris_on_v.len() {
            for &b in &tris_on_v[(a + 1)..] {
                let ta = tris_on_v[a];
                let key = if ta < b { (ta, b) } else { (b, ta) };
                *shared.entry(key).or_insert(0) += 1;
            }
        }
    }

    let mut point_neigh: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut edge_neigh: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (&(a, b), &count) in &shared {
        if a == b {
            continue;
        }
        point_neigh[a].push(b);
        point_neigh[b].push(a);
        if count >= 2 {
            edge_neigh[a].push(b);
            edge_neigh[b].push(a);
        }
    }

    (to_csr(point_neigh, order.clone()), to_csr(edge_neigh, order))
}

fn to_csr(mut neigh: Vec<Vec<usize>>, order: Vec<TriLabel>) -> AdjacencyGraph {
    let mut total_edges = 0usize;
    for list in neigh.iter_mut() {
        list.sort_unstable();
        list.dedup();
        total_edges += list.len();
    }
    let mut xadj = Vec::with_capacity(neigh.len() + 1);
    let mut adjncy = Vec::with_capacity(total_edges);
    xadj.push(0);
    for list in &neigh {
        adjncy.extend(list.iter().copied());
        xadj.push(adjncy.len());
    }
    AdjacencyGraph {
        xadj,
        adjncy,
        order,
    }
}

/// Select the graph matching `adjacency` from a `(point, edge)` pair.
pub fn select(graphs: &(AdjacencyGraph, AdjacencyGraph), adjacency: Adjacency) -> &AdjacencyGraph {
    match adjacency {
        Adjacency::Point => &graphs.0,
        Adjacency::Edge => &graphs.1,
    }
}
