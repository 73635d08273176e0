//! BFS traversal helpers over same-level triangle adjacency.
//!
//! Everything here walks neighbor lists in the order the mesh reports them
//! and visits seeds in the order given, so results are deterministic for a
//! fixed mesh.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use crate::extrema_error::ExtremaError;
use crate::topology::labels::LabelSet;
use crate::topology::mesh::{Adjacency, MeshAccessor};
use crate::topology::point::TriLabel;

/// Breadth-first walk from a set of seed triangles.
pub struct TraversalBuilder<'a, M: MeshAccessor + ?Sized> {
    mesh: &'a M,
    seeds: Vec<TriLabel>,
    adjacency: Adjacency,
    max_depth: Option<u32>,
    /// If set, the walk never leaves this set.
    within: Option<&'a LabelSet>,
}

impl<'a, M: MeshAccessor + ?Sized> TraversalBuilder<'a, M> {
    pub fn new(mesh: &'a M) -> Self {
        Self {
            mesh,
            seeds: Vec::new(),
            adjacency: Adjacency::Point,
            max_depth: None,
            within: None,
        }
    }
    pub fn seeds<I: IntoIterator<Item = TriLabel>>(mut self, it: I) -> Self {
        self.seeds = it.into_iter().collect();
        self
    }
    pub fn adjacency(mut self, adjacency: Adjacency) -> Self {
        self.adjacency = adjacency;
        self
    }
    pub fn max_depth(mut self, d: Option<u32>) -> Self {
        self.max_depth = d;
        self
    }
    pub fn within(mut self, set: &'a LabelSet) -> Self {
        self.within = Some(set);
        self
    }

    /// Runs the walk and returns visited triangles in discovery order.
    pub fn run(self) -> Result<Vec<TriLabel>, ExtremaError> {
        let TraversalBuilder {
            mesh,
            seeds,
            adjacency,
            max_depth,
            within,
        } = self;
        let allowed = |l: TriLabel| within.is_none_or(|w| w.contains(l));
        let mut seen: HashSet<TriLabel> = HashSet::new();
        let mut out = Vec::new();
        let mut q: VecDeque<(TriLabel, u32)> = VecDeque::new();
        for s in seeds {
            if allowed(s) && seen.insert(s) {
                out.push(s);
                q.push_back((s, 0));
            }
        }
        while let Some((p, d)) = q.pop_front() {
            if max_depth.is_some_and(|md| d >= md) {
                continue;
            }
            for &n in mesh.neighbors(p, adjacency)? {
                if allowed(n) && seen.insert(n) {
                    out.push(n);
                    q.push_back((n, d + 1));
                }
            }
        }
        Ok(out)
    }
}

/// Triangles within `hops` adjacency steps of `center`, `center` included.
pub fn ring<M: MeshAccessor + ?Sized>(
    mesh: &M,
    center: TriLabel,
    hops: u32,
    adjacency: Adjacency,
) -> Result<Vec<TriLabel>, ExtremaError> {
    TraversalBuilder::new(mesh)
        .seeds([center])
        .adjacency(adjacency)
        .max_depth(Some(hops))
        .run()
}

/// Region growing from `seed`.
///
/// Each distinct neighbor reached from the region is offered once to
/// `accept`; accepted triangles join the region and are expanded in turn.
/// The seed itself is always part of the result, which lists triangles in
/// the order they joined.
pub fn grow_region<M, F>(
    mesh: &M,
    seed: TriLabel,
    adjacency: Adjacency,
    mut accept: F,
) -> Result<Vec<TriLabel>, ExtremaError>
where
    M: MeshAccessor + ?Sized,
    F: FnMut(TriLabel) -> Result<bool, ExtremaError>,
{
    let mut offered: HashSet<TriLabel> = HashSet::new();
    offered.insert(seed);
    let mut region = vec![seed];
    let mut q: VecDeque<TriLabel> = VecDeque::from([seed]);
    while let Some(p) = q.pop_front() {
        for &n in mesh.neighbors(p, adjacency)? {
            if offered.insert(n) && accept(n)? {
                region.push(n);
                q.push_back(n);
            }
        }
    }
    Ok(region)
}

/// Partition `region` between `seeds` by simultaneous growth.
///
/// Growth is level-synchronous: at every hop, each unowned triangle adjacent
/// to the current frontier goes to the offering seed with the smallest
/// `distance(triangle, seed_index)`, ties going to the earlier seed. Each
/// part is therefore connected. Seeds outside `region`, or already owned by
/// an earlier seed, get an empty part; triangles no seed can reach are left
/// out.
pub fn partition_from_seeds<M, F>(
    mesh: &M,
    region: &LabelSet,
    seeds: &[TriLabel],
    adjacency: Adjacency,
    mut distance: F,
) -> Result<Vec<LabelSet>, ExtremaError>
where
    M: MeshAccessor + ?Sized,
    F: FnMut(TriLabel, usize) -> Result<f64, ExtremaError>,
{
    let mut parts = vec![LabelSet::new(); seeds.len()];
    let mut owner: HashMap<TriLabel, usize> = HashMap::new();
    let mut frontier: Vec<(TriLabel, usize)> = Vec::new();
    for (i, &s) in seeds.iter().enumerate() {
        if region.contains(s) && !owner.contains_key(&s) {
            owner.insert(s, i);
            parts[i].insert(s);
            frontier.push((s, i));
        }
    }

    while !frontier.is_empty() {
        let mut order: Vec<TriLabel> = Vec::new();
        let mut offers: HashMap<TriLabel, Vec<usize>> = HashMap::new();
        for &(t, i) in &frontier {
            for &n in mesh.neighbors(t, adjacency)? {
                if !region.contains(n) || owner.contains_key(&n) {
                    continue;
                }
                let seeds_for_n = offers.entry(n).or_insert_with(|| {
                    order.push(n);
                    Vec::new()
                });
                if !seeds_for_n.contains(&i) {
                    seeds_for_n.push(i);
                }
            }
        }

        let mut next = Vec::with_capacity(order.len());
        for n in order {
            let mut best: Option<(f64, usize)> = None;
            for &i in &offers[&n] {
                let d = distance(n, i)?;
                let better = match best {
                    None => true,
                    Some((bd, bi)) => d < bd || (d == bd && i < bi),
                };
                if better {
                    best = Some((d, i));
                }
            }
            if let Some((_, i)) = best {
                owner.insert(n, i);
                parts[i].insert(n);
                next.push((n, i));
            }
        }
        frontier = next;
    }

    if owner.len() < region.len() {
        log::debug!(
            "partition left {} of {} triangles unreached",
            region.len() - owner.len(),
            region.len()
        );
    }
    Ok(parts)
}

/// True when every label in `set` can reach every other through labels of
/// `set`. The empty set counts as connected.
pub fn is_connected<M: MeshAccessor + ?Sized>(
    mesh: &M,
    set: &LabelSet,
    adjacency: Adjacency,
) -> Result<bool, ExtremaError> {
    let Some(first) = set.first() else {
        return Ok(true);
    };
    let reached = TraversalBuilder::new(mesh)
        .seeds([first])
        .adjacency(adjacency)
        .within(set)
        .run()?;
    Ok(reached.len() == set.len())
}

/// Shortest chain of triangles joining `from` to `to`.
///
/// Returns the intermediate triangles only (neither endpoint set is
/// included): `Some(vec![])` when the sets already touch or overlap, `None`
/// when every path would have to cross a triangle for which `passable`
/// returns false.
pub fn shortest_bridge<M, F>(
    mesh: &M,
    from: &LabelSet,
    to: &LabelSet,
    adjacency: Adjacency,
    passable: F,
) -> Result<Option<Vec<TriLabel>>, ExtremaError>
where
    M: MeshAccessor + ?Sized,
    F: Fn(TriLabel) -> bool,
{
    if from.intersects(to) {
        return Ok(Some(Vec::new()));
    }
    // parent pointers; `None` marks a member of `from`
    let mut came_from: HashMap<TriLabel, Option<TriLabel>> = HashMap::new();
    let mut q: VecDeque<TriLabel> = VecDeque::new();
    for l in from.iter() {
        came_from.insert(l, None);
        q.push_back(l);
    }
    while let Some(p) = q.pop_front() {
        for &n in mesh.neighbors(p, adjacency)? {
            if to.contains(n) {
                let mut path = Vec::new();
                let mut cur = p;
                while let Some(Some(prev)) = came_from.get(&cur).copied() {
                    path.push(cur);
                    cur = prev;
                }
                path.reverse();
                return Ok(Some(path));
            }
            if !came_from.contains_key(&n) && passable(n) {
                came_from.insert(n, Some(p));
                q.push_back(n);
            }
        }
    }
    Ok(None)
}
