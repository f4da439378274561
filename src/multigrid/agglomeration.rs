//! Greedy agglomeration of one level into the next.
//!
//! Passes, in order:
//! 1. boundary seeds: points on at most one physical marker and at most one
//!    send/receive marker absorb neighbours with the same marker signature;
//! 2. every boundary point still free, partition interfaces included,
//!    becomes a singleton;
//! 3. interior seeds, taken from a queue that always yields the free point
//!    with the fewest free neighbours, absorb free neighbours;
//! 4. every owned point still free becomes a singleton.
//!
//! Seeds flagged for indirect agglomeration also absorb their suitable
//! 2-hop (and in 3-D 3-hop) neighbours. Ghost points are left to the halo
//! reconciliation.

use crate::config::MultigridConfig;
use crate::geometry::distance;
use crate::mesh::Mesh;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

/// Physical marker and send/receive marker of a boundary point.
type Signature = (Option<usize>, Option<usize>);

/// Coarse parent of every fine point and fine children of every coarse
/// point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Agglomeration {
    pub parent: Vec<Option<usize>>,
    pub children: Vec<Vec<usize>>,
    /// Indirect-agglomeration flag of each coarse point, taken from its seed.
    pub indirect: Vec<bool>,
    /// Owning domain of each coarse point.
    pub color: Vec<usize>,
    /// Coarse points `0..n_domain` are owned.
    pub n_domain: usize,
}

impl Agglomeration {
    pub fn n_coarse(&self) -> usize {
        self.children.len()
    }

    #[inline]
    fn is_free(&self, p: usize) -> bool {
        self.parent[p].is_none()
    }

    pub(crate) fn create(&mut self, seed: usize, indirect: bool, color: usize) -> usize {
        let c = self.children.len();
        self.children.push(vec![seed]);
        self.indirect.push(indirect);
        self.color.push(color);
        self.parent[seed] = Some(c);
        c
    }

    pub(crate) fn absorb(&mut self, c: usize, p: usize) {
        self.parent[p] = Some(c);
        self.children[c].push(p);
    }

    /// Drop coarse points left without children and renumber the rest,
    /// keeping their order.
    pub(crate) fn compact(&mut self) {
        if self.children.iter().all(|k| !k.is_empty()) {
            return;
        }
        let mut remap = vec![None; self.children.len()];
        let mut next = 0;
        let mut n_domain = 0;
        for (c, kids) in self.children.iter().enumerate() {
            if !kids.is_empty() {
                remap[c] = Some(next);
                next += 1;
                if c < self.n_domain {
                    n_domain += 1;
                }
            }
        }
        fn kept<T>(v: Vec<T>, remap: &[Option<usize>]) -> Vec<T> {
            v.into_iter()
                .zip(remap)
                .filter_map(|(x, r)| r.map(|_| x))
                .collect()
        }
        self.indirect = kept(std::mem::take(&mut self.indirect), &remap);
        self.color = kept(std::mem::take(&mut self.color), &remap);
        self.children.retain(|k| !k.is_empty());
        for p in self.parent.iter_mut() {
            *p = p.and_then(|c| remap[c]);
        }
        self.n_domain = n_domain;
    }
}

pub(crate) struct Agglomerator<'a> {
    fine: &'a Mesh,
    config: &'a MultigridConfig,
    /// Largest admissible `volume^(1/d)`.
    size_limit: f64,
    agg: Agglomeration,
}

impl<'a> Agglomerator<'a> {
    pub(crate) fn new(fine: &'a Mesh, config: &'a MultigridConfig, domain_volume: f64) -> Self {
        let d = fine.dim as f64;
        Self {
            fine,
            config,
            size_limit: config.max_dimension * domain_volume.powf(1.0 / d),
            agg: Agglomeration {
                parent: vec![None; fine.n_point()],
                ..Default::default()
            },
        }
    }

    pub(crate) fn run(mut self) -> Agglomeration {
        self.boundary_seeds();
        let after_seeds = self.agg.n_coarse();
        self.boundary_leftovers();
        let after_leftovers = self.agg.n_coarse();
        self.interior_seeds();
        self.singletons();
        self.agg.n_domain = self.agg.n_coarse();
        log::debug!(
            "level {}: {} boundary agglomerates, {} boundary singletons, {} interior",
            self.fine.level,
            after_seeds,
            after_leftovers - after_seeds,
            self.agg.n_coarse() - after_leftovers
        );
        self.agg
    }

    /// Free owned point whose size passes the gate.
    fn candidate(&self, p: usize) -> bool {
        let pt = &self.fine.points[p];
        let size = pt.volume().max(0.0).powf(1.0 / self.fine.dim as f64);
        pt.domain && self.agg.is_free(p) && size <= self.size_limit
    }

    fn stretching_ok(&self, p: usize) -> bool {
        if !self.config.check_stretching {
            return true;
        }
        let x = self.fine.coord(p);
        let (lo, hi) = self.fine.points[p]
            .points
            .iter()
            .map(|&q| distance(x, self.fine.coord(q)))
            .fold((f64::MAX, 0.0f64), |(lo, hi), d| (lo.min(d), hi.max(d)));
        lo > 0.0 && hi / lo <= self.config.max_stretching
    }

    /// Marker signature of a boundary point: its physical marker and its
    /// send/receive marker, each when present. `None` for interior points and
    /// for points on two markers of the same family.
    fn boundary_signature(&self, p: usize) -> Option<Signature> {
        let (halo, physical): (Vec<usize>, Vec<usize>) = self.fine.points[p]
            .markers()
            .partition(|&m| self.fine.markers[m].is_send_receive());
        match (physical.as_slice(), halo.as_slice()) {
            ([], []) => None,
            (&[], &[h]) => Some((None, Some(h))),
            (&[m], &[]) => Some((Some(m), None)),
            (&[m], &[h]) => Some((Some(m), Some(h))),
            _ => None,
        }
    }

    fn full(&self, c: usize) -> bool {
        self.agg.children[c].len() >= self.config.max_children
    }

    /// Absorb the free neighbours of `seed` (and its suitable indirect
    /// neighbours when allowed) into `c`. On the boundary, only points with
    /// the seed's signature qualify.
    fn grow(&mut self, c: usize, seed: usize, signature: Option<Signature>) {
        let fine = self.fine;
        let accepts = |this: &Self, q: usize| {
            this.candidate(q) && signature.is_none_or(|s| this.boundary_signature(q) == Some(s))
        };
        for &q in &fine.points[seed].points {
            if self.full(c) {
                return;
            }
            if accepts(self, q) {
                self.agg.absorb(c, q);
            }
        }
        if self.agg.indirect[c] {
            for q in suitable_neighbors(fine, seed) {
                if self.full(c) {
                    return;
                }
                if accepts(self, q) {
                    self.agg.absorb(c, q);
                }
            }
        }
    }

    fn seed(&mut self, p: usize) -> usize {
        let pt = &self.fine.points[p];
        self.agg.create(p, pt.agglomerate_indirect, pt.color)
    }

    fn boundary_seeds(&mut self) {
        let fine = self.fine;
        for m in &fine.markers {
            for v in &m.vertices {
                let p = v.point;
                if !self.candidate(p) || !self.stretching_ok(p) {
                    continue;
                }
                let Some(sig) = self.boundary_signature(p) else {
                    continue;
                };
                let c = self.seed(p);
                self.grow(c, p, Some(sig));
            }
        }
    }

    fn boundary_leftovers(&mut self) {
        for p in 0..self.fine.n_point() {
            let pt = &self.fine.points[p];
            if pt.domain && pt.boundary && self.agg.is_free(p) {
                self.seed(p);
            }
        }
    }

    fn interior_seeds(&mut self) {
        let fine = self.fine;
        let n = fine.n_point();
        let mut free_nbrs: Vec<usize> = (0..n)
            .map(|p| fine.points[p].points.iter().filter(|&&q| self.agg.is_free(q)).count())
            .collect();
        let mut queue: BTreeSet<(usize, usize)> = (0..n)
            .filter(|&p| self.candidate(p) && self.stretching_ok(p))
            .map(|p| (free_nbrs[p], p))
            .collect();

        while let Some((_, seed)) = queue.pop_first() {
            let c = self.seed(seed);
            self.grow(c, seed, None);
            let taken = self.agg.children[c].clone();
            for f in taken {
                queue.remove(&(free_nbrs[f], f));
                for &r in &fine.points[f].points {
                    let was_queued = queue.remove(&(free_nbrs[r], r));
                    free_nbrs[r] = free_nbrs[r].saturating_sub(1);
                    if was_queued {
                        queue.insert((free_nbrs[r], r));
                    }
                }
            }
        }
    }

    fn singletons(&mut self) {
        for p in 0..self.fine.n_point() {
            if self.fine.points[p].domain && self.agg.is_free(p) {
                self.seed(p);
            }
        }
    }
}

/// Indirect neighbours of `seed` that keep a structured stencil isotropic.
///
/// A 2-hop point qualifies when two of the 1-hop points reaching it are not
/// adjacent to each other (a diagonal of a quad). In 3-D, a 3-hop point
/// qualifies the same way relative to the qualified 2-hop points (a
/// diagonal of a hexahedron).
pub fn suitable_neighbors(mesh: &Mesh, seed: usize) -> Vec<usize> {
    let first = &mesh.points[seed].points;
    let adjacent = |a: usize, b: usize| mesh.points[a].points.binary_search(&b).is_ok();
    let diagonal = |via: &Vec<usize>| {
        via.iter()
            .tuple_combinations()
            .any(|(&a, &b)| !adjacent(a, b))
    };

    let mut second: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &b in first {
        for &q in &mesh.points[b].points {
            if q != seed && first.binary_search(&q).is_err() {
                second.entry(q).or_default().push(b);
            }
        }
    }
    let mut out: Vec<usize> = second
        .iter()
        .filter(|(_, via)| diagonal(via))
        .map(|(&q, _)| q)
        .collect();

    if mesh.dim == 3 {
        let mut third: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &s in &out {
            for &r in &mesh.points[s].points {
                if r != seed && first.binary_search(&r).is_err() && !second.contains_key(&r) {
                    third.entry(r).or_default().push(s);
                }
            }
        }
        out.extend(third.iter().filter(|(_, via)| diagonal(via)).map(|(&r, _)| r));
    }
    out
}
