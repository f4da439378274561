#![allow(dead_code)]
use dual_grid::algs::communicator::LocalComm;
use dual_grid::mesh::{BoundaryDescription, ElementDescription, MarkerDescription, Mesh, MeshDescription};
use dual_grid::topology::CellType;

pub fn line(a: usize, b: usize) -> BoundaryDescription {
    BoundaryDescription {
        cell_type: CellType::Line,
        nodes: vec![a, b],
        rotation: 0,
    }
}

pub fn quad(nodes: [usize; 4]) -> ElementDescription {
    ElementDescription {
        cell_type: CellType::Quadrilateral,
        nodes: nodes.to_vec(),
    }
}

pub fn marker(tag: &str, elements: Vec<BoundaryDescription>) -> MarkerDescription {
    MarkerDescription {
        tag: tag.into(),
        send_recv: None,
        elements,
    }
}

/// `nx` x `ny` quads on `[0, w] x [0, 1]`, one marker per side
/// (lower, right, upper, left). Point `(i, j)` has index `j * (nx + 1) + i`.
pub fn grid(nx: usize, ny: usize, w: f64) -> MeshDescription {
    let id = |i: usize, j: usize| j * (nx + 1) + i;
    let mut coords = Vec::new();
    for j in 0..=ny {
        for i in 0..=nx {
            coords.push([w * i as f64 / nx as f64, j as f64 / ny as f64, 0.0]);
        }
    }
    let mut elements = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            elements.push(quad([id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)]));
        }
    }
    MeshDescription {
        dim: 2,
        coords,
        elements,
        markers: vec![
            marker("lower", (0..nx).map(|k| line(id(k, 0), id(k + 1, 0))).collect()),
            marker("right", (0..ny).map(|k| line(id(nx, k), id(nx, k + 1))).collect()),
            marker("upper", (0..nx).map(|k| line(id(k + 1, ny), id(k, ny))).collect()),
            marker("left", (0..ny).map(|k| line(id(0, k + 1), id(0, k))).collect()),
        ],
        ..Default::default()
    }
}

/// Unit square split into two quads.
pub fn two_by_one() -> MeshDescription {
    grid(2, 1, 1.0)
}

/// Run `f` once per rank of a `size`-rank in-process group, each on its own
/// thread, and collect the results in rank order.
pub fn run_ranks<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(LocalComm) -> T + Sync,
{
    let comms = LocalComm::group(size);
    std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|c| {
                let f = &f;
                s.spawn(move || f(c))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Outflow through every dual face of point `p`, boundary faces included.
/// Zero for a closed control volume.
pub fn closure(m: &Mesh, p: usize) -> [f64; 3] {
    let mut sum = [0.0; 3];
    for (&q, &k) in m.points[p].points.iter().zip(&m.points[p].edges) {
        let n = m.edges[k].normal;
        let s = if p < q { 1.0 } else { -1.0 };
        for d in 0..3 {
            sum[d] += s * n[d];
        }
    }
    for im in m.points[p].markers() {
        if let Some(iv) = m.points[p].vertex_on(im) {
            let n = m.markers[im].vertices[iv].normal;
            for d in 0..3 {
                sum[d] += n[d];
            }
        }
    }
    sum
}

pub fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub fn total_volume(m: &Mesh) -> f64 {
    m.points.iter().map(|p| p.volume()).sum()
}
