//! Geometry of the median-dual mesh.
//!
//! - [`dual`]: element/edge/boundary centroids, edge normals, point control
//!   volumes and boundary vertex normals.
//! - [`queries`]: wall distance, projected wall area and closest
//!   normal-direction neighbours.
//! - [`matching`]: nearest-partner search for near-field and interface
//!   markers.
//!
//! Coordinates are always `[f64; 3]`; 2-D meshes keep the third component at
//! zero so the same helpers serve both dimensions.

pub mod dual;
pub mod matching;
pub mod queries;

pub(crate) fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

pub(crate) fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    norm(sub(a, b))
}

/// Arithmetic mean of a set of coordinates.
pub(crate) fn centroid<I>(coords: I) -> [f64; 3]
where
    I: IntoIterator<Item = [f64; 3]>,
{
    let mut sum = [0.0; 3];
    let mut n = 0usize;
    for c in coords {
        sum = add(sum, c);
        n += 1;
    }
    if n == 0 { sum } else { scale(sum, 1.0 / n as f64) }
}

/// z-component of `(b - a) x (c - a)`; twice the signed area of `abc`.
pub(crate) fn cross2(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// `(b - a) x (c - a) . (d - a)`; six times the signed volume of `abcd`.
pub(crate) fn triple(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3]) -> f64 {
    dot(cross(sub(b, a), sub(c, a)), sub(d, a))
}

/// Vector area of a planar or warped polygon (right-hand winding).
pub(crate) fn polygon_area_vector(coords: &[[f64; 3]]) -> [f64; 3] {
    let c = centroid(coords.iter().copied());
    let mut area = [0.0; 3];
    for k in 0..coords.len() {
        let a = sub(coords[k], c);
        let b = sub(coords[(k + 1) % coords.len()], c);
        area = add(area, scale(cross(a, b), 0.5));
    }
    area
}
