//! Tagged-block ASCII reader (netCDF CDL dump of an unstructured grid).
//!
//! ```text
//! netcdf grid {
//! dimensions:
//!     no_of_points = 6 ;
//!     no_of_quadrilaterals = 2 ;
//!     no_of_surfacelines = 6 ;
//! variables:
//!     double points_xc(no_of_points) ;
//!     ...
//! data:
//!  points_xc = 0, 0.5, 1, 0, 0.5, 1 ;
//!  points_yc = 0, 0, 0, 1, 1, 1 ;
//!  points_of_quadrilaterals = 0, 1, 4, 3, 1, 2, 5, 4 ;
//!  points_of_surfacelines = 0, 1, 1, 2, 2, 5, 5, 4, 4, 3, 3, 0 ;
//!  boundarymarker_of_surfaces = 1, 1, 2, 3, 3, 4 ;
//! }
//! ```
//!
//! Node indices are 0-based. The `variables:` block is informational and
//! skipped. Surface elements are numbered lines, then triangles, then
//! quadrilaterals, and `boundarymarker_of_surfaces` gives each one a marker
//! id; markers are created in ascending id order and tagged with the id.
//! The format has no partitioning information, so it is read on one
//! process only.

use super::{parse, MeshReader};
use crate::algs::communicator::Communicator;
use crate::mesh::{BoundaryDescription, ElementDescription, MarkerDescription, MeshDescription};
use crate::mesh_error::MeshError;
use crate::topology::CellType;
use hashbrown::HashMap;
use std::collections::BTreeMap;
use std::io::Read;

const VOLUME_BLOCKS: &[(&str, CellType)] = &[
    ("points_of_triangles", CellType::Triangle),
    ("points_of_quadrilaterals", CellType::Quadrilateral),
    ("points_of_tetraeders", CellType::Tetrahedron),
    ("points_of_hexaeders", CellType::Hexahedron),
    ("points_of_prisms", CellType::Wedge),
    ("points_of_pyramids", CellType::Pyramid),
];

const SURFACE_BLOCKS: &[(&str, CellType)] = &[
    ("points_of_surfacelines", CellType::Line),
    ("points_of_surfacetriangles", CellType::Triangle),
    ("points_of_surfacequadrilaterals", CellType::Quadrilateral),
];

const MARKER_BLOCK: &str = "boundarymarker_of_surfaces";

#[derive(Debug, Default, Clone)]
pub struct TaggedReader;

impl TaggedReader {
    /// Reader for a run on `comm`; more than one process is not supported.
    pub fn for_comm<C: Communicator + ?Sized>(comm: &C) -> Result<Self, MeshError> {
        if comm.size() > 1 {
            return Err(MeshError::Unsupported(format!(
                "tagged-block meshes cannot be read by {} processes",
                comm.size()
            )));
        }
        Ok(TaggedReader)
    }
}

/// Dimensions and data blocks of a CDL dump.
#[derive(Debug, Default)]
struct Cdl<'a> {
    dims: HashMap<&'a str, usize>,
    data: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Cdl<'a> {
    fn parse(text: &'a str) -> Result<Self, MeshError> {
        if !text.trim_start().starts_with("netcdf") {
            return Err(MeshError::Parse("tagged-block file must start with `netcdf`".into()));
        }
        let (_, body) = text
            .split_once('{')
            .ok_or_else(|| MeshError::Parse("missing `{`".into()))?;
        let (body, _) = body
            .rsplit_once('}')
            .ok_or_else(|| MeshError::Parse("missing closing `}`".into()))?;
        let (head, data) = body
            .split_once("data:")
            .ok_or_else(|| MeshError::Parse("missing `data:` block".into()))?;
        let (_, dims) = head
            .split_once("dimensions:")
            .ok_or_else(|| MeshError::Parse("missing `dimensions:` block".into()))?;
        let dims = dims.split_once("variables:").map_or(dims, |(d, _)| d);

        let mut cdl = Cdl::default();
        for stmt in statements(dims) {
            let (name, value) = assignment(stmt)?;
            cdl.dims.insert(name, parse(value, "dimension length")?);
        }
        for stmt in statements(data) {
            let (name, value) = assignment(stmt)?;
            let values = value.split(',').map(str::trim).filter(|v| !v.is_empty()).collect();
            cdl.data.insert(name, values);
        }
        Ok(cdl)
    }

    /// Values of `name`, checked against its `no_of_*` dimension times
    /// `per_record` when that dimension is declared.
    fn block<T: std::str::FromStr>(
        &self,
        name: &str,
        dim: &str,
        per_record: usize,
    ) -> Result<Option<Vec<T>>, MeshError> {
        let Some(raw) = self.data.get(name) else {
            return Ok(None);
        };
        if raw.len() % per_record != 0 {
            return Err(MeshError::CountMismatch {
                section: "tagged block",
                declared: raw.len().div_ceil(per_record) * per_record,
                found: raw.len(),
            });
        }
        if let Some(&n) = self.dims.get(dim) {
            if n * per_record != raw.len() {
                return Err(MeshError::CountMismatch {
                    section: "tagged block",
                    declared: n,
                    found: raw.len() / per_record,
                });
            }
        }
        raw.iter()
            .map(|v| parse(v, name))
            .collect::<Result<Vec<T>, _>>()
            .map(Some)
    }
}

fn statements(block: &str) -> impl Iterator<Item = &str> {
    block.split(';').map(str::trim).filter(|s| !s.is_empty())
}

fn assignment(stmt: &str) -> Result<(&str, &str), MeshError> {
    let (k, v) = stmt
        .split_once('=')
        .ok_or_else(|| MeshError::Parse(format!("expected `name = value`, found `{stmt}`")))?;
    Ok((k.trim(), v.trim()))
}

/// `points_of_quadrilaterals` -> `no_of_quadrilaterals`.
fn count_dim(block: &str) -> String {
    block.replacen("points_of_", "no_of_", 1)
}

impl MeshReader for TaggedReader {
    fn read<R: Read>(&self, mut reader: R) -> Result<MeshDescription, MeshError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        let text: String = raw
            .lines()
            .map(|l| l.split_once("//").map_or(l, |(code, _)| code))
            .collect::<Vec<_>>()
            .join("\n");
        let cdl = Cdl::parse(&text)?;

        let mut coords: Vec<[f64; 3]> = Vec::new();
        for (axis, name) in ["points_xc", "points_yc", "points_zc"].into_iter().enumerate() {
            let Some(values) = cdl.block::<f64>(name, "no_of_points", 1)? else {
                if axis < 2 {
                    return Err(MeshError::Parse(format!("missing `{name}`")));
                }
                continue;
            };
            if axis == 0 {
                coords = vec![[0.0; 3]; values.len()];
            } else if values.len() != coords.len() {
                return Err(MeshError::CountMismatch {
                    section: "points",
                    declared: coords.len(),
                    found: values.len(),
                });
            }
            for (c, v) in coords.iter_mut().zip(values) {
                c[axis] = v;
            }
        }

        let mut elements = Vec::new();
        for &(name, cell_type) in VOLUME_BLOCKS {
            let n = cell_type.n_nodes();
            if let Some(nodes) = cdl.block::<usize>(name, &count_dim(name), n)? {
                elements.extend(nodes.chunks(n).map(|c| ElementDescription {
                    cell_type,
                    nodes: c.to_vec(),
                }));
            }
        }
        let dim = if elements.iter().any(|e| e.cell_type.dimension() == 3) {
            3
        } else {
            2
        };
        if dim == 2 {
            for c in &mut coords {
                c[2] = 0.0;
            }
        }

        let mut surfaces = Vec::new();
        for &(name, cell_type) in SURFACE_BLOCKS {
            let n = cell_type.n_nodes();
            if let Some(nodes) = cdl.block::<usize>(name, &count_dim(name), n)? {
                surfaces.extend(nodes.chunks(n).map(|c| BoundaryDescription {
                    cell_type,
                    nodes: c.to_vec(),
                    rotation: 0,
                }));
            }
        }
        let ids = cdl
            .block::<i64>(MARKER_BLOCK, "no_of_surfaceelements", 1)?
            .unwrap_or_default();
        if ids.len() != surfaces.len() {
            return Err(MeshError::CountMismatch {
                section: MARKER_BLOCK,
                declared: surfaces.len(),
                found: ids.len(),
            });
        }
        let mut grouped: BTreeMap<i64, Vec<BoundaryDescription>> = BTreeMap::new();
        for (id, s) in ids.into_iter().zip(surfaces) {
            grouped.entry(id).or_default().push(s);
        }
        let markers = grouped
            .into_iter()
            .map(|(id, elements)| MarkerDescription {
                tag: id.to_string(),
                send_recv: None,
                elements,
            })
            .collect();

        log::debug!(
            "tagged reader: {} points, {} elements",
            coords.len(),
            elements.len()
        );
        Ok(MeshDescription {
            dim,
            coords,
            elements,
            markers,
            ..Default::default()
        })
    }
}
