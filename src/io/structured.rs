//! Adapter for decoded structured-grid interchange data (CGNS-style bases,
//! zones and element sections).
//!
//! A file decoder fills a [`GridFile`]; [`StructuredAdapter::convert`]
//! normalizes it into a [`MeshDescription`]. Sections whose cells have the
//! base's cell dimension become volume elements, lower-dimensional sections
//! become one marker each, tagged with the section name. Only one base with
//! one zone is supported, read on one process.
//!
//! Connectivity is 1-based. `Mixed` sections prefix every cell with its
//! element-type code.

use crate::algs::communicator::Communicator;
use crate::mesh::{BoundaryDescription, ElementDescription, MarkerDescription, MeshDescription};
use crate::mesh_error::MeshError;
use crate::topology::CellType;
use serde::{Deserialize, Serialize};

/// Element types of the interchange format, with their numeric codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Node,
    Bar2,
    Tri3,
    Quad4,
    Tetra4,
    Pyra5,
    Penta6,
    Hexa8,
    Mixed,
}

impl ElementKind {
    pub fn from_code(code: i64) -> Result<Self, MeshError> {
        Ok(match code {
            2 => ElementKind::Node,
            3 => ElementKind::Bar2,
            5 => ElementKind::Tri3,
            7 => ElementKind::Quad4,
            10 => ElementKind::Tetra4,
            12 => ElementKind::Pyra5,
            14 => ElementKind::Penta6,
            17 => ElementKind::Hexa8,
            20 => ElementKind::Mixed,
            other => {
                return Err(MeshError::Unsupported(format!(
                    "interchange element type {other}"
                )))
            }
        })
    }

    /// Mesh cell type; `None` for `Mixed`.
    pub fn cell_type(self) -> Option<CellType> {
        match self {
            ElementKind::Node => Some(CellType::Vertex),
            ElementKind::Bar2 => Some(CellType::Line),
            ElementKind::Tri3 => Some(CellType::Triangle),
            ElementKind::Quad4 => Some(CellType::Quadrilateral),
            ElementKind::Tetra4 => Some(CellType::Tetrahedron),
            ElementKind::Pyra5 => Some(CellType::Pyramid),
            ElementKind::Penta6 => Some(CellType::Wedge),
            ElementKind::Hexa8 => Some(CellType::Hexahedron),
            ElementKind::Mixed => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub kind: ElementKind,
    pub connectivity: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub coords: Vec<[f64; 3]>,
    pub sections: Vec<Section>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Base {
    pub name: String,
    pub cell_dim: usize,
    pub zones: Vec<Zone>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GridFile {
    pub bases: Vec<Base>,
}

#[derive(Debug, Default, Clone)]
pub struct StructuredAdapter;

impl StructuredAdapter {
    /// Adapter for a run on `comm`; more than one process is not supported.
    pub fn for_comm<C: Communicator + ?Sized>(comm: &C) -> Result<Self, MeshError> {
        if comm.size() > 1 {
            return Err(MeshError::Unsupported(format!(
                "structured-grid files cannot be read by {} processes",
                comm.size()
            )));
        }
        Ok(StructuredAdapter)
    }

    pub fn convert(&self, file: &GridFile) -> Result<MeshDescription, MeshError> {
        let [base] = file.bases.as_slice() else {
            return Err(MeshError::Unsupported(format!(
                "{} bases in a structured-grid file (exactly one supported)",
                file.bases.len()
            )));
        };
        let [zone] = base.zones.as_slice() else {
            return Err(MeshError::Unsupported(format!(
                "{} zones in base `{}` (exactly one supported)",
                base.zones.len(),
                base.name
            )));
        };
        if base.cell_dim != 2 && base.cell_dim != 3 {
            return Err(MeshError::InvalidDimension(base.cell_dim));
        }

        let mut desc = MeshDescription {
            dim: base.cell_dim,
            coords: zone.coords.clone(),
            ..Default::default()
        };
        if base.cell_dim == 2 {
            for c in &mut desc.coords {
                c[2] = 0.0;
            }
        }
        for s in &zone.sections {
            let mut boundary = Vec::new();
            for (cell_type, nodes) in cells(s)? {
                let nodes = nodes
                    .iter()
                    .map(|&n| {
                        n.checked_sub(1).ok_or_else(|| {
                            MeshError::Parse(format!("section `{}`: node index 0 in 1-based data", s.name))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if cell_type.dimension() == base.cell_dim {
                    desc.elements.push(ElementDescription { cell_type, nodes });
                } else if cell_type.dimension() + 1 == base.cell_dim {
                    boundary.push(BoundaryDescription {
                        cell_type,
                        nodes,
                        rotation: 0,
                    });
                } else {
                    log::debug!("structured adapter: skipping {cell_type:?} in `{}`", s.name);
                }
            }
            if !boundary.is_empty() {
                desc.markers.push(MarkerDescription {
                    tag: s.name.clone(),
                    send_recv: None,
                    elements: boundary,
                });
            }
        }
        log::info!(
            "structured adapter: zone `{}`: {} points, {} elements, {} markers",
            zone.name,
            desc.coords.len(),
            desc.elements.len(),
            desc.markers.len()
        );
        Ok(desc)
    }
}

/// Split a section into (cell type, 1-based nodes).
fn cells(s: &Section) -> Result<Vec<(CellType, &[usize])>, MeshError> {
    let mut out = Vec::new();
    let mut rest = s.connectivity.as_slice();
    while !rest.is_empty() {
        let cell_type = match s.kind.cell_type() {
            Some(t) => t,
            None => {
                let code = rest[0] as i64;
                rest = &rest[1..];
                ElementKind::from_code(code)?.cell_type().ok_or_else(|| {
                    MeshError::Parse(format!("section `{}`: nested mixed element", s.name))
                })?
            }
        };
        let n = cell_type.n_nodes();
        if rest.len() < n {
            return Err(MeshError::CountMismatch {
                section: "structured section",
                declared: n,
                found: rest.len(),
            });
        }
        let (nodes, tail) = rest.split_at(n);
        out.push((cell_type, nodes));
        rest = tail;
    }
    Ok(out)
}
