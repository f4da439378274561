//! Block plot writer (Tecplot ASCII, one finite-element zone).
//!
//! The zone type follows the dimension and the cell shapes present: pure
//! triangle or tetrahedron meshes get `FETRIANGLE`/`FETETRAHEDRON`, anything
//! else is written as `FEQUADRILATERAL`/`FEBRICK` with collapsed nodes for
//! the lower-order shapes. Node numbers are 1-based.

use super::MeshWriter;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::CellType;
use std::io::Write;

#[derive(Debug, Default, Clone)]
pub struct PlotWriter;

/// Tecplot zone type of `mesh`.
fn zone_type(mesh: &Mesh) -> &'static str {
    let all = |t: CellType| mesh.elements.iter().all(|e| e.cell_type == t);
    match (mesh.dim, all(CellType::Triangle), all(CellType::Tetrahedron)) {
        (2, true, _) => "FETRIANGLE",
        (2, false, _) => "FEQUADRILATERAL",
        (_, _, true) => "FETETRAHEDRON",
        _ => "FEBRICK",
    }
}

/// Local node pattern of `cell_type` inside a quadrilateral or brick.
fn padded(cell_type: CellType) -> &'static [usize] {
    match cell_type {
        CellType::Triangle => &[0, 1, 2, 2],
        CellType::Tetrahedron => &[0, 1, 2, 2, 3, 3, 3, 3],
        CellType::Wedge => &[0, 1, 2, 2, 3, 4, 5, 5],
        CellType::Pyramid => &[0, 1, 2, 3, 4, 4, 4, 4],
        CellType::Quadrilateral => &[0, 1, 2, 3],
        CellType::Hexahedron => &[0, 1, 2, 3, 4, 5, 6, 7],
        CellType::Vertex => &[0],
        CellType::Line => &[0, 1],
    }
}

impl MeshWriter for PlotWriter {
    fn write<W: Write>(&self, mut writer: W, mesh: &Mesh) -> Result<(), MeshError> {
        if mesh.elements.is_empty() {
            return Err(MeshError::Unsupported("plot output of a mesh without elements".into()));
        }
        let zone = zone_type(mesh);
        let native = matches!(zone, "FETRIANGLE" | "FETETRAHEDRON");

        writeln!(writer, "TITLE = \"dual-grid\"")?;
        match mesh.dim {
            2 => writeln!(writer, "VARIABLES = \"x\" \"y\" \"volume\"")?,
            _ => writeln!(writer, "VARIABLES = \"x\" \"y\" \"z\" \"volume\"")?,
        }
        writeln!(
            writer,
            "ZONE NODES= {}, ELEMENTS= {}, DATAPACKING=POINT, ZONETYPE={zone}",
            mesh.n_point(),
            mesh.elements.len()
        )?;
        for p in &mesh.points {
            for x in p.coord.iter().take(mesh.dim) {
                write!(writer, "{x} ")?;
            }
            writeln!(writer, "{}", p.volume())?;
        }
        for e in &mesh.elements {
            let pattern: Vec<usize> = if native {
                (0..e.nodes.len()).collect()
            } else {
                padded(e.cell_type).to_vec()
            };
            let line: Vec<String> = pattern.iter().map(|&k| (e.nodes[k] + 1).to_string()).collect();
            writeln!(writer, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
