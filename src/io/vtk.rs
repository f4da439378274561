//! Legacy VTK (`.vtk`) writer for unstructured grids.
//!
//! Writes an ASCII `UNSTRUCTURED_GRID` dataset: the points, the volume
//! elements with their node-count prefix and cell-type codes, and the point
//! control volumes and partition colors as point data. Only meshes with
//! elements can be written, so coarse multigrid levels are rejected.

use super::MeshWriter;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use std::io::Write;

#[derive(Debug, Default, Clone)]
pub struct VtkWriter;

impl MeshWriter for VtkWriter {
    fn write<W: Write>(&self, mut writer: W, mesh: &Mesh) -> Result<(), MeshError> {
        if mesh.elements.is_empty() && mesh.n_point() > 0 {
            return Err(MeshError::Unsupported(format!(
                "VTK output of a mesh without elements (level {})",
                mesh.level
            )));
        }
        let total_size: usize = mesh.elements.iter().map(|e| e.nodes.len() + 1).sum();

        writeln!(writer, "# vtk DataFile Version 3.0")?;
        writeln!(writer, "dual-grid")?;
        writeln!(writer, "ASCII")?;
        writeln!(writer, "DATASET UNSTRUCTURED_GRID")?;
        writeln!(writer, "POINTS {} double", mesh.n_point())?;
        for p in &mesh.points {
            let [x, y, z] = p.coord;
            writeln!(writer, "{x} {y} {z}")?;
        }

        writeln!(writer, "CELLS {} {}", mesh.elements.len(), total_size)?;
        for e in &mesh.elements {
            write!(writer, "{}", e.nodes.len())?;
            for n in &e.nodes {
                write!(writer, " {n}")?;
            }
            writeln!(writer)?;
        }

        writeln!(writer, "CELL_TYPES {}", mesh.elements.len())?;
        for e in &mesh.elements {
            writeln!(writer, "{}", e.cell_type.vtk_tag())?;
        }

        writeln!(writer, "POINT_DATA {}", mesh.n_point())?;
        writeln!(writer, "SCALARS volume double 1")?;
        writeln!(writer, "LOOKUP_TABLE default")?;
        for p in &mesh.points {
            writeln!(writer, "{}", p.volume())?;
        }
        writeln!(writer, "SCALARS color int 1")?;
        writeln!(writer, "LOOKUP_TABLE default")?;
        for p in &mesh.points {
            writeln!(writer, "{}", p.color)?;
        }
        Ok(())
    }
}
