//! ASCII STL writer for boundary surfaces.
//!
//! One `solid` per physical marker. Quadrilateral faces are split along
//! their 0-2 diagonal; facet normals are the unit right-hand normals of the
//! boundary elements, which point out of the domain once the mesh is built.

use super::MeshWriter;
use crate::geometry::{cross, norm, scale, sub};
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::CellType;
use std::io::Write;

/// Writes every physical marker, or only `markers` when given.
#[derive(Debug, Default, Clone)]
pub struct StlWriter {
    pub markers: Option<Vec<String>>,
}

impl StlWriter {
    pub fn with_markers<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: Some(tags.into_iter().map(Into::into).collect()),
        }
    }

    fn facet<W: Write>(w: &mut W, c: [[f64; 3]; 3]) -> Result<(), MeshError> {
        let n = cross(sub(c[1], c[0]), sub(c[2], c[0]));
        let len = norm(n);
        let n = if len > 0.0 { scale(n, 1.0 / len) } else { n };
        writeln!(w, "  facet normal {} {} {}", n[0], n[1], n[2])?;
        writeln!(w, "    outer loop")?;
        for v in c {
            writeln!(w, "      vertex {} {} {}", v[0], v[1], v[2])?;
        }
        writeln!(w, "    endloop")?;
        writeln!(w, "  endfacet")?;
        Ok(())
    }
}

impl MeshWriter for StlWriter {
    fn write<W: Write>(&self, mut writer: W, mesh: &Mesh) -> Result<(), MeshError> {
        if mesh.dim != 3 {
            return Err(MeshError::Unsupported(format!(
                "STL output of a {}-D mesh",
                mesh.dim
            )));
        }
        if let Some(tags) = &self.markers {
            for t in tags {
                mesh.marker_index(t)?;
            }
        }
        let wanted = |tag: &str| self.markers.as_ref().is_none_or(|t| t.iter().any(|x| x == tag));

        for m in mesh.markers.iter().filter(|m| !m.is_send_receive() && wanted(m.tag.as_str())) {
            writeln!(writer, "solid {}", m.tag)?;
            for b in &m.elements {
                let c = mesh.gather(&b.nodes);
                match b.cell_type {
                    CellType::Triangle => Self::facet(&mut writer, [c[0], c[1], c[2]])?,
                    CellType::Quadrilateral => {
                        Self::facet(&mut writer, [c[0], c[1], c[2]])?;
                        Self::facet(&mut writer, [c[0], c[2], c[3]])?;
                    }
                    other => {
                        return Err(MeshError::Unsupported(format!(
                            "STL facet from {other:?} on marker `{}`",
                            m.tag
                        )))
                    }
                }
            }
            writeln!(writer, "endsolid {}", m.tag)?;
        }
        Ok(())
    }
}
