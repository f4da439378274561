//! Native keyword mesh format.
//!
//! ```text
//! NDIME= 2
//! NELEM= 2
//! 9 0 1 4 3 0          cell tag, nodes, element id (ignored)
//! ...
//! NPOIN= 6 4           point count, optional owned count
//! 0.0 0.0 0 0          coordinates, optional local and global index
//! ...
//! NMARK= 2
//! MARKER_TAG= wall
//! MARKER_ELEMS= 1
//! 3 0 1
//! MARKER_TAG= SEND_RECEIVE
//! MARKER_ELEMS= 1
//! SEND_TO= -2          partner code, see `Marker::send_recv`
//! 1 5 0                vertex tag, node, periodic rotation
//! NPERIODIC= 1
//! PERIODIC_INDEX= 0
//! 0 0 0                center
//! 0 0 0                rotation angles (radians)
//! 0 0 0                translation
//! ```
//!
//! Lines starting with `%` are comments. Cell tags are the legacy VTK codes
//! of [`CellType::vtk_tag`]. Sections may appear in any order except that
//! `NDIME=` must precede `NPOIN=`; unknown keyword lines are skipped.

use super::{keyword, next_token, parse, Lines, MeshReader, MeshWriter};
use crate::mesh::{BoundaryDescription, ElementDescription, MarkerDescription, Mesh, MeshDescription};
use crate::mesh_error::MeshError;
use crate::topology::marker::SEND_RECEIVE_TAG;
use crate::topology::{CellType, PeriodicTransform};
use std::io::{Read, Write};

#[derive(Debug, Default, Clone)]
pub struct NativeReader;

#[derive(Debug, Default, Clone)]
pub struct NativeWriter;

fn parse_cell(line: &str) -> Result<(CellType, Vec<usize>), MeshError> {
    let mut parts = line.split_whitespace();
    let cell_type = CellType::from_vtk_tag(next_token(&mut parts, "cell type")?)?;
    let nodes = (0..cell_type.n_nodes())
        .map(|_| next_token(&mut parts, "element node"))
        .collect::<Result<Vec<usize>, _>>()?;
    Ok((cell_type, nodes))
}

fn parse_vector(line: &str) -> Result<[f64; 3], MeshError> {
    let mut parts = line.split_whitespace();
    let mut v = [0.0; 3];
    for x in &mut v {
        *x = next_token(&mut parts, "vector component")?;
    }
    Ok(v)
}

impl NativeReader {
    fn read_elements(lines: &mut Lines<'_>, n: usize, desc: &mut MeshDescription) -> Result<(), MeshError> {
        desc.elements.reserve(n);
        for i in 0..n {
            let line = lines.record("NELEM", n, i)?;
            let (cell_type, nodes) = parse_cell(line)?;
            desc.elements.push(ElementDescription { cell_type, nodes });
        }
        Ok(())
    }

    fn read_points(lines: &mut Lines<'_>, header: &str, desc: &mut MeshDescription) -> Result<(), MeshError> {
        if desc.dim == 0 {
            return Err(lines.error("NPOIN= before NDIME="));
        }
        let mut fields = header.split_whitespace();
        let n: usize = next_token(&mut fields, "point count")?;
        desc.n_point_domain = fields.next().map(|f| parse(f, "owned point count")).transpose()?;

        let mut globals = Vec::new();
        desc.coords.reserve(n);
        for i in 0..n {
            let line = lines.record("NPOIN", n, i)?;
            let mut parts = line.split_whitespace();
            let mut c = [0.0; 3];
            for x in c.iter_mut().take(desc.dim) {
                *x = next_token(&mut parts, "coordinate")?;
            }
            desc.coords.push(c);
            let rest: Vec<&str> = parts.collect();
            if let [_, global] = rest[..] {
                globals.push(parse(global, "global index")?);
            }
        }
        match globals.len() {
            0 => {}
            k if k == n => desc.global_index = Some(globals),
            k => {
                return Err(MeshError::CountMismatch {
                    section: "NPOIN global indices",
                    declared: n,
                    found: k,
                })
            }
        }
        Ok(())
    }

    fn read_markers(lines: &mut Lines<'_>, n: usize, desc: &mut MeshDescription) -> Result<(), MeshError> {
        for _ in 0..n {
            let tag = lines.expect_keyword("MARKER_TAG")?.to_string();
            let n_elem: usize = parse(lines.expect_keyword("MARKER_ELEMS")?, "marker element count")?;
            let send_recv = if tag == SEND_RECEIVE_TAG {
                let code: i64 = parse(lines.expect_keyword("SEND_TO")?, "send/receive partner")?;
                if code == 0 {
                    return Err(lines.error("SEND_TO= 0 names no partner"));
                }
                Some(code)
            } else {
                None
            };
            let mut elements = Vec::with_capacity(n_elem);
            for i in 0..n_elem {
                let line = lines.record("MARKER_ELEMS", n_elem, i)?;
                let (cell_type, nodes) = parse_cell(line)?;
                let rotation = if send_recv.is_some() {
                    line.split_whitespace()
                        .nth(2)
                        .map(|r| parse(r, "periodic rotation"))
                        .transpose()?
                        .unwrap_or(0)
                } else {
                    0
                };
                elements.push(BoundaryDescription {
                    cell_type,
                    nodes,
                    rotation,
                });
            }
            desc.markers.push(MarkerDescription {
                tag,
                send_recv,
                elements,
            });
        }
        Ok(())
    }

    fn read_periodic(lines: &mut Lines<'_>, n: usize, desc: &mut MeshDescription) -> Result<(), MeshError> {
        for _ in 0..n {
            let index: usize = parse(lines.expect_keyword("PERIODIC_INDEX")?, "periodic index")?;
            let mut rows = [[0.0; 3]; 3];
            for (k, row) in rows.iter_mut().enumerate() {
                let line = lines.record("PERIODIC_INDEX", 3, k)?;
                *row = parse_vector(line)?;
            }
            let [center, angles, translation] = rows;
            desc.periodic.insert(
                index,
                PeriodicTransform {
                    center,
                    angles,
                    translation,
                },
            );
        }
        Ok(())
    }
}

impl MeshReader for NativeReader {
    fn read<R: Read>(&self, mut reader: R) -> Result<MeshDescription, MeshError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        let mut lines = Lines::new(&contents, "%");
        let mut desc = MeshDescription::default();

        while let Some(line) = lines.next_line() {
            if let Some(v) = keyword(line, "NDIME") {
                desc.dim = parse(v, "dimension")?;
                if desc.dim != 2 && desc.dim != 3 {
                    return Err(MeshError::InvalidDimension(desc.dim));
                }
            } else if let Some(v) = keyword(line, "NELEM") {
                let n = parse(v, "element count")?;
                Self::read_elements(&mut lines, n, &mut desc)?;
            } else if let Some(v) = keyword(line, "NPOIN") {
                Self::read_points(&mut lines, v, &mut desc)?;
            } else if let Some(v) = keyword(line, "NMARK") {
                let n = parse(v, "marker count")?;
                Self::read_markers(&mut lines, n, &mut desc)?;
            } else if let Some(v) = keyword(line, "NPERIODIC") {
                let n = parse(v, "periodic transform count")?;
                Self::read_periodic(&mut lines, n, &mut desc)?;
            } else if line.contains('=') {
                log::debug!("native reader: skipping `{line}`");
            } else {
                return Err(lines.error(format!("unexpected line `{line}`")));
            }
        }
        if desc.dim == 0 {
            return Err(MeshError::Parse("missing NDIME=".into()));
        }
        log::debug!(
            "native reader: {} points, {} elements, {} markers",
            desc.coords.len(),
            desc.elements.len(),
            desc.markers.len()
        );
        Ok(desc)
    }
}

impl NativeWriter {
    /// Serialize a description; this is what the adapters re-export through.
    pub fn write_description<W: Write>(&self, mut w: W, desc: &MeshDescription) -> Result<(), MeshError> {
        writeln!(w, "%\n% Problem dimension\n%")?;
        writeln!(w, "NDIME= {}", desc.dim)?;

        writeln!(w, "%\n% Inner element connectivity\n%")?;
        writeln!(w, "NELEM= {}", desc.elements.len())?;
        for (i, e) in desc.elements.iter().enumerate() {
            write!(w, "{}", e.cell_type.vtk_tag())?;
            for n in &e.nodes {
                write!(w, "\t{n}")?;
            }
            writeln!(w, "\t{i}")?;
        }

        writeln!(w, "%\n% Node coordinates\n%")?;
        match desc.n_point_domain {
            Some(owned) => writeln!(w, "NPOIN= {}\t{owned}", desc.coords.len())?,
            None => writeln!(w, "NPOIN= {}", desc.coords.len())?,
        }
        for (i, c) in desc.coords.iter().enumerate() {
            for (k, x) in c.iter().take(desc.dim).enumerate() {
                if k > 0 {
                    write!(w, "\t")?;
                }
                write!(w, "{x}")?;
            }
            match &desc.global_index {
                Some(g) => writeln!(w, "\t{i}\t{}", g[i])?,
                None => writeln!(w, "\t{i}")?,
            }
        }

        writeln!(w, "%\n% Boundary elements\n%")?;
        writeln!(w, "NMARK= {}", desc.markers.len())?;
        for m in &desc.markers {
            writeln!(w, "MARKER_TAG= {}", m.tag)?;
            writeln!(w, "MARKER_ELEMS= {}", m.elements.len())?;
            if let Some(code) = m.send_recv {
                writeln!(w, "SEND_TO= {code}")?;
            }
            for b in &m.elements {
                write!(w, "{}", b.cell_type.vtk_tag())?;
                for n in &b.nodes {
                    write!(w, "\t{n}")?;
                }
                if m.send_recv.is_some() {
                    write!(w, "\t{}", b.rotation)?;
                }
                writeln!(w)?;
            }
        }

        // The identity alone carries no information.
        let nontrivial = !(desc.periodic.len() == 1
            && desc.periodic.get(&0).is_some_and(PeriodicTransform::is_identity));
        if !desc.periodic.is_empty() && nontrivial {
            writeln!(w, "%\n% Periodic transformations\n%")?;
            writeln!(w, "NPERIODIC= {}", desc.periodic.len())?;
            for (i, t) in &desc.periodic {
                writeln!(w, "PERIODIC_INDEX= {i}")?;
                for v in [t.center, t.angles, t.translation] {
                    writeln!(w, "{}\t{}\t{}", v[0], v[1], v[2])?;
                }
            }
        }
        Ok(())
    }
}

impl MeshWriter for NativeWriter {
    fn write<W: Write>(&self, writer: W, mesh: &Mesh) -> Result<(), MeshError> {
        self.write_description(writer, &mesh.to_description())
    }
}
