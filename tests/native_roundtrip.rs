mod util;

use dual_grid::config::MeshConfig;
use dual_grid::io::native::{NativeReader, NativeWriter};
use dual_grid::io::vtk::VtkWriter;
use dual_grid::io::{MeshReader, MeshWriter};
use dual_grid::mesh::{Mesh, MeshDescription};
use util::{grid, total_volume};

fn write_native(m: &Mesh) -> Vec<u8> {
    let mut buf = Vec::new();
    NativeWriter.write(&mut buf, m).unwrap();
    buf
}

#[test]
fn grid_survives_a_native_round_trip() {
    let config = MeshConfig::default();
    let m = Mesh::build(grid(3, 2, 1.5), &config).unwrap();
    let buf = write_native(&m);
    let back = Mesh::build(NativeReader.read(buf.as_slice()).unwrap(), &config).unwrap();

    assert_eq!(back.n_point(), m.n_point());
    assert_eq!(back.elements.len(), m.elements.len());
    assert_eq!(back.edges.len(), m.edges.len());
    for (a, b) in back.points.iter().zip(&m.points) {
        assert_eq!(a.coord, b.coord);
        assert_eq!(a.global_index, b.global_index);
    }
    for (a, b) in back.elements.iter().zip(&m.elements) {
        assert_eq!(a.cell_type, b.cell_type);
        assert_eq!(a.nodes, b.nodes);
    }
    assert_eq!(back.markers.len(), m.markers.len());
    for (a, b) in back.markers.iter().zip(&m.markers) {
        assert_eq!(a.tag, b.tag);
        assert_eq!(a.elements.len(), b.elements.len());
        assert_eq!(a.vertices.len(), b.vertices.len());
    }
    assert!((total_volume(&back) - 1.5).abs() < 1e-12);

    // Writing the re-read mesh is a fixed point.
    assert_eq!(write_native(&back), buf);
}

#[test]
fn description_serializes_to_json() {
    let desc = grid(2, 2, 1.0);
    let json = serde_json::to_string(&desc).unwrap();
    let back: MeshDescription = serde_json::from_str(&json).unwrap();
    assert_eq!(back, desc);
}

#[test]
fn vtk_output_lists_every_point_and_cell() {
    let m = Mesh::build(grid(3, 2, 1.0), &MeshConfig::default()).unwrap();
    let mut buf = Vec::new();
    VtkWriter.write(&mut buf, &m).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("# vtk DataFile Version"));
    assert!(text.contains("POINTS 12 double"));
    assert!(text.contains("CELLS 6 30"));
    assert!(text.contains("CELL_TYPES 6"));
}
