//! Rigid periodic transforms.
//!
//! A transform rotates about the x, then y, then z axis through `center`
//! and then translates. Index 0 of a mesh's transform list is the identity
//! so that `rotation == 0` on a vertex always means "plain halo copy".

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodicTransform {
    pub center: [f64; 3],
    /// Rotation angles about x, y, z in radians.
    pub angles: [f64; 3],
    pub translation: [f64; 3],
}

impl PeriodicTransform {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.angles == [0.0; 3] && self.translation == [0.0; 3]
    }

    /// Rotation matrix `Rz * Ry * Rx`.
    pub fn rotation_matrix(&self) -> [[f64; 3]; 3] {
        let (sx, cx) = self.angles[0].sin_cos();
        let (sy, cy) = self.angles[1].sin_cos();
        let (sz, cz) = self.angles[2].sin_cos();
        [
            [cy * cz, sx * sy * cz - cx * sz, cx * sy * cz + sx * sz],
            [cy * sz, sx * sy * sz + cx * cz, cx * sy * sz - sx * cz],
            [-sy, sx * cy, cx * cy],
        ]
    }

    /// Image of `x` under the transform.
    pub fn apply(&self, x: [f64; 3]) -> [f64; 3] {
        let r = self.rotate([
            x[0] - self.center[0],
            x[1] - self.center[1],
            x[2] - self.center[2],
        ]);
        [0, 1, 2].map(|i| r[i] + self.center[i] + self.translation[i])
    }

    /// Rotate a direction (no center, no translation).
    pub fn rotate(&self, v: [f64; 3]) -> [f64; 3] {
        let r = self.rotation_matrix();
        [0, 1, 2].map(|i| r[i][0] * v[0] + r[i][1] * v[1] + r[i][2] * v[2])
    }
}
