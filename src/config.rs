//! Run configuration consumed by the mesh engine.
//!
//! `MeshConfig` is the collaborator interface the solver layer hands to the
//! mesh: boundary-condition kind and flags per marker tag, periodic pairs,
//! unit conversion, multigrid parameters, domain count and matching
//! tolerances. It is plain data (serde-derivable) so a driver can load it
//! from any format it likes.

use crate::mesh_error::MeshError;
use crate::topology::marker::BoundaryKind;
use crate::topology::periodic::PeriodicTransform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-marker settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub kind: BoundaryKind,
    /// Contributes to monitored forces/areas.
    pub monitoring: bool,
    pub plotting: bool,
    pub moving: bool,
}

/// Two periodic markers related by `transform`: points of `marker` map to
/// `donor` under the transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodicPair {
    pub marker: String,
    pub donor: String,
    pub transform: PeriodicTransform,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultigridConfig {
    /// Number of coarse levels to build (0 disables multigrid).
    pub n_levels: usize,
    /// Maximum number of fine points merged into one coarse point.
    pub max_children: usize,
    /// A point whose size `volume^(1/d)` exceeds this fraction of the
    /// domain size is not agglomerated further.
    pub max_dimension: f64,
    /// Reject seeds whose longest/shortest neighbour distance exceeds
    /// `max_stretching`.
    pub check_stretching: bool,
    pub max_stretching: f64,
}

impl Default for MultigridConfig {
    fn default() -> Self {
        Self {
            n_levels: 0,
            max_children: 50,
            max_dimension: 0.1,
            check_stretching: false,
            max_stretching: 100.0,
        }
    }
}

/// Distance above which a partner match is reported as inexact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchTolerances {
    pub periodic: f64,
    pub near_field: f64,
    pub interface: f64,
}

impl Default for MatchTolerances {
    fn default() -> Self {
        Self {
            periodic: 1e-10,
            near_field: 1e-1,
            interface: 1.5e-1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    pub markers: BTreeMap<String, MarkerConfig>,
    pub periodic: Vec<PeriodicPair>,
    /// Multiplies every coordinate read from a mesh file.
    pub conversion: f64,
    pub multigrid: MultigridConfig,
    pub n_domains: usize,
    pub tolerances: MatchTolerances,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            markers: BTreeMap::new(),
            periodic: Vec::new(),
            conversion: 1.0,
            multigrid: MultigridConfig::default(),
            n_domains: 1,
            tolerances: MatchTolerances::default(),
        }
    }
}

impl MeshConfig {
    /// Register `tag` with boundary kind `kind`.
    pub fn with_marker(mut self, tag: &str, kind: BoundaryKind) -> Self {
        self.markers.entry(tag.to_string()).or_default().kind = kind;
        self
    }

    /// Flag `tag` as monitored.
    pub fn with_monitoring(mut self, tag: &str) -> Self {
        self.markers.entry(tag.to_string()).or_default().monitoring = true;
        self
    }

    /// Boundary kind of `tag`; unknown tags are [`BoundaryKind::Custom`].
    pub fn marker_kind(&self, tag: &str) -> BoundaryKind {
        self.markers.get(tag).map(|m| m.kind).unwrap_or_default()
    }

    pub fn is_monitored(&self, tag: &str) -> bool {
        self.markers.get(tag).is_some_and(|m| m.monitoring)
    }

    /// Check the values that would make later passes meaningless.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.n_domains == 0 {
            return Err(MeshError::InvalidConfig("n_domains must be at least 1".into()));
        }
        if !(self.conversion > 0.0) {
            return Err(MeshError::InvalidConfig(format!(
                "conversion factor must be positive, got {}",
                self.conversion
            )));
        }
        if self.multigrid.max_children < 1 {
            return Err(MeshError::InvalidConfig("max_children must be at least 1".into()));
        }
        for pair in &self.periodic {
            for tag in [&pair.marker, &pair.donor] {
                if self.marker_kind(tag) != BoundaryKind::Periodic {
                    return Err(MeshError::InvalidConfig(format!(
                        "periodic pair marker `{tag}` is not declared periodic"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = MeshConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.multigrid.max_children, 50);
        assert_eq!(cfg.tolerances.periodic, 1e-10);
    }

    #[test]
    fn unknown_markers_are_custom() {
        let cfg = MeshConfig::default()
            .with_marker("wall", BoundaryKind::NoSlipWall)
            .with_monitoring("wall");
        assert_eq!(cfg.marker_kind("wall"), BoundaryKind::NoSlipWall);
        assert_eq!(cfg.marker_kind("other"), BoundaryKind::Custom);
        assert!(cfg.is_monitored("wall"));
        assert!(!cfg.is_monitored("other"));
    }

    #[test]
    fn periodic_pairs_need_periodic_markers() {
        let mut cfg = MeshConfig::default().with_marker("left", BoundaryKind::Periodic);
        cfg.periodic.push(PeriodicPair {
            marker: "left".into(),
            donor: "right".into(),
            transform: PeriodicTransform::identity(),
        });
        assert!(matches!(cfg.validate(), Err(MeshError::InvalidConfig(_))));
        let cfg = cfg.with_marker("right", BoundaryKind::Periodic);
        cfg.validate().unwrap();
    }

    #[test]
    fn serde_round_trip() {
        let cfg = MeshConfig::default().with_marker("far", BoundaryKind::FarField);
        let s = serde_json::to_string(&cfg).unwrap();
        let back: MeshConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(back, cfg);
    }
}
