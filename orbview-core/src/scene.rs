/// Owned scene-graph handles for the model viewer
use crate::animator::SatelliteState;
use crate::geometry::Mesh;
use crate::lighting::{Lighting, Material};

pub const SATELLITE_RADIUS: f32 = 0.12;
pub const SATELLITE_SEGMENTS: usize = 32;
pub const TRAIL_RADIUS: f32 = 0.02;
pub const TRAIL_TUBULAR_SEGMENTS: usize = 200;
pub const TRAIL_RADIAL_SEGMENTS: usize = 16;

/// Holds at most one trail geometry, replacing it wholesale every frame
#[derive(Debug, Default)]
pub struct TrailSlot {
    mesh: Option<Mesh>,
    built: u64,
    released: u64,
}

impl TrailSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Release the current geometry, then install `mesh`
    pub fn replace(&mut self, mesh: Mesh) {
        self.release();
        self.mesh = Some(mesh);
        self.built += 1;
    }

    /// Release the current geometry before `build` runs, then install its result
    pub fn rebuild(&mut self, build: impl FnOnce() -> Mesh) {
        self.release();
        let mesh = build();
        self.replace(mesh);
    }

    /// Drop the current geometry, if any
    pub fn release(&mut self) {
        if let Some(old) = self.mesh.take() {
            drop(old);
            self.released += 1;
        }
    }

    pub fn built(&self) -> u64 {
        self.built
    }

    pub fn released(&self) -> u64 {
        self.released
    }

    /// Geometries built but not yet released; never more than one
    pub fn live(&self) -> u64 {
        self.built - self.released
    }
}

/// Renderable content of the viewer: model, optional satellite and its trail
#[derive(Debug)]
pub struct Scene {
    pub model: Mesh,
    pub model_material: Material,
    pub satellite: Option<Mesh>,
    pub satellite_material: Material,
    pub trail: TrailSlot,
    pub trail_material: Material,
    pub lighting: Lighting,
}

impl Scene {
    /// Build the scene; the satellite sphere only exists when orbiting is on
    pub fn new(model: Mesh, with_satellite: bool) -> Self {
        let satellite = with_satellite
            .then(|| Mesh::sphere(SATELLITE_RADIUS, SATELLITE_SEGMENTS, SATELLITE_SEGMENTS));
        Self {
            model,
            model_material: Material::model(),
            satellite,
            satellite_material: Material::satellite(),
            trail: TrailSlot::new(),
            trail_material: Material::trail(),
            lighting: Lighting::viewer_rig(),
        }
    }

    /// Rebuild the trail tube around this frame's trail curve
    pub fn rebuild_trail(&mut self, satellite: &SatelliteState) {
        let curve = satellite.trail_curve();
        self.trail.rebuild(|| {
            Mesh::tube(
                &curve,
                TRAIL_TUBULAR_SEGMENTS,
                TRAIL_RADIUS,
                TRAIL_RADIAL_SEGMENTS,
            )
        });
        log::trace!("trail geometry #{} built", self.trail.built());
    }

    pub fn release(&mut self) {
        self.trail.release();
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::trail_samples;
    use nalgebra::Point3;

    #[test]
    fn test_trail_slot_keeps_one_live_geometry() {
        let mut slot = TrailSlot::new();
        assert_eq!(slot.live(), 0);
        for _ in 0..5 {
            slot.replace(Mesh::new());
            assert_eq!(slot.live(), 1);
        }
        assert_eq!(slot.built(), 5);
        assert_eq!(slot.released(), 4);
        slot.release();
        assert_eq!(slot.live(), 0);
        assert!(slot.mesh().is_none());
    }

    #[test]
    fn test_rebuild_releases_before_building() {
        let mut slot = TrailSlot::new();
        slot.rebuild(Mesh::new);
        assert_eq!((slot.built(), slot.released()), (1, 0));

        slot.rebuild(|| Mesh::sphere(1.0, 4, 4));
        assert_eq!((slot.built(), slot.released()), (2, 1));
        assert_eq!(slot.live(), 1);
        assert!(slot.mesh().is_some_and(|m| !m.is_empty()));
    }

    #[test]
    fn test_satellite_only_with_orbit() {
        assert!(Scene::new(Mesh::new(), false).satellite.is_none());
        let scene = Scene::new(Mesh::new(), true);
        assert!(scene.satellite.as_ref().is_some_and(|s| !s.is_empty()));
    }

    #[test]
    fn test_rebuild_trail_builds_tube() {
        let mut scene = Scene::new(Mesh::new(), true);
        let satellite = SatelliteState {
            position: Point3::origin(),
            trail: trail_samples(Point3::origin(), 0.5),
        };
        scene.rebuild_trail(&satellite);
        scene.rebuild_trail(&satellite);
        let tube = scene.trail.mesh().unwrap();
        assert_eq!(
            tube.triangle_count(),
            TRAIL_TUBULAR_SEGMENTS * TRAIL_RADIAL_SEGMENTS * 2
        );
        assert_eq!(scene.trail.live(), 1);
    }
}
