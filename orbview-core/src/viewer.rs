/// The interactive model viewer: configuration, scene, animation and camera
use crate::animator::{Frame, FrameAnimator, PointerOffset};
use crate::clock::AnimationClock;
use crate::config::ViewerConfig;
use crate::controls::OrbitControls;
use crate::geometry::Mesh;
use crate::loader;
use crate::projection::Camera;
use crate::scene::Scene;

/// A running model viewer driven by a host render loop
///
/// The host calls [`Viewer::pointer_moved`] for pointer events and
/// [`Viewer::frame`] once per display refresh, both from the same thread.
#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    scene: Scene,
    animator: FrameAnimator,
    clock: AnimationClock,
    pointer: PointerOffset,
    camera: Camera,
    controls: Option<OrbitControls>,
    last_frame: Frame,
    running: bool,
}

impl Viewer {
    pub fn new(config: ViewerConfig, model: Mesh) -> Self {
        let config = config.sanitized();
        let animator = FrameAnimator::new(config.animator_config());
        let camera = Camera::default();
        let controls = config
            .enable_controls
            .then(|| OrbitControls::new(config.controls_config(), &camera));
        let scene = Scene::new(model, config.enable_orbiting_sphere);
        let last_frame = crate::animator::animate(
            animator.config(),
            animator.rotation(),
            0.0,
            PointerOffset::center(),
        );

        log::info!(
            "viewer ready: {} triangles, scale {}, tilt {}, orbit {}",
            scene.model.triangle_count(),
            config.scale,
            config.enable_mouse_tilt,
            config.enable_orbiting_sphere
        );

        Self {
            config,
            scene,
            animator,
            clock: AnimationClock::new(),
            pointer: PointerOffset::center(),
            camera,
            controls,
            last_frame,
            running: true,
        }
    }

    /// Load `config.model_url` from disk, falling back to an empty scene
    pub fn load(config: ViewerConfig) -> Self {
        let model = loader::load_or_empty(&config.model_url);
        Self::new(config, model)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.controls.as_mut()
    }

    pub fn pointer(&self) -> PointerOffset {
        self.pointer
    }

    pub fn last_frame(&self) -> &Frame {
        &self.last_frame
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Record the latest pointer position on the `width` x `height` viewer surface
    pub fn pointer_moved(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if !self.config.enable_mouse_tilt {
            return;
        }
        self.pointer = PointerOffset::from_surface(x, y, width, height);
    }

    pub fn set_pointer(&mut self, pointer: PointerOffset) {
        if self.config.enable_mouse_tilt {
            self.pointer = pointer;
        }
    }

    /// Swap in a newly loaded model, keeping clock, smoothing, pointer and camera
    pub fn set_model(&mut self, model: Mesh) {
        log::info!("model replaced: {} triangles", model.triangle_count());
        self.scene.model = model;
    }

    /// Advance to `elapsed` seconds and update every animated handle
    pub fn frame(&mut self, elapsed: f32) -> &Frame {
        if !self.running {
            return &self.last_frame;
        }

        let dt = self.clock.advance_to(elapsed);
        let frame = self.animator.step(self.clock.elapsed(), self.pointer);
        if let Some(satellite) = &frame.satellite {
            self.scene.rebuild_trail(satellite);
        }
        if let Some(controls) = self.controls.as_mut() {
            controls.update(&mut self.camera, dt);
        }

        self.last_frame = frame;
        &self.last_frame
    }

    /// Stop animating and release per-frame geometry
    pub fn teardown(&mut self) {
        if self.running {
            log::debug!(
                "viewer torn down after {} frames",
                self.clock.frame_index()
            );
        }
        self.running = false;
        self.scene.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::{bounce_offset, sway};
    use std::f32::consts::FRAC_PI_4;

    fn orbiting() -> ViewerConfig {
        ViewerConfig {
            enable_orbiting_sphere: true,
            ..ViewerConfig::new("unused.glb")
        }
    }

    #[test]
    fn test_trail_never_leaks_across_frames() {
        let mut viewer = Viewer::new(orbiting(), Mesh::new());
        for i in 0..120 {
            viewer.frame(i as f32 / 60.0);
            assert_eq!(viewer.scene().trail.live(), 1);
        }
        assert_eq!(viewer.scene().trail.built(), 120);

        viewer.teardown();
        assert_eq!(viewer.scene().trail.live(), 0);
    }

    #[test]
    fn test_frames_after_teardown_are_noops() {
        let mut viewer = Viewer::new(orbiting(), Mesh::new());
        let before = viewer.frame(1.0).clone();
        viewer.teardown();
        let after = viewer.frame(2.0).clone();
        assert_eq!(before, after);
        assert!(!viewer.is_running());
        assert_eq!(viewer.scene().trail.built(), 1);
    }

    #[test]
    fn test_pointer_ignored_without_tilt() {
        let config = ViewerConfig {
            enable_mouse_tilt: false,
            ..ViewerConfig::new("unused.glb")
        };
        let mut viewer = Viewer::new(config, Mesh::new());
        viewer.pointer_moved(0.0, 0.0, 100.0, 100.0);
        assert_eq!(viewer.pointer(), PointerOffset::center());

        let frame = viewer.frame(FRAC_PI_4);
        assert!((frame.object.rotation.yaw - sway(FRAC_PI_4)).abs() < 1e-6);
        assert!((frame.object.position.y - bounce_offset(FRAC_PI_4)).abs() < 1e-6);
    }

    #[test]
    fn test_latest_pointer_wins() {
        let mut viewer = Viewer::new(ViewerConfig::new("unused.glb"), Mesh::new());
        viewer.pointer_moved(0.0, 0.0, 100.0, 100.0);
        viewer.pointer_moved(100.0, 100.0, 100.0, 100.0);
        assert_eq!(viewer.pointer(), PointerOffset::new(1.0, -1.0));
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut viewer = Viewer::new(ViewerConfig::new("unused.glb"), Mesh::new());
        viewer.frame(2.0);
        let frame = viewer.frame(1.0).clone();
        assert!((frame.elapsed - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_model_renders_empty_scene() {
        let viewer = Viewer::load(ViewerConfig::new("/no/such/model.glb"));
        assert!(viewer.scene().model.is_empty());
        assert!(viewer.is_running());
    }

    #[test]
    fn test_set_model_keeps_animation_state() {
        let config = ViewerConfig {
            auto_rotate: true,
            ..ViewerConfig::new("unused.glb")
        };
        let mut viewer = Viewer::new(config, Mesh::new());
        viewer.set_pointer(PointerOffset::new(1.0, 1.0));
        viewer.frame(0.0);
        viewer.frame(10.0);
        let rotation = viewer.last_frame().object.rotation;
        let azimuth = viewer.controls_mut().map(|c| c.azimuth()).unwrap();

        viewer.set_model(Mesh::sphere(1.0, 8, 8));
        assert!(!viewer.scene().model.is_empty());
        assert_eq!(viewer.pointer(), PointerOffset::new(1.0, 1.0));

        viewer.frame(10.016);
        let step = viewer.controls_mut().map(|c| c.azimuth()).unwrap() - azimuth;
        assert!((step - 0.016 * std::f32::consts::TAU / 30.0).abs() < 1e-4);
        // Smoothing continues from where it was, not from rest
        assert!(viewer.last_frame().object.rotation.pitch > rotation.pitch);
    }

    #[test]
    fn test_controls_follow_config() {
        let mut viewer = Viewer::new(ViewerConfig::sophos(), Mesh::new());
        assert!(viewer.controls_mut().is_none());

        let mut viewer = Viewer::new(
            ViewerConfig {
                auto_rotate: true,
                ..ViewerConfig::new("unused.glb")
            },
            Mesh::new(),
        );
        viewer.frame(0.0);
        viewer.frame(7.5);
        assert!((viewer.camera().position.x - 5.0).abs() < 1e-3);
    }
}
