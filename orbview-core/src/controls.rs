/// Orbit camera controls: rotate, zoom and pan around a target point
use nalgebra::{Point3, Vector3};
use std::f32::consts::{PI, TAU};

use crate::projection::Camera;

const POLAR_EPSILON: f32 = 1e-6;
const MIN_DISTANCE: f32 = 0.1;
const MAX_DISTANCE: f32 = 1000.0;
/// Auto-rotation speed; 2.0 is one full turn every 30 seconds
pub const DEFAULT_AUTO_ROTATE_SPEED: f32 = 2.0;

/// Which interactions the orbit controls accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlsConfig {
    pub enabled: bool,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub enable_rotate: bool,
    pub auto_rotate: bool,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_pan: true,
            enable_zoom: true,
            enable_rotate: true,
            auto_rotate: false,
        }
    }
}

/// Spherical camera rig orbiting a target
#[derive(Debug, Clone)]
pub struct OrbitControls {
    config: ControlsConfig,
    pub auto_rotate_speed: f32,
    target: Point3<f32>,
    radius: f32,
    /// Azimuth around +Y, measured from +Z
    theta: f32,
    /// Polar angle from +Y
    phi: f32,
    home: (Point3<f32>, f32, f32, f32),
}

impl OrbitControls {
    /// Capture the camera's current placement as the orbit state
    pub fn new(config: ControlsConfig, camera: &Camera) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.norm().clamp(MIN_DISTANCE, MAX_DISTANCE);
        let theta = offset.x.atan2(offset.z);
        let phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        let phi = clamp_polar(phi);

        Self {
            config,
            auto_rotate_speed: DEFAULT_AUTO_ROTATE_SPEED,
            target: camera.target,
            radius,
            theta,
            phi,
            home: (camera.target, radius, theta, phi),
        }
    }

    pub fn config(&self) -> ControlsConfig {
        self.config
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn azimuth(&self) -> f32 {
        self.theta
    }

    pub fn polar(&self) -> f32 {
        self.phi
    }

    /// Orbit by azimuth and polar deltas (radians)
    pub fn rotate(&mut self, d_theta: f32, d_phi: f32) {
        if !(self.config.enabled && self.config.enable_rotate) {
            return;
        }
        self.theta = (self.theta + d_theta).rem_euclid(TAU);
        self.phi = clamp_polar(self.phi + d_phi);
    }

    /// Scale the orbit distance; factors below 1 move the camera closer
    pub fn zoom(&mut self, factor: f32) {
        if !(self.config.enabled && self.config.enable_zoom) || !factor.is_finite() || factor <= 0.0
        {
            return;
        }
        self.radius = (self.radius * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Slide the target in the camera's screen plane, in world units scaled by distance
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !(self.config.enabled && self.config.enable_pan) {
            return;
        }
        let forward = -self.offset().normalize();
        let right = forward
            .cross(&Vector3::y())
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::x);
        let up = right.cross(&forward);
        self.target += (right * dx + up * dy) * self.radius;
    }

    pub fn reset(&mut self) {
        let (target, radius, theta, phi) = self.home;
        self.target = target;
        self.radius = radius;
        self.theta = theta;
        self.phi = phi;
    }

    /// Advance auto-rotation by `dt` seconds and write the orbit into `camera`
    pub fn update(&mut self, camera: &mut Camera, dt: f32) {
        if self.config.enabled && self.config.auto_rotate && dt.is_finite() && dt > 0.0 {
            let step = TAU / 60.0 * self.auto_rotate_speed * dt;
            self.theta = (self.theta + step).rem_euclid(TAU);
        }
        camera.target = self.target;
        camera.position = self.target + self.offset();
    }

    fn offset(&self) -> Vector3<f32> {
        let sin_phi = self.phi.sin();
        Vector3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

fn clamp_polar(phi: f32) -> f32 {
    phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON)
}
