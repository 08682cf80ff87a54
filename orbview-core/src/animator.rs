//! Per-frame animation of the displayed model and its orbiting satellite
//!
//! Everything here is a pure function of elapsed time, pointer offset and the
//! static [`AnimatorConfig`]. The only cross-frame state is the previous
//! rotation, which [`FrameAnimator`] threads into [`animate`] explicitly.

use nalgebra::Point3;
use std::f32::consts::TAU;

use crate::curve::ClosedCurve;
use crate::transform::{ObjectTransform, RotationState};

pub const BOUNCE_AMPLITUDE: f32 = 0.3;
pub const BOUNCE_FREQUENCY: f32 = 2.0;
pub const SWAY_AMPLITUDE: f32 = 0.2;
pub const SWAY_FREQUENCY: f32 = 1.5;
/// Radians of tilt per unit of pointer offset
pub const TILT_GAIN: f32 = 0.05;
/// Fraction of the remaining distance to the target covered each frame
pub const TILT_SMOOTHING: f32 = 0.05;
pub const ORBIT_RADIUS: f32 = 3.0;
/// Satellite angular speed (rad/s)
pub const ORBIT_SPEED: f32 = 0.8;
pub const ORBIT_BOB: f32 = 0.5;
/// Trail samples span `TRAIL_SEGMENTS + 1` points, first and last on the same angle
pub const TRAIL_SEGMENTS: usize = 100;

/// Normalized pointer position relative to the viewer center, Y up
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerOffset {
    pub x: f32,
    pub y: f32,
}

impl PointerOffset {
    /// Clamp into [-1, 1]; non-finite components become 0
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }

    pub fn center() -> Self {
        Self::default()
    }

    /// Normalize a position on a `width` x `height` surface (origin top-left, Y down)
    pub fn from_surface(x: f32, y: f32, width: f32, height: f32) -> Self {
        if !(width > 0.0 && height > 0.0) {
            return Self::center();
        }
        Self::new(x / width * 2.0 - 1.0, -(y / height) * 2.0 + 1.0)
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Static animation parameters, fixed for the life of a viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatorConfig {
    pub scale: f32,
    pub position: Point3<f32>,
    pub tilt_enabled: bool,
    pub orbit_enabled: bool,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            position: Point3::origin(),
            tilt_enabled: true,
            orbit_enabled: false,
        }
    }
}

/// Satellite position plus the samples of its closed trail
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteState {
    pub position: Point3<f32>,
    pub trail: Vec<Point3<f32>>,
}

impl SatelliteState {
    /// Smooth closed interpolation through the trail samples
    pub fn trail_curve(&self) -> ClosedCurve {
        ClosedCurve::new(self.trail.clone())
    }
}

/// Output of one animation step
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub elapsed: f32,
    pub object: ObjectTransform,
    pub satellite: Option<SatelliteState>,
}

pub fn bounce_offset(elapsed: f32) -> f32 {
    BOUNCE_AMPLITUDE * (elapsed * BOUNCE_FREQUENCY).sin()
}

/// Baseline yaw oscillation, applied whether or not the pointer tilts the model
pub fn sway(elapsed: f32) -> f32 {
    SWAY_AMPLITUDE * (elapsed * SWAY_FREQUENCY).sin()
}

pub fn orbit_angle(elapsed: f32) -> f32 {
    elapsed * ORBIT_SPEED
}

/// Rotation the pointer is steering toward this frame
pub fn tilt_target(elapsed: f32, pointer: PointerOffset) -> RotationState {
    RotationState::new(pointer.y * TILT_GAIN, pointer.x * TILT_GAIN + sway(elapsed))
}

pub fn satellite_position(base: Point3<f32>, elapsed: f32) -> Point3<f32> {
    let angle = orbit_angle(elapsed);
    Point3::new(
        base.x + angle.cos() * ORBIT_RADIUS,
        base.y + bounce_offset(elapsed) + (angle * 2.0).sin() * ORBIT_BOB,
        base.z + angle.sin() * ORBIT_RADIUS,
    )
}

/// Trail samples around the full orbit, all lifted by the current bounce
pub fn trail_samples(base: Point3<f32>, elapsed: f32) -> Vec<Point3<f32>> {
    let lift = bounce_offset(elapsed);
    (0..=TRAIL_SEGMENTS)
        .map(|i| {
            let angle = i as f32 / TRAIL_SEGMENTS as f32 * TAU;
            Point3::new(
                base.x + angle.cos() * ORBIT_RADIUS,
                base.y + lift + (angle * 2.0).sin() * ORBIT_BOB,
                base.z + angle.sin() * ORBIT_RADIUS,
            )
        })
        .collect()
}

/// Compute one frame from the previous rotation, elapsed time and pointer
pub fn animate(
    config: &AnimatorConfig,
    previous: RotationState,
    elapsed: f32,
    pointer: PointerOffset,
) -> Frame {
    let base = config.position;
    let position = Point3::new(base.x, base.y + bounce_offset(elapsed), base.z);

    let rotation = if config.tilt_enabled {
        previous.lerp_toward(tilt_target(elapsed, pointer), TILT_SMOOTHING)
    } else {
        // Yaw tracks the sway exactly; pitch keeps whatever it had
        RotationState::new(previous.pitch, sway(elapsed))
    };

    let satellite = config.orbit_enabled.then(|| SatelliteState {
        position: satellite_position(base, elapsed),
        trail: trail_samples(base, elapsed),
    });

    Frame {
        elapsed,
        object: ObjectTransform::new(position, rotation, config.scale),
        satellite,
    }
}

/// Drives [`animate`] frame after frame, carrying the smoothed rotation
#[derive(Debug, Clone)]
pub struct FrameAnimator {
    config: AnimatorConfig,
    rotation: RotationState,
}

impl FrameAnimator {
    pub fn new(config: AnimatorConfig) -> Self {
        Self {
            config,
            rotation: RotationState::zero(),
        }
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    pub fn reset(&mut self) {
        self.rotation = RotationState::zero();
    }

    pub fn step(&mut self, elapsed: f32, pointer: PointerOffset) -> Frame {
        let frame = animate(&self.config, self.rotation, elapsed, pointer);
        self.rotation = frame.object.rotation;
        log::trace!(
            "frame t={:.3} y={:.3} pitch={:.4} yaw={:.4}",
            elapsed,
            frame.object.position.y,
            frame.object.rotation.pitch,
            frame.object.rotation.yaw
        );
        frame
    }
}
