/// 3D transformation matrices, rotation state and object transforms
use nalgebra::{Matrix4, Point3, Vector3};

/// Pitch/yaw rotation of a displayed object (in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    /// Rotation about the X axis
    pub pitch: f32,
    /// Rotation about the Y axis
    pub yaw: f32,
}

impl RotationState {
    pub fn new(pitch: f32, yaw: f32) -> Self {
        Self { pitch, yaw }
    }

    pub fn zero() -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
        }
    }

    /// Move each component a fraction `factor` of the way toward `target`
    pub fn lerp_toward(&self, target: RotationState, factor: f32) -> Self {
        Self {
            pitch: lerp(self.pitch, target.pitch, factor),
            yaw: lerp(self.yaw, target.yaw, factor),
        }
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

pub fn lerp(from: f32, to: f32, factor: f32) -> f32 {
    from + factor * (to - from)
}

/// World placement of the primary displayed object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransform {
    pub position: Point3<f32>,
    pub rotation: RotationState,
    pub scale: f32,
}

impl ObjectTransform {
    pub fn new(position: Point3<f32>, rotation: RotationState, scale: f32) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Model matrix: translate, then rotate (XYZ order), then scale
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::translation_matrix(self.position.x, self.position.y, self.position.z)
            * Transform::rotation_matrix(&self.rotation)
            * Transform::scale_matrix(self.scale, self.scale, self.scale)
    }
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self::new(Point3::origin(), RotationState::zero(), 1.0)
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a rotation matrix from a rotation state
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.pitch, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.yaw, 0.0));

        // Euler XYZ: the X rotation is applied last
        rx * ry
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}
