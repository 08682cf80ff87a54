/// Light rig and surface materials for the model viewer
use nalgebra::{Point3, Vector3};

/// A light contributing to diffuse shading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient { intensity: f32 },
    /// Shines from `position` toward the origin
    Directional { position: Point3<f32>, intensity: f32 },
    Point { position: Point3<f32>, intensity: f32 },
}

impl Light {
    pub fn intensity(&self) -> f32 {
        match *self {
            Light::Ambient { intensity }
            | Light::Directional { intensity, .. }
            | Light::Point { intensity, .. } => intensity,
        }
    }
}

/// Collection of lights with normalized Lambert shading
#[derive(Debug, Clone)]
pub struct Lighting {
    pub lights: Vec<Light>,
}

impl Lighting {
    pub fn new(lights: Vec<Light>) -> Self {
        Self { lights }
    }

    /// The rig used by the viewer page: soft ambient plus three key lights and a fill
    pub fn viewer_rig() -> Self {
        Self::new(vec![
            Light::Ambient { intensity: 0.8 },
            Light::Directional {
                position: Point3::new(10.0, 10.0, 5.0),
                intensity: 1.2,
            },
            Light::Directional {
                position: Point3::new(-10.0, -10.0, -5.0),
                intensity: 0.8,
            },
            Light::Directional {
                position: Point3::new(0.0, 10.0, 0.0),
                intensity: 0.6,
            },
            Light::Point {
                position: Point3::new(0.0, 0.0, 10.0),
                intensity: 0.5,
            },
        ])
    }

    /// Brightness in [0, 1] of a surface with world-space `normal` at `position`
    ///
    /// The sum of all contributions is divided by the total rig intensity, so a
    /// surface facing every light at once reaches exactly 1.
    pub fn shade(&self, normal: &Vector3<f32>, position: &Point3<f32>) -> f32 {
        let total: f32 = self.lights.iter().map(Light::intensity).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let normal = match normal.try_normalize(f32::EPSILON) {
            Some(n) => n,
            None => return 0.0,
        };

        let lit: f32 = self
            .lights
            .iter()
            .map(|light| match *light {
                Light::Ambient { intensity } => intensity,
                Light::Directional {
                    position: from,
                    intensity,
                } => lambert(&normal, &from.coords) * intensity,
                Light::Point {
                    position: from,
                    intensity,
                } => lambert(&normal, &(from - position)) * intensity,
            })
            .sum();

        (lit / total).clamp(0.0, 1.0)
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::viewer_rig()
    }
}

fn lambert(normal: &Vector3<f32>, to_light: &Vector3<f32>) -> f32 {
    to_light
        .try_normalize(f32::EPSILON)
        .map_or(0.0, |dir| normal.dot(&dir).max(0.0))
}

/// Surface appearance of a scene object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// sRGB base color
    pub color: [u8; 3],
    pub opacity: f32,
    pub roughness: f32,
    pub metalness: f32,
}

impl Material {
    /// Model files carry no material we read, so they render in plain white
    pub fn model() -> Self {
        Self {
            color: [0xff, 0xff, 0xff],
            opacity: 1.0,
            roughness: 1.0,
            metalness: 0.0,
        }
    }

    pub fn satellite() -> Self {
        Self {
            color: [0x00, 0x00, 0x00],
            opacity: 1.0,
            roughness: 0.3,
            metalness: 0.7,
        }
    }

    pub fn trail() -> Self {
        Self {
            color: [0x00, 0x00, 0x00],
            opacity: 0.8,
            roughness: 1.0,
            metalness: 0.0,
        }
    }
}
