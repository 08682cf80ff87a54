/// Geometry primitives for 3D rendering
use nalgebra::{Matrix4, Point3, Vector3};
use std::f32::consts::{PI, TAU};

use crate::curve::ClosedCurve;

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }

    pub fn from_parts(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Triangle whose vertices all carry the computed face normal
    pub fn flat(p0: Point3<f32>, p1: Point3<f32>, p2: Point3<f32>) -> Self {
        let normal = face_normal(&p0, &p1, &p2);
        Self::new(
            Vertex::from_parts(p0, normal),
            Vertex::from_parts(p1, normal),
            Vertex::from_parts(p2, normal),
        )
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        face_normal(
            &self.vertices[0].position,
            &self.vertices[1].position,
            &self.vertices[2].position,
        )
    }

    /// Average of the per-vertex normals, falling back to the face normal
    pub fn shading_normal(&self) -> Vector3<f32> {
        let sum = self.vertices[0].normal + self.vertices[1].normal + self.vertices[2].normal;
        sum.try_normalize(f32::EPSILON)
            .unwrap_or_else(|| self.calculate_normal())
    }
}

/// Normal of a counter-clockwise triangle; zero for degenerate faces
fn face_normal(p0: &Point3<f32>, p1: &Point3<f32>, p2: &Point3<f32>) -> Vector3<f32> {
    let edge1 = p1 - p0;
    let edge2 = p2 - p0;
    edge1
        .cross(&edge2)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        let mut vertices = self.triangles.iter().flat_map(|t| t.vertices.iter());
        let first = vertices.next()?.position;
        let mut bounds = Aabb {
            min: first,
            max: first,
        };
        for vertex in vertices {
            bounds.min = Point3::from(bounds.min.coords.inf(&vertex.position.coords));
            bounds.max = Point3::from(bounds.max.coords.sup(&vertex.position.coords));
        }
        Some(bounds)
    }

    /// Bake a transform into the mesh (normals use the inverse transpose)
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        let normal_matrix = matrix
            .fixed_view::<3, 3>(0, 0)
            .into_owned()
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or_else(nalgebra::Matrix3::identity);

        let triangles = self
            .triangles
            .iter()
            .map(|triangle| {
                let [a, b, c] = triangle.vertices.map(|v| {
                    let normal = (normal_matrix * v.normal)
                        .try_normalize(f32::EPSILON)
                        .unwrap_or(v.normal);
                    Vertex::from_parts(matrix.transform_point(&v.position), normal)
                });
                Triangle::new(a, b, c)
            })
            .collect();
        Self { triangles }
    }

    /// Append another mesh's triangles
    pub fn extend(&mut self, other: Mesh) {
        self.triangles.extend(other.triangles);
    }

    /// Build a mesh from a vertex grid, splitting each `[a, b, c, d]` quad in two
    fn from_grid(grid: &[Vertex], quads: impl Iterator<Item = [usize; 4]>) -> Self {
        let mut mesh = Self::new();
        for [a, b, c, d] in quads {
            mesh.add_triangle(Triangle::new(grid[a], grid[b], grid[d]));
            mesh.add_triangle(Triangle::new(grid[b], grid[c], grid[d]));
        }
        mesh
    }

    /// Create a UV sphere centered at the origin
    pub fn sphere(radius: f32, width_segments: usize, height_segments: usize) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let columns = width_segments + 1;

        let mut grid = Vec::with_capacity(columns * (height_segments + 1));
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let normal = Vector3::new(
                    -(u * TAU).cos() * (v * PI).sin(),
                    (v * PI).cos(),
                    (u * TAU).sin() * (v * PI).sin(),
                );
                grid.push(Vertex::from_parts(Point3::from(normal * radius), normal));
            }
        }

        let mut mesh = Self::with_capacity(width_segments * height_segments * 2);
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = grid[iy * columns + ix + 1];
                let b = grid[iy * columns + ix];
                let c = grid[(iy + 1) * columns + ix];
                let d = grid[(iy + 1) * columns + ix + 1];
                // Pole rows collapse to a single triangle
                if iy != 0 {
                    mesh.add_triangle(Triangle::new(a, b, d));
                }
                if iy != height_segments - 1 {
                    mesh.add_triangle(Triangle::new(b, c, d));
                }
            }
        }
        mesh
    }

    /// Sweep a circular cross-section of `radius` along a closed curve
    pub fn tube(
        curve: &ClosedCurve,
        tubular_segments: usize,
        radius: f32,
        radial_segments: usize,
    ) -> Self {
        let tubular_segments = tubular_segments.max(3);
        let radial_segments = radial_segments.max(3);
        let frames = curve.frenet_frames(tubular_segments, true);
        let columns = radial_segments + 1;

        let mut grid = Vec::with_capacity(columns * (tubular_segments + 1));
        for i in 0..=tubular_segments {
            // The closing ring reuses the first one so the seam is watertight
            let ring = if i == tubular_segments { 0 } else { i };
            let center = curve.point_at(ring as f32 / tubular_segments as f32);
            let normal = frames.normals[ring];
            let binormal = frames.binormals[ring];
            for j in 0..=radial_segments {
                let v = j as f32 / radial_segments as f32 * TAU;
                let direction = (normal * -v.cos() + binormal * v.sin()).normalize();
                grid.push(Vertex::from_parts(center + direction * radius, direction));
            }
        }

        let quads = (1..=tubular_segments).flat_map(move |j| {
            (1..=radial_segments).map(move |i| {
                [
                    columns * (j - 1) + (i - 1),
                    columns * j + (i - 1),
                    columns * j + i,
                    columns * (j - 1) + i,
                ]
            })
        });
        Self::from_grid(&grid, quads)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
