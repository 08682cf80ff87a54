/// Closed space curves through sampled control points
use nalgebra::{Point3, Rotation3, Unit, Vector3};

/// Chord exponent for centripetal parameterization (applied to squared distances)
const CENTRIPETAL_POWER: f32 = 0.25;
/// Chord lengths below this are treated as degenerate spans
const MIN_CHORD: f32 = 1e-4;
/// Parameter step used for numeric tangents
const TANGENT_DELTA: f32 = 1e-4;

/// Smooth closed Catmull-Rom curve interpolating its control points
#[derive(Debug, Clone)]
pub struct ClosedCurve {
    points: Vec<Point3<f32>>,
}

/// Orthonormal frames sampled along a curve
#[derive(Debug, Clone)]
pub struct FrenetFrames {
    pub tangents: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub binormals: Vec<Vector3<f32>>,
}

impl ClosedCurve {
    pub fn new(points: Vec<Point3<f32>>) -> Self {
        Self { points }
    }

    pub fn control_points(&self) -> &[Point3<f32>] {
        &self.points
    }

    /// Evaluate the curve at `u` in [0, 1]; the loop closes so `point_at(0) == point_at(1)`
    pub fn point_at(&self, u: f32) -> Point3<f32> {
        let count = self.points.len();
        match count {
            0 => return Point3::origin(),
            1 => return self.points[0],
            _ => {}
        }

        let p = count as f32 * u.clamp(0.0, 1.0);
        let mut index = p.floor() as usize;
        let mut weight = p - p.floor();
        if index >= count {
            index = 0;
            weight = 0.0;
        }

        let p0 = self.points[(index + count - 1) % count];
        let p1 = self.points[index];
        let p2 = self.points[(index + 1) % count];
        let p3 = self.points[(index + 2) % count];

        let mut dt1 = (p2 - p1).norm_squared().powf(CENTRIPETAL_POWER);
        let mut dt0 = (p1 - p0).norm_squared().powf(CENTRIPETAL_POWER);
        let mut dt2 = (p3 - p2).norm_squared().powf(CENTRIPETAL_POWER);
        if dt1 < MIN_CHORD {
            dt1 = 1.0;
        }
        if dt0 < MIN_CHORD {
            dt0 = dt1;
        }
        if dt2 < MIN_CHORD {
            dt2 = dt1;
        }

        Point3::new(
            nonuniform_catmull_rom(p0.x, p1.x, p2.x, p3.x, dt0, dt1, dt2, weight),
            nonuniform_catmull_rom(p0.y, p1.y, p2.y, p3.y, dt0, dt1, dt2, weight),
            nonuniform_catmull_rom(p0.z, p1.z, p2.z, p3.z, dt0, dt1, dt2, weight),
        )
    }

    /// Unit tangent at `u`, by central difference wrapping around the loop
    pub fn tangent_at(&self, u: f32) -> Vector3<f32> {
        let before = wrap_unit(u - TANGENT_DELTA);
        let after = wrap_unit(u + TANGENT_DELTA);
        let delta = self.point_at(after) - self.point_at(before);
        delta.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::x)
    }

    /// Parallel-transport frames at `segments + 1` evenly spaced parameters
    ///
    /// When `closed` is set the accumulated twist between the first and last
    /// normal is spread evenly over the segments so the frames meet.
    pub fn frenet_frames(&self, segments: usize, closed: bool) -> FrenetFrames {
        let segments = segments.max(1);
        let tangents: Vec<Vector3<f32>> = (0..=segments)
            .map(|i| self.tangent_at(i as f32 / segments as f32))
            .collect();

        let mut normals = Vec::with_capacity(segments + 1);
        let mut binormals = Vec::with_capacity(segments + 1);

        let first_normal = initial_normal(&tangents[0]);
        normals.push(first_normal);
        binormals.push(tangents[0].cross(&first_normal));

        for i in 1..=segments {
            let mut normal = normals[i - 1];
            let axis = tangents[i - 1].cross(&tangents[i]);
            if axis.norm() > f32::EPSILON {
                let angle = tangents[i - 1].dot(&tangents[i]).clamp(-1.0, 1.0).acos();
                let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(axis), angle);
                normal = rotation * normal;
            }
            normals.push(normal);
            binormals.push(tangents[i].cross(&normal));
        }

        if closed {
            let mut theta =
                normals[0].dot(&normals[segments]).clamp(-1.0, 1.0).acos() / segments as f32;
            if tangents[0].dot(&normals[0].cross(&normals[segments])) > 0.0 {
                theta = -theta;
            }
            for i in 1..=segments {
                let rotation =
                    Rotation3::from_axis_angle(&Unit::new_normalize(tangents[i]), theta * i as f32);
                normals[i] = rotation * normals[i];
                binormals[i] = tangents[i].cross(&normals[i]);
            }
        }

        FrenetFrames {
            tangents,
            normals,
            binormals,
        }
    }
}

fn wrap_unit(u: f32) -> f32 {
    u.rem_euclid(1.0)
}

/// Normal perpendicular to `tangent`, seeded from its smallest component axis
fn initial_normal(tangent: &Vector3<f32>) -> Vector3<f32> {
    let (tx, ty, tz) = (tangent.x.abs(), tangent.y.abs(), tangent.z.abs());
    let mut min = f32::MAX;
    let mut seed = Vector3::x();
    if tx <= min {
        min = tx;
        seed = Vector3::x();
    }
    if ty <= min {
        min = ty;
        seed = Vector3::y();
    }
    if tz <= min {
        seed = Vector3::z();
    }

    let side = tangent.cross(&seed).normalize();
    tangent.cross(&side)
}

#[allow(clippy::too_many_arguments)]
fn nonuniform_catmull_rom(
    x0: f32,
    x1: f32,
    x2: f32,
    x3: f32,
    dt0: f32,
    dt1: f32,
    dt2: f32,
    t: f32,
) -> f32 {
    let t1 = ((x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1) * dt1;
    let t2 = ((x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2) * dt1;

    // Cubic Hermite between x1 and x2
    let c0 = x1;
    let c1 = t1;
    let c2 = -3.0 * x1 + 3.0 * x2 - 2.0 * t1 - t2;
    let c3 = 2.0 * x1 - 2.0 * x2 + t1 + t2;
    c0 + t * (c1 + t * (c2 + t * c3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn circle(count: usize) -> ClosedCurve {
        let points = (0..count)
            .map(|i| {
                let angle = i as f32 / count as f32 * TAU;
                Point3::new(angle.cos() * 3.0, 0.0, angle.sin() * 3.0)
            })
            .collect();
        ClosedCurve::new(points)
    }

    #[test]
    fn test_curve_is_closed() {
        let curve = circle(16);
        assert!((curve.point_at(0.0) - curve.point_at(1.0)).norm() < 1e-5);
    }

    #[test]
    fn test_curve_interpolates_control_points() {
        let curve = circle(8);
        for (i, point) in curve.control_points().iter().enumerate() {
            let at = curve.point_at(i as f32 / 8.0);
            assert!((at - point).norm() < 1e-4, "control point {i} missed");
        }
    }

    #[test]
    fn test_duplicated_endpoint_is_tolerated() {
        let mut points: Vec<_> = circle(10).control_points().to_vec();
        points.push(points[0]);
        let curve = ClosedCurve::new(points);
        for i in 0..=50 {
            let p = curve.point_at(i as f32 / 50.0);
            assert!(p.coords.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn test_frenet_frames_are_orthonormal() {
        let frames = circle(32).frenet_frames(64, true);
        assert_eq!(frames.tangents.len(), 65);
        for i in 0..frames.tangents.len() {
            let (t, n, b) = (frames.tangents[i], frames.normals[i], frames.binormals[i]);
            assert!(t.dot(&n).abs() < 1e-3);
            assert!(t.dot(&b).abs() < 1e-3);
            assert!((n.norm() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_degenerate_curves() {
        assert_eq!(ClosedCurve::new(Vec::new()).point_at(0.5), Point3::origin());
        let single = ClosedCurve::new(vec![Point3::new(1.0, 2.0, 3.0)]);
        assert_eq!(single.point_at(0.7), Point3::new(1.0, 2.0, 3.0));
    }
}
