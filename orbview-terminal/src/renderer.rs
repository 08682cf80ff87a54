/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3};
use orbview_core::{Camera, Lighting, Mesh, Triangle};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// How shaded cells are colored
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Palette {
    /// Color follows the luminosity character
    Ramp,
    /// Every cell of the mesh uses one color
    Solid(Color),
}

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Color>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![Color::Reset; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Color::Reset);
    }

    /// Character written at a cell, mainly for inspection
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    pub fn render_mesh(
        &mut self,
        mesh: &Mesh,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        lighting: &Lighting,
        palette: Palette,
    ) {
        // One MVP per mesh instead of per vertex
        let mvp = camera.view_projection() * model_matrix;
        for triangle in &mesh.triangles {
            self.render_triangle(triangle, model_matrix, &mvp, lighting, palette);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model_matrix: &Matrix4<f32>,
        mvp: &Matrix4<f32>,
        lighting: &Lighting,
        palette: Palette,
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match project(mvp, &vertex.position, self.width, self.height) {
                Some(coords) => *slot = coords,
                None => return, // Triangle is clipped
            }
        }

        // Shade in world space
        let normal = model_matrix.transform_vector(&triangle.shading_normal());
        let [a, b, c] = triangle.vertices.map(|v| v.position.coords);
        let centroid = model_matrix.transform_point(&Point3::from((a + b + c) / 3.0));
        let brightness = lighting.shade(&normal, &centroid);

        // Map brightness to character, never fully blank
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
        let character = LUMINOSITY_RAMP[char_index];
        let color = match palette {
            Palette::Ramp => ramp_color(character),
            Palette::Solid(color) => color,
        };

        // Rasterize triangle using scanline algorithm
        self.rasterize_triangle(&screen_coords, character, color);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char, color: Color) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    // Interpolate depth
                    let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                    let idx = y as usize * self.width + x as usize;
                    if depth < self.depth_buffer[idx] {
                        self.depth_buffer[idx] = depth;
                        self.char_buffer[idx] = character;
                        self.color_buffer[idx] = color;
                    }
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = None;
        for y in 0..self.height {
            // Raw mode does not return the carriage on '\n'
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let idx = y * self.width + x;
                let color = self.color_buffer[idx];
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(self.char_buffer[idx]))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn ramp_color(c: char) -> Color {
    // Color based on character intensity
    match c {
        ' ' | '.' | ':' => Color::DarkGrey,
        '-' | '=' => Color::Grey,
        '+' | '*' => Color::White,
        '#' | '%' | '@' => Color::Cyan,
        _ => Color::White,
    }
}

/// Project a model-space point through `mvp` into cell coordinates
fn project(
    mvp: &Matrix4<f32>,
    point: &Point3<f32>,
    width: usize,
    height: usize,
) -> Option<(f32, f32, f32)> {
    let clip = mvp * point.to_homogeneous();
    if clip.w <= 1e-6 {
        return None;
    }
    let (x, y, z) = (clip.x / clip.w, clip.y / clip.w, clip.z / clip.w);
    if !(-1.0..=1.0).contains(&z) {
        return None;
    }
    // Partially visible triangles are kept; the bounding box is clipped later
    Some((
        (x + 1.0) * 0.5 * width as f32,
        (1.0 - y) * 0.5 * height as f32,
        z,
    ))
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facing_quad(z: f32, half: f32) -> Mesh {
        let p = |x: f32, y: f32| Point3::new(x, y, z);
        let mut mesh = Mesh::new();
        mesh.add_triangle(Triangle::flat(p(-half, -half), p(half, -half), p(half, half)));
        mesh.add_triangle(Triangle::flat(p(-half, -half), p(half, half), p(-half, half)));
        mesh
    }

    #[test]
    fn test_quad_covers_center_cell() {
        let mut renderer = AsciiRenderer::new(40, 20);
        let camera = Camera::new(40, 20);
        renderer.render_mesh(
            &facing_quad(0.0, 1.0),
            &Matrix4::identity(),
            &camera,
            &Lighting::viewer_rig(),
            Palette::Ramp,
        );
        assert_ne!(renderer.cell(20, 10), Some(' '));
        assert_eq!(renderer.cell(0, 0), Some(' '));
        assert_eq!(renderer.cell(40, 0), None);
    }

    #[test]
    fn test_nearer_mesh_wins_depth_test() {
        let mut renderer = AsciiRenderer::new(40, 20);
        let camera = Camera::new(40, 20);
        let rig = Lighting::viewer_rig();
        renderer.render_mesh(
            &facing_quad(1.0, 0.5),
            &Matrix4::identity(),
            &camera,
            &rig,
            Palette::Solid(Color::Magenta),
        );
        renderer.render_mesh(
            &facing_quad(-1.0, 2.0),
            &Matrix4::identity(),
            &camera,
            &rig,
            Palette::Solid(Color::Green),
        );
        assert_eq!(renderer.color_buffer[10 * 40 + 20], Color::Magenta);
    }

    #[test]
    fn test_clear_resets_buffers() {
        let mut renderer = AsciiRenderer::new(10, 10);
        let camera = Camera::new(10, 10);
        renderer.render_mesh(
            &facing_quad(0.0, 3.0),
            &Matrix4::identity(),
            &camera,
            &Lighting::viewer_rig(),
            Palette::Ramp,
        );
        renderer.clear();
        assert!((0..10).all(|y| (0..10).all(|x| renderer.cell(x, y) == Some(' '))));
    }

    #[test]
    fn test_draw_writes_every_cell() {
        let renderer = AsciiRenderer::new(4, 2);
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(' ').count(), 8);
    }
}
