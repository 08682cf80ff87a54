/// orbview Web - WASM bindings for the model viewer
///
/// The host page owns the WebGL context. This module runs the animation and
/// camera in Rust and hands matrices and vertex data back to JavaScript once
/// per `requestAnimationFrame`.
use nalgebra::Matrix4;
use orbview_core::loader::{self, ModelFormat};
use orbview_core::{ConfigError, Mesh, Transform, Viewer, ViewerConfig};
use std::path::Path;
use wasm_bindgen::prelude::*;

fn js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn matrix_to_vec(matrix: &Matrix4<f32>) -> Vec<f32> {
    // Column-major, as WebGL expects
    matrix.as_slice().to_vec()
}

#[derive(Debug, Clone, Copy)]
struct SurfaceRect {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

#[wasm_bindgen]
pub struct WebViewer {
    viewer: Viewer,
    surface: Option<SurfaceRect>,
}

#[wasm_bindgen]
impl WebViewer {
    /// Create a viewer from a JSON configuration (`modelUrl`, `scale`, ...)
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WebViewer, JsValue> {
        Self::from_config_json(config_json).map_err(js_error)
    }

    /// Replace the model with the fetched bytes of `modelUrl`
    ///
    /// Returns false when the bytes could not be parsed; the viewer keeps
    /// animating an empty scene.
    pub fn load_model(&mut self, bytes: &[u8]) -> bool {
        let hint = ModelFormat::from_extension(Path::new(&self.viewer.config().model_url));
        let mesh = loader::parse_or_empty(bytes, hint);
        let loaded = !mesh.is_empty();
        self.viewer.set_model(mesh);
        loaded
    }

    /// Bind pointer coordinates to the canvas with this element id
    pub fn attach(&mut self, canvas_id: &str) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| js_error("no window"))?;
        let document = window.document().ok_or_else(|| js_error("no document"))?;
        let element = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| js_error(format!("no element with id '{}'", canvas_id)))?;
        let rect = element.get_bounding_client_rect();

        let surface = SurfaceRect {
            left: rect.left() as f32,
            top: rect.top() as f32,
            width: rect.width() as f32,
            height: rect.height() as f32,
        };
        self.viewer
            .camera_mut()
            .set_viewport(surface.width, surface.height);
        self.surface = Some(surface);
        log::debug!("attached to #{} ({}x{})", canvas_id, surface.width, surface.height);
        Ok(())
    }

    /// Forward a `mousemove` event in client coordinates
    pub fn pointer_moved(&mut self, client_x: f32, client_y: f32) {
        let Some(surface) = self.surface else {
            return;
        };
        self.viewer.pointer_moved(
            client_x - surface.left,
            client_y - surface.top,
            surface.width,
            surface.height,
        );
    }

    /// Orbit the camera by a drag delta in pixels
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        let (width, height) = self
            .surface
            .map_or((1.0, 1.0), |s| (s.width.max(1.0), s.height.max(1.0)));
        if let Some(controls) = self.viewer.controls_mut() {
            let tau = std::f32::consts::TAU;
            controls.rotate(-tau * dx / width, -tau * dy / height);
        }
    }

    pub fn zoom(&mut self, factor: f32) {
        if let Some(controls) = self.viewer.controls_mut() {
            controls.zoom(factor);
        }
    }

    /// Advance the animation to `elapsed` seconds
    pub fn frame(&mut self, elapsed: f32) {
        self.viewer.frame(elapsed);
    }

    pub fn object_matrix(&self) -> Vec<f32> {
        matrix_to_vec(&self.viewer.last_frame().object.model_matrix())
    }

    pub fn view_projection(&self) -> Vec<f32> {
        matrix_to_vec(&self.viewer.camera().view_projection())
    }

    /// World-space satellite placement matrix, empty when there is no satellite
    pub fn satellite_matrix(&self) -> Vec<f32> {
        self.viewer
            .last_frame()
            .satellite
            .as_ref()
            .map(|s| {
                let p = s.position;
                matrix_to_vec(&Transform::translation_matrix(p.x, p.y, p.z))
            })
            .unwrap_or_default()
    }

    pub fn satellite_position(&self) -> Vec<f32> {
        self.viewer
            .last_frame()
            .satellite
            .as_ref()
            .map(|s| vec![s.position.x, s.position.y, s.position.z])
            .unwrap_or_default()
    }

    /// Interleaved position and normal triangles of the model in model space
    pub fn model_vertices(&self) -> Vec<f32> {
        interleave(&self.viewer.scene().model)
    }

    pub fn satellite_vertices(&self) -> Vec<f32> {
        self.viewer
            .scene()
            .satellite
            .as_ref()
            .map(interleave)
            .unwrap_or_default()
    }

    /// Interleaved trail tube for the current frame, in world space
    pub fn trail_vertices(&self) -> Vec<f32> {
        self.viewer
            .scene()
            .trail
            .mesh()
            .map(interleave)
            .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.viewer.is_running()
    }

    /// Stop animating and release the trail; later frames are no-ops
    pub fn dispose(&mut self) {
        self.viewer.teardown();
    }
}

impl WebViewer {
    fn from_config_json(config_json: &str) -> Result<Self, ConfigError> {
        let config = ViewerConfig::from_json_str(config_json)?;
        Ok(Self {
            viewer: Viewer::new(config, Mesh::new()),
            surface: None,
        })
    }
}

fn interleave(mesh: &Mesh) -> Vec<f32> {
    let mut out = Vec::with_capacity(mesh.triangle_count() * 18);
    for triangle in &mesh.triangles {
        for vertex in &triangle.vertices {
            out.extend_from_slice(vertex.position.coords.as_slice());
            out.extend_from_slice(vertex.normal.as_slice());
        }
    }
    out
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    log::info!("orbview web module loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{"modelUrl": "logo.stl", "enableOrbitingSphere": true}"#;

    const TRIANGLE: &str = "solid t
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 0 0
vertex 0 1 0
endloop
endfacet
endsolid t
";

    #[test]
    fn test_config_errors_are_reported() {
        assert!(matches!(
            WebViewer::from_config_json("{"),
            Err(ConfigError::Json(_))
        ));
        assert!(WebViewer::from_config_json(CONFIG).is_ok());
    }

    #[test]
    fn test_load_model_and_export_buffers() {
        let mut web = WebViewer::from_config_json(CONFIG).unwrap();
        assert!(web.load_model(TRIANGLE.as_bytes()));
        assert_eq!(web.model_vertices().len(), 18);

        web.frame(0.5);
        assert_eq!(web.object_matrix().len(), 16);
        assert_eq!(web.view_projection().len(), 16);
        assert_eq!(web.satellite_position().len(), 3);
        assert_eq!(web.satellite_matrix().len(), 16);
        assert!(!web.trail_vertices().is_empty());
        assert!(!web.satellite_vertices().is_empty());
    }

    #[test]
    fn test_loading_mid_session_keeps_camera_motion() {
        let json = r#"{"modelUrl": "logo.stl", "autoRotate": true}"#;
        let mut web = WebViewer::from_config_json(json).unwrap();
        web.frame(0.0);
        web.orbit(-0.1, 0.0);
        web.frame(10.0);
        let azimuth = web.viewer.controls_mut().map(|c| c.azimuth()).unwrap();
        let position = web.viewer.camera().position;

        assert!(web.load_model(TRIANGLE.as_bytes()));
        assert_eq!(web.viewer.camera().position, position);

        web.frame(10.016);
        let step = web.viewer.controls_mut().map(|c| c.azimuth()).unwrap() - azimuth;
        assert!((step - 0.016 * std::f32::consts::TAU / 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_bad_bytes_leave_empty_scene() {
        let mut web = WebViewer::from_config_json(CONFIG).unwrap();
        assert!(!web.load_model(&[1, 2, 3]));
        web.frame(0.1);
        assert!(web.model_vertices().is_empty());
        assert!(web.is_running());
    }

    #[test]
    fn test_pointer_ignored_until_attached() {
        let mut web = WebViewer::from_config_json(CONFIG).unwrap();
        web.pointer_moved(10_000.0, 10_000.0);
        web.frame(1.0);
        let first = web.object_matrix();

        let mut centered = WebViewer::from_config_json(CONFIG).unwrap();
        centered.frame(1.0);
        assert_eq!(first, centered.object_matrix());
    }

    #[test]
    fn test_dispose_releases_trail() {
        let mut web = WebViewer::from_config_json(CONFIG).unwrap();
        web.frame(0.2);
        web.dispose();
        assert!(!web.is_running());
        assert!(web.trail_vertices().is_empty());
        web.frame(0.4);
        assert!(web.trail_vertices().is_empty());
    }
}
