/// Terminal host for the orbview model viewer
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use nalgebra::Matrix4;
use orbview_core::{Transform, Viewer};
use std::f32::consts::TAU;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod cli;
pub mod logging;
pub mod renderer;

pub use renderer::{AsciiRenderer, Palette};

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 0.5;
const KEY_ROTATE_STEP: f32 = 0.1;
const KEY_PAN_STEP: f32 = 0.05;
/// Zoom factor per scroll notch or key press
const ZOOM_STEP: f32 = 0.95;
const SATELLITE_COLOR: Color = Color::Magenta;
const TRAIL_COLOR: Color = Color::DarkMagenta;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    viewer: Viewer,
    renderer: AsciiRenderer,
    running: bool,
    started: Instant,
    target_fps: u32,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
    drag: Option<(MouseButton, u16, u16)>,
}

impl TerminalApp {
    pub fn new(viewer: Viewer, target_fps: u32) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let mut app = Self {
            viewer,
            renderer: AsciiRenderer::new(width as usize, height as usize),
            running: true,
            started: Instant::now(),
            target_fps: target_fps.max(1),
            last_fps_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            drag: None,
        };
        app.resize(width, height);
        Ok(app)
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        )?;

        let result = self.main_loop();

        // Cleanup
        self.viewer.teardown();
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_secs(1) / self.target_fps;
        self.started = Instant::now();

        while self.running {
            let frame_start = Instant::now();

            // Handle every pending event; only the latest pointer position matters
            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            // Update
            self.update();

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_fps_sample).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps_sample).as_secs_f32();
                self.frame_count = 0;
                self.last_fps_sample = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if kind == KeyEventKind::Release {
            return;
        }
        if matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
            self.running = false;
            return;
        }

        let Some(controls) = self.viewer.controls_mut() else {
            return;
        };
        match code {
            KeyCode::Left => controls.rotate(-KEY_ROTATE_STEP, 0.0),
            KeyCode::Right => controls.rotate(KEY_ROTATE_STEP, 0.0),
            KeyCode::Up => controls.rotate(0.0, -KEY_ROTATE_STEP),
            KeyCode::Down => controls.rotate(0.0, KEY_ROTATE_STEP),
            KeyCode::Char('w') => controls.pan(0.0, KEY_PAN_STEP),
            KeyCode::Char('s') => controls.pan(0.0, -KEY_PAN_STEP),
            KeyCode::Char('a') => controls.pan(-KEY_PAN_STEP, 0.0),
            KeyCode::Char('d') => controls.pan(KEY_PAN_STEP, 0.0),
            KeyCode::Char('+') | KeyCode::Char('=') => controls.zoom(ZOOM_STEP),
            KeyCode::Char('-') => controls.zoom(1.0 / ZOOM_STEP),
            KeyCode::Char('r') => controls.reset(),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        let (width, height) = (self.renderer.width() as f32, self.renderer.height() as f32);

        // Cell centers, so the middle cell maps close to an offset of zero
        self.viewer
            .pointer_moved(column as f32 + 0.5, row as f32 + 0.5, width, height);

        match mouse.kind {
            MouseEventKind::Down(button) => self.drag = Some((button, column, row)),
            MouseEventKind::Up(_) => self.drag = None,
            MouseEventKind::Drag(button) => {
                if let Some((_, last_column, last_row)) = self.drag {
                    let dx = (column as f32 - last_column as f32) / width.max(1.0);
                    let dy = (row as f32 - last_row as f32) / height.max(1.0);
                    if let Some(controls) = self.viewer.controls_mut() {
                        match button {
                            MouseButton::Left => controls.rotate(-TAU * dx, -TAU * dy * CELL_ASPECT),
                            _ => controls.pan(-dx, dy),
                        }
                    }
                }
                self.drag = Some((button, column, row));
            }
            MouseEventKind::ScrollUp => {
                if let Some(controls) = self.viewer.controls_mut() {
                    controls.zoom(ZOOM_STEP);
                }
            }
            MouseEventKind::ScrollDown => {
                if let Some(controls) = self.viewer.controls_mut() {
                    controls.zoom(1.0 / ZOOM_STEP);
                }
            }
            _ => {}
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.renderer.resize(width as usize, height as usize);
        self.viewer
            .camera_mut()
            .set_viewport(width as f32 * CELL_ASPECT, height as f32);
    }

    fn update(&mut self) {
        let elapsed = self.started.elapsed().as_secs_f32();
        self.viewer.frame(elapsed);
    }

    fn render(&mut self) -> io::Result<()> {
        let frame = self.viewer.last_frame();
        let scene = self.viewer.scene();
        let camera = self.viewer.camera();
        let lighting = &scene.lighting;

        // Clear renderer
        self.renderer.clear();

        // Render the model, then the satellite and its trail
        let model = frame.object.model_matrix();
        self.renderer
            .render_mesh(&scene.model, &model, camera, lighting, Palette::Ramp);

        if let (Some(sphere), Some(satellite)) = (&scene.satellite, &frame.satellite) {
            let p = satellite.position;
            let placement = Transform::translation_matrix(p.x, p.y, p.z);
            self.renderer.render_mesh(
                sphere,
                &placement,
                camera,
                lighting,
                Palette::Solid(SATELLITE_COLOR),
            );
        }
        if let Some(trail) = scene.trail.mesh() {
            self.renderer.render_mesh(
                trail,
                &Matrix4::identity(),
                camera,
                lighting,
                Palette::Solid(TRAIL_COLOR),
            );
        }

        // Output to terminal
        let mut stdout = stdout();
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let status = if scene.model.is_empty() {
            "no model loaded"
        } else {
            "mouse=tilt"
        };
        let controls = if self.viewer.config().enable_controls {
            "drag/arrows=orbit wasd=pan +/-=zoom r=reset"
        } else {
            "camera fixed"
        };
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "orbview | FPS: {:.1} | {} | {} | q=quit",
                self.fps, status, controls
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
