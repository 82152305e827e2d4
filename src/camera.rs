use std::f32::consts::PI;

use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Camera orbiting a target point, described by two angles and a distance.
///
/// Uses a left-handed, Y-up convention: `alpha` is the azimuth around the
/// Y axis and `beta` the polar angle measured from +Y.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub alpha: f32,
    pub beta: f32,
    radius: f32,
    pub target: Vec3,

    lower_radius_limit: f32,
    upper_radius_limit: f32,

    pub fov_y: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl OrbitCamera {
    const LOWER_BETA_LIMIT: f32 = 0.01;
    const UPPER_BETA_LIMIT: f32 = PI - 0.01;

    pub fn new(alpha: f32, beta: f32, radius: f32, target: Vec3) -> Self {
        Self {
            alpha,
            beta: beta.clamp(Self::LOWER_BETA_LIMIT, Self::UPPER_BETA_LIMIT),
            radius: radius.max(f32::EPSILON),
            target,
            lower_radius_limit: f32::EPSILON,
            upper_radius_limit: f32::INFINITY,
            fov_y: 0.8,
            z_near: 0.1,
            z_far: 100.0,
        }
    }

    pub fn with_radius_limits(mut self, lower: f32, upper: f32) -> Self {
        self.lower_radius_limit = lower.min(upper);
        self.upper_radius_limit = upper.max(lower);
        self.set_radius(self.radius);
        self
    }

    #[allow(dead_code)]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[allow(dead_code)]
    pub fn radius_limits(&self) -> (f32, f32) {
        (self.lower_radius_limit, self.upper_radius_limit)
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.clamp(self.lower_radius_limit, self.upper_radius_limit);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.set_radius(self.radius - delta);
    }

    pub fn rotate(&mut self, d_alpha: f32, d_beta: f32) {
        self.alpha += d_alpha;
        self.beta = (self.beta + d_beta).clamp(Self::LOWER_BETA_LIMIT, Self::UPPER_BETA_LIMIT);
    }

    /// Moves the target within the view plane. Deltas are in world units at unit radius.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = (self.target - self.eye()).normalize_or_zero();
        let right = Vec3::Y.cross(forward).normalize_or_zero();
        let up = forward.cross(right);

        self.target += (right * -dx + up * dy) * self.radius;
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_alpha, cos_alpha) = self.alpha.sin_cos();
        let (sin_beta, cos_beta) = self.beta.sin_cos();

        self.target + self.radius * Vec3::new(cos_alpha * sin_beta, cos_beta, sin_alpha * sin_beta)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_lh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_lh(self.fov_y, aspect.max(1e-6), self.z_near, self.z_far)
    }

    pub fn view_proj(&self, resolution: Vec2) -> Mat4 {
        self.projection_matrix(resolution.x / resolution.y.max(1.0)) * self.view_matrix()
    }
}

/// Pointer input attached to the surface: drag to orbit or pan, wheel to zoom.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    rotating: bool,
    panning: bool,
    last_cursor: Option<Vec2>,

    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub line_zoom_speed: f32,
    pub pixel_zoom_speed: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            rotating: false,
            panning: false,
            last_cursor: None,
            rotate_speed: 0.005,
            pan_speed: 0.001,
            line_zoom_speed: 0.5,
            pixel_zoom_speed: 0.01,
        }
    }
}

impl OrbitControls {
    /// Returns `true` if the event was consumed.
    pub fn handle_event(&mut self, camera: &mut OrbitCamera, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_button(*button, *state);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(camera, Vec2::new(position.x as f32, position.y as f32));
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                false
            }
            WindowEvent::Focused(false) => {
                self.rotating = false;
                self.panning = false;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.wheel(camera, *delta);
                true
            }
            _ => false,
        }
    }

    pub fn mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;

        match button {
            MouseButton::Left => self.rotating = pressed,
            MouseButton::Right | MouseButton::Middle => self.panning = pressed,
            _ => {}
        }
    }

    pub fn cursor_moved(&mut self, camera: &mut OrbitCamera, position: Vec2) {
        if let Some(last) = self.last_cursor {
            let delta = position - last;

            if self.rotating {
                camera.rotate(-delta.x * self.rotate_speed, -delta.y * self.rotate_speed);
            } else if self.panning {
                camera.pan(delta.x * self.pan_speed, delta.y * self.pan_speed);
            }
        }

        self.last_cursor = Some(position);
    }

    pub fn wheel(&mut self, camera: &mut OrbitCamera, delta: MouseScrollDelta) {
        let amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => y * self.line_zoom_speed,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 * self.pixel_zoom_speed,
        };

        camera.zoom(amount);
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
    eye: [f32; 4],
}

impl CameraUniform {
    pub fn update(&mut self, resolution: winit::dpi::PhysicalSize<u32>, camera: &OrbitCamera) {
        self.view_proj =
            camera.view_proj(Vec2::new(resolution.width as f32, resolution.height as f32));
        self.eye = camera.eye().extend(1.0).to_array();
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(PI * 1.25, PI / 2.5, 6.0, Vec3::new(0.0, 1.0, 0.0))
            .with_radius_limits(3.0, 12.0)
    }

    #[test]
    fn eye_sits_on_the_sphere_around_the_target() {
        let camera = camera();
        let distance = camera.eye().distance(camera.target);
        assert!((distance - 6.0).abs() < 1e-4);
        // alpha = 225deg puts the eye in the -x, -z quadrant
        assert!(camera.eye().x < 0.0 && camera.eye().z < 0.0);
        assert!(camera.eye().y > camera.target.y);
    }

    #[test]
    fn radius_limits_clamp_the_initial_radius() {
        let camera = OrbitCamera::new(0.0, 1.0, 20.0, Vec3::ZERO).with_radius_limits(3.0, 12.0);
        assert_eq!(camera.radius(), 12.0);
    }

    #[test]
    fn wheel_input_never_leaves_radius_limits() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();

        for _ in 0..100 {
            controls.wheel(&mut camera, MouseScrollDelta::LineDelta(0.0, 3.0));
            assert!(camera.radius() >= 3.0);
        }
        assert_eq!(camera.radius(), 3.0);

        for _ in 0..100 {
            controls.wheel(
                &mut camera,
                MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -250.0)),
            );
            assert!(camera.radius() <= 12.0);
        }
        assert_eq!(camera.radius(), 12.0);
    }

    #[test]
    fn dragging_rotates_only_while_button_is_held() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        let alpha = camera.alpha;

        controls.cursor_moved(&mut camera, Vec2::new(10.0, 10.0));
        controls.cursor_moved(&mut camera, Vec2::new(50.0, 10.0));
        assert_eq!(camera.alpha, alpha);

        controls.mouse_button(MouseButton::Left, ElementState::Pressed);
        controls.cursor_moved(&mut camera, Vec2::new(90.0, 10.0));
        assert!(camera.alpha < alpha);

        controls.mouse_button(MouseButton::Left, ElementState::Released);
        let alpha = camera.alpha;
        controls.cursor_moved(&mut camera, Vec2::new(200.0, 10.0));
        assert_eq!(camera.alpha, alpha);
    }

    #[test]
    fn beta_is_kept_away_from_the_poles() {
        let mut camera = camera();
        camera.rotate(0.0, 100.0);
        assert!(camera.beta < PI);
        camera.rotate(0.0, -100.0);
        assert!(camera.beta > 0.0);

        let view = camera.view_matrix();
        assert!(view.to_cols_array().iter().all(|f| f.is_finite()));
    }

    #[test]
    fn panning_moves_target_and_keeps_radius() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        let target = camera.target;

        controls.mouse_button(MouseButton::Right, ElementState::Pressed);
        controls.cursor_moved(&mut camera, Vec2::new(0.0, 0.0));
        controls.cursor_moved(&mut camera, Vec2::new(100.0, 0.0));

        assert_ne!(camera.target, target);
        assert_eq!(camera.radius(), 6.0);
    }

    #[test]
    fn view_proj_is_finite() {
        let camera = camera();
        let matrix = camera.view_proj(Vec2::new(1280.0, 720.0));
        assert!(matrix.to_cols_array().iter().all(|f| f.is_finite()));
    }
}
