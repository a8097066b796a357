use glam::{Mat4, Vec2, Vec3};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;

use crate::world_core::config::CameraConfig;

/// A camera that drifts around a resting position following the pointer
/// while always looking at a fixed point.
#[derive(Debug, Clone)]
pub struct ParallaxCamera {
    pub position: Vec3,
    pub home: Vec3,
    pub look_at: Vec3,
    pub max_offset: Vec2,
    /// Fraction of the remaining distance covered per frame.
    pub smoothing: f32,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl ParallaxCamera {
    pub fn new(config: &CameraConfig) -> Self {
        let home = Vec3::from(config.position);
        Self {
            position: home,
            home,
            look_at: Vec3::from(config.look_at),
            max_offset: Vec2::from(config.max_offset),
            smoothing: config.smoothing.clamp(0.0, 1.0),
            fov_y_radians: config.fov_y_degrees.to_radians(),
            near: config.near,
            far: config.far,
        }
    }

    /// Where the camera wants to be for a pointer in normalized window
    /// coordinates, (0.5, 0.5) being the centre.
    pub fn target(&self, pointer: Vec2) -> Vec3 {
        let dx = (0.5 - pointer.x) * 2.0 * self.max_offset.x;
        let dy = (pointer.y - 0.5) * 2.0 * self.max_offset.y;
        self.home + Vec3::new(dx, dy, 0.0)
    }

    /// One frame of easing towards the pointer's target.
    pub fn update(&mut self, pointer: Vec2) {
        let target = self.target(pointer);
        self.position = self.position.lerp(target, self.smoothing);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, Vec3::Y)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let projection = Mat4::perspective_rh(self.fov_y_radians, aspect, self.near, self.far);
        projection * self.view()
    }
}

/// Tracks the pointer (mouse or touch) in normalized window coordinates.
pub struct PointerController {
    pointer: Vec2,
    window_size: PhysicalSize<u32>,
}

impl PointerController {
    pub fn new(window_size: PhysicalSize<u32>) -> Self {
        Self {
            pointer: Vec2::splat(0.5),
            window_size,
        }
    }

    pub fn process_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.set_pointer_position(*position);
                true
            }
            WindowEvent::Touch(touch) => {
                self.set_pointer_position(touch.location);
                true
            }
            WindowEvent::Resized(size) => {
                self.window_size = *size;
                false
            }
            _ => false,
        }
    }

    pub fn set_pointer_position(&mut self, position: PhysicalPosition<f64>) {
        let width = self.window_size.width.max(1) as f64;
        let height = self.window_size.height.max(1) as f64;
        self.pointer = Vec2::new(
            (position.x / width).clamp(0.0, 1.0) as f32,
            (position.y / height).clamp(0.0, 1.0) as f32,
        );
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }
}

#[cfg(test)]
mod tests {
    use super::{ParallaxCamera, PointerController};
    use crate::world_core::config::CameraConfig;
    use glam::{Vec2, Vec3};
    use winit::dpi::{PhysicalPosition, PhysicalSize};

    #[test]
    fn centred_pointer_targets_home() {
        let camera = ParallaxCamera::new(&CameraConfig::default());
        assert_eq!(camera.target(Vec2::splat(0.5)), Vec3::new(0.0, 5.0, 100.0));
    }

    #[test]
    fn pointer_corners_reach_max_offset() {
        let camera = ParallaxCamera::new(&CameraConfig::default());
        let top_left = camera.target(Vec2::ZERO);
        assert!((top_left - Vec3::new(5.0, 3.8, 100.0)).length() < 1e-5);
        let bottom_right = camera.target(Vec2::ONE);
        assert!((bottom_right - Vec3::new(-5.0, 6.2, 100.0)).length() < 1e-5);
    }

    #[test]
    fn camera_converges_to_its_target() {
        let mut camera = ParallaxCamera::new(&CameraConfig::default());
        let pointer = Vec2::new(0.9, 0.2);
        let target = camera.target(pointer);

        let mut last = (camera.position - target).length();
        for _ in 0..200 {
            camera.update(pointer);
            let distance = (camera.position - target).length();
            assert!(distance <= last);
            last = distance;
        }
        assert!(last < 1e-3);
    }

    #[test]
    fn pointer_is_normalized_by_window_size() {
        let mut pointer = PointerController::new(PhysicalSize::new(800, 400));
        assert_eq!(pointer.pointer(), Vec2::splat(0.5));

        pointer.set_pointer_position(PhysicalPosition::new(200.0, 300.0));
        assert_eq!(pointer.pointer(), Vec2::new(0.25, 0.75));

        pointer.set_pointer_position(PhysicalPosition::new(-50.0, 900.0));
        assert_eq!(pointer.pointer(), Vec2::new(0.0, 1.0));
    }
}
