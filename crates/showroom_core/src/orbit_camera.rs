//! Orbit camera controller for the showroom.
//!
//! Drag-to-rotate around a target point with scroll zoom.
//! - Left mouse drag: rotate (azimuth and elevation)
//! - Scroll wheel: zoom in/out
//!
//! The controller only moves the camera while `enabled` is set; the
//! camera mode controller flips that flag when entering and leaving
//! orbit mode, and seeds the orbit parameters from the live camera pose
//! so the handoff never jumps.

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;

/// Orbit parameters attached to the showroom camera.
#[derive(Component)]
pub struct OrbitCamera {
    /// Point the camera orbits around
    pub target: Vec3,
    /// Distance from target
    pub distance: f32,
    /// Horizontal angle (radians)
    pub azimuth: f32,
    /// Vertical angle (radians), clamped to avoid gimbal lock
    pub elevation: f32,
    /// Mouse sensitivity for rotation
    pub sensitivity: f32,
    /// Zoom sensitivity
    pub zoom_sensitivity: f32,
    /// Zoom limits
    pub min_distance: f32,
    pub max_distance: f32,
    /// Elevation clamp magnitude (radians)
    pub max_elevation: f32,
    /// Input and transform writes are skipped while false
    pub enabled: bool,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 9.0,
            azimuth: 0.0,
            elevation: 0.35,
            sensitivity: 0.005,
            zoom_sensitivity: 0.8,
            min_distance: 1.5,
            max_distance: 40.0,
            max_elevation: 1.4, // ~80 degrees
            enabled: false,
        }
    }
}

impl OrbitCamera {
    /// Orbit at `distance` around `target`, initially disabled.
    pub fn new(distance: f32, target: Vec3) -> Self {
        Self {
            distance,
            target,
            ..default()
        }
    }

    /// Camera position implied by the current orbit parameters.
    pub fn calculate_position(&self) -> Vec3 {
        let x = self.distance * self.elevation.cos() * self.azimuth.sin();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.elevation.cos() * self.azimuth.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Derive orbit parameters from an existing camera pose so taking
    /// over control does not move the camera.
    pub fn sync_from(&mut self, position: Vec3, target: Vec3) {
        self.target = target;
        let offset = position - target;
        let distance = offset.length();
        if distance < 1e-4 {
            // Camera sitting on the target, keep the previous angles
            self.distance = self.min_distance;
            return;
        }
        self.distance = distance.clamp(self.min_distance, self.max_distance);
        self.elevation = (offset.y / distance)
            .clamp(-1.0, 1.0)
            .asin()
            .clamp(-self.max_elevation, self.max_elevation);
        self.azimuth = offset.x.atan2(offset.z);
    }
}

/// System that updates the orbit camera from mouse input.
pub fn orbit_camera_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mut query: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    for (mut orbit, mut transform) in query.iter_mut() {
        if !orbit.enabled {
            continue;
        }

        // Rotate on left mouse drag
        if mouse_button.pressed(MouseButton::Left) {
            let delta = mouse_motion.delta;
            orbit.azimuth -= delta.x * orbit.sensitivity;
            orbit.elevation += delta.y * orbit.sensitivity;
            orbit.elevation = orbit.elevation.clamp(-orbit.max_elevation, orbit.max_elevation);
        }

        // Zoom on scroll
        let scroll = mouse_scroll.delta.y;
        if scroll != 0.0 {
            orbit.distance -= scroll * orbit.zoom_sensitivity;
            orbit.distance = orbit.distance.clamp(orbit.min_distance, orbit.max_distance);
        }

        let position = orbit.calculate_position();
        transform.translation = position;
        transform.look_at(orbit.target, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_position_respects_distance() {
        let orbit = OrbitCamera::new(10.0, Vec3::new(1.0, 2.0, 3.0));
        let position = orbit.calculate_position();
        assert!(
            (position.distance(orbit.target) - 10.0).abs() < 1e-4,
            "position should sit at the orbit distance"
        );
    }

    #[test]
    fn test_sync_from_round_trips_pose() {
        let mut orbit = OrbitCamera::default();
        let target = Vec3::new(0.0, 1.0, 0.0);
        let position = Vec3::new(4.0, 4.0, 6.0);

        orbit.sync_from(position, target);
        let recovered = orbit.calculate_position();

        assert!(
            recovered.distance(position) < 1e-3,
            "sync should reproduce the pose: {:?} vs {:?}",
            recovered,
            position
        );
    }

    #[test]
    fn test_sync_from_clamps_distance() {
        let mut orbit = OrbitCamera::default();
        orbit.sync_from(Vec3::new(0.0, 0.0, 500.0), Vec3::ZERO);
        assert_eq!(orbit.distance, orbit.max_distance);
    }

    #[test]
    fn test_sync_from_degenerate_offset_keeps_angles() {
        let mut orbit = OrbitCamera::default();
        orbit.azimuth = 1.0;
        orbit.elevation = 0.5;
        orbit.sync_from(Vec3::ONE, Vec3::ONE);
        assert_eq!(orbit.azimuth, 1.0);
        assert_eq!(orbit.elevation, 0.5);
        assert_eq!(orbit.distance, orbit.min_distance);
    }
}
