//! Camera Mode Controller
//!
//! A three-mode state machine producing the camera pose every frame:
//! - Mouse follow: the camera stays put and its gaze sways with the
//!   pointer around a fixed look center
//! - Orbit: free drag-to-rotate, delegated to the orbit controller
//! - Focus: an animated transition framing one exhibit, entered by
//!   clicking and left with Escape
//!
//! Focus takes absolute priority while active or transitioning. The pose
//! held before entering focus is captured and restored on the way out,
//! including which of the other two modes was running. Arrival at either
//! end of a focus leg is an epsilon test on both position and look-at,
//! since the exponential blend never lands exactly.
//!
//! # Example
//!
//! ```ignore
//! use showroom_core::camera_modes::{CameraDirector, CameraDirectorConfig};
//!
//! let mut director = CameraDirector::new(CameraDirectorConfig::default());
//! director.begin_focus(0, target_pose, 0.15, camera_pos, camera_look);
//! while director.focus_active() {
//!     director.advance_focus(1.0 / 60.0);
//! }
//! ```

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::blend::Blendable;
use crate::exhibits::{ExhibitRegistry, FramingPose};
use crate::orbit_camera::OrbitCamera;
use crate::showroom_app::ShowroomCamera;

/// Which controller owns the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CameraMode {
    /// Fixed position, gaze follows the pointer.
    #[default]
    MouseFollow,
    /// Free orbit controls.
    Orbit,
    /// Framing an exhibit (or transitioning to/from one).
    Focus,
}

/// Focus transition state. The enum replaces the usual pile of booleans
/// so "active but neither transitioning nor settled" cannot exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FocusState {
    #[default]
    Idle,
    /// Blending toward the exhibit's pose.
    Approaching { exhibit: usize },
    /// Arrived and holding on the exhibit.
    Holding { exhibit: usize },
    /// Blending back toward the captured return pose.
    Returning,
}

/// Camera pose and mode captured when focus was entered.
#[derive(Clone, Copy, Debug)]
pub struct ReturnPose {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Mode to restore once the return leg arrives.
    pub mode: CameraMode,
}

/// Tuning for the camera director.
#[derive(Clone, Debug)]
pub struct CameraDirectorConfig {
    /// Camera position in mouse-follow mode.
    pub home_position: Vec3,
    /// Point the mouse-follow gaze sways around.
    pub look_center: Vec3,
    /// World-unit gaze offset at full pointer deflection.
    pub sway_extent: Vec2,
    /// Pointer smoothing decay rate. Very small, for a time constant of
    /// roughly a tenth of a second.
    pub pointer_rate: f32,
    /// Fallback focus blend rate, for exhibits that do not set their own.
    pub default_focus_rate: f32,
    /// Arrival distance for focus legs, in world units. Both the position
    /// and the look-at must be inside it.
    pub arrival_epsilon: f32,
}

impl Default for CameraDirectorConfig {
    fn default() -> Self {
        Self {
            home_position: Vec3::new(0.0, 2.2, 9.0),
            look_center: Vec3::new(0.0, 1.4, 0.0),
            sway_extent: Vec2::new(1.6, 0.8),
            pointer_rate: 1e-4,
            default_focus_rate: 0.15,
            arrival_epsilon: 0.01,
        }
    }
}

/// Request to focus an exhibit, usually sent by the picking systems.
#[derive(Message)]
pub struct FocusRequest {
    /// Index into the exhibit registry.
    pub exhibit: usize,
}

/// The camera state machine. Pure state plus transition methods; the
/// systems at the bottom of this module wire it to input and transforms.
#[derive(Resource)]
pub struct CameraDirector {
    pub config: CameraDirectorConfig,
    /// Mode that owns the camera when focus is idle.
    pub mode: CameraMode,
    pub focus: FocusState,
    /// Smoothed normalized pointer for the mouse-follow sway.
    pub pointer: Blendable<Vec2>,
    /// Camera position during focus legs.
    pub position: Blendable<Vec3>,
    /// Look-at point during focus legs.
    pub look_at: Blendable<Vec3>,
    /// Captured pose to restore after focus.
    pub return_pose: Option<ReturnPose>,
    /// Where the camera looked last frame, whichever mode drove it.
    pub last_look_at: Vec3,
}

impl Default for CameraDirector {
    fn default() -> Self {
        Self::new(CameraDirectorConfig::default())
    }
}

impl CameraDirector {
    pub fn new(config: CameraDirectorConfig) -> Self {
        let pointer = Blendable::new(Vec2::ZERO, config.pointer_rate);
        let position = Blendable::new(config.home_position, config.default_focus_rate);
        let look_at = Blendable::new(config.look_center, config.default_focus_rate);
        let last_look_at = config.look_center;
        Self {
            config,
            mode: CameraMode::MouseFollow,
            focus: FocusState::Idle,
            pointer,
            position,
            look_at,
            return_pose: None,
            last_look_at,
        }
    }

    /// Mode currently driving the camera. Focus wins while any focus
    /// transition is in flight, regardless of the stored mode.
    pub fn effective_mode(&self) -> CameraMode {
        if self.focus_active() {
            CameraMode::Focus
        } else {
            self.mode
        }
    }

    pub fn focus_active(&self) -> bool {
        self.focus != FocusState::Idle
    }

    /// Flip between mouse-follow and orbit. Refused while focus is
    /// active or transitioning; returns whether the mode changed.
    pub fn toggle_orbit(&mut self) -> bool {
        if self.focus_active() {
            return false;
        }
        self.mode = match self.mode {
            CameraMode::Orbit => CameraMode::MouseFollow,
            _ => CameraMode::Orbit,
        };
        true
    }

    /// Start (or retarget) a focus transition toward an exhibit.
    ///
    /// The current camera pose becomes the blend start. The return pose
    /// and prior mode are captured only on the first entry, so clicking
    /// from exhibit to exhibit still returns to where focus began.
    pub fn begin_focus(
        &mut self,
        exhibit: usize,
        pose: FramingPose,
        rate: f32,
        camera_position: Vec3,
        camera_look_at: Vec3,
    ) {
        if !self.focus_active() {
            self.return_pose = Some(ReturnPose {
                position: camera_position,
                look_at: camera_look_at,
                mode: self.mode,
            });
        }
        let rate = if rate > 0.0 && rate < 1.0 {
            rate
        } else {
            self.config.default_focus_rate
        };
        self.position = Blendable::new(camera_position, rate).with_target(pose.position);
        self.look_at = Blendable::new(camera_look_at, rate).with_target(pose.look_at);
        self.focus = FocusState::Approaching { exhibit };
    }

    /// Re-aim at the captured return pose. No-op when idle or already
    /// returning.
    pub fn release_focus(&mut self) {
        let Some(pose) = self.return_pose else {
            return;
        };
        match self.focus {
            FocusState::Approaching { .. } | FocusState::Holding { .. } => {
                self.position.target = pose.position;
                self.look_at.target = pose.look_at;
                self.focus = FocusState::Returning;
            }
            _ => {}
        }
    }

    /// Advance the active focus leg and run arrival detection.
    ///
    /// Returns the restored camera mode when a return leg completes, so
    /// the caller can re-enable the orbit controller.
    pub fn advance_focus(&mut self, dt: f32) -> Option<CameraMode> {
        if !self.focus_active() {
            return None;
        }
        self.position.advance(dt);
        self.look_at.advance(dt);

        let eps = self.config.arrival_epsilon;
        if !(self.position.settled(eps) && self.look_at.settled(eps)) {
            return None;
        }

        match self.focus {
            FocusState::Approaching { exhibit } => {
                self.focus = FocusState::Holding { exhibit };
                None
            }
            FocusState::Returning => {
                self.focus = FocusState::Idle;
                let restored = self
                    .return_pose
                    .take()
                    .map(|pose| pose.mode)
                    .unwrap_or(CameraMode::MouseFollow);
                self.mode = restored;
                Some(restored)
            }
            _ => None,
        }
    }

    /// Smooth the pointer and map it to the bounded mouse-follow gaze.
    pub fn sway_look_at(&mut self, pointer_normalized: Vec2, dt: f32) -> Vec3 {
        self.pointer.target = pointer_normalized;
        self.pointer.advance(dt);
        let p = self.pointer.current;
        self.config.look_center
            + Vec3::new(
                p.x * self.config.sway_extent.x,
                p.y * self.config.sway_extent.y,
                0.0,
            )
    }
}

/// Map a cursor position in window pixels to [-1, 1] on both axes, with
/// +y pointing up.
pub fn normalized_pointer(cursor: Vec2, window_size: Vec2) -> Vec2 {
    Vec2::new(
        (cursor.x / window_size.x) * 2.0 - 1.0,
        1.0 - (cursor.y / window_size.y) * 2.0,
    )
}

// ============================================================================
// Systems
// ============================================================================

/// Keyboard transitions: orbit toggle and focus release.
pub fn camera_mode_keys(
    keys: Res<ButtonInput<KeyCode>>,
    mut director: ResMut<CameraDirector>,
    mut orbits: Query<&mut OrbitCamera, With<ShowroomCamera>>,
) {
    if keys.just_pressed(KeyCode::KeyO) {
        if director.toggle_orbit() {
            if let Ok(mut orbit) = orbits.single_mut() {
                orbit.enabled = director.mode == CameraMode::Orbit;
            }
            info!("Camera mode: {:?}", director.mode);
        }
    }
    if keys.just_pressed(KeyCode::Escape) && director.focus_active() {
        director.release_focus();
        info!("Leaving focus");
    }
}

/// Apply queued focus requests from the picking systems.
pub fn handle_focus_requests(
    mut requests: MessageReader<FocusRequest>,
    registry: Res<ExhibitRegistry>,
    mut director: ResMut<CameraDirector>,
    mut cameras: Query<(&Transform, &mut OrbitCamera), With<ShowroomCamera>>,
) {
    // Only the most recent click matters
    let Some(request) = requests.read().last() else {
        return;
    };
    let Ok((transform, mut orbit)) = cameras.single_mut() else {
        return;
    };
    let Some(exhibit) = registry.get(request.exhibit) else {
        warn!("focus request for unknown exhibit index {}", request.exhibit);
        return;
    };

    let look_at = director.last_look_at;
    director.begin_focus(
        request.exhibit,
        exhibit.pose,
        exhibit.spec.blend_rate,
        transform.translation,
        look_at,
    );
    orbit.enabled = false;
    info!("Focusing exhibit '{}'", exhibit.spec.name);
}

/// Drive the camera transform for the mouse-follow and focus modes, and
/// hand control back to orbit when a return leg completes.
pub fn drive_camera(
    time: Res<Time>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut director: ResMut<CameraDirector>,
    mut cameras: Query<(&mut Transform, &mut OrbitCamera), With<ShowroomCamera>>,
) {
    let Ok((mut transform, mut orbit)) = cameras.single_mut() else {
        return;
    };
    let dt = time.delta_secs();

    match director.effective_mode() {
        CameraMode::Focus => {
            let restored = director.advance_focus(dt);

            transform.translation = director.position.current;
            transform.look_at(director.look_at.current, Vec3::Y);
            director.last_look_at = director.look_at.current;

            if restored == Some(CameraMode::Orbit) {
                orbit.enabled = true;
                orbit.sync_from(director.position.current, director.look_at.current);
            }
        }
        CameraMode::MouseFollow => {
            let pointer = windows
                .single()
                .ok()
                .and_then(|window| {
                    let cursor = window.cursor_position()?;
                    let size = Vec2::new(window.width(), window.height());
                    Some(normalized_pointer(cursor, size))
                })
                .unwrap_or(Vec2::ZERO);

            let look = director.sway_look_at(pointer, dt);
            transform.translation = director.config.home_position;
            transform.look_at(look, Vec3::Y);
            director.last_look_at = look;
        }
        CameraMode::Orbit => {
            // The orbit system owns the transform; remember its gaze so a
            // focus entry can capture it
            director.last_look_at = orbit.target;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(position: Vec3, look_at: Vec3) -> FramingPose {
        FramingPose { position, look_at }
    }

    fn settle(director: &mut CameraDirector) -> Option<CameraMode> {
        for _ in 0..margin_frames() {
            if let Some(mode) = director.advance_focus(1.0 / 60.0) {
                return Some(mode);
            }
        }
        None
    }

    fn margin_frames() -> usize {
        // Ten simulated seconds at 60 fps, ample for every rate in use
        600
    }

    #[test]
    fn test_toggle_flips_between_follow_and_orbit() {
        let mut director = CameraDirector::new(CameraDirectorConfig::default());
        assert_eq!(director.mode, CameraMode::MouseFollow);
        assert!(director.toggle_orbit());
        assert_eq!(director.mode, CameraMode::Orbit);
        assert!(director.toggle_orbit());
        assert_eq!(director.mode, CameraMode::MouseFollow);
    }

    #[test]
    fn test_toggle_blocked_while_focused() {
        let mut director = CameraDirector::new(CameraDirectorConfig::default());
        director.begin_focus(
            0,
            pose(Vec3::new(1.0, 1.0, 1.0), Vec3::ZERO),
            0.15,
            Vec3::new(0.0, 2.0, 9.0),
            Vec3::ZERO,
        );

        assert!(!director.toggle_orbit());
        assert_eq!(director.effective_mode(), CameraMode::Focus);
        assert_eq!(director.mode, CameraMode::MouseFollow, "stored mode untouched");
    }

    #[test]
    fn test_approach_settles_into_holding() {
        let mut director = CameraDirector::new(CameraDirectorConfig::default());
        let target = pose(Vec3::new(2.0, 1.5, 3.0), Vec3::new(2.0, 1.0, 0.0));
        director.begin_focus(3, target, 0.15, Vec3::new(0.0, 2.2, 9.0), Vec3::ZERO);
        assert_eq!(director.focus, FocusState::Approaching { exhibit: 3 });

        settle(&mut director);

        assert_eq!(director.focus, FocusState::Holding { exhibit: 3 });
        assert!(director.position.current.distance(target.position) < 0.01);
        assert!(director.look_at.current.distance(target.look_at) < 0.01);
    }

    #[test]
    fn test_release_returns_and_restores_mode() {
        let mut director = CameraDirector::new(CameraDirectorConfig::default());
        director.toggle_orbit();

        let start_position = Vec3::new(5.0, 3.0, 8.0);
        let start_look = Vec3::new(0.0, 1.0, 0.0);
        director.begin_focus(
            0,
            pose(Vec3::new(1.0, 1.5, 2.0), Vec3::new(1.0, 1.0, 0.0)),
            0.15,
            start_position,
            start_look,
        );
        settle(&mut director);
        assert_eq!(director.focus, FocusState::Holding { exhibit: 0 });

        director.release_focus();
        assert_eq!(director.focus, FocusState::Returning);

        let restored = settle(&mut director);
        assert_eq!(restored, Some(CameraMode::Orbit));
        assert_eq!(director.mode, CameraMode::Orbit);
        assert_eq!(director.focus, FocusState::Idle);
        assert!(director.position.current.distance(start_position) < 0.01);
        assert!(director.look_at.current.distance(start_look) < 0.01);
    }

    #[test]
    fn test_refocus_keeps_original_return_pose() {
        let mut director = CameraDirector::new(CameraDirectorConfig::default());
        let origin = Vec3::new(0.0, 2.2, 9.0);
        director.begin_focus(
            0,
            pose(Vec3::new(1.0, 1.0, 1.0), Vec3::ZERO),
            0.15,
            origin,
            Vec3::ZERO,
        );
        settle(&mut director);

        // Click a second exhibit while holding the first
        director.begin_focus(
            1,
            pose(Vec3::new(-2.0, 1.0, 2.0), Vec3::new(-2.0, 0.5, 0.0)),
            0.15,
            director.position.current,
            director.look_at.current,
        );
        assert_eq!(director.focus, FocusState::Approaching { exhibit: 1 });

        let return_pose = director.return_pose.expect("still captured");
        assert_eq!(return_pose.position, origin);
    }

    #[test]
    fn test_release_while_approaching_turns_around() {
        let mut director = CameraDirector::new(CameraDirectorConfig::default());
        let origin = Vec3::new(0.0, 2.2, 9.0);
        director.begin_focus(
            0,
            pose(Vec3::new(0.0, 1.0, -4.0), Vec3::ZERO),
            0.15,
            origin,
            Vec3::new(0.0, 1.4, 0.0),
        );

        // Part way in, bail out
        for _ in 0..30 {
            director.advance_focus(1.0 / 60.0);
        }
        assert!(matches!(director.focus, FocusState::Approaching { .. }));
        director.release_focus();
        assert_eq!(director.focus, FocusState::Returning);

        let restored = settle(&mut director);
        assert_eq!(restored, Some(CameraMode::MouseFollow));
        assert!(director.position.current.distance(origin) < 0.01);
    }

    #[test]
    fn test_release_when_idle_is_a_no_op() {
        let mut director = CameraDirector::new(CameraDirectorConfig::default());
        director.release_focus();
        assert_eq!(director.focus, FocusState::Idle);
        assert!(director.advance_focus(0.1).is_none());
    }

    #[test]
    fn test_sway_stays_inside_extent() {
        let mut director = CameraDirector::new(CameraDirectorConfig::default());
        let extent = director.config.sway_extent;
        let center = director.config.look_center;

        // Hold the pointer at a corner for a long time
        let mut look = Vec3::ZERO;
        for _ in 0..1000 {
            look = director.sway_look_at(Vec2::new(1.0, -1.0), 1.0 / 60.0);
        }

        assert!((look.x - center.x).abs() <= extent.x + 1e-4);
        assert!((look.y - center.y).abs() <= extent.y + 1e-4);
        assert!(look.x > center.x, "pointer right should look right");
        assert!(look.y < center.y, "pointer down should look down");
    }

    #[test]
    fn test_normalized_pointer_maps_corners() {
        let size = Vec2::new(800.0, 600.0);
        assert_eq!(normalized_pointer(Vec2::ZERO, size), Vec2::new(-1.0, 1.0));
        assert_eq!(
            normalized_pointer(Vec2::new(800.0, 600.0), size),
            Vec2::new(1.0, -1.0)
        );
        assert_eq!(
            normalized_pointer(Vec2::new(400.0, 300.0), size),
            Vec2::ZERO
        );
    }

    #[test]
    fn test_bad_exhibit_rate_falls_back_to_default() {
        let mut director = CameraDirector::new(CameraDirectorConfig::default());
        director.begin_focus(
            0,
            pose(Vec3::ONE, Vec3::ZERO),
            0.0,
            Vec3::new(0.0, 2.2, 9.0),
            Vec3::ZERO,
        );
        assert_eq!(director.position.rate, director.config.default_focus_rate);
    }
}
