//! Hover and click picking for exhibits.
//!
//! Casts a camera ray through the pointer every frame and intersects it
//! against each registered exhibit's world bounds. Hover state is never
//! cached across frames, so camera motion under a still pointer updates
//! it correctly. A click (a left press and release without a meaningful
//! drag, so orbit drags do not count) asks the camera to focus the
//! nearest hovered exhibit.

use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::camera_modes::FocusRequest;
use crate::exhibits::{Exhibit, ExhibitRegistry};
use crate::showroom_app::ShowroomCamera;

/// Drag distance in pixels below which a press/release pair is a click.
pub const CLICK_DRAG_TOLERANCE: f32 = 5.0;

/// Slab-method ray versus axis-aligned box intersection.
///
/// Returns the distance along the ray to the hit, `0.0` when the origin
/// is already inside the box, `None` on a miss or when the box lies
/// entirely behind the origin.
pub fn ray_aabb_intersect(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        let lo = min[axis];
        let hi = max[axis];

        if d.abs() < 1e-8 {
            // Parallel to the slab: miss unless the origin lies inside it
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t0 = (lo - o) * inv;
        let mut t1 = (hi - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    if t_far < 0.0 {
        return None;
    }
    Some(t_near.max(0.0))
}

/// Pointer cursor hint derived from hover state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorHint {
    #[default]
    Default,
    /// Something focusable is under the pointer.
    Clickable,
}

/// The exhibit currently under the pointer, if any.
#[derive(Clone, Copy, Debug)]
pub struct HoverHit {
    /// Index into the exhibit registry.
    pub exhibit: usize,
    /// Root entity of the hovered exhibit.
    pub entity: Entity,
    /// Ray distance to the hit.
    pub distance: f32,
}

/// Per-frame hover result.
#[derive(Resource, Default)]
pub struct HoverState {
    pub hovered: Option<HoverHit>,
    pub cursor: CursorHint,
}

/// Accumulated drag distance for the current left-button press.
#[derive(Resource, Default)]
pub struct ClickTracker {
    pub drag_distance: f32,
}

/// Recompute the hovered exhibit from the current pointer and camera.
pub fn update_hover(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<ShowroomCamera>>,
    registry: Res<ExhibitRegistry>,
    live_roots: Query<(), With<Exhibit>>,
    mut hover: ResMut<HoverState>,
) {
    hover.hovered = None;
    hover.cursor = CursorHint::Default;

    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else {
        return;
    };

    let origin = ray.origin;
    let direction = *ray.direction;

    let mut nearest: Option<HoverHit> = None;
    for (index, exhibit) in registry.exhibits.iter().enumerate() {
        // Scene content can despawn under us; skip stale entries
        if live_roots.get(exhibit.root).is_err() {
            continue;
        }
        let Some(distance) =
            ray_aabb_intersect(origin, direction, exhibit.bounds.min, exhibit.bounds.max)
        else {
            continue;
        };
        let closer = nearest.map(|hit| distance < hit.distance).unwrap_or(true);
        if closer {
            nearest = Some(HoverHit {
                exhibit: index,
                entity: exhibit.root,
                distance,
            });
        }
    }

    if nearest.is_some() {
        hover.cursor = CursorHint::Clickable;
    }
    hover.hovered = nearest;
}

/// Turn clean left clicks on a hovered exhibit into focus requests.
pub fn resolve_clicks(
    buttons: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    hover: Res<HoverState>,
    mut tracker: ResMut<ClickTracker>,
    mut requests: MessageWriter<FocusRequest>,
) {
    if buttons.just_pressed(MouseButton::Left) {
        tracker.drag_distance = 0.0;
    }
    if buttons.pressed(MouseButton::Left) {
        tracker.drag_distance += motion.delta.length();
    }
    if buttons.just_released(MouseButton::Left) && tracker.drag_distance < CLICK_DRAG_TOLERANCE {
        if let Some(hit) = hover.hovered {
            requests.write(FocusRequest {
                exhibit: hit.exhibit,
            });
        }
    }
}
