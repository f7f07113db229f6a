//! Exhibit registry and camera framing rules.
//!
//! An exhibit is a named scene node a visitor can click to focus. Each one
//! carries a framing rule: either an explicit camera pose, or a standoff
//! distance combined with geometry the camera derives a pose from (world
//! bounds center plus the averaged outward vertex normal).
//!
//! Exhibits are resolved once after the scene arrives and re-validated on
//! every use, since scene content can come and go.

use bevy::prelude::*;

/// How many vertex normals the auto-framing averages before giving up on
/// the rest. Sampling a bounded prefix keeps resolution cheap on dense
/// meshes while still pointing the right way for showroom-scale geometry.
pub const NORMAL_SAMPLE_LIMIT: usize = 256;

/// Camera framing rule for one exhibit.
#[derive(Clone, Debug, PartialEq)]
pub enum Framing {
    /// Exact camera pose.
    Explicit { position: Vec3, look_at: Vec3 },
    /// Stand `view_distance` away from the bounds center, along the
    /// exhibit's averaged outward normal.
    Standoff { view_distance: f32 },
}

/// A focus target before scene resolution.
#[derive(Clone, Debug)]
pub struct ExhibitSpec {
    /// Display name, used in the status readout.
    pub name: String,
    /// Scene node name to resolve against.
    pub node: String,
    /// How the camera frames this exhibit.
    pub framing: Framing,
    /// Blend decay rate for the focus transition, in (0, 1).
    pub blend_rate: f32,
}

/// A resolved camera pose: where the camera sits and what it looks at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FramingPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

/// Axis-aligned world-space bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl WorldBounds {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Degenerate bounds covering a single point.
    pub fn point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Grow to cover `other` as well.
    pub fn merge(&mut self, other: WorldBounds) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Bounds of a local AABB pushed through a world transform.
    ///
    /// All eight corners are transformed and re-boxed, which stays correct
    /// under rotation where transforming min/max alone would not.
    pub fn from_transformed_aabb(
        center: Vec3,
        half_extents: Vec3,
        transform: &GlobalTransform,
    ) -> Self {
        let mut bounds: Option<WorldBounds> = None;
        for i in 0..8 {
            let corner = center
                + half_extents
                    * Vec3::new(
                        if i & 1 == 0 { -1.0 } else { 1.0 },
                        if i & 2 == 0 { -1.0 } else { 1.0 },
                        if i & 4 == 0 { -1.0 } else { 1.0 },
                    );
            let world = transform.transform_point(corner);
            match bounds.as_mut() {
                Some(b) => b.merge(WorldBounds::point(world)),
                None => bounds = Some(WorldBounds::point(world)),
            }
        }
        // The loop always runs eight times
        bounds.unwrap_or(WorldBounds::point(Vec3::ZERO))
    }
}

/// Average the first `sample_limit` vertex normals into one direction.
///
/// Returns `Vec3::Z` when the mesh has no normals or they cancel out, so
/// the derived camera pose still faces somewhere sensible.
pub fn averaged_normal(normals: &[[f32; 3]], sample_limit: usize) -> Vec3 {
    let count = normals.len().min(sample_limit);
    if count == 0 {
        return Vec3::Z;
    }
    let mut sum = Vec3::ZERO;
    for n in &normals[..count] {
        sum += Vec3::from_array(*n);
    }
    sum.try_normalize().unwrap_or(Vec3::Z)
}

/// Camera pose at `view_distance` along `outward` from `center`, looking
/// back at the center.
pub fn standoff_pose(center: Vec3, outward: Vec3, view_distance: f32) -> FramingPose {
    FramingPose {
        position: center + outward * view_distance,
        look_at: center,
    }
}

/// Turn a framing rule into a concrete pose using resolved geometry.
pub fn resolve_framing(framing: &Framing, bounds: &WorldBounds, outward: Vec3) -> FramingPose {
    match framing {
        Framing::Explicit { position, look_at } => FramingPose {
            position: *position,
            look_at: *look_at,
        },
        Framing::Standoff { view_distance } => {
            standoff_pose(bounds.center(), outward, *view_distance)
        }
    }
}

/// Marker on the root entity of a resolved exhibit.
#[derive(Component)]
pub struct Exhibit {
    /// Index into [`ExhibitRegistry::exhibits`].
    pub index: usize,
}

/// An exhibit after scene resolution.
#[derive(Clone, Debug)]
pub struct ResolvedExhibit {
    pub spec: ExhibitSpec,
    /// Root scene entity. Must be re-checked before use; the scene owns
    /// its lifetime.
    pub root: Entity,
    /// Merged world bounds of every mesh under the root.
    pub bounds: WorldBounds,
    /// Concrete camera pose derived from the framing rule.
    pub pose: FramingPose,
}

/// All exhibits that resolved successfully.
#[derive(Resource, Default)]
pub struct ExhibitRegistry {
    pub exhibits: Vec<ResolvedExhibit>,
}

impl ExhibitRegistry {
    pub fn len(&self) -> usize {
        self.exhibits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exhibits.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResolvedExhibit> {
        self.exhibits.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_covers_both_boxes() {
        let mut a = WorldBounds::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));
        let b = WorldBounds::new(Vec3::new(0.0, -3.0, 0.0), Vec3::new(4.0, 1.0, 0.5));
        a.merge(b);

        assert_eq!(a.min, Vec3::new(-1.0, -3.0, -1.0));
        assert_eq!(a.max, Vec3::new(4.0, 2.0, 1.0));
        assert_eq!(a.center(), Vec3::new(1.5, -0.5, 0.0));
    }

    #[test]
    fn test_transformed_aabb_accounts_for_rotation() {
        // A flat slab rotated 90 degrees about Y swaps its x/z extents
        let transform = GlobalTransform::from(
            Transform::from_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
        );
        let bounds = WorldBounds::from_transformed_aabb(
            Vec3::ZERO,
            Vec3::new(2.0, 0.5, 1.0),
            &transform,
        );

        assert!((bounds.half_extents().x - 1.0).abs() < 1e-4);
        assert!((bounds.half_extents().z - 2.0).abs() < 1e-4);
        assert!((bounds.half_extents().y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_transformed_aabb_translates() {
        let transform = GlobalTransform::from(Transform::from_xyz(10.0, 0.0, -5.0));
        let bounds =
            WorldBounds::from_transformed_aabb(Vec3::ZERO, Vec3::splat(1.0), &transform);
        assert_eq!(bounds.center(), Vec3::new(10.0, 0.0, -5.0));
    }

    #[test]
    fn test_averaged_normal_respects_sample_limit() {
        // First four normals point +X, everything after points -X
        let mut normals = vec![[1.0, 0.0, 0.0]; 4];
        normals.extend(vec![[-1.0, 0.0, 0.0]; 100]);

        let n = averaged_normal(&normals, 4);
        assert!(n.x > 0.99, "limited average should ignore the tail: {:?}", n);
    }

    #[test]
    fn test_averaged_normal_degenerate_falls_back() {
        assert_eq!(averaged_normal(&[], NORMAL_SAMPLE_LIMIT), Vec3::Z);

        let cancelling = vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]];
        assert_eq!(averaged_normal(&cancelling, NORMAL_SAMPLE_LIMIT), Vec3::Z);
    }

    #[test]
    fn test_standoff_pose_faces_the_center() {
        let pose = standoff_pose(Vec3::new(1.0, 1.0, 0.0), Vec3::Z, 4.0);
        assert_eq!(pose.position, Vec3::new(1.0, 1.0, 4.0));
        assert_eq!(pose.look_at, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_resolve_framing_explicit_ignores_geometry() {
        let framing = Framing::Explicit {
            position: Vec3::splat(9.0),
            look_at: Vec3::ZERO,
        };
        let bounds = WorldBounds::new(Vec3::NEG_ONE, Vec3::ONE);
        let pose = resolve_framing(&framing, &bounds, Vec3::X);
        assert_eq!(pose.position, Vec3::splat(9.0));
        assert_eq!(pose.look_at, Vec3::ZERO);
    }
}
