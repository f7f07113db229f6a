//! Frame-rate-independent exponential blending.
//!
//! Every animated value in the showroom (light levels, the sun's arc,
//! camera focus legs, pointer smoothing) moves toward its target through
//! the same decay formula:
//!
//! `current' = current + (target - current) * (1 - rate^dt)`
//!
//! `rate` is the fraction of the remaining distance still left after one
//! second, so the motion closes the same fraction of the gap per second no
//! matter how the frame times are chunked. Values approach their target
//! asymptotically and never overshoot; callers that need an "arrived"
//! signal test against a small distance epsilon via [`Blendable::settled`].
//!
//! # Example
//!
//! ```ignore
//! use showroom_core::blend::Blendable;
//!
//! let mut level = Blendable::new(0.0_f32, 0.7).with_target(1.0);
//! level.advance(1.0 / 60.0);
//! assert!(level.current > 0.0 && level.current < 1.0);
//! ```

use bevy::prelude::*;

/// Fraction of the gap closed after `dt` seconds at the given decay rate.
///
/// `rate` must be in (0, 1): it is the remaining fraction after one second.
/// Smaller rates converge faster.
pub fn blend_factor(rate: f32, dt: f32) -> f32 {
    debug_assert!(
        rate > 0.0 && rate < 1.0,
        "blend rate {} outside (0, 1)",
        rate
    );
    1.0 - rate.powf(dt)
}

/// Value types the blend engine can smooth component-wise.
pub trait BlendTarget: Copy {
    /// Move `self` toward `target` by the given closing fraction.
    fn step_toward(self, target: Self, factor: f32) -> Self;

    /// Distance between `self` and `target`, used for arrival tests.
    fn distance_to(self, target: Self) -> f32;
}

impl BlendTarget for f32 {
    fn step_toward(self, target: Self, factor: f32) -> Self {
        self + (target - self) * factor
    }

    fn distance_to(self, target: Self) -> f32 {
        (target - self).abs()
    }
}

impl BlendTarget for Vec2 {
    fn step_toward(self, target: Self, factor: f32) -> Self {
        self.lerp(target, factor)
    }

    fn distance_to(self, target: Self) -> f32 {
        self.distance(target)
    }
}

impl BlendTarget for Vec3 {
    fn step_toward(self, target: Self, factor: f32) -> Self {
        self.lerp(target, factor)
    }

    fn distance_to(self, target: Self) -> f32 {
        self.distance(target)
    }
}

/// A value that chases a target with exponential smoothing.
///
/// Works for scalars, 2D vectors (pointer coordinates), and 3D vectors
/// (positions and linear RGB colors).
#[derive(Clone, Copy, Debug)]
pub struct Blendable<T: BlendTarget> {
    /// Live value, advanced each frame.
    pub current: T,
    /// Value being chased.
    pub target: T,
    /// Remaining fraction after one second, in (0, 1).
    pub rate: f32,
}

impl<T: BlendTarget> Blendable<T> {
    /// Create a blendable that starts settled at `value`.
    pub fn new(value: T, rate: f32) -> Self {
        Self {
            current: value,
            target: value,
            rate,
        }
    }

    /// Set the target, builder style.
    pub fn with_target(mut self, target: T) -> Self {
        self.target = target;
        self
    }

    /// Advance `current` toward `target` over `dt` seconds.
    ///
    /// Zero or negative `dt` is a no-op.
    pub fn advance(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let factor = blend_factor(self.rate, dt);
        self.current = self.current.step_toward(self.target, factor);
    }

    /// Whether `current` is within `epsilon` of `target`.
    pub fn settled(&self, epsilon: f32) -> bool {
        self.current.distance_to(self.target) < epsilon
    }

    /// Jump straight to the target, skipping the transition.
    pub fn snap(&mut self) {
        self.current = self.target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_converges_to_target() {
        let mut value = Blendable::new(0.0_f32, 0.7).with_target(10.0);

        // Sixty frames per second for ten simulated seconds
        for _ in 0..600 {
            value.advance(1.0 / 60.0);
        }

        assert!(
            value.settled(0.01),
            "value should settle near 10.0, got {}",
            value.current
        );
    }

    #[test]
    fn test_blend_never_overshoots() {
        let mut value = Blendable::new(0.0_f32, 0.5).with_target(1.0);
        let mut previous = value.current;

        for _ in 0..200 {
            value.advance(0.1);
            assert!(value.current <= 1.0, "overshot to {}", value.current);
            assert!(
                value.current >= previous,
                "reversed direction: {} -> {}",
                previous,
                value.current
            );
            previous = value.current;
        }
    }

    #[test]
    fn test_blend_is_chunking_invariant() {
        let mut whole = Blendable::new(0.0_f32, 0.3).with_target(1.0);
        let mut split = whole;

        whole.advance(1.0);
        split.advance(0.25);
        split.advance(0.25);
        split.advance(0.5);

        assert!(
            (whole.current - split.current).abs() < 1e-5,
            "one 1s step ({}) should match three chunked steps ({})",
            whole.current,
            split.current
        );
    }

    #[test]
    fn test_rate_is_remaining_fraction_after_one_second() {
        let mut value = Blendable::new(0.0_f32, 0.25).with_target(1.0);
        value.advance(1.0);

        // After one second the remaining gap should equal the rate
        assert!(
            ((1.0 - value.current) - 0.25).abs() < 1e-6,
            "remaining gap {} should be 0.25",
            1.0 - value.current
        );
    }

    #[test]
    fn test_zero_dt_is_a_no_op() {
        let mut value = Blendable::new(3.0_f32, 0.5).with_target(7.0);
        value.advance(0.0);
        assert_eq!(value.current, 3.0);
        value.advance(-1.0);
        assert_eq!(value.current, 3.0);
    }

    #[test]
    fn test_vector_blend_moves_component_wise() {
        let mut position =
            Blendable::new(Vec3::ZERO, 0.5).with_target(Vec3::new(2.0, -4.0, 6.0));
        position.advance(0.5);

        let fraction = position.current.x / 2.0;
        assert!(
            (position.current.y / -4.0 - fraction).abs() < 1e-6,
            "components should close the same fraction"
        );
        assert!((position.current.z / 6.0 - fraction).abs() < 1e-6);
    }

    #[test]
    fn test_snap_lands_exactly_on_target() {
        let mut value = Blendable::new(0.0_f32, 0.9).with_target(5.0);
        value.snap();
        assert_eq!(value.current, 5.0);
        assert!(value.settled(f32::EPSILON));
    }
}
