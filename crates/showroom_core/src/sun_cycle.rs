//! Sun Trajectory Model and Day Clock
//!
//! Maps a decimal hour to the sun's position, intensity, and color:
//! - Low raking arc tuned for long storefront shadows all day
//! - Smoothstep intensity ramps at the sunrise and sunset edges
//! - Warm-dominant color driven by elevation, capped well short of white
//!
//! The clock side produces the hour itself, either from the local wall
//! clock or from a simulated clock running at a configurable speed.
//!
//! # Example
//!
//! ```ignore
//! use showroom_core::sun_cycle::SunCycleConfig;
//!
//! let sun = SunCycleConfig::default();
//! let noon = sun.sample(12.0);
//! assert_eq!(noon.intensity, sun.peak_intensity);
//! ```

use bevy::prelude::*;
use chrono::Timelike;
use std::f32::consts::PI;

/// One evaluation of the sun trajectory. Recomputed on demand, never mutated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunSample {
    /// World position for the sun light.
    pub position: Vec3,
    /// Light intensity, zero at night up to `peak_intensity` at midday.
    pub intensity: f32,
    /// Linear RGB color.
    pub color: Vec3,
}

/// Tuning for the day/night sun trajectory.
///
/// The arc is deliberately flat: the lateral sweep covers only a tenth of
/// the radius while the elevation rises to six tenths, so the sun stays
/// low and the directional shadows stay long.
#[derive(Resource, Clone, Debug)]
pub struct SunCycleConfig {
    /// Hour the day starts (inclusive).
    pub sunrise: f32,
    /// Hour the day ends (inclusive).
    pub sunset: f32,
    /// Center of the arc, usually near the showroom origin.
    pub arc_center: Vec3,
    /// Arc radius before the lateral/vertical scaling.
    pub arc_radius: f32,
    /// Fixed forward offset in z, placing the sun in front of the scene.
    pub forward_offset: f32,
    /// Intensity at the midday plateau.
    pub peak_intensity: f32,
    /// Hours over which intensity ramps up after sunrise and down before sunset.
    pub ramp_hours: f32,
    /// Sub-linear exponent on normalized day time. Values below 1.0 hold the
    /// sun at morning angles longer before it sweeps to the sunset side.
    pub arc_bias: f32,
    /// Color at the horizon and through the night.
    pub dawn_color: Vec3,
    /// Color once the sun has cleared the horizon.
    pub warm_color: Vec3,
    /// Elevation (sin of the arc angle) where dawn gives way to the
    /// warm-to-white blend.
    pub elevation_split: f32,
    /// Cap on the blend toward white, so the light stays warm even at noon.
    pub white_blend_cap: f32,
}

impl Default for SunCycleConfig {
    fn default() -> Self {
        Self {
            sunrise: 6.0,
            sunset: 19.0,
            arc_center: Vec3::ZERO,
            arc_radius: 40.0,
            forward_offset: 12.0,
            peak_intensity: 6.0,
            ramp_hours: 2.0,
            arc_bias: 0.8,
            dawn_color: Vec3::new(1.0, 0.5, 0.3),
            warm_color: Vec3::new(1.0, 0.87, 0.72),
            elevation_split: 0.4,
            white_blend_cap: 0.35,
        }
    }
}

impl SunCycleConfig {
    /// Evaluate the trajectory at a decimal hour.
    ///
    /// The hour must already be wrapped to [0, 24); [`wrap_hour`] and
    /// [`DayClock`] both guarantee that. Hours exactly at sunrise or
    /// sunset count as day.
    pub fn sample(&self, hour: f32) -> SunSample {
        if hour < self.sunrise || hour > self.sunset {
            return SunSample {
                position: self.night_position(),
                intensity: 0.0,
                color: self.dawn_color,
            };
        }

        let day_span = self.sunset - self.sunrise;
        let t = (hour - self.sunrise) / day_span;
        let angle = t.powf(self.arc_bias) * PI;

        let position = self.arc_center
            + Vec3::new(
                0.1 * self.arc_radius * angle.cos(),
                0.6 * self.arc_radius * angle.sin(),
                self.forward_offset,
            );

        // Ramp up after sunrise and down before sunset, plateau between
        let rise = smoothstep(((hour - self.sunrise) / self.ramp_hours).clamp(0.0, 1.0));
        let set = smoothstep(((self.sunset - hour) / self.ramp_hours).clamp(0.0, 1.0));
        let intensity = self.peak_intensity * rise.min(set);

        SunSample {
            position,
            intensity,
            color: self.color_for_elevation(angle.sin()),
        }
    }

    /// Color as a function of elevation rather than time of day.
    ///
    /// Below the split the light climbs from dawn to the warm daytime
    /// color. Above it the blend continues toward white, but eased and
    /// capped so full noon is still clearly warm.
    fn color_for_elevation(&self, elevation: f32) -> Vec3 {
        if elevation < self.elevation_split {
            let t = (elevation / self.elevation_split).clamp(0.0, 1.0);
            self.dawn_color.lerp(self.warm_color, t)
        } else {
            let t = ((elevation - self.elevation_split) / (1.0 - self.elevation_split))
                .clamp(0.0, 1.0);
            let eased = t.powf(1.5);
            self.warm_color.lerp(Vec3::ONE, self.white_blend_cap * eased)
        }
    }

    /// Resting position while the sun is down: just below the horizon on
    /// the sunrise side of the arc. Night-to-dawn is therefore a small
    /// vertical step, and the one large position jump happens at dusk.
    pub fn night_position(&self) -> Vec3 {
        self.arc_center
            + Vec3::new(
                0.1 * self.arc_radius,
                -0.1 * self.arc_radius,
                self.forward_offset,
            )
    }
}

/// Hermite smoothstep, clamped input assumed.
fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Wrap an hour value into [0, 24).
pub fn wrap_hour(hour: f32) -> f32 {
    hour.rem_euclid(24.0)
}

// ============================================================================
// Day Clock
// ============================================================================

/// Where the clock gets its hour from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClockSource {
    /// Follow the local wall clock.
    Wall,
    /// Advance at a fixed number of simulated hours per real second.
    Simulated { hours_per_second: f32 },
}

/// Decimal-hour clock driving the sun trajectory.
#[derive(Resource, Clone, Debug)]
pub struct DayClock {
    /// Hour source.
    pub source: ClockSource,
    /// Current hour in [0, 24).
    pub hour: f32,
    /// Freezes the hour while set.
    pub paused: bool,
}

impl Default for DayClock {
    fn default() -> Self {
        Self::wall()
    }
}

impl DayClock {
    /// Clock that tracks local wall time.
    pub fn wall() -> Self {
        Self {
            source: ClockSource::Wall,
            hour: wall_clock_hour(),
            paused: false,
        }
    }

    /// Simulated clock starting at `start_hour`.
    pub fn simulated(start_hour: f32, hours_per_second: f32) -> Self {
        Self {
            source: ClockSource::Simulated { hours_per_second },
            hour: wrap_hour(start_hour),
            paused: false,
        }
    }

    /// Whether a time simulation is actively running. A paused or
    /// zero-speed simulation does not count.
    pub fn is_simulating(&self) -> bool {
        if self.paused {
            return false;
        }
        matches!(self.source, ClockSource::Simulated { hours_per_second } if hours_per_second != 0.0)
    }

    /// Set the hour directly, wrapping into [0, 24).
    pub fn set_hour(&mut self, hour: f32) {
        self.hour = wrap_hour(hour);
    }

    /// Advance by `dt` real seconds.
    pub fn advance(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        match self.source {
            ClockSource::Wall => self.hour = wall_clock_hour(),
            ClockSource::Simulated { hours_per_second } => {
                self.hour = wrap_hour(self.hour + dt * hours_per_second);
            }
        }
    }
}

/// Current local time as a decimal hour.
fn wall_clock_hour() -> f32 {
    let now = chrono::Local::now();
    now.num_seconds_from_midnight() as f32 / 3600.0
}

/// System that keeps the day clock current.
pub fn advance_day_clock(time: Res<Time>, mut clock: ResMut<DayClock>) {
    clock.advance(time.delta_secs());
}
