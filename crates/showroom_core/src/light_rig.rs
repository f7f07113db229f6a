//! Light Rig and Day/Night Switch Controller
//!
//! Owns every light in the showroom apart from what the loaded model
//! bakes in:
//! - One directional sun, driven continuously by the trajectory model
//! - Room lights (ceiling fill), on while the interior is in its bright
//!   daytime state
//! - Practical lights (lamps, sconces), on at night
//! - Glow materials (signage emissives), lit at night
//! - The scene's ambient level
//!
//! A throttled simulation tick samples the trajectory and decides
//! targets; an unthrottled per-frame pass advances the blends and writes
//! the results into Bevy's light and material components. Lights cross
//! between states in about three seconds, the sun drifts over tens of
//! seconds.
//!
//! The manual override toggle suspends the automatic switching: the
//! first press flips the interior state and freezes the sun where its
//! targets stand, the second press releases control back to the clock.
//!
//! # Example
//!
//! ```ignore
//! use showroom_core::light_rig::LightRig;
//! use showroom_core::sun_cycle::SunCycleConfig;
//!
//! let sun_config = SunCycleConfig::default();
//! let mut rig = LightRig::default();
//! rig.register_room_light(ceiling_light, 1.4);
//! rig.prime(12.0, &sun_config);   // settle at noon before the first frame
//! rig.simulation_tick(21.0, &sun_config);
//! rig.advance(1.0 / 60.0);
//! ```

use bevy::color::LinearRgba;
use bevy::prelude::*;

use crate::blend::Blendable;
use crate::sun_cycle::{DayClock, SunCycleConfig};

/// Marker for the sun's directional light entity.
#[derive(Component)]
pub struct SunLight;

/// Tuning constants for the rig.
#[derive(Clone, Debug)]
pub struct LightRigConfig {
    /// Fraction of remaining distance lights keep after one second.
    pub light_rate: f32,
    /// Same, for the sun's position/intensity/color.
    pub sun_rate: f32,
    /// Sun intensity below which the scene counts as night.
    pub night_threshold: f32,
    /// Off target for lights when the automatic cycle darkens them.
    /// Never zero, a fully black light state reads as a rendering bug.
    pub night_floor: f32,
    /// Off target while the manual override holds lights dark. Kept
    /// separate from the night floor; the two are tuned independently.
    pub override_floor: f32,
    /// Seconds between simulation ticks in steady state.
    pub steady_tick_interval: f32,
    /// Seconds between ticks while the clock simulation runs.
    pub simulating_tick_interval: f32,
    /// Ambient level targets for the bright and dark interior states.
    pub ambient_day: f32,
    pub ambient_night: f32,
    /// Scale from trajectory intensity units to directional lux.
    pub sun_illuminance_scale: f32,
    /// Scale from light levels to point-light intensity.
    pub point_intensity_scale: f32,
    /// Scale from the ambient level to Bevy's ambient brightness.
    pub ambient_brightness_scale: f32,
    /// Scale from glow levels to emissive channel values.
    pub emissive_scale: f32,
}

impl Default for LightRigConfig {
    fn default() -> Self {
        Self {
            light_rate: 0.7,
            sun_rate: 0.95,
            night_threshold: 0.1,
            night_floor: 0.02,
            override_floor: 0.03,
            steady_tick_interval: 1.0,
            simulating_tick_interval: 0.05,
            ambient_day: 0.8,
            ambient_night: 0.25,
            sun_illuminance_scale: 1700.0,
            point_intensity_scale: 60_000.0,
            ambient_brightness_scale: 250.0,
            emissive_scale: 8.0,
        }
    }
}

/// Whether the interior is in its bright state, and who decided.
#[derive(Clone, Copy, Debug, Default)]
pub struct SwitchState {
    /// Room lights on (the bright daytime interior).
    pub lights_on: bool,
    /// Manual override suspending the automatic cycle.
    pub override_active: bool,
}

/// One registered light with its on level and blended current level.
/// Levels are unitless; the rig scales them when writing to components.
pub struct LightGroupEntry {
    pub light: Entity,
    pub on_value: f32,
    /// Base off level. The active floor wins when it is larger.
    pub off_value: f32,
    pub level: Blendable<f32>,
}

/// One registered emissive material channel. Floors never apply here,
/// a sign that is fully dark is fine.
pub struct GlowMaterialEntry {
    pub material: Handle<StandardMaterial>,
    pub tint: Vec3,
    pub on_level: f32,
    pub off_level: f32,
    pub level: Blendable<f32>,
}

/// Registry and state for all rig-owned lights.
#[derive(Resource)]
pub struct LightRig {
    pub config: LightRigConfig,
    pub switch: SwitchState,
    is_night: bool,
    /// Forces the next tick to retarget even without a day/night flip.
    /// Set at construction and when the override is released.
    retarget_pending: bool,
    tick_accumulator: f32,
    pub room_lights: Vec<LightGroupEntry>,
    pub practical_lights: Vec<LightGroupEntry>,
    pub glow_materials: Vec<GlowMaterialEntry>,
    pub ambient: Blendable<f32>,
    pub sun_position: Blendable<Vec3>,
    pub sun_intensity: Blendable<f32>,
    pub sun_color: Blendable<Vec3>,
}

impl Default for LightRig {
    fn default() -> Self {
        Self::new(LightRigConfig::default())
    }
}

impl LightRig {
    pub fn new(config: LightRigConfig) -> Self {
        let sun_rate = config.sun_rate;
        let light_rate = config.light_rate;
        let ambient_day = config.ambient_day;
        Self {
            config,
            switch: SwitchState {
                lights_on: true,
                override_active: false,
            },
            is_night: false,
            retarget_pending: true,
            tick_accumulator: 0.0,
            room_lights: Vec::new(),
            practical_lights: Vec::new(),
            glow_materials: Vec::new(),
            ambient: Blendable::new(ambient_day, light_rate),
            sun_position: Blendable::new(Vec3::ZERO, sun_rate),
            sun_intensity: Blendable::new(0.0, sun_rate),
            sun_color: Blendable::new(Vec3::ONE, sun_rate),
        }
    }

    pub fn is_night(&self) -> bool {
        self.is_night
    }

    /// Floor in effect for darkened lights right now.
    fn current_floor(&self) -> f32 {
        if self.switch.override_active {
            self.config.override_floor
        } else {
            self.config.night_floor
        }
    }

    fn room_target(lights_on: bool, entry: &LightGroupEntry, floor: f32) -> f32 {
        if lights_on {
            entry.on_value
        } else {
            entry.off_value.max(floor)
        }
    }

    fn practical_target(lights_on: bool, entry: &LightGroupEntry, floor: f32) -> f32 {
        if lights_on {
            entry.off_value.max(floor)
        } else {
            entry.on_value
        }
    }

    fn glow_target(lights_on: bool, entry: &GlowMaterialEntry) -> f32 {
        if lights_on {
            entry.off_level
        } else {
            entry.on_level
        }
    }

    /// Add a ceiling/fill light. It spawns already settled at the level
    /// the current switch state calls for, so late registration after
    /// model load never fades in from black.
    pub fn register_room_light(&mut self, light: Entity, on_value: f32) {
        let entry = LightGroupEntry {
            light,
            on_value,
            off_value: 0.0,
            level: Blendable::new(0.0, self.config.light_rate),
        };
        let level = Self::room_target(self.switch.lights_on, &entry, self.current_floor());
        self.room_lights.push(LightGroupEntry {
            level: Blendable::new(level, self.config.light_rate),
            ..entry
        });
    }

    /// Add a practical (lamp/sconce) light, settled like room lights.
    pub fn register_practical_light(&mut self, light: Entity, on_value: f32) {
        let entry = LightGroupEntry {
            light,
            on_value,
            off_value: 0.0,
            level: Blendable::new(0.0, self.config.light_rate),
        };
        let level = Self::practical_target(self.switch.lights_on, &entry, self.current_floor());
        self.practical_lights.push(LightGroupEntry {
            level: Blendable::new(level, self.config.light_rate),
            ..entry
        });
    }

    /// Add an emissive material channel, settled at its current target.
    pub fn register_glow_material(
        &mut self,
        material: Handle<StandardMaterial>,
        tint: Vec3,
        on_level: f32,
        off_level: f32,
    ) {
        let entry = GlowMaterialEntry {
            material,
            tint,
            on_level,
            off_level,
            level: Blendable::new(0.0, self.config.light_rate),
        };
        let level = Self::glow_target(self.switch.lights_on, &entry);
        self.glow_materials.push(GlowMaterialEntry {
            level: Blendable::new(level, self.config.light_rate),
            ..entry
        });
    }

    /// Point every group's blend at the value its side of the switch
    /// calls for.
    fn retarget_groups(&mut self, floor: f32) {
        let lights_on = self.switch.lights_on;
        for entry in &mut self.room_lights {
            entry.level.target = Self::room_target(lights_on, entry, floor);
        }
        for entry in &mut self.practical_lights {
            entry.level.target = Self::practical_target(lights_on, entry, floor);
        }
        for entry in &mut self.glow_materials {
            entry.level.target = Self::glow_target(lights_on, entry);
        }
        self.ambient.target = if lights_on {
            self.config.ambient_day
        } else {
            self.config.ambient_night
        };
    }

    /// Throttle gate. Accumulates frame time and fires at the steady
    /// cadence, or the fast one while the clock simulation runs.
    pub fn should_tick(&mut self, dt: f32, simulating: bool) -> bool {
        self.tick_accumulator += dt;
        let interval = if simulating {
            self.config.simulating_tick_interval
        } else {
            self.config.steady_tick_interval
        };
        if self.tick_accumulator >= interval {
            self.tick_accumulator = 0.0;
            true
        } else {
            false
        }
    }

    /// One simulation tick: sample the trajectory, re-aim the sun, and
    /// retarget the groups when day/night flips.
    ///
    /// While the override holds, the tick is a no-op. The sun stays
    /// frozen at its last targets and the groups keep whatever the
    /// manual toggle set.
    pub fn simulation_tick(&mut self, hour: f32, sun_config: &SunCycleConfig) {
        if self.switch.override_active {
            return;
        }

        let sample = sun_config.sample(hour);
        self.sun_position.target = sample.position;
        self.sun_intensity.target = sample.intensity;
        self.sun_color.target = sample.color;

        let night_now = sample.intensity < self.config.night_threshold;
        let flipped = night_now != self.is_night;
        self.is_night = night_now;

        if flipped || self.retarget_pending {
            self.retarget_pending = false;
            self.switch.lights_on = !night_now;
            self.retarget_groups(self.config.night_floor);
        }
    }

    /// Manual light switch.
    ///
    /// First press takes the interior away from the clock: the override
    /// engages and the bright/dark state flips, with darkened lights
    /// resting on the override floor. Second press hands control back;
    /// nothing changes until the next simulation tick reasserts the
    /// automatic targets.
    pub fn toggle_override(&mut self) {
        if !self.switch.override_active {
            self.switch.override_active = true;
            self.switch.lights_on = !self.switch.lights_on;
            self.retarget_groups(self.config.override_floor);
        } else {
            self.switch.override_active = false;
            self.retarget_pending = true;
        }
    }

    /// Advance every blend. Runs once per frame, never throttled.
    pub fn advance(&mut self, dt: f32) {
        for entry in &mut self.room_lights {
            entry.level.advance(dt);
        }
        for entry in &mut self.practical_lights {
            entry.level.advance(dt);
        }
        for entry in &mut self.glow_materials {
            entry.level.advance(dt);
        }
        self.ambient.advance(dt);
        self.sun_position.advance(dt);
        self.sun_intensity.advance(dt);
        self.sun_color.advance(dt);
    }

    /// Jump every blend straight to its target.
    pub fn snap_all(&mut self) {
        for entry in &mut self.room_lights {
            entry.level.snap();
        }
        for entry in &mut self.practical_lights {
            entry.level.snap();
        }
        for entry in &mut self.glow_materials {
            entry.level.snap();
        }
        self.ambient.snap();
        self.sun_position.snap();
        self.sun_intensity.snap();
        self.sun_color.snap();
    }

    /// Tick once and settle everything, so the first rendered frame
    /// already shows the state the clock calls for.
    pub fn prime(&mut self, hour: f32, sun_config: &SunCycleConfig) {
        self.simulation_tick(hour, sun_config);
        self.snap_all();
    }
}

// ============================================================================
// Systems
// ============================================================================

/// Throttled simulation tick.
pub fn tick_light_rig(
    time: Res<Time>,
    clock: Res<DayClock>,
    sun_config: Res<SunCycleConfig>,
    mut rig: ResMut<LightRig>,
) {
    if rig.should_tick(time.delta_secs(), clock.is_simulating()) {
        rig.simulation_tick(clock.hour, &sun_config);
    }
}

/// Per-frame blend advance.
pub fn advance_light_blends(time: Res<Time>, mut rig: ResMut<LightRig>) {
    rig.advance(time.delta_secs());
}

/// Write blended values into the live light and material components.
/// Entries whose entity or material has gone away are skipped; the
/// loaded model can be replaced under the rig.
pub fn apply_light_rig(
    rig: Res<LightRig>,
    sun_config: Res<SunCycleConfig>,
    mut ambient: ResMut<AmbientLight>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut sun: Query<(&mut DirectionalLight, &mut Transform), With<SunLight>>,
    mut point_lights: Query<&mut PointLight, Without<SunLight>>,
) {
    if let Ok((mut light, mut transform)) = sun.single_mut() {
        let color = rig.sun_color.current;
        light.color = Color::linear_rgb(color.x, color.y, color.z);
        light.illuminance = rig.sun_intensity.current.max(0.0) * rig.config.sun_illuminance_scale;
        transform.translation = rig.sun_position.current;
        transform.look_at(sun_config.arc_center, Vec3::Y);
    }

    for entry in rig.room_lights.iter().chain(rig.practical_lights.iter()) {
        if let Ok(mut light) = point_lights.get_mut(entry.light) {
            light.intensity = entry.level.current.max(0.0) * rig.config.point_intensity_scale;
        }
    }

    for entry in &rig.glow_materials {
        if let Some(material) = materials.get_mut(&entry.material) {
            let glow = entry.tint * entry.level.current.max(0.0) * rig.config.emissive_scale;
            material.emissive = LinearRgba::new(glow.x, glow.y, glow.z, 1.0);
        }
    }

    ambient.brightness = rig.ambient.current.max(0.0) * rig.config.ambient_brightness_scale;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig_with_lights() -> LightRig {
        let mut rig = LightRig::default();
        rig.register_room_light(Entity::PLACEHOLDER, 1.4);
        rig.register_practical_light(Entity::PLACEHOLDER, 1.0);
        rig.register_glow_material(Handle::default(), Vec3::new(1.0, 0.55, 0.75), 1.0, 0.05);
        rig
    }

    #[test]
    fn test_prime_settles_at_daytime_state() {
        let sun_config = SunCycleConfig::default();
        let mut rig = rig_with_lights();
        rig.prime(12.0, &sun_config);

        assert!(rig.switch.lights_on);
        assert!(!rig.is_night());
        assert_eq!(rig.room_lights[0].level.current, 1.4);
        assert_eq!(rig.practical_lights[0].level.current, 0.02);
        assert_eq!(rig.glow_materials[0].level.current, 0.05);
        assert_eq!(rig.sun_intensity.current, 6.0);
        assert_eq!(rig.ambient.current, rig.config.ambient_day);
    }

    #[test]
    fn test_night_flip_floors_room_lights() {
        let sun_config = SunCycleConfig::default();
        let mut rig = rig_with_lights();
        rig.prime(12.0, &sun_config);

        rig.simulation_tick(22.0, &sun_config);

        assert!(rig.is_night());
        assert!(!rig.switch.lights_on);
        assert_eq!(rig.room_lights[0].level.target, 0.02, "night floor, not zero");
        assert_eq!(rig.practical_lights[0].level.target, 1.0);
        assert_eq!(rig.glow_materials[0].level.target, 1.0, "sign glows at night");
        assert_eq!(rig.ambient.target, rig.config.ambient_night);
        assert_eq!(rig.sun_intensity.target, 0.0);
    }

    #[test]
    fn test_no_flip_means_no_retarget() {
        let sun_config = SunCycleConfig::default();
        let mut rig = rig_with_lights();
        rig.prime(12.0, &sun_config);

        // Nudge a level off its target, then tick within the same day state
        rig.room_lights[0].level.target = 0.5;
        rig.simulation_tick(13.0, &sun_config);
        assert_eq!(
            rig.room_lights[0].level.target, 0.5,
            "tick without a flip must leave group targets alone"
        );
    }

    #[test]
    fn test_override_flips_and_freezes_sun() {
        let sun_config = SunCycleConfig::default();
        let mut rig = rig_with_lights();
        rig.prime(12.0, &sun_config);

        rig.toggle_override();
        assert!(rig.switch.override_active);
        assert!(!rig.switch.lights_on, "daytime override turns the room dark");
        assert_eq!(rig.room_lights[0].level.target, 0.03, "override floor");
        assert_eq!(rig.practical_lights[0].level.target, 1.0);

        // Ticks while overridden change nothing, including the sun
        let frozen_sun = rig.sun_intensity.target;
        let frozen_position = rig.sun_position.target;
        rig.simulation_tick(22.0, &sun_config);
        assert_eq!(rig.sun_intensity.target, frozen_sun);
        assert_eq!(rig.sun_position.target, frozen_position);
        assert_eq!(rig.room_lights[0].level.target, 0.03);
    }

    #[test]
    fn test_double_toggle_resumes_auto_on_next_tick() {
        let sun_config = SunCycleConfig::default();
        let mut rig = rig_with_lights();
        rig.prime(12.0, &sun_config);

        rig.toggle_override();
        rig.toggle_override();
        assert!(!rig.switch.override_active);
        assert_eq!(
            rig.room_lights[0].level.target, 0.03,
            "release alone must not move targets"
        );

        // Next tick reasserts the automatic daytime state
        rig.simulation_tick(12.5, &sun_config);
        assert!(rig.switch.lights_on);
        assert_eq!(rig.room_lights[0].level.target, 1.4);
        assert_eq!(rig.sun_intensity.target, 6.0);
    }

    #[test]
    fn test_auto_floor_differs_from_override_floor() {
        let sun_config = SunCycleConfig::default();
        let mut rig = rig_with_lights();
        rig.prime(22.0, &sun_config);
        assert_eq!(rig.room_lights[0].level.current, 0.02);

        // Override at night: bright interior, then flip back off manually
        rig.toggle_override();
        assert!(rig.switch.lights_on);
        rig.toggle_override();
        rig.toggle_override();
        assert_eq!(
            rig.room_lights[0].level.target, 0.03,
            "manual off rests on the override floor"
        );
    }

    #[test]
    fn test_registration_spawns_settled() {
        let sun_config = SunCycleConfig::default();
        let mut rig = LightRig::default();
        rig.prime(22.0, &sun_config);

        rig.register_room_light(Entity::PLACEHOLDER, 2.0);
        rig.register_practical_light(Entity::PLACEHOLDER, 0.8);
        let room = &rig.room_lights[0];
        assert_eq!(room.level.current, 0.02);
        assert!(room.level.settled(1e-6), "late lights must not fade in");
        assert_eq!(rig.practical_lights[0].level.current, 0.8);
    }

    #[test]
    fn test_throttle_steady_and_simulating_cadence() {
        let mut rig = LightRig::default();

        // Steady state: one tick per second. Quarter-second frames keep
        // the accumulated comparison exact.
        let mut ticks = 0;
        for _ in 0..12 {
            if rig.should_tick(0.25, false) {
                ticks += 1;
            }
        }
        assert_eq!(ticks, 3, "3 seconds of frames at 1 Hz");

        // Simulating: 20 per second
        let mut rig = LightRig::default();
        let mut ticks = 0;
        for _ in 0..60 {
            if rig.should_tick(1.0 / 60.0, true) {
                ticks += 1;
            }
        }
        assert_eq!(ticks, 20, "1 second of frames at 20 Hz");
    }

    #[test]
    fn test_sun_blends_slower_than_lights() {
        let sun_config = SunCycleConfig::default();
        let mut rig = rig_with_lights();
        rig.prime(12.0, &sun_config);
        rig.simulation_tick(22.0, &sun_config);

        rig.advance(1.0);

        // After one second the lights have crossed 30% of the way, the
        // sun only 5%
        let light_progress = (1.4 - rig.room_lights[0].level.current) / (1.4 - 0.02);
        let sun_progress = (6.0 - rig.sun_intensity.current) / 6.0;
        assert!(light_progress > 0.29 && light_progress < 0.31);
        assert!(sun_progress > 0.049 && sun_progress < 0.051);
    }
}
