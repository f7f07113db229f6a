//! Status Panel and Clock Controls
//!
//! The user-facing control surface: a text overlay in the corner showing
//! the clock, light state, camera mode, and scene status, plus the
//! keyboard bindings that stand in for a slider-and-button panel:
//! - `[` / `]` scrub the hour back and forward
//! - `-` / `=` halve and double the simulated clock speed
//! - `Space` pauses the clock, `W` returns it to live wall time
//! - `L` toggles the manual light override
//!
//! Key presses land in the [`ControlPanel`] resource as pending requests
//! and a separate system applies them to the clock. The panel never
//! touches light or camera state directly apart from the light toggle.

use bevy::prelude::*;

use crate::camera_modes::{CameraDirector, CameraMode, FocusState};
use crate::exhibits::ExhibitRegistry;
use crate::light_rig::LightRig;
use crate::picking::{CursorHint, HoverState};
use crate::scene_loading::{LoadPhase, SceneLoader};
use crate::sun_cycle::{ClockSource, DayClock};

/// Speed the clock simulation starts at when entering via the speed keys.
pub const DEFAULT_SIM_SPEED: f32 = 0.5;
/// Simulated speed bounds, in hours per real second.
pub const MIN_SIM_SPEED: f32 = 0.0625;
pub const MAX_SIM_SPEED: f32 = 8.0;

/// Pending control requests, written by the key bindings and consumed
/// when applied to the clock.
#[derive(Resource, Default)]
pub struct ControlPanel {
    /// Hour scrub waiting to be applied.
    pub hour_step: f32,
    /// Speed doublings (positive) or halvings (negative) waiting.
    pub speed_steps: i32,
    pub toggle_pause: bool,
    pub switch_to_wall: bool,
}

/// Marker for the overlay text entity.
#[derive(Component)]
pub struct StatusText;

/// `14.25` -> `"14:15"`.
pub fn format_hour(hour: f32) -> String {
    let h = hour.floor();
    let m = ((hour - h) * 60.0).floor();
    format!("{:02}:{:02}", h as u32, m as u32)
}

/// Apply doubling steps to a simulated speed, entering at the default
/// speed when the clock was not simulating.
fn stepped_speed(current: f32, steps: i32) -> f32 {
    let base = if current == 0.0 {
        DEFAULT_SIM_SPEED
    } else {
        current
    };
    (base * 2.0_f32.powi(steps)).clamp(MIN_SIM_SPEED, MAX_SIM_SPEED)
}

// ============================================================================
// Systems
// ============================================================================

pub fn spawn_status_panel(mut commands: Commands) {
    commands.spawn((
        Text::new("showroom"),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgb(0.92, 0.92, 0.88)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        StatusText,
    ));
}

/// Translate key presses into panel requests. The light toggle applies
/// immediately, everything else waits for [`apply_panel`].
pub fn panel_keys(
    keys: Res<ButtonInput<KeyCode>>,
    mut panel: ResMut<ControlPanel>,
    mut rig: ResMut<LightRig>,
) {
    if keys.just_pressed(KeyCode::BracketLeft) {
        panel.hour_step -= 1.0;
    }
    if keys.just_pressed(KeyCode::BracketRight) {
        panel.hour_step += 1.0;
    }
    if keys.just_pressed(KeyCode::Minus) {
        panel.speed_steps -= 1;
    }
    if keys.just_pressed(KeyCode::Equal) {
        panel.speed_steps += 1;
    }
    if keys.just_pressed(KeyCode::Space) {
        panel.toggle_pause = true;
    }
    if keys.just_pressed(KeyCode::KeyW) {
        panel.switch_to_wall = true;
    }
    if keys.just_pressed(KeyCode::KeyL) {
        rig.toggle_override();
        info!(
            "Light override {}",
            if rig.switch.override_active { "engaged" } else { "released" }
        );
    }
}

/// Consume pending panel requests into the day clock.
pub fn apply_panel(mut panel: ResMut<ControlPanel>, mut clock: ResMut<DayClock>) {
    if panel.switch_to_wall {
        panel.switch_to_wall = false;
        *clock = DayClock::wall();
        info!("Clock following live wall time");
    }

    if panel.toggle_pause {
        panel.toggle_pause = false;
        clock.paused = !clock.paused;
        info!("Clock {}", if clock.paused { "paused" } else { "resumed" });
    }

    if panel.hour_step != 0.0 {
        let step = panel.hour_step;
        panel.hour_step = 0.0;
        // Scrubbing only makes sense on a held clock; a zero-speed
        // simulation keeps the chosen hour in place
        if matches!(clock.source, ClockSource::Wall) {
            clock.source = ClockSource::Simulated {
                hours_per_second: 0.0,
            };
        }
        let hour = clock.hour + step;
        clock.set_hour(hour);
        info!("Clock scrubbed to {}", format_hour(clock.hour));
    }

    if panel.speed_steps != 0 {
        let steps = panel.speed_steps;
        panel.speed_steps = 0;
        let current = match clock.source {
            ClockSource::Simulated { hours_per_second } => hours_per_second,
            ClockSource::Wall => 0.0,
        };
        let speed = stepped_speed(current, steps);
        clock.source = ClockSource::Simulated {
            hours_per_second: speed,
        };
        info!("Clock speed {:.3} h/s", speed);
    }
}

/// Rebuild the overlay text from the live resources.
pub fn refresh_status_panel(
    clock: Res<DayClock>,
    rig: Res<LightRig>,
    director: Res<CameraDirector>,
    hover: Res<HoverState>,
    loader: Res<SceneLoader>,
    registry: Res<ExhibitRegistry>,
    mut texts: Query<&mut Text, With<StatusText>>,
) {
    let clock_desc = match clock.source {
        ClockSource::Wall => "live".to_string(),
        ClockSource::Simulated { hours_per_second } if hours_per_second == 0.0 => "held".to_string(),
        ClockSource::Simulated { hours_per_second } => {
            format!("sim x{:.2} h/s", hours_per_second)
        }
    };
    let paused = if clock.paused { "  (paused)" } else { "" };

    let daylight = if rig.switch.override_active {
        "override"
    } else if rig.is_night() {
        "night"
    } else {
        "day"
    };
    let lights = if rig.switch.lights_on {
        "room lights on"
    } else {
        "room lights low"
    };

    let exhibit_name = |index: usize| {
        registry
            .get(index)
            .map(|e| e.spec.name.as_str())
            .unwrap_or("?")
    };
    let camera_desc = match director.effective_mode() {
        CameraMode::MouseFollow => "mouse follow".to_string(),
        CameraMode::Orbit => "orbit".to_string(),
        CameraMode::Focus => match director.focus {
            FocusState::Approaching { exhibit } => {
                format!("focusing {}", exhibit_name(exhibit))
            }
            FocusState::Holding { exhibit } => format!("viewing {}", exhibit_name(exhibit)),
            FocusState::Returning => "returning".to_string(),
            FocusState::Idle => "mouse follow".to_string(),
        },
    };

    let mut lines = vec![
        format!("{}{}  {}", format_hour(clock.hour), paused, clock_desc),
        format!("{}, {}", daylight, lights),
        format!("camera: {}", camera_desc),
    ];

    if let Some(hit) = &hover.hovered {
        let hint = match hover.cursor {
            CursorHint::Clickable => "  (click to view)",
            CursorHint::Default => "",
        };
        lines.push(format!("hover: {}{}", exhibit_name(hit.exhibit), hint));
    }

    if loader.phase != LoadPhase::Ready {
        match &loader.error {
            Some(detail) => lines.push(format!("scene: {} ({})", loader.phase.label(), detail)),
            None => lines.push(format!("scene: {}", loader.phase.label())),
        }
    }

    lines.push("[ ] hour   - = speed   space pause   W live   L lights   O orbit   esc back".into());

    let joined = lines.join("\n");
    for mut text in &mut texts {
        if text.0 != joined {
            text.0 = joined.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hour() {
        assert_eq!(format_hour(0.0), "00:00");
        assert_eq!(format_hour(6.25), "06:15");
        assert_eq!(format_hour(13.5), "13:30");
        assert_eq!(format_hour(23.999), "23:59");
    }

    #[test]
    fn test_stepped_speed_doubles_and_halves() {
        assert_eq!(stepped_speed(1.0, 1), 2.0);
        assert_eq!(stepped_speed(1.0, -1), 0.5);
        assert_eq!(stepped_speed(1.0, 3), 8.0);
    }

    #[test]
    fn test_stepped_speed_clamps() {
        assert_eq!(stepped_speed(8.0, 1), MAX_SIM_SPEED);
        assert_eq!(stepped_speed(0.0625, -1), MIN_SIM_SPEED);
    }

    #[test]
    fn test_stepped_speed_enters_at_default() {
        assert_eq!(stepped_speed(0.0, 1), DEFAULT_SIM_SPEED * 2.0);
        assert_eq!(stepped_speed(0.0, -1), DEFAULT_SIM_SPEED / 2.0);
    }
}
