//! Daylight Snapshot Capture
//!
//! Captures a series of screenshots at chosen hours of the day cycle.
//! Useful for eyeballing the whole lighting sweep in one folder after
//! tuning the sun or the fixtures.
//!
//! Each step holds the clock at the target hour, snaps the light rig to
//! its settled state for that hour, waits a few frames for the renderer
//! to catch up, then captures and moves on. The app exits once the last
//! hour is written.
//!
//! # Usage
//!
//! ```ignore
//! use showroom_core::{DaylightSnapshots, ShowroomApp};
//!
//! ShowroomApp::new("Showroom")
//!     .with_snapshots(DaylightSnapshots::key_hours("snapshots/daylight"))
//!     .run();
//! ```

use bevy::prelude::*;
use bevy::render::view::screenshot::{save_to_disk, Screenshot};
use std::path::Path;

use crate::light_rig::LightRig;
use crate::sun_cycle::{ClockSource, DayClock, SunCycleConfig};

/// Configuration and progress for a snapshot run.
#[derive(Resource, Clone)]
pub struct DaylightSnapshots {
    /// Output directory for the captured images.
    pub output_dir: String,

    /// Hours (0-24) to capture, in order.
    pub capture_hours: Vec<f32>,

    /// Index of the next capture.
    pub current_index: usize,

    /// Whether the run is still going.
    pub active: bool,

    /// Frames to wait after snapping the rig before capturing.
    pub settle_frames: u32,

    /// Current settle frame counter.
    pub settle_counter: u32,

    pub state: SnapshotState,
}

/// State machine for one capture step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SnapshotState {
    /// Hold the clock at the target hour and snap the rig.
    #[default]
    SettingHour,
    /// Waiting for the renderer to show the snapped state.
    Settling,
    /// Capture the screenshot this frame.
    Capturing,
    /// Screenshot queued, move to the next hour.
    Advancing,
}

impl DaylightSnapshots {
    /// Capture at specific hours.
    pub fn at_hours(output_dir: impl Into<String>, hours: Vec<f32>) -> Self {
        Self {
            output_dir: output_dir.into(),
            capture_hours: hours,
            current_index: 0,
            active: true,
            settle_frames: 3,
            settle_counter: 0,
            state: SnapshotState::SettingHour,
        }
    }

    /// Capture `count` evenly spaced hours across the day.
    pub fn evenly_spaced(output_dir: impl Into<String>, count: usize) -> Self {
        let hours = (0..count).map(|i| i as f32 * 24.0 / count as f32).collect();
        Self::at_hours(output_dir, hours)
    }

    /// Capture the interesting transition points of the default cycle:
    /// deep night, the sunrise ramp, morning, noon, afternoon, the
    /// sunset ramp, dusk, and lit night.
    pub fn key_hours(output_dir: impl Into<String>) -> Self {
        Self::at_hours(
            output_dir,
            vec![4.0, 6.5, 9.0, 12.0, 15.5, 18.5, 19.5, 22.0],
        )
    }

    /// Set the number of settle frames (default: 3).
    pub fn with_settle_frames(mut self, frames: u32) -> Self {
        self.settle_frames = frames;
        self
    }

    pub fn current_target_hour(&self) -> Option<f32> {
        self.capture_hours.get(self.current_index).copied()
    }

    pub fn current_filename(&self) -> Option<String> {
        self.current_target_hour().map(|hour| {
            format!(
                "{}/daylight_{:02}_{}.png",
                self.output_dir,
                self.current_index,
                hour_tag(hour)
            )
        })
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.capture_hours.len()
    }
}

/// `6.5` -> `"0630"`, for filenames.
fn hour_tag(hour: f32) -> String {
    let h = hour.floor();
    let m = ((hour - h) * 60.0).floor();
    format!("{:02}{:02}", h as u32, m as u32)
}

/// Walk the snapshot state machine: hold the clock, snap the rig,
/// settle, capture, advance, and exit when done.
#[allow(deprecated)]
pub fn capture_daylight_snapshots(
    mut commands: Commands,
    mut snapshots: ResMut<DaylightSnapshots>,
    mut clock: ResMut<DayClock>,
    mut rig: ResMut<LightRig>,
    sun_config: Res<SunCycleConfig>,
    mut app_exit: EventWriter<bevy::app::AppExit>,
) {
    if !snapshots.active || snapshots.is_complete() {
        if snapshots.active {
            snapshots.active = false;
            println!(
                "Daylight snapshots complete: {} frames in {}",
                snapshots.capture_hours.len(),
                snapshots.output_dir
            );
            app_exit.write(bevy::app::AppExit::Success);
        }
        return;
    }

    match snapshots.state {
        SnapshotState::SettingHour => {
            if let Some(hour) = snapshots.current_target_hour() {
                // Zero-speed simulation keeps the hour exactly where we
                // put it between captures
                clock.source = ClockSource::Simulated {
                    hours_per_second: 0.0,
                };
                clock.set_hour(hour);
                rig.simulation_tick(clock.hour, &sun_config);
                rig.snap_all();
                snapshots.settle_counter = 0;
                snapshots.state = SnapshotState::Settling;
            } else {
                snapshots.active = false;
            }
        }

        SnapshotState::Settling => {
            snapshots.settle_counter += 1;
            if snapshots.settle_counter >= snapshots.settle_frames {
                snapshots.state = SnapshotState::Capturing;
            }
        }

        SnapshotState::Capturing => {
            if let Some(filename) = snapshots.current_filename() {
                if let Some(parent) = Path::new(&filename).parent() {
                    let _ = std::fs::create_dir_all(parent);
                }

                let hour = snapshots.current_target_hour().unwrap_or(0.0);
                println!("Capturing daylight snapshot: {} (hour={:.2})", filename, hour);

                commands
                    .spawn(Screenshot::primary_window())
                    .observe(save_to_disk(filename));

                snapshots.state = SnapshotState::Advancing;
            }
        }

        SnapshotState::Advancing => {
            snapshots.current_index += 1;
            snapshots.state = SnapshotState::SettingHour;
        }
    }
}

/// Plugin for daylight snapshot capture.
pub struct DaylightSnapshotPlugin;

impl Plugin for DaylightSnapshotPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            capture_daylight_snapshots.run_if(resource_exists::<DaylightSnapshots>),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evenly_spaced_hours() {
        let snaps = DaylightSnapshots::evenly_spaced("test", 4);
        assert_eq!(snaps.capture_hours, vec![0.0, 6.0, 12.0, 18.0]);
    }

    #[test]
    fn test_filename_format() {
        let snaps = DaylightSnapshots::at_hours("snapshots/test", vec![5.5, 12.0]);
        assert_eq!(
            snaps.current_filename(),
            Some("snapshots/test/daylight_00_0530.png".to_string())
        );
    }

    #[test]
    fn test_key_hours_cover_day_and_night() {
        let snaps = DaylightSnapshots::key_hours("test");
        assert!(snaps.capture_hours.first().copied() < Some(6.0), "starts in darkness");
        assert!(snaps.capture_hours.contains(&12.0), "includes noon");
        assert!(snaps.capture_hours.last().copied() > Some(19.0), "ends after sunset");
    }

    #[test]
    fn test_completion() {
        let mut snaps = DaylightSnapshots::at_hours("test", vec![12.0]);
        assert!(!snaps.is_complete());
        snaps.current_index = 1;
        assert!(snaps.is_complete());
        assert!(snaps.current_filename().is_none());
    }

    #[test]
    fn test_capture_walks_settle_capture_advance() {
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("caps").display().to_string();

        let mut app = App::new();
        app.add_message::<bevy::app::AppExit>();
        app.insert_resource(
            DaylightSnapshots::at_hours(out, vec![12.0, 22.0]).with_settle_frames(2),
        );
        app.insert_resource(DayClock::simulated(0.0, 0.0));
        app.insert_resource(LightRig::default());
        app.insert_resource(SunCycleConfig::default());
        app.add_systems(Update, capture_daylight_snapshots);

        // Frame 1 holds the clock at the target hour and snaps the rig
        app.update();
        assert_eq!(
            app.world().resource::<DaylightSnapshots>().state,
            SnapshotState::Settling
        );
        assert_eq!(app.world().resource::<DayClock>().hour, 12.0);
        assert!(
            app.world().resource::<LightRig>().switch.lights_on,
            "the noon snap lands in the bright state"
        );

        // Two settle frames, then the capture is queued and the run
        // advances to the next hour
        app.update();
        app.update();
        assert_eq!(
            app.world().resource::<DaylightSnapshots>().state,
            SnapshotState::Capturing
        );
        app.update();
        app.update();
        let snaps = app.world().resource::<DaylightSnapshots>();
        assert_eq!(snaps.current_index, 1);
        assert_eq!(snaps.state, SnapshotState::SettingHour);

        // Second hour walks the same five frames, one more ends the run
        for _ in 0..5 {
            app.update();
        }
        assert_eq!(app.world().resource::<DaylightSnapshots>().current_index, 2);
        app.update();
        assert!(!app.world().resource::<DaylightSnapshots>().active);
        assert_eq!(app.world().resource::<DayClock>().hour, 22.0);
    }
}
