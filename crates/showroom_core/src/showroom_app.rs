//! Application assembly: plugin, frame-phase sets, and a windowed-app
//! builder for the showroom scene controller.
//!
//! `ShowroomPlugin` registers every resource and system in this crate and
//! pins the per-frame ordering. `ShowroomApp` is the front door for
//! binaries: it resolves the layout manifest, opens the window, and wires
//! the plugin together with any snapshot run that was requested.
//!
//! # Usage
//! ```ignore
//! use showroom_core::ShowroomApp;
//!
//! ShowroomApp::new("Showroom")
//!     .with_manifest_file("assets/showroom.json")
//!     .with_resolution(1280, 720)
//!     .run();
//! ```

use std::path::Path;

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::prelude::*;

use crate::camera_modes::{
    camera_mode_keys, drive_camera, handle_focus_requests, CameraDirector, CameraDirectorConfig,
    FocusRequest,
};
use crate::exhibits::ExhibitRegistry;
use crate::light_rig::{advance_light_blends, apply_light_rig, tick_light_rig, LightRig, SunLight};
use crate::manifest::{load_manifest, ShowroomManifest};
use crate::orbit_camera::{orbit_camera_system, OrbitCamera};
use crate::picking::{resolve_clicks, update_hover, ClickTracker, HoverState};
use crate::scene_loading::{poll_model_load, resolve_scene_nodes, setup_scene, SceneLoader};
use crate::snapshot::{DaylightSnapshotPlugin, DaylightSnapshots};
use crate::status_panel::{
    apply_panel, panel_keys, refresh_status_panel, spawn_status_panel, ControlPanel,
};
use crate::sun_cycle::{advance_day_clock, DayClock, SunCycleConfig};

/// Marker for the single showroom camera.
#[derive(Component)]
pub struct ShowroomCamera;

/// Frame phases of the controller. The `Update` schedule runs them in
/// declaration order: input and clock first, then camera movement, then
/// daylight blending, then hover/click resolution.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShowroomSet {
    Input,
    Camera,
    Daylight,
    Picking,
}

/// Registers the full scene controller on an existing [`App`].
///
/// Resources already inserted by the caller (manifest, clock, light rig,
/// camera director) are kept; anything missing is initialized with
/// defaults, so the plugin also works on a bare `App` in headless tests.
pub struct ShowroomPlugin;

impl Plugin for ShowroomPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ShowroomManifest>()
            .init_resource::<SunCycleConfig>()
            .init_resource::<DayClock>()
            .init_resource::<LightRig>()
            .init_resource::<CameraDirector>()
            .init_resource::<SceneLoader>()
            .init_resource::<ExhibitRegistry>()
            .init_resource::<HoverState>()
            .init_resource::<ClickTracker>()
            .init_resource::<ControlPanel>()
            .add_message::<FocusRequest>();

        app.insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 200.0,
            ..default()
        });

        app.configure_sets(
            Update,
            (
                ShowroomSet::Input,
                ShowroomSet::Camera,
                ShowroomSet::Daylight,
                ShowroomSet::Picking,
            )
                .chain(),
        );

        app.add_systems(
            Startup,
            (
                setup_showroom,
                setup_scene,
                prime_light_rig,
                spawn_status_panel,
            )
                .chain(),
        );

        app.add_systems(
            Update,
            (
                panel_keys,
                apply_panel,
                advance_day_clock,
                camera_mode_keys,
                handle_focus_requests,
            )
                .chain()
                .in_set(ShowroomSet::Input),
        );
        app.add_systems(
            Update,
            (orbit_camera_system, drive_camera)
                .chain()
                .in_set(ShowroomSet::Camera),
        );
        app.add_systems(
            Update,
            (tick_light_rig, advance_light_blends, apply_light_rig)
                .chain()
                .in_set(ShowroomSet::Daylight),
        );
        app.add_systems(
            Update,
            (
                poll_model_load,
                resolve_scene_nodes,
                update_hover,
                resolve_clicks,
            )
                .chain()
                .in_set(ShowroomSet::Picking),
        );
        app.add_systems(Update, refresh_status_panel.after(ShowroomSet::Picking));

        app.add_plugins(DaylightSnapshotPlugin);
    }
}

/// Spawns the camera and the sun.
///
/// The camera starts at the manifest home pose with an orbit controller
/// already synced to it, so the first orbit toggle continues from the
/// current view instead of jumping. The sun starts dark below the
/// horizon; the light rig takes over its transform and illuminance.
fn setup_showroom(
    mut commands: Commands,
    director: Res<CameraDirector>,
    sun_config: Res<SunCycleConfig>,
) {
    let home = director.config.home_position;
    let look = director.config.look_center;

    let mut orbit = OrbitCamera::new(home.distance(look), look);
    orbit.sync_from(home, look);

    commands.spawn((
        Camera3d::default(),
        Tonemapping::TonyMcMapface,
        Transform::from_translation(home).looking_at(look, Vec3::Y),
        orbit,
        ShowroomCamera,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 0.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(sun_config.night_position())
            .looking_at(sun_config.arc_center, Vec3::Y),
        SunLight,
        Name::new("sun"),
    ));
}

/// Runs one daylight tick and snaps every blend to its target, so the
/// first rendered frame already shows the correct time of day instead of
/// easing out of an all-dark state. Runs after `setup_scene` so the
/// room lights and fixtures it registered are included.
fn prime_light_rig(
    clock: Res<DayClock>,
    sun_config: Res<SunCycleConfig>,
    mut rig: ResMut<LightRig>,
) {
    rig.prime(clock.hour, &sun_config);
}

/// Where the showroom layout comes from.
pub enum ManifestSource {
    /// Built-in demo layout.
    Demo,
    /// JSON manifest on disk. A missing file falls back to the demo
    /// layout with a console note; a malformed file aborts the process.
    File(String),
    /// Layout supplied directly by the caller.
    Inline(ShowroomManifest),
}

/// Builder for a windowed showroom application.
pub struct ShowroomApp {
    title: String,
    resolution: (u32, u32),
    clear_color: Color,
    manifest: ManifestSource,
    clock: DayClock,
    snapshots: Option<DaylightSnapshots>,
}

impl ShowroomApp {
    /// Create a new app with the given window title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            resolution: (1280, 720),
            clear_color: Color::srgb(0.05, 0.05, 0.08),
            manifest: ManifestSource::Demo,
            clock: DayClock::default(),
            snapshots: None,
        }
    }

    /// Load the layout from a JSON manifest on disk.
    pub fn with_manifest_file(mut self, path: impl Into<String>) -> Self {
        self.manifest = ManifestSource::File(path.into());
        self
    }

    /// Use a layout built in code.
    pub fn with_manifest(mut self, manifest: ShowroomManifest) -> Self {
        self.manifest = ManifestSource::Inline(manifest);
        self
    }

    /// Set window resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = (width, height);
        self
    }

    /// Set clear color.
    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Drive the clock from a simulated hour instead of wall time.
    pub fn with_simulated_clock(mut self, start_hour: f32, hours_per_second: f32) -> Self {
        self.clock = DayClock::simulated(start_hour, hours_per_second);
        self
    }

    /// Capture a sequence of lighting snapshots and exit instead of
    /// running interactively.
    pub fn with_snapshots(mut self, snapshots: DaylightSnapshots) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    /// Resolve the manifest, open the window, and run the app.
    pub fn run(self) {
        let manifest = match self.manifest {
            ManifestSource::Demo => ShowroomManifest::demo(),
            ManifestSource::Inline(manifest) => manifest,
            ManifestSource::File(path) => {
                if Path::new(&path).exists() {
                    match load_manifest(&path) {
                        Ok(manifest) => {
                            println!("Loaded showroom manifest: {}", path);
                            manifest
                        }
                        Err(e) => {
                            eprintln!("ERROR: Failed to load manifest {}: {}", path, e);
                            std::process::exit(1);
                        }
                    }
                } else {
                    println!(
                        "Manifest {} not found, using the built-in demo layout",
                        path
                    );
                    ShowroomManifest::demo()
                }
            }
        };

        let title = if manifest.title.is_empty() {
            self.title.clone()
        } else {
            manifest.title.clone()
        };
        let sun_config = manifest.sun.to_config();
        let camera_config = CameraDirectorConfig {
            home_position: Vec3::from(manifest.camera.home),
            look_center: Vec3::from(manifest.camera.look_center),
            sway_extent: Vec2::from(manifest.camera.sway_extent),
            ..default()
        };

        let mut app = App::new();

        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                resolution: self.resolution.into(),
                title,
                ..default()
            }),
            ..default()
        }));

        app.insert_resource(ClearColor(self.clear_color));
        app.insert_resource(manifest);
        app.insert_resource(sun_config);
        app.insert_resource(self.clock);
        app.insert_resource(CameraDirector::new(camera_config));

        if let Some(snapshots) = self.snapshots {
            app.insert_resource(snapshots);
        }

        app.add_plugins(ShowroomPlugin);
        app.run();
    }
}
