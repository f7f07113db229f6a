//! Core scene controller for the interactive showroom.
//!
//! This crate provides:
//! - Day/night sun trajectory and simulated clock
//! - Light-group blending with a manual override switch
//! - Three-mode camera director with click-to-focus
//! - Hover and click picking against exhibit bounds
//! - GLTF scene loading with a built-in stand-in layout
//! - JSON layout manifest
//! - On-screen status panel and keyboard controls
//! - Daylight snapshot capture for lighting review

pub mod blend;
pub mod camera_modes;
pub mod exhibits;
pub mod light_rig;
pub mod manifest;
pub mod orbit_camera;
pub mod picking;
pub mod scene_loading;
pub mod showroom_app;
pub mod snapshot;
pub mod status_panel;
pub mod sun_cycle;

pub use blend::{blend_factor, BlendTarget, Blendable};
pub use camera_modes::{
    camera_mode_keys, drive_camera, handle_focus_requests, normalized_pointer, CameraDirector,
    CameraDirectorConfig, CameraMode, FocusRequest, FocusState, ReturnPose,
};
pub use exhibits::{
    averaged_normal, resolve_framing, standoff_pose, Exhibit, ExhibitRegistry, ExhibitSpec,
    Framing, FramingPose, ResolvedExhibit, WorldBounds, NORMAL_SAMPLE_LIMIT,
};
pub use light_rig::{
    advance_light_blends, apply_light_rig, tick_light_rig, GlowMaterialEntry, LightGroupEntry,
    LightRig, LightRigConfig, SunLight, SwitchState,
};
pub use manifest::{
    load_manifest, CameraSettings, ExhibitEntry, FixtureEntry, FramingEntry, GlowEntry,
    ManifestError, ManifestResult, RoomLightEntry, ShowroomManifest, SunSettings,
};
pub use orbit_camera::{orbit_camera_system, OrbitCamera};
pub use picking::{
    ray_aabb_intersect, resolve_clicks, update_hover, ClickTracker, CursorHint, HoverHit,
    HoverState, CLICK_DRAG_TOLERANCE,
};
pub use scene_loading::{
    poll_model_load, resolve_scene_nodes, setup_scene, FixtureAnchor, FixtureSpec, GlowSpec,
    LoadPhase, SceneLoader, ShowroomModel, FALLBACK_SIGN_NODE, FALLBACK_STAND_NODES,
};
pub use showroom_app::{
    ManifestSource, ShowroomApp, ShowroomCamera, ShowroomPlugin, ShowroomSet,
};
pub use snapshot::{
    capture_daylight_snapshots, DaylightSnapshotPlugin, DaylightSnapshots, SnapshotState,
};
pub use status_panel::{
    apply_panel, format_hour, panel_keys, refresh_status_panel, spawn_status_panel, ControlPanel,
    StatusText, DEFAULT_SIM_SPEED, MAX_SIM_SPEED, MIN_SIM_SPEED,
};
pub use sun_cycle::{
    advance_day_clock, wrap_hour, ClockSource, DayClock, SunCycleConfig, SunSample,
};
