//! Showroom manifest loading.
//!
//! A manifest is a JSON file describing one showroom: the model to load,
//! the exhibits a visitor can focus on, the light fixtures, and the sun
//! cycle tuning. When no manifest is supplied the built-in demo scene is
//! used instead.
//!
//! # Example
//!
//! ```ignore
//! use showroom_core::manifest::load_manifest;
//!
//! let manifest = load_manifest("assets/showroom.json")?;
//! println!("{} exhibits", manifest.exhibits.len());
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::exhibits::{ExhibitSpec, Framing};
use crate::scene_loading::{FixtureAnchor, FixtureSpec, GlowSpec};
use crate::sun_cycle::SunCycleConfig;

/// Errors that can occur while reading a manifest.
#[derive(Debug)]
pub enum ManifestError {
    /// File system error
    Io(std::io::Error),
    /// JSON parse error
    Json(serde_json::Error),
    /// Structurally valid JSON describing an unusable showroom
    Invalid(String),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestError::Io(e) => write!(f, "IO error: {}", e),
            ManifestError::Json(e) => write!(f, "JSON error: {}", e),
            ManifestError::Invalid(msg) => write!(f, "Invalid manifest: {}", msg),
        }
    }
}

impl std::error::Error for ManifestError {}

impl From<std::io::Error> for ManifestError {
    fn from(e: std::io::Error) -> Self {
        ManifestError::Io(e)
    }
}

impl From<serde_json::Error> for ManifestError {
    fn from(e: serde_json::Error) -> Self {
        ManifestError::Json(e)
    }
}

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Top-level showroom description.
#[derive(Resource, Clone, Debug, Serialize, Deserialize)]
pub struct ShowroomManifest {
    /// Window and scene title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Path to a GLTF/GLB model, relative to the asset root. When absent
    /// the built-in stand-in geometry is spawned instead.
    #[serde(default)]
    pub model: Option<String>,

    /// Sun cycle tuning overrides.
    #[serde(default)]
    pub sun: SunSettings,

    /// Camera anchor tuning.
    #[serde(default)]
    pub camera: CameraSettings,

    /// Bright-state lights covering the room.
    #[serde(default)]
    pub room_lights: Vec<RoomLightEntry>,

    /// Dark-state fixture lights (lamps, sconces).
    #[serde(default)]
    pub fixtures: Vec<FixtureEntry>,

    /// Scene nodes whose materials glow in the dark state.
    #[serde(default)]
    pub glow_nodes: Vec<GlowEntry>,

    /// Focusable exhibits.
    #[serde(default)]
    pub exhibits: Vec<ExhibitEntry>,
}

impl Default for ShowroomManifest {
    fn default() -> Self {
        Self::demo()
    }
}

impl ShowroomManifest {
    /// Built-in demo showroom: no model file, three exhibit stands, two
    /// room lights, a lamp fixture, and a glowing sign. Matches the
    /// stand-in geometry spawned when `model` is absent.
    pub fn demo() -> Self {
        Self {
            title: default_title(),
            model: None,
            sun: SunSettings::default(),
            camera: CameraSettings::default(),
            room_lights: vec![
                RoomLightEntry {
                    name: "ceiling left".into(),
                    position: [-3.5, 3.2, 1.0],
                    color: default_light_color(),
                    on_intensity: 1.4,
                },
                RoomLightEntry {
                    name: "ceiling right".into(),
                    position: [3.5, 3.2, 1.0],
                    color: default_light_color(),
                    on_intensity: 1.4,
                },
            ],
            fixtures: vec![
                FixtureEntry {
                    name: "stand lamp".into(),
                    node: Some("stand_b".into()),
                    position: None,
                    color: [1.0, 0.75, 0.45],
                    on_intensity: 1.0,
                },
                FixtureEntry {
                    name: "corner lamp".into(),
                    node: None,
                    position: Some([-6.0, 1.6, -2.0]),
                    color: [1.0, 0.8, 0.5],
                    on_intensity: 0.8,
                },
            ],
            glow_nodes: vec![GlowEntry {
                node: "sign".into(),
                color: [1.0, 0.55, 0.75],
                on_level: 1.0,
                off_level: 0.05,
            }],
            exhibits: vec![
                ExhibitEntry {
                    name: "Alpha".into(),
                    node: "stand_a".into(),
                    framing: FramingEntry::Standoff { view_distance: 3.0 },
                    blend_rate: default_blend_rate(),
                },
                ExhibitEntry {
                    name: "Beta".into(),
                    node: "stand_b".into(),
                    framing: FramingEntry::Explicit {
                        position: [0.0, 1.6, 3.5],
                        look_at: [0.0, 1.0, 0.0],
                    },
                    blend_rate: 0.1,
                },
                ExhibitEntry {
                    name: "Gamma".into(),
                    node: "stand_c".into(),
                    framing: FramingEntry::Standoff { view_distance: 3.5 },
                    blend_rate: default_blend_rate(),
                },
            ],
        }
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> ManifestResult<()> {
        self.sun.validate()?;

        for exhibit in &self.exhibits {
            if exhibit.node.is_empty() {
                return Err(ManifestError::Invalid(format!(
                    "exhibit '{}' has an empty node name",
                    exhibit.name
                )));
            }
            if exhibit.blend_rate <= 0.0 || exhibit.blend_rate >= 1.0 {
                return Err(ManifestError::Invalid(format!(
                    "exhibit '{}' blend_rate {} outside (0, 1)",
                    exhibit.name, exhibit.blend_rate
                )));
            }
            if let FramingEntry::Standoff { view_distance } = exhibit.framing {
                if view_distance <= 0.0 {
                    return Err(ManifestError::Invalid(format!(
                        "exhibit '{}' view_distance must be positive",
                        exhibit.name
                    )));
                }
            }
        }

        for fixture in &self.fixtures {
            match (&fixture.node, &fixture.position) {
                (Some(_), Some(_)) => {
                    return Err(ManifestError::Invalid(format!(
                        "fixture '{}' has both node and position",
                        fixture.name
                    )));
                }
                (None, None) => {
                    return Err(ManifestError::Invalid(format!(
                        "fixture '{}' needs either node or position",
                        fixture.name
                    )));
                }
                _ => {}
            }
            if fixture.on_intensity < 0.0 {
                return Err(ManifestError::Invalid(format!(
                    "fixture '{}' on_intensity must not be negative",
                    fixture.name
                )));
            }
        }

        for glow in &self.glow_nodes {
            if glow.node.is_empty() {
                return Err(ManifestError::Invalid("glow entry has an empty node".into()));
            }
        }

        Ok(())
    }
}

/// Sun cycle knobs a deployment is expected to tune. Everything else keeps
/// the [`SunCycleConfig`] defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SunSettings {
    #[serde(default = "default_sunrise")]
    pub sunrise: f32,
    #[serde(default = "default_sunset")]
    pub sunset: f32,
    #[serde(default = "default_arc_center")]
    pub arc_center: [f32; 3],
    #[serde(default = "default_arc_radius")]
    pub arc_radius: f32,
    #[serde(default = "default_peak_intensity")]
    pub peak_intensity: f32,
}

impl Default for SunSettings {
    fn default() -> Self {
        Self {
            sunrise: default_sunrise(),
            sunset: default_sunset(),
            arc_center: default_arc_center(),
            arc_radius: default_arc_radius(),
            peak_intensity: default_peak_intensity(),
        }
    }
}

impl SunSettings {
    fn validate(&self) -> ManifestResult<()> {
        if !(0.0..24.0).contains(&self.sunrise) || !(0.0..24.0).contains(&self.sunset) {
            return Err(ManifestError::Invalid(
                "sunrise and sunset must be in [0, 24)".into(),
            ));
        }
        if self.sunrise >= self.sunset {
            return Err(ManifestError::Invalid(format!(
                "sunrise {} must come before sunset {}",
                self.sunrise, self.sunset
            )));
        }
        if self.peak_intensity <= 0.0 {
            return Err(ManifestError::Invalid(
                "peak_intensity must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Merge these settings over the engine defaults.
    pub fn to_config(&self) -> SunCycleConfig {
        SunCycleConfig {
            sunrise: self.sunrise,
            sunset: self.sunset,
            arc_center: to_vec3(self.arc_center),
            arc_radius: self.arc_radius,
            peak_intensity: self.peak_intensity,
            ..SunCycleConfig::default()
        }
    }
}

/// Camera anchor tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Resting camera position for the mouse-follow mode.
    #[serde(default = "default_camera_home")]
    pub home: [f32; 3],
    /// Point the camera sways its gaze around.
    #[serde(default = "default_look_center")]
    pub look_center: [f32; 3],
    /// Bounded look offset, in world units, at full pointer deflection.
    #[serde(default = "default_sway_extent")]
    pub sway_extent: [f32; 2],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            home: default_camera_home(),
            look_center: default_look_center(),
            sway_extent: default_sway_extent(),
        }
    }
}

/// A bright-state room light.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomLightEntry {
    #[serde(default = "default_room_light_name")]
    pub name: String,
    pub position: [f32; 3],
    #[serde(default = "default_light_color")]
    pub color: [f32; 3],
    #[serde(default = "default_on_intensity")]
    pub on_intensity: f32,
}

/// A dark-state practical light, anchored to a named scene node or placed
/// at an explicit position. Exactly one of the two must be set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixtureEntry {
    #[serde(default = "default_fixture_name")]
    pub name: String,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub position: Option<[f32; 3]>,
    #[serde(default = "default_fixture_color")]
    pub color: [f32; 3],
    #[serde(default = "default_on_intensity")]
    pub on_intensity: f32,
}

impl FixtureEntry {
    pub fn to_spec(&self) -> FixtureSpec {
        let anchor = match (&self.node, &self.position) {
            (Some(node), _) => FixtureAnchor::Node(node.clone()),
            (None, Some(position)) => FixtureAnchor::Position(to_vec3(*position)),
            // validate() rejects this combination before specs are built
            (None, None) => FixtureAnchor::Position(Vec3::ZERO),
        };
        FixtureSpec {
            name: self.name.clone(),
            anchor,
            color: to_vec3(self.color),
            on_intensity: self.on_intensity,
        }
    }
}

/// A scene node whose material emissive channel follows the light state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlowEntry {
    pub node: String,
    #[serde(default = "default_glow_color")]
    pub color: [f32; 3],
    #[serde(default = "default_on_level")]
    pub on_level: f32,
    #[serde(default = "default_off_level")]
    pub off_level: f32,
}

impl GlowEntry {
    pub fn to_spec(&self) -> GlowSpec {
        GlowSpec {
            node: self.node.clone(),
            tint: to_vec3(self.color),
            on_level: self.on_level,
            off_level: self.off_level,
        }
    }
}

/// A focusable exhibit keyed by scene node name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExhibitEntry {
    pub name: String,
    pub node: String,
    #[serde(default)]
    pub framing: FramingEntry,
    #[serde(default = "default_blend_rate")]
    pub blend_rate: f32,
}

impl ExhibitEntry {
    pub fn to_spec(&self) -> ExhibitSpec {
        ExhibitSpec {
            name: self.name.clone(),
            node: self.node.clone(),
            framing: self.framing.to_framing(),
            blend_rate: self.blend_rate,
        }
    }
}

/// Manifest form of a framing rule.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingEntry {
    /// Exact camera pose.
    Explicit {
        position: [f32; 3],
        look_at: [f32; 3],
    },
    /// Stand off from the exhibit along its outward face.
    Standoff { view_distance: f32 },
}

impl Default for FramingEntry {
    fn default() -> Self {
        FramingEntry::Standoff { view_distance: 4.0 }
    }
}

impl FramingEntry {
    pub fn to_framing(&self) -> Framing {
        match self {
            FramingEntry::Explicit { position, look_at } => Framing::Explicit {
                position: to_vec3(*position),
                look_at: to_vec3(*look_at),
            },
            FramingEntry::Standoff { view_distance } => Framing::Standoff {
                view_distance: *view_distance,
            },
        }
    }
}

/// Load and validate a manifest file.
pub fn load_manifest<P: AsRef<Path>>(path: P) -> ManifestResult<ShowroomManifest> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let manifest: ShowroomManifest = serde_json::from_str(&text)?;
    manifest.validate()?;
    Ok(manifest)
}

fn to_vec3(v: [f32; 3]) -> Vec3 {
    Vec3::from_array(v)
}

fn default_title() -> String {
    "Showroom".to_string()
}

fn default_sunrise() -> f32 {
    6.0
}

fn default_sunset() -> f32 {
    19.0
}

fn default_arc_center() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

fn default_arc_radius() -> f32 {
    40.0
}

fn default_peak_intensity() -> f32 {
    6.0
}

fn default_camera_home() -> [f32; 3] {
    [0.0, 2.2, 9.0]
}

fn default_look_center() -> [f32; 3] {
    [0.0, 1.4, 0.0]
}

fn default_sway_extent() -> [f32; 2] {
    [1.6, 0.8]
}

fn default_room_light_name() -> String {
    "room light".to_string()
}

fn default_fixture_name() -> String {
    "fixture".to_string()
}

fn default_light_color() -> [f32; 3] {
    [1.0, 0.96, 0.9]
}

fn default_fixture_color() -> [f32; 3] {
    [1.0, 0.78, 0.5]
}

fn default_glow_color() -> [f32; 3] {
    [1.0, 0.6, 0.7]
}

fn default_on_intensity() -> f32 {
    1.0
}

fn default_on_level() -> f32 {
    1.0
}

fn default_off_level() -> f32 {
    0.05
}

fn default_blend_rate() -> f32 {
    0.15
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_demo_manifest_validates() {
        let manifest = ShowroomManifest::demo();
        assert!(manifest.validate().is_ok());
        assert_eq!(manifest.exhibits.len(), 3);
    }

    #[test]
    fn test_manifest_round_trips_through_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("showroom.json");

        let manifest = ShowroomManifest::demo();
        let json = serde_json::to_string_pretty(&manifest).expect("serialize");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(json.as_bytes()).expect("write");

        let loaded = load_manifest(&path).expect("load");
        assert_eq!(loaded.title, manifest.title);
        assert_eq!(loaded.exhibits.len(), manifest.exhibits.len());
        assert_eq!(loaded.room_lights.len(), manifest.room_lights.len());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_manifest("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ManifestError::Io(_)), "got {:?}", err);
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").expect("write");

        let err = load_manifest(&path).unwrap_err();
        assert!(matches!(err, ManifestError::Json(_)), "got {:?}", err);
    }

    #[test]
    fn test_sunrise_after_sunset_rejected() {
        let mut manifest = ShowroomManifest::demo();
        manifest.sun.sunrise = 20.0;
        manifest.sun.sunset = 6.0;

        let err = manifest.validate().unwrap_err();
        assert!(matches!(err, ManifestError::Invalid(_)));
    }

    #[test]
    fn test_fixture_needs_exactly_one_anchor() {
        let mut manifest = ShowroomManifest::demo();
        manifest.fixtures[0].node = Some("lamp".into());
        manifest.fixtures[0].position = Some([0.0, 0.0, 0.0]);
        assert!(manifest.validate().is_err());

        manifest.fixtures[0].node = None;
        manifest.fixtures[0].position = None;
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_sparse_manifest_fills_defaults() {
        let json = r#"{
            "exhibits": [
                { "name": "Solo", "node": "pedestal" }
            ]
        }"#;
        let manifest: ShowroomManifest = serde_json::from_str(json).expect("parse");
        assert!(manifest.validate().is_ok());
        assert_eq!(manifest.title, "Showroom");
        assert_eq!(manifest.sun.sunrise, 6.0);
        assert_eq!(manifest.exhibits[0].blend_rate, 0.15);
        assert!(matches!(
            manifest.exhibits[0].framing,
            FramingEntry::Standoff { .. }
        ));
    }

    #[test]
    fn test_bad_blend_rate_rejected() {
        let mut manifest = ShowroomManifest::demo();
        manifest.exhibits[0].blend_rate = 1.5;
        assert!(manifest.validate().is_err());

        manifest.exhibits[0].blend_rate = 0.0;
        assert!(manifest.validate().is_err());
    }
}
