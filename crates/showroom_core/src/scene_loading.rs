//! Scene Loading and Node Resolution
//!
//! Brings the showroom geometry into the world and wires the manifest's
//! named references to live entities:
//! - Starts the GLTF load (fire and forget) and polls it to a terminal
//!   loaded/failed state
//! - Spawns built-in stand-in geometry when no model is configured
//! - Once the scene instance exists, resolves named nodes into exhibits
//!   (world bounds + framing pose), fixture lights, and glow materials
//!
//! Scene instances appear asynchronously, so resolution waits until named
//! entities show up under the model root and tolerates references that
//! never do (logged and skipped, the rest of the scene keeps working).
//!
//! # Example
//!
//! ```ignore
//! use showroom_core::scene_loading::{SceneLoader, LoadPhase};
//!
//! fn report(loader: Res<SceneLoader>) {
//!     if loader.phase == LoadPhase::Ready {
//!         info!("scene is interactive");
//!     }
//! }
//! ```

use std::collections::HashMap;

use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use bevy::render::mesh::{MeshAabb, VertexAttributeValues};

use crate::exhibits::{
    averaged_normal, resolve_framing, Exhibit, ExhibitRegistry, ExhibitSpec, ResolvedExhibit,
    WorldBounds, NORMAL_SAMPLE_LIMIT,
};
use crate::light_rig::LightRig;
use crate::manifest::ShowroomManifest;

/// Node names the built-in stand-in scene provides. The demo manifest
/// refers to these.
pub const FALLBACK_STAND_NODES: [&str; 3] = ["stand_a", "stand_b", "stand_c"];
pub const FALLBACK_SIGN_NODE: &str = "sign";

/// Marker for the root entity holding the showroom geometry.
#[derive(Component)]
pub struct ShowroomModel;

/// Where a fixture light sits: on a named scene node, or at a fixed spot.
#[derive(Clone, Debug)]
pub enum FixtureAnchor {
    Node(String),
    Position(Vec3),
}

/// A practical light to spawn once its anchor is known.
#[derive(Clone, Debug)]
pub struct FixtureSpec {
    pub name: String,
    pub anchor: FixtureAnchor,
    /// Linear RGB.
    pub color: Vec3,
    pub on_intensity: f32,
}

/// An emissive material channel to register once its node is known.
#[derive(Clone, Debug)]
pub struct GlowSpec {
    pub node: String,
    /// Linear RGB.
    pub tint: Vec3,
    pub on_level: f32,
    pub off_level: f32,
}

/// Lifecycle of the scene geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadPhase {
    /// Waiting on the model asset.
    #[default]
    Loading,
    /// Geometry spawned, named nodes not yet resolved.
    Spawned,
    /// Fully resolved and interactive.
    Ready,
    /// Terminal load failure. No retry.
    Failed,
}

impl LoadPhase {
    pub fn label(&self) -> &'static str {
        match self {
            LoadPhase::Loading => "loading model",
            LoadPhase::Spawned => "preparing scene",
            LoadPhase::Ready => "ready",
            LoadPhase::Failed => "load failed",
        }
    }
}

/// Tracks the model load and the manifest references still waiting for
/// scene entities to resolve against.
#[derive(Resource, Default)]
pub struct SceneLoader {
    pub model: Option<Handle<Gltf>>,
    pub phase: LoadPhase,
    /// Failure detail for the status panel.
    pub error: Option<String>,
    pending_exhibits: Vec<ExhibitSpec>,
    pending_fixtures: Vec<FixtureSpec>,
    pending_glows: Vec<GlowSpec>,
}

// ============================================================================
// Systems
// ============================================================================

/// Startup: spawn the lights that need no scene geometry, queue up the
/// references that do, and kick off the model load (or build the
/// stand-in scene).
pub fn setup_scene(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    manifest: Res<ShowroomManifest>,
    mut loader: ResMut<SceneLoader>,
    mut rig: ResMut<LightRig>,
) {
    for entry in &manifest.room_lights {
        let entity = commands
            .spawn((
                PointLight {
                    color: Color::linear_rgb(entry.color[0], entry.color[1], entry.color[2]),
                    intensity: 0.0,
                    range: 24.0,
                    shadows_enabled: false,
                    ..default()
                },
                Transform::from_translation(Vec3::from_array(entry.position)),
                Name::new(format!("room light: {}", entry.name)),
            ))
            .id();
        rig.register_room_light(entity, entry.on_intensity);
    }

    for entry in &manifest.fixtures {
        let spec = entry.to_spec();
        match spec.anchor {
            FixtureAnchor::Position(position) => {
                spawn_fixture(&mut commands, &mut rig, &spec, position);
            }
            FixtureAnchor::Node(_) => loader.pending_fixtures.push(spec),
        }
    }

    loader.pending_glows = manifest.glow_nodes.iter().map(|g| g.to_spec()).collect();
    loader.pending_exhibits = manifest.exhibits.iter().map(|e| e.to_spec()).collect();

    match &manifest.model {
        Some(path) => {
            info!("Loading showroom model '{}'", path);
            loader.model = Some(asset_server.load(path));
            loader.phase = LoadPhase::Loading;
        }
        None => {
            info!("No model configured, spawning the built-in showroom");
            spawn_fallback_scene(&mut commands, &mut meshes, &mut materials);
            loader.phase = LoadPhase::Spawned;
        }
    }
}

/// Poll the pending GLTF load to a terminal state and spawn its scene.
pub fn poll_model_load(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
    mut loader: ResMut<SceneLoader>,
) {
    if loader.phase != LoadPhase::Loading {
        return;
    }
    let Some(handle) = loader.model.clone() else {
        loader.phase = LoadPhase::Failed;
        return;
    };

    match asset_server.get_load_state(handle.id()) {
        Some(LoadState::Loaded) => {
            let Some(gltf) = gltf_assets.get(&handle) else {
                return;
            };
            let scene = gltf
                .default_scene
                .clone()
                .or_else(|| gltf.scenes.first().cloned());
            match scene {
                Some(scene) => {
                    commands.spawn((
                        SceneRoot(scene),
                        Transform::default(),
                        Visibility::default(),
                        ShowroomModel,
                    ));
                    loader.phase = LoadPhase::Spawned;
                    info!("Showroom model loaded");
                }
                None => {
                    error!("Showroom model contains no scenes");
                    loader.error = Some("model contains no scenes".into());
                    loader.phase = LoadPhase::Failed;
                }
            }
        }
        Some(LoadState::Failed(err)) => {
            error!("Showroom model failed to load: {}", err);
            loader.error = Some(err.to_string());
            loader.phase = LoadPhase::Failed;
        }
        _ => {}
    }
}

/// Resolve manifest references against the spawned scene graph.
///
/// Runs every frame while the scene is in the `Spawned` phase and waits
/// until named entities exist under the model root. One pass then builds
/// the exhibit registry, spawns node-anchored fixtures, and registers
/// glow materials; names that are missing from the scene are logged and
/// dropped.
pub fn resolve_scene_nodes(
    mut commands: Commands,
    mut loader: ResMut<SceneLoader>,
    mut registry: ResMut<ExhibitRegistry>,
    mut rig: ResMut<LightRig>,
    meshes: Res<Assets<Mesh>>,
    roots: Query<Entity, With<ShowroomModel>>,
    children_query: Query<&Children>,
    names: Query<&Name>,
    transforms: Query<&GlobalTransform>,
    mesh_query: Query<(&Mesh3d, &GlobalTransform)>,
    material_query: Query<&MeshMaterial3d<StandardMaterial>>,
) {
    if loader.phase != LoadPhase::Spawned {
        return;
    }

    let mut nodes: HashMap<String, Entity> = HashMap::new();
    for root in roots.iter() {
        collect_named(root, &children_query, &names, &mut nodes);
    }
    // Scene instances spawn asynchronously; try again next frame
    if nodes.is_empty() {
        return;
    }

    let pending_exhibits = std::mem::take(&mut loader.pending_exhibits);
    for spec in pending_exhibits {
        let Some(&node) = nodes.get(&spec.node) else {
            warn!(
                "Exhibit '{}': node '{}' not found in the scene, skipping",
                spec.name, spec.node
            );
            continue;
        };

        let mut mesh_entities = Vec::new();
        collect_mesh_entities(node, &children_query, &mesh_query, &mut mesh_entities);

        let mut bounds: Option<WorldBounds> = None;
        let mut outward = Vec3::Z;
        let mut outward_found = false;
        for &entity in &mesh_entities {
            let Ok((mesh3d, global)) = mesh_query.get(entity) else {
                continue;
            };
            let Some(mesh) = meshes.get(&mesh3d.0) else {
                continue;
            };
            if let Some(aabb) = mesh.compute_aabb() {
                let world = WorldBounds::from_transformed_aabb(
                    Vec3::from(aabb.center),
                    Vec3::from(aabb.half_extents),
                    global,
                );
                match bounds.as_mut() {
                    Some(b) => b.merge(world),
                    None => bounds = Some(world),
                }
            }
            if !outward_found {
                if let Some(VertexAttributeValues::Float32x3(normals)) =
                    mesh.attribute(Mesh::ATTRIBUTE_NORMAL)
                {
                    outward = global.rotation() * averaged_normal(normals, NORMAL_SAMPLE_LIMIT);
                    outward_found = true;
                }
            }
        }

        let bounds = bounds.unwrap_or_else(|| {
            warn!(
                "Exhibit '{}': node '{}' has no meshes, using its origin",
                spec.name, spec.node
            );
            let origin = transforms
                .get(node)
                .map(|t| t.translation())
                .unwrap_or(Vec3::ZERO);
            WorldBounds::point(origin)
        });

        let index = registry.exhibits.len();
        let pose = resolve_framing(&spec.framing, &bounds, outward);
        commands.entity(node).insert(Exhibit { index });
        info!("Exhibit '{}' ready on node '{}'", spec.name, spec.node);
        registry.exhibits.push(ResolvedExhibit {
            spec,
            root: node,
            bounds,
            pose,
        });
    }

    let pending_fixtures = std::mem::take(&mut loader.pending_fixtures);
    for spec in pending_fixtures {
        let FixtureAnchor::Node(node_name) = &spec.anchor else {
            continue;
        };
        let Some(&node) = nodes.get(node_name) else {
            warn!(
                "Fixture '{}': node '{}' not found in the scene, skipping",
                spec.name, node_name
            );
            continue;
        };
        let position = transforms
            .get(node)
            .map(|t| t.translation())
            .unwrap_or(Vec3::ZERO);
        spawn_fixture(&mut commands, &mut rig, &spec, position);
    }

    let pending_glows = std::mem::take(&mut loader.pending_glows);
    for spec in pending_glows {
        let Some(&node) = nodes.get(&spec.node) else {
            warn!("Glow node '{}' not found in the scene, skipping", spec.node);
            continue;
        };
        match find_material(node, &children_query, &material_query) {
            Some(handle) => {
                rig.register_glow_material(handle, spec.tint, spec.on_level, spec.off_level);
            }
            None => warn!("Glow node '{}' has no material, skipping", spec.node),
        }
    }

    loader.phase = LoadPhase::Ready;
    info!(
        "Scene ready: {} exhibits, {} fixtures, {} glow materials",
        registry.len(),
        rig.practical_lights.len(),
        rig.glow_materials.len()
    );
}

fn spawn_fixture(commands: &mut Commands, rig: &mut LightRig, spec: &FixtureSpec, position: Vec3) {
    let entity = commands
        .spawn((
            PointLight {
                color: Color::linear_rgb(spec.color.x, spec.color.y, spec.color.z),
                intensity: 0.0,
                range: 18.0,
                shadows_enabled: false,
                ..default()
            },
            Transform::from_translation(position),
            Name::new(format!("fixture: {}", spec.name)),
        ))
        .id();
    rig.register_practical_light(entity, spec.on_intensity);
}

/// Map every named descendant (the entity itself included) to its entity.
/// First occurrence of a name wins.
fn collect_named(
    entity: Entity,
    children_query: &Query<&Children>,
    names: &Query<&Name>,
    out: &mut HashMap<String, Entity>,
) {
    if let Ok(name) = names.get(entity) {
        out.entry(name.as_str().to_string()).or_insert(entity);
    }
    if let Ok(children) = children_query.get(entity) {
        for child in children.iter() {
            collect_named(child, children_query, names, out);
        }
    }
}

/// Collect the entity and all descendants that carry a mesh.
fn collect_mesh_entities(
    entity: Entity,
    children_query: &Query<&Children>,
    mesh_query: &Query<(&Mesh3d, &GlobalTransform)>,
    out: &mut Vec<Entity>,
) {
    if mesh_query.get(entity).is_ok() {
        out.push(entity);
    }
    if let Ok(children) = children_query.get(entity) {
        for child in children.iter() {
            collect_mesh_entities(child, children_query, mesh_query, out);
        }
    }
}

/// First standard material on the entity or its descendants.
fn find_material(
    entity: Entity,
    children_query: &Query<&Children>,
    material_query: &Query<&MeshMaterial3d<StandardMaterial>>,
) -> Option<Handle<StandardMaterial>> {
    if let Ok(material) = material_query.get(entity) {
        return Some(material.0.clone());
    }
    if let Ok(children) = children_query.get(entity) {
        for child in children.iter() {
            if let Some(found) = find_material(child, children_query, material_query) {
                return Some(found);
            }
        }
    }
    None
}

/// Stand-in showroom used when the manifest names no model: a floor, a
/// back wall, three exhibit stands, and a sign above the wall. Node
/// names line up with the demo manifest.
fn spawn_fallback_scene(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    let floor_material = materials.add(Color::srgb(0.45, 0.43, 0.4));
    let wall_material = materials.add(Color::srgb(0.62, 0.6, 0.58));
    let pedestal_material = materials.add(Color::srgb(0.35, 0.35, 0.38));
    let item_materials = [
        materials.add(Color::srgb(0.75, 0.3, 0.25)),
        materials.add(Color::srgb(0.25, 0.45, 0.75)),
        materials.add(Color::srgb(0.8, 0.65, 0.25)),
    ];
    let sign_material = materials.add(Color::srgb(1.0, 0.65, 0.8));

    let pedestal = meshes.add(Cuboid::new(0.8, 1.0, 0.8));
    let items = [
        meshes.add(Sphere::new(0.35)),
        meshes.add(Cuboid::new(0.55, 0.55, 0.55)),
        meshes.add(Cylinder::new(0.3, 0.7)),
    ];

    commands
        .spawn((Transform::default(), Visibility::default(), ShowroomModel))
        .with_children(|scene| {
            scene.spawn((
                Mesh3d(meshes.add(Cuboid::new(20.0, 0.2, 14.0))),
                MeshMaterial3d(floor_material),
                Transform::from_xyz(0.0, -0.1, 0.0),
            ));
            scene.spawn((
                Mesh3d(meshes.add(Cuboid::new(20.0, 4.5, 0.3))),
                MeshMaterial3d(wall_material),
                Transform::from_xyz(0.0, 2.25, -4.0),
            ));

            for (i, node) in FALLBACK_STAND_NODES.iter().enumerate() {
                let x = (i as f32 - 1.0) * 2.5;
                scene
                    .spawn((
                        Transform::from_xyz(x, 0.0, 0.0),
                        Visibility::default(),
                        Name::new(*node),
                    ))
                    .with_children(|stand| {
                        stand.spawn((
                            Mesh3d(pedestal.clone()),
                            MeshMaterial3d(pedestal_material.clone()),
                            Transform::from_xyz(0.0, 0.5, 0.0),
                        ));
                        stand.spawn((
                            Mesh3d(items[i].clone()),
                            MeshMaterial3d(item_materials[i].clone()),
                            Transform::from_xyz(0.0, 1.35, 0.0),
                        ));
                    });
            }

            scene.spawn((
                Mesh3d(meshes.add(Cuboid::new(3.2, 0.9, 0.15))),
                MeshMaterial3d(sign_material),
                Transform::from_xyz(0.0, 3.4, -3.8),
                Name::new(FALLBACK_SIGN_NODE),
            ));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_manifest_targets_fallback_nodes() {
        let manifest = ShowroomManifest::demo();

        for exhibit in &manifest.exhibits {
            assert!(
                FALLBACK_STAND_NODES.contains(&exhibit.node.as_str()),
                "exhibit '{}' points at '{}', which the stand-in scene never spawns",
                exhibit.name,
                exhibit.node
            );
        }
        for glow in &manifest.glow_nodes {
            assert_eq!(glow.node, FALLBACK_SIGN_NODE);
        }
        for fixture in &manifest.fixtures {
            if let Some(node) = &fixture.node {
                assert!(FALLBACK_STAND_NODES.contains(&node.as_str()));
            }
        }
    }

    #[test]
    fn test_phase_labels_are_distinct() {
        let phases = [
            LoadPhase::Loading,
            LoadPhase::Spawned,
            LoadPhase::Ready,
            LoadPhase::Failed,
        ];
        for (i, a) in phases.iter().enumerate() {
            for b in &phases[i + 1..] {
                assert_ne!(a.label(), b.label());
            }
        }
    }
}
