//! Host scene model
//!
//! Objects, meshes, armatures and actions as handed over by an importer.
//! The exporter only reads from a [`Scene`], with one exception: baking
//! drives the active action and current frame through [`PoseHost`].

use std::fmt;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use vulpes_common::{Rotation, RotationMode};

use crate::error::ExportError;

/// Index of an object inside [`Scene::objects`]
pub type ObjectId = usize;

// ============================================================================
// Scene
// ============================================================================

#[derive(Debug, Clone)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    /// Selection order; the first entry is the export target
    pub selected: Vec<ObjectId>,
    pub actions: Vec<Action>,
    pub current_frame: i32,
    pub frame_rate: f32,
}

impl Scene {
    pub fn new(frame_rate: f32) -> Self {
        Self {
            objects: Vec::new(),
            selected: Vec::new(),
            actions: Vec::new(),
            current_frame: 0,
            frame_rate,
        }
    }

    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects.iter().position(|o| o.name == name)
    }

    pub fn first_of_kind(&self, kind: ObjectKind) -> Option<ObjectId> {
        self.objects.iter().position(|o| o.kind() == kind)
    }

    pub fn selected_object(&self) -> Option<ObjectId> {
        self.selected.first().copied()
    }

    /// Replace the selection with a single object
    pub fn select(&mut self, id: ObjectId) {
        self.selected = vec![id];
    }

    /// Select the export target: the object called `name` if given, otherwise
    /// the first object of `kind`. Leaves the selection empty when nothing matches.
    pub fn select_for_export(&mut self, name: Option<&str>, kind: ObjectKind) -> Option<ObjectId> {
        let id = match name {
            Some(name) => self.find(name),
            None => self.first_of_kind(kind),
        };
        self.selected = id.into_iter().collect();
        id
    }
}

// ============================================================================
// Objects
// ============================================================================

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub world_matrix: Mat4,
    /// Vertex group names, indexed by [`GroupWeight::group`]
    pub vertex_groups: Vec<String>,
    /// Parent armature (meshes only)
    pub parent: Option<ObjectId>,
    /// Index into [`Scene::actions`]
    pub active_action: Option<usize>,
    pub data: ObjectData,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, data: ObjectData) -> Self {
        Self {
            name: name.into(),
            world_matrix: Mat4::IDENTITY,
            vertex_groups: Vec::new(),
            parent: None,
            active_action: None,
            data,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self.data {
            ObjectData::Mesh(_) => ObjectKind::Mesh,
            ObjectData::Armature(_) => ObjectKind::Armature,
            ObjectData::Empty => ObjectKind::Empty,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ObjectData {
    Mesh(MeshData),
    Armature(Armature),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Mesh,
    Armature,
    Empty,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectKind::Mesh => "mesh",
            ObjectKind::Armature => "armature",
            ObjectKind::Empty => "empty",
        })
    }
}

// ============================================================================
// Mesh data
// ============================================================================

/// Base mesh plus the result of evaluating its modifier stack, if any
#[derive(Debug, Clone)]
pub struct MeshData {
    pub base: PolyMesh,
    pub evaluated: Option<PolyMesh>,
}

impl MeshData {
    pub fn new(base: PolyMesh) -> Self {
        Self {
            base,
            evaluated: None,
        }
    }

    /// Mesh used for export
    pub fn to_mesh(&self, apply_modifiers: bool) -> &PolyMesh {
        match (&self.evaluated, apply_modifiers) {
            (Some(evaluated), true) => evaluated,
            _ => &self.base,
        }
    }
}

/// One vertex group membership
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupWeight {
    pub group: usize,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polygon {
    pub loop_start: usize,
    pub loop_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UvLayer {
    pub name: String,
    /// One UV per loop
    pub uvs: Vec<Vec2>,
}

/// Polygon mesh with per-loop (face corner) attributes
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    pub positions: Vec<Vec3>,
    /// Group memberships per vertex
    pub vertex_weights: Vec<Vec<GroupWeight>>,
    pub polygons: Vec<Polygon>,
    /// Source vertex of each loop
    pub loop_vertices: Vec<u32>,
    pub loop_normals: Option<Vec<Vec3>>,
    pub uv_layers: Vec<UvLayer>,
    pub active_uv_layer: usize,
    /// Precomputed tangents per loop: xyz direction, w bitangent sign
    pub loop_tangents: Option<Vec<Vec4>>,
}

impl PolyMesh {
    /// Build a mesh from vertex positions and polygons given as vertex index lists
    pub fn from_polygons(positions: Vec<Vec3>, faces: &[Vec<u32>]) -> Self {
        let mut mesh = Self {
            vertex_weights: vec![Vec::new(); positions.len()],
            positions,
            ..Default::default()
        };
        for face in faces {
            mesh.polygons.push(Polygon {
                loop_start: mesh.loop_vertices.len(),
                loop_count: face.len(),
            });
            mesh.loop_vertices.extend_from_slice(face);
        }
        mesh
    }

    pub fn loop_count(&self) -> usize {
        self.loop_vertices.len()
    }

    /// Triangles produced by fan triangulation
    pub fn triangle_count(&self) -> usize {
        self.polygons
            .iter()
            .map(|p| p.loop_count.saturating_sub(2))
            .sum()
    }

    pub fn active_uv_layer(&self) -> Option<&UvLayer> {
        self.uv_layers.get(self.active_uv_layer)
    }

    /// Check that every index and per-loop array is consistent
    pub fn validate(&self) -> Result<(), String> {
        let loops = self.loop_count();
        for (i, polygon) in self.polygons.iter().enumerate() {
            if polygon.loop_start + polygon.loop_count > loops {
                return Err(format!("polygon {i} references loops past {loops}"));
            }
        }
        if let Some(v) = self
            .loop_vertices
            .iter()
            .find(|&&v| v as usize >= self.positions.len())
        {
            return Err(format!(
                "loop references vertex {v} but the mesh has {} vertices",
                self.positions.len()
            ));
        }
        if self.vertex_weights.len() != self.positions.len() {
            return Err("vertex weight table does not match vertex count".to_string());
        }
        if self.loop_normals.as_ref().is_some_and(|n| n.len() != loops) {
            return Err("normal count does not match loop count".to_string());
        }
        if self.loop_tangents.as_ref().is_some_and(|t| t.len() != loops) {
            return Err("tangent count does not match loop count".to_string());
        }
        if let Some(layer) = self.uv_layers.iter().find(|l| l.uvs.len() != loops) {
            return Err(format!("UV layer '{}' does not match loop count", layer.name));
        }
        if !self.uv_layers.is_empty() && self.active_uv_layer >= self.uv_layers.len() {
            return Err(format!(
                "active UV layer {} out of range ({} layers)",
                self.active_uv_layer,
                self.uv_layers.len()
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Armatures
// ============================================================================

/// Animatable channels of a pose bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseChannels {
    pub location: Vec3,
    pub quaternion: Quat,
    /// Euler angles in radians
    pub euler: Vec3,
    pub axis: Vec3,
    pub angle: f32,
}

impl Default for PoseChannels {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            quaternion: Quat::IDENTITY,
            euler: Vec3::ZERO,
            axis: Vec3::Y,
            angle: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoseBone {
    pub name: String,
    pub rotation_mode: RotationMode,
    /// Channel values when no action drives the bone
    pub rest: PoseChannels,
    /// Current evaluated channel values
    pub pose: PoseChannels,
}

impl PoseBone {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_rest(name, PoseChannels::default())
    }

    pub fn with_rest(name: impl Into<String>, rest: PoseChannels) -> Self {
        Self {
            name: name.into(),
            rotation_mode: RotationMode::Quaternion,
            rest,
            pose: rest,
        }
    }

    /// Local translation of the current pose
    pub fn location(&self) -> Vec3 {
        self.pose.location
    }

    /// Current rotation, tagged with the bone's rotation mode
    pub fn rotation(&self) -> Rotation {
        match self.rotation_mode {
            RotationMode::Quaternion => Rotation::Quaternion(self.pose.quaternion),
            RotationMode::Euler(order) => Rotation::Euler(order, self.pose.euler),
            RotationMode::AxisAngle => Rotation::AxisAngle {
                axis: self.pose.axis,
                angle: self.pose.angle,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Armature {
    pub bones: Vec<PoseBone>,
}

// ============================================================================
// Actions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    pub frame: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub fn new(frame: f32, value: T) -> Self {
        Self { frame, value }
    }
}

/// Values that can be blended between keyframes
pub trait Interpolate: Copy {
    fn interpolate(self, other: Self, factor: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(self, other: Self, factor: f32) -> Self {
        self + (other - self) * factor
    }
}

impl Interpolate for Vec3 {
    fn interpolate(self, other: Self, factor: f32) -> Self {
        self.lerp(other, factor)
    }
}

impl Interpolate for Quat {
    fn interpolate(self, other: Self, factor: f32) -> Self {
        // glam's slerp takes the shortest path
        self.slerp(other, factor)
    }
}

/// Sample a keyframe curve, holding the first/last value outside its range
///
/// Keys must be sorted by frame. Returns `None` for an empty curve.
pub fn sample<T: Interpolate>(keys: &[Keyframe<T>], frame: f32) -> Option<T> {
    let first = keys.first()?;
    let last = keys.last()?;
    if frame <= first.frame {
        return Some(first.value);
    }
    if frame >= last.frame {
        return Some(last.value);
    }

    // Find the segment containing `frame`
    let mut i = 0;
    while i < keys.len() - 1 && keys[i + 1].frame < frame {
        i += 1;
    }

    let (k0, k1) = (&keys[i], &keys[i + 1]);
    let span = k1.frame - k0.frame;
    let factor = if span > 0.0 {
        ((frame - k0.frame) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Some(k0.value.interpolate(k1.value, factor))
}

/// Animation curves for one bone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneTrack {
    pub bone: String,
    pub location: Vec<Keyframe<Vec3>>,
    pub quaternion: Vec<Keyframe<Quat>>,
    pub euler: Vec<Keyframe<Vec3>>,
    /// Axis-angle keys; the axis is interpolated componentwise
    pub axis_angle: Vec<Keyframe<(Vec3, f32)>>,
}

impl Interpolate for (Vec3, f32) {
    fn interpolate(self, other: Self, factor: f32) -> Self {
        (
            self.0.interpolate(other.0, factor),
            self.1.interpolate(other.1, factor),
        )
    }
}

impl BoneTrack {
    pub fn new(bone: impl Into<String>) -> Self {
        Self {
            bone: bone.into(),
            ..Default::default()
        }
    }

    /// Evaluate every keyed channel at `frame`, starting from `rest`
    pub fn evaluate(&self, rest: PoseChannels, frame: f32) -> PoseChannels {
        let mut pose = rest;
        if let Some(location) = sample(&self.location, frame) {
            pose.location = location;
        }
        if let Some(quaternion) = sample(&self.quaternion, frame) {
            pose.quaternion = quaternion;
        }
        if let Some(euler) = sample(&self.euler, frame) {
            pose.euler = euler;
        }
        if let Some((axis, angle)) = sample(&self.axis_angle, frame) {
            pose.axis = axis;
            pose.angle = angle;
        }
        pose
    }
}

/// A named animation clip
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    /// (start, end) in frames
    pub frame_range: (f32, f32),
    pub tracks: Vec<BoneTrack>,
}

impl Action {
    pub fn new(name: impl Into<String>, frame_range: (f32, f32)) -> Self {
        Self {
            name: name.into(),
            frame_range,
            tracks: Vec::new(),
        }
    }

    pub fn track(&self, bone: &str) -> Option<&BoneTrack> {
        self.tracks.iter().find(|t| t.bone == bone)
    }
}

// ============================================================================
// Pose evaluation
// ============================================================================

/// Summary of an action as seen by the baker
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInfo {
    pub index: usize,
    pub name: String,
    pub frame_range: (f32, f32),
}

/// Side-effecting access to an armature's pose
///
/// `set_frame` mutates shared scene state (current frame and evaluated pose),
/// so callers must restore the previous active action and frame when done.
pub trait PoseHost {
    fn frame_rate(&self) -> f32;

    /// Bones in export order, holding the most recently evaluated pose
    fn pose_bones(&self) -> &[PoseBone];

    fn actions(&self) -> Vec<ActionInfo>;

    fn active_action(&self) -> Option<usize>;

    fn set_active_action(&mut self, action: Option<usize>);

    fn current_frame(&self) -> i32;

    /// Move to `frame` and evaluate the pose
    fn set_frame(&mut self, frame: i32) -> Result<(), ExportError>;
}

/// One armature object inside a [`Scene`], driven as a [`PoseHost`]
pub struct ArmatureRig<'a> {
    scene: &'a mut Scene,
    object: ObjectId,
}

impl<'a> ArmatureRig<'a> {
    pub fn new(scene: &'a mut Scene, object: ObjectId) -> Result<Self, ExportError> {
        match scene.object(object) {
            Some(o) if o.kind() == ObjectKind::Armature => Ok(Self { scene, object }),
            Some(o) => Err(ExportError::ObjectNotArmature(o.name.clone())),
            None => Err(ExportError::NoSelectedObject),
        }
    }

    fn armature_object(&self) -> Option<&SceneObject> {
        self.scene.objects.get(self.object)
    }
}

impl PoseHost for ArmatureRig<'_> {
    fn frame_rate(&self) -> f32 {
        self.scene.frame_rate
    }

    fn pose_bones(&self) -> &[PoseBone] {
        match self.armature_object().map(|o| &o.data) {
            Some(ObjectData::Armature(armature)) => &armature.bones,
            _ => &[],
        }
    }

    fn actions(&self) -> Vec<ActionInfo> {
        self.scene
            .actions
            .iter()
            .enumerate()
            .map(|(index, action)| ActionInfo {
                index,
                name: action.name.clone(),
                frame_range: action.frame_range,
            })
            .collect()
    }

    fn active_action(&self) -> Option<usize> {
        self.armature_object().and_then(|o| o.active_action)
    }

    fn set_active_action(&mut self, action: Option<usize>) {
        if let Some(object) = self.scene.objects.get_mut(self.object) {
            object.active_action = action;
        }
    }

    fn current_frame(&self) -> i32 {
        self.scene.current_frame
    }

    fn set_frame(&mut self, frame: i32) -> Result<(), ExportError> {
        let Scene {
            objects,
            actions,
            current_frame,
            ..
        } = &mut *self.scene;
        // The frame is host state even when the pose can't be evaluated
        *current_frame = frame;

        let object = objects
            .get_mut(self.object)
            .ok_or_else(|| ExportError::PoseEvaluation {
                frame,
                reason: "armature object no longer exists".to_string(),
            })?;
        let action = match object.active_action {
            Some(index) => Some(actions.get(index).ok_or_else(|| {
                ExportError::PoseEvaluation {
                    frame,
                    reason: format!("active action {index} does not exist"),
                }
            })?),
            None => None,
        };
        let ObjectData::Armature(armature) = &mut object.data else {
            return Err(ExportError::PoseEvaluation {
                frame,
                reason: format!("object '{}' is not an armature", object.name),
            });
        };

        for bone in &mut armature.bones {
            bone.pose = match action.and_then(|a| a.track(&bone.name)) {
                Some(track) => track.evaluate(bone.rest, frame as f32),
                None => bone.rest,
            };
        }
        Ok(())
    }
}
