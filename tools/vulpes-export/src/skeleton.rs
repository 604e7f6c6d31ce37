//! Skeleton exporter (armature + actions -> .ves)
//!
//! Bones are written in armature order. Every action in the scene is baked
//! against the selected armature, one sample per integer frame. The header
//! records the export frame rate, which is the rate the scene was imported at.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use vulpes_common::{BoneEntry, MAX_BONES, VesSkeleton, write_ves};

use crate::animation::bake_actions;
use crate::error::ExportError;
use crate::options::SkeletonExportOptions;
use crate::scene::{ArmatureRig, ObjectData, Scene};

/// Largest action count the `.ves` header can describe
pub const MAX_ACTIONS: usize = u8::MAX as usize;

/// Convert the selected armature and all scene actions to in-memory `.ves` data
///
/// Takes the scene mutably because baking drives the armature's pose; the
/// active action and current frame are restored before returning.
pub fn convert_skeleton_to_memory(
    scene: &mut Scene,
    options: &SkeletonExportOptions,
) -> Result<VesSkeleton, ExportError> {
    options.validate()?;

    let id = scene.selected_object().ok_or(ExportError::NoSelectedObject)?;
    let object = scene.object(id).ok_or(ExportError::NoSelectedObject)?;
    let ObjectData::Armature(armature) = &object.data else {
        return Err(ExportError::ObjectNotArmature(object.name.clone()));
    };

    if armature.bones.len() > MAX_BONES {
        return Err(ExportError::TooManyBones {
            name: object.name.clone(),
            count: armature.bones.len(),
        });
    }
    if scene.actions.len() > MAX_ACTIONS {
        return Err(ExportError::TooManyActions {
            count: scene.actions.len(),
        });
    }

    let bones = armature
        .bones
        .iter()
        .enumerate()
        .map(|(i, bone)| BoneEntry::new(i as u8, &bone.name))
        .collect();
    let frame_rate = options.frame_rate;
    if frame_rate != scene.frame_rate {
        tracing::warn!(
            "Exporting at {} fps but the scene was keyed at {} fps; frame numbers are kept as-is",
            frame_rate,
            scene.frame_rate
        );
    }

    let mut rig = ArmatureRig::new(scene, id)?;
    let actions = bake_actions(&mut rig)?;

    Ok(VesSkeleton {
        frame_rate,
        bones,
        actions,
    })
}

/// Convert the selected armature and write it to `output`
pub fn export_ves(
    scene: &mut Scene,
    output: &Path,
    options: &SkeletonExportOptions,
) -> Result<VesSkeleton, ExportError> {
    let skeleton = convert_skeleton_to_memory(scene, options)?;

    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    write_ves(&mut writer, &skeleton)?;
    writer.flush()?;

    let frames: u32 = skeleton.actions.iter().map(|a| a.frame_count).sum();
    tracing::info!(
        "Exported skeleton: {} bones, {} actions ({} frames total) at {} fps",
        skeleton.bones.len(),
        skeleton.actions.len(),
        frames,
        skeleton.frame_rate
    );

    Ok(skeleton)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{
        Action, Armature, BoneTrack, Keyframe, MeshData, PolyMesh, PoseBone, PoseChannels,
        SceneObject,
    };
    use glam::{Quat, Vec3};
    use vulpes_common::{EulerOrder, RotationMode, read_ves};

    const EPSILON: f32 = 1e-5;

    /// Two-bone rig with one walk cycle keyed on both bones
    fn rigged_scene() -> Scene {
        let mut scene = Scene::new(30.0);

        let root = PoseBone::with_rest(
            "root",
            PoseChannels {
                location: Vec3::new(0.0, 0.0, 1.0),
                ..Default::default()
            },
        );
        let mut arm = PoseBone::new("arm");
        arm.rotation_mode = RotationMode::Euler(EulerOrder::XYZ);
        let rig = scene.add_object(SceneObject::new(
            "Rig",
            ObjectData::Armature(Armature {
                bones: vec![root, arm],
            }),
        ));

        let mut walk = Action::new("walk", (1.0, 5.0));
        let mut root_track = BoneTrack::new("root");
        root_track.location = vec![
            Keyframe::new(1.0, Vec3::ZERO),
            Keyframe::new(5.0, Vec3::new(4.0, 0.0, 0.0)),
        ];
        let mut arm_track = BoneTrack::new("arm");
        arm_track.euler = vec![
            Keyframe::new(1.0, Vec3::ZERO),
            Keyframe::new(3.0, Vec3::new(0.0, 0.0, 1.0)),
        ];
        walk.tracks = vec![root_track, arm_track];
        scene.actions.push(walk);
        scene.actions.push(Action::new("idle", (0.0, 2.0)));

        scene.current_frame = 9;
        scene.select(rig);
        scene
    }

    #[test]
    fn test_bones_in_armature_order() {
        let mut scene = rigged_scene();
        let options = SkeletonExportOptions { frame_rate: 30.0 };
        let ves = convert_skeleton_to_memory(&mut scene, &options).unwrap();
        assert_eq!(ves.bones, vec![BoneEntry::new(0, "root"), BoneEntry::new(1, "arm")]);
        assert_eq!(ves.frame_rate, 30.0);
        assert_eq!(ves.actions.len(), 2);
    }

    #[test]
    fn test_header_takes_export_frame_rate() {
        let mut scene = rigged_scene();
        let options = SkeletonExportOptions { frame_rate: 60.0 };
        let ves = convert_skeleton_to_memory(&mut scene, &options).unwrap();
        assert_eq!(ves.frame_rate, 60.0);
        // Samples stay on the scene's integer frames
        assert_eq!(ves.actions[0].frame_count, 4);

        let invalid = SkeletonExportOptions { frame_rate: -1.0 };
        assert!(matches!(
            convert_skeleton_to_memory(&mut scene, &invalid),
            Err(ExportError::InvalidFrameRate(_))
        ));
    }

    #[test]
    fn test_walk_samples() {
        let mut scene = rigged_scene();
        let ves = convert_skeleton_to_memory(&mut scene, &Default::default()).unwrap();
        let walk = &ves.actions[0];

        assert_eq!(walk.name, "walk");
        assert_eq!(walk.frame_count, 4);
        let root_x: Vec<f32> = walk.translations[0].iter().map(|t| t[0]).collect();
        assert_eq!(root_x, vec![0.0, 1.0, 2.0, 3.0]);

        // Frame 3 onwards holds the last Euler key: 1 rad about Z
        let [w, x, y, z] = walk.rotations[1][2];
        let q = Quat::from_xyzw(x, y, z, w);
        assert!(q.abs_diff_eq(Quat::from_rotation_z(1.0), EPSILON), "{q:?}");
    }

    #[test]
    fn test_unkeyed_bones_use_rest_pose() {
        let mut scene = rigged_scene();
        let ves = convert_skeleton_to_memory(&mut scene, &Default::default()).unwrap();
        let idle = &ves.actions[1];
        assert_eq!(idle.frame_count, 2);
        assert_eq!(idle.translations[0], vec![[0.0, 0.0, 1.0]; 2]);
        assert_eq!(idle.rotations[1], vec![[1.0, 0.0, 0.0, 0.0]; 2]);
    }

    #[test]
    fn test_scene_state_restored() {
        let mut scene = rigged_scene();
        scene.objects[0].active_action = Some(1);
        convert_skeleton_to_memory(&mut scene, &Default::default()).unwrap();
        assert_eq!(scene.current_frame, 9);
        assert_eq!(scene.objects[0].active_action, Some(1));
    }

    #[test]
    fn test_dangling_active_action_still_restores_frame() {
        let mut scene = rigged_scene();
        scene.objects[0].active_action = Some(9);
        scene.current_frame = 42;

        convert_skeleton_to_memory(&mut scene, &Default::default()).unwrap();
        assert_eq!(scene.current_frame, 42);
        assert_eq!(scene.objects[0].active_action, Some(9));
    }

    #[test]
    fn test_no_selection() {
        let mut scene = rigged_scene();
        scene.selected.clear();
        assert!(matches!(
            convert_skeleton_to_memory(&mut scene, &Default::default()),
            Err(ExportError::NoSelectedObject)
        ));
    }

    #[test]
    fn test_not_an_armature() {
        let mut scene = rigged_scene();
        let mesh = scene.add_object(SceneObject::new(
            "Body",
            ObjectData::Mesh(MeshData::new(PolyMesh::default())),
        ));
        scene.select(mesh);
        assert!(matches!(
            convert_skeleton_to_memory(&mut scene, &Default::default()),
            Err(ExportError::ObjectNotArmature(name)) if name == "Body"
        ));
    }

    #[test]
    fn test_too_many_bones_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("rig.ves");
        let mut scene = rigged_scene();
        let ObjectData::Armature(armature) = &mut scene.objects[0].data else {
            unreachable!()
        };
        armature.bones = (0..256).map(|i| PoseBone::new(format!("b{i}"))).collect();

        assert!(matches!(
            export_ves(&mut scene, &output, &Default::default()),
            Err(ExportError::TooManyBones { count: 256, .. })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_too_many_actions() {
        let mut scene = rigged_scene();
        scene.actions = (0..256)
            .map(|i| Action::new(format!("a{i}"), (0.0, 1.0)))
            .collect();
        assert!(matches!(
            convert_skeleton_to_memory(&mut scene, &Default::default()),
            Err(ExportError::TooManyActions { count: 256 })
        ));
    }

    #[test]
    fn test_export_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("rig.ves");
        let mut scene = rigged_scene();

        let ves = export_ves(&mut scene, &output, &Default::default()).unwrap();
        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[0..4], b"VULS");
        assert_eq!(bytes[4], 2);
        assert_eq!(bytes[5], 2);
        assert_eq!(read_ves(&bytes).unwrap(), ves);
    }
}
