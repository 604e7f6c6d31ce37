//! Animation baking
//!
//! Every action is made active in turn and sampled at each integer frame of
//! its range. For each frame, every bone's local translation and rotation
//! (converted to a quaternion from its rotation mode) is recorded.
//!
//! Baking mutates the host's active action and current frame. [`PoseScope`]
//! puts both back when it is dropped, on success and on error alike.

use std::ops::{Deref, DerefMut};

use vulpes_common::VesAction;
use vulpes_common::math::quat_to_wxyz;

use crate::error::ExportError;
use crate::scene::{ActionInfo, PoseHost};

/// Longest action, in frames, that [`bake_action`] will sample
pub const MAX_FRAMES: u32 = 1 << 20;

/// Number of samples baked for a frame range: `ceil(end - start)`
///
/// Saturates at `u32::MAX` for ranges too long to represent.
pub fn frame_count(frame_range: (f32, f32)) -> u32 {
    let (start, end) = frame_range;
    (end - start).ceil().max(0.0) as u32
}

/// Frames sampled for a frame range, end exclusive
pub fn sample_frames(frame_range: (f32, f32)) -> impl Iterator<Item = i32> {
    let start = frame_range.0.floor() as i32;
    let count = i32::try_from(frame_count(frame_range)).unwrap_or(i32::MAX);
    (0..count).map(move |i| start.saturating_add(i))
}

/// Restores the active action and current frame of a [`PoseHost`] on drop
pub struct PoseScope<'a, H: PoseHost + ?Sized> {
    host: &'a mut H,
    action: Option<usize>,
    frame: i32,
}

impl<'a, H: PoseHost + ?Sized> PoseScope<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        let action = host.active_action();
        let frame = host.current_frame();
        Self {
            host,
            action,
            frame,
        }
    }
}

impl<H: PoseHost + ?Sized> Deref for PoseScope<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: PoseHost + ?Sized> DerefMut for PoseScope<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: PoseHost + ?Sized> Drop for PoseScope<'_, H> {
    fn drop(&mut self) {
        self.host.set_active_action(self.action);
        if let Err(e) = self.host.set_frame(self.frame) {
            tracing::warn!("Failed to restore frame {}: {}", self.frame, e);
        }
    }
}

/// Bake every action the host knows about
pub fn bake_actions<H: PoseHost + ?Sized>(host: &mut H) -> Result<Vec<VesAction>, ExportError> {
    let actions = host.actions();
    let mut scope = PoseScope::new(host);

    let mut baked = Vec::with_capacity(actions.len());
    for info in &actions {
        baked.push(bake_action(&mut *scope, info)?);
    }
    Ok(baked)
}

/// Bake one action; the caller is responsible for restoring host state
pub fn bake_action<H: PoseHost + ?Sized>(
    host: &mut H,
    info: &ActionInfo,
) -> Result<VesAction, ExportError> {
    let frames = frame_count(info.frame_range);
    if frames > MAX_FRAMES {
        return Err(ExportError::TooManyFrames {
            action: info.name.clone(),
            count: frames,
        });
    }
    let bone_count = host.pose_bones().len();

    let mut translations = vec![Vec::with_capacity(frames as usize); bone_count];
    let mut rotations = vec![Vec::with_capacity(frames as usize); bone_count];

    host.set_active_action(Some(info.index));
    for frame in sample_frames(info.frame_range) {
        host.set_frame(frame)?;
        for (b, bone) in host.pose_bones().iter().enumerate() {
            translations[b].push(bone.location().to_array());
            rotations[b].push(quat_to_wxyz(bone.rotation().to_quat()));
        }
    }

    tracing::debug!(
        "Baked action '{}': {} frames from {}",
        info.name,
        frames,
        info.frame_range.0
    );

    Ok(VesAction {
        name: info.name.clone(),
        frame_count: frames,
        translations,
        rotations,
    })
}
