//! Per-frame orchestration.
//!
//! One `run_frame` call walks the whole frame contract: begin, one combined
//! pose query, left eye bound and drawn, right eye bound and drawn, both
//! images submitted for distortion compositing. Eyes are strictly
//! sequential and always left before right.

use anyhow::Result;
use glam::{Quat, Vec3};

use crate::gpu::Gpu;
use crate::hmd::{
    EyeIndex, EyePose, EyeRenderDescriptor, EyeTexture, HmdSession, ViewportRect,
};
use crate::math::{self, ViewProjection};
use crate::scene::{CubeScene, SceneRenderer};
use crate::targets::StereoRenderTargets;

pub const NEAR_CLIP: f32 = 0.2;
pub const FAR_CLIP: f32 = 1000.0;

/// Everything the scene renderer needs for one eye's draw.
#[derive(Debug, Clone, Copy)]
pub struct EyeFrame {
    pub eye: EyeIndex,
    pub view_projection: ViewProjection,
    pub world_position: Vec3,
}

/// Pure pose math for one frame: composes head yaw with each eye's predicted
/// orientation, places the eye in the world, and builds the view/projection
/// pair. Output order matches [`EyeIndex::BOTH`]: left, then right.
pub fn plan_eyes(
    poses: &[EyePose; 2],
    descriptors: &[EyeRenderDescriptor; 2],
    head_position: Vec3,
    head_yaw: Quat,
) -> [EyeFrame; 2] {
    EyeIndex::BOTH.map(|eye| {
        let pose = poses[eye.index()];
        let orientation = head_yaw * pose.orientation;
        let world_position = head_position + head_yaw * pose.position;
        let view = math::eye_view_matrix(orientation, world_position);
        let projection =
            math::perspective_fov_rh(descriptors[eye.index()].fov, NEAR_CLIP, FAR_CLIP);
        EyeFrame {
            eye,
            view_projection: ViewProjection { view, projection },
            world_position,
        }
    })
}

pub struct FrameController {
    frame_index: u64,
    descriptors: [EyeRenderDescriptor; 2],
}

impl FrameController {
    pub fn new(descriptors: [EyeRenderDescriptor; 2]) -> Self {
        Self {
            frame_index: 0,
            descriptors,
        }
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Renders and submits one complete frame. An error anywhere in the
    /// sequence means the frame is dropped; the caller logs and continues,
    /// since a transient device hiccup must not take down the loop.
    pub fn run_frame(
        &mut self,
        session: &mut dyn HmdSession,
        gpu: &Gpu,
        targets: &StereoRenderTargets,
        renderer: &SceneRenderer,
        scene: &CubeScene,
    ) -> Result<()> {
        let frame_index = self.frame_index;
        session.begin_frame(frame_index)?;

        // Head base: fixed eye height above the origin. The yaw is a hook
        // for locomotion and stays zero in this scene.
        let head_yaw = Quat::IDENTITY;
        let head_position = Vec3::new(0.0, session.eye_height(), 0.0);

        let view_offsets = [
            self.descriptors[0].view_offset,
            self.descriptors[1].view_offset,
        ];
        let poses = session.eye_poses(frame_index, view_offsets)?;
        let eye_frames = plan_eyes(&poses, &self.descriptors, head_position, head_yaw);

        renderer.prepare_frame(&gpu.queue, scene);
        for eye_frame in &eye_frames {
            renderer.prepare_eye(&gpu.queue, &eye_frame.view_projection);
            let mut encoder = gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Eye Encoder"),
                });
            {
                let mut render_pass = targets.begin_eye_pass(&mut encoder, eye_frame.eye);
                renderer.draw(&mut render_pass);
            }
            gpu.queue.submit(std::iter::once(encoder.finish()));
        }

        let textures = EyeIndex::BOTH.map(|eye| {
            let target = targets.eye(eye);
            EyeTexture {
                view: &target.color_view,
                size: target.size,
                viewport: ViewportRect::full(target.size),
            }
        });
        session.end_frame(gpu, poses, textures)?;

        self.frame_index += 1;
        log::trace!("frame {} submitted", frame_index);
        Ok(())
    }
}
