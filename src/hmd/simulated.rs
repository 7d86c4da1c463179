//! Debug/simulated HMD session.
//!
//! Stands in for a physical device when none is connected: fixed optical
//! profile of a known reference device, static tracking, and a composite
//! pass that presents both eye images to the desktop window. The session
//! enforces the same call ordering a hardware runtime would.

use anyhow::{anyhow, Result};
use glam::{Quat, Vec3};

use crate::gpu::Gpu;

use super::compositor::DistortionCompositor;
use super::{
    DeviceCaps, DistortionOptions, EyeIndex, EyePose, EyeRenderDescriptor, EyeTexture, FovPort,
    HmdSession, TargetSize, TrackingOptions,
};

/// Fixed optical and ergonomic characteristics of a simulated device model.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub panel_width: u32,
    pub panel_height: u32,
    /// Default per-eye FOV, indexed by [`EyeIndex`]. The ports are
    /// asymmetric: the nasal side sees slightly more than the temporal side.
    pub default_fov: [FovPort; 2],
    pub eye_height: f32,
    pub interpupillary_distance: f32,
    /// Panel pixels per unit of FOV tangent, the basis for recommended
    /// render-target sizes.
    pub pixels_per_tan: f32,
}

impl DeviceProfile {
    /// DK2-class reference profile: 1080p panel, ~100 degree optics.
    pub fn reference() -> Self {
        let left = FovPort {
            up_tan: 1.329,
            down_tan: 1.329,
            left_tan: 1.058,
            right_tan: 1.092,
        };
        let right = FovPort {
            up_tan: 1.329,
            down_tan: 1.329,
            left_tan: 1.092,
            right_tan: 1.058,
        };
        Self {
            name: "Simulated HMD (DK2 class)",
            panel_width: 1920,
            panel_height: 1080,
            default_fov: [left, right],
            eye_height: 1.6,
            interpupillary_distance: 0.064,
            pixels_per_tan: 549.0,
        }
    }
}

pub struct SimulatedSession {
    profile: DeviceProfile,
    caps: DeviceCaps,
    distortion: Option<DistortionOptions>,
    tracking: Option<TrackingOptions>,
    compositor: Option<DistortionCompositor>,
    frame_in_flight: Option<u64>,
}

impl SimulatedSession {
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            profile,
            caps: DeviceCaps::default(),
            distortion: None,
            tracking: None,
            compositor: None,
            frame_in_flight: None,
        }
    }

    pub fn reference_device() -> Self {
        Self::new(DeviceProfile::reference())
    }

    pub fn enabled_caps(&self) -> DeviceCaps {
        self.caps
    }

    /// Per-eye render parameters derived from the profile: default FOV plus
    /// head-relative view offsets of half the interpupillary distance.
    fn eye_render_descriptors(&self) -> [EyeRenderDescriptor; 2] {
        let half_ipd = self.profile.interpupillary_distance * 0.5;
        EyeIndex::BOTH.map(|eye| {
            let x = match eye {
                EyeIndex::Left => -half_ipd,
                EyeIndex::Right => half_ipd,
            };
            EyeRenderDescriptor {
                eye,
                fov: self.profile.default_fov[eye.index()],
                view_offset: Vec3::new(x, 0.0, 0.0),
            }
        })
    }

    /// Closes out the frame pairing. Split from `end_frame` so the guard is
    /// exercised independently of any GPU work.
    fn finish_frame(&mut self) -> Result<u64> {
        self.frame_in_flight
            .take()
            .ok_or_else(|| anyhow!("end_frame without a matching begin_frame"))
    }
}

impl HmdSession for SimulatedSession {
    fn name(&self) -> &str {
        self.profile.name
    }

    fn eye_height(&self) -> f32 {
        self.profile.eye_height
    }

    fn default_eye_fov(&self, eye: EyeIndex) -> FovPort {
        self.profile.default_fov[eye.index()]
    }

    fn set_enabled_caps(&mut self, caps: DeviceCaps) {
        log::debug!(
            "device caps: low_persistence={} dynamic_prediction={}",
            caps.low_persistence,
            caps.dynamic_prediction
        );
        self.caps = caps;
    }

    fn configure_rendering(
        &mut self,
        options: DistortionOptions,
    ) -> Result<[EyeRenderDescriptor; 2]> {
        if self.distortion.is_some() {
            return Err(anyhow!("configure_rendering called twice on one session"));
        }
        // Time-warp and overdrive describe hardware scanout paths; the
        // simulated compositor honors the vignette and records the rest as
        // reported capabilities.
        log::info!(
            "distortion: vignette={} time_warp={} overdrive={}",
            options.vignette,
            options.time_warp,
            options.overdrive
        );
        self.distortion = Some(options);
        Ok(self.eye_render_descriptors())
    }

    fn configure_tracking(&mut self, options: TrackingOptions) -> Result<()> {
        log::info!(
            "tracking: orientation={} mag_yaw_correction={} position={}",
            options.orientation,
            options.mag_yaw_correction,
            options.position
        );
        self.tracking = Some(options);
        Ok(())
    }

    fn recommended_target_size(
        &self,
        _eye: EyeIndex,
        fov: FovPort,
        pixel_density: f32,
    ) -> TargetSize {
        let ppt = self.profile.pixels_per_tan * pixel_density;
        TargetSize {
            width: (ppt * (fov.left_tan + fov.right_tan)).ceil() as u32,
            height: (ppt * (fov.up_tan + fov.down_tan)).ceil() as u32,
        }
    }

    fn begin_frame(&mut self, frame_index: u64) -> Result<()> {
        if let Some(in_flight) = self.frame_in_flight {
            return Err(anyhow!(
                "begin_frame {} while frame {} is still in flight",
                frame_index,
                in_flight
            ));
        }
        self.frame_in_flight = Some(frame_index);
        Ok(())
    }

    fn eye_poses(&mut self, frame_index: u64, view_offsets: [Vec3; 2]) -> Result<[EyePose; 2]> {
        if self.tracking.is_none() {
            return Err(anyhow!("eye_poses before configure_tracking"));
        }
        if self.frame_in_flight != Some(frame_index) {
            return Err(anyhow!(
                "eye_poses for frame {} outside begin/end",
                frame_index
            ));
        }
        // One atomic answer for both eyes. The simulated head sits at the
        // origin with identity orientation, so the predicted per-eye pose is
        // just the view offset; prediction latency is zero for a panel that
        // does not move.
        Ok(view_offsets.map(|offset| EyePose {
            orientation: Quat::IDENTITY,
            position: offset,
        }))
    }

    fn end_frame(
        &mut self,
        gpu: &Gpu,
        _poses: [EyePose; 2],
        textures: [EyeTexture<'_>; 2],
    ) -> Result<()> {
        let frame_index = self.finish_frame()?;
        let distortion = self
            .distortion
            .ok_or_else(|| anyhow!("end_frame before configure_rendering"))?;
        let compositor = self
            .compositor
            .get_or_insert_with(|| DistortionCompositor::new(gpu, distortion));
        compositor
            .composite(gpu, &textures)
            .map_err(|err| anyhow!("distortion composite for frame {}: {}", frame_index, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn configured_session() -> SimulatedSession {
        let mut session = SimulatedSession::reference_device();
        session
            .configure_tracking(TrackingOptions {
                orientation: true,
                mag_yaw_correction: true,
                position: true,
            })
            .unwrap();
        session
    }

    #[test]
    fn reference_profile_ergonomics() {
        let session = SimulatedSession::reference_device();
        assert_relative_eq!(session.eye_height(), 1.6);
        assert_eq!(session.profile.panel_width, 1920);
        assert_eq!(session.profile.panel_height, 1080);
    }

    #[test]
    fn enabled_caps_are_recorded() {
        let mut session = SimulatedSession::reference_device();
        session.set_enabled_caps(DeviceCaps {
            low_persistence: true,
            dynamic_prediction: true,
        });
        assert!(session.enabled_caps().low_persistence);
        assert!(session.enabled_caps().dynamic_prediction);
    }

    #[test]
    fn descriptors_are_symmetric_half_ipd_offsets() {
        let session = SimulatedSession::reference_device();
        let [left, right] = session.eye_render_descriptors();
        assert_eq!(left.eye, EyeIndex::Left);
        assert_eq!(right.eye, EyeIndex::Right);
        assert!(left.view_offset.x < 0.0);
        assert!(right.view_offset.x > 0.0);
        assert_relative_eq!(left.view_offset.x, -0.032);
        assert_relative_eq!(right.view_offset.x, 0.032);
        assert_relative_eq!(left.view_offset.y, 0.0);
        assert_relative_eq!(left.view_offset.z, 0.0);
    }

    #[test]
    fn nasal_fov_exceeds_temporal_fov() {
        let session = SimulatedSession::reference_device();
        let left = session.default_eye_fov(EyeIndex::Left);
        let right = session.default_eye_fov(EyeIndex::Right);
        assert!(left.right_tan > left.left_tan);
        assert!(right.left_tan > right.right_tan);
        // Mirrored ports.
        assert_relative_eq!(left.right_tan, right.left_tan);
        assert_relative_eq!(left.left_tan, right.right_tan);
    }

    #[test]
    fn recommended_size_follows_pixel_density() {
        let session = SimulatedSession::reference_device();
        let fov = session.default_eye_fov(EyeIndex::Left);

        let base = session.recommended_target_size(EyeIndex::Left, fov, 1.0);
        assert_eq!(base.width, (549.0_f32 * (1.058 + 1.092)).ceil() as u32);
        assert_eq!(base.height, (549.0_f32 * (1.329 + 1.329)).ceil() as u32);

        let doubled = session.recommended_target_size(EyeIndex::Left, fov, 2.0);
        assert!(doubled.width >= base.width * 2 - 1);
        assert!(doubled.height >= base.height * 2 - 1);
    }

    #[test]
    fn begin_frame_rejects_double_begin() {
        let mut session = configured_session();
        session.begin_frame(0).unwrap();
        assert!(session.begin_frame(1).is_err());
    }

    #[test]
    fn finish_frame_pairs_with_begin() {
        let mut session = configured_session();
        assert!(session.finish_frame().is_err());
        session.begin_frame(7).unwrap();
        assert_eq!(session.finish_frame().unwrap(), 7);
        // Paired exactly once.
        assert!(session.finish_frame().is_err());
    }

    #[test]
    fn eye_poses_only_valid_inside_frame() {
        let mut session = configured_session();
        let offsets = [Vec3::new(-0.032, 0.0, 0.0), Vec3::new(0.032, 0.0, 0.0)];
        assert!(session.eye_poses(0, offsets).is_err());

        session.begin_frame(0).unwrap();
        let poses = session.eye_poses(0, offsets).unwrap();
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[0].position, offsets[0]);
        assert_eq!(poses[1].position, offsets[1]);
        assert_relative_eq!(poses[0].orientation.length(), 1.0);

        // Wrong frame index is a contract violation, not a stale answer.
        assert!(session.eye_poses(3, offsets).is_err());
    }

    #[test]
    fn eye_poses_require_tracking_configuration() {
        let mut session = SimulatedSession::reference_device();
        session.begin_frame(0).unwrap();
        let offsets = [Vec3::ZERO, Vec3::ZERO];
        assert!(session.eye_poses(0, offsets).is_err());
    }

    #[test]
    fn configure_rendering_is_once_only() {
        let mut session = SimulatedSession::reference_device();
        let options = DistortionOptions {
            vignette: true,
            time_warp: true,
            overdrive: true,
        };
        session.configure_rendering(options).unwrap();
        assert!(session.configure_rendering(options).is_err());
    }
}
