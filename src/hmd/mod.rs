//! Head-mounted-display session layer.
//!
//! The rest of the crate consumes HMDs exclusively through the [`HmdSession`]
//! trait; which device actually answers is decided once, at startup, by
//! [`create_session`]. Physical devices are probed first and the simulated
//! reference device is the mandatory fallback, so the demo always runs.

pub mod hardware;
pub mod simulated;

mod compositor;

use std::fmt;

use anyhow::Result;
use glam::{Quat, Vec3};

use crate::gpu::Gpu;

/// Which eye a per-eye resource belongs to. Everything per-eye in the crate
/// is indexed by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeIndex {
    Left,
    Right,
}

impl EyeIndex {
    /// Render order within a frame: always left, then right.
    pub const BOTH: [EyeIndex; 2] = [EyeIndex::Left, EyeIndex::Right];

    pub fn index(self) -> usize {
        match self {
            EyeIndex::Left => 0,
            EyeIndex::Right => 1,
        }
    }
}

/// Per-eye field of view expressed as half-angle tangents, the convention
/// HMD runtimes report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovPort {
    pub up_tan: f32,
    pub down_tan: f32,
    pub left_tan: f32,
    pub right_tan: f32,
}

/// Predicted pose of one eye for the frame being rendered. Produced fresh
/// each frame by the combined pose query and never persisted.
#[derive(Debug, Clone, Copy)]
pub struct EyePose {
    pub orientation: Quat,
    pub position: Vec3,
}

/// Static per-eye rendering parameters, computed once by
/// [`HmdSession::configure_rendering`] and immutable for the session's
/// lifetime. `view_offset` is head-relative: left eye -x, right eye +x.
#[derive(Debug, Clone, Copy)]
pub struct EyeRenderDescriptor {
    pub eye: EyeIndex,
    pub fov: FovPort,
    pub view_offset: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

/// One rendered eye image as handed to [`HmdSession::end_frame`]: the color
/// attachment view, its size, and the viewport rectangle that was rendered
/// (always the full target here).
pub struct EyeTexture<'a> {
    pub view: &'a wgpu::TextureView,
    pub size: TargetSize,
    pub viewport: ViewportRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ViewportRect {
    pub fn full(size: TargetSize) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
        }
    }
}

/// Distortion-correction features requested from the compositor.
#[derive(Debug, Clone, Copy)]
pub struct DistortionOptions {
    pub vignette: bool,
    pub time_warp: bool,
    pub overdrive: bool,
}

/// Tracking features enabled on the session.
#[derive(Debug, Clone, Copy)]
pub struct TrackingOptions {
    pub orientation: bool,
    pub mag_yaw_correction: bool,
    pub position: bool,
}

/// Device capability flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceCaps {
    pub low_persistence: bool,
    pub dynamic_prediction: bool,
}

/// Session acquisition errors. Per-frame failures are plain `anyhow` errors
/// (logged and dropped by the frame controller); only device discovery needs
/// a typed variant the factory can branch on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HmdError {
    NoDeviceFound,
}

impl fmt::Display for HmdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HmdError::NoDeviceFound => write!(f, "no head-mounted display device found"),
        }
    }
}

impl std::error::Error for HmdError {}

/// The session contract the frame controller consumes.
///
/// Call order per session: `set_enabled_caps`, `configure_rendering` (exactly
/// once), `configure_tracking`, then per frame `begin_frame` ->
/// `eye_poses` -> `end_frame`. `end_frame` performs distortion compositing
/// and owns the one present per frame; nothing else touches the surface.
pub trait HmdSession {
    fn name(&self) -> &str;

    /// Default eye height above the floor, in meters.
    fn eye_height(&self) -> f32;

    fn default_eye_fov(&self, eye: EyeIndex) -> FovPort;

    fn set_enabled_caps(&mut self, caps: DeviceCaps);

    fn configure_rendering(
        &mut self,
        options: DistortionOptions,
    ) -> Result<[EyeRenderDescriptor; 2]>;

    fn configure_tracking(&mut self, options: TrackingOptions) -> Result<()>;

    fn recommended_target_size(
        &self,
        eye: EyeIndex,
        fov: FovPort,
        pixel_density: f32,
    ) -> TargetSize;

    fn begin_frame(&mut self, frame_index: u64) -> Result<()>;

    /// Returns both eyes' predicted poses from one atomic query so the two
    /// views are temporally consistent. Valid only between `begin_frame` and
    /// `end_frame`.
    fn eye_poses(&mut self, frame_index: u64, view_offsets: [Vec3; 2]) -> Result<[EyePose; 2]>;

    fn end_frame(
        &mut self,
        gpu: &Gpu,
        poses: [EyePose; 2],
        textures: [EyeTexture<'_>; 2],
    ) -> Result<()>;
}

/// Opens an HMD session: physical devices first, then the simulated
/// reference device. The fallback is required behavior, not best-effort; if
/// even the simulated session cannot be built the error is fatal and the
/// caller must not enter the render loop.
pub fn create_session() -> Result<Box<dyn HmdSession>> {
    match hardware::detect() {
        Ok(session) => Ok(session),
        Err(HmdError::NoDeviceFound) => {
            log::warn!("no physical HMD detected, falling back to simulated device");
            Ok(Box::new(simulated::SimulatedSession::reference_device()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_order_is_left_then_right() {
        assert_eq!(EyeIndex::BOTH, [EyeIndex::Left, EyeIndex::Right]);
        assert_eq!(EyeIndex::Left.index(), 0);
        assert_eq!(EyeIndex::Right.index(), 1);
    }

    #[test]
    fn full_viewport_covers_target() {
        let size = TargetSize {
            width: 1182,
            height: 1461,
        };
        let rect = ViewportRect::full(size);
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, 0);
        assert_eq!(rect.width, size.width);
        assert_eq!(rect.height, size.height);
    }

    #[test]
    fn factory_falls_back_to_simulated_device() {
        let session = create_session().unwrap();
        assert!(session.name().contains("Simulated"));
    }

    #[test]
    fn no_device_error_displays_diagnostic() {
        let msg = HmdError::NoDeviceFound.to_string();
        assert!(msg.contains("no head-mounted display"));
    }
}
