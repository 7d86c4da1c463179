pub mod frame;
pub mod gpu;
pub mod hmd;
pub mod math;
pub mod scene;
pub mod targets;

use std::sync::Arc;

use anyhow::{Context, Result};
use winit::window::Window;

use frame::FrameController;
use gpu::Gpu;
use hmd::{DeviceCaps, DistortionOptions, EyeIndex, HmdSession, TrackingOptions};
use scene::{CubeScene, SceneRenderer};
use targets::StereoRenderTargets;

/// The whole program state as one owned aggregate, constructed in dependency
/// order: window surface, then HMD session, then render targets sized from
/// the session, then the scene. Failure at any step aborts startup before
/// the render loop.
pub struct RenderSession {
    gpu: Gpu,
    session: Box<dyn HmdSession>,
    targets: StereoRenderTargets,
    renderer: SceneRenderer,
    scene: CubeScene,
    controller: FrameController,
}

impl RenderSession {
    pub fn new(window: Arc<Window>, pixel_density: f32) -> Result<Self> {
        let gpu = Gpu::new(window).context("graphics context creation failed")?;

        let mut session = hmd::create_session().context("HMD session creation failed")?;
        log::info!("HMD session: {}", session.name());

        session.set_enabled_caps(DeviceCaps {
            low_persistence: true,
            dynamic_prediction: true,
        });
        let descriptors = session
            .configure_rendering(DistortionOptions {
                vignette: true,
                time_warp: true,
                overdrive: true,
            })
            .context("rendering configuration failed")?;
        session
            .configure_tracking(TrackingOptions {
                orientation: true,
                mag_yaw_correction: true,
                position: true,
            })
            .context("tracking configuration failed")?;

        let sizes = EyeIndex::BOTH.map(|eye| {
            session.recommended_target_size(eye, descriptors[eye.index()].fov, pixel_density)
        });
        log::info!(
            "per-eye render targets: {}x{}, {}x{} (density {})",
            sizes[0].width,
            sizes[0].height,
            sizes[1].width,
            sizes[1].height,
            pixel_density
        );

        let targets = StereoRenderTargets::allocate(&gpu.device, sizes);
        let renderer = SceneRenderer::new(&gpu.device);
        let scene = CubeScene::new();
        let controller = FrameController::new(descriptors);

        Ok(Self {
            gpu,
            session,
            targets,
            renderer,
            scene,
            controller,
        })
    }

    pub fn window(&self) -> &Window {
        &self.gpu.window
    }

    /// Runs one frame. A failed frame is dropped with a warning; the
    /// presentation loop itself never stops for a transient device error.
    pub fn render_frame(&mut self) {
        if let Err(err) = self.controller.run_frame(
            self.session.as_mut(),
            &self.gpu,
            &self.targets,
            &self.renderer,
            &self.scene,
        ) {
            log::warn!(
                "dropped frame {}: {:#}",
                self.controller.frame_index(),
                err
            );
        }
    }
}
