//! Per-eye offscreen render targets.
//!
//! Exactly two targets exist for the lifetime of the session, indexed by
//! [`EyeIndex`]; sizes are fixed at allocation (resizing would mean a full
//! teardown, which this demo does not support).

use crate::hmd::{EyeIndex, TargetSize};
use crate::scene::CLEAR_COLOR;

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
/// At least a 24-bit depth component is required by the target contract.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

pub struct RenderTarget {
    pub size: TargetSize,
    pub color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

impl RenderTarget {
    fn allocate(device: &wgpu::Device, eye: EyeIndex, size: TargetSize) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Eye Color Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Eye Depth Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        log::debug!(
            "allocated {:?} eye target {}x{}",
            eye,
            size.width,
            size.height
        );

        Self {
            size,
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }
}

pub struct StereoRenderTargets {
    targets: [RenderTarget; 2],
}

impl StereoRenderTargets {
    /// Allocates both eyes' targets up front, sized from the session's
    /// recommendation. Called exactly once at startup.
    pub fn allocate(device: &wgpu::Device, sizes: [TargetSize; 2]) -> Self {
        Self {
            targets: EyeIndex::BOTH.map(|eye| {
                RenderTarget::allocate(device, eye, sizes[eye.index()])
            }),
        }
    }

    pub fn eye(&self, eye: EyeIndex) -> &RenderTarget {
        &self.targets[eye.index()]
    }

    /// Begins the named eye's render pass: color and depth cleared, depth
    /// test active, viewport covering the full target. The pass borrows the
    /// encoder exclusively, so the two eyes' draws can never interleave.
    pub fn begin_eye_pass<'a>(
        &'a self,
        encoder: &'a mut wgpu::CommandEncoder,
        eye: EyeIndex,
    ) -> wgpu::RenderPass<'a> {
        let target = self.eye(eye);
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Eye Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_viewport(
            0.0,
            0.0,
            target.size.width as f32,
            target.size.height as f32,
            0.0,
            1.0,
        );
        render_pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn test_device() -> Option<wgpu::Device> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;
        let (device, _queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .ok()?;
        Some(device)
    }

    #[test]
    fn depth_format_carries_at_least_24_bits() {
        assert_eq!(DEPTH_FORMAT, wgpu::TextureFormat::Depth24Plus);
    }

    #[test]
    #[serial]
    fn allocation_matches_requested_sizes() {
        let Some(device) = test_device() else {
            println!("Skipping target allocation test - no graphics adapter available");
            return;
        };

        let sizes = [
            TargetSize {
                width: 1182,
                height: 1461,
            },
            TargetSize {
                width: 1182,
                height: 1461,
            },
        ];
        let targets = StereoRenderTargets::allocate(&device, sizes);
        for eye in EyeIndex::BOTH {
            assert_eq!(targets.eye(eye).size, sizes[eye.index()]);
        }
    }
}
