//! Glue between uniforms, pipeline, and surface.
//!
//! `GpuState` owns every GPU resource for one mount and is the only place a
//! draw call is recorded. Disposal is explicit and ordered (buffers, then
//! pipeline, then context) and idempotent: a second `dispose` and any
//! render attempted after disposal are no-ops.

use std::time::{Duration, Instant};

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::runtime::TimeSample;
use crate::types::EffectConfig;

use super::context::GpuContext;
use super::pipeline::EffectPipeline;
use super::uniforms::EffectUniforms;

struct GpuResources {
    context: GpuContext,
    pipeline: EffectPipeline,
    multisample_target: Option<MultisampleTarget>,
}

pub(crate) struct GpuState {
    resources: Option<GpuResources>,
    uniforms: EffectUniforms,
    last_log_time: Instant,
}

impl GpuState {
    /// Builds the full GPU stack against the supplied window target.
    pub(crate) fn new<T>(
        target: &T,
        presentation_size: PhysicalSize<u32>,
        pixel_ratio: f32,
        config: &EffectConfig,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, presentation_size, config.antialiasing)?;
        let uniforms =
            EffectUniforms::new(context.size.width, context.size.height, pixel_ratio);
        let pipeline = EffectPipeline::new(
            &context.device,
            context.surface_format,
            context.sample_count,
            config.time_scale,
            &uniforms,
        )?;
        let multisample_target = MultisampleTarget::for_context(&context);

        Ok(Self {
            resources: Some(GpuResources {
                context,
                pipeline,
                multisample_target,
            }),
            uniforms,
            last_log_time: Instant::now(),
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.resources
            .as_ref()
            .map(|resources| resources.context.size)
            .unwrap_or_else(|| PhysicalSize::new(1, 1))
    }

    /// Applies a new presentation size: swapchain configuration and the
    /// resolution uniform change together, so no frame can observe one
    /// without the other.
    pub(crate) fn resize(&mut self, presentation_size: PhysicalSize<u32>, pixel_ratio: f32) {
        let Some(resources) = self.resources.as_mut() else {
            return;
        };
        resources.context.resize(presentation_size);
        let applied = resources.context.size;
        self.uniforms
            .set_resolution(applied.width, applied.height, pixel_ratio);
        resources.multisample_target = MultisampleTarget::for_context(&resources.context);
        tracing::debug!(
            width = applied.width,
            height = applied.height,
            pixel_ratio,
            "resized GPU surface"
        );
    }

    /// Uploads the per-frame uniforms and submits one draw call. A disposed
    /// state silently skips the frame; stray redraws during teardown are
    /// expected and harmless.
    pub(crate) fn render_frame(
        &mut self,
        sample: TimeSample,
        pointer: [f32; 4],
    ) -> Result<(), wgpu::SurfaceError> {
        let Some(resources) = self.resources.as_mut() else {
            tracing::trace!("skipping frame on disposed GPU state");
            return Ok(());
        };

        self.uniforms.set_time(sample);
        self.uniforms.set_pointer(pointer);
        resources.context.queue.write_buffer(
            &resources.pipeline.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );

        let frame = resources.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            resources
                .context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("effect encoder"),
                });

        let (attachment_view, resolve_target) = match &resources.multisample_target {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("effect pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&resources.pipeline.pipeline);
            render_pass.set_bind_group(0, &resources.pipeline.uniform_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        resources
            .context
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        let now = Instant::now();
        if now.duration_since(self.last_log_time) >= Duration::from_secs(1) {
            tracing::debug!(
                time = self.uniforms.time,
                frame = self.uniforms.frame,
                pointer_x = pointer[0],
                pointer_y = pointer[1],
                width = resources.context.size.width,
                height = resources.context.size.height,
                "effect frame"
            );
            self.last_log_time = now;
        }

        Ok(())
    }

    /// Releases every GPU resource in dependency order. Safe to call more
    /// than once.
    pub(crate) fn dispose(&mut self) {
        let Some(resources) = self.resources.take() else {
            tracing::debug!("GPU state already disposed");
            return;
        };
        let GpuResources {
            context,
            pipeline,
            multisample_target,
        } = resources;
        let EffectPipeline {
            uniform_buffer,
            uniform_bind_group,
            pipeline,
        } = pipeline;
        drop(multisample_target);
        drop(uniform_bind_group);
        drop(uniform_buffer);
        drop(pipeline);
        drop(context);
        tracing::debug!("GPU resources released");
    }
}

impl Drop for GpuState {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    /// Builds the MSAA color target when multisampling is active.
    fn for_context(context: &GpuContext) -> Option<Self> {
        if context.sample_count <= 1 {
            return None;
        }
        let texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("effect msaa color"),
            size: wgpu::Extent3d {
                width: context.size.width.max(1),
                height: context.size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: context.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: context.surface_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Some(Self {
            _texture: texture,
            view,
        })
    }
}
