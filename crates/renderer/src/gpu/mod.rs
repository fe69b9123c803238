//! GPU orchestration for the effect.
//!
//! - `context` owns wgpu instance/device/surface wiring and swapchain
//!   reconfiguration on resize.
//! - `pipeline` compiles the generated GLSL into the full-screen render
//!   pipeline with its single uniform bind group.
//! - `uniforms` mirrors the shader's std140 block and is written through
//!   the queue each frame.
//! - `state` glues everything together and owns ordered, idempotent
//!   disposal.

mod context;
mod pipeline;
mod state;
pub(crate) mod uniforms;

pub(crate) use state::GpuState;
