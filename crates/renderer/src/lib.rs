//! Renderer crate for Blobfield.
//!
//! The crate turns a small uniform bag (time, pointer, resolution) into a
//! continuously animated metaball field drawn by a generated fragment
//! shader. The overall flow is:
//!
//! ```text
//!   CLI / blobfield
//!          │ EffectConfig
//!          ▼
//!   Effect::launch ──▶ render thread ──▶ winit event loop ──▶ render_frame()
//!          ▲                │                     │
//!          │                │   CursorMoved ──▶ PointerTracker ─┐
//!          │                │   Resized ──────▶ GpuState.resize │
//!          │                │                     ▼             ▼
//!          │                └─▶ FrameScheduler.tick() ─▶ EffectUniforms ─▶ GPU UBO
//!          │
//!   Effect::stop ──▶ shutdown command ──▶ scheduler.stop ─▶ dispose ─▶ join
//! ```
//!
//! `GpuState` owns all GPU resources (surface, device, pipeline, uniform
//! buffer); `Effect` is the lifecycle object that supervises creation and
//! teardown of everything as one unit. The shader itself is generated from
//! the constant table in [`field`], which doubles as the CPU reference
//! implementation of the metaball math.

mod compile;
mod effect;
pub mod field;
mod gpu;
pub mod pointer;
pub mod runtime;
mod types;

pub use effect::Effect;
pub use field::TIME_SCALE;
pub use pointer::POINTER_LERP_FACTOR;
pub use runtime::NOMINAL_FRAME_STEP;
pub use types::{Antialiasing, EffectConfig, EffectError, DEVICE_PIXEL_RATIO_CAP};
