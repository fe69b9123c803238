//! CPU-side mirror of the shader uniform block.

use bytemuck::{Pod, Zeroable};

use crate::pointer::POINTER_CENTER;
use crate::runtime::TimeSample;

/// Uniform block fed to the fragment shader, std140-compatible. The fourth
/// component of `resolution` mirrors the time value so GLSL front ends that
/// collapse padding still see an animating field.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct EffectUniforms {
    /// xy = presentation surface size in pixels, z = clamped device pixel
    /// ratio, w = mirrored time.
    pub resolution: [f32; 4],
    /// xy = smoothed pointer in [0,1]^2, zw = raw target.
    pub pointer: [f32; 4],
    pub time: f32,
    pub time_delta: f32,
    pub frame: i32,
    pub _padding0: f32,
}

unsafe impl Zeroable for EffectUniforms {}
unsafe impl Pod for EffectUniforms {}

impl EffectUniforms {
    /// Prepares a uniform block sized to the current surface, pointer at
    /// the neutral centre, time at zero.
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        let mut uniforms = Self {
            resolution: [0.0; 4],
            pointer: [
                POINTER_CENTER[0],
                POINTER_CENTER[1],
                POINTER_CENTER[0],
                POINTER_CENTER[1],
            ],
            time: 0.0,
            time_delta: 0.0,
            frame: 0,
            _padding0: 0.0,
        };
        uniforms.set_resolution(width, height, pixel_ratio);
        uniforms
    }

    /// Writes the presentation dimensions. Called from the same resize path
    /// that reconfigures the surface, so no frame sees one without the
    /// other.
    pub fn set_resolution(&mut self, width: u32, height: u32, pixel_ratio: f32) {
        self.resolution[0] = width.max(1) as f32;
        self.resolution[1] = height.max(1) as f32;
        self.resolution[2] = pixel_ratio;
    }

    /// Applies the packed pointer value, clamping to the unit square.
    /// Non-finite components snap back to the centre.
    pub fn set_pointer(&mut self, pointer: [f32; 4]) {
        for (slot, (value, neutral)) in self
            .pointer
            .iter_mut()
            .zip(pointer.into_iter().zip([0.5, 0.5, 0.5, 0.5]))
        {
            *slot = if value.is_finite() {
                value.clamp(0.0, 1.0)
            } else {
                neutral
            };
        }
    }

    /// Advances the clock fields and mirrors time into `resolution.w`.
    pub fn set_time(&mut self, sample: TimeSample) {
        self.time = sample.seconds;
        self.time_delta = sample.delta;
        self.frame = sample.frame_index.min(i32::MAX as u64) as i32;
        self.resolution[3] = sample.seconds;
    }
}
