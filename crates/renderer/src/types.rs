//! Public configuration and error types for the effect.

use winit::dpi::PhysicalSize;

use crate::field::TIME_SCALE;
use crate::pointer::POINTER_LERP_FACTOR;

/// Device pixel ratio cap: high-density displays render at most at twice
/// the logical density to bound GPU cost.
pub const DEVICE_PIXEL_RATIO_CAP: f64 = 2.0;

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device
    /// supports).
    Samples(u32),
}

impl Default for Antialiasing {
    fn default() -> Self {
        Self::Auto
    }
}

/// Immutable configuration for one mount of the effect.
///
/// Mirrors the CLI flags; constructed once and handed to
/// [`crate::Effect::launch`].
#[derive(Debug, Clone)]
pub struct EffectConfig {
    /// Host window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Anti-aliasing policy.
    pub antialiasing: Antialiasing,
    /// Optional FPS cap; `None` renders at the display cadence.
    pub target_fps: Option<f32>,
    /// Pointer smoothing factor in (0, 1].
    pub lerp_factor: f32,
    /// Multiplier applied to the time uniform inside the shader.
    pub time_scale: f32,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            surface_size: (1920, 1080),
            antialiasing: Antialiasing::default(),
            target_fps: None,
            lerp_factor: POINTER_LERP_FACTOR,
            time_scale: TIME_SCALE,
        }
    }
}

/// Mount-time failures. The effect is decorative: callers are expected to
/// log these and continue without it rather than abort the host.
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error("failed to start the render thread")]
    Thread(#[source] anyhow::Error),
    #[error("failed to create the host window")]
    Window(#[source] anyhow::Error),
    #[error("failed to initialise the GPU surface")]
    Gpu(#[source] anyhow::Error),
}

/// Presentation size for a window: physical pixels, scaled down when the
/// display's pixel ratio exceeds [`DEVICE_PIXEL_RATIO_CAP`].
pub(crate) fn presentation_size(
    physical: PhysicalSize<u32>,
    scale_factor: f64,
) -> PhysicalSize<u32> {
    if !(scale_factor.is_finite() && scale_factor > DEVICE_PIXEL_RATIO_CAP) {
        return PhysicalSize::new(physical.width.max(1), physical.height.max(1));
    }
    let ratio = DEVICE_PIXEL_RATIO_CAP / scale_factor;
    let width = (f64::from(physical.width) * ratio).round() as u32;
    let height = (f64::from(physical.height) * ratio).round() as u32;
    PhysicalSize::new(width.max(1), height.max(1))
}

/// Pixel ratio actually applied after capping, as stored in the uniforms.
pub(crate) fn clamped_pixel_ratio(scale_factor: f64) -> f32 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor.min(DEVICE_PIXEL_RATIO_CAP) as f32
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_size_passes_through_at_standard_density() {
        let size = presentation_size(PhysicalSize::new(1920, 1080), 1.0);
        assert_eq!(size, PhysicalSize::new(1920, 1080));
    }

    #[test]
    fn presentation_size_is_unchanged_exactly_at_the_cap() {
        let size = presentation_size(PhysicalSize::new(3840, 2160), 2.0);
        assert_eq!(size, PhysicalSize::new(3840, 2160));
    }

    #[test]
    fn presentation_size_scales_down_above_the_cap() {
        // A 3x display: logical 1000x500, physical 3000x1500, rendered at
        // logical x cap = 2000x1000.
        let size = presentation_size(PhysicalSize::new(3000, 1500), 3.0);
        assert_eq!(size, PhysicalSize::new(2000, 1000));
        assert_eq!(clamped_pixel_ratio(3.0), 2.0);
    }

    #[test]
    fn degenerate_inputs_stay_renderable() {
        let size = presentation_size(PhysicalSize::new(0, 0), f64::NAN);
        assert_eq!(size, PhysicalSize::new(1, 1));
        assert_eq!(clamped_pixel_ratio(f64::NAN), 1.0);
        assert_eq!(clamped_pixel_ratio(0.0), 1.0);
    }

    #[test]
    fn default_config_uses_the_named_tunables() {
        let config = EffectConfig::default();
        assert_eq!(config.lerp_factor, POINTER_LERP_FACTOR);
        assert_eq!(config.time_scale, TIME_SCALE);
        assert_eq!(config.antialiasing, Antialiasing::Auto);
        assert!(config.target_fps.is_none());
    }
}
