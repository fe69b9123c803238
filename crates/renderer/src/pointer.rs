//! Pointer tracking with per-frame exponential smoothing.
//!
//! Raw cursor events only move a *target*; the position the shader sees is
//! pulled toward that target once per tick. Visual motion therefore stays
//! continuous even when input events arrive in bursts or not at all.

use winit::dpi::{PhysicalPosition, PhysicalSize};

/// Default smoothing factor: the fraction of the remaining distance covered
/// per tick. Smaller is smoother, larger is snappier.
pub const POINTER_LERP_FACTOR: f32 = 0.08;

/// Neutral pointer position used before any input and after the cursor
/// leaves the surface.
pub const POINTER_CENTER: [f32; 2] = [0.5, 0.5];

/// Tracks the pointer in normalized surface coordinates, Y up.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    target: [f32; 2],
    smoothed: [f32; 2],
    lerp_factor: f32,
}

impl PointerTracker {
    /// Creates a tracker resting at the surface centre. Out-of-range or
    /// non-finite factors fall back to [`POINTER_LERP_FACTOR`].
    pub fn new(lerp_factor: f32) -> Self {
        let lerp_factor = if lerp_factor.is_finite() && lerp_factor > 0.0 && lerp_factor <= 1.0 {
            lerp_factor
        } else {
            tracing::warn!(
                lerp_factor,
                fallback = POINTER_LERP_FACTOR,
                "pointer lerp factor outside (0, 1]; using default"
            );
            POINTER_LERP_FACTOR
        };
        Self {
            target: POINTER_CENTER,
            smoothed: POINTER_CENTER,
            lerp_factor,
        }
    }

    /// Converts a cursor position within the window into the normalized
    /// target. Y is flipped because the shader's Y axis increases upward.
    pub fn handle_cursor_moved(
        &mut self,
        position: PhysicalPosition<f64>,
        bounds: PhysicalSize<u32>,
    ) {
        if bounds.width == 0 || bounds.height == 0 {
            return;
        }
        let x = (position.x / f64::from(bounds.width)) as f32;
        let y = 1.0 - (position.y / f64::from(bounds.height)) as f32;
        self.target = [x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)];
    }

    /// Re-targets the surface centre when the cursor leaves.
    pub fn handle_cursor_left(&mut self) {
        self.target = POINTER_CENTER;
    }

    /// One smoothing step: moves the applied position a fixed fraction of
    /// the remaining distance toward the target. Never overshoots.
    pub fn tick(&mut self) {
        for axis in 0..2 {
            self.smoothed[axis] +=
                (self.target[axis] - self.smoothed[axis]) * self.lerp_factor;
        }
    }

    pub fn smoothed(&self) -> [f32; 2] {
        self.smoothed
    }

    pub fn target(&self) -> [f32; 2] {
        self.target
    }

    /// Packed uniform value: xy = smoothed position, zw = raw target.
    pub fn as_uniform(&self) -> [f32; 4] {
        [
            self.smoothed[0],
            self.smoothed[1],
            self.target[0],
            self.target[1],
        ]
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(POINTER_LERP_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> PhysicalSize<u32> {
        PhysicalSize::new(800, 600)
    }

    #[test]
    fn rests_at_center_before_any_event() {
        let tracker = PointerTracker::default();
        assert_eq!(tracker.target(), POINTER_CENTER);
        assert_eq!(tracker.smoothed(), POINTER_CENTER);
    }

    #[test]
    fn cursor_move_normalizes_and_flips_y() {
        let mut tracker = PointerTracker::default();
        tracker.handle_cursor_moved(PhysicalPosition::new(200.0, 150.0), bounds());
        let [x, y] = tracker.target();
        assert!((x - 0.25).abs() < 1e-6);
        assert!((y - 0.75).abs() < 1e-6);
    }

    #[test]
    fn coordinates_outside_the_surface_are_clamped() {
        let mut tracker = PointerTracker::default();
        tracker.handle_cursor_moved(PhysicalPosition::new(-50.0, 9000.0), bounds());
        assert_eq!(tracker.target(), [0.0, 0.0]);
    }

    #[test]
    fn zero_sized_bounds_are_ignored() {
        let mut tracker = PointerTracker::default();
        tracker.handle_cursor_moved(PhysicalPosition::new(10.0, 10.0), PhysicalSize::new(0, 0));
        assert_eq!(tracker.target(), POINTER_CENTER);
    }

    #[test]
    fn smoothing_converges_monotonically_without_overshoot() {
        let mut tracker = PointerTracker::new(0.1);
        tracker.handle_cursor_moved(PhysicalPosition::new(800.0, 600.0), bounds());
        let target = tracker.target();
        let mut previous = tracker.smoothed();
        for _ in 0..200 {
            tracker.tick();
            let current = tracker.smoothed();
            for axis in 0..2 {
                let before = (target[axis] - previous[axis]).abs();
                let after = (target[axis] - current[axis]).abs();
                assert!(after <= before, "distance to target grew");
                let sign_before = (target[axis] - previous[axis]).signum();
                let sign_after = (target[axis] - current[axis]).signum();
                assert!(
                    sign_after == sign_before || after < 1e-6,
                    "smoothing overshot the target"
                );
            }
            previous = current;
        }
        // Convergence within a tick budget proportional to 1 / lerp_factor.
        assert!((target[0] - previous[0]).abs() < 1e-3);
        assert!((target[1] - previous[1]).abs() < 1e-3);
    }

    #[test]
    fn cursor_leave_resets_target_to_center() {
        let mut tracker = PointerTracker::default();
        tracker.handle_cursor_moved(PhysicalPosition::new(799.0, 1.0), bounds());
        assert_ne!(tracker.target(), POINTER_CENTER);
        tracker.handle_cursor_left();
        assert_eq!(tracker.target(), POINTER_CENTER);
        for _ in 0..500 {
            tracker.tick();
        }
        let [x, y] = tracker.smoothed();
        assert!((x - 0.5).abs() < 1e-3);
        assert!((y - 0.5).abs() < 1e-3);
    }

    #[test]
    fn only_the_latest_target_applies_between_ticks() {
        let mut tracker = PointerTracker::default();
        tracker.handle_cursor_moved(PhysicalPosition::new(0.0, 0.0), bounds());
        tracker.handle_cursor_moved(PhysicalPosition::new(400.0, 300.0), bounds());
        tracker.tick();
        let [x, y] = tracker.smoothed();
        // A burst of events before one tick behaves as if only the last
        // event happened.
        assert!((x - 0.5).abs() < 1e-6);
        assert!((y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn invalid_lerp_factor_falls_back_to_default() {
        let tracker = PointerTracker::new(f32::NAN);
        assert_eq!(tracker.lerp_factor, POINTER_LERP_FACTOR);
        let tracker = PointerTracker::new(0.0);
        assert_eq!(tracker.lerp_factor, POINTER_LERP_FACTOR);
        let tracker = PointerTracker::new(2.0);
        assert_eq!(tracker.lerp_factor, POINTER_LERP_FACTOR);
    }
}
