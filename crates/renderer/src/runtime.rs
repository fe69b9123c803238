//! Frame scheduling for the render loop.
//!
//! The scheduler is a small state machine (`Idle -> Running -> Stopped`,
//! with `Stopped` terminal) that advances animation time by a fixed nominal
//! step per tick and optionally paces frames against a target FPS. A
//! stopped scheduler refuses further ticks, which is what makes late event
//! callbacks harmless during teardown.

use std::time::{Duration, Instant};

/// Time added to the animation clock per rendered frame, in seconds. Motion
/// slows down rather than skipping when the host cannot sustain the display
/// cadence.
pub const NOMINAL_FRAME_STEP: f32 = 0.016;

/// Tolerance when comparing against the pacing deadline, so frames are not
/// pushed a whole display cycle late by sub-millisecond wakeup jitter.
const PACING_SLACK: Duration = Duration::from_micros(250);

/// Snapshot of the animation clock for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed animation time in seconds, monotonic from mount.
    pub seconds: f32,
    /// Step applied for this frame.
    pub delta: f32,
    /// Monotonic frame counter, starting at zero.
    pub frame_index: u64,
}

/// Lifecycle states of the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Drives the render loop: owns the animation clock and the FPS pacing.
#[derive(Debug)]
pub struct FrameScheduler {
    state: LoopState,
    step: f32,
    seconds: f32,
    frame: u64,
    target_interval: Option<Duration>,
    next_frame_at: Option<Instant>,
}

impl FrameScheduler {
    /// Creates an idle scheduler. Non-positive or non-finite steps fall
    /// back to [`NOMINAL_FRAME_STEP`]; a non-positive FPS cap means
    /// uncapped.
    pub fn new(step: f32, target_fps: Option<f32>) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            tracing::warn!(step, fallback = NOMINAL_FRAME_STEP, "invalid frame step");
            NOMINAL_FRAME_STEP
        };
        let target_interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .map(|fps| Duration::from_secs_f32(1.0 / fps));
        Self {
            state: LoopState::Idle,
            step,
            seconds: 0.0,
            frame: 0,
            target_interval,
            next_frame_at: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Elapsed animation time in seconds; zero until the first tick.
    pub fn seconds(&self) -> f32 {
        self.seconds
    }

    /// Number of ticks taken so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Starts the loop. Stopped is terminal: a new mount gets a new
    /// scheduler instead of reviving this one.
    pub fn start(&mut self) {
        match self.state {
            LoopState::Idle => self.state = LoopState::Running,
            LoopState::Running => {}
            LoopState::Stopped => {
                tracing::warn!("ignoring start on a stopped scheduler");
            }
        }
    }

    /// Advances the animation clock by one nominal step. Returns `None`
    /// unless the loop is running, so ticks arriving during or after
    /// teardown are no-ops.
    pub fn tick(&mut self) -> Option<TimeSample> {
        if self.state != LoopState::Running {
            return None;
        }
        self.seconds += self.step;
        let sample = TimeSample {
            seconds: self.seconds,
            delta: self.step,
            frame_index: self.frame,
        };
        self.frame = self.frame.saturating_add(1);
        Some(sample)
    }

    /// Stops the loop permanently. Idempotent.
    pub fn stop(&mut self) {
        if self.state != LoopState::Stopped {
            tracing::debug!(
                frames = self.frame,
                seconds = self.seconds,
                "frame scheduler stopped"
            );
        }
        self.state = LoopState::Stopped;
        self.next_frame_at = None;
    }

    /// Whether a frame should be rendered now. Always true while running
    /// and uncapped; with a cap, true once the pacing deadline has passed.
    pub fn ready_for_frame(&self, now: Instant) -> bool {
        if !self.is_running() {
            return false;
        }
        match (self.target_interval, self.next_frame_at) {
            (None, _) | (Some(_), None) => true,
            (Some(_), Some(deadline)) => now + PACING_SLACK >= deadline,
        }
    }

    /// Records that a frame was just rendered, advancing the pacing
    /// deadline by one interval (anchored to the previous deadline to avoid
    /// drift, unless the loop has fallen behind).
    pub fn mark_rendered(&mut self, now: Instant) {
        let Some(interval) = self.target_interval else {
            return;
        };
        let next = match self.next_frame_at {
            Some(deadline) if deadline + interval > now => deadline + interval,
            _ => now + interval,
        };
        self.next_frame_at = Some(next);
    }

    /// Deadline the loop should sleep until when no frame is due yet.
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.is_running() {
            return None;
        }
        self.next_frame_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_scheduler_refuses_ticks() {
        let mut scheduler = FrameScheduler::new(NOMINAL_FRAME_STEP, None);
        assert_eq!(scheduler.state(), LoopState::Idle);
        assert!(scheduler.tick().is_none());
        assert_eq!(scheduler.seconds(), 0.0);
    }

    #[test]
    fn time_starts_at_zero_and_advances_by_the_fixed_step() {
        let mut scheduler = FrameScheduler::new(NOMINAL_FRAME_STEP, None);
        scheduler.start();
        assert_eq!(scheduler.seconds(), 0.0);
        let first = scheduler.tick().expect("running scheduler ticks");
        assert_eq!(first.frame_index, 0);
        assert!((first.seconds - NOMINAL_FRAME_STEP).abs() < 1e-6);
        assert_eq!(first.delta, NOMINAL_FRAME_STEP);
    }

    #[test]
    fn ten_thousand_ticks_then_stop() {
        let mut scheduler = FrameScheduler::new(NOMINAL_FRAME_STEP, None);
        scheduler.start();
        let mut last = None;
        for _ in 0..10_000 {
            last = scheduler.tick();
        }
        let last = last.expect("scheduler kept running");
        assert_eq!(last.frame_index, 9_999);
        assert_eq!(scheduler.frame_count(), 10_000);
        let expected = NOMINAL_FRAME_STEP * 10_000.0;
        assert!((last.seconds - expected).abs() / expected < 1e-4);
        scheduler.stop();
        assert!(scheduler.tick().is_none());
        assert!(scheduler.next_deadline().is_none());
    }

    #[test]
    fn stop_is_idempotent_and_terminal() {
        let mut scheduler = FrameScheduler::new(NOMINAL_FRAME_STEP, None);
        scheduler.start();
        scheduler.stop();
        scheduler.stop();
        assert_eq!(scheduler.state(), LoopState::Stopped);
        scheduler.start();
        assert_eq!(scheduler.state(), LoopState::Stopped);
        assert!(scheduler.tick().is_none());
    }

    #[test]
    fn uncapped_scheduler_is_always_ready() {
        let mut scheduler = FrameScheduler::new(NOMINAL_FRAME_STEP, None);
        scheduler.start();
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
        assert!(scheduler.next_deadline().is_none());
    }

    #[test]
    fn fps_cap_spaces_frames_by_the_interval() {
        let mut scheduler = FrameScheduler::new(NOMINAL_FRAME_STEP, Some(50.0));
        scheduler.start();
        let start = Instant::now();
        assert!(scheduler.ready_for_frame(start), "first frame is immediate");
        scheduler.mark_rendered(start);
        assert!(!scheduler.ready_for_frame(start + Duration::from_millis(5)));
        assert!(scheduler.ready_for_frame(start + Duration::from_millis(20)));
        let deadline = scheduler.next_deadline().expect("capped loop has a deadline");
        assert_eq!(deadline, start + Duration::from_millis(20));
    }

    #[test]
    fn pacing_anchors_to_the_deadline_not_the_render_instant() {
        let mut scheduler = FrameScheduler::new(NOMINAL_FRAME_STEP, Some(50.0));
        scheduler.start();
        let start = Instant::now();
        scheduler.mark_rendered(start);
        // Rendered 3ms late; the next deadline still lands on the grid.
        scheduler.mark_rendered(start + Duration::from_millis(23));
        assert_eq!(
            scheduler.next_deadline(),
            Some(start + Duration::from_millis(40))
        );
    }

    #[test]
    fn invalid_fps_and_step_fall_back() {
        let mut scheduler = FrameScheduler::new(-1.0, Some(0.0));
        scheduler.start();
        let sample = scheduler.tick().expect("ticks");
        assert_eq!(sample.delta, NOMINAL_FRAME_STEP);
        assert!(scheduler.ready_for_frame(Instant::now()));
        assert!(scheduler.next_deadline().is_none());
    }

    #[test]
    fn stopped_scheduler_is_never_ready() {
        let mut scheduler = FrameScheduler::new(NOMINAL_FRAME_STEP, Some(60.0));
        scheduler.start();
        scheduler.stop();
        assert!(!scheduler.ready_for_frame(Instant::now()));
    }
}
