//! # Frame Clock
//!
//! Paces scheduler steps at the world's reveal frame rate.
//!
//! Each frame has a deadline. Waiting sleeps until the deadline, then the
//! deadline advances by one frame. A host that falls more than a frame
//! behind resynchronizes instead of bursting through the backlog, so a
//! stalled reveal resumes at normal speed.

use std::time::{Duration, Instant};

use terragrid_procedural::DEFAULT_FRAMES_PER_SECOND;

/// Spin instead of sleeping when the deadline is this close.
const SPIN_THRESHOLD: Duration = Duration::from_micros(500);

/// Step timing gathered over one reveal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Steps measured.
    pub steps: u64,
    /// Shortest step.
    pub fastest: Duration,
    /// Longest step.
    pub slowest: Duration,
    /// Sum of all step durations.
    pub busy: Duration,
    /// Steps that took longer than a frame.
    pub overruns: u64,
}

impl FrameStats {
    fn record(&mut self, took: Duration, budget: Duration) {
        self.fastest = if self.steps == 0 {
            took
        } else {
            self.fastest.min(took)
        };
        self.slowest = self.slowest.max(took);
        self.busy += took;
        self.steps += 1;
        if took > budget {
            self.overruns += 1;
        }
    }

    /// Mean step duration, zero before the first step.
    #[must_use]
    pub fn mean(&self) -> Duration {
        u32::try_from(self.steps)
            .ok()
            .filter(|&n| n > 0)
            .map_or(Duration::ZERO, |n| self.busy / n)
    }
}

/// Deadline-driven frame pacer.
#[derive(Debug)]
pub struct FrameClock {
    frame: Duration,
    deadline: Instant,
    frames: u64,
    stats: FrameStats,
}

impl FrameClock {
    /// Creates a clock at `frames_per_second`.
    ///
    /// Rates that are not positive and finite fall back to
    /// [`DEFAULT_FRAMES_PER_SECOND`].
    #[must_use]
    pub fn new(frames_per_second: f64) -> Self {
        let fps = if frames_per_second.is_finite() && frames_per_second > 0.0 {
            frames_per_second
        } else {
            DEFAULT_FRAMES_PER_SECOND
        };
        let frame = Duration::from_secs_f64(1.0 / fps);

        Self {
            frame,
            deadline: Instant::now() + frame,
            frames: 0,
            stats: FrameStats::default(),
        }
    }

    /// Length of one frame.
    #[must_use]
    pub const fn frame_duration(&self) -> Duration {
        self.frame
    }

    /// Frames stepped since creation.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Timing of the steps since the last reset.
    #[must_use]
    pub const fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Clears the timing, e.g. between reveals.
    pub fn reset_stats(&mut self) {
        self.stats = FrameStats::default();
    }

    /// Blocks until the current frame's deadline, then opens the next frame.
    pub fn wait_for_frame(&mut self) {
        let now = Instant::now();
        if let Some(remaining) = self.deadline.checked_duration_since(now) {
            if remaining > SPIN_THRESHOLD {
                std::thread::sleep(remaining - SPIN_THRESHOLD);
            }
            while Instant::now() < self.deadline {
                std::hint::spin_loop();
            }
            self.deadline += self.frame;
        } else {
            // Behind schedule; restart the cadence from now.
            self.deadline = now + self.frame;
        }
    }

    /// Runs one frame's worth of `work` and records how long it took.
    pub fn timed<T>(&mut self, work: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let result = work();
        self.stats.record(started.elapsed(), self.frame);
        self.frames += 1;
        result
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FRAMES_PER_SECOND)
    }
}
