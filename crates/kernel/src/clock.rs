//! Runtime clock: program start, per-frame delta time, frame rate.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime};

/// Where the clock reads time from.
pub trait TimeSource {
    /// Monotonic instant. Use for all frame and tick timing.
    fn now(&self) -> Instant;
    /// Wall-clock time. Only used for program start bookkeeping.
    fn wall_now(&self) -> SystemTime;
}

/// The operating system clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Hand-driven time for tests and scripted replay.
///
/// Clones share the same current instant, so a caller can keep a handle and
/// advance time while a context owns another clone.
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    origin: Instant,
    wall_origin: SystemTime,
    current: Rc<Cell<Instant>>,
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualTimeSource {
    pub fn new() -> Self {
        let origin = Instant::now();
        Self {
            origin,
            wall_origin: SystemTime::now(),
            current: Rc::new(Cell::new(origin)),
        }
    }

    /// Instant at which this source started.
    pub fn origin(&self) -> Instant {
        self.origin
    }

    pub fn advance(&self, by: Duration) {
        self.current.set(self.current.get() + by);
    }

    /// Jump to `offset` after the origin. Moving backwards is ignored.
    pub fn set(&self, offset: Duration) {
        let target = self.origin + offset;
        if target > self.current.get() {
            self.current.set(target);
        }
    }

    /// Offset of the current instant from the origin.
    pub fn elapsed(&self) -> Duration {
        self.current.get() - self.origin
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        self.current.get()
    }

    fn wall_now(&self) -> SystemTime {
        self.wall_origin + self.elapsed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("clock did not advance between frame {frame} and the previous one")]
    StalledFrame { frame: u64 },
}

/// Frame clock. `cycle` must be called exactly once per rendered frame.
#[derive(Debug, Clone)]
pub struct RuntimeClock<S = SystemTimeSource> {
    source: S,
    beginning: SystemTime,
    previous_beginning: SystemTime,
    last_frame: Instant,
    frame_time: Duration,
    frames: u64,
}

impl<S: TimeSource> RuntimeClock<S> {
    /// Start a clock with no record of a previous run.
    pub fn new(source: S) -> Self {
        Self::with_previous_beginning(source, None)
    }

    /// Start a clock, remembering when the previous run began.
    ///
    /// With `None` the previous beginning equals this one, i.e. first run.
    pub fn with_previous_beginning(source: S, previous: Option<SystemTime>) -> Self {
        let beginning = source.wall_now();
        let last_frame = source.now();
        Self {
            beginning,
            previous_beginning: previous.unwrap_or(beginning),
            last_frame,
            frame_time: Duration::ZERO,
            frames: 0,
            source,
        }
    }

    /// Sample the clock and compute the last frame's delta.
    ///
    /// A zero delta means the caller cycled twice for one frame.
    pub fn cycle(&mut self) -> Result<Duration, ClockError> {
        let now = self.source.now();
        let delta = now.saturating_duration_since(self.last_frame);
        if delta.is_zero() {
            return Err(ClockError::StalledFrame {
                frame: self.frames + 1,
            });
        }
        self.frame_time = delta;
        self.last_frame = now;
        self.frames += 1;
        Ok(delta)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current monotonic time, read live from the source.
    pub fn now(&self) -> Instant {
        self.source.now()
    }

    /// Instant sampled by the latest `cycle`.
    pub fn frame_instant(&self) -> Instant {
        self.last_frame
    }

    pub fn beginning(&self) -> SystemTime {
        self.beginning
    }

    pub fn previous_beginning(&self) -> SystemTime {
        self.previous_beginning
    }

    pub fn is_first_run(&self) -> bool {
        self.beginning == self.previous_beginning
    }

    /// Wall time since the program started.
    pub fn uptime(&self) -> Duration {
        self.source
            .wall_now()
            .duration_since(self.beginning)
            .unwrap_or_default()
    }

    /// Delta of the most recent frame.
    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    /// Frames per second from the last delta. Zero before the first frame.
    pub fn fps(&self) -> f32 {
        if self.frame_time.is_zero() {
            0.0
        } else {
            1.0 / self.frame_time.as_secs_f32()
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}
