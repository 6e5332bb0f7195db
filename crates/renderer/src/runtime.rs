use std::time::{Duration, Instant};

/// How animation time advances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockMode {
    /// Wall-clock seconds since `start()`.
    Realtime,
    /// A fixed step per frame, independent of how long frames take.
    Stepped { step: Duration },
    /// Every frame sees the same timestamp.
    Frozen { seconds: f64 },
}

impl Default for ClockMode {
    fn default() -> Self {
        Self::Realtime
    }
}

/// Time handed to the sprites for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Seconds since the source was last reset.
    pub seconds: f64,
    /// Frames sampled since the last reset.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f64, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

pub trait TimeSource: Send {
    /// Restarts time at zero.
    fn reset(&mut self);
    /// Produces the time for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Monotonic system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(self.origin.elapsed().as_secs_f64(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Always reports the same timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    seconds: f64,
    frame: u64,
}

impl FixedTimeSource {
    pub fn new(seconds: f64) -> Self {
        Self { seconds, frame: 0 }
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }
}

impl TimeSource for FixedTimeSource {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(self.seconds, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Advances by a fixed step per sample, starting at zero.
#[derive(Debug, Clone, Copy)]
pub struct SteppedTimeSource {
    step: f64,
    frame: u64,
}

impl SteppedTimeSource {
    pub fn new(step: Duration) -> Self {
        Self {
            step: step.as_secs_f64(),
            frame: 0,
        }
    }
}

impl TimeSource for SteppedTimeSource {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(self.frame as f64 * self.step, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

pub fn time_source_for(mode: ClockMode) -> BoxedTimeSource {
    match mode {
        ClockMode::Realtime => Box::new(SystemTimeSource::new()),
        ClockMode::Stepped { step } => Box::new(SteppedTimeSource::new(step)),
        ClockMode::Frozen { seconds } => Box::new(FixedTimeSource::new(seconds)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepped_source_restarts_on_reset() {
        let mut source = time_source_for(ClockMode::Stepped {
            step: Duration::from_millis(250),
        });
        let seconds: Vec<f64> = (0..4).map(|_| source.sample().seconds).collect();
        assert_eq!(seconds, [0.0, 0.25, 0.5, 0.75]);
        source.reset();
        assert_eq!(source.sample(), TimeSample::new(0.0, 0));
    }

    #[test]
    fn fixed_source_counts_frames_but_not_time() {
        let mut source = FixedTimeSource::new(3.5);
        source.sample();
        assert_eq!(source.sample(), TimeSample::new(3.5, 1));
    }

    #[test]
    fn system_source_is_monotonic() {
        let mut source = SystemTimeSource::new();
        let first = source.sample();
        let second = source.sample();
        assert!(second.seconds >= first.seconds);
        assert_eq!(second.frame_index, 1);
    }
}
