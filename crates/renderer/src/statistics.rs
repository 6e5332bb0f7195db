//! Rolling frame-time statistics.
//!
//! Measures the time between `frame_will_start` and `frame_did_finish`
//! (CPU work plus GPU work when the backend waits for it) and produces a
//! [`FrameReport`] once per interval.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frames: u64,
    pub average: Duration,
    pub max: Duration,
    /// Frames per second over the wall-clock length of the interval.
    pub fps: f64,
}

#[derive(Debug, Clone)]
pub struct FrameStatistics {
    interval: Duration,
    interval_start: Instant,
    frame_start: Option<Instant>,
    frames: u64,
    total: Duration,
    max: Duration,
}

impl FrameStatistics {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            interval_start: now,
            frame_start: None,
            frames: 0,
            total: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(self.interval, now);
    }

    pub fn frame_will_start(&mut self, now: Instant) {
        self.frame_start = Some(now);
    }

    /// Records the frame and returns a report when the interval has elapsed.
    pub fn frame_did_finish(&mut self, now: Instant) -> Option<FrameReport> {
        let start = self.frame_start.take()?;
        let frame_time = now.saturating_duration_since(start);
        self.frames += 1;
        self.total += frame_time;
        self.max = self.max.max(frame_time);

        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }
        let report = FrameReport {
            frames: self.frames,
            average: self.total / self.frames as u32,
            max: self.max,
            fps: self.frames as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        };
        self.reset(now);
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_average_and_max_once_per_interval() {
        let origin = Instant::now();
        let mut stats = FrameStatistics::new(Duration::from_millis(900), origin);
        let frame_times = [10u64, 30, 20];
        let mut reports = Vec::new();
        for (i, ms) in frame_times.iter().enumerate() {
            let start = origin + Duration::from_millis(400 * i as u64 + 100);
            stats.frame_will_start(start);
            reports.push(stats.frame_did_finish(start + Duration::from_millis(*ms)));
        }
        assert!(reports[0].is_none());
        assert!(reports[1].is_none());
        let report = reports[2].expect("interval elapsed on the third frame");
        assert_eq!(report.frames, 3);
        assert_eq!(report.average, Duration::from_millis(20));
        assert_eq!(report.max, Duration::from_millis(30));
        assert!((report.fps - 3.0 / 0.92).abs() < 1e-9);
    }

    #[test]
    fn counters_restart_after_a_report() {
        let origin = Instant::now();
        let mut stats = FrameStatistics::new(Duration::from_millis(10), origin);
        stats.frame_will_start(origin);
        assert!(stats.frame_did_finish(origin + Duration::from_millis(50)).is_some());

        let next = origin + Duration::from_millis(60);
        stats.frame_will_start(next);
        let report = stats
            .frame_did_finish(next + Duration::from_millis(1))
            .expect("interval elapsed");
        assert_eq!(report.frames, 1);
        assert_eq!(report.max, Duration::from_millis(1));
    }

    #[test]
    fn finish_without_start_is_ignored() {
        let origin = Instant::now();
        let mut stats = FrameStatistics::new(Duration::ZERO, origin);
        assert!(stats.frame_did_finish(origin).is_none());
    }
}
