use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub frame_time_ms: f32,
    /// Largest frame delta in the interval; spikes here are what the
    /// movement sub-stepping has to absorb.
    pub worst_frame_time_ms: f32,
    pub update_time_ms: f32,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    frame_time_sum: Duration,
    worst_frame_time: Duration,
    update_time_sum: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            frames: 0,
            frame_time_sum: Duration::ZERO,
            worst_frame_time: Duration::ZERO,
            update_time_sum: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration, update_time: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
        self.worst_frame_time = self.worst_frame_time.max(frame_dt);
        self.update_time_sum = self.update_time_sum.saturating_add(update_time);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let mean_ms = |sum: Duration| {
            if self.frames == 0 {
                0.0
            } else {
                (sum.as_secs_f32() / self.frames as f32) * 1000.0
            }
        };

        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            frame_time_ms: mean_ms(self.frame_time_sum),
            worst_frame_time_ms: self.worst_frame_time.as_secs_f32() * 1000.0,
            update_time_ms: mean_ms(self.update_time_sum),
        };

        self.interval_start = now;
        self.frames = 0;
        self.frame_time_sum = Duration::ZERO;
        self.worst_frame_time = Duration::ZERO;
        self.update_time_sum = Duration::ZERO;

        Some(snapshot)
    }
}
