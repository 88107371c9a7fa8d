use keyframe::functions::EaseOutQuad;
use keyframe::EasingFunction;

mod player;
pub use player::{PlanPlayer, Playback};

/// A value eased from `from` to `to` over a fixed duration.
///
/// Times are milliseconds on the same monotonic timeline as the pointer events.
#[derive(Debug, Clone, Copy)]
pub struct Animation {
    from: f64,
    to: f64,
    start_time: u64,
    duration: u64,
    curve: Curve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// Fast start that eases into the target, `1 - (1 - x)^2`.
    Decelerate,
}

impl Animation {
    pub fn new(from: f64, to: f64, start_time: u64, duration: u64, curve: Curve) -> Self {
        Self {
            from,
            to,
            start_time,
            duration,
            curve,
        }
    }

    pub fn value_at(&self, at: u64) -> f64 {
        if self.end_time() <= at {
            return self.to;
        } else if at <= self.start_time {
            return self.from;
        }

        // Zero durations never get here.
        let passed = (at - self.start_time) as f64;
        let x = (passed / self.duration as f64).clamp(0., 1.);
        self.curve.y(x) * (self.to - self.from) + self.from
    }

    pub fn is_done_at(&self, at: u64) -> bool {
        self.end_time() <= at
    }

    pub fn to(&self) -> f64 {
        self.to
    }

    pub fn end_time(&self) -> u64 {
        self.start_time.saturating_add(self.duration)
    }
}

impl Curve {
    pub fn y(self, x: f64) -> f64 {
        match self {
            Curve::Decelerate => EaseOutQuad.y(x),
        }
    }
}
