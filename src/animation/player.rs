use super::Animation;
use crate::kinematics::{AnimationPlan, Segment};

/// Plays the segments of an [`AnimationPlan`] back to back.
///
/// Each segment starts exactly where and when the previous one ended, regardless of when the
/// host delivers frames. Dropping the player abandons the rest of the plan.
#[derive(Debug)]
pub struct PlanPlayer {
    current: Animation,
    next: Option<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    pub value: f64,
    pub done: bool,
}

impl PlanPlayer {
    pub fn start(plan: &AnimationPlan, from: f64, now: u64) -> Self {
        let (first, next) = match *plan {
            AnimationPlan::Bounce(bounce) => (bounce, None),
            AnimationPlan::SlowDownThenBounce { slow_down, bounce } => (slow_down, Some(bounce)),
        };

        Self {
            current: segment_animation(first, from, now),
            next,
        }
    }

    /// Moves playback to `now` and returns the value to publish.
    pub fn advance(&mut self, now: u64) -> Playback {
        while self.current.is_done_at(now) {
            let Some(next) = self.next.take() else {
                return Playback {
                    value: self.current.to(),
                    done: true,
                };
            };

            trace!("starting next segment at {}", self.current.end_time());
            self.current = segment_animation(next, self.current.to(), self.current.end_time());
        }

        Playback {
            value: self.current.value_at(now),
            done: false,
        }
    }

    pub fn end_time(&self) -> u64 {
        let rest = self.next.map_or(0, |s| s.duration_ms);
        self.current.end_time().saturating_add(rest)
    }
}

fn segment_animation(segment: Segment, from: f64, start_time: u64) -> Animation {
    Animation::new(
        from,
        segment.target,
        start_time,
        segment.duration_ms,
        segment.curve,
    )
}
