//! Closed-form release animations.
//!
//! Both plans assume constant acceleration that starts or ends at zero velocity. With `a` the
//! acceleration, `t` the time and `d` the distance:
//!
//! - bounce: starts at rest, so `Vavg = a * t / 2` and `d = Vavg * t`, giving `t = sqrt(2d / a)`;
//! - slow down: ends at rest, so `t = v / a` and `d = v^2 / 2a`.
//!
//! Positions are in host units and times in milliseconds, so velocities are units/ms and
//! accelerations units/ms².

use arrayvec::ArrayVec;

use crate::animation::Curve;
use crate::input::pointer::PointerSample;

/// One leg of a release animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Offset reached at the end of the segment.
    pub target: f64,
    pub duration_ms: u64,
    pub curve: Curve,
}

/// What to play after the finger lifts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationPlan {
    /// Return straight to rest.
    Bounce(Segment),
    /// Keep travelling downward until the residual velocity is absorbed, then return to rest.
    SlowDownThenBounce { slow_down: Segment, bounce: Segment },
}

impl AnimationPlan {
    pub fn segments(&self) -> ArrayVec<Segment, 2> {
        let mut rv = ArrayVec::new();
        match *self {
            AnimationPlan::Bounce(bounce) => rv.push(bounce),
            AnimationPlan::SlowDownThenBounce { slow_down, bounce } => {
                rv.push(slow_down);
                rv.push(bounce);
            }
        }
        rv
    }

    /// The segment that brings the offset back to rest.
    pub fn bounce(&self) -> Segment {
        match *self {
            AnimationPlan::Bounce(bounce) => bounce,
            AnimationPlan::SlowDownThenBounce { bounce, .. } => bounce,
        }
    }
}

/// Plan that decelerates from `offset` back to zero under `bounce_acceleration`.
pub fn bounce_plan(offset: f64, bounce_acceleration: f64) -> AnimationPlan {
    AnimationPlan::Bounce(bounce_segment(offset, bounce_acceleration))
}

/// Plan that absorbs a downward release velocity before bouncing back.
///
/// A velocity that is not strictly positive has nothing to absorb, so this degrades to
/// [`bounce_plan`].
pub fn slow_down_then_bounce_plan(
    offset: f64,
    release_velocity: f64,
    slow_down_deceleration: f64,
    bounce_acceleration: f64,
) -> AnimationPlan {
    let offset = sanitize_offset(offset);

    let extra = extra_distance(release_velocity, slow_down_deceleration);
    let Some(extra) = extra.filter(|_| release_velocity > 0.) else {
        return bounce_plan(offset, bounce_acceleration);
    };

    let slow_down = Segment {
        target: offset + extra,
        duration_ms: round_ms(release_velocity / slow_down_deceleration),
        curve: Curve::Decelerate,
    };

    AnimationPlan::SlowDownThenBounce {
        slow_down,
        bounce: bounce_segment(offset + extra, bounce_acceleration),
    }
}

/// Velocity between two samples in units/ms.
///
/// Returns `None` when no time elapsed between the samples (or time went backwards), which
/// callers treat as "not moving downward".
pub fn release_velocity(previous: PointerSample, release: PointerSample) -> Option<f64> {
    let elapsed = release.timestamp.checked_sub(previous.timestamp)?;
    if elapsed == 0 {
        return None;
    }

    let velocity = (release.position - previous.position) / elapsed as f64;
    velocity.is_finite().then_some(velocity)
}

fn bounce_segment(offset: f64, bounce_acceleration: f64) -> Segment {
    let offset = sanitize_offset(offset);
    let time = (2. * offset / bounce_acceleration).sqrt();

    Segment {
        target: 0.,
        duration_ms: round_ms(time),
        curve: Curve::Decelerate,
    }
}

fn extra_distance(velocity: f64, deceleration: f64) -> Option<f64> {
    let extra = velocity * velocity / (2. * deceleration);
    (extra.is_finite() && extra >= 0.).then_some(extra)
}

fn sanitize_offset(offset: f64) -> f64 {
    if offset.is_finite() {
        offset.max(0.)
    } else {
        0.
    }
}

fn round_ms(time: f64) -> u64 {
    if time.is_finite() && time > 0. {
        time.round() as u64
    } else {
        0
    }
}
