//! Over-scroll detection for a single touch sequence.
//!
//! A session starts on pointer down. The first motion decides, once and for the rest of the
//! session, whether the drag pulls the child past its top edge. Armed sessions turn the
//! distance from the initial touch into a damped offset; everything else is left to the child.

use super::pointer::PointerSample;
use crate::child::ScrollChild;
use crate::kinematics::release_velocity;

#[derive(Debug, Default)]
pub struct OverscrollGesture {
    session: Option<GestureSession>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    initial_position: f64,
    previous: PointerSample,
    armed: Armed,
    /// Offset the child already had when the session started.
    base_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Armed {
    /// No motion seen yet.
    Unknown,
    Armed,
    NotArmed,
}

/// How an ended session wants the offset to return to rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleaseAction {
    /// There was no over-scroll drag to release.
    None,
    /// The pointer was moving up or standing still.
    Bounce,
    /// The pointer was still moving down at `velocity` units/ms.
    SlowDown { velocity: f64 },
}

impl OverscrollGesture {
    pub const fn new() -> Self {
        Self { session: None }
    }

    /// Starts a new session, replacing any ongoing one.
    pub fn begin(&mut self, sample: PointerSample, base_offset: f64) {
        if self.session.is_some() {
            trace!("pointer down during an ongoing session, resetting");
        }

        self.session = Some(GestureSession {
            initial_position: sample.position,
            previous: sample,
            armed: Armed::Unknown,
            base_offset,
        });
    }

    /// Handles a motion sample.
    ///
    /// Returns the new offset if the motion belongs to an over-scroll drag.
    pub fn update(
        &mut self,
        sample: PointerSample,
        child: &impl ScrollChild,
        friction_rate: f64,
    ) -> Option<f64> {
        let session = self.session.as_mut()?;

        if session.armed == Armed::Unknown {
            let armed = !child.can_scroll_toward_top()
                && child.is_within_items(sample.position)
                && sample.position > session.initial_position;

            session.armed = if armed { Armed::Armed } else { Armed::NotArmed };
            debug!(
                "over-scroll {}armed at {} (initial {})",
                if armed { "" } else { "not " },
                sample.position,
                session.initial_position
            );
        }

        session.previous = sample;

        if session.armed != Armed::Armed {
            return None;
        }

        Some(session.offset_at(sample.position, friction_rate))
    }

    /// Ends the session.
    pub fn end(&mut self, sample: PointerSample) -> ReleaseAction {
        let Some(session) = self.session.take() else {
            return ReleaseAction::None;
        };

        if session.armed != Armed::Armed || sample.position == session.initial_position {
            return ReleaseAction::None;
        }

        if sample.position <= session.previous.position {
            return ReleaseAction::Bounce;
        }

        match release_velocity(session.previous, sample) {
            Some(velocity) if velocity > 0. => ReleaseAction::SlowDown { velocity },
            _ => {
                trace!("no elapsed time at release, bouncing");
                ReleaseAction::Bounce
            }
        }
    }

    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        self.session.is_some_and(|s| s.armed == Armed::Armed)
    }
}

impl GestureSession {
    /// Offset for a pointer at `position`.
    ///
    /// Always measured from the initial touch rather than accumulated from motion deltas, and
    /// never below rest.
    pub fn offset_at(&self, position: f64, friction_rate: f64) -> f64 {
        let pulled = (position - self.initial_position) * friction_rate;
        (self.base_offset + pulled).max(0.)
    }

    pub fn initial_position(&self) -> f64 {
        self.initial_position
    }

    pub fn armed(&self) -> Armed {
        self.armed
    }
}
