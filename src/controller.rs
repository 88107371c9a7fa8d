use std::fmt;

use anyhow::{ensure, Context as _};
use serde::Serialize;

use crate::animation::PlanPlayer;
use crate::child::ScrollChild;
use crate::input::overscroll_gesture::{OverscrollGesture, ReleaseAction};
use crate::input::pointer::{PointerEvent, PointerEventKind};
use crate::kinematics::{bounce_plan, slow_down_then_bounce_plan, AnimationPlan};

/// Tuning constants, fixed for the lifetime of a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options {
    /// Fraction of the drag distance that turns into offset.
    pub friction_rate: f64,
    /// Acceleration of the return to rest, in units/ms².
    pub bounce_acceleration: f64,
    /// Deceleration absorbing a downward release velocity, in units/ms².
    pub slow_down_deceleration: f64,
}

/// Notification sent to the listener whenever the offset changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OffsetUpdate {
    pub offset: f64,
    pub source: UpdateSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateSource {
    /// The pointer moved during an over-scroll drag.
    Drag,
    /// An animation frame.
    Frame,
    /// The release animation played to the end.
    Finished,
}

type Listener = Box<dyn FnMut(OffsetUpdate)>;

/// Over-scroll handling for one scrollable child.
///
/// The host feeds every pointer event through [`dispatch`](Self::dispatch), applies
/// [`offset`](Self::offset) as the child's vertical translation, and calls
/// [`advance_animations`](Self::advance_animations) on every frame while
/// [`are_animations_ongoing`](Self::are_animations_ongoing).
pub struct OverscrollController<C: ScrollChild> {
    child: C,
    options: Options,
    gesture: OverscrollGesture,
    offset: f64,
    /// Release animation in flight.
    player: Option<PlanPlayer>,
    listener: Option<Listener>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            friction_rate: overscroll_config::DEFAULT_FRICTION_RATE,
            bounce_acceleration: overscroll_config::DEFAULT_BOUNCE_ACCELERATION,
            slow_down_deceleration: overscroll_config::DEFAULT_SLOW_DOWN_DECELERATION,
        }
    }
}

impl Options {
    pub fn from_config(config: &overscroll_config::Overscroll) -> Self {
        Self {
            friction_rate: config.friction_rate.0,
            bounce_acceleration: config.bounce_acceleration.0,
            slow_down_deceleration: config.slow_down_deceleration.0,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let Self {
            friction_rate,
            bounce_acceleration,
            slow_down_deceleration,
        } = *self;

        ensure!(
            friction_rate > 0. && friction_rate <= 1.,
            "friction rate must be in (0, 1], got {friction_rate}"
        );
        ensure!(
            bounce_acceleration.is_finite() && bounce_acceleration > 0.,
            "bounce acceleration must be positive, got {bounce_acceleration}"
        );
        ensure!(
            slow_down_deceleration.is_finite() && slow_down_deceleration > 0.,
            "slow-down deceleration must be positive, got {slow_down_deceleration}"
        );

        Ok(())
    }
}

impl<C: ScrollChild> OverscrollController<C> {
    pub fn new(child: C, options: Options) -> anyhow::Result<Self> {
        options
            .validate()
            .context("invalid over-scroll options")?;

        Ok(Self {
            child,
            options,
            gesture: OverscrollGesture::new(),
            offset: 0.,
            player: None,
            listener: None,
        })
    }

    pub fn set_listener(&mut self, listener: impl FnMut(OffsetUpdate) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Handles a pointer event.
    ///
    /// Returns `true` if the event was consumed and must not reach the child.
    pub fn dispatch(&mut self, event: &PointerEvent) -> bool {
        trace!("{event:?}");

        if self.player.is_some() {
            if event.kind != PointerEventKind::Down {
                return true;
            }

            // The surface is grabbed mid-flight. The offset stays where the last frame put it.
            debug!("release animation interrupted at offset {}", self.offset);
            self.player = None;
        }

        match event.kind {
            PointerEventKind::Down => {
                self.gesture.begin(event.sample, self.offset);
                false
            }
            PointerEventKind::Move => {
                let friction_rate = self.options.friction_rate;
                match self.gesture.update(event.sample, &self.child, friction_rate) {
                    Some(offset) => {
                        self.set_offset(offset, UpdateSource::Drag);
                        true
                    }
                    None => false,
                }
            }
            PointerEventKind::Up | PointerEventKind::Cancel => {
                let action = self.gesture.end(event.sample);
                if let Some(plan) = self.release_plan(action) {
                    debug!("released at offset {}, playing {plan:?}", self.offset);
                    self.player = Some(PlanPlayer::start(&plan, self.offset, event.timestamp()));
                }
                false
            }
        }
    }

    /// Whether the host should stop forwarding events to the child.
    pub fn intercepts_child_events(&self) -> bool {
        self.gesture.is_armed() || self.are_animations_ongoing()
    }

    /// Advances the release animation to `now` milliseconds.
    pub fn advance_animations(&mut self, now: u64) {
        let Some(player) = &mut self.player else {
            return;
        };

        let playback = player.advance(now);
        self.set_offset(playback.value, UpdateSource::Frame);

        if playback.done {
            trace!("release animation finished");
            self.player = None;
            self.notify(UpdateSource::Finished);
        }
    }

    pub fn are_animations_ongoing(&self) -> bool {
        self.player.is_some()
    }

    /// Current vertical translation of the child.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn child_mut(&mut self) -> &mut C {
        &mut self.child
    }

    pub fn gesture(&self) -> &OverscrollGesture {
        &self.gesture
    }

    fn release_plan(&self, action: ReleaseAction) -> Option<AnimationPlan> {
        let Options {
            bounce_acceleration,
            slow_down_deceleration,
            ..
        } = self.options;

        match action {
            ReleaseAction::Bounce => Some(bounce_plan(self.offset, bounce_acceleration)),
            ReleaseAction::SlowDown { velocity } => Some(slow_down_then_bounce_plan(
                self.offset,
                velocity,
                slow_down_deceleration,
                bounce_acceleration,
            )),
            // A grab of a bouncing surface that did not turn into a drag still has to settle.
            ReleaseAction::None if self.offset > 0. => {
                Some(bounce_plan(self.offset, bounce_acceleration))
            }
            ReleaseAction::None => None,
        }
    }

    fn set_offset(&mut self, offset: f64, source: UpdateSource) {
        if self.offset == offset {
            return;
        }

        self.offset = offset;
        self.notify(source);
    }

    fn notify(&mut self, source: UpdateSource) {
        let update = OffsetUpdate {
            offset: self.offset,
            source,
        };

        if let Some(listener) = &mut self.listener {
            listener(update);
        }
    }
}

impl<C: ScrollChild + fmt::Debug> fmt::Debug for OverscrollController<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverscrollController")
            .field("child", &self.child)
            .field("options", &self.options)
            .field("gesture", &self.gesture)
            .field("offset", &self.offset)
            .field("player", &self.player)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fmt::Write as _;
    use std::rc::Rc;

    use approx::assert_abs_diff_eq;
    use insta::assert_snapshot;

    use super::*;
    use crate::input::overscroll_gesture::Armed;

    #[derive(Debug)]
    struct Child {
        can_scroll_toward_top: bool,
        first_item_top: Option<f64>,
    }

    impl ScrollChild for Child {
        fn can_scroll_toward_top(&self) -> bool {
            self.can_scroll_toward_top
        }

        fn first_item_top(&self) -> Option<f64> {
            self.first_item_top
        }
    }

    type Updates = Rc<RefCell<Vec<OffsetUpdate>>>;

    fn set_up() -> (OverscrollController<Child>, Updates) {
        let child = Child {
            can_scroll_toward_top: false,
            first_item_top: Some(0.),
        };
        let mut controller = OverscrollController::new(child, Options::default()).unwrap();

        let updates = Updates::default();
        let sink = updates.clone();
        controller.set_listener(move |update| sink.borrow_mut().push(update));

        (controller, updates)
    }

    fn format_updates(updates: &Updates) -> String {
        let mut buf = String::new();
        for update in updates.borrow().iter() {
            writeln!(&mut buf, "{:?} {:.3}", update.source, update.offset).unwrap();
        }
        buf
    }

    #[test]
    fn drag_then_bounce() {
        let (mut c, updates) = set_up();

        assert!(!c.dispatch(&PointerEvent::down(100., 0)));
        assert!(c.dispatch(&PointerEvent::motion(120., 16)));
        assert!(c.dispatch(&PointerEvent::motion(140., 32)));
        assert_eq!(c.offset(), 10.);
        assert!(c.intercepts_child_events());

        // Moving up at release: bounce from 10 over 14 ms.
        assert!(!c.dispatch(&PointerEvent::up(130., 48)));
        assert!(c.are_animations_ongoing());

        for now in [52, 56, 60, 64] {
            c.advance_animations(now);
        }
        assert!(!c.are_animations_ongoing());
        assert!(!c.intercepts_child_events());
        assert_eq!(c.offset(), 0.);

        assert_snapshot!(format_updates(&updates), @r"
        Drag 5.000
        Drag 10.000
        Frame 5.102
        Frame 1.837
        Frame 0.204
        Frame 0.000
        Finished 0.000
        ");
    }

    #[test]
    fn release_while_descending_slows_down_first() {
        let (mut c, updates) = set_up();

        c.dispatch(&PointerEvent::down(100., 0));
        c.dispatch(&PointerEvent::motion(120., 10));
        assert_eq!(c.offset(), 5.);

        // 2 units/ms at release: 7 ms slow-down to 11.67, then 15 ms back to rest.
        c.dispatch(&PointerEvent::up(140., 20));
        assert!(c.are_animations_ongoing());

        c.advance_animations(27);
        assert_abs_diff_eq!(c.offset(), 5. + 4. / 0.6, epsilon = 1e-9);

        c.advance_animations(35);
        assert!(c.are_animations_ongoing());
        assert!(c.offset() > 0. && c.offset() < 11.67);

        c.advance_animations(42);
        assert!(!c.are_animations_ongoing());
        assert_eq!(c.offset(), 0.);

        let updates = updates.borrow();
        let last = updates.last().unwrap();
        assert_eq!(last.source, UpdateSource::Finished);
        assert_eq!(
            updates
                .iter()
                .filter(|u| u.source == UpdateSource::Finished)
                .count(),
            1
        );
    }

    #[test]
    fn pass_through_when_child_can_scroll() {
        let (mut c, updates) = set_up();
        c.child_mut().can_scroll_toward_top = true;

        assert!(!c.dispatch(&PointerEvent::down(100., 0)));
        assert!(!c.dispatch(&PointerEvent::motion(140., 16)));
        assert!(!c.intercepts_child_events());

        // Scrolling to the top mid-drag does not change the decision.
        c.child_mut().can_scroll_toward_top = false;
        assert!(!c.dispatch(&PointerEvent::motion(180., 32)));
        assert!(!c.dispatch(&PointerEvent::up(180., 48)));

        assert!(!c.are_animations_ongoing());
        assert_eq!(c.offset(), 0.);
        assert!(updates.borrow().is_empty());
    }

    #[test]
    fn boxed_child_keeps_area_override() {
        struct Banded;

        impl ScrollChild for Banded {
            fn can_scroll_toward_top(&self) -> bool {
                false
            }

            fn first_item_top(&self) -> Option<f64> {
                Some(0.)
            }

            fn is_within_items(&self, position: f64) -> bool {
                position >= 50.
            }
        }

        let child: Box<dyn ScrollChild> = Box::new(Banded);
        let mut c = OverscrollController::new(child, Options::default()).unwrap();

        // Above the band: the drag goes to the child.
        c.dispatch(&PointerEvent::down(10., 0));
        assert!(!c.dispatch(&PointerEvent::motion(30., 16)));
        c.dispatch(&PointerEvent::up(30., 32));
        assert_eq!(c.offset(), 0.);

        c.dispatch(&PointerEvent::down(60., 48));
        assert!(c.dispatch(&PointerEvent::motion(80., 64)));
        assert_eq!(c.offset(), 5.);
    }

    #[test]
    fn release_without_movement_does_not_animate() {
        let (mut c, _) = set_up();

        c.dispatch(&PointerEvent::down(100., 0));
        assert!(!c.dispatch(&PointerEvent::up(100., 16)));
        assert!(!c.are_animations_ongoing());
    }

    #[test]
    fn events_during_animation_are_consumed() {
        let (mut c, updates) = set_up();

        c.dispatch(&PointerEvent::down(100., 0));
        c.dispatch(&PointerEvent::motion(140., 16));
        c.dispatch(&PointerEvent::up(130., 32));
        let published = updates.borrow().len();

        assert!(c.dispatch(&PointerEvent::motion(300., 36)));
        assert!(c.dispatch(&PointerEvent::up(300., 38)));
        assert!(c.dispatch(&PointerEvent::cancel(300., 38)));

        assert!(c.are_animations_ongoing());
        assert_eq!(c.offset(), 10.);
        assert_eq!(updates.borrow().len(), published);
    }

    #[test]
    fn down_interrupts_animation_and_rearms() {
        let (mut c, updates) = set_up();

        c.dispatch(&PointerEvent::down(100., 0));
        c.dispatch(&PointerEvent::motion(140., 16));
        c.dispatch(&PointerEvent::up(130., 32));

        // Halfway through the 14 ms bounce.
        c.advance_animations(39);
        assert_abs_diff_eq!(c.offset(), 2.5, epsilon = 1e-9);
        let published = updates.borrow().len();

        assert!(!c.dispatch(&PointerEvent::down(200., 40)));
        assert!(!c.are_animations_ongoing());
        assert_eq!(c.offset(), 2.5);
        // Cancelling does not publish.
        assert_eq!(updates.borrow().len(), published);

        // Frames for the abandoned plan are ignored.
        c.advance_animations(60);
        assert_eq!(c.offset(), 2.5);

        assert!(c.dispatch(&PointerEvent::motion(220., 56)));
        let session = c.gesture().session().unwrap();
        assert_eq!(session.armed(), Armed::Armed);
        assert_eq!(session.initial_position(), 200.);
        assert_eq!(c.offset(), 7.5);
        assert_eq!(
            *updates.borrow().last().unwrap(),
            OffsetUpdate {
                offset: 7.5,
                source: UpdateSource::Drag,
            }
        );
    }

    #[test]
    fn interrupted_surface_settles_without_drag() {
        let (mut c, _) = set_up();

        c.dispatch(&PointerEvent::down(100., 0));
        c.dispatch(&PointerEvent::motion(140., 16));
        c.dispatch(&PointerEvent::up(130., 32));
        c.advance_animations(39);

        // Grab and push up: not an over-scroll, but the offset still returns to rest.
        c.dispatch(&PointerEvent::down(200., 40));
        assert!(!c.dispatch(&PointerEvent::motion(190., 56)));
        assert!(!c.dispatch(&PointerEvent::up(190., 72)));
        assert!(c.are_animations_ongoing());

        // sqrt(2 * 2.5 / 0.1) = 7.07
        c.advance_animations(79);
        assert!(!c.are_animations_ongoing());
        assert_eq!(c.offset(), 0.);
    }

    #[test]
    fn pushing_above_anchor_clamps_to_rest() {
        let (mut c, _) = set_up();

        c.dispatch(&PointerEvent::down(100., 0));
        c.dispatch(&PointerEvent::motion(140., 16));
        assert!(c.dispatch(&PointerEvent::motion(20., 32)));
        assert_eq!(c.offset(), 0.);
    }

    #[test]
    fn duplicate_down_resets_session() {
        let (mut c, _) = set_up();

        c.dispatch(&PointerEvent::down(100., 0));
        c.dispatch(&PointerEvent::motion(90., 16));
        c.dispatch(&PointerEvent::down(100., 32));
        assert!(c.dispatch(&PointerEvent::motion(140., 48)));
        assert_eq!(c.offset(), 10.);
    }

    #[test]
    fn stray_events_without_down_are_ignored() {
        let (mut c, updates) = set_up();

        assert!(!c.dispatch(&PointerEvent::motion(140., 16)));
        assert!(!c.dispatch(&PointerEvent::up(150., 32)));
        assert!(!c.are_animations_ongoing());
        assert!(updates.borrow().is_empty());
    }

    #[test]
    fn listener_can_be_removed() {
        let (mut c, updates) = set_up();
        c.clear_listener();

        c.dispatch(&PointerEvent::down(100., 0));
        c.dispatch(&PointerEvent::motion(140., 16));
        assert_eq!(c.offset(), 10.);
        assert!(updates.borrow().is_empty());
    }

    #[test]
    fn invalid_options_fail_construction() {
        let child = Child {
            can_scroll_toward_top: false,
            first_item_top: None,
        };

        let options = Options {
            friction_rate: 0.,
            ..Options::default()
        };
        let err = OverscrollController::new(child, options).unwrap_err();
        assert!(format!("{err:#}").contains("friction rate"));

        for options in [
            Options {
                friction_rate: 1.5,
                ..Options::default()
            },
            Options {
                bounce_acceleration: 0.,
                ..Options::default()
            },
            Options {
                slow_down_deceleration: f64::NAN,
                ..Options::default()
            },
        ] {
            assert!(options.validate().is_err(), "{options:?}");
        }
    }

    #[test]
    fn options_from_config() {
        let config = overscroll_config::Config::parse(
            "test.kdl",
            "overscroll { friction-rate 0.5; bounce-acceleration 1; }",
        )
        .unwrap();

        let options = Options::from_config(&config.overscroll);
        assert_eq!(
            options,
            Options {
                friction_rate: 0.5,
                bounce_acceleration: 1.,
                slow_down_deceleration: 0.3,
            }
        );
        assert!(options.validate().is_ok());
    }
}
