#[macro_use]
extern crate tracing;

pub mod animation;
pub mod child;
pub mod controller;
pub mod input;
pub mod kinematics;

pub use child::ScrollChild;
pub use controller::{OffsetUpdate, Options, OverscrollController, UpdateSource};
pub use input::pointer::{PointerEvent, PointerEventKind, PointerSample};
