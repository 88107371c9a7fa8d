pub mod overscroll_gesture;
pub mod pointer;
