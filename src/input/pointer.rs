use serde::{Deserialize, Serialize};

/// Vertical pointer position at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub position: f64,
    /// Monotonic timestamp in milliseconds.
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    #[serde(flatten)]
    pub sample: PointerSample,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, position: f64, timestamp: u64) -> Self {
        Self {
            kind,
            sample: PointerSample {
                position,
                timestamp,
            },
        }
    }

    pub fn down(position: f64, timestamp: u64) -> Self {
        Self::new(PointerEventKind::Down, position, timestamp)
    }

    pub fn motion(position: f64, timestamp: u64) -> Self {
        Self::new(PointerEventKind::Move, position, timestamp)
    }

    pub fn up(position: f64, timestamp: u64) -> Self {
        Self::new(PointerEventKind::Up, position, timestamp)
    }

    pub fn cancel(position: f64, timestamp: u64) -> Self {
        Self::new(PointerEventKind::Cancel, position, timestamp)
    }

    pub fn position(&self) -> f64 {
        self.sample.position
    }

    pub fn timestamp(&self) -> u64 {
        self.sample.timestamp
    }
}

impl PointerEventKind {
    /// Up and cancel both end the gesture.
    pub fn is_release(self) -> bool {
        matches!(self, PointerEventKind::Up | PointerEventKind::Cancel)
    }
}
