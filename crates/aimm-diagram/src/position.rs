//! Placement of newly added nodes.

use crate::types::Point;

pub const START: Point = Point::new(50.0, 50.0);
pub const STEP: f64 = 10.0;

/// Hands out cascading positions: each call is the previous one shifted by
/// `(STEP, STEP)`, starting from `START`. There is no wrap-around; repeated
/// additions walk off the visible canvas.
#[derive(Debug, Clone)]
pub struct PositionAllocator {
    last: Point,
}

impl PositionAllocator {
    pub fn new() -> Self {
        Self { last: START }
    }

    pub fn next(&mut self) -> Point {
        self.last = Point::new(self.last.x + STEP, self.last.y + STEP);
        self.last
    }

    /// Position most recently handed out (or `START` before the first call).
    pub fn last(&self) -> Point {
        self.last
    }
}

impl Default for PositionAllocator {
    fn default() -> Self {
        Self::new()
    }
}
