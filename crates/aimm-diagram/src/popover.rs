//! Factor inspector popovers.
//!
//! Every node click opens a new panel, even for a factor that already has one
//! open. Panels are addressed by their own id, so closing one never closes
//! another bound to the same factor.

use aimm_core::Factor;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::types::{NodeId, Point};

/// Assumed popover footprint (width and height).
pub const POPOVER_SIZE: f64 = 400.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popover {
    pub id: Uuid,
    pub factor: Factor,
    pub node: Option<NodeId>,
    pub position: Point,
}

#[derive(Debug, Clone)]
pub struct PopoverController {
    viewport_width: f64,
    viewport_height: f64,
    open: Vec<Popover>,
    /// Factor whose series the chart shows: the one opened last.
    active: Option<Factor>,
}

impl PopoverController {
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            viewport_width,
            viewport_height,
            open: Vec::new(),
            active: None,
        }
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    /// Where a popover anchored at `anchor` is drawn: flipped left and/or up by
    /// its own size when it would overflow the viewport.
    pub fn place(&self, anchor: Point) -> Point {
        let mut x = anchor.x;
        let mut y = anchor.y;
        if x + POPOVER_SIZE > self.viewport_width {
            x -= POPOVER_SIZE;
        }
        if y + POPOVER_SIZE > self.viewport_height {
            y -= POPOVER_SIZE;
        }
        Point::new(x, y)
    }

    pub fn open(&mut self, factor: &Factor, node: Option<NodeId>, anchor: Point) -> &Popover {
        let popover = Popover {
            id: Uuid::new_v4(),
            factor: factor.clone(),
            node,
            position: self.place(anchor),
        };
        debug!(
            "Opened popover {} for '{}' at ({}, {})",
            popover.id, factor.name, popover.position.x, popover.position.y
        );
        self.active = Some(factor.clone());
        self.open.push(popover);
        &self.open[self.open.len() - 1]
    }

    /// Close exactly one popover. Returns false if the id is unknown.
    pub fn close(&mut self, id: Uuid) -> bool {
        let before = self.open.len();
        self.open.retain(|p| p.id != id);
        before != self.open.len()
    }

    pub fn close_all(&mut self) {
        self.open.clear();
    }

    pub fn get(&self, id: Uuid) -> Option<&Popover> {
        self.open.iter().find(|p| p.id == id)
    }

    pub fn open_popovers(&self) -> &[Popover] {
        &self.open
    }

    pub fn active_factor(&self) -> Option<&Factor> {
        self.active.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_shifts_left_and_up() {
        let mut ctl = PopoverController::new(1000.0, 800.0);
        let p = ctl.open(&Factor::new("A"), None, Point::new(900.0, 750.0));
        assert_eq!(p.position, Point::new(500.0, 350.0));
        assert!(p.position.x >= 0.0 && p.position.x + POPOVER_SIZE <= 1000.0);
        assert!(p.position.y >= 0.0 && p.position.y + POPOVER_SIZE <= 800.0);
    }

    #[test]
    fn test_fitting_popover_stays_at_anchor() {
        let ctl = PopoverController::new(1000.0, 800.0);
        assert_eq!(ctl.place(Point::new(100.0, 50.0)), Point::new(100.0, 50.0));
        assert_eq!(ctl.place(Point::new(600.0, 400.0)), Point::new(600.0, 400.0));
        assert_eq!(ctl.place(Point::new(601.0, 100.0)), Point::new(201.0, 100.0));
    }

    #[test]
    fn test_same_factor_opens_independent_popovers() {
        let mut ctl = PopoverController::new(1000.0, 800.0);
        let f = Factor::new("Rainfall");
        let first = ctl.open(&f, None, Point::default()).id;
        let second = ctl.open(&f, None, Point::default()).id;
        assert_ne!(first, second);
        assert_eq!(ctl.open_popovers().len(), 2);

        assert!(ctl.close(first));
        assert!(!ctl.close(first));
        assert_eq!(ctl.open_popovers().len(), 1);
        assert!(ctl.get(second).is_some());
        assert_eq!(ctl.active_factor().map(|f| f.name.as_str()), Some("Rainfall"));
    }
}
