//! Tooltip anchoring.
//!
//! Element rectangles are viewport-relative, as a page reports them. Anchors
//! are in document coordinates: the scroll offset is added back so the
//! tooltip stays attached when the page scrolls.

use crate::types::{Offset, Position};

/// Distance between the target's edge and the tooltip anchor, in pixels.
pub const GAP: f64 = 12.0;

/// Viewport-relative bounding box of an element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// Same box moved by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.left + dx, self.top + dy, self.width, self.height)
    }
}

/// Document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn shifted(self, offset: Option<Offset>) -> Self {
        match offset {
            Some(o) => Self::new(self.x + o.x, self.y + o.y),
            None => self,
        }
    }
}

/// Current scroll position of the page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

impl ScrollOffset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Visible area size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Anchor point for a tooltip placed at `position` around `rect`.
pub fn anchor(rect: Rect, scroll: ScrollOffset, position: Position, offset: Option<Offset>) -> Point {
    let cx = rect.center_x() + scroll.x;
    let cy = rect.center_y() + scroll.y;

    let base = match position {
        Position::Top => Point::new(cx, rect.top + scroll.y - GAP),
        Position::Bottom => Point::new(cx, rect.bottom() + scroll.y + GAP),
        Position::Left => Point::new(rect.left + scroll.x - GAP, cy),
        Position::Right => Point::new(rect.right() + scroll.x + GAP, cy),
        Position::Center => Point::new(cx, cy),
    };
    base.shifted(offset)
}

/// Middle of the visible area, in document coordinates.
pub fn viewport_center(viewport: Viewport, scroll: ScrollOffset) -> Point {
    Point::new(
        scroll.x + viewport.width / 2.0,
        scroll.y + viewport.height / 2.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECT: Rect = Rect {
        left: 100.0,
        top: 50.0,
        width: 200.0,
        height: 40.0,
    };

    fn at(position: Position) -> Point {
        anchor(RECT, ScrollOffset::new(10.0, 300.0), position, None)
    }

    #[test]
    fn test_anchor_positions() {
        assert_eq!(at(Position::Top), Point::new(210.0, 338.0));
        assert_eq!(at(Position::Bottom), Point::new(210.0, 402.0));
        assert_eq!(at(Position::Left), Point::new(98.0, 370.0));
        assert_eq!(at(Position::Right), Point::new(322.0, 370.0));
        assert_eq!(at(Position::Center), Point::new(210.0, 370.0));
    }

    #[test]
    fn test_offset_applied_last() {
        let point = anchor(
            RECT,
            ScrollOffset::default(),
            Position::Right,
            Some(Offset::new(-5.0, 8.0)),
        );
        assert_eq!(point, Point::new(307.0, 78.0));
    }

    #[test]
    fn test_viewport_center_includes_scroll() {
        let point = viewport_center(Viewport::new(1024.0, 768.0), ScrollOffset::new(0.0, 500.0));
        assert_eq!(point, Point::new(512.0, 884.0));
    }

    #[test]
    fn test_rect_edges() {
        assert_eq!(RECT.right(), 300.0);
        assert_eq!(RECT.bottom(), 90.0);
        assert_eq!(RECT.translate(-100.0, 10.0).left, 0.0);
    }
}
