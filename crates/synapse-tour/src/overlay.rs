//! Tour overlay driver.
//!
//! [`TourOverlay`] keeps the page in sync with a [`TourWalker`]: on every
//! step change the previous target loses its highlight, the new target is
//! scrolled into view and highlighted, and the tooltip anchor is recomputed.

use tracing::debug;

use crate::geometry::{Point, anchor, viewport_center};
use crate::host::ElementHost;
use crate::types::HelpConfig;
use crate::walker::{StepChange, TourWalker};

/// Walker bound to a page.
#[derive(Debug)]
pub struct TourOverlay<H> {
    host: H,
    walker: TourWalker,
    highlighted: Option<String>,
    position: Option<Point>,
}

impl<H: ElementHost> TourOverlay<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            walker: TourWalker::new(),
            highlighted: None,
            position: None,
        }
    }

    /// Start `config`. Returns false when it has no steps.
    pub fn start(&mut self, config: HelpConfig) -> bool {
        let change = self.walker.start(config);
        self.apply(change)
    }

    pub fn next(&mut self) -> bool {
        let change = self.walker.next();
        self.apply(change)
    }

    pub fn previous(&mut self) -> bool {
        let change = self.walker.previous();
        self.apply(change)
    }

    pub fn go_to_step(&mut self, index: usize) -> bool {
        let change = self.walker.go_to_step(index);
        self.apply(change)
    }

    /// The tooltip's next/finish button: moves forward, or ends the tour
    /// when already on the last step.
    pub fn advance(&mut self) -> bool {
        if self.walker.is_last_step() {
            self.stop()
        } else {
            self.next()
        }
    }

    pub fn stop(&mut self) -> bool {
        let change = self.walker.stop();
        self.apply(change)
    }

    /// Recompute the anchor after the window changed size.
    pub fn on_resize(&mut self) {
        if self.walker.is_active() {
            self.reposition();
        }
    }

    /// Tooltip anchor in document coordinates, if known.
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    pub fn walker(&self) -> &TourWalker {
        &self.walker
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn apply(&mut self, change: Option<StepChange>) -> bool {
        let Some(change) = change else {
            return false;
        };

        if let Some(previous) = self.highlighted.take() {
            self.host.set_highlight(&previous, false);
        }

        if change.is_stop() {
            self.position = None;
            return true;
        }

        let target = self.walker.current_step().and_then(|s| s.target.clone());
        if let Some(selector) = target
            && self.host.find(&selector).is_some()
        {
            self.host.scroll_into_view(&selector);
            self.host.set_highlight(&selector, true);
            self.highlighted = Some(selector);
        }
        self.reposition();
        true
    }

    fn reposition(&mut self) {
        let Some(step) = self.walker.current_step() else {
            return;
        };

        let Some(selector) = step.target.as_deref() else {
            self.position = Some(viewport_center(
                self.host.viewport(),
                self.host.scroll_offset(),
            ));
            return;
        };

        match self.host.find(selector) {
            Some(rect) => {
                self.position = Some(anchor(
                    rect,
                    self.host.scroll_offset(),
                    step.position,
                    step.offset,
                ));
            }
            None => debug!(selector, step = %step.id, "tour target not found, keeping position"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Viewport};
    use crate::host::StaticPage;
    use crate::types::{HelpStep, Position};

    fn overlay() -> TourOverlay<StaticPage> {
        TourOverlay::new(
            StaticPage::new(Viewport::new(1000.0, 600.0))
                .with_element("#a", Rect::new(100.0, 100.0, 100.0, 20.0))
                .with_element("#b", Rect::new(400.0, 300.0, 50.0, 50.0)),
        )
    }

    fn config() -> HelpConfig {
        HelpConfig::new(
            "home",
            "Home",
            vec![
                HelpStep::new("a", "A", "").anchored("#a", Position::Bottom),
                HelpStep::new("b", "B", "").anchored("#b", Position::Right),
            ],
        )
    }

    #[test]
    fn test_highlight_moves_with_step() {
        let mut overlay = overlay();
        assert!(overlay.start(config()));
        assert!(overlay.host().is_highlighted("#a"));

        assert!(overlay.next());
        assert!(!overlay.host().is_highlighted("#a"));
        assert!(overlay.host().is_highlighted("#b"));
        assert_eq!(overlay.position(), Some(Point::new(462.0, 325.0)));
    }

    #[test]
    fn test_advance_on_last_step_stops() {
        let mut overlay = overlay();
        overlay.start(config());
        assert!(overlay.advance());
        assert!(overlay.advance());

        assert!(!overlay.walker().is_active());
        assert_eq!(overlay.position(), None);
        assert_eq!(overlay.host().highlighted().count(), 0);
    }

    #[test]
    fn test_next_at_end_changes_nothing() {
        let mut overlay = overlay();
        overlay.start(config());
        overlay.next();
        let before = overlay.position();

        assert!(!overlay.next());
        assert_eq!(overlay.position(), before);
        assert!(overlay.host().is_highlighted("#b"));
    }
}
