//! Page access for the overlay.
//!
//! [`ElementHost`] is everything the overlay needs from the page it runs on.
//! Front-ends implement it over their own element tree; [`StaticPage`] is a
//! fixed layout used for previews and tests.

use std::collections::{BTreeSet, HashMap};

use crate::geometry::{Rect, ScrollOffset, Viewport};

/// Element lookup, scrolling and highlighting on a page.
pub trait ElementHost {
    /// Viewport-relative bounding box of the element matching `selector`.
    fn find(&self, selector: &str) -> Option<Rect>;

    fn scroll_offset(&self) -> ScrollOffset;

    fn viewport(&self) -> Viewport;

    /// Scroll so the element matching `selector` is visible.
    fn scroll_into_view(&mut self, selector: &str);

    /// Toggle the tour highlight on the element matching `selector`.
    fn set_highlight(&mut self, selector: &str, on: bool);
}

/// Page with a fixed layout.
///
/// Element boxes are given in document coordinates; [`ElementHost::find`]
/// reports them relative to the current scroll position.
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    viewport: Viewport,
    scroll: ScrollOffset,
    elements: HashMap<String, Rect>,
    highlighted: BTreeSet<String>,
    scroll_requests: Vec<String>,
}

impl StaticPage {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn with_element(mut self, selector: impl Into<String>, document_rect: Rect) -> Self {
        self.elements.insert(selector.into(), document_rect);
        self
    }

    pub fn with_scroll(mut self, scroll: ScrollOffset) -> Self {
        self.scroll = scroll;
        self
    }

    /// Change the viewport size, e.g. on a window resize.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Currently highlighted selectors.
    pub fn highlighted(&self) -> impl Iterator<Item = &str> {
        self.highlighted.iter().map(String::as_str)
    }

    pub fn is_highlighted(&self, selector: &str) -> bool {
        self.highlighted.contains(selector)
    }

    /// Selectors passed to `scroll_into_view`, oldest first.
    pub fn scroll_requests(&self) -> &[String] {
        &self.scroll_requests
    }
}

impl ElementHost for StaticPage {
    fn find(&self, selector: &str) -> Option<Rect> {
        self.elements
            .get(selector)
            .map(|r| r.translate(-self.scroll.x, -self.scroll.y))
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.scroll
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn scroll_into_view(&mut self, selector: &str) {
        self.scroll_requests.push(selector.to_string());
        let Some(rect) = self.elements.get(selector) else {
            return;
        };

        let visible_top = self.scroll.y;
        let visible_bottom = self.scroll.y + self.viewport.height;
        if rect.top >= visible_top && rect.bottom() <= visible_bottom {
            return;
        }
        // Center vertically, never above the top of the document
        self.scroll.y = (rect.center_y() - self.viewport.height / 2.0).max(0.0);
    }

    fn set_highlight(&mut self, selector: &str, on: bool) {
        if on {
            self.highlighted.insert(selector.to_string());
        } else {
            self.highlighted.remove(selector);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_scroll_relative() {
        let page = StaticPage::new(Viewport::new(800.0, 600.0))
            .with_element("#a", Rect::new(10.0, 1000.0, 50.0, 20.0))
            .with_scroll(ScrollOffset::new(0.0, 900.0));
        assert_eq!(page.find("#a"), Some(Rect::new(10.0, 100.0, 50.0, 20.0)));
        assert_eq!(page.find("#missing"), None);
    }

    #[test]
    fn test_scroll_into_view_only_when_hidden() {
        let mut page = StaticPage::new(Viewport::new(800.0, 600.0))
            .with_element("#near", Rect::new(0.0, 100.0, 50.0, 20.0))
            .with_element("#far", Rect::new(0.0, 2000.0, 50.0, 20.0));

        page.scroll_into_view("#near");
        assert_eq!(page.scroll_offset().y, 0.0);

        page.scroll_into_view("#far");
        assert_eq!(page.scroll_offset().y, 1710.0);
        assert_eq!(page.scroll_requests(), ["#near", "#far"]);
    }
}
