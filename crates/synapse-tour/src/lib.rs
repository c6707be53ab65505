//! # synapse-tour
//!
//! Guided help tours for Synapse pages.
//!
//! A tour is a [`HelpConfig`]: an ordered list of [`HelpStep`]s, each
//! anchored to an element of the page (or centered when it has none).
//!
//! - [`TourWalker`] - Step index state machine
//! - [`geometry`] - Pure anchor computation from an element rectangle
//! - [`ElementHost`] - What the overlay needs from the page it runs on
//! - [`TourOverlay`] - Walker + host: highlighting and positioning
//! - [`TourRegistry`] - Tours loaded from YAML, keyed by page id
//!
//! ## Example
//!
//! ```
//! use synapse_tour::{Rect, StaticPage, TourOverlay, TourRegistry, Viewport};
//!
//! let registry = TourRegistry::from_yaml(r##"
//! - page_id: dashboard
//!   title: Dashboard tour
//!   steps:
//!     - id: courses
//!       title: Your courses
//!       content: Everything you are studying lives here.
//!       target: "#courses"
//!       position: bottom
//! "##).unwrap();
//!
//! let page = StaticPage::new(Viewport::new(1280.0, 800.0))
//!     .with_element("#courses", Rect::new(100.0, 200.0, 300.0, 40.0));
//! let mut overlay = TourOverlay::new(page);
//! overlay.start(registry.get("dashboard").unwrap().clone());
//!
//! let point = overlay.position().unwrap();
//! assert_eq!((point.x, point.y), (250.0, 252.0));
//! ```

pub mod error;
pub mod geometry;
pub mod host;
pub mod overlay;
pub mod registry;
pub mod types;
pub mod walker;

// Re-export main types
pub use error::{Result, TourError};
pub use geometry::{GAP, Point, Rect, ScrollOffset, Viewport, anchor, viewport_center};
pub use host::{ElementHost, StaticPage};
pub use overlay::TourOverlay;
pub use registry::TourRegistry;
pub use types::{HelpConfig, HelpStep, Offset, Position};
pub use walker::{StepChange, TourWalker};
