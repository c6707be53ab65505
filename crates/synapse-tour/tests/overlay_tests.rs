//! Integration tests for the tour overlay on a static page.

use synapse_tour::{
    ElementHost, GAP, HelpConfig, HelpStep, Point, Position, Rect, ScrollOffset, StaticPage,
    TourOverlay, TourRegistry, Viewport,
};

fn page() -> StaticPage {
    StaticPage::new(Viewport::new(1200.0, 700.0))
        .with_element("#nav", Rect::new(0.0, 0.0, 240.0, 700.0))
        .with_element("#courses", Rect::new(300.0, 120.0, 400.0, 200.0))
        .with_element("#footer", Rect::new(0.0, 2400.0, 1200.0, 100.0))
}

fn tour() -> HelpConfig {
    HelpConfig::new(
        "dashboard",
        "Dashboard",
        vec![
            HelpStep::new("welcome", "Welcome", "A quick look around."),
            HelpStep::new("nav", "Navigation", "Jump between sections.")
                .anchored("#nav", Position::Right),
            HelpStep::new("courses", "Courses", "Your courses.")
                .anchored("#courses", Position::Top)
                .with_offset(0.0, -8.0),
            HelpStep::new("footer", "Help", "Find help here.").anchored("#footer", Position::Top),
        ],
    )
}

#[test]
fn test_full_walk() {
    let mut overlay = TourOverlay::new(page());
    assert!(overlay.start(tour()));

    // Untargeted step centers in the viewport
    assert_eq!(overlay.position(), Some(Point::new(600.0, 350.0)));
    assert_eq!(overlay.host().highlighted().count(), 0);

    overlay.next();
    assert_eq!(overlay.position(), Some(Point::new(240.0 + GAP, 350.0)));

    overlay.next();
    assert_eq!(overlay.position(), Some(Point::new(500.0, 120.0 - GAP - 8.0)));
    assert_eq!(overlay.host().highlighted().collect::<Vec<_>>(), vec!["#courses"]);

    // Far-away target is scrolled into view and anchored in document space
    overlay.next();
    let scroll = overlay.host().scroll_offset();
    assert!(scroll.y > 0.0);
    assert_eq!(overlay.position(), Some(Point::new(600.0, 2400.0 - GAP)));

    // Past the end: index unchanged
    assert!(!overlay.next());
    assert_eq!(overlay.walker().current_index(), Some(3));

    assert!(overlay.advance());
    assert!(!overlay.walker().is_active());
    assert_eq!(overlay.host().highlighted().count(), 0);
}

#[test]
fn test_missing_target_keeps_last_position() {
    let config = HelpConfig::new(
        "dashboard",
        "Dashboard",
        vec![
            HelpStep::new("nav", "Nav", "").anchored("#nav", Position::Bottom),
            HelpStep::new("ghost", "Ghost", "").anchored("#not-rendered", Position::Top),
        ],
    );
    let mut overlay = TourOverlay::new(page());
    overlay.start(config);
    let before = overlay.position();
    assert!(before.is_some());

    assert!(overlay.next());
    assert_eq!(overlay.walker().current_index(), Some(1));
    assert_eq!(overlay.position(), before);
    assert_eq!(overlay.host().highlighted().count(), 0);
}

#[test]
fn test_resize_recomputes_centered_step() {
    let mut overlay = TourOverlay::new(page().with_scroll(ScrollOffset::new(0.0, 100.0)));
    overlay.start(tour());
    assert_eq!(overlay.position(), Some(Point::new(600.0, 450.0)));

    overlay.host_mut().resize(Viewport::new(800.0, 600.0));
    overlay.on_resize();
    assert_eq!(overlay.position(), Some(Point::new(400.0, 400.0)));
}

#[test]
fn test_go_to_step_out_of_range() {
    let mut overlay = TourOverlay::new(page());
    overlay.start(tour());
    assert!(!overlay.go_to_step(10));
    assert_eq!(overlay.walker().current_index(), Some(0));

    assert!(overlay.go_to_step(2));
    assert!(overlay.host().is_highlighted("#courses"));
    assert!(overlay.previous());
    assert!(!overlay.host().is_highlighted("#courses"));
    assert!(overlay.host().is_highlighted("#nav"));
}

#[test]
fn test_registry_tour_drives_overlay() {
    let registry = TourRegistry::from_yaml(
        r##"
- page_id: dashboard
  title: Dashboard
  steps:
    - id: courses
      title: Courses
      content: Your courses.
      target: "#courses"
      position: left
"##,
    )
    .unwrap();

    let mut overlay = TourOverlay::new(page());
    overlay.start(registry.get("dashboard").unwrap().clone());
    assert_eq!(overlay.position(), Some(Point::new(300.0 - GAP, 220.0)));
}
