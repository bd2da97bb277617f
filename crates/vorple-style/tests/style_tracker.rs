//! Style tracker behaviour across windows.

use proptest::prelude::*;
use tracing_test::traced_test;
use vorple_style::{ClassList, ColorSlot, FontAttr, StyleConfig, StyleTracker};

fn engine_styles() -> StyleTracker {
    StyleTracker::new(StyleConfig {
        engine_colors: true,
        engine_font_family: true,
    })
}

proptest! {
    /// Whatever state an element starts in, applying leaves exactly one
    /// text colour and one background colour on it.
    #[test]
    fn apply_leaves_one_color_of_each_kind(
        stale in proptest::collection::vec(0u32..20, 0..6),
        text in 0u32..16,
        window in 0usize..4,
    ) {
        let mut tracker = engine_styles();
        tracker.set_color(ColorSlot::Text, text, window, |_| {});

        let mut element = ClassList::parse("window");
        for n in &stale {
            element.add(&format!("textcolor-{n}"));
            element.add(&format!("bgcolor-{n}"));
        }
        tracker.apply(&mut element, None, window);

        let texts: Vec<_> = element.iter().filter(|c| c.starts_with("textcolor-")).collect();
        let backgrounds: Vec<_> = element.iter().filter(|c| c.starts_with("bgcolor-")).collect();
        let expected_text = format!("textcolor-{text}");
        prop_assert_eq!(texts, vec![expected_text.as_str()]);
        prop_assert_eq!(backgrounds.len(), 1);
        prop_assert!(element.contains("window"));
    }

    /// Applying twice is the same as applying once.
    #[test]
    fn apply_is_idempotent(bold in any::<bool>(), italic in any::<bool>(), window in 0usize..3) {
        let mut tracker = engine_styles();
        tracker.set_attr(FontAttr::Bold, bold, window, |_| {});
        tracker.set_attr(FontAttr::Italic, italic, window, |_| {});

        let mut once = ClassList::parse("a");
        tracker.apply(&mut once, None, window);
        let mut twice = once.clone();
        tracker.apply(&mut twice, None, window);
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn status_line_has_its_own_colours() {
    let mut tracker = engine_styles();
    tracker.set_color(ColorSlot::Text, 2, 0, |_| {});

    let mut status = ClassList::new();
    tracker.apply(&mut status, None, 1);
    assert!(status.contains("textcolor-15"));
    assert!(status.contains("bgcolor-1"));
}

#[test]
#[traced_test]
fn colour_changes_are_traced() {
    let mut tracker = StyleTracker::default();
    tracker.set_color(ColorSlot::Background, 3, 0, |_| {});
    assert!(logs_contain("colour changed"));
}

#[cfg(feature = "serde")]
#[test]
fn snapshots_serialize() {
    let mut tracker = StyleTracker::default();
    tracker.set_attr(FontAttr::Bold, true, 0, |_| {});
    let snapshot = tracker.snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let back: vorple_style::StyleSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
}
