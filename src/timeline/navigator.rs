//! Step navigation over the flat sequence.
//!
//! Wheel and arrow input turn into a signed step; the step resolves through
//! the current identity's *position* in the flat sequence, so a filtered
//! timeline steps through exactly its surviving neighbors. Positions and
//! chronological ranks can disagree once a filter drops items, and the
//! position is the one that cannot skip or stick. Out-of-range steps are
//! no-ops.

use gdk4::ModifierType;

use crate::timeline::index::TimelineIndex;

/// Identity `delta` steps away from `current` in the flat sequence, or
/// `None` when there is no current item or the target slot does not exist.
pub fn step<'a>(
    index: &'a TimelineIndex,
    current: Option<&str>,
    delta: i64,
) -> Option<&'a str> {
    let position = index.flat_position(current?)?;
    let target = position as i64 + delta;
    if target == position as i64 || target < 0 {
        return None;
    }
    index.identity_at(target as usize)
}

/// Maps raw wheel motion to a navigation step. Motion with any modifier
/// chord held is left to native scrolling; otherwise the vertical sign is
/// the step.
pub fn wheel_step(delta_y: f64, state: ModifierType) -> Option<i64> {
    let chord = ModifierType::SHIFT_MASK
        | ModifierType::CONTROL_MASK
        | ModifierType::ALT_MASK
        | ModifierType::META_MASK
        | ModifierType::SUPER_MASK;
    if state.intersects(chord) {
        return None;
    }
    if delta_y > 0.0 {
        Some(1)
    } else if delta_y < 0.0 {
        Some(-1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaItem, MediaKind};
    use crate::timeline::clusterer::cluster_items;
    use crate::timeline::filter::TagFilter;
    use std::collections::BTreeSet;

    fn make_item(index: usize, timestamp_ms: i64, tags: &[&str]) -> MediaItem {
        MediaItem {
            index,
            timestamp_ms,
            identity: format!("{index}.jpg"),
            kind: MediaKind::Image,
            width: 1600,
            height: 1200,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn sample_index() -> TimelineIndex {
        let items: Vec<MediaItem> = [0, 1000, 4_000_000, 8_000_000, 8_000_500]
            .iter()
            .enumerate()
            .map(|(i, &ts)| make_item(i, ts, &[]))
            .collect();
        TimelineIndex::build(&cluster_items(&items, &TagFilter::default()))
    }

    #[test]
    fn test_step_forward_and_back() {
        let index = sample_index();
        assert_eq!(step(&index, Some("1.jpg"), 1), Some("2.jpg"));
        assert_eq!(step(&index, Some("1.jpg"), -1), Some("0.jpg"));
        // Steps cross cluster boundaries transparently.
        assert_eq!(step(&index, Some("2.jpg"), 1), Some("3.jpg"));
    }

    #[test]
    fn test_step_out_of_bounds_is_noop() {
        let index = sample_index();
        assert_eq!(step(&index, Some("4.jpg"), 1), None);
        assert_eq!(step(&index, Some("0.jpg"), -1), None);
        assert_eq!(step(&index, Some("0.jpg"), -5), None);
    }

    #[test]
    fn test_step_without_current_is_noop() {
        let index = sample_index();
        assert_eq!(step(&index, None, 1), None);
        assert_eq!(step(&index, Some("gone.jpg"), 1), None);
    }

    #[test]
    fn test_step_zero_is_noop() {
        let index = sample_index();
        assert_eq!(step(&index, Some("2.jpg"), 0), None);
    }

    #[test]
    fn test_step_walks_filtered_neighbors() {
        // With 1.jpg and 2.jpg filtered out, the flat positions of the
        // survivors are contiguous even though their ranks are not.
        let items = vec![
            make_item(0, 0, &["keep"]),
            make_item(1, 1000, &[]),
            make_item(2, 4_000_000, &[]),
            make_item(3, 8_000_000, &["keep"]),
            make_item(4, 8_000_500, &["keep"]),
        ];
        let clusters = cluster_items(&items, &TagFilter::parse("keep"));
        let index = TimelineIndex::build(&clusters);

        assert_eq!(step(&index, Some("0.jpg"), 1), Some("3.jpg"));
        assert_eq!(step(&index, Some("3.jpg"), -1), Some("0.jpg"));
        assert_eq!(step(&index, Some("4.jpg"), 1), None);
    }

    #[test]
    fn test_wheel_step_maps_sign() {
        let none = ModifierType::empty();
        assert_eq!(wheel_step(2.5, none), Some(1));
        assert_eq!(wheel_step(-0.25, none), Some(-1));
        assert_eq!(wheel_step(0.0, none), None);
    }

    #[test]
    fn test_wheel_step_ignores_modifier_chords() {
        assert_eq!(wheel_step(1.0, ModifierType::SHIFT_MASK), None);
        assert_eq!(wheel_step(1.0, ModifierType::CONTROL_MASK), None);
        assert_eq!(wheel_step(-1.0, ModifierType::ALT_MASK), None);
        assert_eq!(wheel_step(-1.0, ModifierType::META_MASK), None);
    }
}
