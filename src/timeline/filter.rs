use std::collections::BTreeSet;

use crate::models::MediaItem;

/// Tag predicate applied before clustering.
///
/// Parsed from a query-style string: tokens are `&`-separated, the key is
/// the text before the first `=` (values are ignored), and a `-` prefix
/// marks the tag as excluded. An item passes when it carries every required
/// tag and none of the excluded ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    pub required: BTreeSet<String>,
    pub excluded: BTreeSet<String>,
}

impl TagFilter {
    pub fn parse(query: &str) -> Self {
        let mut filter = Self::default();
        let query = query.trim().trim_start_matches('?');

        for token in query.split('&') {
            let key = token.split('=').next().unwrap_or("").trim();
            if key.is_empty() {
                continue;
            }
            if let Some(tag) = key.strip_prefix('-') {
                if !tag.is_empty() {
                    filter.excluded.insert(tag.to_string());
                }
            } else {
                filter.required.insert(key.to_string());
            }
        }

        filter
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.excluded.is_empty()
    }

    pub fn matches(&self, item: &MediaItem) -> bool {
        self.required.iter().all(|tag| item.has_tag(tag))
            && !self.excluded.iter().any(|tag| item.has_tag(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    fn make_item(tags: &[&str]) -> MediaItem {
        MediaItem {
            index: 0,
            timestamp_ms: 0,
            identity: "a.jpg".into(),
            kind: MediaKind::Image,
            width: 100,
            height: 100,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_empty() {
        assert!(TagFilter::parse("").is_empty());
        assert!(TagFilter::parse("   ").is_empty());
    }

    #[test]
    fn test_parse_required_and_excluded() {
        let filter = TagFilter::parse("cat&-dog");
        assert!(filter.required.contains("cat"));
        assert!(filter.excluded.contains("dog"));
        assert_eq!(filter.required.len(), 1);
        assert_eq!(filter.excluded.len(), 1);
    }

    #[test]
    fn test_parse_ignores_values() {
        let filter = TagFilter::parse("?cat=1&-dog=yes&beach");
        assert!(filter.required.contains("cat"));
        assert!(filter.required.contains("beach"));
        assert!(filter.excluded.contains("dog"));
    }

    #[test]
    fn test_parse_skips_degenerate_tokens() {
        let filter = TagFilter::parse("&&-&=x&cat");
        assert_eq!(filter.required.len(), 1);
        assert!(filter.required.contains("cat"));
        assert!(filter.excluded.is_empty());
    }

    #[test]
    fn test_matches_requires_all_required() {
        let filter = TagFilter::parse("cat&beach");
        assert!(filter.matches(&make_item(&["cat", "beach", "sunset"])));
        assert!(!filter.matches(&make_item(&["cat"])));
    }

    #[test]
    fn test_matches_rejects_any_excluded() {
        let filter = TagFilter::parse("cat&-dog");
        assert!(filter.matches(&make_item(&["cat"])));
        assert!(!filter.matches(&make_item(&["cat", "dog"])));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = TagFilter::default();
        assert!(filter.matches(&make_item(&[])));
        assert!(filter.matches(&make_item(&["anything"])));
    }
}
