//! Cache key definitions.
//!
//! The three collections are field-mapped (record id to JSON). The news reload flag
//! and the current news filter are single scalar slots.

/// A field-mapped collection keyed by record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Tags,
    Topics,
    News,
}

impl Collection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Collection::Tags => "tags",
            Collection::Topics => "topics",
            Collection::News => "news",
        }
    }
}

/// Scalar slot holding the news staleness flag.
pub const RELOAD_NEWSES: &str = "reload_newses";

/// Scalar slot holding the cache key of the filter the news collection was built for.
pub const FILTER_NEWSES: &str = "filter_newses";

/// Flag value meaning the news collection must be rebuilt from the store.
pub const FLAG_STALE: &str = "1";

/// Flag value meaning the news collection may be served.
pub const FLAG_FRESH: &str = "0";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_are_distinct_from_scalar_slots() {
        for collection in [Collection::Tags, Collection::Topics, Collection::News] {
            assert_ne!(collection.as_str(), RELOAD_NEWSES);
            assert_ne!(collection.as_str(), FILTER_NEWSES);
        }
    }
}
