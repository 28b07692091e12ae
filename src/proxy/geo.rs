//! Location string to country tag lookup

use once_cell::sync::Lazy;

/// Substring markers mapped to ISO country codes. First match wins, so the
/// more specific city names sit above their country entries.
static LOCATION_MARKERS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("new york", "us"),
        ("san francisco", "us"),
        ("seattle", "us"),
        ("austin", "us"),
        ("boston", "us"),
        ("united states", "us"),
        ("usa", "us"),
        ("london", "gb"),
        ("manchester", "gb"),
        ("united kingdom", "gb"),
        (" uk", "gb"),
        ("berlin", "de"),
        ("munich", "de"),
        ("germany", "de"),
        ("paris", "fr"),
        ("france", "fr"),
        ("toronto", "ca"),
        ("vancouver", "ca"),
        ("canada", "ca"),
        ("sydney", "au"),
        ("melbourne", "au"),
        ("australia", "au"),
        ("amsterdam", "nl"),
        ("netherlands", "nl"),
        ("bangalore", "in"),
        ("mumbai", "in"),
        ("india", "in"),
        ("dublin", "ie"),
        ("ireland", "ie"),
        ("tokyo", "jp"),
        ("japan", "jp"),
    ]
});

/// Map a free-form location string to a country tag, if any marker matches
pub fn country_for_location(location: &str) -> Option<&'static str> {
    let haystack = location.to_lowercase();
    LOCATION_MARKERS
        .iter()
        .find(|(marker, _)| haystack.contains(marker))
        .map(|(_, country)| *country)
}

/// Resolve the geography tag for a search, falling back to the configured
/// default when the location maps to nothing (remote roles, empty strings)
pub fn target_geography(location: &str, default: &str) -> String {
    country_for_location(location)
        .map(|c| c.to_string())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_lookup() {
        assert_eq!(country_for_location("New York, NY"), Some("us"));
        assert_eq!(country_for_location("London"), Some("gb"));
        assert_eq!(country_for_location("Berlin, Germany"), Some("de"));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(country_for_location("SAN FRANCISCO"), Some("us"));
    }

    #[test]
    fn test_unknown_falls_back_to_default() {
        assert_eq!(country_for_location("Remote"), None);
        assert_eq!(target_geography("Remote", "us"), "us");
        assert_eq!(target_geography("Sydney", "us"), "au");
    }
}
