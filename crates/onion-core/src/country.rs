//! Language tag to country classification
//!
//! Telegram reports a user's client language as an IETF tag such as `it-IT`
//! or `en`. Only the primary subtag is considered; it is looked up in a fixed
//! table of two-letter codes.
//!
//! # Examples
//!
//! ```
//! use onion_core::country::classify;
//!
//! assert_eq!(classify(Some("it-IT")), "Italy");
//! assert_eq!(classify(Some("FR")), "France");
//! assert_eq!(classify(Some("xx")), "Unknown");
//! assert_eq!(classify(None), "Unknown");
//! ```

/// Label returned for absent, empty or unmapped language tags
pub const UNKNOWN_COUNTRY: &str = "Unknown";

const LANGUAGE_COUNTRIES: &[(&str, &str)] = &[
    ("it", "Italy"),
    ("en", "United States"),
    ("es", "Spain"),
    ("fr", "France"),
    ("de", "Germany"),
    ("pt", "Portugal"),
    ("ru", "Russia"),
    ("zh", "China"),
    ("ja", "Japan"),
    ("ko", "South Korea"),
    ("ar", "Saudi Arabia"),
    ("hi", "India"),
    ("nl", "Netherlands"),
    ("pl", "Poland"),
    ("tr", "Turkey"),
    ("uk", "Ukraine"),
    ("sv", "Sweden"),
    ("no", "Norway"),
    ("da", "Denmark"),
    ("fi", "Finland"),
    ("el", "Greece"),
    ("cs", "Czech Republic"),
    ("hu", "Hungary"),
    ("ro", "Romania"),
    ("he", "Israel"),
    ("th", "Thailand"),
    ("vi", "Vietnam"),
    ("id", "Indonesia"),
    ("ms", "Malaysia"),
    ("fa", "Iran"),
    ("bg", "Bulgaria"),
    ("hr", "Croatia"),
];

/// Look up the country for a bare two-letter language code
///
/// The code must already be lowercase.
pub fn lookup(code: &str) -> Option<&'static str> {
    LANGUAGE_COUNTRIES
        .iter()
        .find(|(lang, _)| *lang == code)
        .map(|(_, country)| *country)
}

/// Classify an optional language tag into a country name
///
/// Returns [`UNKNOWN_COUNTRY`] when the tag is absent, empty or its primary
/// subtag is not in the table.
pub fn classify(language_code: Option<&str>) -> &'static str {
    let Some(tag) = language_code.filter(|tag| !tag.is_empty()) else {
        return UNKNOWN_COUNTRY;
    };

    let primary = tag.split('-').next().unwrap_or_default().to_lowercase();
    lookup(&primary).unwrap_or(UNKNOWN_COUNTRY)
}
