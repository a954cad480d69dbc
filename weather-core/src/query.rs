//! Classification and canonicalisation of search input.
//!
//! Coordinate pairs are rounded to three decimals so that repeated
//! geolocation fixes with sub-meter jitter share one cache key.

use crate::{WeatherError, model::LastQuery};

const MY_LOCATION: &str = "my location";

/// True when `s` (after trimming) is `lat,lon` with optionally negative
/// integer or decimal components and nothing else.
pub fn is_coordinate_pair(s: &str) -> bool {
    match s.trim().split_once(',') {
        Some((lat, lon)) => is_decimal(lat) && is_decimal(lon),
        None => false,
    }
}

fn is_decimal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int, frac) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits, None),
    };

    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.is_none_or(all_digits)
}

/// Canonical form of a query: coordinate pairs reformatted to exactly three
/// decimals per component, everything else trimmed.
pub fn normalize(s: &str) -> String {
    let trimmed = s.trim();
    if !is_coordinate_pair(trimmed) {
        return trimmed.to_string();
    }

    let parts: Option<Vec<f64>> = trimmed.split(',').map(|n| n.parse::<f64>().ok()).collect();
    match parts.as_deref() {
        Some([lat, lon]) => format_coordinates(*lat, *lon),
        _ => trimmed.to_string(),
    }
}

/// `lat,lon` with both components at three decimals.
pub fn format_coordinates(lat: f64, lon: f64) -> String {
    format!("{lat:.3},{lon:.3}")
}

/// Case-insensitive match of "my location" anywhere in the trimmed input.
pub fn is_my_location(s: &str) -> bool {
    s.trim().to_lowercase().contains(MY_LOCATION)
}

/// Collapse whitespace runs to single spaces and trim, the way typed input is
/// read from the search field.
pub fn tidy_input(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decide which query to send to the provider.
///
/// An explicit override (already normalised by the caller, e.g. a
/// geolocation fix) wins. Otherwise the typed text is checked against the
/// "my location" sentinel and the remembered label before being used as-is.
pub fn resolve(
    typed: &str,
    override_query: Option<&str>,
    last: Option<&LastQuery>,
) -> Result<String, WeatherError> {
    if let Some(q) = override_query.map(str::trim).filter(|q| !q.is_empty()) {
        return Ok(q.to_string());
    }

    let typed = tidy_input(typed);
    if typed.is_empty() {
        return Err(WeatherError::validation("Type a city name."));
    }

    if is_my_location(&typed) {
        return match last {
            Some(last) if !last.q.is_empty() => Ok(last.q.clone()),
            _ => Err(WeatherError::validation("No saved location yet.")),
        };
    }

    let lowered = typed.to_lowercase();
    if let Some(last) = last.filter(|l| !l.label.is_empty() && l.label.to_lowercase() == lowered) {
        return Ok(last.q.clone());
    }

    Ok(typed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn paris() -> LastQuery {
        LastQuery { label: "Paris, France".into(), q: "48.867,2.333".into() }
    }

    #[test]
    fn recognises_coordinate_pairs() {
        assert!(is_coordinate_pair("48.8566,2.3522"));
        assert!(is_coordinate_pair("  -33,151.2 "));
        assert!(is_coordinate_pair("0,0"));

        assert!(!is_coordinate_pair("48.8566, 2.3522"));
        assert!(!is_coordinate_pair("+48,2"));
        assert!(!is_coordinate_pair("48.,2"));
        assert!(!is_coordinate_pair(".5,2"));
        assert!(!is_coordinate_pair("48,2,1"));
        assert!(!is_coordinate_pair("Paris"));
        assert!(!is_coordinate_pair(""));
    }

    #[test]
    fn normalizes_coordinates_to_three_decimals() {
        assert_eq!(normalize("48.85661,2.35222"), "48.857,2.352");
        assert_eq!(normalize(" -33,151.2"), "-33.000,151.200");
    }

    #[test]
    fn normalize_is_idempotent_on_coordinates() {
        for input in ["51.5072,-0.1276", "-90,180", "1.0005,2.9999", "12,34"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
            for part in once.split(',') {
                let decimals = part.split_once('.').map(|(_, f)| f.len());
                assert_eq!(decimals, Some(3), "{once}");
            }
        }
    }

    #[test]
    fn non_coordinates_are_only_trimmed() {
        assert_eq!(normalize("  Paris, FR "), "Paris, FR");
        assert_eq!(normalize("New  York"), "New  York");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn coordinates_normalize_to_three_decimals_idempotently(
                input in r"-?[0-9]{1,6}(\.[0-9]{1,8})?,-?[0-9]{1,6}(\.[0-9]{1,8})?",
                pad in " {0,3}",
            ) {
                let once = normalize(&format!("{pad}{input}{pad}"));
                prop_assert!(is_coordinate_pair(&once));
                prop_assert_eq!(normalize(&once), once.clone());
                for part in once.split(',') {
                    let decimals = part.split_once('.').map(|(_, f)| f.len());
                    prop_assert_eq!(decimals, Some(3));
                }
            }

            #[test]
            fn other_input_is_returned_trimmed(
                body in "[A-Za-z0-9 ,.'-]{0,24}",
                lead in "[ \t]{0,3}",
                trail in "[ \t]{0,3}",
            ) {
                prop_assume!(!is_coordinate_pair(&body));
                let input = format!("{lead}{body}{trail}");
                prop_assert_eq!(normalize(&input), input.trim());
            }
        }
    }

    #[test]
    fn sentinel_is_case_insensitive() {
        assert!(is_my_location("My Location"));
        assert!(is_my_location("  weather at MY LOCATION please"));
        assert!(!is_my_location("my-location"));
    }

    #[test]
    fn override_wins_over_typed_text() {
        let q = resolve("Berlin", Some(" 52.520,13.405 "), None).unwrap();
        assert_eq!(q, "52.520,13.405");
    }

    #[test]
    fn blank_override_falls_through_to_text() {
        let q = resolve("Berlin", Some("   "), None).unwrap();
        assert_eq!(q, "Berlin");
    }

    #[test]
    fn empty_text_is_a_validation_error() {
        let err = resolve("   ", None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "Type a city name.");
    }

    #[test]
    fn sentinel_without_history_is_rejected() {
        let err = resolve("My Location", None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "No saved location yet.");
    }

    #[test]
    fn sentinel_reuses_stored_query() {
        let last = paris();
        assert_eq!(resolve("my location", None, Some(&last)).unwrap(), "48.867,2.333");
    }

    #[test]
    fn label_match_reuses_stored_query() {
        let last = paris();
        assert_eq!(resolve("  paris,   FRANCE ", None, Some(&last)).unwrap(), "48.867,2.333");
    }

    #[test]
    fn other_text_is_used_verbatim() {
        let last = paris();
        assert_eq!(resolve("Paris, TX", None, Some(&last)).unwrap(), "Paris, TX");
    }
}
