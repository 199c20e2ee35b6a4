//! Overpass QL query construction.

use crate::models::Coordinate;
use crate::normalize::CategoryRule;

const ELEMENT_KINDS: &[&str] = &["node", "way", "relation"];

/// Build an `around` union over nodes, ways and relations for every rule,
/// returning centers for non-point elements.
pub fn build_around_query(
    center: Coordinate,
    radius_m: u32,
    rules: &[CategoryRule],
    timeout_secs: u32,
) -> String {
    let mut selectors = String::new();
    for kind in ELEMENT_KINDS {
        for rule in rules {
            selectors.push_str(&format!(
                "  {}[\"{}\"=\"{}\"](around:{},{},{});\n",
                kind,
                escape(&rule.key),
                escape(&rule.value),
                radius_m,
                center.lat(),
                center.lng()
            ));
        }
    }

    format!(
        "[out:json][timeout:{}];\n(\n{});\nout center;",
        timeout_secs, selectors
    )
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::default_rules;

    #[test]
    fn test_query_covers_all_kinds_and_rules() {
        let center = Coordinate::new(39.8, -89.65).unwrap();
        let q = build_around_query(center, 10000, &default_rules(), 25);

        assert!(q.starts_with("[out:json][timeout:25];"));
        assert!(q.ends_with("out center;"));
        assert!(q.contains("node[\"amenity\"=\"recycling\"](around:10000,39.8,-89.65);"));
        assert!(q.contains("way[\"shop\"=\"scrap_yard\"](around:10000,39.8,-89.65);"));
        assert!(q.contains("relation[\"amenity\"=\"recycling\"]"));
        assert_eq!(q.matches("(around:").count(), 6);
    }

    #[test]
    fn test_escapes_quotes() {
        assert_eq!(escape(r#"a"b"#), r#"a\"b"#);
    }
}
