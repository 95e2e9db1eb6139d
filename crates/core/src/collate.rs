//! Human-friendly string ordering for titles and system names.
//!
//! Comparison is case-insensitive and folds accented letters and ligatures to
//! their ASCII base at the primary level ("Éternel" sorts with "eternel",
//! "Œdipus" with "oedipus"). Accents and case only break ties.

use std::cmp::Ordering;

use deunicode::deunicode;

/// Primary sort key: lowercase, transliterated to ASCII ("Œdipus" -> "oedipus").
fn primary_key(s: &str) -> String {
    deunicode(&s.to_lowercase())
}

/// Primary-strength comparison: case and accents are ignored.
pub fn compare_base(a: &str, b: &str) -> Ordering {
    primary_key(a).cmp(&primary_key(b))
}

/// Full comparison: primary strength first, then accents, then case.
pub fn compare(a: &str, b: &str) -> Ordering {
    compare_base(a, b)
        .then_with(|| {
            a.chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase))
        })
        .then_with(|| a.cmp(b))
}

/// Case-insensitive substring test used by every search box.
pub fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(needle_lower)
}
