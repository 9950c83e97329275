//! Identifier normalization for user-entered names.
//!
//! Table and column names come from UI text fields ("Full Name") and have
//! to double as storage identifiers ("full_name"). Uniqueness is not
//! checked here; that is a repository concern.

use regex::Regex;
use std::sync::OnceLock;

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern"))
}

/// Normalize a human-entered name into a storage-safe identifier.
///
/// Trims, lowercases, collapses whitespace runs to a single underscore and
/// strips everything outside `[a-z0-9_]`. Idempotent. An empty result
/// means the input had no usable characters; callers must reject it as a
/// missing required field instead of storing it.
pub fn normalize(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let underscored = whitespace().replace_all(&lowered, "_");
    underscored
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Customers"), "customers");
        assert_eq!(normalize("Full Name"), "full_name");
        assert_eq!(normalize("  Order   Items  "), "order_items");
        assert_eq!(normalize("price_2024"), "price_2024");
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("E-Mail (work)"), "email_work");
        assert_eq!(normalize("Qty."), "qty");
        assert_eq!(normalize("a/b\\c"), "abc");
    }

    #[test]
    fn test_normalize_idempotent() {
        for input in ["Full Name", "  weird -- Name!! ", "already_normal", "Ünïcode Näme"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalize_output_charset() {
        for input in ["Täble", "42 Things", "!!!", "tab\tname", "new\nline"] {
            let out = normalize(input);
            assert!(
                out.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "unexpected char in {:?}",
                out
            );
        }
    }

    #[test]
    fn test_normalize_empty_when_nothing_usable() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!@#$%"), "");
    }
}
