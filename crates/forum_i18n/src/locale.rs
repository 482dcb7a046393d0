/// Locale that is always tried last when fallbacks are enabled.
pub const BACKSTOP_LOCALE: &str = "en";

/// Normalize locale identifiers to a canonical-ish form for lookup.
///
/// - Converts `-` to `_` (tree documents use `pt_BR`, browsers send `pt-BR`).
/// - Trims whitespace.
pub fn normalize_locale(s: &str) -> String {
    s.trim().replace('-', "_")
}

/// Locales tried by a translation, in order.
///
/// `requested` first, then (with fallbacks on) the fallback locale, the
/// default locale and the backstop. The default and backstop are only added
/// when they differ from `current`. Consecutive duplicates are dropped.
pub fn locale_fallback_chain(
    requested: &str,
    current: &str,
    fallback: Option<&str>,
    default: &str,
    fallbacks: bool,
) -> Vec<String> {
    let current = normalize_locale(current);
    let mut chain = vec![normalize_locale(requested)];

    if fallbacks {
        if let Some(fb) = fallback {
            chain.push(normalize_locale(fb));
        }
        let default = normalize_locale(default);
        if !default.is_empty() && default != current {
            chain.push(default);
        }
        if current != BACKSTOP_LOCALE {
            chain.push(BACKSTOP_LOCALE.to_string());
        }
    }

    chain.retain(|l| !l.is_empty());
    chain.dedup();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn full_chain() {
        assert_eq!(
            locale_fallback_chain("da", "da", Some("sv"), "de", true),
            vec!["da", "sv", "de", "en"]
        );
    }

    #[test]
    fn default_equal_to_current_is_skipped() {
        assert_eq!(
            locale_fallback_chain("da", "da", None, "da", true),
            vec!["da", "en"]
        );
    }

    #[test]
    fn english_current_has_no_backstop() {
        assert_eq!(
            locale_fallback_chain("en", "en", None, "en", true),
            vec!["en"]
        );
    }

    #[test]
    fn disabled_fallbacks() {
        assert_eq!(
            locale_fallback_chain("da", "da", Some("sv"), "de", false),
            vec!["da"]
        );
    }

    #[test]
    fn normalizes_region_separator() {
        assert_eq!(normalize_locale(" pt-BR "), "pt_BR");
    }
}
