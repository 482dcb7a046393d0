//! Plural categories and per-locale pluralization rules.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::locale::normalize_locale;

/// CLDR-style plural category, or an exact numeral key such as `"0"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
    Exact(u64),
}

impl PluralCategory {
    /// The key this category is stored under in a plural branch.
    pub fn key(&self) -> String {
        match self {
            Self::Zero => "zero".to_string(),
            Self::One => "one".to_string(),
            Self::Two => "two".to_string(),
            Self::Few => "few".to_string(),
            Self::Many => "many".to_string(),
            Self::Other => "other".to_string(),
            Self::Exact(n) => n.to_string(),
        }
    }

    /// Whether `key` names a plural category or numeral.
    pub fn is_branch_key(key: &str) -> bool {
        matches!(key, "zero" | "one" | "two" | "few" | "many" | "other")
            || (!key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// A pluralization rule: absolute magnitude -> candidate categories, most
/// specific first.
pub type PluralRule = Arc<dyn Fn(f64) -> Vec<PluralCategory> + Send + Sync>;

/// `0 -> [zero, other]`, `1 -> [one]`, otherwise `[other]`.
pub fn english(n: f64) -> Vec<PluralCategory> {
    if n == 0.0 {
        vec![PluralCategory::Zero, PluralCategory::Other]
    } else if n == 1.0 {
        vec![PluralCategory::One]
    } else {
        vec![PluralCategory::Other]
    }
}

/// `1 -> [one]`, otherwise `[other]`.
pub fn one_other(n: f64) -> Vec<PluralCategory> {
    if n == 1.0 {
        vec![PluralCategory::One]
    } else {
        vec![PluralCategory::Other]
    }
}

/// Used for any locale without a registered rule.
pub fn other_only(_n: f64) -> Vec<PluralCategory> {
    vec![PluralCategory::Other]
}

/// Per-locale rule table.
#[derive(Clone, Default)]
pub struct PluralRules {
    rules: FxHashMap<String, PluralRule>,
}

impl PluralRules {
    /// Empty table: every locale resolves to [`other_only`].
    pub fn new() -> Self {
        Self::default()
    }

    /// `en` uses [`english`], `da` uses [`one_other`].
    pub fn with_defaults() -> Self {
        let mut rules = Self::new();
        rules.register("en", english);
        rules.register("da", one_other);
        rules
    }

    pub fn register<F>(&mut self, locale: &str, rule: F)
    where
        F: Fn(f64) -> Vec<PluralCategory> + Send + Sync + 'static,
    {
        self.rules.insert(normalize_locale(locale), Arc::new(rule));
    }

    pub fn contains(&self, locale: &str) -> bool {
        self.rules.contains_key(&normalize_locale(locale))
    }

    /// Candidate categories for `count` under `locale`'s rule.
    pub fn categories(&self, locale: &str, count: f64) -> Vec<PluralCategory> {
        let n = count.abs();
        let out = match self.rules.get(&normalize_locale(locale)) {
            Some(rule) => rule(n),
            None => other_only(n),
        };
        if out.is_empty() {
            // A rule must always give the branch something to probe.
            return vec![PluralCategory::Other];
        }
        out
    }
}

impl fmt::Debug for PluralRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut locales: Vec<_> = self.rules.keys().collect();
        locales.sort();
        f.debug_struct("PluralRules")
            .field("locales", &locales)
            .finish()
    }
}
