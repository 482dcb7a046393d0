//! Key lookup, locale fallback and plural selection.
//!
//! # Failure modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Key missing in every locale | `[locale.key]` marker |
//! | Plural category missing | `other`, then `[locale.key.category]` marker |
//! | Placeholder value missing | `[missing {{name}} value]` inline |
//! | Entry is not text (namespace, scalar) | `[locale.key]` marker |
//!
//! [`Resolver::translate`] never returns an error and never panics.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::interpolate::try_interpolate;
use crate::locale::{locale_fallback_chain, normalize_locale, BACKSTOP_LOCALE};
use crate::options::Options;
use crate::plural::{PluralCategory, PluralRules};
use crate::tree::{LocaleTree, Node};

/// Root segment prepended to every lookup into the primary tree.
pub const NAMESPACE_ROOT: &str = "js";

const SEPARATOR: char = '.';

/// A translation key, normalized to its dotted form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Join segments with `.`.
    pub fn from_segments<S: AsRef<str>>(segments: impl IntoIterator<Item = S>) -> Self {
        let mut out = String::new();
        for (i, seg) in segments.into_iter().enumerate() {
            if i > 0 {
                out.push(SEPARATOR);
            }
            out.push_str(seg.as_ref());
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Self(v)
    }
}

impl From<&String> for Key {
    fn from(v: &String) -> Self {
        Self(v.clone())
    }
}

impl From<&Key> for Key {
    fn from(v: &Key) -> Self {
        v.clone()
    }
}

impl From<&[&str]> for Key {
    fn from(v: &[&str]) -> Self {
        Self::from_segments(v)
    }
}

impl<const N: usize> From<[&str; N]> for Key {
    fn from(v: [&str; N]) -> Self {
        Self::from_segments(v)
    }
}

impl From<Vec<String>> for Key {
    fn from(v: Vec<String>) -> Self {
        Self::from_segments(v)
    }
}

/// Why a translation degraded to a marker. Never crosses the public API of
/// [`Resolver::translate`].
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("no translation for `{key}`")]
    Missing { key: Key },

    #[error("no `{category}` form for `{key}`")]
    MissingPlural { key: Key, category: PluralCategory },

    #[error("`{key}` resolves to {kind}, not text")]
    NotText { key: Key, kind: &'static str },

    #[error("interpolated text exceeds {limit} bytes")]
    TooLarge { limit: usize, partial: String },
}

/// `[locale.key]` or `[locale.key.category]`.
pub fn missing_translation(locale: &str, key: &Key, category: Option<&PluralCategory>) -> String {
    match category {
        Some(c) => format!("[{locale}{SEPARATOR}{key}{SEPARATOR}{c}]"),
        None => format!("[{locale}{SEPARATOR}{key}]"),
    }
}

/// Immutable locale settings plus the data they apply to.
///
/// Switching locale produces a new context; a context in use by a render is
/// never mutated.
#[derive(Clone, Debug)]
pub struct LocaleContext {
    locale: String,
    fallback_locale: Option<String>,
    default_locale: String,
    fallbacks: bool,
    tree: Arc<LocaleTree>,
    rules: Arc<PluralRules>,
}

impl LocaleContext {
    /// `en` current and default locale, fallbacks on.
    pub fn new(tree: Arc<LocaleTree>, rules: Arc<PluralRules>) -> Self {
        Self {
            locale: BACKSTOP_LOCALE.to_string(),
            fallback_locale: None,
            default_locale: BACKSTOP_LOCALE.to_string(),
            fallbacks: true,
            tree,
            rules,
        }
    }

    /// Empty locales are ignored.
    pub fn with_locale(mut self, locale: &str) -> Self {
        let loc = normalize_locale(locale);
        if !loc.is_empty() {
            self.locale = loc;
        }
        self
    }

    pub fn with_fallback_locale(mut self, locale: Option<&str>) -> Self {
        self.fallback_locale = locale.map(normalize_locale).filter(|l| !l.is_empty());
        self
    }

    pub fn with_default_locale(mut self, locale: &str) -> Self {
        let loc = normalize_locale(locale);
        if !loc.is_empty() {
            self.default_locale = loc;
        }
        self
    }

    pub fn with_fallbacks(mut self, enabled: bool) -> Self {
        self.fallbacks = enabled;
        self
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn fallback_locale(&self) -> Option<&str> {
        self.fallback_locale.as_deref()
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn fallbacks(&self) -> bool {
        self.fallbacks
    }

    pub fn tree(&self) -> &LocaleTree {
        &self.tree
    }

    pub fn rules(&self) -> &PluralRules {
        &self.rules
    }
}

/// Resolves translation keys against a [`LocaleContext`].
#[derive(Clone, Debug)]
pub struct Resolver {
    ctx: LocaleContext,
}

impl Resolver {
    pub fn new(ctx: LocaleContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &LocaleContext {
        &self.ctx
    }

    /// A resolver over the same data with a different current locale.
    pub fn with_locale(&self, locale: &str) -> Self {
        Self::new(self.ctx.clone().with_locale(locale))
    }

    pub fn with_fallbacks(self, enabled: bool) -> Self {
        Self::new(self.ctx.with_fallbacks(enabled))
    }

    /// `options.locale`, else the current locale.
    pub fn requested_locale(&self, options: &Options) -> String {
        options
            .locale()
            .map(normalize_locale)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| self.ctx.locale.clone())
    }

    /// Find the entry for `key` at `options.locale` (or the current locale).
    ///
    /// Falls back to the locale's extras tree and then to
    /// `options.defaultValue`. `None` means absent.
    pub fn lookup<'a>(&'a self, key: impl Into<Key>, options: &Options) -> Option<Cow<'a, Node>> {
        let key = key.into();
        let locale = self.requested_locale(options);
        self.lookup_in(&locale, &key, options)
    }

    fn lookup_in<'a>(&'a self, locale: &str, key: &Key, options: &Options) -> Option<Cow<'a, Node>> {
        let scoped = match options.scope() {
            Some(scope) => format!("{scope}{SEPARATOR}{key}"),
            None => key.as_str().to_string(),
        };

        let mut segments: Vec<&str> = scoped.split(SEPARATOR).collect();
        if segments.first() != Some(&NAMESPACE_ROOT) {
            segments.insert(0, NAMESPACE_ROOT);
        }

        let tree = &self.ctx.tree;
        let found = tree
            .root(locale)
            .and_then(|root| root.walk(segments.iter().copied()))
            .or_else(|| {
                tree.extras(locale)
                    .and_then(|extras| extras.walk(scoped.split(SEPARATOR)))
            });

        match found {
            Some(node) => Some(Cow::Borrowed(node)),
            None => options
                .default_value()
                .map(|d| Cow::Owned(Node::text(d))),
        }
    }

    /// Translate `key`, walking the fallback chain, selecting a plural form
    /// when `options.count` is a number, and interpolating `options`.
    ///
    /// Always returns a string; failures become a `[locale.key]` marker.
    pub fn translate(&self, key: impl Into<Key>, options: &Options) -> String {
        let key = key.into();
        match self.try_translate(&key, options) {
            Ok(s) => s,
            Err(err) => {
                debug!(key = %key, error = %err, "translation degraded to marker");
                let category = match &err {
                    TranslateError::MissingPlural { category, .. } => Some(category),
                    _ => None,
                };
                missing_translation(&self.requested_locale(options), &key, category)
            }
        }
    }

    /// Like [`Resolver::translate`] but reports why it failed.
    pub fn try_translate(&self, key: &Key, options: &Options) -> Result<String, TranslateError> {
        let requested = self.requested_locale(options);
        let chain = locale_fallback_chain(
            &requested,
            &self.ctx.locale,
            self.ctx.fallback_locale.as_deref(),
            &self.ctx.default_locale,
            self.ctx.fallbacks,
        );

        let last = chain.len().saturating_sub(1);
        for (idx, locale) in chain.iter().enumerate() {
            // Only the final attempt may report a missing plural form.
            let ignore_missing = idx < last;
            let Some(found) = self.find_translation(locale, key, options, ignore_missing) else {
                continue;
            };
            if idx > 0 {
                debug!(key = %key, requested = %requested, locale = %locale, "translation fell back");
            }
            let template = found?;
            return try_interpolate(&template, options);
        }

        Err(TranslateError::Missing { key: key.clone() })
    }

    /// `None`: keep walking the chain. `Some(Err(_))`: found but unusable.
    fn find_translation(
        &self,
        locale: &str,
        key: &Key,
        options: &Options,
        ignore_missing: bool,
    ) -> Option<Result<String, TranslateError>> {
        let node = self.lookup_in(locale, key, options)?;
        match options.count() {
            Some(count) => self.select_plural(&node, key, locale, count, ignore_missing),
            None => Some(node_text(&node, key)),
        }
    }

    fn select_plural(
        &self,
        node: &Node,
        key: &Key,
        locale: &str,
        count: f64,
        ignore_missing: bool,
    ) -> Option<Result<String, TranslateError>> {
        let Node::Plural(branch) = node else {
            return Some(node_text(node, key));
        };
        let candidates = self.ctx.rules.categories(locale, count);
        if let Some(text) = branch.select(&candidates) {
            return Some(Ok(text.to_string()));
        }
        if ignore_missing {
            return None;
        }
        Some(Err(TranslateError::MissingPlural {
            key: key.clone(),
            category: candidates[0],
        }))
    }

    /// Pick the plural form of `node` for `options.count`.
    ///
    /// Text passes through unchanged. For a branch, the locale rule's
    /// candidates are probed in order, then `other`. When nothing matches,
    /// returns `None` if `options.ignoreMissing` is set, otherwise the
    /// `[locale.key.category]` marker. Namespaces and scalars give `None`.
    pub fn pluralize(&self, node: &Node, key: impl Into<Key>, options: &Options) -> Option<String> {
        let key = key.into();
        let locale = self.requested_locale(options);
        let count = options.count();
        let ignore_missing = options.flag("ignoreMissing");

        let result = match count {
            Some(count) => self.select_plural(node, &key, &locale, count, ignore_missing)?,
            None => match node {
                Node::Plural(branch) => branch
                    .get(&PluralCategory::Other)
                    .map(str::to_string)
                    .ok_or(TranslateError::MissingPlural {
                        key: key.clone(),
                        category: PluralCategory::Other,
                    }),
                other => node_text(other, &key),
            },
        };

        match result {
            Ok(text) => Some(text),
            Err(TranslateError::MissingPlural { category, .. }) if !ignore_missing => {
                Some(missing_translation(&locale, &key, Some(&category)))
            }
            Err(_) => None,
        }
    }

    /// Scalar settings stored under `path` for `locale` (e.g. `number.format`).
    pub(crate) fn locale_options(&self, locale: &str, path: &str) -> Options {
        self.lookup_in(locale, &Key::from(path), &Options::new())
            .map(|node| node.to_options())
            .unwrap_or_default()
    }

    /// Text stored under `path` for `locale`, if any.
    pub(crate) fn locale_text(&self, locale: &str, path: &str) -> Option<String> {
        self.lookup_in(locale, &Key::from(path), &Options::new())
            .and_then(|node| node.as_text().map(str::to_string))
    }
}

fn node_text(node: &Node, key: &Key) -> Result<String, TranslateError> {
    let kind = match node {
        Node::Text(s) => return Ok(s.clone()),
        Node::Plural(_) => "a plural branch",
        Node::Scope(_) => "a namespace",
        Node::Number(_) => "a number",
        Node::Bool(_) => "a boolean",
    };
    Err(TranslateError::NotText {
        key: key.clone(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver(locale: &str) -> Resolver {
        let tree = LocaleTree::from_json_str(
            r#"{
            "da": { "js": {
                "topic": {
                    "title": "Emne",
                    "replies": { "one": "%{count} svar", "other": "%{count} svar i alt" }
                },
                "only_few": { "few": "nogle" }
            } },
            "en": { "js": {
                "topic": { "title": "Topic", "share": "Share" },
                "only_few": { "few": "some", "other": "many" }
            } }
        }"#,
        )
        .unwrap();
        let ctx = LocaleContext::new(Arc::new(tree), Arc::new(PluralRules::with_defaults()))
            .with_locale(locale);
        Resolver::new(ctx)
    }

    #[test]
    fn key_from_segments() {
        assert_eq!(Key::from(["topic", "title"]).as_str(), "topic.title");
        assert_eq!(Key::from(vec!["a".to_string()]).as_str(), "a");
    }

    #[test]
    fn lookup_prefixes_namespace_root() {
        let r = resolver("da");
        let opts = Options::new();
        assert_eq!(
            r.lookup("topic.title", &opts).as_deref(),
            Some(&Node::text("Emne"))
        );
        assert_eq!(
            r.lookup("js.topic.title", &opts).as_deref(),
            Some(&Node::text("Emne"))
        );
    }

    #[test]
    fn lookup_applies_scope_and_locale_override() {
        let r = resolver("da");
        let opts = Options::new().with("scope", "topic").with("locale", "en");
        assert_eq!(r.lookup("title", &opts).as_deref(), Some(&Node::text("Topic")));
    }

    #[test]
    fn lookup_missing_locale_is_empty() {
        let r = resolver("fr");
        assert_eq!(r.lookup("topic.title", &Options::new()), None);
    }

    #[test]
    fn lookup_default_value() {
        let r = resolver("da");
        let opts = Options::new().with("defaultValue", "fallback text");
        assert_eq!(
            r.lookup("nope", &opts).as_deref(),
            Some(&Node::text("fallback text"))
        );
    }

    #[test]
    fn translate_falls_back_to_english() {
        let r = resolver("da");
        assert_eq!(r.translate("topic.share", &Options::new()), "Share");
    }

    #[test]
    fn translate_missing_translation() {
        let r = resolver("da");
        assert_eq!(r.translate("topic.nope", &Options::new()), "[da.topic.nope]");
    }

    #[test]
    fn namespace_is_not_text() {
        let r = resolver("da");
        assert_eq!(r.translate("topic", &Options::new()), "[da.topic]");
        let err = r.try_translate(&Key::from("topic"), &Options::new()).unwrap_err();
        assert!(matches!(err, TranslateError::NotText { .. }));
    }

    #[test]
    fn translate_pluralizes() {
        let r = resolver("da");
        let one = Options::new().with("count", 1);
        let five = Options::new().with("count", 5);
        assert_eq!(r.translate("topic.replies", &one), "1 svar");
        assert_eq!(r.translate("topic.replies", &five), "5 svar i alt");
    }

    #[test]
    fn missing_plural_form_tolerated_until_last_attempt() {
        // `da` has only `few`, which its rule never yields; `en` has `other`.
        let r = resolver("da");
        let opts = Options::new().with("count", 3);
        assert_eq!(r.translate("only_few", &opts), "many");

        let r = r.with_fallbacks(false);
        assert_eq!(r.translate("only_few", &opts), "[da.only_few.other]");
    }

    #[test]
    fn pluralize_passes_text_through() {
        let r = resolver("da");
        let opts = Options::new().with("count", 2);
        assert_eq!(r.pluralize(&Node::text("x"), "k", &opts), Some("x".to_string()));
    }

    #[test]
    fn pluralize_marker_or_none() {
        let r = resolver("da");
        let branch = Node::plural([("few", "nogle")]);
        let opts = Options::new().with("count", 1);
        assert_eq!(
            r.pluralize(&branch, "k", &opts),
            Some("[da.k.one]".to_string())
        );
        let opts = opts.with("ignoreMissing", true);
        assert_eq!(r.pluralize(&branch, "k", &opts), None);
    }
}
