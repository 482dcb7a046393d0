//! Verbose localization: number every key and log it the first time it is
//! translated.

use std::collections::hash_map::Entry;
use std::sync::{Mutex, PoisonError};

use rustc_hash::FxHashMap;
use tracing::info;

use crate::options::Options;
use crate::resolver::{Key, Resolver};

/// Anything that turns a key and options into display text.
pub trait Translate {
    fn t(&self, key: Key, options: &Options) -> String;
}

impl Translate for Resolver {
    fn t(&self, key: Key, options: &Options) -> String {
        self.translate(key, options)
    }
}

impl<T: Translate + ?Sized> Translate for Box<T> {
    fn t(&self, key: Key, options: &Options) -> String {
        (**self).t(key, options)
    }
}

/// Wraps a translator, appending ` (#n)` to every result.
///
/// `n` is assigned per distinct key in first-seen order and logged once.
pub struct VerboseTranslator<T> {
    inner: T,
    keys: Mutex<FxHashMap<String, usize>>,
}

impl<T: Translate> VerboseTranslator<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            keys: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn number_for(&self, key: &Key, options: &Options) -> usize {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        let next = keys.len() + 1;
        match keys.entry(key.as_str().to_string()) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                e.insert(next);
                if options.is_empty() {
                    info!("Translation #{next}: {key}");
                } else {
                    let params = serde_json::to_string(options).unwrap_or_default();
                    info!("Translation #{next}: {key}, parameters: {params}");
                }
                next
            }
        }
    }
}

impl<T: Translate> Translate for VerboseTranslator<T> {
    fn t(&self, key: Key, options: &Options) -> String {
        let number = self.number_for(&key, options);
        format!("{} (#{number})", self.inner.t(key, options))
    }
}

/// Verbose mode over `resolver`. Fallbacks are turned off so untranslated
/// keys show up as markers.
pub fn with_verbose_logging(resolver: Resolver) -> VerboseTranslator<Resolver> {
    VerboseTranslator::new(resolver.with_fallbacks(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plural::PluralRules;
    use crate::resolver::LocaleContext;
    use crate::tree::LocaleTree;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn resolver() -> Resolver {
        let tree = LocaleTree::from_json_str(
            r#"{"da": {"js": {"hello": "Hej %{name}"}}, "en": {"js": {"bye": "Bye"}}}"#,
        )
        .unwrap();
        Resolver::new(
            LocaleContext::new(Arc::new(tree), Arc::new(PluralRules::new())).with_locale("da"),
        )
    }

    #[test]
    fn numbers_keys_in_first_seen_order() {
        let v = with_verbose_logging(resolver());
        let opts = Options::new().with("name", "Ann");
        assert_eq!(v.t("hello".into(), &opts), "Hej Ann (#1)");
        assert_eq!(v.t("bye".into(), &Options::new()), "[da.bye] (#2)");
        assert_eq!(v.t("hello".into(), &opts), "Hej Ann (#1)");
    }

    #[test]
    fn wrapped_resolver_is_untouched() {
        let r = resolver();
        let v = with_verbose_logging(r.clone());
        assert!(r.context().fallbacks());
        assert!(!v.inner().context().fallbacks());
        assert_eq!(r.t("bye".into(), &Options::new()), "Bye");
    }
}
