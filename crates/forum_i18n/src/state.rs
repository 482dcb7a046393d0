use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use crate::locale::normalize_locale;
use crate::resolver::Resolver;

/// Global i18n singleton.
static I18N_STATE: OnceLock<I18nState> = OnceLock::new();

/// Process-wide holder for the active [`Resolver`].
///
/// Readers take a [`snapshot`](Self::snapshot) and use it for a whole
/// render; [`set_locale`](Self::set_locale) swaps in a new resolver and never
/// touches one that is already handed out.
pub struct I18nState {
    resolver: RwLock<Arc<Resolver>>,
}

impl I18nState {
    /// Initialize the global i18n state.
    ///
    /// Safe to call multiple times; the first call wins.
    pub fn init(resolver: Resolver) {
        let st = I18nState {
            resolver: RwLock::new(Arc::new(resolver)),
        };
        let _ = I18N_STATE.set(st);
    }

    pub fn get() -> &'static I18nState {
        I18N_STATE
            .get()
            .expect("I18nState not initialized. Call I18nState::init() at app startup.")
    }

    pub fn try_get() -> Option<&'static I18nState> {
        I18N_STATE.get()
    }

    pub fn snapshot(&self) -> Arc<Resolver> {
        self.resolver
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn locale(&self) -> String {
        self.snapshot().context().locale().to_string()
    }

    pub fn set_locale(&self, locale: &str) {
        let loc = normalize_locale(locale);
        if loc.is_empty() {
            return;
        }

        let mut cur = self.resolver.write().unwrap_or_else(PoisonError::into_inner);
        if cur.context().locale() == loc {
            return;
        }
        debug!("I18nState::set_locale: {} -> {}", cur.context().locale(), loc);
        *cur = Arc::new(cur.with_locale(&loc));
    }

    /// Replace the resolver wholesale, e.g. after reloading locale data.
    pub fn replace(&self, resolver: Resolver) {
        *self.resolver.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(resolver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::plural::PluralRules;
    use crate::resolver::LocaleContext;
    use crate::tree::LocaleTree;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_survives_locale_switch() {
        let tree = LocaleTree::from_json_str(
            r#"{"da": {"js": {"hi": "Hej"}}, "en": {"js": {"hi": "Hi"}}}"#,
        )
        .unwrap();
        let ctx = LocaleContext::new(Arc::new(tree), Arc::new(PluralRules::new()));
        let st = I18nState {
            resolver: RwLock::new(Arc::new(Resolver::new(ctx))),
        };

        let before = st.snapshot();
        st.set_locale("da");
        assert_eq!(st.locale(), "da");
        assert_eq!(before.translate("hi", &Options::new()), "Hi");
        assert_eq!(st.snapshot().translate("hi", &Options::new()), "Hej");

        st.set_locale("  ");
        assert_eq!(st.locale(), "da");
    }
}
