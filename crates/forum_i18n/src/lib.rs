//! Forum client internationalization (i18n)
//!
//! Resolves dotted translation keys against a locale tree:
//! - Locale fallback: current -> fallback -> default -> `en`
//! - CLDR-style plural selection with per-locale rules
//! - `{{name}}` / `%{name}` interpolation
//! - Number, percentage, currency and storage-size formatting
//!
//! Translation never fails. Missing keys, plural forms and placeholder
//! values degrade to visible markers such as `[da.topic.title]`.
//!
//! ```
//! use std::sync::Arc;
//! use forum_i18n::{LocaleContext, LocaleTree, Options, PluralRules, Resolver};
//!
//! let tree = LocaleTree::from_json_str(r#"{
//!     "da": { "js": { "topic": { "replies": { "one": "%{count} svar", "other": "%{count} svar i alt" } } } }
//! }"#).unwrap();
//! let ctx = LocaleContext::new(Arc::new(tree), Arc::new(PluralRules::with_defaults()))
//!     .with_locale("da");
//! let i18n = Resolver::new(ctx);
//!
//! assert_eq!(i18n.translate("topic.replies", &Options::new().with("count", 1)), "1 svar");
//! assert_eq!(i18n.translate("topic.missing", &Options::new()), "[da.topic.missing]");
//! ```

mod config;
mod error;
mod interpolate;
mod locale;
mod number;
mod options;
mod plural;
mod resolver;
mod state;
mod tree;
mod verbose;

pub use config::I18nConfig;
pub use error::I18nError;
pub use interpolate::interpolate;
pub use locale::{locale_fallback_chain, normalize_locale, BACKSTOP_LOCALE};
pub use number::format_number;
pub use options::{ArgValue, Options};
pub use plural::{english, one_other, other_only, PluralCategory, PluralRule, PluralRules};
pub use resolver::{
    missing_translation, Key, LocaleContext, Resolver, TranslateError, NAMESPACE_ROOT,
};
pub use state::I18nState;
pub use tree::{LocaleTree, Node, PluralBranch};
pub use verbose::{with_verbose_logging, Translate, VerboseTranslator};

/// Translate `key` using the global [`I18nState`].
///
/// If the state isn't initialized, this degrades gracefully and returns the
/// key itself.
pub fn translate(key: impl Into<Key>, options: &Options) -> String {
    let key = key.into();
    match I18nState::try_get() {
        Some(st) => st.snapshot().translate(key, options),
        None => key.to_string(),
    }
}

/// Translate through the global [`I18nState`], building options inline.
///
/// Examples:
/// - `t!("topic.title")`
/// - `t!("topic.replies", { count: 3, name: user_name })`
#[macro_export]
macro_rules! t {
    ($key:expr) => {
        $crate::translate($key, &$crate::Options::new())
    };
    ($key:expr, { $($name:ident : $value:expr),* $(,)? }) => {{
        let opts = $crate::Options::new();
        $(
            let opts = opts.with(stringify!($name), $value);
        )*
        $crate::translate($key, &opts)
    }};
}
