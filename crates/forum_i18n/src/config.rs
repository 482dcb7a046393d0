use std::sync::Arc;

use serde::Deserialize;

use crate::locale::BACKSTOP_LOCALE;
use crate::plural::PluralRules;
use crate::resolver::{LocaleContext, Resolver};
use crate::tree::LocaleTree;
use crate::verbose::{with_verbose_logging, Translate};
use crate::I18nError;

/// Locale settings, usually read from the `[i18n]` table of an app config.
///
/// ```toml
/// locale = "da"
/// fallback_locale = "sv"
/// default_locale = "en"
/// fallbacks = true
/// verbose = false
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct I18nConfig {
    pub locale: String,
    pub fallback_locale: Option<String>,
    pub default_locale: String,
    pub fallbacks: bool,
    pub verbose: bool,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            locale: BACKSTOP_LOCALE.to_string(),
            fallback_locale: None,
            default_locale: BACKSTOP_LOCALE.to_string(),
            fallbacks: true,
            verbose: false,
        }
    }
}

impl I18nConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, I18nError> {
        Ok(toml::from_str(src)?)
    }

    pub fn context(&self, tree: Arc<LocaleTree>, rules: Arc<PluralRules>) -> LocaleContext {
        LocaleContext::new(tree, rules)
            .with_locale(&self.locale)
            .with_fallback_locale(self.fallback_locale.as_deref())
            .with_default_locale(&self.default_locale)
            .with_fallbacks(self.fallbacks)
    }

    /// The configured translator: a plain [`Resolver`], or the verbose
    /// decorator around one.
    pub fn build(
        &self,
        tree: Arc<LocaleTree>,
        rules: Arc<PluralRules>,
    ) -> Box<dyn Translate + Send + Sync> {
        let resolver = Resolver::new(self.context(tree, rules));
        if self.verbose {
            Box::new(with_verbose_logging(resolver))
        } else {
            Box::new(resolver)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg = I18nConfig::from_toml_str(r#"locale = "da""#).unwrap();
        assert_eq!(
            cfg,
            I18nConfig {
                locale: "da".to_string(),
                ..I18nConfig::default()
            }
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = I18nConfig::from_toml_str("locales = 3").unwrap_err();
        assert!(matches!(err, I18nError::Config(_)));
    }

    #[test]
    fn builds_context() {
        let cfg = I18nConfig::from_toml_str(
            r#"
locale = "da"
fallback_locale = "sv"
default_locale = "de"
fallbacks = false
"#,
        )
        .unwrap();
        let ctx = cfg.context(Arc::new(LocaleTree::new()), Arc::new(PluralRules::new()));
        assert_eq!(ctx.locale(), "da");
        assert_eq!(ctx.fallback_locale(), Some("sv"));
        assert_eq!(ctx.default_locale(), "de");
        assert!(!ctx.fallbacks());
    }

    #[test]
    fn verbose_build_suffixes_results() {
        let tree = LocaleTree::from_json_str(r#"{"en": {"js": {"ok": "OK"}}}"#).unwrap();
        let cfg = I18nConfig {
            verbose: true,
            ..I18nConfig::default()
        };
        let t = cfg.build(Arc::new(tree), Arc::new(PluralRules::with_defaults()));
        assert_eq!(t.t("ok".into(), &Options::new()), "OK (#1)");
    }
}
