use std::sync::Arc;

use forum_i18n::{t, I18nConfig, I18nState, LocaleTree, PluralRules, Resolver};

#[test]
fn macro_translates_through_global_state() {
    // Before init, keys come back as-is.
    assert_eq!(t!("topic.title"), "topic.title");

    let tree = LocaleTree::from_json_str(
        r#"{
        "da": { "js": { "topic": {
            "title": "Emne",
            "replies": { "one": "%{count} svar fra %{name}", "other": "%{count} svar" }
        } } },
        "en": { "js": { "topic": { "title": "Topic" } } }
    }"#,
    )
    .unwrap();
    let cfg = I18nConfig::from_toml_str(r#"locale = "da""#).unwrap();
    let ctx = cfg.context(Arc::new(tree), Arc::new(PluralRules::with_defaults()));
    I18nState::init(Resolver::new(ctx));

    assert_eq!(t!("topic.title"), "Emne");
    assert_eq!(t!("topic.replies", { count: 1, name: "Ann" }), "1 svar fra Ann");
    assert_eq!(t!("topic.replies", { count: 4 }), "4 svar");

    I18nState::get().set_locale("en");
    assert_eq!(t!("topic.title"), "Topic");
}
