use std::sync::OnceLock;

use regex::Regex;

use crate::options::Options;
use crate::resolver::TranslateError;

const MAX_EXPANDED_BYTES: usize = 64 * 1024;

/// `{{name}}` or `%{name}`; the closing `}}` may also be a single `}`.
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:\{\{|%\{)(.*?)\}\}?").expect("placeholder regex"))
}

fn take_prefix_by_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Substitute placeholders in `template` with values from `options`.
///
/// Absent or `Null` values become `[missing <placeholder> value]`. Values are
/// inserted literally. Output is capped at 64 KiB.
pub fn interpolate(template: &str, options: &Options) -> String {
    match try_interpolate(template, options) {
        Ok(s) => s,
        Err(TranslateError::TooLarge { partial, .. }) => partial,
        Err(_) => template.to_string(),
    }
}

pub(crate) fn try_interpolate(template: &str, options: &Options) -> Result<String, TranslateError> {
    let matches: Vec<(&str, &str)> = placeholder_re()
        .captures_iter(template)
        .filter_map(|caps| {
            let whole = caps.get(0)?.as_str();
            let name = caps.get(1).map_or("", |m| m.as_str());
            Some((whole, name))
        })
        .collect();
    if matches.is_empty() {
        return Ok(template.to_string());
    }

    let mut message = template.to_string();
    for (placeholder, name) in matches {
        let value = match options.get_defined(name) {
            Some(v) => v.to_string(),
            None => format!("[missing {placeholder} value]"),
        };
        // `replacen` is literal, so `$` in a value is never a back-reference.
        message = message.replacen(placeholder, &value, 1);
        if message.len() > MAX_EXPANDED_BYTES {
            return Err(TranslateError::TooLarge {
                limit: MAX_EXPANDED_BYTES,
                partial: take_prefix_by_bytes(&message, MAX_EXPANDED_BYTES).to_string(),
            });
        }
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ArgValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_is_unchanged() {
        let s = "No placeholders here, just {braces and 100%.";
        assert_eq!(interpolate(s, &Options::new()), s);
    }

    #[test]
    fn both_syntaxes() {
        let opts = Options::new().with("name", "Ann").with("count", 3);
        assert_eq!(
            interpolate("{{name}} has %{count} posts", &opts),
            "Ann has 3 posts"
        );
    }

    #[test]
    fn single_closing_brace_after_double_open() {
        let opts = Options::new().with("name", "Ann");
        assert_eq!(interpolate("hi {{name}!", &opts), "hi Ann!");
    }

    #[test]
    fn missing_value_is_visible() {
        assert_eq!(
            interpolate("Hello {{name}}", &Options::new()),
            "Hello [missing {{name}} value]"
        );
        let opts = Options::new().with("name", ArgValue::Null);
        assert_eq!(interpolate("%{name}", &opts), "[missing %{name} value]");
    }

    #[test]
    fn dollar_signs_are_literal() {
        let opts = Options::new().with("x", "a$b").with("y", "$1$&");
        assert_eq!(interpolate("{{x}}", &opts), "a$b");
        assert_eq!(interpolate("[%{y}]", &opts), "[$1$&]");
    }

    #[test]
    fn repeated_placeholder_replaced_per_occurrence() {
        let opts = Options::new().with("n", 2);
        assert_eq!(interpolate("%{n} + %{n}", &opts), "2 + 2");
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        let opts = Options::new().with("name", "Ann");
        assert_eq!(interpolate("Hello {{name", &opts), "Hello {{name");
    }

    #[test]
    fn output_is_limited() {
        let big = "a".repeat(MAX_EXPANDED_BYTES);
        let opts = Options::new().with("x", big);
        let s = interpolate("{{x}}{{x}}", &opts);
        assert!(s.len() <= MAX_EXPANDED_BYTES);
        assert!(try_interpolate("{{x}}{{x}}", &opts).is_err());
    }
}
