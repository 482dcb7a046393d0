use std::borrow::Cow;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single option or interpolation value.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Explicitly "not set". Never wins a merge and never interpolates.
    Null,
}

impl ArgValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view, used for `count` and `precision`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) if v.is_infinite() => {
                f.write_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            // f64's Display already drops a trailing `.0`.
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<&String> for ArgValue {
    fn from(v: &String) -> Self {
        Self::Str(v.clone())
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u64> for ArgValue {
    fn from(v: u64) -> Self {
        Self::Int(v as i64)
    }
}

impl From<usize> for ArgValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for ArgValue {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// An ordered bag of named options.
///
/// The same bag carries resolver settings (`scope`, `locale`, `count`,
/// `defaultValue`), number-format settings (`precision`, `separator`, ...)
/// and interpolation values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Options {
    entries: Vec<(Cow<'static, str>, ArgValue)>,
}

impl Options {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builder form of [`Options::set`].
    pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<ArgValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set `name`, replacing any existing value in place.
    pub fn set(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<ArgValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Raw entry, including explicit `Null`s.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Entry only when it is present and not `Null`.
    pub fn get_defined(&self, name: &str) -> Option<&ArgValue> {
        self.get(name).filter(|v| !v.is_null())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.get_defined(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Merge donors left to right. The first donor to define a key wins;
    /// later donors only fill keys that are absent or `Null` so far.
    pub fn merge<'a>(donors: impl IntoIterator<Item = &'a Options>) -> Options {
        let mut out = Options::new();
        for donor in donors {
            out.fill_from(donor);
        }
        out
    }

    /// Fill keys that are absent or `Null` in `self` from `donor`.
    pub fn fill_from(&mut self, donor: &Options) {
        for (k, v) in &donor.entries {
            if !self.is_defined(k) {
                self.set(k.clone(), v.clone());
            }
        }
    }

    pub fn str_value(&self, name: &str) -> Option<&str> {
        self.get_defined(name).and_then(ArgValue::as_str)
    }

    pub fn scope(&self) -> Option<&str> {
        self.str_value("scope")
    }

    pub fn locale(&self) -> Option<&str> {
        self.str_value("locale")
    }

    /// `count`, when it is a number. Anything else disables pluralization.
    pub fn count(&self) -> Option<f64> {
        self.get_defined("count").and_then(ArgValue::as_f64)
    }

    pub fn default_value(&self) -> Option<&str> {
        self.str_value("defaultValue")
    }

    /// `precision`, clamped to `0..=100` the way fixed-point conversion is.
    pub fn precision(&self) -> Option<usize> {
        let p = self.get_defined("precision")?;
        let p = match p {
            ArgValue::Str(s) => s.trim().parse::<f64>().ok()?,
            other => other.as_f64()?,
        };
        if p.is_nan() {
            return None;
        }
        Some(p.clamp(0.0, 100.0) as usize)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get_defined(name)
            .and_then(ArgValue::as_bool)
            .unwrap_or(false)
    }
}

impl Serialize for Options {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k.as_ref(), v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_defined_wins() {
        let a = Options::new().with("a", 1);
        let b = Options::new().with("a", 2).with("b", 3);
        let merged = Options::merge([&a, &b]);
        assert_eq!(merged, Options::new().with("a", 1).with("b", 3));
    }

    #[test]
    fn null_does_not_block_later_donor() {
        let a = Options::new().with("precision", ArgValue::Null);
        let b = Options::new().with("precision", 2);
        let merged = Options::merge([&a, &b]);
        assert_eq!(merged.precision(), Some(2));
    }

    #[test]
    fn null_donor_never_overrides() {
        let a = Options::new().with("separator", ",");
        let b = Options::new().with("separator", ArgValue::Null);
        let merged = Options::merge([&a, &b]);
        assert_eq!(merged.str_value("separator"), Some(","));
    }

    #[test]
    fn count_must_be_numeric() {
        assert_eq!(Options::new().with("count", 3).count(), Some(3.0));
        assert_eq!(Options::new().with("count", 2.5).count(), Some(2.5));
        assert_eq!(Options::new().with("count", "3").count(), None);
    }

    #[test]
    fn display_matches_script_number_formatting() {
        assert_eq!(ArgValue::Float(5.0).to_string(), "5");
        assert_eq!(ArgValue::Float(1.5).to_string(), "1.5");
        assert_eq!(ArgValue::Int(-3).to_string(), "-3");
        assert_eq!(ArgValue::Float(f64::INFINITY).to_string(), "Infinity");
    }

    #[test]
    fn serializes_as_json_object() {
        let opts = Options::new().with("name", "Ann").with("count", 2);
        assert_eq!(
            serde_json::to_string(&opts).unwrap(),
            r#"{"name":"Ann","count":2}"#
        );
    }
}
