//! Typed locale trees.
//!
//! Documents are keyed by locale code, then by namespace. Each mapping is
//! classified once at load time: a mapping whose keys are all plural
//! categories (or numerals) and whose values are all strings becomes a
//! [`Node::Plural`]; any other mapping is a [`Node::Scope`].

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::locale::normalize_locale;
use crate::options::{ArgValue, Options};
use crate::plural::PluralCategory;
use crate::I18nError;

const MAX_TREE_ENTRIES: usize = 100_000;
const MAX_KEY_BYTES: usize = 128;
const MAX_VALUE_BYTES: usize = 16 * 1024;
const MAX_DEPTH: usize = 64;

/// One node of a locale tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Text(String),
    Number(f64),
    Bool(bool),
    Plural(PluralBranch),
    Scope(BTreeMap<String, Node>),
}

/// Plural variants keyed by category name (`one`, `other`, `"0"`, ...).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PluralBranch {
    forms: BTreeMap<String, Node>,
}

impl PluralBranch {
    pub fn new<K, V>(forms: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            forms: forms
                .into_iter()
                .map(|(k, v)| (k.into(), Node::Text(v.into())))
                .collect(),
        }
    }

    pub fn get(&self, category: &PluralCategory) -> Option<&str> {
        self.forms.get(&category.key()).and_then(Node::as_text)
    }

    /// First candidate present in the branch, then `other`.
    pub fn select(&self, candidates: &[PluralCategory]) -> Option<&str> {
        candidates
            .iter()
            .find_map(|c| self.get(c))
            .or_else(|| self.get(&PluralCategory::Other))
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn plural<K: Into<String>, V: Into<String>>(
        forms: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self::Plural(PluralBranch::new(forms))
    }

    pub fn scope<K: Into<String>>(children: impl IntoIterator<Item = (K, Node)>) -> Self {
        Self::Scope(children.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Descend one segment. Plural members are addressable too
    /// (`topics.count.one`).
    pub fn child(&self, segment: &str) -> Option<&Node> {
        match self {
            Self::Scope(children) => children.get(segment),
            Self::Plural(branch) => branch.forms.get(segment),
            _ => None,
        }
    }

    /// Walk `segments` from this node, stopping at the first miss.
    pub fn walk<'a, I>(&self, segments: I) -> Option<&Node>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut node = self;
        for seg in segments {
            node = node.child(seg)?;
        }
        Some(node)
    }

    /// Scalar children of a scope as an options bag (`number.format` etc.).
    pub fn to_options(&self) -> Options {
        let mut out = Options::new();
        if let Self::Scope(children) = self {
            for (k, v) in children {
                let value = match v {
                    Self::Text(s) => ArgValue::Str(s.clone()),
                    Self::Bool(b) => ArgValue::Bool(*b),
                    Self::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                        ArgValue::Int(*n as i64)
                    }
                    Self::Number(n) => ArgValue::Float(*n),
                    _ => continue,
                };
                out.set(k.clone(), value);
            }
        }
        out
    }

    fn classify(children: BTreeMap<String, Node>) -> Self {
        let is_branch = !children.is_empty()
            && children
                .iter()
                .all(|(k, v)| PluralCategory::is_branch_key(k) && matches!(v, Node::Text(_)));
        if is_branch {
            Self::Plural(PluralBranch { forms: children })
        } else {
            Self::Scope(children)
        }
    }
}

/// Locale code -> root node, plus the flatter per-locale extras trees.
#[derive(Clone, Debug, Default)]
pub struct LocaleTree {
    locales: FxHashMap<String, Node>,
    extras: FxHashMap<String, Node>,
}

impl LocaleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tree for `locale`. No merge with a previous load.
    pub fn insert_locale(&mut self, locale: &str, root: Node) {
        self.locales.insert(normalize_locale(locale), root);
    }

    pub fn insert_extras(&mut self, locale: &str, root: Node) {
        self.extras.insert(normalize_locale(locale), root);
    }

    pub fn root(&self, locale: &str) -> Option<&Node> {
        self.locales.get(&normalize_locale(locale))
    }

    pub fn extras(&self, locale: &str) -> Option<&Node> {
        self.extras.get(&normalize_locale(locale))
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.locales.keys().map(String::as_str)
    }

    pub fn from_json_str(src: &str) -> Result<Self, I18nError> {
        let mut tree = Self::new();
        tree.load_json_str(src)?;
        Ok(tree)
    }

    /// Load a `{ "<locale>": { ... } }` JSON document.
    pub fn load_json_str(&mut self, src: &str) -> Result<(), I18nError> {
        for (locale, root) in parse_json_document(src)? {
            self.insert_locale(&locale, root);
        }
        Ok(())
    }

    pub fn load_extras_json_str(&mut self, src: &str) -> Result<(), I18nError> {
        for (locale, root) in parse_json_document(src)? {
            self.insert_extras(&locale, root);
        }
        Ok(())
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(src: &str) -> Result<Self, I18nError> {
        let mut tree = Self::new();
        tree.load_yaml_str(src)?;
        Ok(tree)
    }

    /// Load a `<locale>: { ... }` YAML document.
    #[cfg(feature = "yaml")]
    pub fn load_yaml_str(&mut self, src: &str) -> Result<(), I18nError> {
        for (locale, root) in parse_yaml_document(src)? {
            self.insert_locale(&locale, root);
        }
        Ok(())
    }

    #[cfg(feature = "yaml")]
    pub fn load_extras_yaml_str(&mut self, src: &str) -> Result<(), I18nError> {
        for (locale, root) in parse_yaml_document(src)? {
            self.insert_extras(&locale, root);
        }
        Ok(())
    }
}

#[derive(Default)]
struct Budget {
    entries: usize,
}

impl Budget {
    fn take(&mut self) -> Result<(), I18nError> {
        self.entries += 1;
        if self.entries > MAX_TREE_ENTRIES {
            return Err(I18nError::InvalidTree(format!(
                "too many entries (max {MAX_TREE_ENTRIES})"
            )));
        }
        Ok(())
    }
}

fn check_key(key: &str) -> Result<(), I18nError> {
    if key.is_empty() {
        return Err(I18nError::InvalidTree("empty key".to_string()));
    }
    if key.contains('.') {
        return Err(I18nError::InvalidTree(format!(
            "key `{key}` must not contain `.`"
        )));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(I18nError::InvalidTree(format!(
            "key `{key}` is too long (max {MAX_KEY_BYTES} bytes)"
        )));
    }
    Ok(())
}

fn check_text(path: &str, s: &str) -> Result<(), I18nError> {
    if s.len() > MAX_VALUE_BYTES {
        return Err(I18nError::InvalidTree(format!(
            "value at `{path}` is too long (max {MAX_VALUE_BYTES} bytes)"
        )));
    }
    Ok(())
}

fn check_depth(path: &str, depth: usize) -> Result<(), I18nError> {
    if depth > MAX_DEPTH {
        return Err(I18nError::InvalidTree(format!(
            "`{path}` is nested too deeply (max {MAX_DEPTH})"
        )));
    }
    Ok(())
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn parse_json_document(src: &str) -> Result<Vec<(String, Node)>, I18nError> {
    let serde_json::Value::Object(raw) = serde_json::from_str::<serde_json::Value>(src)? else {
        return Err(I18nError::InvalidTree(
            "top level must be a mapping of locale codes".to_string(),
        ));
    };
    let mut budget = Budget::default();
    let mut out = Vec::with_capacity(raw.len());
    for (locale, v) in raw {
        if let Some(node) = json_to_node(&locale, v, 1, &mut budget)? {
            out.push((locale, node));
        }
    }
    Ok(out)
}

fn json_to_node(
    path: &str,
    v: serde_json::Value,
    depth: usize,
    budget: &mut Budget,
) -> Result<Option<Node>, I18nError> {
    use serde_json::Value;

    check_depth(path, depth)?;
    let node = match v {
        Value::Null => return Ok(None),
        Value::Bool(b) => Node::Bool(b),
        Value::Number(n) => Node::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => {
            check_text(path, &s)?;
            Node::Text(s)
        }
        Value::Array(items) => {
            let mut children = BTreeMap::new();
            for (idx, item) in items.into_iter().enumerate() {
                let key = idx.to_string();
                let child_path = join_path(path, &key);
                if let Some(child) = json_to_node(&child_path, item, depth + 1, budget)? {
                    children.insert(key, child);
                }
            }
            return Ok(Some(Node::Scope(children)));
        }
        Value::Object(map) => {
            let mut children = BTreeMap::new();
            for (key, item) in map {
                check_key(&key)?;
                let child_path = join_path(path, &key);
                if let Some(child) = json_to_node(&child_path, item, depth + 1, budget)? {
                    children.insert(key, child);
                }
            }
            return Ok(Some(Node::classify(children)));
        }
    };
    budget.take()?;
    Ok(Some(node))
}

#[cfg(feature = "yaml")]
fn parse_yaml_document(src: &str) -> Result<Vec<(String, Node)>, I18nError> {
    let serde_yaml::Value::Mapping(raw) = serde_yaml::from_str::<serde_yaml::Value>(src)? else {
        return Err(I18nError::InvalidTree(
            "top level must be a mapping of locale codes".to_string(),
        ));
    };
    let mut budget = Budget::default();
    let mut out = Vec::with_capacity(raw.len());
    for (k, v) in raw {
        let locale = yaml_key(&k)?;
        if let Some(node) = yaml_to_node(&locale, v, 1, &mut budget)? {
            out.push((locale, node));
        }
    }
    Ok(out)
}

#[cfg(feature = "yaml")]
fn yaml_key(k: &serde_yaml::Value) -> Result<String, I18nError> {
    match k {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        // `0: "no topics"` is a numeral plural key.
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        _ => Err(I18nError::InvalidTree(
            "yaml keys must be strings".to_string(),
        )),
    }
}

#[cfg(feature = "yaml")]
fn yaml_to_node(
    path: &str,
    v: serde_yaml::Value,
    depth: usize,
    budget: &mut Budget,
) -> Result<Option<Node>, I18nError> {
    use serde_yaml::Value;

    check_depth(path, depth)?;
    let node = match v {
        Value::Null => return Ok(None),
        Value::Bool(b) => Node::Bool(b),
        Value::Number(n) => Node::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => {
            check_text(path, &s)?;
            Node::Text(s)
        }
        Value::Sequence(items) => {
            let mut children = BTreeMap::new();
            for (idx, item) in items.into_iter().enumerate() {
                let key = idx.to_string();
                let child_path = join_path(path, &key);
                if let Some(child) = yaml_to_node(&child_path, item, depth + 1, budget)? {
                    children.insert(key, child);
                }
            }
            return Ok(Some(Node::Scope(children)));
        }
        Value::Mapping(map) => {
            let mut children = BTreeMap::new();
            for (k, item) in map {
                let key = yaml_key(&k)?;
                check_key(&key)?;
                let child_path = join_path(path, &key);
                if let Some(child) = yaml_to_node(&child_path, item, depth + 1, budget)? {
                    children.insert(key, child);
                }
            }
            return Ok(Some(Node::classify(children)));
        }
        Value::Tagged(tagged) => return yaml_to_node(path, tagged.value, depth, budget),
    };
    budget.take()?;
    Ok(Some(node))
}
