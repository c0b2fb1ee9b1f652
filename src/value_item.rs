//! `ValueItem`, `ValueItemMap`, and the override-merge policies used to
//! fold one value map into another.

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Whether a `ValueItem` is declared as a handler input, a handler output,
/// or a comparison operand (`If.lhs` / `If.rhs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueItemKind {
    /// Declared as a handler input.
    Input,
    /// Declared as a handler output.
    Output,
    /// Used as an `If` comparison operand.
    Compare,
}

/// Whether a `ValueItem`'s expression was supplied explicitly by the tree
/// author or filled in as a declared default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueItemFlag {
    /// The tree author supplied this value explicitly.
    Assigned,
    /// This value came from a declared default, not the call site.
    Default,
}

/// An expression as carried by a `ValueItem`: a literal, a name reference
/// into the environment, or a template string resolved at evaluation time.
///
/// Expression *evaluation* is out of scope for this crate; this enum only
/// carries enough structure for the default `Evaluator` (`crate::eval`) to
/// do something useful and for embedders to plug in a real expression
/// language against the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// A literal value, independent of any environment.
    Literal(Value),
    /// A bare reference to a name in the environment.
    Reference(String),
    /// A template string containing zero or more `{{ name }}` placeholders.
    Template(String),
}

/// One entry in a `ValueItemMap`: an expression plus the metadata the
/// interpreter and validator need around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueItem {
    /// The expression to evaluate.
    pub expression: Expression,
    /// Input, output, or compare.
    pub kind: ValueItemKind,
    /// Assigned explicitly, or filled in as a default.
    pub flag: ValueItemFlag,
}

impl ValueItem {
    /// Construct an `Input`/`Assigned` item from a literal value — the
    /// common case in hand-built trees and tests.
    #[must_use]
    pub fn input(value: impl Into<Value>) -> Self {
        ValueItem {
            expression: Expression::Literal(value.into()),
            kind: ValueItemKind::Input,
            flag: ValueItemFlag::Assigned,
        }
    }

    /// Construct an `Output`/`Assigned` item naming a declared output.
    #[must_use]
    pub fn output() -> Self {
        ValueItem {
            expression: Expression::Literal(Value::Null),
            kind: ValueItemKind::Output,
            flag: ValueItemFlag::Assigned,
        }
    }

    /// Construct a reference expression item (e.g. an `If` operand reading
    /// a name out of the environment).
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        ValueItem {
            expression: Expression::Reference(name.into()),
            kind: ValueItemKind::Compare,
            flag: ValueItemFlag::Assigned,
        }
    }

    /// Construct a template expression item.
    #[must_use]
    pub fn template(text: impl Into<String>) -> Self {
        ValueItem {
            expression: Expression::Template(text.into()),
            kind: ValueItemKind::Input,
            flag: ValueItemFlag::Assigned,
        }
    }
}

/// An ordered `name -> ValueItem` mapping. Insertion order is preserved and
/// governs evaluation order where a handler declares a positional schema.
///
/// Backed by a plain `Vec` rather than an indexed map crate: these maps are
/// small (a handful of declared inputs/outputs per leaf) and the only
/// operations that matter are ordered iteration and overwrite-by-name, both
/// of which a linear scan handles without adding a dependency the rest of
/// the teacher's stack doesn't already carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueItemMap {
    entries: Vec<(String, ValueItem)>,
}

/// The three merge policies for folding one `ValueItemMap` into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverridePolicy {
    /// Every `src` entry replaces the `dst` entry unconditionally,
    /// inserting new keys as needed.
    All,
    /// `src[k]` replaces `dst[k]` only if `k` already exists in `dst`.
    OnlyExisting,
    /// `src[k]` is inserted into `dst` only if `k` is absent from `dst`.
    OnlyNonExisting,
}

impl ValueItemMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        ValueItemMap::default()
    }

    /// Insert or overwrite an entry, preserving its original position on
    /// overwrite and appending on first insertion.
    pub fn insert(&mut self, name: impl Into<String>, item: ValueItem) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = item;
        } else {
            self.entries.push((name, item));
        }
    }

    /// Look up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ValueItem> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// `true` if `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// Remove an entry by name, if present.
    pub fn remove(&mut self, name: &str) -> Option<ValueItem> {
        let index = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueItem)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if this map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold `src` into `self` under the given policy.
    pub fn merge_from(&mut self, src: &ValueItemMap, policy: OverridePolicy) {
        for (name, item) in src.iter() {
            let exists = self.contains(name);
            let should_apply = match policy {
                OverridePolicy::All => true,
                OverridePolicy::OnlyExisting => exists,
                OverridePolicy::OnlyNonExisting => !exists,
            };
            if should_apply {
                self.insert(name, item.clone());
            }
        }
    }
}

impl FromIterator<(String, ValueItem)> for ValueItemMap {
    fn from_iter<T: IntoIterator<Item = (String, ValueItem)>>(iter: T) -> Self {
        let mut map = ValueItemMap::new();
        for (name, item) in iter {
            map.insert(name, item);
        }
        map
    }
}

/// The names in `supplied` that are absent from `declared`. Empty iff every
/// supplied name is declared.
#[must_use]
pub fn check_input(declared: &ValueItemMap, supplied: &ValueItemMap) -> Vec<String> {
    supplied
        .names()
        .filter(|name| !declared.contains(name))
        .map(str::to_string)
        .collect()
}
