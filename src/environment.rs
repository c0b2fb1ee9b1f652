//! The scoped value environment threaded through a (sub)tree's execution.

use crate::value_item::{OverridePolicy, ValueItem, ValueItemMap};

/// A `ValueItemMap` snapshot plus an optional parent used only for
/// read-through of free variables not defined locally. Writes always target
/// the local layer.
///
/// Parent chains are used for same-thread nested scopes (loop-iteration
/// variable binding, subtree call frames). Tasks handed to the worker pool
/// instead carry a flattened [`Environment::snapshot`] with no parent, since
/// a parent-chain borrow cannot cross the thread boundary a queued task
/// runs on — each task owns its own environment snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    local: ValueItemMap,
    parent: Option<Box<Environment>>,
}

impl Environment {
    /// A fresh, parentless environment.
    #[must_use]
    pub fn new() -> Self {
        Environment::default()
    }

    /// A fresh environment seeded from a flat `ValueItemMap`, e.g. a queue
    /// task's `inputs_snapshot`.
    #[must_use]
    pub fn from_map(local: ValueItemMap) -> Self {
        Environment { local, parent: None }
    }

    /// A child scope binding one additional name (e.g. a `ForEach`/`For`
    /// loop variable) on top of `self`, without mutating `self`.
    #[must_use]
    pub fn child_with(&self, name: impl Into<String>, item: ValueItem) -> Environment {
        let mut local = ValueItemMap::new();
        local.insert(name, item);
        Environment {
            local,
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Read a name, falling through to the parent chain if it is not bound
    /// locally.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ValueItem> {
        self.local
            .get(name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.get(name)))
    }

    /// `true` if `name` resolves anywhere in the scope chain.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Write into the local layer, shadowing (but not mutating) any parent
    /// binding of the same name.
    pub fn set(&mut self, name: impl Into<String>, item: ValueItem) {
        self.local.insert(name, item);
    }

    /// Fold `src` into the local layer under `policy`.
    pub fn merge_from(&mut self, src: &ValueItemMap, policy: OverridePolicy) {
        self.local.merge_from(src, policy);
    }

    /// Flatten the whole scope chain into one `ValueItemMap` (parent
    /// entries first, local entries overriding) — used to build a task's
    /// `inputs_snapshot` before it crosses the worker-pool thread boundary.
    #[must_use]
    pub fn snapshot(&self) -> ValueItemMap {
        let mut flat = match &self.parent {
            Some(parent) => parent.snapshot(),
            None => ValueItemMap::new(),
        };
        flat.merge_from(&self.local, OverridePolicy::All);
        flat
    }

    /// Borrow the local layer directly (e.g. for `checkInput` against the
    /// values supplied at a call site, which only ever inspects the local
    /// layer of the caller's environment).
    #[must_use]
    pub fn local(&self) -> &ValueItemMap {
        &self.local
    }
}

impl From<ValueItemMap> for Environment {
    fn from(map: ValueItemMap) -> Self {
        Environment::from_map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn child_reads_through_to_parent() {
        let mut parent = Environment::new();
        parent.set("x", ValueItem::input(Value::Integer(1)));
        let child = parent.child_with("i", ValueItem::input(Value::Integer(0)));
        assert!(child.get("x").is_some());
        assert!(child.get("i").is_some());
    }

    #[test]
    fn writes_never_touch_parent() {
        let mut parent = Environment::new();
        parent.set("x", ValueItem::input(Value::Integer(1)));
        let mut child = parent.child_with("i", ValueItem::input(Value::Integer(0)));
        child.set("x", ValueItem::input(Value::Integer(99)));
        assert_eq!(
            parent.get("x").unwrap().expression,
            crate::value_item::Expression::Literal(Value::Integer(1))
        );
        assert_eq!(
            child.get("x").unwrap().expression,
            crate::value_item::Expression::Literal(Value::Integer(99))
        );
    }

    #[test]
    fn snapshot_flattens_scope_chain() {
        let mut parent = Environment::new();
        parent.set("x", ValueItem::input(Value::Integer(1)));
        let child = parent.child_with("i", ValueItem::input(Value::Integer(7)));
        let flat = child.snapshot();
        assert!(flat.contains("x"));
        assert!(flat.contains("i"));
    }
}
