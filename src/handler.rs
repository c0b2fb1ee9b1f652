//! The handler ("blossom") contract and the two-level handler registry.

use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Declared shape of one handler input.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    /// Whether the tree author must supply this input.
    pub required: bool,
    /// Declared type name, opaque to the core (validated by the validator
    /// collaborator, not here).
    pub type_name: String,
    /// Default value used when the input is not supplied and not required.
    pub default: Option<Value>,
}

/// A handler's declared input/output contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerSchema {
    /// Declared inputs by name.
    pub inputs: BTreeMap<String, InputSpec>,
    /// Declared outputs by name, mapped to their declared type name.
    pub outputs: BTreeMap<String, String>,
}

/// What a handler's `run` returns.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Whether the handler considers its invocation successful.
    pub success: bool,
    /// Output fields, present regardless of `success` (empty object on
    /// failure by convention).
    pub outputs: Value,
    /// Empty on success; the handler's own failure description otherwise.
    pub message: String,
}

impl RunOutcome {
    /// Build a successful outcome from an object value.
    #[must_use]
    pub fn success(outputs: Value) -> Self {
        RunOutcome {
            success: true,
            outputs,
            message: String::new(),
        }
    }

    /// Build a failed outcome with the given message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        RunOutcome {
            success: false,
            outputs: Value::object(Vec::new()),
            message: message.into(),
        }
    }
}

/// A native handler the host application contributes. Implementations must
/// not retain references to their `inputs` beyond the call and must treat
/// `outputs` as transferred ownership.
pub trait Blossom: Send + Sync {
    /// This handler's declared input/output contract.
    fn schema(&self) -> HandlerSchema;

    /// Run synchronously against an assembled inputs object.
    fn run(&self, inputs: Value) -> RunOutcome;
}

impl fmt::Debug for dyn Blossom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blossom({:?})", self.schema())
    }
}

/// Two-level `group -> (name -> handler)` mapping.
///
/// Reads (handler dispatch from any worker thread) vastly outnumber writes
/// (registration, always serialized behind the facade lock), so this uses
/// an `RwLock` rather than the plain `Mutex` the garden uses for its
/// coarser, infrequent mutation lock.
#[derive(Default)]
pub struct HandlerRegistry {
    groups: RwLock<BTreeMap<String, BTreeMap<String, Arc<dyn Blossom>>>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = self.groups.read().expect("handler registry lock poisoned");
        f.debug_struct("HandlerRegistry")
            .field("groups", &groups.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HandlerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        HandlerRegistry::default()
    }

    /// Register a handler under `(group, name)`. Returns `false` — and
    /// leaves the registry unchanged — if the pair is already bound; a
    /// prior registration is never silently replaced.
    pub fn add_blossom(
        &self,
        group: impl Into<String>,
        name: impl Into<String>,
        handler: Arc<dyn Blossom>,
    ) -> bool {
        let group = group.into();
        let name = name.into();
        let mut groups = self.groups.write().expect("handler registry lock poisoned");
        let entry = groups.entry(group).or_default();
        if entry.contains_key(&name) {
            return false;
        }
        entry.insert(name, handler);
        true
    }

    /// Fetch a registered handler, if any.
    #[must_use]
    pub fn get_blossom(&self, group: &str, name: &str) -> Option<Arc<dyn Blossom>> {
        let groups = self.groups.read().expect("handler registry lock poisoned");
        groups.get(group).and_then(|g| g.get(name)).cloned()
    }

    /// The bare existence predicate.
    #[must_use]
    pub fn does_blossom_exist(&self, group: &str, name: &str) -> bool {
        self.get_blossom(group, name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;
    impl Blossom for Echo {
        fn schema(&self) -> HandlerSchema {
            HandlerSchema::default()
        }
        fn run(&self, inputs: Value) -> RunOutcome {
            RunOutcome::success(inputs)
        }
    }

    #[test]
    fn add_blossom_succeeds_once_and_fails_on_duplicate() {
        let registry = HandlerRegistry::new();
        assert!(registry.add_blossom("std", "echo", Arc::new(Echo)));
        assert!(!registry.add_blossom("std", "echo", Arc::new(Echo)));
        assert!(registry.does_blossom_exist("std", "echo"));
    }

    #[test]
    fn duplicate_registration_leaves_registry_unchanged() {
        let registry = HandlerRegistry::new();
        registry.add_blossom("std", "echo", Arc::new(Echo));
        let before = registry.get_blossom("std", "echo").is_some();
        registry.add_blossom("std", "echo", Arc::new(Echo));
        let after = registry.get_blossom("std", "echo").is_some();
        assert_eq!(before, after);
    }

    #[test]
    fn unregistered_pair_is_absent() {
        let registry = HandlerRegistry::new();
        assert!(!registry.does_blossom_exist("nope", "nope"));
        assert!(registry.get_blossom("nope", "nope").is_none());
    }
}
