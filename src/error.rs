//! Error kinds for the Sakura execution core.
//!
//! Every error the interpreter, queue, or facade can raise is one of a
//! handful of kinds. Each variant carries enough context (tree id, hierarchy
//! breadcrumb, handler group/name) to format a plain message while staying
//! structured for callers that want to match on kind.

use thiserror::Error;

/// The hierarchy breadcrumb threaded through dispatch for diagnostics: a
/// list of enclosing node names, outermost first.
pub type Hierarchy = Vec<String>;

fn format_hierarchy(hierarchy: &[String]) -> String {
    hierarchy.join(" -> ")
}

/// Unified error type for the execution core.
#[derive(Debug, Error)]
pub enum SakuraError {
    /// Surfaced verbatim from the parser collaborator (out of scope here).
    #[error("parse error in {tree_id}: {message}")]
    Parse {
        /// Id of the tree source that failed to parse.
        tree_id: String,
        /// Parser-supplied message.
        message: String,
    },

    /// Unknown handler reference, duplicate declared input, or a type
    /// mismatch against a handler's declared schema.
    #[error("validation error at {}: {message}", format_hierarchy(.hierarchy))]
    Validation {
        /// Breadcrumb of enclosing node names.
        hierarchy: Hierarchy,
        /// Human-readable description.
        message: String,
    },

    /// Unresolved name, type mismatch in comparison, or a non-array
    /// iterable handed to a loop.
    #[error("evaluation error at {}: {message}", format_hierarchy(.hierarchy))]
    Eval {
        /// Breadcrumb of enclosing node names.
        hierarchy: Hierarchy,
        /// Human-readable description.
        message: String,
    },

    /// `success = false` returned from a handler's `run`.
    #[error("handler {group}.{name} failed at {}: {message}", format_hierarchy(.hierarchy))]
    Handler {
        /// Handler group.
        group: String,
        /// Handler name.
        name: String,
        /// Breadcrumb of enclosing node names.
        hierarchy: Hierarchy,
        /// The handler's own failure message.
        message: String,
    },

    /// Deadlock detected (nested parallel fan-out exhausting the pool, if
    /// enforced) or shutdown observed mid-execution.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// The first error captured by a parallel batch's barrier, re-surfaced
    /// to the spawner once the batch has fully drained. The original kind
    /// (`Eval`, `Handler`, ...) is collapsed to its message.
    #[error("parallel batch failed at {}: {message}", format_hierarchy(.hierarchy))]
    Batch {
        /// Breadcrumb of enclosing node names.
        hierarchy: Hierarchy,
        /// The first sibling error's message.
        message: String,
    },

    /// Raised when a leaf names a `(group, name)` pair with no registered
    /// handler.
    #[error("no handler registered for {group}.{name}")]
    UnknownHandler {
        /// Handler group.
        group: String,
        /// Handler name.
        name: String,
    },

    /// A tree or subtree reference could not be resolved in the garden.
    #[error("no tree found for id or path {0}")]
    UnknownTree(String),

    /// From file/template loaders.
    #[error("io error: {0}")]
    Io(String),
}

impl SakuraError {
    /// Borrow the hierarchy breadcrumb, if this variant carries one.
    #[must_use]
    pub fn hierarchy(&self) -> Option<&[String]> {
        match self {
            SakuraError::Validation { hierarchy, .. }
            | SakuraError::Eval { hierarchy, .. }
            | SakuraError::Handler { hierarchy, .. } => Some(hierarchy),
            _ => None,
        }
    }

    /// The plain message a caller passes back through the facade's
    /// `errorMessage` out-parameter equivalent (a `Result::Err` string).
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<std::io::Error> for SakuraError {
    fn from(err: std::io::Error) -> Self {
        SakuraError::Io(err.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type SakuraResult<T> = Result<T, SakuraError>;
