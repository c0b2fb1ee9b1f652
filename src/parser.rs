//! Tree source parsing: the other external seam. The parser consumes source
//! text and produces the tree AST; the core only ever consumes AST nodes.
//!
//! Mirrors `crate::eval`'s shape exactly: a trait the facade calls through,
//! plus one default implementation sufficient to load this crate's worked
//! scenarios and its own tests. A real Sakura grammar is an external
//! collaborator; the default here treats tree source as its own JSON
//! serialization of [`Tree`] rather than inventing a second concrete syntax
//! for the core to own.

use crate::ast::Tree;
use crate::error::SakuraError;
use crate::error::SakuraResult;

/// The parsing seam. `id` is the id `addTree`/`readFiles` was called with,
/// if any; implementations that derive ids from source content may ignore
/// it.
pub trait Parser: Send + Sync {
    /// Parse `source` into a [`Tree`].
    ///
    /// # Errors
    ///
    /// Returns [`SakuraError::Parse`] on malformed source.
    fn parse(&self, id: Option<&str>, source: &str) -> SakuraResult<Tree>;
}

/// The default `Parser`: tree source is a JSON document deserializing
/// directly into a [`Tree`], treated as opaque to the core. `id`, if
/// supplied, overrides the document's own `id` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTreeParser;

impl Parser for JsonTreeParser {
    fn parse(&self, id: Option<&str>, source: &str) -> SakuraResult<Tree> {
        let mut tree: Tree = serde_json::from_str(source).map_err(|err| SakuraError::Parse {
            tree_id: id.unwrap_or("<unknown>").to_string(),
            message: err.to_string(),
        })?;
        if let Some(id) = id {
            tree.id = id.to_string();
        }
        Ok(tree)
    }
}
