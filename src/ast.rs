//! The AST node model: one tagged variant per executable construct.
//! Owned by the [`crate::garden::Garden`] once parsed; per-invocation
//! execution clones the subtree being run so that mutable result fields
//! (notably [`Leaf::result`]) never alias a shared tree.

use crate::error::Hierarchy;
use crate::value::Value;
use crate::value_item::ValueItem;
use crate::value_item::ValueItemMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Comparison operator for an `If` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Evaluate `ordering` against this operator.
    #[must_use]
    pub fn matches(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            CompareOp::Eq => ordering == Equal,
            CompareOp::Ne => ordering != Equal,
            CompareOp::Lt => ordering == Less,
            CompareOp::Le => ordering != Greater,
            CompareOp::Gt => ordering == Greater,
            CompareOp::Ge => ordering != Less,
        }
    }
}

/// Populated by the interpreter after a leaf is dispatched; source form
/// carries only the schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeafResult {
    /// Whether the handler reported success.
    pub success: bool,
    /// The handler's message (empty on success, its failure reason
    /// otherwise).
    pub message: String,
    /// The value the leaf produced, for callers that want the raw handler
    /// output rather than just the merged environment.
    pub produced: Value,
}

/// A leaf step invoking a native handler ("blossom").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    /// Handler group.
    pub group: String,
    /// Handler name.
    pub name: String,
    /// Breadcrumb of enclosing node names, outermost first.
    pub hierarchy: Hierarchy,
    /// Declared input expressions, evaluated against the environment before
    /// dispatch.
    pub inputs: ValueItemMap,
    /// Name to bind the handler's primary output under, if any.
    pub output_target: Option<String>,
    /// Populated by the interpreter after dispatch.
    pub result: LeafResult,
}

impl Leaf {
    /// Construct a leaf with no inputs and no declared output target, for
    /// building trees by hand in tests.
    #[must_use]
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Leaf {
            group: group.into(),
            name: name.into(),
            hierarchy: Vec::new(),
            inputs: ValueItemMap::new(),
            output_target: None,
            result: LeafResult::default(),
        }
    }

    /// Builder: attach a declared input.
    #[must_use]
    pub fn with_input(mut self, name: impl Into<String>, item: ValueItem) -> Self {
        self.inputs.insert(name, item);
        self
    }
}

/// A named group of leaves sharing one hierarchy prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier.
    pub id: String,
    /// Group type tag (opaque to the core, carried for diagnostics).
    pub group_type: String,
    /// Breadcrumb prefix prepended to each child's hierarchy.
    pub hierarchy: Hierarchy,
    /// Children executed in declared order.
    pub children: Vec<Leaf>,
}

/// Children executed left to right against the same environment, aborting
/// on first error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequential {
    /// Children in declared order.
    pub children: Vec<Node>,
}

/// A subtree scheduled through the work queue and joined with a barrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parallel {
    /// The node to fan out — typically a [`Sequential`] whose own elements
    /// become the individually-scheduled tasks.
    pub child: Box<Node>,
}

/// A two-way branch on a type-aware comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct If {
    /// Left comparison operand.
    pub lhs: ValueItem,
    /// Comparison operator.
    pub op: CompareOp,
    /// Right comparison operand.
    pub rhs: ValueItem,
    /// Executed when the comparison holds.
    pub then_branch: Box<Node>,
    /// Executed when the comparison does not hold, if present.
    pub else_branch: Option<Box<Node>>,
}

/// Iterate over an array, optionally in parallel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForEach {
    /// Name the current element is bound to inside `body`.
    pub var_name: String,
    /// Expression map whose single entry must evaluate to an array; a map
    /// rather than a bare `ValueItem` so the same declared-input machinery
    /// used elsewhere also names this expression.
    pub iterable: ValueItemMap,
    /// Schedule each iteration as a separate queued task.
    pub parallel: bool,
    /// Executed once per element.
    pub body: Box<Node>,
}

/// Iterate over an inclusive integer range, optionally in parallel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct For {
    /// Name the current integer is bound to inside `body`.
    pub var_name: String,
    /// Range start, inclusive.
    pub start: ValueItem,
    /// Range end, inclusive.
    pub end: ValueItem,
    /// Schedule each iteration as a separate queued task.
    pub parallel: bool,
    /// Executed once per integer in the range.
    pub body: Box<Node>,
}

/// A reference to another tree or subtree by id or relative path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtreeRef {
    /// Id or relative path to resolve in the garden.
    pub name_or_path: String,
    /// Per-subtree-id input overrides applied before the call.
    pub internal_overrides: BTreeMap<String, ValueItemMap>,
}

/// A complete, named tree: the unit the garden stores and the facade
/// triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Stable identifier.
    pub id: String,
    /// Path relative to the root used to load this tree.
    pub relative_path: String,
    /// Root path all of this tree's relative file references resolve
    /// against.
    pub root_path: String,
    /// The tree's executable body.
    pub body: Box<Node>,
    /// Declared call-site inputs; `checkInput` is run against these.
    pub declared_inputs: ValueItemMap,
}

/// One executable construct. Deeply cloneable: per-invocation execution
/// clones whichever subtree it is about to mutate result fields on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// A leaf blossom invocation.
    Leaf(Leaf),
    /// A group of leaves under one hierarchy prefix.
    Group(Group),
    /// Sequential composition.
    Sequential(Sequential),
    /// Parallel fan-out.
    Parallel(Parallel),
    /// Conditional branch.
    If(If),
    /// Array iteration.
    ForEach(ForEach),
    /// Integer-range iteration.
    For(For),
    /// A reference to another tree.
    SubtreeRef(SubtreeRef),
    /// A whole named tree.
    Tree(Tree),
}

impl Node {
    /// A short, human-readable hierarchy breadcrumb for this node, used
    /// only for logging — never by control flow.
    #[must_use]
    pub fn describe_hierarchy(&self) -> String {
        let hierarchy: &[String] = match self {
            Node::Leaf(leaf) => &leaf.hierarchy,
            Node::Group(group) => &group.hierarchy,
            _ => &[],
        };
        hierarchy.join(" -> ")
    }

    /// Convenience constructor for building trees by hand in tests.
    #[must_use]
    pub fn sequential(children: Vec<Node>) -> Node {
        Node::Sequential(Sequential { children })
    }

    /// Convenience constructor for building trees by hand in tests.
    #[must_use]
    pub fn parallel(child: Node) -> Node {
        Node::Parallel(Parallel {
            child: Box::new(child),
        })
    }
}
