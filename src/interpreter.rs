//! The tree-walking dispatcher: one `execute` per [`Node`] variant, the
//! parallel fan-out helpers, and the shared, thread-safe context every
//! worker and the initial caller dispatch through.
//!
//! Leaf and subtree dispatch follow a straightforward evaluate-inputs,
//! invoke-handler, merge-outputs pipeline; parallel batches fan children out
//! through the work queue and join on a barrier. When a nested parallel
//! fan-out would otherwise exhaust the worker pool, the submitting worker
//! runs the batch inline instead of deadlocking on its own queue.

use crate::ast::{CompareOp, For, ForEach, Group, If, Leaf, Node, Parallel, Sequential, SubtreeRef, Tree};
use crate::environment::Environment;
use crate::error::{Hierarchy, SakuraError, SakuraResult};
use crate::eval::Evaluator;
use crate::garden::Garden;
use crate::handler::HandlerRegistry;
use crate::queue::{BatchResults, SubtreeTask, WorkQueue};
use crate::value::Value;
use crate::value_item::{Expression, OverridePolicy, ValueItem, ValueItemFlag, ValueItemKind, ValueItemMap};
use std::cell::Cell;
use std::sync::{Arc, Mutex};

thread_local! {
    static IS_WORKER_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Mark the calling thread as a pool worker. Called once, at the top of
/// [`crate::worker::WorkerPool`]'s per-thread loop — never by the initial,
/// caller-supplied invocation thread.
pub(crate) fn mark_current_thread_as_worker() {
    IS_WORKER_THREAD.with(|flag| flag.set(true));
}

fn is_worker_thread() -> bool {
    IS_WORKER_THREAD.with(Cell::get)
}

/// Everything a dispatch needs that outlives any single invocation: the
/// handler registry, the garden, the pluggable evaluator, and the shared
/// work queue. Wrapped in one `Arc` and handed to every worker thread.
pub struct SharedContext {
    /// Registered trees, templates, and files.
    pub garden: Arc<Garden>,
    /// Registered handlers.
    pub registry: Arc<HandlerRegistry>,
    /// The expression evaluator in use.
    pub evaluator: Arc<dyn Evaluator>,
    /// The bounded FIFO worker threads drain.
    pub queue: WorkQueue,
}

impl SharedContext {
    /// Build a fresh context around a garden, registry, and evaluator; the
    /// queue starts empty and open.
    #[must_use]
    pub fn new(garden: Arc<Garden>, registry: Arc<HandlerRegistry>, evaluator: Arc<dyn Evaluator>) -> Self {
        SharedContext {
            garden,
            registry,
            evaluator,
            queue: WorkQueue::new(),
        }
    }
}

/// A stateless dispatcher bound to one [`SharedContext`] for the lifetime
/// of a single `execute` call tree. Cheap to construct — a worker builds a
/// fresh one per task (`crate::worker::run_task`).
pub struct Interpreter<'a> {
    context: &'a SharedContext,
}

impl<'a> Interpreter<'a> {
    /// Bind a dispatcher to `context`.
    #[must_use]
    pub fn new(context: &'a SharedContext) -> Self {
        Interpreter { context }
    }

    /// Execute `node` against `env`, mutating it in place and populating any
    /// `Leaf::result` fields `node` owns. `hierarchy` is the breadcrumb of
    /// enclosing node names, used only for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns the first `SakuraError` encountered. `Sequential`, `Group`,
    /// and non-parallel loops abort at the failing child, leaving
    /// already-applied side effects in `env`. `Parallel` and parallel loops
    /// merge nothing into `env` unless every sibling succeeds.
    pub fn execute(&self, node: &mut Node, env: &mut Environment, hierarchy: &Hierarchy) -> SakuraResult<()> {
        match node {
            Node::Leaf(leaf) => self.execute_leaf(leaf, env),
            Node::Group(group) => self.execute_group(group, env),
            Node::Sequential(seq) => self.execute_sequential(seq, env, hierarchy),
            Node::Parallel(par) => self.execute_parallel(par, env, hierarchy),
            Node::If(branch) => self.execute_if(branch, env, hierarchy),
            Node::ForEach(for_each) => self.execute_for_each(for_each, env, hierarchy),
            Node::For(for_loop) => self.execute_for(for_loop, env, hierarchy),
            Node::SubtreeRef(subtree_ref) => self.execute_subtree_ref(subtree_ref, env, hierarchy),
            Node::Tree(tree) => self.execute_tree_inline(tree, env, hierarchy),
        }
    }

    fn execute_leaf(&self, leaf: &mut Leaf, env: &mut Environment) -> SakuraResult<()> {
        let handler = self
            .context
            .registry
            .get_blossom(&leaf.group, &leaf.name)
            .ok_or_else(|| SakuraError::UnknownHandler {
                group: leaf.group.clone(),
                name: leaf.name.clone(),
            })?;

        let mut fields = Vec::with_capacity(leaf.inputs.len());
        for (name, item) in leaf.inputs.iter() {
            let value = self.context.evaluator.eval(item, env).map_err(|err| attach_hierarchy(err, &leaf.hierarchy))?;
            fields.push((name.to_string(), value));
        }

        let outcome = handler.run(Value::object(fields));
        leaf.result.success = outcome.success;
        leaf.result.message = outcome.message.clone();
        leaf.result.produced = outcome.outputs.clone();

        if !outcome.success {
            return Err(SakuraError::Handler {
                group: leaf.group.clone(),
                name: leaf.name.clone(),
                hierarchy: leaf.hierarchy.clone(),
                message: outcome.message,
            });
        }

        if let Value::Object(fields) = &outcome.outputs {
            for (name, value) in fields {
                env.set(name.clone(), output_item(value.clone()));
            }
        }
        if let Some(target) = &leaf.output_target {
            env.set(target.clone(), output_item(outcome.outputs));
        }
        Ok(())
    }

    fn execute_group(&self, group: &mut Group, env: &mut Environment) -> SakuraResult<()> {
        for leaf in &mut group.children {
            if leaf.hierarchy.is_empty() {
                leaf.hierarchy = group.hierarchy.clone();
            }
            self.execute_leaf(leaf, env)?;
        }
        Ok(())
    }

    fn execute_sequential(&self, seq: &mut Sequential, env: &mut Environment, hierarchy: &Hierarchy) -> SakuraResult<()> {
        for child in &mut seq.children {
            self.execute(child, env, hierarchy)?;
        }
        Ok(())
    }

    fn execute_parallel(&self, par: &mut Parallel, env: &mut Environment, hierarchy: &Hierarchy) -> SakuraResult<()> {
        let snapshot = env.snapshot();
        let items = match par.child.as_ref() {
            Node::Sequential(seq) => seq.children.iter().map(|child| (child.clone(), snapshot.clone())).collect(),
            other => vec![(other.clone(), snapshot)],
        };
        self.run_parallel_batch(items, hierarchy, env)
    }

    fn execute_if(&self, branch: &mut If, env: &mut Environment, hierarchy: &Hierarchy) -> SakuraResult<()> {
        let lhs = self.context.evaluator.eval(&branch.lhs, env).map_err(|err| attach_hierarchy(err, hierarchy))?;
        let rhs = self.context.evaluator.eval(&branch.rhs, env).map_err(|err| attach_hierarchy(err, hierarchy))?;
        let ordering = lhs.compare(&rhs).map_err(|message| SakuraError::Eval {
            hierarchy: hierarchy.clone(),
            message,
        })?;
        if branch.op.matches(ordering) {
            self.execute(&mut branch.then_branch, env, hierarchy)
        } else if let Some(else_branch) = &mut branch.else_branch {
            self.execute(else_branch, env, hierarchy)
        } else {
            Ok(())
        }
    }

    fn execute_for_each(&self, for_each: &mut ForEach, env: &mut Environment, hierarchy: &Hierarchy) -> SakuraResult<()> {
        let Some((_, iterable_item)) = for_each.iterable.iter().next() else {
            return Err(SakuraError::Eval {
                hierarchy: hierarchy.clone(),
                message: "ForEach requires an iterable expression".to_string(),
            });
        };
        let iterable = self
            .context
            .evaluator
            .eval(iterable_item, env)
            .map_err(|err| attach_hierarchy(err, hierarchy))?;
        let elements = iterable.as_array().ok_or_else(|| SakuraError::Eval {
            hierarchy: hierarchy.clone(),
            message: format!("ForEach iterable must be an array, got {}", iterable.type_name()),
        })?;

        if for_each.parallel {
            let mut items = Vec::with_capacity(elements.len());
            let snapshot = env.snapshot();
            for element in elements {
                let mut inputs = snapshot.clone();
                inputs.insert(for_each.var_name.clone(), ValueItem::input(element.clone()));
                items.push(((*for_each.body).clone(), inputs));
            }
            self.run_parallel_batch(items, hierarchy, env)
        } else {
            for element in elements.to_vec() {
                let mut child = env.child_with(for_each.var_name.clone(), ValueItem::input(element));
                let mut body = (*for_each.body).clone();
                self.execute(&mut body, &mut child, hierarchy)?;
                merge_child_writes(env, &child, &for_each.var_name);
            }
            Ok(())
        }
    }

    fn execute_for(&self, for_loop: &mut For, env: &mut Environment, hierarchy: &Hierarchy) -> SakuraResult<()> {
        let start = self.eval_integer(&for_loop.start, env, hierarchy)?;
        let end = self.eval_integer(&for_loop.end, env, hierarchy)?;
        let step: i64 = if start <= end { 1 } else { -1 };
        let mut values = Vec::new();
        let mut current = start;
        loop {
            values.push(current);
            if current == end {
                break;
            }
            current += step;
        }

        if for_loop.parallel {
            let mut items = Vec::with_capacity(values.len());
            let snapshot = env.snapshot();
            for value in values {
                let mut inputs = snapshot.clone();
                inputs.insert(for_loop.var_name.clone(), ValueItem::input(Value::Integer(value)));
                items.push(((*for_loop.body).clone(), inputs));
            }
            self.run_parallel_batch(items, hierarchy, env)
        } else {
            for value in values {
                let mut child = env.child_with(for_loop.var_name.clone(), ValueItem::input(Value::Integer(value)));
                let mut body = (*for_loop.body).clone();
                self.execute(&mut body, &mut child, hierarchy)?;
                merge_child_writes(env, &child, &for_loop.var_name);
            }
            Ok(())
        }
    }

    fn eval_integer(&self, item: &ValueItem, env: &Environment, hierarchy: &Hierarchy) -> SakuraResult<i64> {
        let value = self.context.evaluator.eval(item, env).map_err(|err| attach_hierarchy(err, hierarchy))?;
        value.as_integer().ok_or_else(|| SakuraError::Eval {
            hierarchy: hierarchy.clone(),
            message: format!("expected an integer bound, got {}", value.type_name()),
        })
    }

    fn execute_subtree_ref(&self, subtree_ref: &mut SubtreeRef, env: &mut Environment, hierarchy: &Hierarchy) -> SakuraResult<()> {
        let tree = self
            .context
            .garden
            .resolve_tree(&subtree_ref.name_or_path)
            .ok_or_else(|| SakuraError::UnknownTree(subtree_ref.name_or_path.clone()))?;

        let mut seeded = tree.declared_inputs.clone();
        seeded.merge_from(env.local(), OverridePolicy::OnlyExisting);
        if let Some(overrides) = subtree_ref.internal_overrides.get(&tree.id) {
            seeded.merge_from(overrides, OverridePolicy::All);
        }

        let mut child_hierarchy = hierarchy.clone();
        child_hierarchy.push(tree.id.clone());
        let mut child_env = Environment::from_map(seeded);
        let mut body = (*tree.body).clone();
        self.execute(&mut body, &mut child_env, &child_hierarchy)?;

        env.merge_from(&child_env.snapshot(), OverridePolicy::All);
        Ok(())
    }

    fn execute_tree_inline(&self, tree: &mut Tree, env: &mut Environment, hierarchy: &Hierarchy) -> SakuraResult<()> {
        let mut child_hierarchy = hierarchy.clone();
        child_hierarchy.push(tree.id.clone());
        self.execute(&mut tree.body, env, &child_hierarchy)
    }

    /// Dispatch a batch of independent `(node, inputs_snapshot)` pairs and,
    /// on full success, merge their resulting environments into `env` in
    /// completion order.
    ///
    /// When the current thread is itself a pool worker, the batch runs
    /// inline instead of through the queue — the fallback for nested
    /// parallel fan-out, avoiding every worker blocking on an inner barrier
    /// with none free to service it. The tradeoff: a nested batch loses
    /// concurrency among its own siblings, and an early sibling failure
    /// skips ones not yet started rather than letting them run to
    /// completion, since there is no "already running" to let finish when
    /// nothing is truly concurrent.
    fn run_parallel_batch(&self, items: Vec<(Node, ValueItemMap)>, hierarchy: &Hierarchy, env: &mut Environment) -> SakuraResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        if is_worker_thread() {
            return self.run_parallel_batch_inline(items, hierarchy, env);
        }

        let barrier = Arc::new(crate::barrier::Barrier::new(items.len() as u32));
        let results: BatchResults = Arc::new(Mutex::new(Vec::new()));
        for (node, inputs) in items {
            self.context.queue.push(SubtreeTask {
                subtree: node,
                inputs_snapshot: inputs,
                barrier: Arc::clone(&barrier),
                hierarchy: hierarchy.clone(),
                file_path: String::new(),
                results: Arc::clone(&results),
            });
        }

        let (success, message) = barrier.wait();
        if !success {
            return Err(SakuraError::Batch {
                hierarchy: hierarchy.clone(),
                message,
            });
        }
        crate::worker::merge_batch_results(env, &results);
        Ok(())
    }

    fn run_parallel_batch_inline(&self, items: Vec<(Node, ValueItemMap)>, hierarchy: &Hierarchy, env: &mut Environment) -> SakuraResult<()> {
        let mut completed = Vec::with_capacity(items.len());
        for (mut node, inputs) in items {
            let mut item_env = Environment::from_map(inputs);
            match self.execute(&mut node, &mut item_env, hierarchy) {
                Ok(()) => completed.push(item_env.snapshot()),
                Err(err) => {
                    return Err(SakuraError::Batch {
                        hierarchy: hierarchy.clone(),
                        message: err.message(),
                    })
                }
            }
        }
        for snapshot in completed {
            env.merge_from(&snapshot, OverridePolicy::All);
        }
        Ok(())
    }
}

/// Merge a sequential loop iteration's child-scope writes back into the
/// enclosing environment, dropping the loop variable itself so it does not
/// leak past the iteration that bound it.
fn merge_child_writes(env: &mut Environment, child: &Environment, var_name: &str) {
    let mut writes = child.local().clone();
    writes.remove(var_name);
    env.merge_from(&writes, OverridePolicy::All);
}

fn output_item(value: Value) -> ValueItem {
    ValueItem {
        expression: Expression::Literal(value),
        kind: ValueItemKind::Output,
        flag: ValueItemFlag::Assigned,
    }
}

fn attach_hierarchy(err: SakuraError, hierarchy: &Hierarchy) -> SakuraError {
    match err {
        SakuraError::Eval { message, .. } => SakuraError::Eval {
            hierarchy: hierarchy.clone(),
            message,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Leaf, Node};
    use crate::eval::DefaultEvaluator;
    use crate::garden::Garden;
    use crate::handler::{Blossom, HandlerRegistry, HandlerSchema, RunOutcome};
    use crate::value_item::ValueItem;
    use crate::worker::WorkerPool;

    struct Set;
    impl Blossom for Set {
        fn schema(&self) -> HandlerSchema {
            HandlerSchema::default()
        }
        fn run(&self, inputs: Value) -> RunOutcome {
            let key = inputs.get_field("key").and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                _ => None,
            });
            let value = inputs.get_field("value").cloned().unwrap_or(Value::Null);
            match key {
                Some(key) => RunOutcome::success(Value::object(vec![(key, value)])),
                None => RunOutcome::failure("missing 'key' input"),
            }
        }
    }

    struct Fail;
    impl Blossom for Fail {
        fn schema(&self) -> HandlerSchema {
            HandlerSchema::default()
        }
        fn run(&self, _inputs: Value) -> RunOutcome {
            RunOutcome::failure("boom")
        }
    }

    fn context() -> SharedContext {
        let registry = HandlerRegistry::new();
        registry.add_blossom("std", "set", Arc::new(Set));
        registry.add_blossom("std", "fail", Arc::new(Fail));
        SharedContext::new(Arc::new(Garden::new()), Arc::new(registry), Arc::new(DefaultEvaluator))
    }

    fn set_leaf(key: &str, value: Value) -> Leaf {
        Leaf::new("std", "set")
            .with_input("key", ValueItem::input(Value::from(key)))
            .with_input("value", ValueItem::input(value))
    }

    #[test]
    fn leaf_dispatch_merges_handler_outputs() {
        let context = context();
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut node = Node::Leaf(set_leaf("x", Value::Integer(42)));
        interpreter.execute(&mut node, &mut env, &Vec::new()).unwrap();
        assert_eq!(env.get("x").unwrap().expression, Expression::Literal(Value::Integer(42)));
    }

    #[test]
    fn unknown_handler_is_an_error() {
        let context = context();
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut node = Node::Leaf(Leaf::new("nope", "nope"));
        assert!(matches!(
            interpreter.execute(&mut node, &mut env, &Vec::new()),
            Err(SakuraError::UnknownHandler { .. })
        ));
    }

    #[test]
    fn sequential_aborts_on_first_error_but_keeps_prior_effects() {
        let context = context();
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut node = Node::sequential(vec![
            Node::Leaf(set_leaf("x", Value::Integer(1))),
            Node::Leaf(Leaf::new("std", "fail")),
            Node::Leaf(set_leaf("y", Value::Integer(2))),
        ]);
        let err = interpreter.execute(&mut node, &mut env, &Vec::new()).unwrap_err();
        assert!(matches!(err, SakuraError::Handler { .. }));
        assert!(env.contains("x"));
        assert!(!env.contains("y"));
    }

    #[test]
    fn if_branch_picks_then_or_else_by_comparison() {
        let context = context();
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut node = Node::If(If {
            lhs: ValueItem::input(Value::Integer(5)),
            op: CompareOp::Gt,
            rhs: ValueItem::input(Value::Integer(1)),
            then_branch: Box::new(Node::Leaf(set_leaf("picked", Value::from("then")))),
            else_branch: Some(Box::new(Node::Leaf(set_leaf("picked", Value::from("else"))))),
        });
        interpreter.execute(&mut node, &mut env, &Vec::new()).unwrap();
        assert_eq!(env.get("picked").unwrap().expression, Expression::Literal(Value::from("then")));
    }

    #[test]
    fn for_each_sequential_accumulates_across_iterations() {
        let context = context();
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut iterable = ValueItemMap::new();
        iterable.insert("items", ValueItem::input(Value::Array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])));
        let mut node = Node::ForEach(ForEach {
            var_name: "i".to_string(),
            iterable,
            parallel: false,
            body: Box::new(Node::Leaf(Leaf::new("std", "set").with_input("key", ValueItem::input(Value::from("last"))).with_input("value", ValueItem::reference("i")))),
        });
        interpreter.execute(&mut node, &mut env, &Vec::new()).unwrap();
        assert_eq!(env.get("last").unwrap().expression, Expression::Literal(Value::Integer(3)));
    }

    #[test]
    fn for_each_sequential_does_not_leak_its_loop_variable() {
        let context = context();
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut iterable = ValueItemMap::new();
        iterable.insert("items", ValueItem::input(Value::Array(vec![Value::Integer(1), Value::Integer(2)])));
        let mut node = Node::ForEach(ForEach {
            var_name: "i".to_string(),
            iterable,
            parallel: false,
            body: Box::new(Node::Leaf(Leaf::new("std", "set").with_input("key", ValueItem::input(Value::from("last"))).with_input("value", ValueItem::reference("i")))),
        });
        interpreter.execute(&mut node, &mut env, &Vec::new()).unwrap();
        assert!(env.get("i").is_none());
    }

    #[test]
    fn for_each_empty_array_completes_immediately() {
        let context = context();
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut iterable = ValueItemMap::new();
        iterable.insert("items", ValueItem::input(Value::Array(Vec::new())));
        let mut node = Node::ForEach(ForEach {
            var_name: "i".to_string(),
            iterable,
            parallel: false,
            body: Box::new(Node::Leaf(Leaf::new("std", "fail"))),
        });
        assert!(interpreter.execute(&mut node, &mut env, &Vec::new()).is_ok());
    }

    #[test]
    fn for_loop_counts_down_when_start_exceeds_end() {
        let context = context();
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut node = Node::For(For {
            var_name: "i".to_string(),
            start: ValueItem::input(Value::Integer(3)),
            end: ValueItem::input(Value::Integer(1)),
            parallel: false,
            body: Box::new(Node::Leaf(Leaf::new("std", "set").with_input("key", ValueItem::input(Value::from("last"))).with_input("value", ValueItem::reference("i")))),
        });
        interpreter.execute(&mut node, &mut env, &Vec::new()).unwrap();
        assert_eq!(env.get("last").unwrap().expression, Expression::Literal(Value::Integer(1)));
    }

    #[test]
    fn for_loop_start_equals_end_runs_once() {
        let context = context();
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut count = ValueItemMap::new();
        count.insert("count", ValueItem::input(Value::Integer(0)));
        env.merge_from(&count, OverridePolicy::All);
        let mut node = Node::For(For {
            var_name: "i".to_string(),
            start: ValueItem::input(Value::Integer(7)),
            end: ValueItem::input(Value::Integer(7)),
            parallel: false,
            body: Box::new(Node::Leaf(Leaf::new("std", "set").with_input("key", ValueItem::input(Value::from("hit"))).with_input("value", ValueItem::reference("i")))),
        });
        interpreter.execute(&mut node, &mut env, &Vec::new()).unwrap();
        assert_eq!(env.get("hit").unwrap().expression, Expression::Literal(Value::Integer(7)));
    }

    #[test]
    fn for_loop_sequential_does_not_leak_its_loop_variable() {
        let context = context();
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut node = Node::For(For {
            var_name: "i".to_string(),
            start: ValueItem::input(Value::Integer(1)),
            end: ValueItem::input(Value::Integer(3)),
            parallel: false,
            body: Box::new(Node::Leaf(Leaf::new("std", "set").with_input("key", ValueItem::input(Value::from("last"))).with_input("value", ValueItem::reference("i")))),
        });
        interpreter.execute(&mut node, &mut env, &Vec::new()).unwrap();
        assert!(env.get("i").is_none());
    }

    #[test]
    fn parallel_batch_runs_through_a_real_worker_pool_and_merges_results() {
        let context = Arc::new(context());
        let pool = WorkerPool::start(Arc::clone(&context), 4);
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut node = Node::parallel(Node::sequential(vec![
            Node::Leaf(set_leaf("a", Value::Integer(1))),
            Node::Leaf(set_leaf("b", Value::Integer(2))),
            Node::Leaf(set_leaf("c", Value::Integer(3))),
        ]));
        interpreter.execute(&mut node, &mut env, &Vec::new()).unwrap();
        assert_eq!(env.get("a").unwrap().expression, Expression::Literal(Value::Integer(1)));
        assert_eq!(env.get("b").unwrap().expression, Expression::Literal(Value::Integer(2)));
        assert_eq!(env.get("c").unwrap().expression, Expression::Literal(Value::Integer(3)));
        pool.shutdown();
    }

    #[test]
    fn parallel_batch_surfaces_first_sibling_error() {
        let context = Arc::new(context());
        let pool = WorkerPool::start(Arc::clone(&context), 2);
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut node = Node::parallel(Node::sequential(vec![
            Node::Leaf(set_leaf("a", Value::Integer(1))),
            Node::Leaf(Leaf::new("std", "fail")),
        ]));
        let err = interpreter.execute(&mut node, &mut env, &Vec::new()).unwrap_err();
        assert!(matches!(err, SakuraError::Batch { .. }));
        pool.shutdown();
    }

    #[test]
    fn parallel_zero_children_completes_immediately() {
        let context = context();
        let interpreter = Interpreter::new(&context);
        let mut env = Environment::new();
        let mut node = Node::parallel(Node::sequential(Vec::new()));
        assert!(interpreter.execute(&mut node, &mut env, &Vec::new()).is_ok());
    }
}
