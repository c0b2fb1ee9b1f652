//! `SakuraLang`: the single, explicitly-constructed entry point bundling the
//! garden, handler registry, worker pool, parser, and evaluator behind one
//! serialized lock.
//!
//! Every public entry point takes the same facade mutex; there is no
//! process-global singleton. This type is built with `SakuraLang::new(config)`
//! and nothing else reaches for global state.

use crate::ast::Tree;
use crate::config::SakuraConfig;
use crate::environment::Environment;
use crate::error::{SakuraError, SakuraResult};
use crate::eval::{DefaultEvaluator, Evaluator};
use crate::garden::Garden;
use crate::handler::{Blossom, HandlerRegistry};
use crate::interpreter::{Interpreter, SharedContext};
use crate::parser::{JsonTreeParser, Parser};
use crate::value_item::{check_input, OverridePolicy, ValueItemMap};
use crate::worker::WorkerPool;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// The execution core's facade. One instance owns one worker pool, one
/// garden, one handler registry, and serializes every public entry point
/// behind a single mutex — concurrent triggers against the same facade
/// queue rather than overlap.
pub struct SakuraLang {
    garden: Arc<Garden>,
    registry: Arc<HandlerRegistry>,
    parser: Arc<dyn Parser>,
    context: Arc<SharedContext>,
    pool: Mutex<Option<WorkerPool>>,
    lock: Mutex<()>,
}

impl SakuraLang {
    /// Construct a facade with its own garden, registry, and worker pool
    /// sized per `config`, using [`DefaultEvaluator`] and [`JsonTreeParser`].
    ///
    /// # Errors
    ///
    /// Returns [`SakuraError::Validation`] if `config` itself is invalid.
    pub fn new(config: SakuraConfig) -> SakuraResult<Self> {
        Self::with_collaborators(config, Arc::new(DefaultEvaluator), Arc::new(JsonTreeParser))
    }

    /// Construct a facade with explicit evaluator/parser collaborators —
    /// the extension point an embedding application uses to plug in a real
    /// expression language and tree grammar.
    ///
    /// # Errors
    ///
    /// Returns [`SakuraError::Validation`] if `config` itself is invalid.
    pub fn with_collaborators(
        config: SakuraConfig,
        evaluator: Arc<dyn Evaluator>,
        parser: Arc<dyn Parser>,
    ) -> SakuraResult<Self> {
        config.validate()?;
        let garden = Arc::new(Garden::new());
        let registry = Arc::new(HandlerRegistry::new());
        let context = Arc::new(SharedContext::new(Arc::clone(&garden), Arc::clone(&registry), evaluator));
        let pool = WorkerPool::start(Arc::clone(&context), config.worker_count);
        info!(worker_count = config.worker_count, "sakura facade constructed");
        Ok(SakuraLang {
            garden,
            registry,
            parser,
            context,
            pool: Mutex::new(Some(pool)),
            lock: Mutex::new(()),
        })
    }

    /// Register a native handler under `(group, name)`. Returns `false` on
    /// duplicate registration.
    pub fn add_blossom(&self, group: impl Into<String>, name: impl Into<String>, handler: Arc<dyn Blossom>) -> bool {
        let _guard = self.lock.lock().expect("facade lock poisoned");
        self.registry.add_blossom(group, name, handler)
    }

    /// `true` if `(group, name)` is registered.
    #[must_use]
    pub fn does_blossom_exist(&self, group: &str, name: &str) -> bool {
        self.registry.does_blossom_exist(group, name)
    }

    /// Parse `source` and register it in the garden under `id` (or the
    /// document's own id, if `id` is `None`). Returns `false` on duplicate
    /// id, without surfacing that as an error.
    ///
    /// # Errors
    ///
    /// Returns [`SakuraError::Parse`] if `source` fails to parse.
    pub fn add_tree(&self, id: Option<&str>, source: &str) -> SakuraResult<bool> {
        let _guard = self.lock.lock().expect("facade lock poisoned");
        let tree = self.parser.parse(id, source)?;
        Ok(self.garden.add_tree(tree))
    }

    /// Register a named template's content. Returns `false` on duplicate
    /// name.
    pub fn add_template(&self, name: impl Into<String>, content: impl Into<String>) -> bool {
        let _guard = self.lock.lock().expect("facade lock poisoned");
        self.garden.add_template(name, content)
    }

    /// Fetch a registered template's content by name.
    #[must_use]
    pub fn get_template(&self, name: &str) -> Option<String> {
        self.garden.get_template(name)
    }

    /// Register a binary asset's content. Returns `false` on duplicate
    /// path.
    pub fn add_file(&self, relative_path: impl Into<String>, content: Vec<u8>) -> bool {
        let _guard = self.lock.lock().expect("facade lock poisoned");
        self.garden.add_file(relative_path, content)
    }

    /// Fetch a registered file's bytes by relative path.
    #[must_use]
    pub fn get_file(&self, relative_path: &str) -> Option<Vec<u8>> {
        self.garden.get_file(relative_path)
    }

    /// Parse and register every file matching a glob `pattern`, as opposed
    /// to the recursive, pattern-free [`SakuraLang::read_files_in_dir`].
    ///
    /// # Errors
    ///
    /// Returns the first I/O or parse error encountered, or an I/O error if
    /// `pattern` itself is malformed.
    pub fn read_files(&self, pattern: &str) -> SakuraResult<usize> {
        let _guard = self.lock.lock().expect("facade lock poisoned");
        let parser = Arc::clone(&self.parser);
        self.garden
            .read_files(pattern, move |relative_path, content| parser.parse(None, content).map(|mut tree| {
                tree.relative_path = relative_path.to_string();
                tree
            }))
    }

    /// Parse and register every file found under `dir`, keyed by path
    /// relative to `dir`.
    ///
    /// # Errors
    ///
    /// Returns the first I/O or parse error encountered.
    pub fn read_files_in_dir(&self, dir: impl AsRef<Path>) -> SakuraResult<usize> {
        let _guard = self.lock.lock().expect("facade lock poisoned");
        let parser = Arc::clone(&self.parser);
        self.garden
            .read_files_in_dir(dir, move |relative_path, content| parser.parse(None, content).map(|mut tree| {
                tree.relative_path = relative_path.to_string();
                tree
            }))
    }

    /// Look up a registered tree by id, seed its declared inputs with
    /// `inputs` under `ONLY_NON_EXISTING` (defaults win only where the
    /// caller supplied nothing), run it, and return the resulting
    /// environment's flattened contents.
    ///
    /// # Errors
    ///
    /// Returns [`SakuraError::UnknownTree`] if `id` is not registered, a
    /// [`SakuraError::Validation`] if `inputs` names anything not in the
    /// tree's declared inputs, or whatever error execution itself raises.
    pub fn trigger_tree(&self, id: &str, inputs: ValueItemMap) -> SakuraResult<ValueItemMap> {
        let _guard = self.lock.lock().expect("facade lock poisoned");
        let tree = self.garden.resolve_tree(id).ok_or_else(|| SakuraError::UnknownTree(id.to_string()))?;
        debug!(tree_id = id, "triggering tree");
        self.run_tree_body(&tree, inputs)
    }

    /// Parse `source`, validate it, and execute it without registering it
    /// in the garden. Declared-input validation and the run itself proceed
    /// exactly as [`SakuraLang::trigger_tree`].
    ///
    /// # Errors
    ///
    /// As [`SakuraLang::trigger_tree`], plus [`SakuraError::Parse`].
    pub fn run_tree(&self, id: &str, source: &str, inputs: ValueItemMap) -> SakuraResult<ValueItemMap> {
        let _guard = self.lock.lock().expect("facade lock poisoned");
        let tree = self.parser.parse(Some(id), source)?;
        debug!(tree_id = id, "running transient tree");
        self.run_tree_body(&tree, inputs)
    }

    fn run_tree_body(&self, tree: &Tree, inputs: ValueItemMap) -> SakuraResult<ValueItemMap> {
        let undeclared = check_input(&tree.declared_inputs, &inputs);
        if !undeclared.is_empty() {
            return Err(SakuraError::Validation {
                hierarchy: vec![tree.id.clone()],
                message: format!("undeclared input(s): {}", undeclared.join(", ")),
            });
        }
        let mut seeded = inputs;
        seeded.merge_from(&tree.declared_inputs, OverridePolicy::OnlyNonExisting);
        let mut env = Environment::from_map(seeded);
        let mut body = (*tree.body).clone();
        let interpreter = Interpreter::new(&self.context);
        interpreter.execute(&mut body, &mut env, &vec![tree.id.clone()])?;
        Ok(env.snapshot())
    }

    /// Number of live worker threads backing this facade.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.pool
            .lock()
            .expect("facade lock poisoned")
            .as_ref()
            .map_or(0, WorkerPool::worker_count)
    }

    /// Shut down the worker pool. Further calls into this facade after
    /// shutdown will hang on the now-unstaffed queue; intended for orderly
    /// process exit.
    pub fn shutdown(&self) {
        if let Some(pool) = self.pool.lock().expect("facade lock poisoned").take() {
            pool.shutdown();
        }
    }
}
