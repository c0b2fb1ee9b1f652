//! The in-memory repository of parsed trees, templates, and files.
//!
//! A two-level `trees`/`templates`/`files` store behind plain `RwLock`s. The
//! mutation lock wrapped around every public entry point one layer up lives
//! on [`crate::facade::SakuraLang`]; this type itself is safe to read from
//! any worker thread without taking that lock.

use crate::ast::Tree;
use crate::error::{SakuraError, SakuraResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use walkdir::WalkDir;

/// Thread-safe, insertion-immutable container for trees, templates, and
/// files. Populated by [`crate::facade::SakuraLang`] before (or between)
/// executions; read freely by any thread during execution.
#[derive(Default)]
pub struct Garden {
    trees_by_id: RwLock<HashMap<String, Arc<Tree>>>,
    trees_by_path: RwLock<HashMap<String, Arc<Tree>>>,
    templates: RwLock<HashMap<String, String>>,
    files: RwLock<HashMap<String, Vec<u8>>>,
    /// Wall-clock moment each tree id was registered, for diagnostics.
    inserted_at: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl Garden {
    /// An empty garden.
    #[must_use]
    pub fn new() -> Self {
        Garden::default()
    }

    /// Register a parsed tree under both its id and relative path. A tree
    /// arriving with no id (e.g. from a directory/glob load whose source
    /// document never declared one) is assigned a fresh UUID so it remains
    /// individually addressable. Returns `false` — and leaves the garden
    /// unchanged — if the (possibly assigned) id is already bound; once
    /// inserted, a tree is never replaced.
    pub fn add_tree(&self, mut tree: Tree) -> bool {
        if tree.id.is_empty() {
            tree.id = uuid::Uuid::new_v4().to_string();
        }
        let mut by_id = self.trees_by_id.write().expect("garden lock poisoned");
        if by_id.contains_key(&tree.id) {
            return false;
        }
        let tree = Arc::new(tree);
        by_id.insert(tree.id.clone(), Arc::clone(&tree));
        if !tree.relative_path.is_empty() {
            self.trees_by_path
                .write()
                .expect("garden lock poisoned")
                .insert(tree.relative_path.clone(), Arc::clone(&tree));
        }
        self.inserted_at
            .write()
            .expect("garden lock poisoned")
            .insert(tree.id.clone(), Utc::now());
        true
    }

    /// When `id` was registered, if it is a known tree id.
    #[must_use]
    pub fn tree_inserted_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.inserted_at
            .read()
            .expect("garden lock poisoned")
            .get(id)
            .copied()
    }

    /// Join a tree's `root_path` with a blossom-relative file path it names.
    /// Pure path arithmetic only — resolving the joined path against the
    /// file store is a handler's concern, not the core's.
    #[must_use]
    pub fn resolve_relative_path(tree: &Tree, relative: &str) -> PathBuf {
        Path::new(&tree.root_path).join(relative)
    }

    /// Resolve a tree by id first, then by relative path, the same
    /// resolution order [`crate::ast::SubtreeRef::name_or_path`] uses.
    #[must_use]
    pub fn resolve_tree(&self, id_or_path: &str) -> Option<Arc<Tree>> {
        if let Some(tree) = self
            .trees_by_id
            .read()
            .expect("garden lock poisoned")
            .get(id_or_path)
        {
            return Some(Arc::clone(tree));
        }
        self.trees_by_path
            .read()
            .expect("garden lock poisoned")
            .get(id_or_path)
            .cloned()
    }

    /// Register a named template's content. Returns `false` on duplicate
    /// name.
    pub fn add_template(&self, name: impl Into<String>, content: impl Into<String>) -> bool {
        let mut templates = self.templates.write().expect("garden lock poisoned");
        let name = name.into();
        if templates.contains_key(&name) {
            return false;
        }
        templates.insert(name, content.into());
        true
    }

    /// Fetch a template's content by name.
    #[must_use]
    pub fn get_template(&self, name: &str) -> Option<String> {
        self.templates
            .read()
            .expect("garden lock poisoned")
            .get(name)
            .cloned()
    }

    /// Register a binary asset's content. Returns `false` on duplicate path.
    pub fn add_file(&self, relative_path: impl Into<String>, content: Vec<u8>) -> bool {
        let mut files = self.files.write().expect("garden lock poisoned");
        let relative_path = relative_path.into();
        if files.contains_key(&relative_path) {
            return false;
        }
        files.insert(relative_path, content);
        true
    }

    /// Fetch a file's bytes by relative path.
    #[must_use]
    pub fn get_file(&self, relative_path: &str) -> Option<Vec<u8>> {
        self.files
            .read()
            .expect("garden lock poisoned")
            .get(relative_path)
            .cloned()
    }

    /// Number of distinct tree ids registered.
    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.trees_by_id.read().expect("garden lock poisoned").len()
    }

    /// Walk `dir` recursively and `parse` every regular file found, adding
    /// each successfully parsed tree to the garden keyed by its path
    /// relative to `dir`.
    ///
    /// # Errors
    ///
    /// Returns the first I/O or parse error encountered; trees already
    /// added from earlier entries in the walk remain in the garden.
    pub fn read_files_in_dir(
        &self,
        dir: impl AsRef<Path>,
        parse: impl Fn(&str, &str) -> SakuraResult<Tree>,
    ) -> SakuraResult<usize> {
        let dir = dir.as_ref();
        let mut added = 0;
        for entry in WalkDir::new(dir).into_iter() {
            let entry = entry.map_err(|err| SakuraError::Io(err.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path
                .strip_prefix(dir)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            let content = std::fs::read_to_string(path)?;
            let tree = parse(&relative, &content)?;
            if self.add_tree(tree) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Parse and register every file matching a glob `pattern` (e.g.
    /// `"trees/**/*.sakura"`), keyed by its path relative to the current
    /// directory — distinct from the recursive, pattern-free
    /// `read_files_in_dir` above.
    ///
    /// # Errors
    ///
    /// Returns [`SakuraError::Io`] if `pattern` itself is malformed, or the
    /// first I/O or parse error encountered among the matched files.
    pub fn read_files(
        &self,
        pattern: &str,
        parse: impl Fn(&str, &str) -> SakuraResult<Tree>,
    ) -> SakuraResult<usize> {
        let mut added = 0;
        for entry in glob::glob(pattern).map_err(|err| SakuraError::Io(err.to_string()))? {
            let path = entry.map_err(|err| SakuraError::Io(err.to_string()))?;
            if !path.is_file() {
                continue;
            }
            let relative = path.to_string_lossy().replace('\\', "/");
            let content = std::fs::read_to_string(&path)?;
            let tree = parse(&relative, &content)?;
            if self.add_tree(tree) {
                added += 1;
            }
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;
    use crate::value_item::ValueItemMap;

    fn tree(id: &str, path: &str) -> Tree {
        Tree {
            id: id.to_string(),
            relative_path: path.to_string(),
            root_path: String::new(),
            body: Box::new(Node::sequential(Vec::new())),
            declared_inputs: ValueItemMap::new(),
        }
    }

    #[test]
    fn add_tree_is_insertion_immutable() {
        let garden = Garden::new();
        assert!(garden.add_tree(tree("t1", "a/t1.sakura")));
        assert!(!garden.add_tree(tree("t1", "a/other.sakura")));
        assert_eq!(garden.tree_count(), 1);
    }

    #[test]
    fn add_tree_assigns_a_uuid_when_id_is_empty() {
        let garden = Garden::new();
        assert!(garden.add_tree(tree("", "a/anon.sakura")));
        assert_eq!(garden.tree_count(), 1);
        assert!(garden.resolve_tree("a/anon.sakura").is_some());
    }

    #[test]
    fn resolve_tree_by_id_or_path() {
        let garden = Garden::new();
        garden.add_tree(tree("t1", "a/t1.sakura"));
        assert!(garden.resolve_tree("t1").is_some());
        assert!(garden.resolve_tree("a/t1.sakura").is_some());
        assert!(garden.resolve_tree("nope").is_none());
    }

    #[test]
    fn add_template_and_file_are_insertion_immutable() {
        let garden = Garden::new();
        assert!(garden.add_template("greeting", "hello {{ name }}"));
        assert!(!garden.add_template("greeting", "overwrite attempt"));
        assert_eq!(garden.get_template("greeting").unwrap(), "hello {{ name }}");

        assert!(garden.add_file("assets/a.bin", vec![1, 2, 3]));
        assert!(!garden.add_file("assets/a.bin", vec![9]));
        assert_eq!(garden.get_file("assets/a.bin").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn add_tree_records_an_insertion_timestamp() {
        let garden = Garden::new();
        assert!(garden.tree_inserted_at("t1").is_none());
        garden.add_tree(tree("t1", "a/t1.sakura"));
        assert!(garden.tree_inserted_at("t1").is_some());
    }

    #[test]
    fn resolve_relative_path_joins_root_and_relative() {
        let mut t = tree("t1", "a/t1.sakura");
        t.root_path = "/trees/root".to_string();
        let joined = Garden::resolve_relative_path(&t, "assets/icon.png");
        assert_eq!(joined, Path::new("/trees/root/assets/icon.png"));
    }

    #[test]
    fn read_files_matches_a_glob_pattern() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("one.sakura"), "irrelevant").unwrap();
        std::fs::write(temp.path().join("two.sakura"), "irrelevant").unwrap();
        let garden = Garden::new();
        let pattern = format!("{}/*.sakura", temp.path().display());
        let next_id = std::cell::Cell::new(0u32);
        let added = garden
            .read_files(&pattern, |relative, _content| {
                next_id.set(next_id.get() + 1);
                Ok(tree(&format!("from-{}", next_id.get()), relative))
            })
            .expect("read_files");
        assert_eq!(added, 2);
        assert_eq!(garden.tree_count(), 2);
    }
}
