//! Store configuration: where the run and save trees live.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chemstore_schema::{Schema, SpecValue, Specifier};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::index::{DirIndex, ExistingMode};

/// Environment variable overriding [`StoreConfig::run_prefix`].
pub const RUN_PREFIX_ENV: &str = "CHEMSTORE_RUN_PREFIX";
/// Environment variable overriding [`StoreConfig::save_prefix`].
pub const SAVE_PREFIX_ENV: &str = "CHEMSTORE_SAVE_PREFIX";

/// Which of the two parallel trees to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tree {
    /// Scratch space where external programs run.
    Run,
    /// Durable results.
    Save,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root of the run (scratch) tree
    pub run_prefix: PathBuf,
    /// Root of the save (durable) tree
    pub save_prefix: PathBuf,
    /// How enumeration treats directories without specifier files
    pub existing_mode: ExistingMode,
    /// Rewrite specifier files of nodes that already exist
    pub overwrite_specifiers: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            run_prefix: PathBuf::from("./run"),
            save_prefix: PathBuf::from("./save"),
            existing_mode: ExistingMode::Lenient,
            overwrite_specifiers: false,
        }
    }
}

impl StoreConfig {
    /// Load a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply `CHEMSTORE_RUN_PREFIX` / `CHEMSTORE_SAVE_PREFIX` if set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var_os(key))
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        if let Some(prefix) = lookup(RUN_PREFIX_ENV).filter(|p| !p.is_empty()) {
            self.run_prefix = PathBuf::from(prefix);
        }
        if let Some(prefix) = lookup(SAVE_PREFIX_ENV).filter(|p| !p.is_empty()) {
            self.save_prefix = PathBuf::from(prefix);
        }
        self
    }

    pub fn prefix(&self, tree: Tree) -> &Path {
        match tree {
            Tree::Run => &self.run_prefix,
            Tree::Save => &self.save_prefix,
        }
    }

    /// Bind `schema` to both trees.
    pub fn bind(&self, schema: Arc<Schema>) -> TreePair {
        TreePair {
            run: DirIndex::new(schema.clone(), self.run_prefix.clone()),
            save: DirIndex::new(schema, self.save_prefix.clone()),
            existing_mode: self.existing_mode,
            overwrite: self.overwrite_specifiers,
        }
    }
}

/// One schema bound to the run and the save tree, with the configured
/// enumeration and overwrite policy.
#[derive(Debug, Clone)]
pub struct TreePair {
    pub run: DirIndex,
    pub save: DirIndex,
    existing_mode: ExistingMode,
    overwrite: bool,
}

impl TreePair {
    pub fn get(&self, tree: Tree) -> &DirIndex {
        match tree {
            Tree::Run => &self.run,
            Tree::Save => &self.save,
        }
    }

    /// Create the node for `specs` in `tree` using the configured overwrite
    /// policy.
    pub fn create(&self, tree: Tree, specs: &[SpecValue]) -> StoreResult<PathBuf> {
        self.get(tree).create_with(specs, self.overwrite)
    }

    /// Enumerate `tree` using the configured mode.
    pub fn existing(
        &self,
        tree: Tree,
        root_specs: &[SpecValue],
    ) -> StoreResult<BTreeSet<Specifier>> {
        self.get(tree).existing(root_specs, self.existing_mode)
    }

    /// Create the save node matching a finished run node and return
    /// `(run path, save path)`. Both paths end in the same segments.
    ///
    /// Moving artifact files between the two is up to the caller.
    pub fn promote(&self, specs: &[SpecValue]) -> StoreResult<(PathBuf, PathBuf)> {
        let run_path = self.run.path(specs)?;
        if !self.run.exists(specs)? {
            return Err(StoreError::NodeNotFound { path: run_path });
        }
        let save_path = self.create(Tree::Save, specs)?;
        tracing::debug!(
            schema = self.save.schema().name(),
            run = %run_path.display(),
            save = %save_path.display(),
            "promoted node"
        );
        Ok((run_path, save_path))
    }
}
