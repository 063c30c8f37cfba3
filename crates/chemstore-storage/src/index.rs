//! Schema-bound directory indices.
//!
//! A [`DirIndex`] pairs a schema with the prefix (run or save tree) its nodes
//! live under, and is what drivers use to ask "where does this specifier
//! live", "has it been computed", and "what has been computed so far".

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chemstore_schema::encode::{self, split_specifier};
use chemstore_schema::{Schema, SpecValue, Specifier};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::spec_file::{self, Fields};

/// What enumeration does with a candidate directory that has no specifier
/// file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingMode {
    /// Skip it (logged at warn level).
    #[default]
    Lenient,
    /// Fail with [`StoreError::MissingSpecifier`].
    Strict,
}

#[derive(Debug, Clone)]
pub struct DirIndex {
    schema: Arc<Schema>,
    prefix: PathBuf,
}

impl DirIndex {
    pub fn new(schema: Arc<Schema>, prefix: impl Into<PathBuf>) -> Self {
        Self {
            schema,
            prefix: prefix.into(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// The same schema bound to another prefix, e.g. the save tree of a run
    /// tree index.
    pub fn rebased(&self, prefix: impl Into<PathBuf>) -> Self {
        Self::new(self.schema.clone(), prefix)
    }

    /// Index of the parent schema under the same prefix.
    pub fn parent_index(&self) -> Option<DirIndex> {
        self.schema
            .parent()
            .map(|parent| DirIndex::new(parent.clone(), self.prefix.clone()))
    }

    /// Node path for `specs`. No filesystem access.
    pub fn path(&self, specs: &[SpecValue]) -> StoreResult<PathBuf> {
        Ok(encode::path(&self.schema, specs, &self.prefix)?)
    }

    /// Directory this schema's nodes live directly under, for the ancestors'
    /// specifier `root_specs`. No filesystem access.
    pub fn root_path(&self, root_specs: &[SpecValue]) -> StoreResult<PathBuf> {
        Ok(encode::root_path(&self.schema, root_specs, &self.prefix)?)
    }

    /// Whether the node for `specs` has been created.
    pub fn exists(&self, specs: &[SpecValue]) -> StoreResult<bool> {
        let path = self.path(specs)?;
        Ok(dir_exists(&path)?)
    }

    /// Create the node for `specs` (and any missing ancestors) and return
    /// its path. Existing nodes and specifier files are left as they are.
    pub fn create(&self, specs: &[SpecValue]) -> StoreResult<PathBuf> {
        self.create_with(specs, false)
    }

    /// Like [`create`](Self::create), but rewrites this node's specifier file
    /// when `overwrite` is set. Ancestors' specifier files are only written
    /// if absent.
    pub fn create_with(&self, specs: &[SpecValue], overwrite: bool) -> StoreResult<PathBuf> {
        let path = self.path(specs)?;
        let (root_specs, own_specs) = split_specifier(&self.schema, specs)?;

        if let Some(parent) = self.parent_index() {
            parent.create_with(root_specs, false)?;
        }

        fs::create_dir_all(&path)?;
        let wrote = match self.schema.spec_file() {
            Some(_) => spec_file::write_specifier(&path, &self.schema, own_specs, overwrite)?,
            None => false,
        };

        tracing::debug!(
            schema = self.schema.name(),
            path = %path.display(),
            wrote_specifier = wrote,
            "node ready"
        );
        Ok(path)
    }

    /// Own-level specifiers of every node materialized under the ancestors'
    /// specifier `root_specs`.
    ///
    /// A root that does not exist yet yields an empty set. For a trunk the
    /// set is `{[]}` once the trunk node exists.
    pub fn existing(
        &self,
        root_specs: &[SpecValue],
        mode: ExistingMode,
    ) -> StoreResult<BTreeSet<Specifier>> {
        Ok(self
            .existing_nodes(root_specs, mode)?
            .into_keys()
            .collect())
    }

    /// Like [`existing`](Self::existing), with each node's path.
    pub fn existing_nodes(
        &self,
        root_specs: &[SpecValue],
        mode: ExistingMode,
    ) -> StoreResult<BTreeMap<Specifier, PathBuf>> {
        let mut found = BTreeMap::new();

        if self.schema.is_trunk() {
            let path = self.path(root_specs)?;
            if dir_exists(&path)? {
                found.insert(Specifier::new(), path);
            }
            return Ok(found);
        }
        if self.schema.spec_file().is_none() {
            return Err(StoreError::NoSpecifierFile {
                schema: self.schema.name().to_string(),
            });
        }
        let root = self.root_path(root_specs)?;
        if !dir_exists(&root)? {
            return Ok(found);
        }

        let depth = self.schema.depth();
        let walker = WalkDir::new(&root)
            .min_depth(depth)
            .max_depth(depth)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let names: Option<Vec<&str>> = entry
                .path()
                .strip_prefix(&root)
                .ok()
                .map(|rel| rel.iter().filter_map(|n| n.to_str()).collect());
            if !names.is_some_and(|names| self.schema.could_be_node(&names)) {
                tracing::debug!(
                    schema = self.schema.name(),
                    path = %entry.path().display(),
                    "ignoring directory the schema cannot have produced"
                );
                continue;
            }
            match spec_file::read_key_specifier(entry.path(), &self.schema) {
                Ok(specs) => {
                    found.insert(specs, entry.into_path());
                }
                Err(StoreError::MissingSpecifier { path }) if mode == ExistingMode::Lenient => {
                    tracing::warn!(
                        schema = self.schema.name(),
                        path = %path.display(),
                        "skipping directory without specifier file"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(found)
    }

    /// Read the specifier file of a node the caller only has a path for.
    pub fn read_specifier(&self, node: &Path) -> StoreResult<Fields> {
        spec_file::read_specifier(node, &self.schema)
    }

    /// Read the specifier file of the node for `specs`.
    pub fn read_specifier_for(&self, specs: &[SpecValue]) -> StoreResult<Fields> {
        let path = self.path(specs)?;
        self.read_specifier(&path)
    }

    /// Own-level specifier of the node at `node`, rebuilt from its file.
    pub fn specifier_of(&self, node: &Path) -> StoreResult<Specifier> {
        spec_file::read_key_specifier(node, &self.schema)
    }
}

fn dir_exists(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
