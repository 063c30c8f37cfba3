//! Ready-made index chains for each entity type.
//!
//! A chain is a trunk followed by its leaves, all bound to one prefix, with
//! each level rooted under the previous one. Chains nest by using a node path
//! of one chain as the prefix of the next:
//!
//! ```no_run
//! # use chemstore_storage::{layout, StoreResult};
//! # use chemstore_schema::spec;
//! # fn demo() -> StoreResult<()> {
//! let spc = layout::species("save")?;
//! let spc_path = spc.leaf().create(&spec!["InChI=1S/CH4/h1H4", 1])?;
//! let thy = layout::theory(&spc_path)?;
//! let thy_path = thy.leaf().create(&spec!["b3lyp", "6-31g*", true])?;
//! let cnf = layout::conformer(&thy_path)?;
//! cnf.leaf().create(&spec!["c0"])?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chemstore_schema::catalog;
use chemstore_schema::Schema;

use crate::error::StoreResult;
use crate::index::DirIndex;

#[derive(Debug, Clone)]
pub struct DirChain {
    // Never empty; every constructor pushes at least one level.
    levels: Vec<DirIndex>,
}

impl DirChain {
    fn build(prefix: impl AsRef<Path>, first: Schema, rest: Vec<Schema>) -> Self {
        let prefix = prefix.as_ref();
        let mut levels = Vec::with_capacity(rest.len() + 1);
        let mut parent = Arc::new(first);
        levels.push(DirIndex::new(parent.clone(), prefix));
        for schema in rest {
            let schema = Arc::new(schema.rooted_under(parent));
            levels.push(DirIndex::new(schema.clone(), prefix));
            parent = schema;
        }
        Self { levels }
    }

    /// Outermost level.
    pub fn trunk(&self) -> &DirIndex {
        &self.levels[0]
    }

    /// Innermost level.
    pub fn leaf(&self) -> &DirIndex {
        &self.levels[self.levels.len() - 1]
    }

    pub fn level(&self, i: usize) -> Option<&DirIndex> {
        self.levels.get(i)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirIndex> {
        self.levels.iter()
    }

    pub fn prefix(&self) -> &Path {
        self.trunk().prefix()
    }

    /// The same chain bound to another prefix.
    pub fn rebased(&self, prefix: impl Into<PathBuf>) -> Self {
        let prefix = prefix.into();
        Self {
            levels: self.levels.iter().map(|l| l.rebased(prefix.clone())).collect(),
        }
    }
}

/// `SPC/<species>`
pub fn species(prefix: impl AsRef<Path>) -> StoreResult<DirChain> {
    Ok(DirChain::build(
        prefix,
        catalog::species_trunk()?,
        vec![catalog::species_leaf()?],
    ))
}

/// `<theory>`, usually under a species node.
pub fn theory(prefix: impl AsRef<Path>) -> StoreResult<DirChain> {
    Ok(DirChain::build(prefix, catalog::theory_leaf()?, Vec::new()))
}

/// `RUN/<job>`
pub fn run(prefix: impl AsRef<Path>) -> StoreResult<DirChain> {
    Ok(DirChain::build(
        prefix,
        catalog::run_trunk()?,
        vec![catalog::run_leaf()?],
    ))
}

/// `CONFS/<conformer>`, usually under a theory node.
pub fn conformer(prefix: impl AsRef<Path>) -> StoreResult<DirChain> {
    Ok(DirChain::build(
        prefix,
        catalog::conformer_trunk()?,
        vec![catalog::conformer_leaf()?],
    ))
}

/// `SCANS/<torsions>/<grid point>`, usually under a conformer node.
pub fn scan(prefix: impl AsRef<Path>) -> StoreResult<DirChain> {
    Ok(DirChain::build(
        prefix,
        catalog::scan_trunk()?,
        vec![catalog::scan_branch()?, catalog::scan_leaf()?],
    ))
}

/// `SP/<theory>`, single-point energies at another level of theory.
pub fn single_point(prefix: impl AsRef<Path>) -> StoreResult<DirChain> {
    Ok(DirChain::build(
        prefix,
        catalog::single_point_trunk()?,
        vec![catalog::single_point_leaf()?],
    ))
}
