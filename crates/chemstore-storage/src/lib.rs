//! Chemstore storage
//!
//! Materializes schema-addressed nodes on disk and recovers their identity:
//!
//! - [`spec_file`]: the `dir.json` side-car recording each leaf's specifier.
//! - [`index`]: [`DirIndex`], the schema-bound `path` / `exists` / `create` /
//!   `existing` operations drivers call before running a computation.
//! - [`layout`]: ready-made trunk/leaf chains per entity type.
//! - [`config`]: run and save prefixes.
//!
//! There are no locks and no transactions. Many independent pipeline
//! processes may share one tree; creation relies on the filesystem's own
//! "create directory if absent" and specifier files are replaced by rename.

pub mod config;
pub mod error;
pub mod index;
pub mod layout;
pub mod spec_file;

pub use config::{StoreConfig, Tree, TreePair};
pub use error::{StoreError, StoreResult};
pub use index::{DirIndex, ExistingMode};
pub use layout::DirChain;
pub use spec_file::Fields;
