//! Chemstore schemas
//!
//! Declares how each entity type of the computation pipeline (species, theory
//! levels, conformers, scan points, runs) is addressed in a directory tree, and
//! turns concrete specifiers into directory paths without touching the
//! filesystem.
//!
//! ```text
//! prefix/SPC/CH4/VGZBTCQKWJMXKE/1/QWERTYUIOP/R3f0k2h8gq1/CONFS/c0
//!        └─┬─┘ └──────────────┬────────────────┘ └────┬─────┘ └──┬──┘
//!     species_trunk      species_leaf            theory_leaf  conformer
//! ```
//!
//! The storage side (specifier files, existence checks, enumeration) lives in
//! `chemstore-storage`.

pub mod catalog;
pub mod encode;
pub mod error;
pub mod schema;
pub mod token;
pub mod value;

pub use catalog::{Catalog, SchemaKind};
pub use error::{SchemaError, SchemaResult};
pub use schema::{
    CandidateFn, EncodeFn, FieldProjection, ProjectFn, Schema, SchemaBuilder, SpecifierFileDecl,
    SPEC_FILE_EXTENSION, SPEC_FILE_PREFIX,
};
pub use value::{SpecValue, Specifier, ValueKind};
