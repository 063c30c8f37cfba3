//! Pure path encoding.
//!
//! Nothing here touches the filesystem: the same schema and specifier give the
//! same path regardless of what is on disk, which process asks, or in which
//! order calls are made.

use std::path::{Path, PathBuf};

use crate::error::{SchemaError, SchemaResult};
use crate::schema::Schema;
use crate::value::SpecValue;

/// Split a full-chain specifier into the ancestors' part and this level's part.
pub fn split_specifier<'a>(
    schema: &Schema,
    specs: &'a [SpecValue],
) -> SchemaResult<(&'a [SpecValue], &'a [SpecValue])> {
    let expected = schema.full_arity();
    if specs.len() != expected {
        return Err(SchemaError::Arity {
            schema: schema.name().to_string(),
            expected,
            got: specs.len(),
        });
    }
    Ok(specs.split_at(schema.root_arity()))
}

/// Directory segments for `specs` below the prefix, ancestors first.
pub fn segments(schema: &Schema, specs: &[SpecValue]) -> SchemaResult<Vec<String>> {
    let (root_specs, own_specs) = split_specifier(schema, specs)?;
    let mut out = match schema.parent() {
        Some(parent) => segments(parent, root_specs)?,
        None => Vec::with_capacity(schema.depth()),
    };
    out.extend(schema.encode_own(own_specs)?);
    Ok(out)
}

/// Resolve the node path for `specs` under `prefix`.
pub fn path(schema: &Schema, specs: &[SpecValue], prefix: &Path) -> SchemaResult<PathBuf> {
    let mut path = prefix.to_path_buf();
    path.extend(segments(schema, specs)?);
    Ok(path)
}

/// Resolve the directory a schema's nodes live directly under.
///
/// That is the parent node for `root_specs`, or `prefix` for a schema with
/// no parent.
pub fn root_path(schema: &Schema, root_specs: &[SpecValue], prefix: &Path) -> SchemaResult<PathBuf> {
    match schema.parent() {
        Some(parent) => path(parent, root_specs, prefix),
        None if root_specs.is_empty() => Ok(prefix.to_path_buf()),
        None => Err(SchemaError::Arity {
            schema: schema.name().to_string(),
            expected: 0,
            got: root_specs.len(),
        }),
    }
}
