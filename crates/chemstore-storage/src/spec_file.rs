//! Specifier files.
//!
//! Directory names may be lossy (hashed InChI blocks, case-folded theory
//! codes), so every leaf node carries a small JSON side-car, `dir.json`, with
//! the schema's projected fields:
//!
//! ```json
//! {
//!   "inchi": "InChI=1S/CH4/h1H4",
//!   "formula": "CH4",
//!   "multiplicity": 1
//! }
//! ```
//!
//! The file is written once when the node is created and is the authoritative
//! answer to "which specifier is this node?".

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chemstore_schema::{Schema, SpecValue, Specifier, SpecifierFileDecl};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{StoreError, StoreResult};

/// Field records of a specifier file, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    entries: Vec<(String, SpecValue)>,
}

impl Fields {
    pub fn new(entries: Vec<(String, SpecValue)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&SpecValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SpecValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild the schema's own-level specifier from its key fields.
    pub fn key_specifier(&self, schema: &Schema) -> Result<Specifier, String> {
        let decl = schema
            .spec_file()
            .ok_or_else(|| format!("schema `{}` declares no specifier file", schema.name()))?;
        decl.key_fields()
            .iter()
            .zip(schema.signature())
            .map(|(name, kind)| {
                let value = self
                    .get(name)
                    .ok_or_else(|| format!("missing field `{name}`"))?;
                value
                    .clone()
                    .conform(*kind)
                    .ok_or_else(|| format!("field `{name}` is {}, expected {kind}", value.kind()))
            })
            .collect()
    }
}

impl From<Vec<(String, SpecValue)>> for Fields {
    fn from(entries: Vec<(String, SpecValue)>) -> Self {
        Self::new(entries)
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = Fields;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of specifier field names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Fields, A::Error> {
                let mut entries: Vec<(String, SpecValue)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, SpecValue>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(serde::de::Error::custom(format!("duplicate field `{key}`")));
                    }
                    entries.push((key, value));
                }
                Ok(Fields { entries })
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

/// Location of the specifier file inside `node`.
pub fn spec_file_path(node: &Path, decl: &SpecifierFileDecl) -> PathBuf {
    node.join(decl.file_name())
}

fn declared_file(schema: &Schema) -> StoreResult<&SpecifierFileDecl> {
    schema.spec_file().ok_or_else(|| StoreError::NoSpecifierFile {
        schema: schema.name().to_string(),
    })
}

/// Write the specifier file for `own_specs` into `node`.
///
/// Leaves an existing file untouched unless `overwrite` is set. Returns
/// whether a file was written. The content goes to a uniquely named
/// temporary file in `node` first and is renamed into place, so a reader
/// never sees a partial file and racing writers (threads or processes, on
/// one host or several) leave exactly one writer's content behind.
pub fn write_specifier(
    node: &Path,
    schema: &Schema,
    own_specs: &[SpecValue],
    overwrite: bool,
) -> StoreResult<bool> {
    let decl = declared_file(schema)?;
    schema.check_own(own_specs)?;

    let file = spec_file_path(node, decl);
    if !overwrite && file.try_exists()? {
        return Ok(false);
    }

    let fields = Fields::from(decl.project(own_specs));
    let mut text = serde_json::to_string_pretty(&fields)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    text.push('\n');

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!("{}.tmp", decl.file_name()))
        .tempfile_in(node)?;
    tmp.write_all(text.as_bytes())?;
    // Dropped on any earlier error, which removes the temporary file.
    tmp.persist(&file).map_err(|e| e.error)?;

    tracing::debug!(
        schema = schema.name(),
        path = %file.display(),
        overwrite,
        "wrote specifier file"
    );
    Ok(true)
}

/// Read the specifier file of `node`.
pub fn read_specifier(node: &Path, schema: &Schema) -> StoreResult<Fields> {
    let decl = declared_file(schema)?;
    let file = spec_file_path(node, decl);
    let text = match fs::read_to_string(&file) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(if node.is_dir() {
                StoreError::MissingSpecifier {
                    path: node.to_path_buf(),
                }
            } else {
                StoreError::NodeNotFound {
                    path: node.to_path_buf(),
                }
            });
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&text).map_err(|e| StoreError::MalformedSpecifier {
        path: file,
        reason: e.to_string(),
    })
}

/// Read the specifier file of `node` and rebuild its own-level specifier.
pub fn read_key_specifier(node: &Path, schema: &Schema) -> StoreResult<Specifier> {
    let fields = read_specifier(node, schema)?;
    fields
        .key_specifier(schema)
        .map_err(|reason| StoreError::MalformedSpecifier {
            path: node.to_path_buf(),
            reason,
        })
}
