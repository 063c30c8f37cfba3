//! Immutable schema descriptors.
//!
//! A [`Schema`] is the addressing contract of one entity type: how many
//! specifier values it takes (arity), which kinds they are (signature), how
//! many directory levels its encoding consumes (depth), the encoding itself,
//! and optionally the specifier file that records recoverable fields.
//!
//! Schemas are built once through [`SchemaBuilder`], which rejects
//! inconsistent declarations up front. After that they are plain values and
//! are shared behind `Arc`.

use std::fmt;
use std::sync::Arc;

use crate::error::{SchemaError, SchemaResult};
use crate::token::check_segment;
use crate::value::{SpecValue, ValueKind};

/// File-name prefix of specifier files.
pub const SPEC_FILE_PREFIX: &str = "dir";

/// Extension of specifier files (JSON content).
pub const SPEC_FILE_EXTENSION: &str = "json";

/// Turns a validated specifier into directory segments.
///
/// The slice always matches the schema signature when this is called; an
/// `Err` carries the reason a value falls outside the representable domain.
pub type EncodeFn = fn(&[SpecValue]) -> Result<Vec<String>, String>;

/// Extracts one recorded field from a validated specifier.
pub type ProjectFn = fn(&[SpecValue]) -> SpecValue;

/// Decides whether directory names found during enumeration could have been
/// produced by the encoder. Receives exactly `depth` names.
pub type CandidateFn = fn(&[&str]) -> bool;

#[derive(Clone)]
pub struct FieldProjection {
    pub name: &'static str,
    pub project: ProjectFn,
}

impl fmt::Debug for FieldProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldProjection")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The side-car file a schema writes into each of its nodes.
#[derive(Debug, Clone)]
pub struct SpecifierFileDecl {
    prefix: &'static str,
    projections: Vec<FieldProjection>,
    key_fields: Vec<&'static str>,
}

impl SpecifierFileDecl {
    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// File name inside the node, e.g. `dir.json`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.prefix, SPEC_FILE_EXTENSION)
    }

    /// Recorded fields, in declaration order.
    pub fn projections(&self) -> &[FieldProjection] {
        &self.projections
    }

    /// Recorded fields that, in order, rebuild the specifier.
    pub fn key_fields(&self) -> &[&'static str] {
        &self.key_fields
    }

    /// Evaluate every projection over a validated specifier.
    pub fn project(&self, specs: &[SpecValue]) -> Vec<(String, SpecValue)> {
        self.projections
            .iter()
            .map(|p| (p.name.to_string(), (p.project)(specs)))
            .collect()
    }
}

#[derive(Clone)]
pub struct Schema {
    name: &'static str,
    arity: usize,
    signature: &'static [ValueKind],
    depth: usize,
    encode: EncodeFn,
    spec_file: Option<SpecifierFileDecl>,
    candidate: Option<CandidateFn>,
    parent: Option<Arc<Schema>>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("signature", &self.signature)
            .field("depth", &self.depth)
            .field("spec_file", &self.spec_file)
            .field("parent", &self.parent.as_ref().map(|p| p.name))
            .finish()
    }
}

impl Schema {
    pub fn builder(name: &'static str) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of specifier values this level consumes.
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn signature(&self) -> &'static [ValueKind] {
        self.signature
    }

    /// Number of directory levels this level's encoding produces.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn spec_file(&self) -> Option<&SpecifierFileDecl> {
        self.spec_file.as_ref()
    }

    pub fn parent(&self) -> Option<&Arc<Schema>> {
        self.parent.as_ref()
    }

    /// Whether directories named `names` (one per level of depth) may be a
    /// node of this schema. Schemas without a candidate filter accept every
    /// name.
    pub fn could_be_node(&self, names: &[&str]) -> bool {
        names.len() == self.depth && self.candidate.map_or(true, |accept| accept(names))
    }

    pub fn is_trunk(&self) -> bool {
        self.arity == 0
    }

    /// Arity of the whole chain: every ancestor's arity plus this one.
    pub fn full_arity(&self) -> usize {
        self.root_arity() + self.arity
    }

    /// Arity of the ancestors only.
    pub fn root_arity(&self) -> usize {
        self.parent.as_ref().map_or(0, |p| p.full_arity())
    }

    /// Depth of the whole chain below the prefix.
    pub fn full_depth(&self) -> usize {
        self.parent.as_ref().map_or(0, |p| p.full_depth()) + self.depth
    }

    /// A copy of this schema rooted under `parent`.
    ///
    /// Neither schema's own depth or arity changes; the child's paths become
    /// extensions of the parent's.
    pub fn rooted_under(&self, parent: Arc<Schema>) -> Schema {
        Schema {
            parent: Some(parent),
            ..self.clone()
        }
    }

    /// Check `specs` against this level's arity and signature.
    pub fn check_own(&self, specs: &[SpecValue]) -> SchemaResult<()> {
        if specs.len() != self.arity {
            return Err(SchemaError::Arity {
                schema: self.name.to_string(),
                expected: self.arity,
                got: specs.len(),
            });
        }
        for (i, (value, kind)) in specs.iter().zip(self.signature).enumerate() {
            if value.kind() != *kind {
                return Err(SchemaError::encoding(
                    self.name,
                    format!("value {i} is {}, expected {kind}", value.kind()),
                ));
            }
        }
        Ok(())
    }

    /// Encode this level only. `specs` must be this level's own values.
    pub fn encode_own(&self, specs: &[SpecValue]) -> SchemaResult<Vec<String>> {
        self.check_own(specs)?;
        let segments =
            (self.encode)(specs).map_err(|reason| SchemaError::encoding(self.name, reason))?;
        if segments.len() != self.depth {
            return Err(SchemaError::encoding(
                self.name,
                format!(
                    "encoder produced {} segments for depth {}",
                    segments.len(),
                    self.depth
                ),
            ));
        }
        for segment in &segments {
            check_segment(segment).map_err(|reason| SchemaError::encoding(self.name, reason))?;
        }
        Ok(segments)
    }
}

/// Builder that validates a schema declaration.
pub struct SchemaBuilder {
    name: &'static str,
    arity: Option<usize>,
    signature: &'static [ValueKind],
    depth: usize,
    encode: Option<EncodeFn>,
    spec_file_prefix: &'static str,
    candidate: Option<CandidateFn>,
    projections: Vec<FieldProjection>,
    key_fields: Vec<&'static str>,
    parent: Option<Arc<Schema>>,
}

impl SchemaBuilder {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            arity: None,
            signature: &[],
            depth: 1,
            encode: None,
            spec_file_prefix: SPEC_FILE_PREFIX,
            candidate: None,
            projections: Vec::new(),
            key_fields: Vec::new(),
            parent: None,
        }
    }

    pub fn arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    /// Value kinds the encoder expects, one per specifier position.
    pub fn signature(mut self, signature: &'static [ValueKind]) -> Self {
        self.signature = signature;
        self
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn encode(mut self, encode: EncodeFn) -> Self {
        self.encode = Some(encode);
        self
    }

    pub fn spec_file_prefix(mut self, prefix: &'static str) -> Self {
        self.spec_file_prefix = prefix;
        self
    }

    /// Restrict enumeration to directory names the encoder could produce,
    /// for schemas whose nodes share a directory with other entries.
    pub fn candidate(mut self, candidate: CandidateFn) -> Self {
        self.candidate = Some(candidate);
        self
    }

    /// Record `name` in the specifier file.
    pub fn project(mut self, name: &'static str, project: ProjectFn) -> Self {
        self.projections.push(FieldProjection { name, project });
        self
    }

    /// Recorded fields that rebuild the specifier, in specifier order.
    pub fn key_fields(mut self, fields: &[&'static str]) -> Self {
        self.key_fields = fields.to_vec();
        self
    }

    pub fn parent(mut self, parent: Arc<Schema>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        let name = self.name;
        let arity = self
            .arity
            .ok_or_else(|| SchemaError::definition(name, "arity not declared"))?;
        if arity != self.signature.len() {
            return Err(SchemaError::definition(
                name,
                format!(
                    "declared arity {arity} but encoder signature has {} fields",
                    self.signature.len()
                ),
            ));
        }
        if self.depth == 0 {
            return Err(SchemaError::definition(name, "depth must be at least 1"));
        }
        let encode = self
            .encode
            .ok_or_else(|| SchemaError::definition(name, "no encoding function"))?;

        let spec_file = if self.projections.is_empty() {
            if !self.key_fields.is_empty() {
                return Err(SchemaError::definition(
                    name,
                    "key fields declared without projections",
                ));
            }
            None
        } else {
            check_segment(self.spec_file_prefix)
                .map_err(|reason| SchemaError::definition(name, reason))?;
            for (i, p) in self.projections.iter().enumerate() {
                if self.projections[..i].iter().any(|q| q.name == p.name) {
                    return Err(SchemaError::definition(
                        name,
                        format!("field `{}` projected twice", p.name),
                    ));
                }
            }
            if self.key_fields.len() != arity {
                return Err(SchemaError::definition(
                    name,
                    format!(
                        "{} key fields cannot rebuild a specifier of arity {arity}",
                        self.key_fields.len()
                    ),
                ));
            }
            if let Some(missing) = self
                .key_fields
                .iter()
                .find(|k| !self.projections.iter().any(|p| p.name == **k))
            {
                return Err(SchemaError::definition(
                    name,
                    format!("key field `{missing}` is not projected"),
                ));
            }
            Some(SpecifierFileDecl {
                prefix: self.spec_file_prefix,
                projections: self.projections,
                key_fields: self.key_fields,
            })
        };

        Ok(Schema {
            name,
            arity,
            signature: self.signature,
            depth: self.depth,
            encode,
            spec_file,
            candidate: self.candidate,
            parent: self.parent,
        })
    }
}
