//! Flattening of error trees into ordered, coded records.
//!
//! Output order is total and deterministic:
//!
//! 1. field groups, in the schema's declared field order (fields the schema
//!    does not declare follow, in encounter order),
//! 2. non-field leaves, in emission order,
//! 3. dict-shaped whole-object entries, in the mapping's order,
//! 4. manually registered records, in call order.

use serde::{Deserialize, Serialize};

use crate::codes::Code;
use crate::registry::{CodeRegistry, INVALID};
use crate::schema::Schema;
use crate::tree::{ErrorNode, ErrorTree, Leaf, Provenance};

/// One resolved error, as exposed on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorRecord {
    /// The field the error belongs to; `None` for whole-object errors.
    pub field: Option<String>,
    /// The human-readable message.
    pub message: String,
    /// The stable code.
    pub code: Code,
}

impl ErrorRecord {
    /// Creates a field record.
    #[must_use]
    pub fn field(field: impl Into<String>, message: impl Into<String>, code: impl Into<Code>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
            code: code.into(),
        }
    }

    /// Creates a whole-object record.
    #[must_use]
    pub fn non_field(message: impl Into<String>, code: impl Into<Code>) -> Self {
        Self {
            field: None,
            message: message.into(),
            code: code.into(),
        }
    }

    /// True for whole-object records.
    #[must_use]
    pub const fn is_non_field(&self) -> bool {
        self.field.is_none()
    }
}

/// Arguments of a manual registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualError {
    /// The message to report.
    pub message: String,
    /// The built-in error kind to resolve against; defaults to `invalid`.
    #[serde(default = "default_kind")]
    pub kind: String,
    /// The field to attach the error to, if any.
    #[serde(default)]
    pub field: Option<String>,
    /// A code that bypasses every table.
    #[serde(default)]
    pub code: Option<Code>,
}

fn default_kind() -> String {
    INVALID.to_string()
}

impl ManualError {
    /// Creates a manual error of kind `invalid` with no field.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: default_kind(),
            field: None,
            code: None,
        }
    }

    /// Sets the error kind.
    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Attaches the error to a field.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Supplies an explicit code.
    #[must_use]
    pub fn code(mut self, code: impl Into<Code>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Resolves this registration into a record.
    ///
    /// An explicit code is used as-is. Otherwise a field error resolves as a
    /// built-in `kind` against the field's declared type, and a field-less
    /// error resolves through the registry's non-field table by kind.
    #[must_use]
    pub fn resolve(&self, schema: &Schema, registry: &CodeRegistry) -> ErrorRecord {
        let code = match (&self.code, &self.field) {
            (Some(code), _) => code.clone(),
            (None, Some(field)) => match schema.field_type(field) {
                Some(field_type) => registry.lookup(field_type, &self.kind),
                None => {
                    tracing::debug!(
                        schema = schema.name(),
                        field = %field,
                        "Registered error targets an undeclared field"
                    );
                    registry.lookup_kind(&self.kind)
                }
            },
            (None, None) => registry.lookup_non_field(&self.kind),
        };

        ErrorRecord {
            field: self.field.clone(),
            message: self.message.clone(),
            code,
        }
    }
}

/// Records registered manually during one validation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationBuffer {
    records: Vec<ErrorRecord>,
}

impl RegistrationBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn push(&mut self, record: ErrorRecord) {
        self.records.push(record);
    }

    /// Registered records, in call order.
    #[must_use]
    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// Number of registered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Turns an [`ErrorTree`] plus a [`RegistrationBuffer`] into records.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    schema: &'a Schema,
    registry: &'a CodeRegistry,
}

impl<'a> Normalizer<'a> {
    /// Creates a normalizer for one schema.
    #[must_use]
    pub const fn new(schema: &'a Schema, registry: &'a CodeRegistry) -> Self {
        Self { schema, registry }
    }

    /// Produces the ordered error list.
    #[must_use]
    pub fn normalize(&self, tree: &ErrorTree, buffer: &RegistrationBuffer) -> Vec<ErrorRecord> {
        let resolver = self.schema.resolver(self.registry);

        let mut field_groups: Vec<(&str, &[Leaf])> = Vec::new();
        let mut non_field: Vec<&Leaf> = Vec::new();
        let mut dict_entries: Vec<&(String, Leaf)> = Vec::new();

        for node in tree.nodes() {
            match node {
                ErrorNode::FieldGroup { field, leaves } => {
                    field_groups.push((field.as_str(), leaves.as_slice()));
                }
                ErrorNode::Leaf(leaf) => non_field.push(leaf),
                ErrorNode::NonFieldGroup { leaves } => non_field.extend(leaves),
                ErrorNode::DictGroup { entries } => dict_entries.extend(entries),
            }
        }

        // Stable: groups for the same or undeclared fields keep encounter order.
        field_groups.sort_by_key(|(field, _)| {
            self.schema.field_position(field).unwrap_or(usize::MAX)
        });

        let mut records = Vec::with_capacity(tree.leaf_count() + buffer.len());

        for (field, leaves) in field_groups {
            let field_type = self.schema.field_type(field);
            for leaf in leaves {
                if let Some(validator) = self.undeclared_validator(field, leaf) {
                    tracing::debug!(
                        schema = self.schema.name(),
                        field,
                        validator,
                        "Validator error on a field that does not declare it"
                    );
                }
                records.push(ErrorRecord::field(
                    field,
                    leaf.message.clone(),
                    resolver.resolve(&leaf.provenance, field_type),
                ));
            }
        }

        for leaf in non_field {
            records.push(ErrorRecord::non_field(
                leaf.message.clone(),
                resolver.resolve_non_field(leaf),
            ));
        }

        for (field, leaf) in dict_entries {
            let field_type = self.schema.field_type(field);
            records.push(ErrorRecord::field(
                field.clone(),
                leaf.message.clone(),
                resolver.resolve_dict_entry(field, field_type),
            ));
        }

        records.extend(buffer.records().iter().cloned());

        tracing::debug!(
            schema = self.schema.name(),
            errors = records.len(),
            registered = buffer.len(),
            "Normalized validation errors"
        );

        records
    }

    /// The kind of a validator leaf that the declared field does not list.
    /// Undeclared fields are not checked.
    fn undeclared_validator<'b>(&self, field: &str, leaf: &'b Leaf) -> Option<&'b str> {
        match (&leaf.provenance, self.schema.field(field)) {
            (Provenance::Validator(kind), Some(spec)) if !spec.has_validator(kind) => Some(kind.as_str()),
            _ => None,
        }
    }
}
