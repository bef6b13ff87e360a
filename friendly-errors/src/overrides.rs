//! Per-schema override tables and the resolution rules that consult them.
//!
//! A schema may pin codes for its own custom methods, validators, fields
//! and whole-object messages. Overrides are consulted before the
//! [`CodeRegistry`]; values are passed through verbatim.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::codes::Code;
use crate::registry::{CodeRegistry, INVALID};
use crate::tree::{Leaf, Provenance};

/// Codes a schema pins for its own errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideTable {
    /// Keyed by custom method name, validator kind, or field name.
    #[serde(default, rename = "FIELD_VALIDATION_ERRORS")]
    field_validation_errors: HashMap<String, Code>,
    /// Keyed by exact whole-object message text.
    #[serde(default, rename = "NON_FIELD_ERRORS")]
    non_field_errors: HashMap<String, Code>,
}

impl OverrideTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins a code for a custom method, validator kind, or field name.
    #[must_use]
    pub fn with_field_validation_error(
        mut self,
        key: impl Into<String>,
        code: impl Into<Code>,
    ) -> Self {
        self.field_validation_errors.insert(key.into(), code.into());
        self
    }

    /// Pins a code for an exact whole-object message.
    #[must_use]
    pub fn with_non_field_error(mut self, message: impl Into<String>, code: impl Into<Code>) -> Self {
        self.non_field_errors.insert(message.into(), code.into());
        self
    }

    /// The pinned code for a method, validator or field, if any.
    #[must_use]
    pub fn field_validation_error(&self, key: &str) -> Option<&Code> {
        self.field_validation_errors.get(key)
    }

    /// The pinned code for a whole-object message, if any.
    #[must_use]
    pub fn non_field_error(&self, message: &str) -> Option<&Code> {
        self.non_field_errors.get(message)
    }

    /// Iterates over every entry of both tables as `(key, code)`.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Code)> {
        self.field_validation_errors
            .iter()
            .chain(self.non_field_errors.iter())
            .map(|(key, code)| (key.as_str(), code))
    }

    /// True if neither table has entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_validation_errors.is_empty() && self.non_field_errors.is_empty()
    }
}

/// Resolves leaves to codes: schema overrides first, then the registry.
#[derive(Debug, Clone, Copy)]
pub struct OverrideResolver<'a> {
    overrides: &'a OverrideTable,
    registry: &'a CodeRegistry,
}

impl<'a> OverrideResolver<'a> {
    /// Creates a resolver over one schema's overrides.
    #[must_use]
    pub const fn new(overrides: &'a OverrideTable, registry: &'a CodeRegistry) -> Self {
        Self {
            overrides,
            registry,
        }
    }

    /// The registry consulted after the overrides.
    #[must_use]
    pub const fn registry(&self) -> &'a CodeRegistry {
        self.registry
    }

    /// Resolves a field leaf.
    ///
    /// `field_type` is the declared type of the field the leaf belongs to,
    /// or `None` if the field is not declared on the schema.
    #[must_use]
    pub fn resolve(&self, provenance: &Provenance, field_type: Option<&str>) -> Code {
        match provenance {
            Provenance::CustomMethod(method) => {
                if let Some(code) = self.overrides.field_validation_error(method) {
                    tracing::trace!(method = %method, %code, "Custom method override");
                    return code.clone();
                }
                Code::Str(method.clone())
            }
            Provenance::Validator(kind) => {
                if let Some(code) = self.overrides.field_validation_error(kind) {
                    tracing::trace!(validator = %kind, %code, "Validator override");
                    return code.clone();
                }
                self.registry.lookup_validator(kind)
            }
            Provenance::BuiltIn(kind) => self.lookup_field(field_type, kind),
            Provenance::Manual => self.lookup_field(field_type, INVALID),
        }
    }

    /// Resolves a whole-object leaf.
    ///
    /// Order: the schema's `NON_FIELD_ERRORS` by exact message, then the
    /// validator rule for validator leaves, then the registry's non-field
    /// table by message and finally by kind.
    #[must_use]
    pub fn resolve_non_field(&self, leaf: &Leaf) -> Code {
        if let Some(code) = self.overrides.non_field_error(&leaf.message) {
            tracing::trace!(message = %leaf.message, %code, "Non-field override");
            return code.clone();
        }
        if let Provenance::Validator(_) = leaf.provenance {
            return self.resolve(&leaf.provenance, None);
        }
        if let Some(code) = self.registry.get_non_field(&leaf.message) {
            return code.clone();
        }
        self.registry.lookup_non_field(leaf.provenance.kind())
    }

    /// Resolves one entry of a whole-object field mapping.
    ///
    /// The schema's `FIELD_VALIDATION_ERRORS` keyed by the field name wins;
    /// otherwise the field type's `invalid` code applies.
    #[must_use]
    pub fn resolve_dict_entry(&self, field: &str, field_type: Option<&str>) -> Code {
        if let Some(code) = self.overrides.field_validation_error(field) {
            tracing::trace!(field, %code, "Field name override");
            return code.clone();
        }
        self.lookup_field(field_type, INVALID)
    }

    fn lookup_field(&self, field_type: Option<&str>, kind: &str) -> Code {
        match field_type {
            Some(field_type) => self.registry.lookup(field_type, kind),
            None => self.registry.lookup_kind(kind),
        }
    }
}
