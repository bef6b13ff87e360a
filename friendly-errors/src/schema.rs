//! Schema definitions: declared fields, their types, and attached overrides.
//!
//! A [`Schema`] is what the normalizer needs to know about a validation
//! target: the declared field order, each field's type identifier (the key
//! into the registry's field table) and the schema's own [`OverrideTable`].
//! Overrides are attached explicitly to each schema and never inherited.

use std::collections::HashMap;
use std::sync::Arc;

use crate::codes::Code;
use crate::errors::{Result, SchemaError};
use crate::overrides::{OverrideResolver, OverrideTable};
use crate::registry::CodeRegistry;

/// A declared schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Type identifier, e.g. `"CharField"`.
    pub field_type: String,
    /// Kinds of the validators attached to the field.
    pub validators: Vec<String>,
}

impl FieldSpec {
    /// Creates a field without validators.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            validators: Vec::new(),
        }
    }

    /// Attaches a validator kind.
    #[must_use]
    pub fn with_validator(mut self, kind: impl Into<String>) -> Self {
        self.validators.push(kind.into());
        self
    }

    /// True if a validator of `kind` is attached.
    #[must_use]
    pub fn has_validator(&self, kind: &str) -> bool {
        self.validators.iter().any(|v| v == kind)
    }
}

/// An immutable schema definition.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
    positions: HashMap<String, usize>,
    overrides: Arc<OverrideTable>,
}

impl Schema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// A schema with no declared fields and no overrides.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".to_string(),
            fields: Vec::new(),
            positions: HashMap::new(),
            overrides: Arc::new(OverrideTable::new()),
        }
    }

    /// Starts a new schema with this schema's fields and overrides copied.
    ///
    /// The copy is explicit: later changes to the builder do not affect
    /// `self`.
    #[must_use]
    pub fn derive(&self, name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: self.fields.clone(),
            overrides: (*self.overrides).clone(),
        }
    }

    /// The schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a declared field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.positions.get(name).map(|&idx| &self.fields[idx])
    }

    /// The declared type of a field.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.field_type.as_str())
    }

    /// Declaration index of a field.
    #[must_use]
    pub fn field_position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// The schema's override table.
    #[must_use]
    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    /// A resolver over this schema's overrides and `registry`.
    #[must_use]
    pub fn resolver<'a>(&'a self, registry: &'a CodeRegistry) -> OverrideResolver<'a> {
        OverrideResolver::new(&self.overrides, registry)
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    overrides: OverrideTable,
}

impl SchemaBuilder {
    /// Creates a builder for a schema called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            overrides: OverrideTable::new(),
        }
    }

    /// Declares a field without validators.
    #[must_use]
    pub fn field(self, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        self.field_with(FieldSpec::new(name, field_type))
    }

    /// Declares a fully specified field.
    #[must_use]
    pub fn field_with(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Pins a code in `FIELD_VALIDATION_ERRORS`.
    #[must_use]
    pub fn field_validation_error(mut self, key: impl Into<String>, code: impl Into<Code>) -> Self {
        self.overrides = self.overrides.with_field_validation_error(key, code);
        self
    }

    /// Pins a code in `NON_FIELD_ERRORS`.
    #[must_use]
    pub fn non_field_error(mut self, message: impl Into<String>, code: impl Into<Code>) -> Self {
        self.overrides = self.overrides.with_non_field_error(message, code);
        self
    }

    /// Replaces the override table wholesale.
    #[must_use]
    pub fn overrides(mut self, overrides: OverrideTable) -> Self {
        self.overrides = overrides;
        self
    }

    /// Validates the definition and freezes it.
    pub fn build(self) -> Result<Schema> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyName.into());
        }

        let mut positions = HashMap::with_capacity(self.fields.len());
        for (idx, field) in self.fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(SchemaError::EmptyFieldName {
                    schema: self.name.clone(),
                }
                .into());
            }
            if field.field_type.trim().is_empty() {
                return Err(SchemaError::EmptyFieldType {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                }
                .into());
            }
            if positions.insert(field.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateField {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                }
                .into());
            }
        }

        for (key, code) in self.overrides.entries() {
            if key.trim().is_empty() || code.is_blank() {
                return Err(SchemaError::EmptyOverride {
                    schema: self.name.clone(),
                    key: key.to_string(),
                }
                .into());
            }
        }

        tracing::debug!(
            schema = %self.name,
            fields = self.fields.len(),
            "Schema defined"
        );

        Ok(Schema {
            name: self.name,
            fields: self.fields,
            positions,
            overrides: Arc::new(self.overrides),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FriendlyErrorsError;

    #[test]
    fn test_schema_keeps_declaration_order() {
        let schema = Schema::builder("snippet")
            .field("title", "CharField")
            .field("linenos", "BooleanField")
            .field("language", "ChoiceField")
            .build()
            .unwrap();

        assert_eq!(schema.name(), "snippet");
        assert_eq!(schema.field_position("title"), Some(0));
        assert_eq!(schema.field_position("language"), Some(2));
        assert_eq!(schema.field_type("linenos"), Some("BooleanField"));
        assert_eq!(schema.field_type("missing"), None);
    }

    #[test]
    fn test_schema_field_validators() {
        let schema = Schema::builder("snippet")
            .field_with(FieldSpec::new("title", "CharField").with_validator("is_proper_title"))
            .build()
            .unwrap();

        let title = schema.field("title").unwrap();
        assert!(title.has_validator("is_proper_title"));
        assert!(!title.has_validator("UniqueValidator"));
    }

    #[test]
    fn test_schema_duplicate_field_rejected() {
        let result = Schema::builder("snippet")
            .field("title", "CharField")
            .field("title", "CharField")
            .build();

        assert!(matches!(
            result,
            Err(FriendlyErrorsError::Schema(SchemaError::DuplicateField { .. }))
        ));
    }

    #[test]
    fn test_schema_empty_parts_rejected() {
        assert!(Schema::builder("  ").build().is_err());
        assert!(Schema::builder("s").field("", "CharField").build().is_err());
        assert!(Schema::builder("s").field("title", "").build().is_err());
        assert!(Schema::builder("s")
            .field_validation_error("validate_title", "")
            .build()
            .is_err());
    }

    #[test]
    fn test_derive_copies_without_sharing() {
        let base = Schema::builder("snippet")
            .field("comment", "CharField")
            .field_validation_error("validate_comment", 5000)
            .build()
            .unwrap();

        let derived = base
            .derive("snippet_v2")
            .field_validation_error("validate_comment", "validate_comment")
            .build()
            .unwrap();

        assert_eq!(
            base.overrides().field_validation_error("validate_comment"),
            Some(&Code::Int(5000))
        );
        assert_eq!(
            derived.overrides().field_validation_error("validate_comment"),
            Some(&Code::from("validate_comment"))
        );
        assert_eq!(derived.field_type("comment"), Some("CharField"));
    }
}
