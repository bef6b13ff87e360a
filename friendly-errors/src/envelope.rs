//! The response envelope and its idempotent builder.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::codes::Code;
use crate::normalizer::{ErrorRecord, Normalizer, RegistrationBuffer};
use crate::registry::CodeRegistry;
use crate::schema::Schema;
use crate::tree::{ErrorTree, DETAIL_KEY};

const ENVELOPE_KEYS: [&str; 4] = ["code", "message", "status_code", "errors"];

/// The wire-level error response.
///
/// An envelope adopted from data that already had the envelope shape keeps
/// that data verbatim: [`Envelope::to_value`] and serialization return it
/// unchanged, and the typed fields are a best-effort view of it.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Top-level code for the exception class; `None` when unmapped.
    pub code: Option<Code>,
    /// Human-readable summary.
    pub message: String,
    /// HTTP status code, passed through unchanged.
    pub status_code: u16,
    /// Flat, ordered error list.
    pub errors: Vec<ErrorRecord>,
    verbatim: Option<Value>,
}

impl Envelope {
    /// Creates an envelope.
    #[must_use]
    pub fn new(code: Option<Code>, message: impl Into<String>, status_code: u16, errors: Vec<ErrorRecord>) -> Self {
        Self {
            code,
            message: message.into(),
            status_code,
            errors,
            verbatim: None,
        }
    }

    /// Serializes to JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match &self.verbatim {
            Some(data) => data.clone(),
            None => serde_json::json!({
                "code": self.code,
                "message": self.message,
                "status_code": self.status_code,
                "errors": self.errors,
            }),
        }
    }

    /// Adopts `data` if it already has the envelope shape.
    ///
    /// Only the top level is inspected. Records that do not parse as
    /// [`ErrorRecord`] are left out of `errors` but kept in the verbatim
    /// data.
    #[must_use]
    pub fn from_value(data: &Value) -> Option<Self> {
        if !is_normalized(data) {
            return None;
        }

        let code = data
            .get("code")
            .and_then(|code| serde_json::from_value(code.clone()).ok());
        let message = match data.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let status_code = data
            .get("status_code")
            .and_then(Value::as_u64)
            .and_then(|status| u16::try_from(status).ok())
            .unwrap_or_default();
        let errors = data
            .get("errors")
            .and_then(Value::as_array)
            .map(|records| {
                records
                    .iter()
                    .filter_map(|record| serde_json::from_value(record.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            code,
            message,
            status_code,
            errors,
            verbatim: Some(data.clone()),
        })
    }

    /// True if this envelope was adopted from pre-built data.
    #[must_use]
    pub const fn is_verbatim(&self) -> bool {
        self.verbatim.is_some()
    }
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.to_value() == other.to_value()
    }
}

impl Eq for Envelope {}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(data) = &self.verbatim {
            return data.serialize(serializer);
        }
        let mut state = serializer.serialize_struct("Envelope", ENVELOPE_KEYS.len())?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("status_code", &self.status_code)?;
        state.serialize_field("errors", &self.errors)?;
        state.end()
    }
}

/// True if `data` is exactly `{code, message, status_code, errors: [...]}`.
///
/// Only the top-level keys and the list type of `errors` are checked.
#[must_use]
pub fn is_normalized(data: &Value) -> bool {
    let Some(map) = data.as_object() else {
        return false;
    };
    map.len() == ENVELOPE_KEYS.len()
        && ENVELOPE_KEYS.iter().all(|key| map.contains_key(*key))
        && map.get("errors").is_some_and(Value::is_array)
}

/// Builds envelopes from translated exception responses.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeBuilder<'a> {
    registry: &'a CodeRegistry,
    schema: Option<&'a Schema>,
}

impl<'a> EnvelopeBuilder<'a> {
    /// Creates a builder with no schema context.
    ///
    /// Without a schema, field types are unknown and field entries resolve
    /// through the shared kind table.
    #[must_use]
    pub const fn new(registry: &'a CodeRegistry) -> Self {
        Self {
            registry,
            schema: None,
        }
    }

    /// Resolves field entries against `schema`'s types and overrides.
    #[must_use]
    pub const fn with_schema(mut self, schema: &'a Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Wraps a translated response into an envelope.
    ///
    /// Data that is already an envelope is returned unchanged, so building
    /// twice yields the same result as building once.
    #[must_use]
    pub fn build(&self, status_code: u16, data: &Value, exception_class_name: &str) -> Envelope {
        if let Some(envelope) = Envelope::from_value(data) {
            tracing::trace!(exception = exception_class_name, "Response already normalized");
            return envelope;
        }

        let message = match data.get(DETAIL_KEY) {
            Some(Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => exception_class_name.to_string(),
        };

        let tree = ErrorTree::from_response_data(data);
        let errors = match self.schema {
            Some(schema) => {
                Normalizer::new(schema, self.registry).normalize(&tree, &RegistrationBuffer::new())
            }
            None => Normalizer::new(&Schema::anonymous(), self.registry)
                .normalize(&tree, &RegistrationBuffer::new()),
        };

        let code = self.registry.lookup_top_level(exception_class_name);
        tracing::debug!(
            exception = exception_class_name,
            status_code,
            errors = errors.len(),
            "Built error envelope"
        );

        Envelope::new(code, message, status_code, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_detail_becomes_message() {
        let registry = CodeRegistry::defaults();
        let envelope = EnvelopeBuilder::new(&registry).build(404, &json!({"detail": "Not found."}), "NotFound");

        assert_eq!(
            envelope,
            Envelope::new(Some(Code::Int(1006)), "Not found.", 404, vec![])
        );
    }

    #[test]
    fn test_missing_detail_uses_class_name() {
        let registry = CodeRegistry::defaults();
        let envelope = EnvelopeBuilder::new(&registry).build(
            400,
            &json!({"linenos": ["Must be a valid boolean."]}),
            "ValidationError",
        );

        assert_eq!(envelope.message, "ValidationError");
        assert_eq!(envelope.code, Some(Code::Int(1001)));
        assert_eq!(
            envelope.errors,
            vec![ErrorRecord::field("linenos", "Must be a valid boolean.", 2011)]
        );
    }

    #[test]
    fn test_unmapped_exception_has_null_code() {
        let registry = CodeRegistry::defaults();
        let envelope = EnvelopeBuilder::new(&registry).build(400, &json!({"detail": "Teapot"}), "TeapotError");
        assert_eq!(envelope.code, None);
        assert_eq!(envelope.to_value()["code"], Value::Null);
    }

    #[test]
    fn test_build_is_idempotent() {
        let registry = CodeRegistry::defaults();
        let builder = EnvelopeBuilder::new(&registry);
        let inputs = [
            json!({"detail": "Not found."}),
            json!({"title": ["Too long."], "non_field_errors": ["Broken"]}),
            json!(["a", "b"]),
            json!({}),
        ];

        for input in inputs {
            let once = builder.build(400, &input, "ValidationError");
            let twice = builder.build(400, &once.to_value(), "ValidationError");
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_prebuilt_envelope_passes_through_untouched() {
        let registry = CodeRegistry::defaults();
        let custom = json!({
            "code": "custom",
            "message": "Pre-built",
            "status_code": 409,
            "errors": [{"field": null, "message": "Conflict", "code": 42}]
        });

        let envelope = EnvelopeBuilder::new(&registry).build(500, &custom, "APIException");
        assert_eq!(envelope.to_value(), custom);
    }

    #[test]
    fn test_is_normalized_requires_exact_shape() {
        assert!(is_normalized(&json!({
            "code": null, "message": "m", "status_code": 400, "errors": []
        })));
        assert!(!is_normalized(&json!({
            "message": "m", "status_code": 400, "errors": []
        })));
        assert!(!is_normalized(&json!({
            "code": 1, "message": "m", "status_code": 400, "errors": [], "extra": true
        })));
        assert!(!is_normalized(&json!({
            "code": 1, "message": "m", "status_code": 400, "errors": "nope"
        })));
        assert!(!is_normalized(&json!(["code", "message", "status_code", "errors"])));
    }

    #[test]
    fn test_prebuilt_envelope_with_extra_record_keys_is_kept() {
        let registry = CodeRegistry::defaults();
        let custom = json!({
            "code": 1001,
            "message": "Custom",
            "status_code": 400,
            "errors": [
                {"field": "title", "message": "Too long", "code": 2041, "hint": "shorten"}
            ]
        });

        let envelope = EnvelopeBuilder::new(&registry).build(400, &custom, "ValidationError");

        assert!(envelope.is_verbatim());
        assert_eq!(envelope.to_value(), custom);
        assert_eq!(serde_json::to_value(&envelope).unwrap(), custom);
        assert_eq!(envelope.message, "Custom");
        assert!(envelope.errors.is_empty());
    }

    #[test]
    fn test_prebuilt_envelope_with_unusual_codes_is_kept() {
        let registry = CodeRegistry::defaults();
        let builder = EnvelopeBuilder::new(&registry);
        let custom = json!({
            "code": {"namespace": "billing", "id": 7},
            "message": "Payment declined",
            "status_code": 402,
            "errors": [{"field": null, "message": "Card expired", "code": 12.5}]
        });

        let once = builder.build(500, &custom, "APIException");
        let twice = builder.build(500, &once.to_value(), "APIException");

        assert_eq!(once.to_value(), custom);
        assert_eq!(once, twice);
        assert_eq!(once.code, None);
        assert_eq!(once.status_code, 402);
    }

    #[test]
    fn test_list_valued_field_yields_one_record() {
        let registry = CodeRegistry::defaults();
        let envelope = EnvelopeBuilder::new(&registry).build(
            400,
            &json!({"rating": ["A valid number is required.", "Ensure no more than 3 digits."]}),
            "ValidationError",
        );

        assert_eq!(
            envelope.errors,
            vec![ErrorRecord::field("rating", "A valid number is required.", 2011)]
        );
    }

    #[test]
    fn test_is_normalized_checks_top_level_only() {
        assert!(is_normalized(&json!({
            "code": [1], "message": 5, "status_code": "x", "errors": [{"anything": true}]
        })));
    }

    #[test]
    fn test_schema_context_applies_types_and_overrides() {
        let registry = CodeRegistry::defaults();
        let schema = Schema::builder("snippet")
            .field("language", "ChoiceField")
            .field("title", "CharField")
            .field_validation_error("title", "custom_code")
            .build()
            .unwrap();

        let envelope = EnvelopeBuilder::new(&registry).with_schema(&schema).build(
            400,
            &json!({"title": "not good", "language": "not good"}),
            "ValidationError",
        );

        assert_eq!(
            envelope.errors,
            vec![
                ErrorRecord::field("title", "not good", "custom_code"),
                ErrorRecord::field("language", "not good", 2011),
            ]
        );
    }
}
