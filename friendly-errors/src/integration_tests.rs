//! End-to-end scenarios: a snippet schema validated, normalized and wrapped.

#[cfg(test)]
mod tests {
    use crate::codes::Code;
    use crate::config::{FriendlyErrorsConfig, Settings};
    use crate::envelope::EnvelopeBuilder;
    use crate::handler::Exception;
    use crate::normalizer::{ErrorRecord, ManualError};
    use crate::registry::CodeRegistry;
    use crate::schema::{FieldSpec, Schema};
    use crate::session::ValidationSession;
    use crate::tree::{ErrorNode, ErrorTree, Leaf, RawErrors};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn snippet_schema() -> Schema {
        Schema::builder("snippet")
            .field_with(FieldSpec::new("title", "CharField").with_validator("is_proper_title"))
            .field("comment", "CharField")
            .field("code", "CharField")
            .field("linenos", "BooleanField")
            .field("language", "ChoiceField")
            .field("rating", "DecimalField")
            .field("posted_date", "DateTimeField")
            .field_validation_error("is_proper_title", "incorrect_title")
            .build()
            .unwrap()
    }

    fn codes_of(schema: &Schema, tree: &ErrorTree) -> Vec<Code> {
        let registry = CodeRegistry::global();
        ValidationSession::new(schema, &registry)
            .finish(tree)
            .map(|result| result.errors.into_iter().map(|e| e.code).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_every_default_pair_yields_its_code() {
        let registry = CodeRegistry::global();
        for (field_type, kind, expected) in registry.field_entries() {
            let schema = Schema::builder("probe").field("value", field_type).build().unwrap();
            let tree = ErrorTree::new().with_field("value", vec![Leaf::built_in("failed", kind)]);
            assert_eq!(
                codes_of(&schema, &tree),
                vec![expected.clone()],
                "{field_type}.{kind}"
            );
        }
    }

    #[test]
    fn test_boolean_given_text() {
        let tree = ErrorTree::new().with_field(
            "linenos",
            vec![Leaf::built_in("Must be a valid boolean.", "invalid")],
        );
        let registry = CodeRegistry::global();
        assert_eq!(
            codes_of(&snippet_schema(), &tree),
            vec![registry.lookup("BooleanField", "invalid")]
        );
    }

    #[test]
    fn test_decimal_precision_kinds() {
        let schema = snippet_schema();
        let places = ErrorTree::new().with_field(
            "rating",
            vec![Leaf::built_in(
                "Ensure that there are no more than 1 decimal places.",
                "max_decimal_places",
            )],
        );
        let digits = ErrorTree::new().with_field(
            "rating",
            vec![Leaf::built_in(
                "Ensure that there are no more than 3 digits in total.",
                "max_digits",
            )],
        );

        assert_eq!(codes_of(&schema, &places), vec![Code::Int(2111)]);
        assert_eq!(codes_of(&schema, &digits), vec![Code::Int(2101)]);
    }

    #[test]
    fn test_two_independent_failures_yield_two_records() {
        let tree = ErrorTree::new()
            .with_field(
                "rating",
                vec![Leaf::built_in("A valid number is required.", "invalid")],
            )
            .with_field(
                "code",
                vec![Leaf::built_in("This field is required.", "required")],
            );

        let codes = codes_of(&snippet_schema(), &tree);
        assert_eq!(codes, vec![Code::Int(2001), Code::Int(2011)]);
    }

    #[test]
    fn test_custom_method_and_validator_codes() {
        let schema = snippet_schema();
        let tree = ErrorTree::new()
            .with_field(
                "comment",
                vec![Leaf::custom_method("First letter must be an uppercase", "validate_comment")],
            )
            .with_field("title", vec![Leaf::validator("Incorrect title", "is_proper_title")]);

        assert_eq!(
            codes_of(&schema, &tree),
            vec![Code::from("incorrect_title"), Code::from("validate_comment")]
        );

        let pinned = schema
            .derive("snippet_pinned")
            .field_validation_error("validate_comment", 5000)
            .field_validation_error("is_proper_title", 5001)
            .build()
            .unwrap();
        assert_eq!(codes_of(&pinned, &tree), vec![Code::Int(5001), Code::Int(5000)]);
    }

    #[test]
    fn test_whole_object_string_without_override() {
        let tree = ErrorTree::new().with_node(ErrorNode::from_whole_object(&RawErrors::from("Test"), "invalid"));
        let registry = CodeRegistry::global();
        assert_eq!(
            codes_of(&snippet_schema(), &tree),
            vec![registry.lookup_non_field("invalid")]
        );
    }

    #[test]
    fn test_whole_object_message_override() {
        let schema = snippet_schema()
            .derive("snippet_python")
            .non_field_error("Must be a python language", 8001)
            .build()
            .unwrap();
        let tree = ErrorTree::new().with_node(ErrorNode::from_whole_object(
            &RawErrors::from("Must be a python language"),
            "invalid",
        ));
        assert_eq!(codes_of(&schema, &tree), vec![Code::Int(8001)]);
    }

    #[test]
    fn test_whole_object_mapping_uses_field_overrides() {
        let schema = snippet_schema()
            .derive("snippet_dict")
            .field_validation_error("title", "custom_code")
            .build()
            .unwrap();
        let raw = RawErrors::from(&json!({
            "title": "not good",
            "linenos": "not good",
            "language": "not good"
        }));
        let tree = ErrorTree::new().with_node(ErrorNode::from_whole_object(&raw, "invalid"));

        assert_eq!(
            codes_of(&schema, &tree),
            vec![Code::from("custom_code"), Code::Int(2011), Code::Int(2011)]
        );
    }

    #[test]
    fn test_register_on_choice_field_matches_default() {
        let schema = snippet_schema();
        let registry = CodeRegistry::global();
        let mut session = ValidationSession::new(&schema, &registry);
        session.register(
            ManualError::new("Python, fool!")
                .kind("invalid_choice")
                .field("language"),
        );
        let result = session.finish(&ErrorTree::new()).unwrap();
        assert_eq!(
            result.errors,
            vec![ErrorRecord::field(
                "language",
                "Python, fool!",
                registry.lookup("ChoiceField", "invalid_choice")
            )]
        );

        let mut session = ValidationSession::new(&schema, &registry);
        session.register(ManualError::new("Python, fool!").field("language"));
        let invalid = session.finish(&ErrorTree::new()).unwrap();
        assert_eq!(invalid.errors[0].code, registry.lookup("ChoiceField", "invalid"));
    }

    #[test]
    fn test_mixed_registration() {
        let schema = snippet_schema();
        let registry = CodeRegistry::global();
        let mut session = ValidationSession::new(&schema, &registry);
        session.register_batch([
            ManualError::new("Python, fool!").code("custom_code"),
            ManualError::new("Not a boolean").kind("invalid").field("linenos"),
        ]);

        let envelope = session.finish(&ErrorTree::new()).unwrap().into_envelope(400);
        assert_eq!(
            envelope.to_value(),
            json!({
                "code": 1001,
                "message": "Validation Failed",
                "status_code": 400,
                "errors": [
                    {"field": null, "message": "Python, fool!", "code": "custom_code"},
                    {"field": "linenos", "message": "Not a boolean", "code": 2011}
                ]
            })
        );
    }

    #[test]
    fn test_double_build_through_handler() {
        let settings = Settings::from_config(FriendlyErrorsConfig::new()).unwrap();
        let handler = settings.handler();
        let first = handler
            .handle(&Exception::validation(json!({"title": ["Too long."]})))
            .unwrap();
        let second = handler
            .handle(&Exception::validation(first.to_value()))
            .unwrap();
        assert_eq!(first, second);

        let rebuilt = EnvelopeBuilder::new(settings.registry()).build(
            first.status_code,
            &first.to_value(),
            "ValidationError",
        );
        assert_eq!(rebuilt, first);
    }

    #[test]
    fn test_concurrent_sessions_share_schema_and_registry() {
        let schema = Arc::new(snippet_schema());
        let registry = CodeRegistry::global();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let schema = Arc::clone(&schema);
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let mut session = ValidationSession::new(&schema, &registry);
                    session.register(ManualError::new(format!("error {i}")).field("linenos"));
                    session.finish(&ErrorTree::new()).map(|r| r.errors)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let errors = handle.join().unwrap().unwrap();
            assert_eq!(errors, vec![ErrorRecord::field("linenos", format!("error {i}"), 2011)]);
        }
    }
}
