//! Default code tables.
//!
//! The registry maps stable string identifiers to codes:
//!
//! - `(field type, error kind)` for built-in field checks,
//! - validator kind for reusable validators,
//! - non-field message or kind for whole-object failures,
//! - exception class name for the top-level envelope code.
//!
//! Tables are built once and never mutated afterwards. Extension happens by
//! building a new registry on top of the defaults (see
//! [`crate::config::FriendlyErrorsConfig::registry`]).

use crate::codes::Code;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Error kind used whenever a more specific kind is unavailable.
pub const INVALID: &str = "invalid";

/// Code returned by field and validator lookups that match nothing.
pub const FALLBACK_FIELD_CODE: i64 = 2011;

/// Code returned by non-field lookups that match nothing.
pub const FALLBACK_NON_FIELD_CODE: i64 = 8000;

/// Field error codes shared by every field type that can emit the kind.
const SHARED_FIELD_CODES: &[(&str, i64)] = &[
    ("required", 2001),
    ("invalid", 2011),
    ("null", 2021),
    ("blank", 2031),
    ("max_length", 2041),
    ("min_length", 2051),
    ("max_value", 2061),
    ("min_value", 2071),
    ("invalid_choice", 2081),
    ("max_string_length", 2091),
    ("max_digits", 2101),
    ("max_decimal_places", 2111),
    ("max_whole_digits", 2121),
    ("date", 2131),
    ("datetime", 2141),
    ("not_a_list", 2151),
    ("empty", 2161),
    ("no_name", 2171),
    ("invalid_image", 2181),
    ("not_a_dict", 2191),
    ("does_not_exist", 2201),
    ("incorrect_type", 2211),
    ("no_match", 2221),
    ("incorrect_match", 2231),
];

const TEXT_KINDS: &[&str] = &[
    "required",
    "invalid",
    "null",
    "blank",
    "max_length",
    "min_length",
];

const NUMBER_KINDS: &[&str] = &[
    "required",
    "invalid",
    "null",
    "max_value",
    "min_value",
    "max_string_length",
];

const TEMPORAL_KINDS: &[&str] = &["required", "invalid", "null"];

/// Error kinds each built-in field type can emit.
const FIELD_KINDS: &[(&str, &[&str])] = &[
    ("BooleanField", &["required", "invalid", "null"]),
    ("NullBooleanField", &["required", "invalid"]),
    ("CharField", &["required", "null", "blank", "max_length", "min_length"]),
    ("EmailField", TEXT_KINDS),
    ("RegexField", TEXT_KINDS),
    ("SlugField", TEXT_KINDS),
    ("URLField", TEXT_KINDS),
    ("IPAddressField", TEXT_KINDS),
    ("UUIDField", &["required", "invalid", "null"]),
    ("FilePathField", &["required", "null", "invalid_choice"]),
    ("IntegerField", NUMBER_KINDS),
    ("FloatField", NUMBER_KINDS),
    (
        "DecimalField",
        &[
            "required",
            "invalid",
            "null",
            "max_value",
            "min_value",
            "max_string_length",
            "max_digits",
            "max_decimal_places",
            "max_whole_digits",
        ],
    ),
    ("DateTimeField", &["required", "invalid", "null", "date"]),
    ("DateField", &["required", "invalid", "null", "datetime"]),
    ("TimeField", TEMPORAL_KINDS),
    ("DurationField", TEMPORAL_KINDS),
    ("ChoiceField", &["required", "null", "invalid_choice"]),
    (
        "MultipleChoiceField",
        &["required", "null", "invalid_choice", "not_a_list", "empty"],
    ),
    (
        "FileField",
        &["required", "invalid", "null", "max_length", "empty", "no_name"],
    ),
    (
        "ImageField",
        &[
            "required",
            "invalid",
            "null",
            "max_length",
            "empty",
            "no_name",
            "invalid_image",
        ],
    ),
    ("ListField", &["required", "null", "not_a_list", "empty"]),
    ("DictField", &["required", "null", "not_a_dict"]),
    ("JSONField", &["required", "invalid", "null"]),
    (
        "PrimaryKeyRelatedField",
        &["required", "null", "does_not_exist", "incorrect_type"],
    ),
    (
        "HyperlinkedRelatedField",
        &[
            "required",
            "null",
            "no_match",
            "incorrect_match",
            "does_not_exist",
            "incorrect_type",
        ],
    ),
    (
        "SlugRelatedField",
        &["required", "null", "invalid", "does_not_exist"],
    ),
    ("ModelField", &["required", "null", "max_length"]),
];

const VALIDATOR_CODES: &[(&str, i64)] = &[
    ("UniqueValidator", 3001),
    ("UniqueTogetherValidator", 3003),
    ("UniqueForDateValidator", 3004),
    ("UniqueForMonthValidator", 3005),
    ("UniqueForYearValidator", 3006),
    ("RegexValidator", 3007),
    ("EmailValidator", 3008),
    ("URLValidator", 3009),
    ("MaxValueValidator", 3010),
    ("MinValueValidator", 3011),
    ("MaxLengthValidator", 3012),
    ("MinLengthValidator", 3013),
    ("DecimalValidator", 3014),
];

const NON_FIELD_CODES: &[(&str, i64)] = &[(INVALID, FALLBACK_NON_FIELD_CODE)];

const EXCEPTION_CODES: &[(&str, i64)] = &[
    ("APIException", 1000),
    ("ValidationError", 1001),
    ("ParseError", 1002),
    ("AuthenticationFailed", 1003),
    ("NotAuthenticated", 1004),
    ("PermissionDenied", 1005),
    ("NotFound", 1006),
    ("MethodNotAllowed", 1007),
    ("NotAcceptable", 1008),
    ("UnsupportedMediaType", 1009),
    ("Throttled", 1010),
];

/// Immutable lookup tables mapping stable identifiers to codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRegistry {
    field_errors: HashMap<String, HashMap<String, Code>>,
    shared_field_errors: HashMap<String, Code>,
    validator_errors: HashMap<String, Code>,
    non_field_errors: HashMap<String, Code>,
    exception_codes: HashMap<String, Code>,
    field_fallback: Code,
    non_field_fallback: Code,
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

impl CodeRegistry {
    /// Creates a registry with no entries; every lookup yields a fallback.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            field_errors: HashMap::new(),
            shared_field_errors: HashMap::new(),
            validator_errors: HashMap::new(),
            non_field_errors: HashMap::new(),
            exception_codes: HashMap::new(),
            field_fallback: Code::Int(FALLBACK_FIELD_CODE),
            non_field_fallback: Code::Int(FALLBACK_NON_FIELD_CODE),
        }
    }

    /// Creates a registry populated with the default tables.
    #[must_use]
    pub fn defaults() -> Self {
        let mut registry = Self::empty();

        for (kind, code) in SHARED_FIELD_CODES {
            registry
                .shared_field_errors
                .insert((*kind).to_string(), Code::Int(*code));
        }

        for (field_type, kinds) in FIELD_KINDS {
            let table = registry
                .field_errors
                .entry((*field_type).to_string())
                .or_default();
            for kind in *kinds {
                if let Some(code) = registry.shared_field_errors.get(*kind) {
                    table.insert((*kind).to_string(), code.clone());
                }
            }
        }

        registry.validator_errors = to_table(VALIDATOR_CODES);
        registry.non_field_errors = to_table(NON_FIELD_CODES);
        registry.exception_codes = to_table(EXCEPTION_CODES);
        registry
    }

    /// Returns the process-wide default registry.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&DEFAULT_REGISTRY)
    }

    /// Adds or replaces a `(field type, kind)` entry.
    #[must_use]
    pub fn with_field_error(
        mut self,
        field_type: impl Into<String>,
        kind: impl Into<String>,
        code: impl Into<Code>,
    ) -> Self {
        self.field_errors
            .entry(field_type.into())
            .or_default()
            .insert(kind.into(), code.into());
        self
    }

    /// Adds or replaces a validator entry.
    #[must_use]
    pub fn with_validator_error(mut self, kind: impl Into<String>, code: impl Into<Code>) -> Self {
        self.validator_errors.insert(kind.into(), code.into());
        self
    }

    /// Adds or replaces a non-field entry keyed by message text or kind.
    #[must_use]
    pub fn with_non_field_error(mut self, key: impl Into<String>, code: impl Into<Code>) -> Self {
        self.non_field_errors.insert(key.into(), code.into());
        self
    }

    /// Adds or replaces a top-level exception code.
    #[must_use]
    pub fn with_exception_code(
        mut self,
        class_name: impl Into<String>,
        code: impl Into<Code>,
    ) -> Self {
        self.exception_codes.insert(class_name.into(), code.into());
        self
    }

    /// Looks up the code for a built-in field failure.
    ///
    /// Falls back to the code shared by every type for `kind`, then to the
    /// generic field `invalid` code.
    #[must_use]
    pub fn lookup(&self, field_type: &str, kind: &str) -> Code {
        if let Some(code) = self.field_errors.get(field_type).and_then(|t| t.get(kind)) {
            return code.clone();
        }
        tracing::trace!(field_type, kind, "No typed field code, using shared kind table");
        self.lookup_kind(kind)
    }

    /// Looks up a field failure when the field type is unknown.
    #[must_use]
    pub fn lookup_kind(&self, kind: &str) -> Code {
        self.shared_field_errors
            .get(kind)
            .cloned()
            .unwrap_or_else(|| self.field_fallback.clone())
    }

    /// Looks up the code for a reusable validator.
    #[must_use]
    pub fn lookup_validator(&self, kind: &str) -> Code {
        self.get_validator(kind)
            .cloned()
            .unwrap_or_else(|| self.field_fallback.clone())
    }

    /// Looks up the code for a non-field failure by message text or kind.
    #[must_use]
    pub fn lookup_non_field(&self, key: &str) -> Code {
        self.get_non_field(key)
            .cloned()
            .unwrap_or_else(|| self.non_field_fallback.clone())
    }

    /// Looks up the top-level code for an exception class name.
    #[must_use]
    pub fn lookup_top_level(&self, class_name: &str) -> Option<Code> {
        self.exception_codes.get(class_name).cloned()
    }

    /// Returns the validator entry without applying the fallback.
    #[must_use]
    pub fn get_validator(&self, kind: &str) -> Option<&Code> {
        self.validator_errors.get(kind)
    }

    /// Returns the non-field entry without applying the fallback.
    #[must_use]
    pub fn get_non_field(&self, key: &str) -> Option<&Code> {
        self.non_field_errors.get(key)
    }

    /// Iterates over every `(field type, kind, code)` entry.
    pub fn field_entries(&self) -> impl Iterator<Item = (&str, &str, &Code)> {
        self.field_errors.iter().flat_map(|(field_type, table)| {
            table
                .iter()
                .map(move |(kind, code)| (field_type.as_str(), kind.as_str(), code))
        })
    }

    /// Returns true if the field type has its own table.
    #[must_use]
    pub fn knows_field_type(&self, field_type: &str) -> bool {
        self.field_errors.contains_key(field_type)
    }

    /// The code returned when a field or validator lookup misses.
    #[must_use]
    pub const fn field_fallback(&self) -> &Code {
        &self.field_fallback
    }

    /// The code returned when a non-field lookup misses.
    #[must_use]
    pub const fn non_field_fallback(&self) -> &Code {
        &self.non_field_fallback
    }
}

fn to_table(entries: &[(&str, i64)]) -> HashMap<String, Code> {
    entries
        .iter()
        .map(|(key, code)| ((*key).to_string(), Code::Int(*code)))
        .collect()
}

/// Process-wide default registry.
pub static DEFAULT_REGISTRY: LazyLock<Arc<CodeRegistry>> =
    LazyLock::new(|| Arc::new(CodeRegistry::defaults()));
