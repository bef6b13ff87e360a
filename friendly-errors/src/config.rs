//! Settings and code-table extension.
//!
//! Configuration is plain key-value data keyed by stable identifiers, so
//! it can live in a JSON file next to the rest of an application's
//! settings:
//!
//! ```json
//! {
//!   "catch_all_exceptions": true,
//!   "field_errors": {"MoneyField": {"invalid": 4001}},
//!   "validator_errors": {"IbanValidator": "bad_iban"},
//!   "non_field_errors": {"Dates overlap": 8100},
//!   "exception_codes": {"Conflict": 1409}
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::codes::Code;
use crate::errors::{FriendlyErrorsError, Result};
use crate::handler::{DefaultTranslator, FriendlyExceptionHandler};
use crate::registry::CodeRegistry;
use crate::schema::Schema;
use crate::session::{ValidationSession, DEFAULT_FAILURE_MESSAGE};

/// Friendly-errors settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendlyErrorsConfig {
    /// Coerce exceptions the translator does not recognize into a generic
    /// API exception instead of letting them propagate.
    #[serde(default)]
    pub catch_all_exceptions: bool,
    /// Summary message for validation failures.
    #[serde(default = "default_failure_message")]
    pub validation_failed_message: String,
    /// Extra `(field type, kind)` codes.
    #[serde(default)]
    pub field_errors: HashMap<String, HashMap<String, Code>>,
    /// Extra validator codes.
    #[serde(default)]
    pub validator_errors: HashMap<String, Code>,
    /// Extra non-field codes, keyed by message text or kind.
    #[serde(default)]
    pub non_field_errors: HashMap<String, Code>,
    /// Extra top-level exception codes.
    #[serde(default)]
    pub exception_codes: HashMap<String, Code>,
}

fn default_failure_message() -> String {
    DEFAULT_FAILURE_MESSAGE.to_string()
}

impl Default for FriendlyErrorsConfig {
    fn default() -> Self {
        Self {
            catch_all_exceptions: false,
            validation_failed_message: default_failure_message(),
            field_errors: HashMap::new(),
            validator_errors: HashMap::new(),
            non_field_errors: HashMap::new(),
            exception_codes: HashMap::new(),
        }
    }
}

impl FriendlyErrorsConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Enables or disables catch-all mode.
    #[must_use]
    pub const fn with_catch_all(mut self, enabled: bool) -> Self {
        self.catch_all_exceptions = enabled;
        self
    }

    /// Sets the validation failure message.
    #[must_use]
    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.validation_failed_message = message.into();
        self
    }

    /// Adds a `(field type, kind)` code.
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

    /// Adds a validator code.
    #[must_use]
    pub fn with_validator_error(mut self, kind: impl Into<String>, code: impl Into<Code>) -> Self {
        self.validator_errors.insert(kind.into(), code.into());
        self
    }

    /// Adds a non-field code.
    #[must_use]
    pub fn with_non_field_error(mut self, key: impl Into<String>, code: impl Into<Code>) -> Self {
        self.non_field_errors.insert(key.into(), code.into());
        self
    }

    /// Adds a top-level exception code.
    #[must_use]
    pub fn with_exception_code(mut self, class_name: impl Into<String>, code: impl Into<Code>) -> Self {
        self.exception_codes.insert(class_name.into(), code.into());
        self
    }

    /// Builds the registry: defaults with the configured entries on top.
    pub fn registry(&self) -> Result<CodeRegistry> {
        let mut registry = CodeRegistry::defaults();

        for (field_type, kinds) in &self.field_errors {
            check_key("field type", field_type)?;
            for (kind, code) in kinds {
                check_entry("field error", &format!("{field_type}.{kind}"), kind, code)?;
                registry = registry.with_field_error(field_type, kind, code.clone());
            }
        }
        for (kind, code) in &self.validator_errors {
            check_entry("validator", kind, kind, code)?;
            registry = registry.with_validator_error(kind, code.clone());
        }
        for (key, code) in &self.non_field_errors {
            check_entry("non-field error", key, key, code)?;
            registry = registry.with_non_field_error(key, code.clone());
        }
        for (class_name, code) in &self.exception_codes {
            check_entry("exception", class_name, class_name, code)?;
            registry = registry.with_exception_code(class_name, code.clone());
        }

        Ok(registry)
    }
}

fn check_key(what: &str, key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(FriendlyErrorsError::config(format!("empty {what} key")));
    }
    Ok(())
}

fn check_entry(what: &str, label: &str, key: &str, code: &Code) -> Result<()> {
    check_key(what, key)?;
    if code.is_blank() {
        return Err(FriendlyErrorsError::config(format!(
            "{what} '{label}' has an empty code"
        )));
    }
    Ok(())
}

/// Validated settings: configuration plus the registry built from it.
#[derive(Debug, Clone)]
pub struct Settings {
    config: FriendlyErrorsConfig,
    registry: Arc<CodeRegistry>,
}

impl Settings {
    /// Validates `config` and builds its registry.
    pub fn from_config(config: FriendlyErrorsConfig) -> Result<Self> {
        let registry = Arc::new(config.registry()?);
        tracing::debug!(
            catch_all = config.catch_all_exceptions,
            "Friendly errors configured"
        );
        Ok(Self { config, registry })
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &FriendlyErrorsConfig {
        &self.config
    }

    /// The registry built from the configuration.
    #[must_use]
    pub fn registry(&self) -> &CodeRegistry {
        &self.registry
    }

    /// Starts a validation session for `schema`.
    #[must_use]
    pub fn session<'a>(&'a self, schema: &'a Schema) -> ValidationSession<'a> {
        ValidationSession::new(schema, &self.registry)
            .with_failure_message(self.config.validation_failed_message.clone())
    }

    /// An exception handler using the default translator.
    #[must_use]
    pub fn handler(&self) -> FriendlyExceptionHandler<DefaultTranslator> {
        FriendlyExceptionHandler::new(DefaultTranslator, Arc::clone(&self.registry))
            .with_catch_all(self.config.catch_all_exceptions)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config: FriendlyErrorsConfig::default(),
            registry: CodeRegistry::global(),
        }
    }
}
