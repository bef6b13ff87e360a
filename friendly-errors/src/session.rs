//! Per-invocation validation session.
//!
//! A [`ValidationSession`] lives for exactly one validation call. It owns
//! the registration buffer that manual `register` calls append to, and it
//! turns the call's error tree into a [`ValidationErrors`] result.

use serde::{Deserialize, Serialize};

use crate::codes::Code;
use crate::envelope::Envelope;
use crate::normalizer::{ErrorRecord, ManualError, Normalizer, RegistrationBuffer};
use crate::registry::CodeRegistry;
use crate::schema::Schema;
use crate::tree::ErrorTree;

/// Exception class name whose top-level code validation failures carry.
pub const VALIDATION_ERROR_CLASS: &str = "ValidationError";

/// Default summary message for validation failures.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Validation Failed";

/// The normalized result of a failed validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    /// Top-level code for validation failures.
    pub code: Option<Code>,
    /// Summary message.
    pub message: String,
    /// Flat, ordered error list.
    pub errors: Vec<ErrorRecord>,
}

impl ValidationErrors {
    /// Wraps the result into a full response envelope.
    #[must_use]
    pub fn into_envelope(self, status_code: u16) -> Envelope {
        Envelope::new(self.code, self.message, status_code, self.errors)
    }
}

/// State for one validation call.
#[derive(Debug)]
pub struct ValidationSession<'a> {
    schema: &'a Schema,
    registry: &'a CodeRegistry,
    buffer: RegistrationBuffer,
    failure_message: String,
}

impl<'a> ValidationSession<'a> {
    /// Starts a session for one validation of `schema`.
    #[must_use]
    pub fn new(schema: &'a Schema, registry: &'a CodeRegistry) -> Self {
        Self {
            schema,
            registry,
            buffer: RegistrationBuffer::new(),
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Sets the summary message used when validation fails.
    #[must_use]
    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = message.into();
        self
    }

    /// Registers an error manually.
    ///
    /// Meant to be called from the whole-object validation step.
    pub fn register(&mut self, error: ManualError) {
        let record = error.resolve(self.schema, self.registry);
        tracing::trace!(
            schema = self.schema.name(),
            field = ?record.field,
            code = %record.code,
            "Registered error"
        );
        self.buffer.push(record);
    }

    /// Registers several errors, in order.
    pub fn register_batch(&mut self, errors: impl IntoIterator<Item = ManualError>) {
        for error in errors {
            self.register(error);
        }
    }

    /// Records registered so far.
    #[must_use]
    pub fn registered(&self) -> &[ErrorRecord] {
        self.buffer.records()
    }

    /// Ends the session.
    ///
    /// Returns `None` when neither the tree nor the buffer holds an error.
    #[must_use]
    pub fn finish(self, tree: &ErrorTree) -> Option<ValidationErrors> {
        if tree.is_empty() && self.buffer.is_empty() {
            return None;
        }

        let errors = Normalizer::new(self.schema, self.registry).normalize(tree, &self.buffer);
        Some(ValidationErrors {
            code: self.registry.lookup_top_level(VALIDATION_ERROR_CLASS),
            message: self.failure_message,
            errors,
        })
    }
}
