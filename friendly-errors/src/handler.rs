//! Exception handling at the HTTP boundary.
//!
//! An upstream [`ExceptionTranslator`] turns an exception into a status
//! code and a response body, or declines. The [`FriendlyExceptionHandler`]
//! wraps whatever the translator produced into an [`Envelope`]. Exceptions
//! the translator declines either propagate (`None`) or, in catch-all mode,
//! are coerced into a generic API exception first.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::envelope::{Envelope, EnvelopeBuilder};
use crate::registry::CodeRegistry;
use crate::schema::Schema;
use crate::tree::DETAIL_KEY;

/// Class name of the generic exception unrecognized errors are coerced to.
pub const API_EXCEPTION_CLASS: &str = "APIException";

/// Status code of the generic API exception.
pub const API_EXCEPTION_STATUS: u16 = 500;

/// Status codes of the exception classes the default translator knows.
const KNOWN_EXCEPTIONS: &[(&str, u16)] = &[
    (API_EXCEPTION_CLASS, API_EXCEPTION_STATUS),
    ("ValidationError", 400),
    ("ParseError", 400),
    ("AuthenticationFailed", 401),
    ("NotAuthenticated", 401),
    ("PermissionDenied", 403),
    ("NotFound", 404),
    ("MethodNotAllowed", 405),
    ("NotAcceptable", 406),
    ("UnsupportedMediaType", 415),
    ("Throttled", 429),
];

/// An exception raised while handling a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Exception {
    /// The exception's class name, e.g. `"ValidationError"`.
    pub class_name: String,
    /// Message string or structured error detail.
    pub detail: Value,
    /// Status code carried by the exception itself, if any.
    pub status_code: Option<u16>,
}

impl Exception {
    /// Creates an exception.
    #[must_use]
    pub fn new(class_name: impl Into<String>, detail: Value) -> Self {
        Self {
            class_name: class_name.into(),
            detail,
            status_code: None,
        }
    }

    /// A validation failure carrying structured detail.
    #[must_use]
    pub fn validation(detail: Value) -> Self {
        Self::new("ValidationError", detail)
    }

    /// Overrides the status code.
    #[must_use]
    pub const fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// The detail as a single message.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(message) => message.clone(),
            Value::Null => self.class_name.clone(),
            other => other.to_string(),
        }
    }

    /// Wraps an unrecognized exception into a generic API exception.
    #[must_use]
    pub fn coerce_to_api_exception(&self) -> Self {
        Self::new(API_EXCEPTION_CLASS, Value::String(self.message()))
    }
}

/// A translated exception response.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body.
    pub data: Value,
}

/// Translates exceptions into responses, or declines.
pub trait ExceptionTranslator: Send + Sync {
    /// Returns `None` for exceptions the translator does not handle.
    fn translate(&self, exception: &Exception) -> Option<TranslatedResponse>;
}

/// Translator for the standard API exception classes.
///
/// Structured detail (objects, lists) becomes the body as-is; a plain
/// message becomes `{"detail": message}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTranslator;

impl DefaultTranslator {
    /// Default status for a known exception class.
    #[must_use]
    pub fn status_for(class_name: &str) -> Option<u16> {
        KNOWN_EXCEPTIONS
            .iter()
            .find(|(name, _)| *name == class_name)
            .map(|(_, status)| *status)
    }
}

impl ExceptionTranslator for DefaultTranslator {
    fn translate(&self, exception: &Exception) -> Option<TranslatedResponse> {
        let default_status = Self::status_for(&exception.class_name)?;
        let data = match &exception.detail {
            Value::Object(_) | Value::Array(_) => exception.detail.clone(),
            _ => json!({ DETAIL_KEY: exception.message() }),
        };
        Some(TranslatedResponse {
            status_code: exception.status_code.unwrap_or(default_status),
            data,
        })
    }
}

/// Wraps translated exception responses into envelopes.
pub struct FriendlyExceptionHandler<T = DefaultTranslator> {
    translator: T,
    registry: Arc<CodeRegistry>,
    schema: Option<Arc<Schema>>,
    catch_all: bool,
}

impl<T: ExceptionTranslator> FriendlyExceptionHandler<T> {
    /// Creates a handler; catch-all mode is off.
    #[must_use]
    pub fn new(translator: T, registry: Arc<CodeRegistry>) -> Self {
        Self {
            translator,
            registry,
            schema: None,
            catch_all: false,
        }
    }

    /// Enables or disables catch-all mode.
    #[must_use]
    pub fn with_catch_all(mut self, enabled: bool) -> Self {
        self.catch_all = enabled;
        self
    }

    /// Resolves field entries against `schema`.
    #[must_use]
    pub fn with_schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// True if catch-all mode is on.
    #[must_use]
    pub const fn catch_all(&self) -> bool {
        self.catch_all
    }

    /// Handles an exception.
    ///
    /// Returns `None` when the exception should propagate unmodified.
    #[must_use]
    pub fn handle(&self, exception: &Exception) -> Option<Envelope> {
        let (exception, response) = match self.translator.translate(exception) {
            Some(response) => (exception.clone(), response),
            None if self.catch_all => {
                tracing::warn!(
                    exception = %exception.class_name,
                    "Unrecognized exception coerced to {}",
                    API_EXCEPTION_CLASS
                );
                let coerced = exception.coerce_to_api_exception();
                let response = self.translator.translate(&coerced)?;
                (coerced, response)
            }
            None => {
                tracing::debug!(
                    exception = %exception.class_name,
                    "Exception not recognized, propagating"
                );
                return None;
            }
        };

        let mut builder = EnvelopeBuilder::new(&self.registry);
        if let Some(schema) = &self.schema {
            builder = builder.with_schema(schema);
        }
        Some(builder.build(response.status_code, &response.data, &exception.class_name))
    }
}

impl<T> std::fmt::Debug for FriendlyExceptionHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FriendlyExceptionHandler")
            .field("catch_all", &self.catch_all)
            .field("schema", &self.schema.as_ref().map(|s| s.name().to_string()))
            .finish_non_exhaustive()
    }
}
