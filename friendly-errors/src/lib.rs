//! # Friendly Errors
//!
//! Stable, machine-readable error codes for API validation failures.
//!
//! Validation frameworks report failures as nested trees of messages. This
//! crate flattens such trees into an ordered list of
//! `{field, message, code}` records and wraps them into a uniform response
//! envelope:
//!
//! - **Code registry**: default codes per field type and error kind, per
//!   validator and per exception class, extensible through configuration
//! - **Schema overrides**: codes pinned by a schema for its own custom
//!   methods, validators, fields and whole-object messages
//! - **Manual registration**: errors registered during whole-object
//!   validation, appended after everything the tree reported
//! - **Idempotent envelopes**: a response that is already an envelope
//!   passes through untouched
//!
//! ## Quick Start
//!
//! ```rust
//! use friendly_errors::prelude::*;
//!
//! let schema = Schema::builder("snippet")
//!     .field("linenos", "BooleanField")
//!     .field("language", "ChoiceField")
//!     .build()?;
//!
//! let registry = CodeRegistry::global();
//! let mut session = ValidationSession::new(&schema, &registry);
//! session.register(ManualError::new("Python, fool!").kind("invalid_choice").field("language"));
//!
//! let tree = ErrorTree::new().with_field(
//!     "linenos",
//!     vec![Leaf::built_in("Must be a valid boolean.", "invalid")],
//! );
//! let envelope = session
//!     .finish(&tree)
//!     .expect("validation failed")
//!     .into_envelope(400);
//!
//! assert_eq!(envelope.errors.len(), 2);
//! assert_eq!(envelope.errors[1].code, Code::Int(2081));
//! # Ok::<(), friendly_errors::errors::FriendlyErrorsError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod codes;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod handler;
pub mod normalizer;
pub mod observability;
pub mod overrides;
pub mod registry;
pub mod schema;
pub mod session;
pub mod tree;

#[cfg(test)]
mod integration_tests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::codes::Code;
    pub use crate::config::{FriendlyErrorsConfig, Settings};
    pub use crate::envelope::{is_normalized, Envelope, EnvelopeBuilder};
    pub use crate::errors::{FriendlyErrorsError, Result, SchemaError};
    pub use crate::handler::{
        DefaultTranslator, Exception, ExceptionTranslator, FriendlyExceptionHandler,
        TranslatedResponse,
    };
    pub use crate::normalizer::{ErrorRecord, ManualError, Normalizer, RegistrationBuffer};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::overrides::{OverrideResolver, OverrideTable};
    pub use crate::registry::CodeRegistry;
    pub use crate::schema::{FieldSpec, Schema, SchemaBuilder};
    pub use crate::session::{ValidationErrors, ValidationSession};
    pub use crate::tree::{ErrorNode, ErrorTree, Leaf, Provenance, RawErrors};
}
