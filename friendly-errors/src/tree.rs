//! Canonical error tree produced at the validation-framework boundary.
//!
//! Validation frameworks report failures as plain strings, lists, or
//! nested mappings. Everything is converted here, once, into [`ErrorNode`]
//! values whose leaves carry an explicit [`Provenance`], so the normalizer
//! only ever walks one shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::INVALID;

/// Key under which frameworks conventionally report whole-object errors.
pub const NON_FIELD_ERRORS_KEY: &str = "non_field_errors";

/// Key carrying the human-readable summary in translated responses.
pub const DETAIL_KEY: &str = "detail";

/// Deepest nesting of raw error shapes that is walked; deeper content is
/// dropped.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Where an error leaf came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "name", rename_all = "snake_case")]
pub enum Provenance {
    /// A built-in type check, tagged with its error kind.
    BuiltIn(String),
    /// A custom per-field validation method, tagged with its method name.
    CustomMethod(String),
    /// A reusable validator, tagged with its kind.
    Validator(String),
    /// A manual registration.
    Manual,
}

impl Provenance {
    /// Built-in provenance for `kind`.
    #[must_use]
    pub fn built_in(kind: impl Into<String>) -> Self {
        Self::BuiltIn(kind.into())
    }

    /// Custom method provenance for `method`.
    #[must_use]
    pub fn custom_method(method: impl Into<String>) -> Self {
        Self::CustomMethod(method.into())
    }

    /// Validator provenance for `kind`.
    #[must_use]
    pub fn validator(kind: impl Into<String>) -> Self {
        Self::Validator(kind.into())
    }

    /// The error kind this provenance implies for table lookups.
    ///
    /// Custom methods, validators and manual leaves carry no built-in kind,
    /// so they map to `invalid`.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::BuiltIn(kind) => kind.as_str(),
            Self::CustomMethod(_) | Self::Validator(_) | Self::Manual => INVALID,
        }
    }
}

/// A single error message with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    /// The human-readable message.
    pub message: String,
    /// Where the message came from.
    pub provenance: Provenance,
}

impl Leaf {
    /// Creates a leaf.
    #[must_use]
    pub fn new(message: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            message: message.into(),
            provenance,
        }
    }

    /// A leaf raised by a built-in type check.
    #[must_use]
    pub fn built_in(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(message, Provenance::built_in(kind))
    }

    /// A leaf raised by a custom validation method.
    #[must_use]
    pub fn custom_method(message: impl Into<String>, method: impl Into<String>) -> Self {
        Self::new(message, Provenance::custom_method(method))
    }

    /// A leaf raised by a reusable validator.
    #[must_use]
    pub fn validator(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(message, Provenance::validator(kind))
    }
}

/// One node of the canonical error tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorNode {
    /// A lone whole-object message.
    Leaf(Leaf),
    /// All messages reported against one declared field, in order.
    FieldGroup {
        /// The field name.
        field: String,
        /// The messages, in emission order.
        leaves: Vec<Leaf>,
    },
    /// Whole-object messages, in emission order.
    NonFieldGroup {
        /// The messages, in emission order.
        leaves: Vec<Leaf>,
    },
    /// A whole-object step reporting a field-to-message mapping.
    DictGroup {
        /// Entries in the mapping's order.
        entries: Vec<(String, Leaf)>,
    },
}

impl ErrorNode {
    /// Creates a field group.
    #[must_use]
    pub fn field(field: impl Into<String>, leaves: Vec<Leaf>) -> Self {
        Self::FieldGroup {
            field: field.into(),
            leaves,
        }
    }

    /// Creates a non-field group.
    #[must_use]
    pub fn non_field(leaves: Vec<Leaf>) -> Self {
        Self::NonFieldGroup { leaves }
    }

    /// Creates a dict group.
    #[must_use]
    pub fn dict(entries: Vec<(String, Leaf)>) -> Self {
        Self::DictGroup { entries }
    }

    /// Converts what a whole-object validation step reported.
    ///
    /// A message or list becomes a [`ErrorNode::NonFieldGroup`]; a mapping
    /// becomes a [`ErrorNode::DictGroup`] with one entry per key, in the
    /// mapping's order. A list under a key contributes its first message.
    /// Every leaf is tagged as built-in `kind`.
    #[must_use]
    pub fn from_whole_object(raw: &RawErrors, kind: &str) -> Self {
        match raw {
            RawErrors::Mapping(entries) => {
                let mut flat = Vec::new();
                for (field, value) in entries {
                    flatten_into(field, value, kind, 0, &mut flat);
                }
                Self::DictGroup { entries: flat }
            }
            other => Self::NonFieldGroup {
                leaves: other
                    .messages()
                    .into_iter()
                    .map(|message| Leaf::built_in(message, kind))
                    .collect(),
            },
        }
    }

    /// Number of leaves under this node.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::FieldGroup { leaves, .. } | Self::NonFieldGroup { leaves } => leaves.len(),
            Self::DictGroup { entries } => entries.len(),
        }
    }

    /// True if the node carries no leaves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The full set of errors one validation call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTree {
    nodes: Vec<ErrorNode>,
}

impl ErrorTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node.
    pub fn push(&mut self, node: ErrorNode) {
        self.nodes.push(node);
    }

    /// Appends a node.
    #[must_use]
    pub fn with_node(mut self, node: ErrorNode) -> Self {
        self.push(node);
        self
    }

    /// Appends a field group.
    #[must_use]
    pub fn with_field(self, field: impl Into<String>, leaves: Vec<Leaf>) -> Self {
        self.with_node(ErrorNode::field(field, leaves))
    }

    /// Appends a non-field group.
    #[must_use]
    pub fn with_non_field(self, leaves: Vec<Leaf>) -> Self {
        self.with_node(ErrorNode::non_field(leaves))
    }

    /// The nodes, in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[ErrorNode] {
        &self.nodes
    }

    /// Total number of leaves across all nodes.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().map(ErrorNode::len).sum()
    }

    /// True if no node carries a leaf.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaf_count() == 0
    }

    /// Reinterprets a translated response body as an error tree.
    ///
    /// Objects produce one dict entry per key (a list contributes its first
    /// message, nested objects flatten to `parent.child`), except
    /// `non_field_errors`, which becomes a non-field group, and `detail`,
    /// which is the envelope message and is skipped. Lists and strings at
    /// the top level become non-field groups.
    #[must_use]
    pub fn from_response_data(data: &Value) -> Self {
        let mut tree = Self::new();
        match data {
            Value::Object(map) => {
                let mut entries = Vec::new();
                let mut non_field = Vec::new();
                for (key, value) in map {
                    if key == DETAIL_KEY {
                        continue;
                    }
                    let raw = RawErrors::from(value);
                    if key == NON_FIELD_ERRORS_KEY {
                        non_field.extend(
                            raw.messages()
                                .into_iter()
                                .map(|message| Leaf::built_in(message, INVALID)),
                        );
                    } else {
                        flatten_into(key, &raw, INVALID, 0, &mut entries);
                    }
                }
                if !non_field.is_empty() {
                    tree.push(ErrorNode::non_field(non_field));
                }
                if !entries.is_empty() {
                    tree.push(ErrorNode::dict(entries));
                }
            }
            Value::Null => {}
            other => {
                let node = ErrorNode::from_whole_object(&RawErrors::from(other), INVALID);
                if !node.is_empty() {
                    tree.push(node);
                }
            }
        }
        tree
    }
}

/// Error output in whatever shape the validation framework produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawErrors {
    /// A single message.
    Message(String),
    /// A list of messages or nested shapes.
    List(Vec<RawErrors>),
    /// A field-to-errors mapping, in insertion order.
    Mapping(Vec<(String, RawErrors)>),
}

impl RawErrors {
    /// Every message under this value, depth first, ignoring mapping keys.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_messages(&mut out);
        out
    }

    fn collect_messages(&self, out: &mut Vec<String>) {
        let mut stack = vec![self];
        while let Some(raw) = stack.pop() {
            match raw {
                Self::Message(message) => out.push(message.clone()),
                Self::List(items) => stack.extend(items.iter().rev()),
                Self::Mapping(entries) => stack.extend(entries.iter().rev().map(|(_, value)| value)),
            }
        }
    }

    fn from_value_at(value: &Value, depth: usize) -> Self {
        if depth >= MAX_NESTING_DEPTH && (value.is_array() || value.is_object()) {
            tracing::warn!(depth, "Error detail nested too deeply, dropping the rest");
            return Self::List(Vec::new());
        }
        match value {
            Value::String(s) => Self::Message(s.clone()),
            Value::Array(items) => Self::List(
                items
                    .iter()
                    .map(|item| Self::from_value_at(item, depth + 1))
                    .collect(),
            ),
            Value::Object(map) => Self::Mapping(
                map.iter()
                    .map(|(key, value)| (key.clone(), Self::from_value_at(value, depth + 1)))
                    .collect(),
            ),
            Value::Null => Self::List(Vec::new()),
            other => Self::Message(other.to_string()),
        }
    }
}

impl From<&Value> for RawErrors {
    fn from(value: &Value) -> Self {
        Self::from_value_at(value, 0)
    }
}

impl From<&str> for RawErrors {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

/// Appends one entry per field: a list reports its first item, a nested
/// mapping reports each child as `field.child`. Keys already present are
/// not repeated.
fn flatten_into(field: &str, raw: &RawErrors, kind: &str, depth: usize, out: &mut Vec<(String, Leaf)>) {
    if depth >= MAX_NESTING_DEPTH {
        tracing::warn!(field, depth, "Error detail nested too deeply, dropping the rest");
        return;
    }
    match raw {
        RawErrors::Message(message) => {
            if out.iter().any(|(existing, _)| existing == field) {
                return;
            }
            out.push((field.to_string(), Leaf::built_in(message.clone(), kind)));
        }
        RawErrors::List(items) => {
            if let Some(first) = items.first() {
                flatten_into(field, first, kind, depth + 1, out);
            }
        }
        RawErrors::Mapping(entries) => {
            for (child, value) in entries {
                flatten_into(&format!("{field}.{child}"), value, kind, depth + 1, out);
            }
        }
    }
}
