//! Schema validation capability.
//!
//! The engine treats schemas as opaque: anything implementing [`Schema`] can
//! parse a raw JSON value into its validated form or report every issue it
//! found. Four implementations ship with Hermes:
//!
//! - [`JsonSchema`] compiles a JSON Schema document with the `jsonschema` crate
//! - [`Typed`] round-trips the value through a `serde` type
//! - [`FnSchema`] wraps a closure
//! - [`AnySchema`] accepts everything unchanged

use crate::error::{Error, Issue, ValidationIssues};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A shared, type-erased schema.
pub type SchemaRef = Arc<dyn Schema>;

/// Parses raw input into a validated value.
pub trait Schema: Send + Sync + 'static {
    /// Validates `value`, returning the parsed form or every issue found.
    fn parse(&self, value: Value) -> Result<Value, ValidationIssues>;

    /// Returns `true` if the top-level field `key` holds an array.
    ///
    /// Query parsing uses this to decide whether a comma-joined value should
    /// be split.
    fn is_array_field(&self, _key: &str) -> bool {
        false
    }
}

/// A compiled JSON Schema document.
///
/// # Example
///
/// ```
/// use hermes_core::{JsonSchema, Schema};
/// use serde_json::json;
///
/// let schema = JsonSchema::new(json!({
///     "type": "object",
///     "properties": { "name": { "type": "string" } },
///     "required": ["name"]
/// }))
/// .unwrap();
///
/// assert!(schema.parse(json!({ "name": "ada" })).is_ok());
/// assert!(schema.parse(json!({})).is_err());
/// ```
pub struct JsonSchema {
    document: Value,
    validator: jsonschema::Validator,
}

impl JsonSchema {
    /// Compiles a schema document.
    pub fn new(document: Value) -> Result<Self, Error> {
        let validator = jsonschema::validator_for(&document)
            .map_err(|e| Error::configuration(format!("invalid JSON schema: {e}")))?;
        Ok(Self {
            document,
            validator,
        })
    }

    /// Compiles a schema document into a shared [`SchemaRef`].
    pub fn shared(document: Value) -> Result<SchemaRef, Error> {
        Ok(Arc::new(Self::new(document)?))
    }

    /// Returns the source document.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl Schema for JsonSchema {
    fn parse(&self, value: Value) -> Result<Value, ValidationIssues> {
        let issues: ValidationIssues = self
            .validator
            .iter_errors(&value)
            .map(|e| Issue::new(e.instance_path.to_string(), e.to_string()))
            .collect();
        if issues.is_empty() {
            Ok(value)
        } else {
            Err(issues)
        }
    }

    fn is_array_field(&self, key: &str) -> bool {
        match self.document.pointer(&format!("/properties/{key}/type")) {
            Some(Value::String(kind)) => kind == "array",
            Some(Value::Array(kinds)) => kinds.iter().any(|k| k == "array"),
            _ => false,
        }
    }
}

/// A schema defined by a `serde` type.
///
/// Parsing deserializes into `T` and serializes back, so unknown fields are
/// dropped and defaults are filled in exactly as `T`'s `serde` attributes say.
pub struct Typed<T> {
    array_fields: HashSet<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Typed<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    /// Creates a schema for `T`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            array_fields: HashSet::new(),
            _marker: PhantomData,
        }
    }

    /// Declares top-level fields that hold arrays, for comma-joined queries.
    #[must_use]
    pub fn with_array_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.array_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Wraps the schema in a [`SchemaRef`].
    #[must_use]
    pub fn shared(self) -> SchemaRef {
        Arc::new(self)
    }
}

impl<T> Default for Typed<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Schema for Typed<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn parse(&self, value: Value) -> Result<Value, ValidationIssues> {
        let typed: T = serde_json::from_value(value)
            .map_err(|e| ValidationIssues::single(e.to_string()))?;
        serde_json::to_value(typed).map_err(|e| ValidationIssues::single(e.to_string()))
    }

    fn is_array_field(&self, key: &str) -> bool {
        self.array_fields.contains(key)
    }
}

/// A schema backed by a closure.
pub struct FnSchema<F> {
    func: F,
}

impl<F> FnSchema<F>
where
    F: Fn(Value) -> Result<Value, ValidationIssues> + Send + Sync + 'static,
{
    /// Creates a schema from a parse function.
    pub const fn new(func: F) -> Self {
        Self { func }
    }

    /// Wraps the schema in a [`SchemaRef`].
    #[must_use]
    pub fn shared(self) -> SchemaRef {
        Arc::new(self)
    }
}

impl<F> Schema for FnSchema<F>
where
    F: Fn(Value) -> Result<Value, ValidationIssues> + Send + Sync + 'static,
{
    fn parse(&self, value: Value) -> Result<Value, ValidationIssues> {
        (self.func)(value)
    }
}

/// Accepts any value unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnySchema;

impl Schema for AnySchema {
    fn parse(&self, value: Value) -> Result<Value, ValidationIssues> {
        Ok(value)
    }
}
