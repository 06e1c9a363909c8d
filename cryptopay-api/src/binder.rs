//! Typed binding of untyped JSON mappings
//!
//! Every record implements [`Bind`] by hand, reading its declared fields one
//! at a time through [`Fields`]. Keys the record does not declare are never
//! looked at, so additions to the API do not break binding. A required field
//! without a key fails with [`BindingError::MissingField`]; optional fields
//! fall back to their declared default.
//!
//! ```rust
//! use cryptopay_api::binder::{bind, Bind, BindResult, Fields};
//!
//! struct Ping {
//!     id: i64,
//!     note: Option<String>,
//! }
//!
//! impl Bind for Ping {
//!     fn bind(fields: &Fields<'_>) -> BindResult<Self> {
//!         Ok(Self {
//!             id: fields.required("id")?,
//!             note: fields.optional("note")?,
//!         })
//!     }
//! }
//!
//! let ping: Ping = bind(&serde_json::json!({"id": "7", "extra": true})).unwrap();
//! assert_eq!(ping.id, 7);
//! assert!(ping.note.is_none());
//! ```

use serde_json::{Map, Value};

pub use crate::error::BindingError;

/// Result type for binding operations
pub type BindResult<T> = Result<T, BindingError>;

/// A record that can be built from an untyped string-keyed mapping
pub trait Bind: Sized {
    /// Build the record from the fields of a JSON object
    fn bind(fields: &Fields<'_>) -> BindResult<Self>;
}

/// Read-only view over the fields of a JSON object
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    /// Wrap a JSON object
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// Raw value of a field; `null` counts as absent
    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name).filter(|value| !value.is_null())
    }

    /// A field that must be present
    pub fn required<T: FieldValue>(&self, name: &str) -> BindResult<T> {
        let value = self.raw(name).ok_or_else(|| BindingError::MissingField {
            field: name.to_string(),
        })?;
        convert(name, value)
    }

    /// A field that may be absent
    ///
    /// An object arriving in a field that does not take one is treated as
    /// absent.
    pub fn optional<T: FieldValue>(&self, name: &str) -> BindResult<Option<T>> {
        match self.raw(name) {
            None => Ok(None),
            Some(Value::Object(_)) if !T::ACCEPTS_OBJECT => Ok(None),
            Some(value) => convert(name, value).map(Some),
        }
    }

    /// A field that falls back to `T::default()` when absent
    pub fn or_default<T: FieldValue + Default>(&self, name: &str) -> BindResult<T> {
        Ok(self.optional(name)?.unwrap_or_default())
    }

    /// Nested record hook
    ///
    /// An object value is handed to `T`'s own binder; anything other than an
    /// object (or `null`) is an error rather than a silently kept raw value.
    pub fn nested<T: Bind>(&self, name: &str) -> BindResult<Option<T>> {
        match self.raw(name) {
            None => Ok(None),
            Some(Value::Object(map)) => T::bind(&Fields::new(map))
                .map(Some)
                .map_err(|err| err.within(name)),
            Some(other) => Err(BindingError::InvalidField {
                field: name.to_string(),
                reason: format!("expected object, found {}", value_kind(other)),
            }),
        }
    }
}

fn convert<T: FieldValue>(name: &str, value: &Value) -> BindResult<T> {
    T::from_field(value).map_err(|reason| BindingError::InvalidField {
        field: name.to_string(),
        reason,
    })
}

/// Conversion from a single JSON value into a field type
///
/// Conversions are lenient where the API is known to vary its encoding:
/// numbers arrive as strings and vice versa.
pub trait FieldValue: Sized {
    /// Whether an object value can be converted
    const ACCEPTS_OBJECT: bool = false;

    /// Convert the value, returning a human-readable reason on failure
    fn from_field(value: &Value) -> Result<Self, String>;
}

impl FieldValue for String {
    fn from_field(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(format!("expected string, found {}", value_kind(other))),
        }
    }
}

impl FieldValue for i64 {
    fn from_field(value: &Value) -> Result<Self, String> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| format!("{} is not an integer", n)),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| format!("{:?} is not an integer", s)),
            other => Err(format!("expected integer, found {}", value_kind(other))),
        }
    }
}

impl FieldValue for bool {
    fn from_field(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s == "true" => Ok(true),
            Value::String(s) if s == "false" => Ok(false),
            other => Err(format!("expected boolean, found {}", value_kind(other))),
        }
    }
}

impl FieldValue for Vec<String> {
    fn from_field(value: &Value) -> Result<Self, String> {
        match value {
            Value::Array(items) => items.iter().map(String::from_field).collect(),
            Value::String(s) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect()),
            other => Err(format!("expected list, found {}", value_kind(other))),
        }
    }
}

impl FieldValue for Value {
    const ACCEPTS_OBJECT: bool = true;

    fn from_field(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

/// Bind a JSON value that must be an object
pub fn bind<T: Bind>(value: &Value) -> BindResult<T> {
    match value {
        Value::Object(map) => bind_map(map),
        other => Err(BindingError::NotAnObject {
            found: value_kind(other),
        }),
    }
}

/// Bind a JSON object
pub fn bind_map<T: Bind>(map: &Map<String, Value>) -> BindResult<T> {
    T::bind(&Fields::new(map))
}

/// Bind every element of a JSON array
pub fn bind_list<T: Bind>(value: &Value) -> BindResult<Vec<T>> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| bind(item).map_err(|err| err.within(&format!("[{}]", index))))
            .collect(),
        other => Err(BindingError::InvalidField {
            field: "result".to_string(),
            reason: format!("expected list, found {}", value_kind(other)),
        }),
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Inner {
        code: String,
    }

    impl Bind for Inner {
        fn bind(fields: &Fields<'_>) -> BindResult<Self> {
            Ok(Self {
                code: fields.required("code")?,
            })
        }
    }

    #[derive(Debug)]
    struct Outer {
        id: i64,
        label: String,
        flag: Option<bool>,
        inner: Option<Inner>,
    }

    impl Bind for Outer {
        fn bind(fields: &Fields<'_>) -> BindResult<Self> {
            Ok(Self {
                id: fields.required("id")?,
                label: fields.or_default("label")?,
                flag: fields.optional("flag")?,
                inner: fields.nested("inner")?,
            })
        }
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let outer: Outer = bind(&json!({"id": 1, "surprise": [1, 2, 3]})).unwrap();
        assert_eq!(outer.id, 1);
        assert_eq!(outer.label, "");
        assert!(outer.flag.is_none());
        assert!(outer.inner.is_none());
    }

    #[test]
    fn test_missing_required_field_is_named() {
        let err = bind::<Outer>(&json!({"label": "x"})).unwrap_err();
        assert_eq!(
            err,
            BindingError::MissingField {
                field: "id".into()
            }
        );
    }

    #[test]
    fn test_null_required_field_counts_as_missing() {
        let err = bind::<Outer>(&json!({"id": null})).unwrap_err();
        assert_eq!(err.field(), Some("id"));
    }

    #[test]
    fn test_nested_object_is_bound() {
        let outer: Outer = bind(&json!({"id": 2, "inner": {"code": "A"}})).unwrap();
        assert_eq!(outer.inner.unwrap().code, "A");
    }

    #[test]
    fn test_nested_error_carries_path() {
        let err = bind::<Outer>(&json!({"id": 2, "inner": {}})).unwrap_err();
        assert_eq!(err.field(), Some("inner.code"));
    }

    #[test]
    fn test_nested_scalar_is_rejected() {
        let err = bind::<Outer>(&json!({"id": 2, "inner": "nope"})).unwrap_err();
        assert!(matches!(err, BindingError::InvalidField { ref field, .. } if field == "inner"));
    }

    #[test]
    fn test_lenient_conversions() {
        let outer: Outer = bind(&json!({"id": "15", "label": 3, "flag": "true"})).unwrap();
        assert_eq!(outer.id, 15);
        assert_eq!(outer.label, "3");
        assert_eq!(outer.flag, Some(true));
    }

    #[test]
    fn test_object_in_scalar_field_counts_as_absent() {
        let outer: Outer = bind(&json!({"id": 4, "label": {}, "flag": {"x": 1}})).unwrap();
        assert_eq!(outer.label, "");
        assert!(outer.flag.is_none());

        let err = bind::<Outer>(&json!({"id": {}})).unwrap_err();
        assert!(matches!(err, BindingError::InvalidField { ref field, .. } if field == "id"));

        let kept: Option<Value> = Fields::new(json!({"meta": {"a": 1}}).as_object().unwrap())
            .optional("meta")
            .unwrap();
        assert_eq!(kept, Some(json!({"a": 1})));
    }

    #[test]
    fn test_numbers_keep_their_digits() {
        let value: Value =
            serde_json::from_str(r#"{"amount": 12345678901234567.89, "rate": 1.10}"#).unwrap();
        let fields = Fields::new(value.as_object().unwrap());
        let amount: String = fields.required("amount").unwrap();
        let rate: String = fields.required("rate").unwrap();
        assert_eq!(amount, "12345678901234567.89");
        assert_eq!(rate, "1.10");
    }

    #[test]
    fn test_invalid_conversion() {
        let err = bind::<Outer>(&json!({"id": "abc"})).unwrap_err();
        assert!(matches!(err, BindingError::InvalidField { ref field, .. } if field == "id"));
    }

    #[test]
    fn test_list_from_comma_separated_string() {
        let list = Vec::<String>::from_field(&json!("USDT, TON,,BTC")).unwrap();
        assert_eq!(list, vec!["USDT", "TON", "BTC"]);
    }

    #[test]
    fn test_not_an_object() {
        let err = bind::<Outer>(&json!([1])).unwrap_err();
        assert_eq!(err, BindingError::NotAnObject { found: "array" });
    }

    #[test]
    fn test_bind_list_reports_index() {
        let err = bind_list::<Inner>(&json!([{"code": "a"}, {}])).unwrap_err();
        assert_eq!(err.field(), Some("[1].code"));
    }
}
