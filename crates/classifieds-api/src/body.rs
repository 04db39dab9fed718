//! Field-by-field reader over a JSON object body.
//!
//! Bodies are parsed from raw bytes whatever the `Content-Type`. Every
//! accessor removes its key and records a message for the field when the
//! value is missing or has the wrong shape, so one request reports all of
//! its bad fields at once.

use serde_json::{Map, Value};

use classifieds_types::errors::FieldErrors;

use crate::error::ApiError;

pub const REQUIRED: &str = "This field is required.";
pub const NOT_NULL: &str = "This field cannot be null.";

pub struct JsonBody {
    fields: Map<String, Value>,
    errors: FieldErrors,
}

impl JsonBody {
    pub fn parse(bytes: &[u8]) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ApiError::BadRequest(format!("Malformed JSON body: {}", e)))?;

        match value {
            Value::Object(fields) => Ok(Self {
                fields,
                errors: FieldErrors::new(),
            }),
            _ => Err(ApiError::BadRequest("JSON body must be an object".into())),
        }
    }

    pub fn errors_mut(&mut self) -> &mut FieldErrors {
        &mut self.errors
    }

    /// Ok when no accessor recorded an error.
    pub fn finish(self) -> Result<(), ApiError> {
        self.errors.into_result().map_err(ApiError::Validation)
    }

    /// The collected errors as a 422. Only meaningful once a required
    /// accessor has returned `None`, which always records a message.
    pub fn reject(self) -> ApiError {
        ApiError::Validation(self.errors)
    }

    // -- Text --

    pub fn required_text(&mut self, key: &str) -> Option<String> {
        let value = self.required(key)?;
        self.text(key, value)
    }

    /// Absent keys yield `None`; `null` is rejected.
    pub fn optional_text(&mut self, key: &str) -> Option<String> {
        let value = self.optional(key)?;
        self.text(key, value)
    }

    /// `None` when absent, `Some(None)` for an explicit `null`.
    pub fn nullable_text(&mut self, key: &str) -> Option<Option<String>> {
        match self.fields.remove(key)? {
            Value::Null => Some(None),
            value => self.text(key, value).map(Some),
        }
    }

    // -- Integers --

    pub fn required_int(&mut self, key: &str) -> Option<i64> {
        let value = self.required(key)?;
        self.int(key, value)
    }

    /// `None` when absent, `Some(None)` for an explicit `null`.
    pub fn nullable_int(&mut self, key: &str) -> Option<Option<i64>> {
        match self.fields.remove(key)? {
            Value::Null => Some(None),
            value => self.int(key, value).map(Some),
        }
    }

    // -- Booleans --

    pub fn optional_bool(&mut self, key: &str) -> Option<bool> {
        let value = self.optional(key)?;
        let parsed = match &value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };

        if parsed.is_none() {
            self.errors.add(
                key,
                format!("{} value must be either true or false.", display(&value)),
            );
        }
        parsed
    }

    fn required(&mut self, key: &str) -> Option<Value> {
        match self.fields.remove(key) {
            None => {
                self.errors.add(key, REQUIRED);
                None
            }
            Some(Value::Null) => {
                self.errors.add(key, NOT_NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    fn optional(&mut self, key: &str) -> Option<Value> {
        match self.fields.remove(key)? {
            Value::Null => {
                self.errors.add(key, NOT_NULL);
                None
            }
            value => Some(value),
        }
    }

    fn text(&mut self, key: &str, value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            other => {
                self.errors
                    .add(key, format!("Expected text, got {}.", display(&other)));
                None
            }
        }
    }

    fn int(&mut self, key: &str, value: Value) -> Option<i64> {
        let parsed = match &value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };

        if parsed.is_none() {
            self.errors
                .add(key, format!("{} value must be an integer.", display(&value)));
        }
        parsed
    }
}

/// Whole floats inside the `i64` range, without saturating.
fn whole_i64(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX is not
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then_some(f as i64)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        other => format!("'{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> JsonBody {
        JsonBody::parse(json.as_bytes()).unwrap()
    }

    #[test]
    fn malformed_or_non_object_bodies_are_bad_requests() {
        assert!(matches!(JsonBody::parse(b"{nope"), Err(ApiError::BadRequest(_))));
        assert!(matches!(JsonBody::parse(b"[1, 2]"), Err(ApiError::BadRequest(_))));
        assert!(matches!(JsonBody::parse(b""), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn missing_and_null_required_fields_are_named() {
        let mut b = body(r#"{"name": null}"#);
        assert_eq!(b.required_text("name"), None);
        assert_eq!(b.required_int("price"), None);

        let ApiError::Validation(errors) = b.reject() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("name").unwrap(), [NOT_NULL]);
        assert_eq!(errors.get("price").unwrap(), [REQUIRED]);
    }

    #[test]
    fn integers_accept_numeric_strings_and_whole_floats() {
        let mut b = body(r#"{"a": 5, "b": "17", "c": 3.0, "d": 2.5, "e": "abc", "f": true}"#);
        assert_eq!(b.required_int("a"), Some(5));
        assert_eq!(b.required_int("b"), Some(17));
        assert_eq!(b.required_int("c"), Some(3));
        assert_eq!(b.required_int("d"), None);
        assert_eq!(b.required_int("e"), None);
        assert_eq!(b.required_int("f"), None);

        let ApiError::Validation(errors) = b.finish().unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("e").unwrap(), ["'abc' value must be an integer."]);
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["d", "e", "f"]);
    }

    #[test]
    fn out_of_range_integers_are_rejected() {
        let mut b = body(
            r#"{"a": 1e300, "b": 18446744073709551615, "c": -1e19, "d": "99999999999999999999", "e": 1e3}"#,
        );
        assert_eq!(b.required_int("a"), None);
        assert_eq!(b.required_int("b"), None);
        assert_eq!(b.required_int("c"), None);
        assert_eq!(b.required_int("d"), None);
        assert_eq!(b.required_int("e"), Some(1000));

        let ApiError::Validation(errors) = b.finish().unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["a", "b", "c", "d"]);
        assert_eq!(
            errors.get("b").unwrap(),
            ["'18446744073709551615' value must be an integer."]
        );
    }

    #[test]
    fn text_accepts_numbers() {
        let mut b = body(r#"{"lat": 55.75, "name": "Moscow", "bad": [1]}"#);
        assert_eq!(b.optional_text("lat").as_deref(), Some("55.75"));
        assert_eq!(b.required_text("name").as_deref(), Some("Moscow"));
        assert_eq!(b.optional_text("lng"), None);
        assert_eq!(b.optional_text("bad"), None);
        assert!(b.finish().is_err());
    }

    #[test]
    fn nullable_accessors_distinguish_absent_from_null() {
        let mut b = body(r#"{"category": null, "last_name": null}"#);
        assert_eq!(b.nullable_int("category"), Some(None));
        assert_eq!(b.nullable_text("last_name"), Some(None));
        assert_eq!(b.nullable_int("missing"), None);
        assert!(b.finish().is_ok());
    }

    #[test]
    fn booleans_accept_common_spellings() {
        let mut b = body(r#"{"a": true, "b": "false", "c": 1, "d": "yes"}"#);
        assert_eq!(b.optional_bool("a"), Some(true));
        assert_eq!(b.optional_bool("b"), Some(false));
        assert_eq!(b.optional_bool("c"), Some(true));
        assert_eq!(b.optional_bool("d"), None);
        assert!(b.finish().is_err());
    }
}
