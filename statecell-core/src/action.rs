//! Actions: structural records describing a state change request
//!
//! An action is a JSON object with a `type` field; everything else is payload
//! for reducers. Typed enums can implement [`Action`] (usually through
//! `#[derive(Action)]`) and be converted into such a record.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{Result, StoreError};
use crate::shape::{is_plain_object, kind_of};

/// Key holding an action's discriminant
pub const TYPE_KEY: &str = "type";

/// Build a bare action record `{"type": ty}`
pub fn action(ty: impl Into<String>) -> Value {
    let ty: String = ty.into();
    json!({ TYPE_KEY: ty })
}

/// Build `{"type": ty, "payload": payload}`
pub fn action_with_payload(ty: impl Into<String>, payload: impl Into<Value>) -> Value {
    let ty: String = ty.into();
    let payload: Value = payload.into();
    json!({ TYPE_KEY: ty, "payload": payload })
}

/// The `type` field of an action, if present
pub fn action_type(action: &Value) -> Option<&Value> {
    action.get(TYPE_KEY)
}

/// The `type` field rendered for logs and error messages
pub fn describe_type(action: &Value) -> Option<String> {
    action_type(action).map(|ty| match ty {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Check that a value may be dispatched.
pub fn validate(action: &Value) -> Result<()> {
    if !is_plain_object(action) {
        return Err(StoreError::configuration(format!(
            "Actions must be plain objects. Instead, the actual type was: '{}'. \
             You may need to add middleware to your store setup to handle dispatching other values.",
            kind_of(action)
        )));
    }
    if action_type(action).is_none() {
        return Err(StoreError::configuration(
            "Actions may not have an undefined \"type\" property. \
             You may have misspelled an action type string constant.",
        ));
    }
    Ok(())
}

/// A typed action that can be dispatched to a store.
///
/// Use `#[derive(Action)]` from `statecell-macros` to implement `name()` from
/// variant names. Combine it with `#[serde(tag = "type")]` so struct variants
/// serialize to flat records.
pub trait Action: Serialize {
    /// The action type written into the record
    fn name(&self) -> &'static str;

    /// Serialize into an action record whose `type` is [`Action::name`].
    ///
    /// Objects keep their fields; unit values become `{"type": name}`; any
    /// other payload is stored under `"payload"`.
    fn to_record(&self) -> Result<Value> {
        let mut record = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            Value::Null | Value::String(_) => Map::new(),
            payload => {
                let mut map = Map::new();
                map.insert("payload".to_string(), payload);
                map
            }
        };
        record.insert(TYPE_KEY.to_string(), Value::String(self.name().to_string()));
        Ok(Value::Object(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    #[serde(tag = "type")]
    enum TodoAction {
        Add { text: String },
        Clear,
    }

    impl Action for TodoAction {
        fn name(&self) -> &'static str {
            match self {
                TodoAction::Add { .. } => "todos/add",
                TodoAction::Clear => "todos/clear",
            }
        }
    }

    #[derive(Serialize)]
    struct SetVolume(u8);

    impl Action for SetVolume {
        fn name(&self) -> &'static str {
            "volume/set"
        }
    }

    #[test]
    fn test_validate_accepts_typed_records() {
        assert!(validate(&action("x")).is_ok());
        assert!(validate(&json!({"type": null})).is_ok());
        assert!(validate(&json!({"type": 0, "extra": true})).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_records() {
        let err = validate(&json!("increment")).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("'string'"));
        assert!(validate(&json!([])).unwrap_err().is_configuration());
        assert!(validate(&Value::Null).unwrap_err().is_configuration());
    }

    #[test]
    fn test_validate_rejects_missing_type() {
        let err = validate(&json!({"payload": 1})).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("undefined \"type\""));
    }

    #[test]
    fn test_to_record_overrides_type_with_name() {
        let record = TodoAction::Add { text: "milk".into() }.to_record().unwrap();
        assert_eq!(record, json!({"type": "todos/add", "text": "milk"}));

        let record = TodoAction::Clear.to_record().unwrap();
        assert_eq!(record, json!({"type": "todos/clear"}));
    }

    #[test]
    fn test_to_record_wraps_scalar_payload() {
        let record = SetVolume(7).to_record().unwrap();
        assert_eq!(record, json!({"type": "volume/set", "payload": 7}));
    }

    #[test]
    fn test_describe_type() {
        assert_eq!(describe_type(&action("a/b")), Some("a/b".to_string()));
        assert_eq!(describe_type(&json!({"type": 3})), Some("3".to_string()));
        assert_eq!(describe_type(&json!({})), None);
    }
}
