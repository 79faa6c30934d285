//! Conversion of concrete trees to JSON.

use serde_json::{Map, Number, Value as JsonValue};

use super::{Scalar, Value, Violations};

impl Value {
    /// Exports a concrete tree as JSON, preserving field order.
    ///
    /// Optional fields are omitted and defaults are chosen for disjunctions.
    ///
    /// # Errors
    ///
    /// Returns the [`Violations`] of [`Value::validate_concrete`] when the
    /// tree is not concrete.
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_blueprint::constraint::compile;
    ///
    /// let value = compile(b"name: *\"forge\" | string\nreplicas: 2")?;
    /// let json = value.to_json()?;
    /// assert_eq!(json, serde_json::json!({"name": "forge", "replicas": 2}));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn to_json(&self) -> Result<JsonValue, Violations> {
        self.validate_concrete()?;
        Ok(export(self))
    }
}

fn export(value: &Value) -> JsonValue {
    match value.resolved() {
        Value::Scalar(scalar) => match scalar {
            Scalar::Null => JsonValue::Null,
            Scalar::Bool(flag) => JsonValue::Bool(*flag),
            Scalar::Int(number) => JsonValue::Number(Number::from(*number)),
            Scalar::Float(number) => Number::from_f64(*number).map_or(JsonValue::Null, JsonValue::Number),
            Scalar::String(text) => JsonValue::String(text.clone()),
        },
        Value::Struct(st) => JsonValue::Object(
            st.fields()
                .iter()
                .filter(|(_, field)| !field.is_optional())
                .map(|(label, field)| (label.clone(), export(field.value())))
                .collect::<Map<String, JsonValue>>(),
        ),
        Value::List(list) => JsonValue::Array(list.items().iter().map(export).collect()),
        Value::Top | Value::Bottom(_) | Value::Constraint(_) | Value::Disjunction(_) => {
            JsonValue::Null
        }
    }
}
