// libs/prescription-cell/src/services/normalizer.rs
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{Medication, MedicationList, PrescriptionError};

const REQUIRED_FIELDS: [&str; 4] = ["name", "dosage", "frequency", "duration"];

/// Coerces caller-supplied medications into a canonical `MedicationList`.
///
/// Accepts an array of objects, a single object, or a string holding the JSON
/// text of either. Elements keep their input order; unknown keys are dropped.
pub fn normalize_medications(input: Value) -> Result<MedicationList, PrescriptionError> {
    let value = match input {
        Value::String(text) => parse_encoded(&text)?,
        other => other,
    };

    let elements = match value {
        Value::Array(elements) => elements,
        Value::Object(object) => vec![Value::Object(object)],
        Value::Null => {
            return Err(PrescriptionError::MalformedInput(
                "medications must be provided".to_string(),
            ))
        }
        other => {
            return Err(PrescriptionError::MalformedInput(format!(
                "expected an array or object of medications, got {}",
                type_name(&other)
            )))
        }
    };

    let medications = elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| normalize_medication(index, element))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Normalized {} medication(s)", medications.len());
    Ok(MedicationList::new(medications))
}

fn parse_encoded(text: &str) -> Result<Value, PrescriptionError> {
    let parsed: Value = serde_json::from_str(text)
        .map_err(|e| PrescriptionError::MalformedInput(format!("not valid JSON: {}", e)))?;

    // One level of encoding is tolerated; a string inside a string is not.
    if parsed.is_string() {
        return Err(PrescriptionError::MalformedInput(
            "medications are JSON-encoded more than once".to_string(),
        ));
    }

    Ok(parsed)
}

fn normalize_medication(index: usize, element: Value) -> Result<Medication, PrescriptionError> {
    let object = match element {
        Value::Object(object) => object,
        other => {
            return Err(PrescriptionError::validation(
                index,
                "medication",
                format!("must be an object, got {}", type_name(&other)),
            ))
        }
    };

    let [name, dosage, frequency, duration] = REQUIRED_FIELDS.map(|field| required(index, &object, field));

    Ok(Medication {
        name: name?,
        dosage: dosage?,
        frequency: frequency?,
        duration: duration?,
        notes: optional(index, &object, "notes")?,
    })
}

fn required(index: usize, object: &Map<String, Value>, field: &str) -> Result<String, PrescriptionError> {
    let value = match object.get(field) {
        None => return Err(PrescriptionError::validation(index, field, "is missing")),
        Some(Value::Null) => return Err(PrescriptionError::validation(index, field, "is null")),
        Some(value) => value,
    };

    let text = coerce(index, field, value)?;
    if text.is_empty() {
        return Err(PrescriptionError::validation(index, field, "is empty"));
    }

    Ok(text)
}

fn optional(index: usize, object: &Map<String, Value>, field: &str) -> Result<String, PrescriptionError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(value) => coerce(index, field, value),
    }
}

/// Stringifies primitives and trims the result.
fn coerce(index: usize, field: &str, value: &Value) -> Result<String, PrescriptionError> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(PrescriptionError::validation(
            index,
            field,
            format!("must be a string, got {}", type_name(other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
