// libs/prescription-cell/src/services/serializer.rs
use std::fmt;

use serde::Serialize;
use serde_json::value::RawValue;

use crate::models::{MedicationList, PrescriptionError};

/// Serialized medications, ready to be embedded in a request body.
///
/// Serializes verbatim as the JSON array it holds, never as a JSON string, so
/// it cannot be encoded a second time on its way to the store.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CanonicalJson(Box<RawValue>);

impl CanonicalJson {
    pub fn as_str(&self) -> &str {
        self.0.get()
    }
}

impl PartialEq for CanonicalJson {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for CanonicalJson {}

impl fmt::Display for CanonicalJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produces the canonical text: a compact array, keys in
/// `name, dosage, frequency, duration, notes` order.
pub fn serialize_medications(medications: &MedicationList) -> Result<CanonicalJson, PrescriptionError> {
    let text = serde_json::to_string(medications.as_slice())?;
    Ok(CanonicalJson(RawValue::from_string(text)?))
}
