// libs/prescription-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use shared_database::SupabaseError;
use shared_models::error::AppError;

// ==============================================================================
// MEDICATIONS
// ==============================================================================

/// One prescribed medication.
///
/// Field declaration order is the canonical key order of the stored JSON.
/// Deserializing requires all five keys; lenient input goes through the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub notes: String,
}

/// Ordered medications of a single prescription. Order is prescription order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MedicationList(Vec<Medication>);

impl MedicationList {
    pub fn new(medications: Vec<Medication>) -> Self {
        Self(medications)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Medication> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Medication] {
        &self.0
    }
}

impl From<Vec<Medication>> for MedicationList {
    fn from(medications: Vec<Medication>) -> Self {
        Self(medications)
    }
}

impl<'a> IntoIterator for &'a MedicationList {
    type Item = &'a Medication;
    type IntoIter = std::slice::Iter<'a, Medication>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ==============================================================================
// PRESCRIPTIONS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub consultation_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub instructions: String,
    pub medications: MedicationList,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parent row fields supplied by the caller of a write.
#[derive(Debug, Clone)]
pub struct PrescriptionDraft {
    /// `None` creates a new prescription, `Some` replaces that one in full.
    pub prescription_id: Option<Uuid>,
    pub consultation_id: Uuid,
    pub doctor_id: Uuid,
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrescriptionRequest {
    pub consultation_id: Uuid,
    #[serde(default)]
    pub instructions: Option<String>,
    /// Array of objects, a single object, or a JSON-encoded string of either.
    #[serde(default)]
    pub medications: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacePrescriptionRequest {
    pub consultation_id: Uuid,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub medications: Value,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum PrescriptionError {
    #[error("Malformed medications input: {0}")]
    MalformedInput(String),

    #[error("Invalid medication at index {index}: field `{field}` {reason}")]
    Validation {
        index: usize,
        field: String,
        reason: String,
    },

    #[error("Stored medications for prescription {id} are not valid JSON: {detail}")]
    CorruptRecord { id: Uuid, detail: String },

    #[error("Stored medications for prescription {id} do not match the expected shape: {reason}")]
    SchemaMismatch { id: Uuid, reason: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Transaction rolled back: {0}")]
    Transaction(#[source] SupabaseError),

    #[error("Write outcome unknown, the store gave no verdict: {0}")]
    WriteOutcomeUnknown(#[source] SupabaseError),

    #[error("Store request failed: {0}")]
    Store(#[source] SupabaseError),

    #[error("Failed to serialize medications: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrescriptionError {
    pub fn validation(index: usize, field: &str, reason: impl Into<String>) -> Self {
        PrescriptionError::Validation {
            index,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn prescription_not_found(id: Uuid) -> Self {
        PrescriptionError::NotFound { entity: "Prescription", id }
    }

    pub fn consultation_not_found(id: Uuid) -> Self {
        PrescriptionError::NotFound { entity: "Consultation", id }
    }
}

impl From<PrescriptionError> for AppError {
    fn from(error: PrescriptionError) -> Self {
        let message = error.to_string();
        match error {
            PrescriptionError::MalformedInput(_) => AppError::BadRequest(message),
            PrescriptionError::Validation { .. } => AppError::ValidationError(message),
            PrescriptionError::NotFound { .. } => AppError::NotFound(message),
            PrescriptionError::Transaction(ref source) if source.is_constraint_violation() => {
                AppError::Conflict(message)
            }
            PrescriptionError::Transaction(_)
            | PrescriptionError::WriteOutcomeUnknown(_)
            | PrescriptionError::Store(_) => AppError::Database(message),
            PrescriptionError::CorruptRecord { .. }
            | PrescriptionError::SchemaMismatch { .. }
            | PrescriptionError::Serialization(_) => AppError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_error_mapping() {
        let id = Uuid::new_v4();

        let err: AppError = PrescriptionError::validation(0, "name", "is missing").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("index 0"));
        assert!(err.to_string().contains("`name`"));

        let err: AppError = PrescriptionError::prescription_not_found(id).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: AppError = PrescriptionError::CorruptRecord { id, detail: "eof".into() }.into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: AppError = PrescriptionError::Transaction(SupabaseError::Api {
            status: 409,
            code: Some("23503".into()),
            message: "fk".into(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let decode = serde_json::from_str::<Value>("<html>").unwrap_err();
        let err: AppError = PrescriptionError::WriteOutcomeUnknown(SupabaseError::Decode(decode)).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("rolled back"));
    }

    #[test]
    fn test_medication_list_serializes_as_bare_array() {
        let list = MedicationList::new(vec![Medication {
            name: "Amoxicillin".into(),
            dosage: "500mg".into(),
            frequency: "3x daily".into(),
            duration: "7 days".into(),
            notes: String::new(),
        }]);

        let value = serde_json::to_value(&list).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["name"], "Amoxicillin");
    }
}
