// libs/prescription-cell/src/services/reader.rs
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use crate::models::{Medication, MedicationList, Prescription, PrescriptionError};
use crate::services::store::{PrescriptionFilter, PrescriptionRow, PrescriptionStore};

pub struct PrescriptionReader {
    store: Arc<dyn PrescriptionStore>,
}

impl PrescriptionReader {
    pub fn new(store: Arc<dyn PrescriptionStore>) -> Self {
        Self { store }
    }

    /// Medications of one prescription, in prescription order.
    pub async fn read(&self, prescription_id: Uuid, auth_token: &str)
                      -> Result<MedicationList, PrescriptionError> {
        Ok(self.get(prescription_id, auth_token).await?.medications)
    }

    pub async fn get(&self, prescription_id: Uuid, auth_token: &str)
                     -> Result<Prescription, PrescriptionError> {
        let row = self.store
            .fetch(prescription_id, auth_token)
            .await
            .map_err(PrescriptionError::Store)?
            .ok_or_else(|| PrescriptionError::prescription_not_found(prescription_id))?;

        decode_row(row)
    }

    pub async fn list_for_consultation(&self, consultation_id: Uuid, auth_token: &str)
                                       -> Result<Vec<Prescription>, PrescriptionError> {
        self.list(PrescriptionFilter::Consultation(consultation_id), auth_token).await
    }

    /// Medication history of a patient, newest prescription first.
    pub async fn list_for_patient(&self, patient_id: Uuid, auth_token: &str)
                                  -> Result<Vec<Prescription>, PrescriptionError> {
        self.list(PrescriptionFilter::Patient(patient_id), auth_token).await
    }

    async fn list(&self, filter: PrescriptionFilter, auth_token: &str)
                  -> Result<Vec<Prescription>, PrescriptionError> {
        let rows = self.store
            .list(filter, auth_token)
            .await
            .map_err(PrescriptionError::Store)?;

        debug!("Decoding {} prescription row(s) for {:?}", rows.len(), filter);
        rows.into_iter().map(decode_row).collect()
    }
}

pub fn decode_row(row: PrescriptionRow) -> Result<Prescription, PrescriptionError> {
    let medications = decode_medications(row.id, &row.medications)?;

    Ok(Prescription {
        id: row.id,
        consultation_id: row.consultation_id,
        doctor_id: row.doctor_id,
        patient_id: row.patient_id,
        instructions: row.instructions,
        medications,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Parses stored medications text. Never repairs what it finds.
pub fn decode_medications(prescription_id: Uuid, stored: &str) -> Result<MedicationList, PrescriptionError> {
    let value: Value = serde_json::from_str(stored).map_err(|e| {
        error!("Prescription {} holds unparseable medications: {}", prescription_id, e);
        PrescriptionError::CorruptRecord {
            id: prescription_id,
            detail: e.to_string(),
        }
    })?;

    let mismatch = |reason: String| {
        error!("Prescription {} medications shape mismatch: {}", prescription_id, reason);
        PrescriptionError::SchemaMismatch {
            id: prescription_id,
            reason,
        }
    };

    let elements = match value {
        Value::Array(elements) => elements,
        Value::String(_) => return Err(mismatch("expected an array, found a JSON-encoded string".to_string())),
        Value::Object(_) => return Err(mismatch("expected an array, found a bare object".to_string())),
        _ => return Err(mismatch("expected an array of medications".to_string())),
    };

    let medications = elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            let medication: Medication = serde_json::from_value(element)
                .map_err(|e| mismatch(format!("medication {}: {}", index, e)))?;

            let blank = [
                ("name", &medication.name),
                ("dosage", &medication.dosage),
                ("frequency", &medication.frequency),
                ("duration", &medication.duration),
            ]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field);

            match blank {
                Some(field) => Err(mismatch(format!("medication {}: `{}` is empty", index, field))),
                None => Ok(medication),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MedicationList::new(medications))
}
