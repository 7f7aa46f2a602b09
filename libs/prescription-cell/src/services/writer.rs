// libs/prescription-cell/src/services/writer.rs
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Prescription, PrescriptionDraft, PrescriptionError};
use crate::services::normalizer::normalize_medications;
use crate::services::owner::EntityOwnerLookup;
use crate::services::reader::decode_row;
use crate::services::serializer::serialize_medications;
use crate::services::store::{PrescriptionStore, UpsertPrescription};

/// Writes a prescription and its medications as one atomic unit.
///
/// Each call creates or fully replaces exactly one row. Failed writes are not
/// retried here; the caller decides.
pub struct PrescriptionWriter {
    store: Arc<dyn PrescriptionStore>,
    owners: Arc<dyn EntityOwnerLookup>,
}

impl PrescriptionWriter {
    pub fn new(store: Arc<dyn PrescriptionStore>, owners: Arc<dyn EntityOwnerLookup>) -> Self {
        Self { store, owners }
    }

    pub async fn write(
        &self,
        draft: PrescriptionDraft,
        raw_medications: Value,
        auth_token: &str,
    ) -> Result<Prescription, PrescriptionError> {
        let medications = normalize_medications(raw_medications)?;
        let canonical = serialize_medications(&medications)?;

        let patient_id = self.owners
            .owner_of(draft.consultation_id, auth_token)
            .await
            .map_err(PrescriptionError::Store)?
            .ok_or_else(|| PrescriptionError::consultation_not_found(draft.consultation_id))?;

        let id = draft.prescription_id.unwrap_or_else(Uuid::new_v4);
        debug!("Writing prescription {} with {} medication(s)", id, medications.len());

        let upsert = UpsertPrescription {
            id,
            consultation_id: draft.consultation_id,
            doctor_id: draft.doctor_id,
            patient_id,
            instructions: draft.instructions.trim().to_string(),
            medications: canonical,
        };

        let row = self.store
            .upsert(&upsert, auth_token)
            .await
            .map_err(|e| {
                if e.is_outcome_unknown() {
                    warn!("Prescription {} write outcome unknown: {}", id, e);
                    PrescriptionError::WriteOutcomeUnknown(e)
                } else {
                    warn!("Prescription {} write rolled back: {}", id, e);
                    PrescriptionError::Transaction(e)
                }
            })?;

        let persisted = decode_row(row)?;

        info!("Prescription {} written for consultation {}", persisted.id, persisted.consultation_id);
        Ok(persisted)
    }
}
