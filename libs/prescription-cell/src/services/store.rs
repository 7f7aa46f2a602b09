// libs/prescription-cell/src/services/store.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{SupabaseClient, SupabaseError};

use crate::services::serializer::CanonicalJson;

/// Postgres function performing the insert-or-replace in one transaction.
pub const UPSERT_FUNCTION: &str = "upsert_prescription";

/// Columns selected on every read. The medications column is cast to text so
/// the reader sees exactly what is stored, not a value PostgREST re-encoded.
const PRESCRIPTION_COLUMNS: &str =
    "id,consultation_id,doctor_id,patient_id,instructions,medications::text,created_at,updated_at";

/// Row as stored, medications still in their raw text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRow {
    pub id: Uuid,
    pub consultation_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub instructions: String,
    pub medications: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters of `upsert_prescription`. Names match the SQL function arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertPrescription {
    #[serde(rename = "p_id")]
    pub id: Uuid,
    #[serde(rename = "p_consultation_id")]
    pub consultation_id: Uuid,
    #[serde(rename = "p_doctor_id")]
    pub doctor_id: Uuid,
    #[serde(rename = "p_patient_id")]
    pub patient_id: Uuid,
    #[serde(rename = "p_instructions")]
    pub instructions: String,
    #[serde(rename = "p_medications")]
    pub medications: CanonicalJson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrescriptionFilter {
    Consultation(Uuid),
    Patient(Uuid),
}

impl PrescriptionFilter {
    fn query(&self) -> String {
        match self {
            PrescriptionFilter::Consultation(id) => format!("consultation_id=eq.{}", id),
            PrescriptionFilter::Patient(id) => format!("patient_id=eq.{}", id),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrescriptionStore: Send + Sync {
    /// Inserts or fully replaces one row atomically and returns it as stored.
    async fn upsert(&self, prescription: &UpsertPrescription, auth_token: &str)
                    -> Result<PrescriptionRow, SupabaseError>;

    async fn fetch(&self, id: Uuid, auth_token: &str)
                   -> Result<Option<PrescriptionRow>, SupabaseError>;

    /// Rows matching the filter, newest first.
    async fn list(&self, filter: PrescriptionFilter, auth_token: &str)
                  -> Result<Vec<PrescriptionRow>, SupabaseError>;
}

pub struct SupabasePrescriptionStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabasePrescriptionStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl PrescriptionStore for SupabasePrescriptionStore {
    async fn upsert(&self, prescription: &UpsertPrescription, auth_token: &str)
                    -> Result<PrescriptionRow, SupabaseError> {
        debug!("Upserting prescription {} for consultation {}",
               prescription.id, prescription.consultation_id);

        let rows: Vec<PrescriptionRow> = self.supabase
            .rpc(UPSERT_FUNCTION, Some(auth_token), prescription)
            .await?;

        let row = rows.into_iter().next().ok_or_else(|| {
            SupabaseError::Decode(serde::de::Error::custom(format!(
                "{} returned no row for {}",
                UPSERT_FUNCTION, prescription.id
            )))
        })?;

        info!("Prescription {} committed", row.id);
        Ok(row)
    }

    async fn fetch(&self, id: Uuid, auth_token: &str)
                   -> Result<Option<PrescriptionRow>, SupabaseError> {
        debug!("Fetching prescription {}", id);

        let path = format!("/rest/v1/prescriptions?id=eq.{}&select={}", id, PRESCRIPTION_COLUMNS);
        let rows: Vec<PrescriptionRow> = self.supabase
            .request(Method::GET, &path, Some(auth_token), None::<Value>)
            .await?;

        Ok(rows.into_iter().next())
    }

    async fn list(&self, filter: PrescriptionFilter, auth_token: &str)
                  -> Result<Vec<PrescriptionRow>, SupabaseError> {
        debug!("Listing prescriptions with {:?}", filter);

        let path = format!(
            "/rest/v1/prescriptions?{}&select={}&order=created_at.desc",
            filter.query(),
            PRESCRIPTION_COLUMNS
        );

        self.supabase
            .request(Method::GET, &path, Some(auth_token), None::<Value>)
            .await
    }
}
