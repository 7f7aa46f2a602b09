// libs/prescription-cell/src/services/owner.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::{SupabaseClient, SupabaseError};

/// Resolves who owns a consultation. Account tables live outside this cell.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityOwnerLookup: Send + Sync {
    async fn owner_of(&self, consultation_id: Uuid, auth_token: &str)
                      -> Result<Option<Uuid>, SupabaseError>;
}

#[derive(Debug, Deserialize)]
struct ConsultationOwner {
    patient_id: Option<Uuid>,
}

/// Reads the patient of a consultation from the `appointments` table.
pub struct SupabaseOwnerLookup {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseOwnerLookup {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl EntityOwnerLookup for SupabaseOwnerLookup {
    async fn owner_of(&self, consultation_id: Uuid, auth_token: &str)
                      -> Result<Option<Uuid>, SupabaseError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&select=patient_id", consultation_id);
        let rows: Vec<ConsultationOwner> = self.supabase
            .request(Method::GET, &path, Some(auth_token), None::<Value>)
            .await?;

        let owner = rows.into_iter().next().and_then(|row| row.patient_id);
        debug!("Consultation {} owner: {:?}", consultation_id, owner);
        Ok(owner)
    }
}
