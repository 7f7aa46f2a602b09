// libs/prescription-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::{
    PrescriptionReader, PrescriptionWriter, SupabaseOwnerLookup, SupabasePrescriptionStore,
};

/// Services shared by every prescription request.
pub struct PrescriptionState {
    pub config: Arc<AppConfig>,
    pub writer: PrescriptionWriter,
    pub reader: PrescriptionReader,
}

impl PrescriptionState {
    pub fn new(config: Arc<AppConfig>, supabase: Arc<SupabaseClient>) -> Self {
        let store = Arc::new(SupabasePrescriptionStore::new(supabase.clone()));
        let owners = Arc::new(SupabaseOwnerLookup::new(supabase));

        Self {
            config,
            writer: PrescriptionWriter::new(store.clone(), owners),
            reader: PrescriptionReader::new(store),
        }
    }
}

pub fn prescription_routes(state: Arc<PrescriptionState>) -> Router {
    Router::new()
        .route("/", post(handlers::create_prescription))
        .route("/{id}", get(handlers::get_prescription).put(handlers::replace_prescription))
        .route("/{id}/medications", get(handlers::get_medications))
        .route("/consultations/{consultation_id}", get(handlers::list_consultation_prescriptions))
        .route("/patients/{patient_id}", get(handlers::list_patient_prescriptions))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
