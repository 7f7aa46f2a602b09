use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use prescription_cell::{prescription_routes, PrescriptionState};
use shared_config::AppConfig;
use shared_database::SupabaseClient;

pub fn create_router(config: Arc<AppConfig>, supabase: Arc<SupabaseClient>) -> Router {
    let prescriptions = Arc::new(PrescriptionState::new(config, supabase));

    Router::new()
        .route("/", get(|| async { "Amae Clinic API is running!" }))
        .nest("/prescriptions", prescription_routes(prescriptions))
}
