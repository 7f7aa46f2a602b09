// libs/prescription-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreatePrescriptionRequest, PrescriptionDraft, ReplacePrescriptionRequest};
use crate::router::PrescriptionState;

fn author_id(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Token subject is not a valid user id".to_string()))
}

#[axum::debug_handler]
pub async fn create_prescription(
    State(state): State<Arc<PrescriptionState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let draft = PrescriptionDraft {
        prescription_id: None,
        consultation_id: request.consultation_id,
        doctor_id: author_id(&user)?,
        instructions: request.instructions.unwrap_or_default(),
    };

    let prescription = state.writer
        .write(draft, request.medications, auth.token())
        .await?;

    Ok((StatusCode::CREATED, Json(json!(prescription))))
}

/// Replaces the prescription and its whole medication list.
#[axum::debug_handler]
pub async fn replace_prescription(
    State(state): State<Arc<PrescriptionState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(prescription_id): Path<Uuid>,
    Json(request): Json<ReplacePrescriptionRequest>,
) -> Result<Json<Value>, AppError> {
    let draft = PrescriptionDraft {
        prescription_id: Some(prescription_id),
        consultation_id: request.consultation_id,
        doctor_id: author_id(&user)?,
        instructions: request.instructions.unwrap_or_default(),
    };

    let prescription = state.writer
        .write(draft, request.medications, auth.token())
        .await?;

    Ok(Json(json!(prescription)))
}

#[axum::debug_handler]
pub async fn get_prescription(
    State(state): State<Arc<PrescriptionState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(prescription_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let prescription = state.reader.get(prescription_id, auth.token()).await?;
    Ok(Json(json!(prescription)))
}

#[axum::debug_handler]
pub async fn get_medications(
    State(state): State<Arc<PrescriptionState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(prescription_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let medications = state.reader.read(prescription_id, auth.token()).await?;

    Ok(Json(json!({
        "prescription_id": prescription_id,
        "medications": medications,
        "total": medications.len()
    })))
}

#[axum::debug_handler]
pub async fn list_consultation_prescriptions(
    State(state): State<Arc<PrescriptionState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(consultation_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let prescriptions = state.reader
        .list_for_consultation(consultation_id, auth.token())
        .await?;

    Ok(Json(json!({
        "prescriptions": prescriptions,
        "total": prescriptions.len()
    })))
}

/// Medication history across all of a patient's consultations.
#[axum::debug_handler]
pub async fn list_patient_prescriptions(
    State(state): State<Arc<PrescriptionState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let prescriptions = state.reader
        .list_for_patient(patient_id, auth.token())
        .await?;

    Ok(Json(json!({
        "prescriptions": prescriptions,
        "total": prescriptions.len()
    })))
}
