// Prescription Cell - medication lists persisted with their prescription
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Medication,
    MedicationList,
    Prescription,
    PrescriptionDraft,
    PrescriptionError,
    CreatePrescriptionRequest,
    ReplacePrescriptionRequest,
};

pub use router::{prescription_routes, PrescriptionState};

pub mod api {
    pub use crate::services::normalizer::normalize_medications;
    pub use crate::services::serializer::{serialize_medications, CanonicalJson};
    pub use crate::services::reader::PrescriptionReader;
    pub use crate::services::writer::PrescriptionWriter;
    pub use crate::services::owner::{EntityOwnerLookup, SupabaseOwnerLookup};
    pub use crate::services::store::{
        PrescriptionFilter, PrescriptionRow, PrescriptionStore, SupabasePrescriptionStore,
        UpsertPrescription,
    };
}
